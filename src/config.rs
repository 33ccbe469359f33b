//! Configuration builders controlling binarization and reading of encoded files.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{FeatbinError, Result};

/// Value added to every vocabulary id before it is written.
pub const DEFAULT_OFFSET: i32 = 20;
/// Integer marking the end of a record.
pub const DEFAULT_SENTINEL: i32 = 10;
/// Field separator within an input line.
pub const DEFAULT_DELIMITER: u8 = b'\t';
/// Number of blank lines between progress notices.
pub const DEFAULT_PROGRESS_INTERVAL: u64 = 10_000;

/// Configuration for turning a feature file into its binary form.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BinarizeConfig {
    /// Added to each vocabulary id; values below it are reserved for control markers.
    pub offset: i32,
    /// Record terminator written after every record, blank or not.
    pub sentinel: i32,
    /// Byte separating fields within a line.
    pub delimiter: u8,
    /// Emit a progress notice every this many blank lines; `0` disables notices.
    pub progress_interval: u64,
}

impl BinarizeConfig {
    /// Returns a builder initialised with [`BinarizeConfig::default`].
    #[must_use]
    pub fn builder() -> BinarizeBuilder {
        BinarizeBuilder::default()
    }

    /// Validates that control values and data values can never be confused.
    pub fn validate(&self) -> Result<()> {
        if self.offset <= 0 {
            return Err(FeatbinError::InvalidConfig(format!(
                "offset ({}) must be greater than zero",
                self.offset
            )));
        }
        if self.sentinel < 0 {
            return Err(FeatbinError::InvalidConfig(format!(
                "sentinel ({}) must not be negative",
                self.sentinel
            )));
        }
        if self.sentinel >= self.offset {
            return Err(FeatbinError::InvalidConfig(format!(
                "sentinel ({}) must be below offset ({}) so it cannot collide with an id",
                self.sentinel, self.offset
            )));
        }
        if matches!(self.delimiter, b'\n' | b'\r') {
            return Err(FeatbinError::InvalidConfig(
                "delimiter must not be a line terminator".into(),
            ));
        }
        if !self.delimiter.is_ascii() {
            return Err(FeatbinError::InvalidConfig(format!(
                "delimiter (0x{:02x}) must be an ASCII byte",
                self.delimiter
            )));
        }
        Ok(())
    }
}

impl Default for BinarizeConfig {
    fn default() -> Self {
        Self {
            offset: DEFAULT_OFFSET,
            sentinel: DEFAULT_SENTINEL,
            delimiter: DEFAULT_DELIMITER,
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
        }
    }
}

/// Builder for [`BinarizeConfig`].
#[derive(Debug, Default, Clone)]
pub struct BinarizeBuilder {
    cfg: BinarizeConfig,
}

impl BinarizeBuilder {
    /// Creates a builder with [`BinarizeConfig::default`] settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the id offset.
    #[must_use]
    pub fn offset(mut self, value: i32) -> Self {
        self.cfg.offset = value;
        self
    }

    /// Sets the record terminator.
    #[must_use]
    pub fn sentinel(mut self, value: i32) -> Self {
        self.cfg.sentinel = value;
        self
    }

    /// Sets the field delimiter.
    #[must_use]
    pub fn delimiter(mut self, value: u8) -> Self {
        self.cfg.delimiter = value;
        self
    }

    /// Sets the number of blank lines between progress notices.
    #[must_use]
    pub fn progress_interval(mut self, value: u64) -> Self {
        self.cfg.progress_interval = value;
        self
    }

    /// Finalises the builder, returning a validated [`BinarizeConfig`].
    pub fn build(self) -> Result<BinarizeConfig> {
        self.cfg.validate()?;
        Ok(self.cfg)
    }
}

/// Configuration controlling how encoded records are grouped when read back.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReaderConfig {
    /// Yield one record per chunk instead of grouping records between blank records.
    pub by_line: bool,
    /// In line mode, skip blank records instead of yielding them as empty chunks.
    pub omit_blanks: bool,
}

/// Groups records into blank-delimited chunks.
impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            by_line: false,
            omit_blanks: true,
        }
    }
}

impl ReaderConfig {
    /// Returns a builder initialised with [`ReaderConfig::default`].
    #[must_use]
    pub fn builder() -> ReaderBuilder {
        ReaderBuilder::default()
    }
}

/// Builder for [`ReaderConfig`].
#[derive(Debug, Default, Clone)]
pub struct ReaderBuilder {
    cfg: ReaderConfig,
}

impl ReaderBuilder {
    /// Creates a new builder with [`ReaderConfig::default`] settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Chooses between line mode and blank-delimited chunk mode.
    #[must_use]
    pub fn by_line(mut self, enabled: bool) -> Self {
        self.cfg.by_line = enabled;
        self
    }

    /// Skips blank records in line mode.
    #[must_use]
    pub fn omit_blanks(mut self, enabled: bool) -> Self {
        self.cfg.omit_blanks = enabled;
        self
    }

    /// Finalises the builder, returning the [`ReaderConfig`].
    pub fn build(self) -> ReaderConfig {
        self.cfg
    }
}

/// The three files produced for a base name.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OutputPaths {
    /// Encoded record stream, `<base>.bin`.
    pub bin: PathBuf,
    /// Feature value vocabulary, `<base>.svocab`.
    pub svocab: PathBuf,
    /// Label vocabulary, `<base>.lvocab`.
    pub lvocab: PathBuf,
}

impl OutputPaths {
    /// Derives the output paths by appending the extensions to `base` verbatim.
    ///
    /// `feats.txt` becomes `feats.txt.bin`; an existing extension is never replaced.
    #[must_use]
    pub fn from_base<P: AsRef<Path>>(base: P) -> Self {
        let base = base.as_ref().as_os_str();
        let with_suffix = |suffix: &str| {
            let mut name = base.to_os_string();
            name.push(suffix);
            PathBuf::from(name)
        };
        Self {
            bin: with_suffix(".bin"),
            svocab: with_suffix(".svocab"),
            lvocab: with_suffix(".lvocab"),
        }
    }
}
