//! Per-line encoding of feature records into fixed-width integers.

use std::io::Write;
use std::path::PathBuf;

use log::info;
use serde::{Deserialize, Serialize};

use crate::codec::write_int;
use crate::config::BinarizeConfig;
use crate::error::{FeatbinError, Result};
use crate::record::Record;
use crate::vocab::{VocabId, VocabWriter, Vocabulary};

/// Counters maintained while binarizing a stream.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct BinarizeStats {
    /// Input lines consumed, blank or not.
    pub lines: u64,
    /// Non-blank records written.
    pub vectors: u64,
    /// Blank records written.
    pub blanks: u64,
    /// Integers written to the binary sink, sentinels included.
    pub integers: u64,
}

/// Everything a [`Binarizer`] owned, returned once the stream is exhausted.
#[derive(Debug)]
pub struct Binarized<W, S, L> {
    /// Final counters.
    pub stats: BinarizeStats,
    /// Feature value vocabulary.
    pub features: Vocabulary,
    /// Label vocabulary.
    pub labels: Vocabulary,
    /// Flushed binary sink.
    pub output: W,
    /// Flushed feature vocabulary sink.
    pub feature_sink: S,
    /// Flushed label vocabulary sink.
    pub label_sink: L,
}

/// Resolves each record through the two vocabularies and writes its encoded integers.
///
/// `W` receives the binary stream; `S` and `L` receive one line per new feature value and
/// label respectively, at the moment the value is first seen.
#[derive(Debug)]
pub struct Binarizer<W: Write, S: Write, L: Write> {
    cfg: BinarizeConfig,
    output: W,
    output_path: Option<PathBuf>,
    features: VocabWriter<S>,
    labels: VocabWriter<L>,
    stats: BinarizeStats,
    scratch: Vec<i32>,
}

impl<W: Write, S: Write, L: Write> Binarizer<W, S, L> {
    /// Creates a binarizer with empty vocabularies.
    pub fn new(cfg: BinarizeConfig, output: W, feature_sink: S, label_sink: L) -> Result<Self> {
        cfg.validate()?;
        let features = VocabWriter::new(Vocabulary::for_offset("feature", cfg.offset), feature_sink);
        let labels = VocabWriter::new(Vocabulary::for_offset("label", cfg.offset), label_sink);
        Ok(Self::from_parts(cfg, output, features, labels))
    }

    /// Creates a binarizer around prepared vocabulary writers.
    ///
    /// The configuration is assumed to be validated already.
    pub fn from_parts(
        cfg: BinarizeConfig,
        output: W,
        features: VocabWriter<S>,
        labels: VocabWriter<L>,
    ) -> Self {
        Self {
            cfg,
            output,
            output_path: None,
            features,
            labels,
            stats: BinarizeStats::default(),
            scratch: Vec::new(),
        }
    }

    /// Records the path backing the binary sink so IO errors can name it.
    #[must_use]
    pub fn with_output_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_path = Some(path.into());
        self
    }

    /// Counters accumulated so far.
    #[must_use]
    pub fn stats(&self) -> BinarizeStats {
        self.stats
    }

    /// Feature value vocabulary built so far.
    #[must_use]
    pub fn features(&self) -> &Vocabulary {
        self.features.vocabulary()
    }

    /// Label vocabulary built so far.
    #[must_use]
    pub fn labels(&self) -> &Vocabulary {
        self.labels.vocabulary()
    }

    /// Encodes one raw input line, returning the integers written for it.
    pub fn process_line(&mut self, line: &[u8]) -> Result<&[i32]> {
        self.stats.lines += 1;
        let record = Record::parse(line, self.cfg.delimiter);
        let mut encoded = std::mem::take(&mut self.scratch);
        encoded.clear();
        encoded.reserve(record.encoded_len());
        let resolved = self.encode_record(&record, &mut encoded);
        self.scratch = encoded;
        resolved?;

        for &value in &self.scratch {
            write_int(&mut self.output, value)
                .map_err(|err| FeatbinError::io(err, self.output_path.clone()))?;
        }
        self.stats.integers += self.scratch.len() as u64;

        if record.is_blank() {
            if progress_due(self.stats.blanks, self.cfg.progress_interval) {
                info!("blank lines encountered: {}", self.stats.blanks);
            }
            self.stats.blanks += 1;
        } else {
            self.stats.vectors += 1;
        }
        Ok(&self.scratch)
    }

    /// Resolves `record` through the vocabularies and appends its integers to `encoded`.
    ///
    /// Blank records touch neither vocabulary.
    pub fn encode_record(&mut self, record: &Record<'_>, encoded: &mut Vec<i32>) -> Result<()> {
        match record {
            Record::Blank => {}
            Record::Vector { features, label } => {
                for value in features {
                    let id = self.features.resolve(value)?;
                    encoded.push(self.shift(id, "feature")?);
                }
                let id = self.labels.resolve(label)?;
                encoded.push(self.shift(id, "label")?);
            }
        }
        encoded.push(self.cfg.sentinel);
        Ok(())
    }

    fn shift(&self, id: VocabId, vocabulary: &'static str) -> Result<i32> {
        i32::try_from(id)
            .ok()
            .and_then(|id| id.checked_add(self.cfg.offset))
            .ok_or_else(|| FeatbinError::VocabularyOverflow {
                vocabulary,
                limit: Vocabulary::for_offset(vocabulary, self.cfg.offset).limit(),
            })
    }

    /// Flushes every sink and hands back the vocabularies and counters.
    pub fn finish(mut self) -> Result<Binarized<W, S, L>> {
        self.output
            .flush()
            .map_err(|err| FeatbinError::io(err, self.output_path.clone()))?;
        let (features, feature_sink) = self.features.finish()?;
        let (labels, label_sink) = self.labels.finish()?;
        Ok(Binarized {
            stats: self.stats,
            features,
            labels,
            output: self.output,
            feature_sink,
            label_sink,
        })
    }
}

/// A notice is due when the blank lines seen before the current one are a multiple of
/// `interval`, so the first blank line always reports `0`.
fn progress_due(blanks_before: u64, interval: u64) -> bool {
    interval > 0 && blanks_before % interval == 0
}
