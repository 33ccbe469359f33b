//! Run driver: owns the output files for one pass over a feature file.

use std::fmt;
use std::fs::File;
use std::io::{BufRead, BufWriter};
use std::path::Path;
use std::time::{Duration, Instant};

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::binarizer::{BinarizeStats, Binarizer};
use crate::config::{BinarizeConfig, OutputPaths};
use crate::error::{FeatbinError, Result};
use crate::input::{read_lines, RawLines, STDIN_PATH};
use crate::vocab::{VocabWriter, Vocabulary};

/// Outcome of a completed run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RunSummary {
    /// Files written by the run.
    pub outputs: OutputPaths,
    /// Line, record and integer counters.
    pub stats: BinarizeStats,
    /// Distinct feature value strings written to `.svocab`.
    pub feature_values: usize,
    /// Distinct labels written to `.lvocab`.
    pub labels: usize,
    /// Wall-clock duration of the run.
    pub elapsed: Duration,
}

impl RunSummary {
    /// Serialises the summary as pretty JSON.
    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Emits the three summary lines through the `log` facade.
    pub fn log(&self) {
        info!(
            "Wrote {} vectors to {}",
            self.stats.vectors,
            self.outputs.bin.display()
        );
        info!(
            "Wrote {} feature value strings to {}",
            self.feature_values,
            self.outputs.svocab.display()
        );
        info!(
            "Wrote {} labels to {}",
            self.labels,
            self.outputs.lvocab.display()
        );
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Vectors        : {}", self.stats.vectors)?;
        writeln!(f, "Blank records  : {}", self.stats.blanks)?;
        writeln!(f, "Feature values : {}", self.feature_values)?;
        writeln!(f, "Labels         : {}", self.labels)?;
        writeln!(f, "Binary         : {}", self.outputs.bin.display())?;
        writeln!(f, "Feature vocab  : {}", self.outputs.svocab.display())?;
        write!(f, "Label vocab    : {}", self.outputs.lvocab.display())
    }
}

/// Single-pass driver writing `<base>.bin`, `<base>.svocab` and `<base>.lvocab`.
#[derive(Debug, Clone)]
pub struct Driver {
    cfg: BinarizeConfig,
    outputs: OutputPaths,
}

impl Driver {
    /// Creates a driver writing next to `base`.
    pub fn new<P: AsRef<Path>>(cfg: BinarizeConfig, base: P) -> Result<Self> {
        cfg.validate()?;
        Ok(Self {
            cfg,
            outputs: OutputPaths::from_base(base),
        })
    }

    /// Paths the driver writes.
    #[must_use]
    pub fn outputs(&self) -> &OutputPaths {
        &self.outputs
    }

    /// Encodes every line produced by `lines`.
    pub fn run<I>(&self, lines: I) -> Result<RunSummary>
    where
        I: IntoIterator<Item = Result<Vec<u8>>>,
    {
        self.run_with(lines, |_| {})
    }

    /// Encodes every line produced by `lines`, calling `observe` after each one.
    ///
    /// The three output files are created before the first line is read and are flushed and
    /// closed before this returns.  On error they are closed but left as written so far.
    pub fn run_with<I, F>(&self, lines: I, mut observe: F) -> Result<RunSummary>
    where
        I: IntoIterator<Item = Result<Vec<u8>>>,
        F: FnMut(&BinarizeStats),
    {
        let start = Instant::now();
        let output = create(&self.outputs.bin)?;
        let svocab = create(&self.outputs.svocab)?;
        let lvocab = create(&self.outputs.lvocab)?;

        let features = VocabWriter::new(Vocabulary::for_offset("feature", self.cfg.offset), svocab)
            .with_path(&self.outputs.svocab);
        let labels = VocabWriter::new(Vocabulary::for_offset("label", self.cfg.offset), lvocab)
            .with_path(&self.outputs.lvocab);
        let mut binarizer = Binarizer::from_parts(self.cfg.clone(), output, features, labels)
            .with_output_path(&self.outputs.bin);

        for line in lines {
            let line = line?;
            binarizer.process_line(&line)?;
            observe(&binarizer.stats());
        }

        let done = binarizer.finish()?;
        let summary = RunSummary {
            outputs: self.outputs.clone(),
            stats: done.stats,
            feature_values: done.features.len(),
            labels: done.labels.len(),
            elapsed: start.elapsed(),
        };
        summary.log();
        Ok(summary)
    }

    /// Encodes everything readable from `reader`.
    pub fn run_reader<R: BufRead>(&self, reader: R) -> Result<RunSummary> {
        self.run(RawLines::new(reader))
    }
}

fn create(path: &Path) -> Result<BufWriter<File>> {
    debug!("creating {}", path.display());
    let file = File::create(path).map_err(|err| FeatbinError::io(err, Some(path.to_path_buf())))?;
    Ok(BufWriter::new(file))
}

/// Encodes the feature file at `input`, writing outputs next to `input` itself.
///
/// `feats.txt` produces `feats.txt.bin`, `feats.txt.svocab` and `feats.txt.lvocab`.
pub fn binarize_file<P: AsRef<Path>>(input: P, cfg: BinarizeConfig) -> Result<RunSummary> {
    let input = input.as_ref();
    if input.as_os_str() == STDIN_PATH {
        return Err(FeatbinError::InvalidConfig(
            "reading standard input requires an explicit output base".into(),
        ));
    }
    binarize_to(input, input, cfg)
}

/// Encodes the feature file at `input` (or stdin for `-`), writing outputs next to `base`.
pub fn binarize_to<P, Q>(input: P, base: Q, cfg: BinarizeConfig) -> Result<RunSummary>
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
{
    let input = input.as_ref();
    let driver = Driver::new(cfg, base)?;
    driver.run(read_lines(input)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::decode_int;
    use std::fs;
    use tempfile::tempdir;

    fn read_ints(path: &Path) -> Vec<i32> {
        fs::read(path)
            .expect("read bin")
            .chunks_exact(4)
            .map(|chunk| decode_int(chunk.try_into().expect("4 bytes")))
            .collect()
    }

    #[test]
    fn binarize_file_writes_three_outputs() {
        let dir = tempdir().expect("tempdir");
        let input = dir.path().join("feats.txt");
        fs::write(&input, "a\tb\tX\n\nc\tX\n").expect("write input");

        let summary = binarize_file(&input, BinarizeConfig::default()).expect("run");
        assert_eq!(summary.stats.vectors, 2);
        assert_eq!(summary.stats.blanks, 1);
        assert_eq!(summary.feature_values, 3);
        assert_eq!(summary.labels, 1);

        let paths = OutputPaths::from_base(&input);
        assert_eq!(summary.outputs, paths);
        assert_eq!(read_ints(&paths.bin), vec![20, 21, 20, 10, 10, 22, 20, 10]);
        assert_eq!(fs::read_to_string(&paths.svocab).expect("svocab"), "a\nb\nc\n");
        assert_eq!(fs::read_to_string(&paths.lvocab).expect("lvocab"), "X\n");
    }

    #[test]
    fn vocabulary_lines_match_binary_ids() {
        let dir = tempdir().expect("tempdir");
        let base = dir.path().join("corpus");
        let text = "the\tDT\tB\ncat\tNN\tI\n\nthe\tNN\tB\n";
        let driver = Driver::new(BinarizeConfig::default(), &base).expect("driver");
        driver.run_reader(text.as_bytes()).expect("run");

        let svocab: Vec<String> = fs::read_to_string(&driver.outputs().svocab)
            .expect("svocab")
            .lines()
            .map(str::to_owned)
            .collect();
        let lvocab: Vec<String> = fs::read_to_string(&driver.outputs().lvocab)
            .expect("lvocab")
            .lines()
            .map(str::to_owned)
            .collect();
        let ints = read_ints(&driver.outputs().bin);

        let mut cursor = ints.iter();
        for line in text.lines() {
            if line.trim().is_empty() {
                assert_eq!(cursor.next(), Some(&10));
                continue;
            }
            let fields: Vec<&str> = line.split('\t').collect();
            let (label, features) = fields.split_last().expect("label");
            for feature in features {
                let value = *cursor.next().expect("feature int");
                assert!(value >= 20);
                assert_eq!(&svocab[(value - 20) as usize], feature);
            }
            let value = *cursor.next().expect("label int");
            assert_eq!(&lvocab[(value - 20) as usize], label);
            assert_eq!(cursor.next(), Some(&10));
        }
        assert!(cursor.next().is_none());
    }

    #[test]
    fn observer_sees_every_line() {
        let dir = tempdir().expect("tempdir");
        let driver = Driver::new(BinarizeConfig::default(), dir.path().join("o")).expect("driver");
        let mut seen = Vec::new();
        let lines = [&b"a\tX\n"[..], b"\n", b"b\tY\n"].map(|l| Ok::<_, FeatbinError>(l.to_vec()));
        driver
            .run_with(lines, |stats| seen.push(stats.lines))
            .expect("run");
        assert_eq!(seen, vec![1, 2, 3]);
    }

    #[test]
    fn input_error_aborts_run() {
        let dir = tempdir().expect("tempdir");
        let driver = Driver::new(BinarizeConfig::default(), dir.path().join("o")).expect("driver");
        let lines = vec![
            Ok(b"a\tX\n".to_vec()),
            Err(FeatbinError::io(
                std::io::Error::new(std::io::ErrorKind::InvalidData, "bad bytes"),
                None,
            )),
        ];
        let err = driver.run(lines).expect_err("io error propagates");
        assert!(matches!(err, FeatbinError::Io { .. }));
    }

    #[test]
    fn non_utf8_bytes_are_encoded_verbatim() {
        let dir = tempdir().expect("tempdir");
        let input = dir.path().join("latin1.txt");
        fs::write(&input, b"caf\xe9\tX\n\ncaf\xe9\t\xff\n").expect("write input");

        let summary = binarize_file(&input, BinarizeConfig::default()).expect("run");
        assert_eq!(summary.stats.vectors, 2);
        assert_eq!(summary.stats.blanks, 1);

        let paths = OutputPaths::from_base(&input);
        assert_eq!(read_ints(&paths.bin), vec![20, 20, 10, 10, 20, 21, 10]);
        assert_eq!(fs::read(&paths.svocab).expect("svocab"), b"caf\xe9\n");
        assert_eq!(fs::read(&paths.lvocab).expect("lvocab"), b"X\n\xff\n");
    }

    #[test]
    fn nbsp_only_line_is_a_vector() {
        let dir = tempdir().expect("tempdir");
        let driver = Driver::new(BinarizeConfig::default(), dir.path().join("o")).expect("driver");
        let summary = driver.run_reader("\u{a0}\n".as_bytes()).expect("run");
        assert_eq!(summary.stats.vectors, 1);
        assert_eq!(summary.stats.blanks, 0);
        assert_eq!(summary.labels, 1);
        assert_eq!(read_ints(&driver.outputs().bin), vec![20, 10]);
        assert_eq!(fs::read(&driver.outputs().lvocab).expect("lvocab"), b"\xc2\xa0\n");
    }

    #[test]
    fn missing_output_directory_is_a_resource_error() {
        let dir = tempdir().expect("tempdir");
        let base = dir.path().join("missing").join("out");
        let driver = Driver::new(BinarizeConfig::default(), &base).expect("driver");
        let err = driver.run_reader("a\tX\n".as_bytes()).expect_err("cannot create");
        assert!(matches!(err, FeatbinError::Io { path: Some(_), .. }));
    }

    #[test]
    fn stdin_requires_explicit_base() {
        let err = binarize_file(STDIN_PATH, BinarizeConfig::default()).expect_err("no base");
        assert!(matches!(err, FeatbinError::InvalidConfig(_)));
    }

    #[test]
    fn summary_serialises_counts() {
        let dir = tempdir().expect("tempdir");
        let driver = Driver::new(BinarizeConfig::default(), dir.path().join("o")).expect("driver");
        let summary = driver.run_reader("a\tX\n".as_bytes()).expect("run");
        let json: serde_json::Value =
            serde_json::from_str(&summary.to_json_pretty().expect("json")).expect("parse");
        assert_eq!(json["stats"]["vectors"], 1);
        assert_eq!(json["feature_values"], 1);
        assert_eq!(json["labels"], 1);
    }
}
