//! Reconstruction of feature text from an encoded file and its vocabularies.

use std::fmt;
use std::io::{Read, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::config::{BinarizeConfig, OutputPaths, ReaderConfig};
use crate::error::{FeatbinError, Result};
use crate::reader::BinaryRecordReader;
use crate::vocab::{VocabId, Vocabulary};

/// Maps encoded records back to delimited text.
#[derive(Debug, Clone)]
pub struct Decoder {
    features: Vocabulary,
    labels: Vocabulary,
    layout: BinarizeConfig,
}

impl Decoder {
    /// Creates a decoder from already loaded vocabularies.
    pub fn new(features: Vocabulary, labels: Vocabulary, layout: BinarizeConfig) -> Result<Self> {
        layout.validate()?;
        Ok(Self {
            features,
            labels,
            layout,
        })
    }

    /// Loads `<base>.svocab` and `<base>.lvocab`.
    pub fn from_base<P: AsRef<Path>>(base: P, layout: BinarizeConfig) -> Result<Self> {
        let paths = OutputPaths::from_base(base);
        let features = Vocabulary::load("feature", &paths.svocab)?;
        let labels = Vocabulary::load("label", &paths.lvocab)?;
        Self::new(features, labels, layout)
    }

    /// Feature value vocabulary.
    #[must_use]
    pub fn features(&self) -> &Vocabulary {
        &self.features
    }

    /// Label vocabulary.
    #[must_use]
    pub fn labels(&self) -> &Vocabulary {
        &self.labels
    }

    /// Renders one record without a line terminator; a blank record renders as no bytes.
    ///
    /// `record` is the one-based record number used in error messages.
    pub fn decode_record(&self, ids: &[VocabId], record: u64) -> Result<Vec<u8>> {
        let Some((&label, features)) = ids.split_last() else {
            return Ok(Vec::new());
        };
        let mut line = Vec::new();
        for &id in features {
            line.extend_from_slice(lookup(&self.features, id, record)?);
            line.push(self.layout.delimiter);
        }
        line.extend_from_slice(lookup(&self.labels, label, record)?);
        Ok(line)
    }

    /// Decodes every record from `input`, writing one line per record to `output`.
    pub fn decode_stream<R: Read, W: Write>(&self, input: R, mut output: W) -> Result<u64> {
        let mut reader = BinaryRecordReader::new(input, &self.layout, every_record());
        while let Some(ids) = reader.next_record()? {
            let line = self.decode_record(&ids, reader.records_read())?;
            output
                .write_all(&line)
                .and_then(|()| output.write_all(b"\n"))
                .map_err(|err| FeatbinError::io(err, None))?;
        }
        output.flush().map_err(|err| FeatbinError::io(err, None))?;
        Ok(reader.records_read())
    }

    /// Builds a [`BinaryReport`] from records, failing on the first unresolvable id.
    pub fn inspect_records<I>(&self, records: I) -> Result<BinaryReport>
    where
        I: IntoIterator<Item = Result<Vec<VocabId>>>,
    {
        let mut report = BinaryReport {
            feature_values: self.features.len(),
            labels: self.labels.len(),
            ..BinaryReport::default()
        };
        let mut features_used = vec![false; self.features.len()];
        let mut labels_used = vec![false; self.labels.len()];
        for ids in records {
            let ids = ids?;
            report.records += 1;
            report.integers += ids.len() as u64 + 1;
            let Some((&label, features)) = ids.split_last() else {
                report.blanks += 1;
                continue;
            };
            report.vectors += 1;
            for &id in features {
                lookup(&self.features, id, report.records)?;
                features_used[id as usize] = true;
            }
            lookup(&self.labels, label, report.records)?;
            labels_used[label as usize] = true;
        }
        report.features_used = features_used.iter().filter(|used| **used).count();
        report.labels_used = labels_used.iter().filter(|used| **used).count();
        Ok(report)
    }
}

/// Line mode that keeps blank records, so record numbers match input line numbers.
fn every_record() -> ReaderConfig {
    ReaderConfig::builder().by_line(true).omit_blanks(false).build()
}

fn lookup(vocab: &Vocabulary, id: VocabId, record: u64) -> Result<&[u8]> {
    vocab.get(id).ok_or_else(|| FeatbinError::MalformedRecord {
        line: record,
        reason: format!(
            "{} id {id} is outside the {} entries of its vocabulary",
            vocab.name(),
            vocab.len()
        ),
    })
}

/// Consistency report for an encoded file and its vocabularies.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct BinaryReport {
    /// Records read, blank ones included.
    pub records: u64,
    /// Non-blank records.
    pub vectors: u64,
    /// Blank records.
    pub blanks: u64,
    /// Integers in the file, sentinels included.
    pub integers: u64,
    /// Entries in `.svocab`.
    pub feature_values: usize,
    /// Entries in `.lvocab`.
    pub labels: usize,
    /// Distinct feature ids referenced by the binary file.
    pub features_used: usize,
    /// Distinct label ids referenced by the binary file.
    pub labels_used: usize,
}

impl fmt::Display for BinaryReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Records        : {}", self.records)?;
        writeln!(f, "Vectors        : {}", self.vectors)?;
        writeln!(f, "Blank records  : {}", self.blanks)?;
        writeln!(f, "Integers       : {}", self.integers)?;
        writeln!(
            f,
            "Feature values : {} ({} referenced)",
            self.feature_values, self.features_used
        )?;
        write!(
            f,
            "Labels         : {} ({} referenced)",
            self.labels, self.labels_used
        )
    }
}

/// Reads `<base>.bin` and checks every id against `<base>.svocab` and `<base>.lvocab`.
pub fn inspect<P: AsRef<Path>>(base: P, layout: &BinarizeConfig) -> Result<BinaryReport> {
    let base = base.as_ref();
    let decoder = Decoder::from_base(base, layout.clone())?;
    let paths = OutputPaths::from_base(base);
    let reader = BinaryRecordReader::open(&paths.bin, layout, every_record())?;
    decoder.inspect_records(reader)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::Driver;
    use std::fs;
    use tempfile::tempdir;

    fn vocab(name: &'static str, entries: &[&str]) -> Vocabulary {
        let mut vocab = Vocabulary::for_offset(name, 20);
        for entry in entries {
            vocab.resolve(entry).expect("resolve");
        }
        vocab
    }

    fn decoder() -> Decoder {
        Decoder::new(
            vocab("feature", &["a", "b", "c"]),
            vocab("label", &["X"]),
            BinarizeConfig::default(),
        )
        .expect("decoder")
    }

    #[test]
    fn decode_record_splits_label_from_features() {
        let decoder = decoder();
        assert_eq!(decoder.decode_record(&[0, 1, 0], 1).expect("record"), b"a\tb\tX");
        assert_eq!(decoder.decode_record(&[0], 2).expect("label only"), b"X");
        assert!(decoder.decode_record(&[], 3).expect("blank").is_empty());
    }

    #[test]
    fn unknown_id_is_a_malformed_record() {
        let err = decoder().decode_record(&[0, 4], 7).expect_err("unknown label");
        assert!(matches!(
            err,
            FeatbinError::MalformedRecord { line: 7, reason } if reason.contains("label id 4")
        ));
    }

    #[test]
    fn text_survives_encode_then_decode() {
        let dir = tempdir().expect("tempdir");
        let base = dir.path().join("corpus");
        let text = "a\tb\tX\n\nc\tX\n \t\tY\n";
        Driver::new(BinarizeConfig::default(), &base)
            .expect("driver")
            .run_reader(text.as_bytes())
            .expect("encode");

        let decoder = Decoder::from_base(&base, BinarizeConfig::default()).expect("decoder");
        let bin = fs::read(OutputPaths::from_base(&base).bin).expect("bin");
        let mut decoded = Vec::new();
        let records = decoder
            .decode_stream(bin.as_slice(), &mut decoded)
            .expect("decode");
        assert_eq!(records, 4);
        assert_eq!(String::from_utf8(decoded).expect("utf8"), text);
    }

    #[test]
    fn non_utf8_values_survive_encode_then_decode() {
        let dir = tempdir().expect("tempdir");
        let base = dir.path().join("latin1");
        let text: &[u8] = b"caf\xe9\tX\n\n\xff\tcaf\xe9\n";
        Driver::new(BinarizeConfig::default(), &base)
            .expect("driver")
            .run_reader(text)
            .expect("encode");

        let decoder = Decoder::from_base(&base, BinarizeConfig::default()).expect("decoder");
        let bin = fs::read(OutputPaths::from_base(&base).bin).expect("bin");
        let mut decoded = Vec::new();
        decoder
            .decode_stream(bin.as_slice(), &mut decoded)
            .expect("decode");
        assert_eq!(decoded, text);
    }

    #[test]
    fn inspect_reports_counts_and_usage() {
        let dir = tempdir().expect("tempdir");
        let base = dir.path().join("corpus");
        Driver::new(BinarizeConfig::default(), &base)
            .expect("driver")
            .run_reader("a\tb\tX\n\nc\tX\n".as_bytes())
            .expect("encode");

        let report = inspect(&base, &BinarizeConfig::default()).expect("inspect");
        assert_eq!(
            report,
            BinaryReport {
                records: 3,
                vectors: 2,
                blanks: 1,
                integers: 8,
                feature_values: 3,
                labels: 1,
                features_used: 3,
                labels_used: 1,
            }
        );
    }

    #[test]
    fn inspect_flags_truncated_vocabulary() {
        let dir = tempdir().expect("tempdir");
        let base = dir.path().join("corpus");
        Driver::new(BinarizeConfig::default(), &base)
            .expect("driver")
            .run_reader("a\tX\nb\tY\n".as_bytes())
            .expect("encode");
        fs::write(OutputPaths::from_base(&base).lvocab, "X\n").expect("truncate");

        let err = inspect(&base, &BinarizeConfig::default()).expect_err("Y is missing");
        assert!(matches!(err, FeatbinError::MalformedRecord { line: 2, .. }));
    }
}
