//! Streaming reader for encoded `.bin` files.
//!
//! Records are read up to (not including) the sentinel and the offset is removed from each
//! value, giving back vocabulary ids.  Records can be consumed one at a time or grouped into
//! chunks of consecutive non-blank records separated by blank records.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use crate::codec::read_int;
use crate::config::{BinarizeConfig, ReaderConfig};
use crate::error::{FeatbinError, Result};
use crate::vocab::VocabId;

/// Reader yielding the vocabulary ids of each encoded record.
#[derive(Debug)]
pub struct BinaryRecordReader<R> {
    inner: R,
    offset: i32,
    sentinel: i32,
    cfg: ReaderConfig,
    records_read: u64,
    chunks_read: u64,
    exhausted: bool,
}

impl BinaryRecordReader<BufReader<File>> {
    /// Opens an encoded file on disk.
    pub fn open<P: AsRef<Path>>(
        path: P,
        layout: &BinarizeConfig,
        cfg: ReaderConfig,
    ) -> Result<Self> {
        let path = path.as_ref();
        let file =
            File::open(path).map_err(|err| FeatbinError::io(err, Some(path.to_path_buf())))?;
        Ok(Self::new(BufReader::new(file), layout, cfg))
    }
}

impl<R: Read> BinaryRecordReader<R> {
    /// Wraps `inner`, decoding with the offset and sentinel from `layout`.
    pub fn new(inner: R, layout: &BinarizeConfig, cfg: ReaderConfig) -> Self {
        Self {
            inner,
            offset: layout.offset,
            sentinel: layout.sentinel,
            cfg,
            records_read: 0,
            chunks_read: 0,
            exhausted: false,
        }
    }

    /// Number of records returned so far, blank ones included.
    #[must_use]
    pub fn records_read(&self) -> u64 {
        self.records_read
    }

    /// Number of chunks returned so far.
    #[must_use]
    pub fn chunks_read(&self) -> u64 {
        self.chunks_read
    }

    /// Reads the next record; an empty vector is a blank record.
    ///
    /// A final record missing its sentinel is still returned.  Values in the reserved range
    /// below the offset other than the sentinel are rejected.
    pub fn next_record(&mut self) -> Result<Option<Vec<VocabId>>> {
        if self.exhausted {
            return Ok(None);
        }
        let mut ids = Vec::new();
        loop {
            let Some(value) = read_int(&mut self.inner)? else {
                self.exhausted = true;
                if ids.is_empty() {
                    return Ok(None);
                }
                break;
            };
            if value == self.sentinel {
                break;
            }
            if value < self.offset {
                return Err(FeatbinError::Format(format!(
                    "record {} contains reserved value {value}",
                    self.records_read + 1
                )));
            }
            ids.push((value - self.offset) as VocabId);
        }
        self.records_read += 1;
        Ok(Some(ids))
    }

    /// Reads the next chunk according to the [`ReaderConfig`].
    ///
    /// In line mode a chunk holds exactly one record (blank records are skipped when
    /// `omit_blanks` is set).  Otherwise a chunk is the run of non-blank records up to the
    /// next blank record; leading and repeated blank records never produce empty chunks.
    pub fn next_chunk(&mut self) -> Result<Option<Vec<Vec<VocabId>>>> {
        let mut chunk = Vec::new();
        while let Some(record) = self.next_record()? {
            let blank = record.is_empty();
            if self.cfg.by_line {
                if blank && self.cfg.omit_blanks {
                    continue;
                }
                chunk.push(record);
                break;
            }
            if blank {
                if chunk.is_empty() {
                    continue;
                }
                break;
            }
            chunk.push(record);
        }
        if chunk.is_empty() {
            return Ok(None);
        }
        self.chunks_read += 1;
        Ok(Some(chunk))
    }

    /// Iterates chunks until the stream is exhausted.
    pub fn chunks(&mut self) -> Chunks<'_, R> {
        Chunks { reader: self }
    }
}

impl<R: Read> Iterator for BinaryRecordReader<R> {
    type Item = Result<Vec<VocabId>>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.next_record() {
            Ok(record) => record.map(Ok),
            Err(err) => {
                self.exhausted = true;
                Some(Err(err))
            }
        }
    }
}

/// Iterator returned by [`BinaryRecordReader::chunks`].
#[derive(Debug)]
pub struct Chunks<'a, R> {
    reader: &'a mut BinaryRecordReader<R>,
}

impl<R: Read> Iterator for Chunks<'_, R> {
    type Item = Result<Vec<Vec<VocabId>>>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.reader.next_chunk() {
            Ok(chunk) => chunk.map(Ok),
            Err(err) => {
                self.reader.exhausted = true;
                Some(Err(err))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::write_int;

    fn encode(values: &[i32]) -> Vec<u8> {
        let mut out = Vec::new();
        for &value in values {
            write_int(&mut out, value).expect("write");
        }
        out
    }

    fn reader(values: &[i32], cfg: ReaderConfig) -> BinaryRecordReader<std::io::Cursor<Vec<u8>>> {
        BinaryRecordReader::new(
            std::io::Cursor::new(encode(values)),
            &BinarizeConfig::default(),
            cfg,
        )
    }

    #[test]
    fn records_strip_offset_and_sentinel() {
        let values = [20, 21, 20, 10, 10, 22, 20, 10];
        let records: Vec<Vec<VocabId>> = reader(&values, ReaderConfig::default())
            .collect::<Result<_>>()
            .expect("records");
        assert_eq!(records, vec![vec![0, 1, 0], vec![], vec![2, 0]]);
    }

    #[test]
    fn unterminated_final_record_is_returned() {
        let mut rdr = reader(&[20, 10, 21, 22], ReaderConfig::default());
        assert_eq!(rdr.next_record().expect("first"), Some(vec![0]));
        assert_eq!(rdr.next_record().expect("second"), Some(vec![1, 2]));
        assert_eq!(rdr.next_record().expect("eof"), None);
        assert_eq!(rdr.records_read(), 2);
    }

    #[test]
    fn reserved_values_are_rejected() {
        let mut rdr = reader(&[20, 5, 10], ReaderConfig::default());
        let err = rdr.next_record().expect_err("reserved");
        assert!(matches!(err, FeatbinError::Format(msg) if msg.contains("reserved value 5")));
    }

    #[test]
    fn truncated_integer_is_a_format_error() {
        let mut bytes = encode(&[20, 10]);
        bytes.extend_from_slice(&[0, 0]);
        let mut rdr = BinaryRecordReader::new(
            bytes.as_slice(),
            &BinarizeConfig::default(),
            ReaderConfig::default(),
        );
        assert_eq!(rdr.next().expect("first").expect("ok"), vec![0]);
        assert!(rdr.next().expect("second").is_err());
        assert!(rdr.next().is_none());
    }

    #[test]
    fn default_groups_between_blank_records() {
        let cfg = ReaderConfig::default();
        let values = [10, 10, 20, 10, 21, 10, 10, 10, 22, 10];
        let mut rdr = reader(&values, cfg);
        let chunks: Vec<Vec<Vec<VocabId>>> =
            rdr.chunks().collect::<Result<_>>().expect("chunks");
        assert_eq!(chunks, vec![vec![vec![0], vec![1]], vec![vec![2]]]);
        assert_eq!(rdr.chunks_read(), 2);
    }

    #[test]
    fn line_mode_can_skip_blanks() {
        let values = [20, 10, 10, 21, 10];
        let cfg = ReaderConfig::builder().by_line(true).omit_blanks(false).build();
        let keep: Vec<_> = reader(&values, cfg)
            .chunks()
            .collect::<Result<Vec<_>>>()
            .expect("chunks");
        assert_eq!(keep, vec![vec![vec![0]], vec![vec![]], vec![vec![1]]]);

        let cfg = ReaderConfig::builder().by_line(true).omit_blanks(true).build();
        let skip: Vec<_> = reader(&values, cfg)
            .chunks()
            .collect::<Result<Vec<_>>>()
            .expect("chunks");
        assert_eq!(skip, vec![vec![vec![0]], vec![vec![1]]]);
    }
}
