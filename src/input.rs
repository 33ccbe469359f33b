//! Facilities for opening feature files and iterating their raw lines.

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};

use crate::error::{FeatbinError, Result};

/// Path that selects standard input instead of a file.
pub const STDIN_PATH: &str = "-";

/// Opens `path` for buffered reading, treating `-` as standard input.
pub fn open_input<P: AsRef<Path>>(path: P) -> Result<Box<dyn BufRead>> {
    let path = path.as_ref();
    if path.as_os_str() == STDIN_PATH {
        return Ok(Box::new(BufReader::new(io::stdin())));
    }
    let file = File::open(path).map_err(|err| FeatbinError::io(err, Some(path.to_path_buf())))?;
    Ok(Box::new(BufReader::new(file)))
}

/// Iterator over the lines of a reader, each with its terminator still attached.
///
/// Unlike [`BufRead::lines`] nothing is stripped or decoded: lines are raw bytes, so callers
/// decide what counts as the terminator.  IO errors are tagged with the source path.
#[derive(Debug)]
pub struct RawLines<R> {
    reader: R,
    path: Option<PathBuf>,
    done: bool,
}

impl<R: BufRead> RawLines<R> {
    /// Wraps `reader`.
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            path: None,
            done: false,
        }
    }

    /// Records the path behind the reader for error messages.
    #[must_use]
    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }
}

impl<R: BufRead> Iterator for RawLines<R> {
    type Item = Result<Vec<u8>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let mut line = Vec::new();
        match self.reader.read_until(b'\n', &mut line) {
            Ok(0) => {
                self.done = true;
                None
            }
            Ok(_) => Some(Ok(line)),
            Err(err) => {
                self.done = true;
                Some(Err(FeatbinError::io(err, self.path.clone())))
            }
        }
    }
}

/// Opens `path` and returns its raw lines; see [`open_input`].
pub fn read_lines<P: AsRef<Path>>(path: P) -> Result<RawLines<Box<dyn BufRead>>> {
    let path = path.as_ref();
    Ok(RawLines::new(open_input(path)?).with_path(path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn raw_lines_keep_terminators() {
        let lines: Vec<Vec<u8>> = RawLines::new(&b"a\tX\n\r\nlast"[..])
            .collect::<Result<_>>()
            .expect("lines");
        assert_eq!(lines, vec![b"a\tX\n".to_vec(), b"\r\n".to_vec(), b"last".to_vec()]);
    }

    #[test]
    fn read_lines_from_file() {
        let dir = tempdir().expect("tempdir");
        let file = dir.path().join("feats.txt");
        fs::write(&file, "a\tX\n\nb\tY\n").expect("write");
        let lines: Vec<Vec<u8>> = read_lines(&file)
            .expect("open")
            .collect::<Result<_>>()
            .expect("lines");
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[1], b"\n");
    }

    #[test]
    fn missing_input_reports_path() {
        let dir = tempdir().expect("tempdir");
        let missing = dir.path().join("absent.txt");
        let err = open_input(&missing).err().expect("missing file");
        assert!(matches!(err, FeatbinError::Io { path: Some(p), .. } if p == missing));
    }

    #[test]
    fn invalid_utf8_is_passed_through() {
        let bytes: &[u8] = b"ok\n\xff\xfe\nafter";
        let lines: Vec<Vec<u8>> = RawLines::new(bytes).collect::<Result<_>>().expect("lines");
        assert_eq!(
            lines,
            vec![b"ok\n".to_vec(), b"\xff\xfe\n".to_vec(), b"after".to_vec()]
        );
    }
}
