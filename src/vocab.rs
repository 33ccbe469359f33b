//! Insertion-ordered vocabularies mapping strings to dense ids.
//!
//! A [`Vocabulary`] hands out ids `0, 1, 2, ...` in first-occurrence order and never renumbers
//! or forgets an entry.  Entries are raw bytes, so values need not be valid UTF-8.
//! [`VocabWriter`] pairs a vocabulary with a sink and appends each newly seen entry as one
//! line, so the sink always lists the entries in id order.

use std::fs::File;
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use rustc_hash::FxHashMap;

use crate::error::{FeatbinError, Result};

/// Identifier assigned to a vocabulary entry.
pub type VocabId = u32;

/// Outcome of resolving a string through a [`Vocabulary`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lookup {
    /// The string was already present with this id.
    Existing(VocabId),
    /// The string was appended and received this id.
    Inserted(VocabId),
}

impl Lookup {
    /// Returns the id regardless of whether the entry is new.
    #[must_use]
    pub fn id(self) -> VocabId {
        match self {
            Self::Existing(id) | Self::Inserted(id) => id,
        }
    }

    /// Returns `true` when the lookup created the entry.
    #[must_use]
    pub fn is_new(self) -> bool {
        matches!(self, Self::Inserted(_))
    }
}

/// Append-only, insertion-ordered table of byte strings.
#[derive(Debug, Clone)]
pub struct Vocabulary {
    name: &'static str,
    entries: Vec<Vec<u8>>,
    index: FxHashMap<Vec<u8>, VocabId>,
    limit: usize,
}

impl Vocabulary {
    /// Creates an empty vocabulary that accepts at most `limit` entries.
    ///
    /// `name` only appears in error messages.
    #[must_use]
    pub fn with_limit(name: &'static str, limit: usize) -> Self {
        Self {
            name,
            entries: Vec::new(),
            index: FxHashMap::default(),
            limit: limit.min(VocabId::MAX as usize),
        }
    }

    /// Creates an empty vocabulary whose ids stay representable as `i32` once `offset` is
    /// added to them.
    #[must_use]
    pub fn for_offset(name: &'static str, offset: i32) -> Self {
        let headroom = i64::from(i32::MAX) - i64::from(offset.max(0)) + 1;
        Self::with_limit(name, usize::try_from(headroom).unwrap_or(0))
    }

    /// Name used when reporting errors for this vocabulary.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Number of distinct entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` when no entry has been inserted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Maximum number of entries accepted before [`FeatbinError::VocabularyOverflow`].
    #[must_use]
    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Returns the id of `value`, assigning the next sequential id if it is new.
    pub fn resolve<V: AsRef<[u8]>>(&mut self, value: V) -> Result<Lookup> {
        let value = value.as_ref();
        if let Some(&id) = self.index.get(value) {
            return Ok(Lookup::Existing(id));
        }
        if self.entries.len() >= self.limit {
            return Err(FeatbinError::VocabularyOverflow {
                vocabulary: self.name,
                limit: self.limit,
            });
        }
        let id = self.entries.len() as VocabId;
        self.entries.push(value.to_owned());
        self.index.insert(value.to_owned(), id);
        Ok(Lookup::Inserted(id))
    }

    /// Looks up the id of `value` without inserting it.
    #[must_use]
    pub fn id_of<V: AsRef<[u8]>>(&self, value: V) -> Option<VocabId> {
        self.index.get(value.as_ref()).copied()
    }

    /// Returns the entry stored under `id`.
    #[must_use]
    pub fn get(&self, id: VocabId) -> Option<&[u8]> {
        self.entries.get(id as usize).map(Vec::as_slice)
    }

    /// Iterates entries in id order.
    pub fn iter(&self) -> impl Iterator<Item = &[u8]> + '_ {
        self.entries.iter().map(Vec::as_slice)
    }

    /// Reads a newline-delimited vocabulary where line `n` (0-indexed) holds id `n`.
    ///
    /// Only the `\n` terminator is removed; empty lines are legal entries.  An entry listed
    /// twice means the file was not produced by a single run and is rejected.
    pub fn read_from<R: BufRead>(name: &'static str, mut reader: R) -> Result<Self> {
        let mut vocab = Self::with_limit(name, VocabId::MAX as usize);
        let mut line = Vec::new();
        loop {
            line.clear();
            let read = reader
                .read_until(b'\n', &mut line)
                .map_err(|err| FeatbinError::io(err, None))?;
            if read == 0 {
                break;
            }
            let entry = line.strip_suffix(b"\n").unwrap_or(&line);
            if let Lookup::Existing(id) = vocab.resolve(entry)? {
                return Err(FeatbinError::Format(format!(
                    "{name} vocabulary lists {:?} twice (first as id {id})",
                    String::from_utf8_lossy(entry)
                )));
            }
        }
        Ok(vocab)
    }

    /// Loads a vocabulary file from disk, see [`Vocabulary::read_from`].
    pub fn load<P: AsRef<Path>>(name: &'static str, path: P) -> Result<Self> {
        let path = path.as_ref();
        let file =
            File::open(path).map_err(|err| FeatbinError::io(err, Some(path.to_path_buf())))?;
        Self::read_from(name, BufReader::new(file)).map_err(|err| match err {
            FeatbinError::Io { source, path: None } => {
                FeatbinError::io(source, Some(path.to_path_buf()))
            }
            other => other,
        })
    }
}

/// A [`Vocabulary`] that mirrors every insertion into a line-oriented text sink.
#[derive(Debug)]
pub struct VocabWriter<W: Write> {
    vocab: Vocabulary,
    sink: W,
    path: Option<PathBuf>,
}

impl<W: Write> VocabWriter<W> {
    /// Wraps `vocab`; entries already present are assumed to be in `sink` already.
    pub fn new(vocab: Vocabulary, sink: W) -> Self {
        Self {
            vocab,
            sink,
            path: None,
        }
    }

    /// Records the path backing `sink` so IO errors can name it.
    #[must_use]
    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Resolves `value`, appending `value` and a line break to the sink when it is new.
    pub fn resolve<V: AsRef<[u8]>>(&mut self, value: V) -> Result<VocabId> {
        let value = value.as_ref();
        let lookup = self.vocab.resolve(value)?;
        if lookup.is_new() {
            self.sink
                .write_all(value)
                .and_then(|()| self.sink.write_all(b"\n"))
                .map_err(|err| FeatbinError::io(err, self.path.clone()))?;
        }
        Ok(lookup.id())
    }

    /// Read access to the in-memory table.
    #[must_use]
    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocab
    }

    /// Flushes buffered entries to the sink.
    pub fn flush(&mut self) -> Result<()> {
        self.sink
            .flush()
            .map_err(|err| FeatbinError::io(err, self.path.clone()))
    }

    /// Flushes and returns the table together with the sink.
    pub fn finish(mut self) -> Result<(Vocabulary, W)> {
        self.flush()?;
        Ok((self.vocab, self.sink))
    }
}
