//! Error handling utilities shared across the crate.

use std::path::PathBuf;

use thiserror::Error;

/// Convenient result type used throughout the crate.
pub type Result<T, E = FeatbinError> = std::result::Result<T, E>;

/// Domain-specific error describing failures while encoding or decoding feature files.
#[derive(Debug, Error)]
pub enum FeatbinError {
    /// Encoder or reader configuration failed validation.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    /// Filesystem IO error with optional context path.
    #[error("io error while processing {path:?}: {source}")]
    Io {
        /// Underlying IO error returned by the standard library.
        source: std::io::Error,
        /// Target path associated with the IO failure if available.
        path: Option<PathBuf>,
    },
    /// A record could not be mapped to or from its encoded form.
    #[error("malformed record {line}: {reason}")]
    MalformedRecord {
        /// One-based record number within the stream.
        line: u64,
        /// Human readable description of the defect.
        reason: String,
    },
    /// A vocabulary grew past the largest id the integer width can carry.
    #[error("{vocabulary} vocabulary exceeded {limit} entries; ids would overflow i32")]
    VocabularyOverflow {
        /// Which vocabulary overflowed (`feature` or `label`).
        vocabulary: &'static str,
        /// Maximum number of entries the vocabulary may hold.
        limit: usize,
    },
    /// Binary input does not follow the fixed-width integer layout.
    #[error("binary format error: {0}")]
    Format(String),
    /// Serialization or deserialization failure.
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for FeatbinError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl FeatbinError {
    /// Helper constructor that attaches an optional path when wrapping IO errors.
    pub fn io(source: std::io::Error, path: Option<PathBuf>) -> Self {
        Self::Io { source, path }
    }
}
