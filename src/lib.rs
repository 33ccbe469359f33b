//! Streaming binarizer for tab-separated feature files.
//!
//! Each input line is a record whose last field is a label and whose preceding fields are
//! feature values.  Feature values and labels are indexed in two independent insertion-ordered
//! vocabularies, and every record is written as big-endian 32-bit integers (`id + 20`)
//! terminated by the sentinel `10`; blank lines become a bare sentinel.  The crate exposes both
//! a library API and a `featbin` command line interface.
//!
//! ```no_run
//! use featbin::{binarize_file, BinarizeConfig};
//!
//! # fn main() -> featbin::Result<()> {
//! let cfg = BinarizeConfig::builder().progress_interval(0).build()?;
//! let summary = binarize_file("features.txt", cfg)?;
//! println!("{} vectors, {} labels", summary.stats.vectors, summary.labels);
//! # Ok(())
//! # }
//! ```
//!
//! The CLI is enabled by default through the `cli` feature.  Users targeting the
//! library portion only can disable default features to avoid the CLI
//! dependencies: `featbin = { version = "...", default-features = false }`.

#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    clippy::all,
    rust_2018_idioms,
    future_incompatible,
    unused_lifetimes,
    unreachable_pub
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::missing_panics_doc,
    clippy::missing_errors_doc,
    clippy::doc_markdown
)]

pub mod binarizer;
pub mod codec;
pub mod config;
pub mod decode;
pub mod driver;
pub mod error;
pub mod input;
pub mod reader;
pub mod record;
pub mod vocab;

pub use binarizer::{BinarizeStats, Binarizer};
pub use config::{BinarizeBuilder, BinarizeConfig, OutputPaths, ReaderConfig};
pub use decode::{inspect, BinaryReport, Decoder};
pub use driver::{binarize_file, binarize_to, Driver, RunSummary};
pub use error::{FeatbinError, Result};
pub use reader::BinaryRecordReader;
pub use record::Record;
pub use vocab::{VocabId, VocabWriter, Vocabulary};
