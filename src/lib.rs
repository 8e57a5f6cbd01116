//! Music Ingest - metadata extraction for audio libraries.
//!
//! Turns audio files into [`SongFileMetadata`](model::SongFileMetadata)
//! records: normalized tag fields, synchronized lyrics rendered to a local
//! LRC cache, and cover art with light/dark color swatches. Extraction never
//! fails at the call boundary; failures are recorded on the record itself.
//!
//! The disk, the tag parser and the image processor are injected
//! capabilities ([`fs::FileSystem`], [`tags::TagReader`],
//! [`artwork::ImageProcessor`]), so the whole pipeline runs against test
//! doubles.

pub mod artwork;
pub mod cli;
pub mod config;
pub mod error;
pub mod extract;
pub mod fs;
pub mod lyrics;
pub mod model;
pub mod normalize;
pub mod resolver;
pub mod scanner;
pub mod tags;
#[cfg(test)]
pub mod test_utils;

pub use error::{Error, FailureReason, Result};
pub use extract::{Extraction, MetadataExtractor};
pub use model::SongFileMetadata;
