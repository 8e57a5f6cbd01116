//! Raw tag access.
//!
//! The [`TagReader`] trait is the seam between the ingestion core and the
//! tag-parsing library. Readers only ever open files for reading and drop
//! the handle before returning; no tag container is ever created or written.
//!
//! Values returned here are raw: nothing is trimmed, normalized, or
//! defaulted. That is the job of [`crate::normalize`] and the extractor.

mod lofty_reader;

pub use lofty_reader::LoftyTagReader;

use std::path::Path;
use std::time::Duration;

/// Errors produced while reading tags.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TagReadError {
    /// Container or codec not recognized by the parser
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// Container recognized but structurally unreadable
    #[error("Corrupt file: {0}")]
    CorruptFile(String),

    /// The file could not be opened or read
    #[error("IO error: {0}")]
    Io(String),
}

impl TagReadError {
    /// Short variant name used for failure classification.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::UnsupportedFormat(_) => "UnsupportedFormat",
            Self::CorruptFile(_) => "CorruptFile",
            Self::Io(_) => "Io",
        }
    }
}

impl From<std::io::Error> for TagReadError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e.to_string())
    }
}

/// Audio stream properties.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AudioProperties {
    pub duration: Duration,
    pub sample_rate: Option<u32>,
    /// Overall audio bitrate in kbps
    pub bitrate: Option<u32>,
    pub channels: Option<u8>,
}

/// An embedded picture, front cover preferred.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbeddedPicture {
    pub data: Vec<u8>,
    pub mime_type: String,
}

/// Raw tag fields as stored in the file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawTags {
    pub title: Option<String>,
    /// Joined performer string as the tag presents it
    pub artist: Option<String>,
    /// Individual performer values when the tag stores several
    pub performers: Vec<String>,
    pub album: Option<String>,
    pub album_artist: Option<String>,
    pub year: Option<u32>,
    pub track: Option<u32>,
    pub track_total: Option<u32>,
    pub disc: Option<u32>,
    pub disc_total: Option<u32>,
    pub genres: Vec<String>,
    pub composer: Option<String>,
    pub grouping: Option<String>,
    pub copyright: Option<String>,
    pub comment: Option<String>,
    pub conductor: Option<String>,
    pub bpm: Option<u32>,
    pub musicbrainz_track_id: Option<String>,
    pub musicbrainz_release_id: Option<String>,
    /// Unsynchronized lyrics text
    pub lyrics: Option<String>,
    pub picture: Option<EmbeddedPicture>,
    pub properties: AudioProperties,
}

/// Unit of the timestamps in a synchronized-lyrics frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimestampUnit {
    /// Absolute milliseconds from the start of the track
    Milliseconds,
    /// MPEG frame counts
    MpegFrames,
}

/// One synchronized-lyrics frame (ID3v2 `SYLT`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncedLyrics {
    pub unit: TimestampUnit,
    /// `(timestamp, text)` pairs in frame order
    pub lines: Vec<(u32, String)>,
}

impl SyncedLyrics {
    /// Total length of all text fragments in characters.
    pub fn text_len(&self) -> usize {
        self.lines.iter().map(|(_, text)| text.chars().count()).sum()
    }
}

/// Read-only access to audio file tags.
pub trait TagReader: Send + Sync {
    /// Read tags and audio properties.
    fn read(&self, path: &Path) -> Result<RawTags, TagReadError>;

    /// Read every synchronized-lyrics frame in the file.
    ///
    /// Returns an empty list when the file has no such frames or its format
    /// cannot carry them.
    fn read_synced_lyrics(&self, path: &Path) -> Result<Vec<SyncedLyrics>, TagReadError>;
}
