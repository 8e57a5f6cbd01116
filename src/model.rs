//! The per-file extraction record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::normalize::{UNKNOWN_ALBUM, UNKNOWN_ARTIST};

/// Metadata extracted from one audio file.
///
/// Created fresh by every extraction call and handed to the caller, who
/// persists or discards it. Numeric fields are `None` when the tag value is
/// absent or zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SongFileMetadata {
    pub path: PathBuf,
    pub title: String,
    pub artist: String,
    /// Individual performers, normalized and de-duplicated
    pub artists: Vec<String>,
    pub album: String,
    pub album_artist: String,
    pub duration: Duration,

    pub cover_uri: Option<String>,
    pub light_swatch_id: Option<String>,
    pub dark_swatch_id: Option<String>,

    pub year: Option<u32>,
    pub track_number: Option<u32>,
    pub track_count: Option<u32>,
    pub disc_number: Option<u32>,
    pub disc_count: Option<u32>,

    pub sample_rate: Option<u32>,
    /// kbps
    pub bitrate: Option<u32>,
    pub channels: Option<u8>,

    pub created: Option<DateTime<Utc>>,
    pub modified: Option<DateTime<Utc>>,

    /// Unsynchronized lyrics text
    pub lyrics: Option<String>,
    /// Synchronized lyrics in LRC format
    pub lrc_path: Option<PathBuf>,

    pub bpm: Option<u32>,
    pub composer: Option<String>,
    pub grouping: Option<String>,
    pub copyright: Option<String>,
    pub comment: Option<String>,
    pub conductor: Option<String>,
    pub musicbrainz_track_id: Option<String>,
    pub musicbrainz_release_id: Option<String>,
    pub genres: Vec<String>,

    pub extraction_failed: bool,
    /// `CorruptFile`, `UnsupportedFormat` or the failing error kind
    pub error_message: Option<String>,
}

impl SongFileMetadata {
    /// A record with only the path-derived defaults filled in.
    ///
    /// The title is the file name without extension; artist, album artist
    /// and album use the "Unknown" sentinels.
    pub fn for_path(path: &Path) -> Self {
        let title = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();

        Self {
            path: path.to_path_buf(),
            title,
            artist: UNKNOWN_ARTIST.to_string(),
            artists: Vec::new(),
            album: UNKNOWN_ALBUM.to_string(),
            album_artist: UNKNOWN_ARTIST.to_string(),
            duration: Duration::ZERO,
            cover_uri: None,
            light_swatch_id: None,
            dark_swatch_id: None,
            year: None,
            track_number: None,
            track_count: None,
            disc_number: None,
            disc_count: None,
            sample_rate: None,
            bitrate: None,
            channels: None,
            created: None,
            modified: None,
            lyrics: None,
            lrc_path: None,
            bpm: None,
            composer: None,
            grouping: None,
            copyright: None,
            comment: None,
            conductor: None,
            musicbrainz_track_id: None,
            musicbrainz_release_id: None,
            genres: Vec::new(),
            extraction_failed: false,
            error_message: None,
        }
    }
}
