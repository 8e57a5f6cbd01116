//! Per-file metadata extraction.
//!
//! [`MetadataExtractor`] turns one audio file into a [`SongFileMetadata`].
//! The steps are isolated from each other:
//!
//! 1. Stat the file for timestamps; the title defaults to the file stem
//! 2. Resolve synchronized lyrics (never fatal)
//! 3. Read tags on a blocking thread (fatal on failure)
//! 4. Normalize every text field and apply the "Unknown" fallbacks
//! 5. Store the cover art keyed by the normalized album (never fatal)
//!
//! [`MetadataExtractor::extract_metadata`] is total: whatever happens, the
//! caller gets a record back.

use chrono::{DateTime, Utc};
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::artwork::{ArtworkProcessor, CoverArtStore, ImageProcessor};
use crate::config::{CacheConfig, CachePaths};
use crate::error::{FailureReason, Result};
use crate::fs::{FileSystem, LocalFileSystem};
use crate::lyrics::LyricsResolver;
use crate::model::SongFileMetadata;
use crate::normalize::{
    UNKNOWN_ALBUM, normalize_artist, sanitize, sanitize_multiline, split_artists,
};
use crate::tags::{EmbeddedPicture, LoftyTagReader, RawTags, TagReader};

/// Outcome of one extraction.
#[derive(Debug, Clone, PartialEq)]
pub enum Extraction {
    Complete(SongFileMetadata),
    /// Tag reading failed; `partial` holds whatever was gathered before.
    Failed {
        partial: SongFileMetadata,
        reason: FailureReason,
    },
}

impl Extraction {
    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }

    /// Flatten into a record, marking failures on it.
    pub fn into_metadata(self) -> SongFileMetadata {
        match self {
            Self::Complete(song) => song,
            Self::Failed {
                mut partial,
                reason,
            } => {
                partial.extraction_failed = true;
                partial.error_message = Some(reason.to_string());
                partial
            }
        }
    }
}

/// Extracts metadata from audio files.
///
/// One instance is meant to be shared by every concurrent extraction of a
/// scan, so the per-album artwork locks apply across all of them.
pub struct MetadataExtractor {
    fs: Arc<dyn FileSystem>,
    tags: Arc<dyn TagReader>,
    lyrics: LyricsResolver,
    artwork: ArtworkProcessor,
}

impl MetadataExtractor {
    pub fn new(
        fs: Arc<dyn FileSystem>,
        tags: Arc<dyn TagReader>,
        images: Arc<dyn ImageProcessor>,
        paths: &dyn CachePaths,
    ) -> Self {
        let lyrics = LyricsResolver::new(
            Arc::clone(&fs),
            Arc::clone(&tags),
            paths.lyrics_cache_dir(),
        );
        Self {
            fs,
            tags,
            lyrics,
            artwork: ArtworkProcessor::new(images),
        }
    }

    /// Local disk, lofty tags and the on-disk cover store.
    pub fn with_local_defaults(cache: &CacheConfig) -> Self {
        let fs: Arc<dyn FileSystem> = Arc::new(LocalFileSystem);
        let images = Arc::new(CoverArtStore::new(
            Arc::clone(&fs),
            cache.artwork_cache_dir(),
        ));
        Self::new(fs, Arc::new(LoftyTagReader::new()), images, cache)
    }

    pub fn lyrics(&self) -> &LyricsResolver {
        &self.lyrics
    }

    pub fn artwork(&self) -> &ArtworkProcessor {
        &self.artwork
    }

    /// Extract metadata, never failing.
    ///
    /// Failures, including a panic anywhere in the pipeline, are recorded
    /// in `extraction_failed` and `error_message`.
    pub async fn extract_metadata(&self, path: &Path) -> SongFileMetadata {
        match AssertUnwindSafe(self.extract(path)).catch_unwind().await {
            Ok(extraction) => extraction.into_metadata(),
            Err(_) => {
                warn!(path = %path.display(), "Extraction panicked");
                Extraction::Failed {
                    partial: SongFileMetadata::for_path(path),
                    reason: FailureReason::Other("Panic".to_string()),
                }
                .into_metadata()
            }
        }
    }

    /// Extract metadata, reporting failure as a tagged result.
    pub async fn extract(&self, path: &Path) -> Extraction {
        let mut song = SongFileMetadata::for_path(path);
        match self.populate(&mut song).await {
            Ok(()) => Extraction::Complete(song),
            Err(e) => {
                let reason = FailureReason::from(&e);
                warn!(path = %path.display(), error = %e, %reason, "Extraction failed");
                Extraction::Failed {
                    partial: song,
                    reason,
                }
            }
        }
    }

    async fn populate(&self, song: &mut SongFileMetadata) -> Result<()> {
        let path = song.path.clone();

        match self.fs.stat(&path).await {
            Ok(times) => {
                song.created = times.created.map(DateTime::<Utc>::from);
                song.modified = Some(DateTime::<Utc>::from(times.modified));
            }
            Err(e) => debug!(path = %path.display(), error = %e, "Could not stat file"),
        }

        song.lrc_path = self.lyrics.resolve(&path).await;

        let tags = Arc::clone(&self.tags);
        let read_path = path.clone();
        let raw = tokio::task::spawn_blocking(move || tags.read(&read_path)).await??;

        let cover = match apply_tags(song, raw) {
            Some(picture) => {
                self.artwork
                    .process(&picture.data, &song.album, &song.album_artist)
                    .await
            }
            None => None,
        };

        if let Some(cover) = cover {
            song.cover_uri = Some(cover.uri);
            song.light_swatch_id = Some(cover.light_swatch);
            song.dark_swatch_id = Some(cover.dark_swatch);
        }

        debug!(path = %path.display(), title = %song.title, "Extracted metadata");
        Ok(())
    }
}

/// Copy normalized tag values onto `song`, returning the embedded picture.
fn apply_tags(song: &mut SongFileMetadata, raw: RawTags) -> Option<EmbeddedPicture> {
    if let Some(title) = sanitize(raw.title.as_deref()) {
        song.title = title;
    }

    song.artist = normalize_artist(raw.artist.as_deref());
    song.album_artist = normalize_artist(raw.album_artist.as_deref());
    song.album = sanitize(raw.album.as_deref()).unwrap_or_else(|| UNKNOWN_ALBUM.to_string());
    song.artists = performers(&raw);

    song.year = non_zero(raw.year);
    song.track_number = non_zero(raw.track);
    song.track_count = non_zero(raw.track_total);
    song.disc_number = non_zero(raw.disc);
    song.disc_count = non_zero(raw.disc_total);
    song.bpm = non_zero(raw.bpm);

    song.duration = raw.properties.duration;
    song.sample_rate = non_zero(raw.properties.sample_rate);
    song.bitrate = non_zero(raw.properties.bitrate);
    song.channels = raw.properties.channels.filter(|&c| c != 0);

    song.composer = sanitize(raw.composer.as_deref());
    song.grouping = sanitize(raw.grouping.as_deref());
    song.copyright = sanitize(raw.copyright.as_deref());
    song.comment = sanitize_multiline(raw.comment.as_deref());
    song.conductor = sanitize(raw.conductor.as_deref());
    song.lyrics = sanitize_multiline(raw.lyrics.as_deref());
    song.musicbrainz_track_id = sanitize(raw.musicbrainz_track_id.as_deref());
    song.musicbrainz_release_id = sanitize(raw.musicbrainz_release_id.as_deref());

    let mut genres: Vec<String> = Vec::new();
    for genre in raw.genres.iter().filter_map(|g| sanitize(Some(g))) {
        if !genres.iter().any(|g| g.eq_ignore_ascii_case(&genre)) {
            genres.push(genre);
        }
    }
    song.genres = genres;

    raw.picture.filter(|p| !p.data.is_empty())
}

/// Individual performers: the multi-value field when present, otherwise the
/// joined artist string split on its separators.
fn performers(raw: &RawTags) -> Vec<String> {
    let sources: Vec<&str> = if raw.performers.is_empty() {
        raw.artist.as_deref().into_iter().collect()
    } else {
        raw.performers.iter().map(String::as_str).collect()
    };

    let mut artists: Vec<String> = Vec::new();
    for name in sources.into_iter().flat_map(split_artists) {
        if !artists.iter().any(|a| a.eq_ignore_ascii_case(&name)) {
            artists.push(name);
        }
    }
    artists
}

fn non_zero(value: Option<u32>) -> Option<u32> {
    value.filter(|&v| v != 0)
}
