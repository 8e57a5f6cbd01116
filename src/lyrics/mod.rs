//! Synchronized lyrics resolution.
//!
//! Produces a path to an LRC file for an audio file, trying in order:
//!
//! 1. **Cache** - `{cache_dir}/{key}.lrc`, valid while it is at least as new
//!    as the audio file
//! 2. **Embedded** - the richest millisecond-timed `SYLT` frame, rendered to
//!    LRC and written to the cache
//! 3. **Sibling** - a `.lrc` file next to the audio file with the same base
//!    name, matched case-insensitively
//!
//! Nothing here ever fails the caller: every problem is logged and treated as
//! "no lyrics from this source".

pub mod lrc;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, trace};

use crate::error::Result;
use crate::fs::FileSystem;
use crate::tags::{SyncedLyrics, TagReader, TimestampUnit};

/// Cache key for an audio file: URL-safe base64 of the SHA-256 of its
/// absolute path.
pub fn cache_key(audio: &Path) -> String {
    let absolute = std::path::absolute(audio).unwrap_or_else(|_| audio.to_path_buf());
    let digest = Sha256::digest(absolute.to_string_lossy().as_bytes());
    URL_SAFE_NO_PAD.encode(digest)
}

/// Resolves LRC files for audio files.
pub struct LyricsResolver {
    fs: Arc<dyn FileSystem>,
    tags: Arc<dyn TagReader>,
    cache_dir: PathBuf,
}

impl LyricsResolver {
    pub fn new(
        fs: Arc<dyn FileSystem>,
        tags: Arc<dyn TagReader>,
        cache_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            fs,
            tags,
            cache_dir: cache_dir.into(),
        }
    }

    /// Where the cached LRC for `audio` lives.
    pub fn cache_path(&self, audio: &Path) -> PathBuf {
        self.cache_dir.join(format!("{}.lrc", cache_key(audio)))
    }

    /// Cache, then embedded frames, then a sibling `.lrc`.
    pub async fn resolve(&self, audio: &Path) -> Option<PathBuf> {
        if let Some(path) = self.resolve_embedded(audio).await {
            return Some(path);
        }
        self.find_sibling_lrc(audio).await
    }

    /// Cached or freshly extracted embedded lyrics.
    pub async fn resolve_embedded(&self, audio: &Path) -> Option<PathBuf> {
        let cache = self.cache_path(audio);
        if self.is_fresh(&cache, audio).await {
            trace!(path = %audio.display(), "Lyrics cache hit");
            return Some(cache);
        }

        match self.extract_embedded(audio, &cache).await {
            Ok(found) => found,
            Err(e) => {
                debug!(path = %audio.display(), error = %e, "Embedded lyrics unavailable");
                None
            }
        }
    }

    /// A `.lrc` next to `audio` with the same base name.
    ///
    /// Names are compared literally, ignoring case, so wildcard characters
    /// in the audio file's name match only themselves.
    pub async fn find_sibling_lrc(&self, audio: &Path) -> Option<PathBuf> {
        let stem = audio.file_stem()?.to_string_lossy().to_lowercase();
        let dir = match audio.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        };

        match self.fs.list_dir(dir).await {
            Ok(entries) => entries
                .into_iter()
                .filter(|candidate| is_lrc_named(candidate, &stem))
                .min(),
            Err(e) => {
                debug!(dir = %dir.display(), error = %e, "Sibling lyrics search failed");
                None
            }
        }
    }

    async fn is_fresh(&self, cache: &Path, audio: &Path) -> bool {
        let Ok(cached) = self.fs.stat(cache).await else {
            return false;
        };
        match self.fs.stat(audio).await {
            Ok(source) => cached.modified >= source.modified,
            Err(_) => false,
        }
    }

    async fn extract_embedded(&self, audio: &Path, cache: &Path) -> Result<Option<PathBuf>> {
        let tags = Arc::clone(&self.tags);
        let path = audio.to_path_buf();
        let frames = tokio::task::spawn_blocking(move || tags.read_synced_lyrics(&path)).await??;

        let Some(frame) = richest(frames) else {
            return Ok(None);
        };
        if frame.unit != TimestampUnit::Milliseconds {
            debug!(path = %audio.display(), unit = ?frame.unit, "Skipping lyrics frame with unsupported timestamps");
            return Ok(None);
        }

        let text = lrc::render(&frame.lines);
        if text.is_empty() {
            return Ok(None);
        }

        if let Some(parent) = cache.parent() {
            self.fs.create_dir_all(parent).await?;
        }
        self.fs.write(cache, text.as_bytes()).await?;
        debug!(path = %audio.display(), cache = %cache.display(), "Cached embedded lyrics");
        Ok(Some(cache.to_path_buf()))
    }
}

/// `{stem}.lrc`, ignoring case. `stem` must already be lowercase.
fn is_lrc_named(candidate: &Path, stem: &str) -> bool {
    candidate
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("lrc"))
        && candidate
            .file_stem()
            .is_some_and(|s| s.to_string_lossy().to_lowercase() == stem)
}

/// The frame with the most text; the first one wins a tie.
fn richest(frames: Vec<SyncedLyrics>) -> Option<SyncedLyrics> {
    let mut best: Option<(usize, SyncedLyrics)> = None;
    for frame in frames {
        let len = frame.text_len();
        if best.as_ref().is_none_or(|(best_len, _)| len > *best_len) {
            best = Some((len, frame));
        }
    }
    best.map(|(_, frame)| frame)
}
