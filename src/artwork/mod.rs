//! Album art processing.
//!
//! Embedded picture bytes are handed to an [`ImageProcessor`], which stores
//! the image and derives a light and a dark color swatch. Calls for the same
//! album are serialized through a per-album lock so that two tracks of one
//! album never write the same cover file at the same time; different albums
//! proceed in parallel.

mod store;
mod swatch;

pub use store::CoverArtStore;
pub use swatch::{Swatches, extract_swatches};

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{trace, warn};

use crate::error::Result;

/// Where a cover was stored and its two swatch identifiers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoverArtOutput {
    pub uri: String,
    pub light_swatch: String,
    pub dark_swatch: String,
}

/// Stores cover art and extracts colors from it.
#[async_trait]
pub trait ImageProcessor: Send + Sync {
    async fn save_cover_art_and_extract_colors(
        &self,
        bytes: &[u8],
        album: &str,
        album_artist: &str,
    ) -> Result<CoverArtOutput>;
}

/// Lock key for an album: album artist immediately followed by album title.
pub fn art_key(album: &str, album_artist: &str) -> String {
    format!("{album_artist}{album}")
}

/// Get-or-create registry of per-key async locks.
///
/// Entries are never removed, so the registry grows with the number of
/// distinct albums seen by one processor.
#[derive(Default)]
pub struct KeyedLocks {
    locks: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

impl KeyedLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// The lock for `key`, created on first use.
    pub fn get(&self, key: &str) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = self.locks.lock();
        match locks.get(key) {
            Some(lock) => Arc::clone(lock),
            None => {
                let lock = Arc::new(tokio::sync::Mutex::new(()));
                locks.insert(key.to_string(), Arc::clone(&lock));
                lock
            }
        }
    }

    /// Number of distinct keys seen so far.
    pub fn len(&self) -> usize {
        self.locks.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.lock().is_empty()
    }
}

/// Runs an [`ImageProcessor`] under per-album mutual exclusion.
pub struct ArtworkProcessor {
    images: Arc<dyn ImageProcessor>,
    locks: KeyedLocks,
}

impl ArtworkProcessor {
    pub fn new(images: Arc<dyn ImageProcessor>) -> Self {
        Self {
            images,
            locks: KeyedLocks::new(),
        }
    }

    /// Number of album locks created so far.
    pub fn lock_count(&self) -> usize {
        self.locks.len()
    }

    /// Store `bytes` as the cover of `album` and return its swatches.
    ///
    /// Returns `None` when there is nothing to process or when the image
    /// processor fails; failures are logged.
    pub async fn process(
        &self,
        bytes: &[u8],
        album: &str,
        album_artist: &str,
    ) -> Option<CoverArtOutput> {
        if bytes.is_empty() {
            return None;
        }

        let key = art_key(album, album_artist);
        let lock = self.locks.get(&key);
        let _guard = lock.lock().await;
        trace!(album, album_artist, "Processing cover art");

        match self
            .images
            .save_cover_art_and_extract_colors(bytes, album, album_artist)
            .await
        {
            Ok(output) => Some(output),
            Err(e) => {
                warn!(album, album_artist, error = %e, "Cover art processing failed");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::RecordingImageProcessor;

    #[test]
    fn test_art_key_concatenates_artist_then_album() {
        assert_eq!(art_key("Abbey Road", "The Beatles"), "The BeatlesAbbey Road");
    }

    #[test]
    fn test_keyed_locks_reuse_entries() {
        let locks = KeyedLocks::new();
        let a = locks.get("a");
        let again = locks.get("a");
        let b = locks.get("b");

        assert!(Arc::ptr_eq(&a, &again));
        assert!(!Arc::ptr_eq(&a, &b));
        assert_eq!(locks.len(), 2);
    }

    #[tokio::test]
    async fn test_empty_bytes_are_a_no_op() {
        let images = Arc::new(RecordingImageProcessor::new());
        let processor = ArtworkProcessor::new(images.clone());

        assert!(processor.process(&[], "Album", "Artist").await.is_none());
        assert_eq!(images.calls(), 0);
        assert_eq!(processor.lock_count(), 0);
    }

    #[tokio::test]
    async fn test_processor_error_yields_none() {
        let images = Arc::new(RecordingImageProcessor::failing());
        let processor = ArtworkProcessor::new(images.clone());

        assert!(processor.process(b"png", "Album", "Artist").await.is_none());
        assert_eq!(images.calls(), 1);
    }

    #[tokio::test]
    async fn test_same_album_is_serialized_and_others_overlap() {
        let images = Arc::new(RecordingImageProcessor::new());
        let processor = ArtworkProcessor::new(images.clone());

        let calls = (0..6).map(|i| {
            let album = if i % 2 == 0 { "Even" } else { "Odd" };
            processor.process(b"img", album, "Artist")
        });
        let results = futures::future::join_all(calls).await;

        assert!(results.iter().all(Option::is_some));
        assert_eq!(images.max_in_flight_for(&art_key("Even", "Artist")), 1);
        assert_eq!(images.max_in_flight_for(&art_key("Odd", "Artist")), 1);
        assert_eq!(images.max_in_flight(), 2);
        assert_eq!(images.calls(), 6);
        assert_eq!(processor.lock_count(), 2);
    }

    #[tokio::test]
    async fn test_lock_released_after_failure() {
        let images = Arc::new(RecordingImageProcessor::failing());
        let processor = ArtworkProcessor::new(images.clone());

        assert!(processor.process(b"x", "A", "B").await.is_none());
        // Would hang if the guard leaked
        assert!(processor.process(b"x", "A", "B").await.is_none());
        assert_eq!(images.calls(), 2);
    }
}
