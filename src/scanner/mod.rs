//! Folder scanning.
//!
//! [`scan`] walks a directory tree for audio files; [`scan_library`] runs
//! every file found through a [`MetadataExtractor`], a bounded number at a
//! time. A file that fails to extract is counted and the scan moves on.

use futures::StreamExt;
use futures::stream::Stream;
use std::path::{Path, PathBuf};
use tokio::sync::mpsc;
use tracing::{debug, info};
use walkdir::WalkDir;

use crate::extract::MetadataExtractor;
use crate::model::SongFileMetadata;

/// Extensions treated as audio, compared case-insensitively.
pub const AUDIO_EXTENSIONS: &[&str] = &["mp3", "flac", "ogg", "opus", "wav", "m4a", "aiff", "wma"];

/// Whether `path` has an audio file extension.
pub fn is_audio_file(path: &Path) -> bool {
    path.extension()
        .and_then(|s| s.to_str())
        .is_some_and(|ext| {
            AUDIO_EXTENSIONS
                .iter()
                .any(|known| known.eq_ignore_ascii_case(ext))
        })
}

/// Scans the given root directory recursively for audio files.
///
/// Returns a Stream of PathBufs.
pub fn scan(root: PathBuf) -> impl Stream<Item = PathBuf> {
    let (tx, rx) = mpsc::channel(100);

    // Spawn a blocking task to perform the synchronous file system traversal
    tokio::task::spawn_blocking(move || {
        for entry in WalkDir::new(root).into_iter().filter_map(|e| e.ok()) {
            if entry.file_type().is_file() && is_audio_file(entry.path()) {
                // If the receiver is dropped, stop scanning
                if tx.blocking_send(entry.into_path()).is_err() {
                    break;
                }
            }
        }
    });

    futures::stream::unfold(rx, |mut rx| async move {
        rx.recv().await.map(|path| (path, rx))
    })
}

/// Result of a library scan.
#[derive(Debug, Default)]
pub struct ScanSummary {
    /// Files extracted, failures included
    pub processed: usize,
    /// Files whose extraction failed
    pub failed: usize,
    /// Every record, in completion order
    pub songs: Vec<SongFileMetadata>,
}

impl ScanSummary {
    pub fn succeeded(&self) -> usize {
        self.processed - self.failed
    }

    /// Failed records only.
    pub fn failures(&self) -> impl Iterator<Item = &SongFileMetadata> {
        self.songs.iter().filter(|s| s.extraction_failed)
    }
}

/// Extract every audio file under `root`, `concurrency` files at a time.
pub async fn scan_library(
    root: &Path,
    extractor: &MetadataExtractor,
    concurrency: usize,
) -> ScanSummary {
    info!(root = %root.display(), concurrency, "Scanning library");

    let records = scan(root.to_path_buf())
        .map(|path| async move { extractor.extract_metadata(&path).await })
        .buffer_unordered(concurrency.max(1));
    let mut records = std::pin::pin!(records);

    let mut summary = ScanSummary::default();
    while let Some(song) = records.next().await {
        summary.processed += 1;
        if song.extraction_failed {
            summary.failed += 1;
            debug!(
                path = %song.path.display(),
                reason = song.error_message.as_deref().unwrap_or("unknown"),
                "File failed"
            );
        }
        summary.songs.push(song);
    }

    info!(
        processed = summary.processed,
        failed = summary.failed,
        "Scan complete"
    );
    summary
}
