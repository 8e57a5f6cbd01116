//! Test doubles for the ingestion core's injected capabilities.
//!
//! - [`MemoryFileSystem`]: in-memory [`FileSystem`] with a logical clock, so
//!   modification times are deterministic
//! - [`FakeTagReader`]: scripted [`TagReader`] that counts calls
//! - [`RecordingImageProcessor`]: [`ImageProcessor`] that records how many
//!   calls overlap, per album key and overall
//!
//! # Example
//!
//! ```ignore
//! let fs = Arc::new(MemoryFileSystem::new());
//! fs.add_file(Path::new("/music/a.mp3"), b"audio");
//! let tags = Arc::new(FakeTagReader::new());
//! tags.set_tags(Path::new("/music/a.mp3"), Ok(raw_tags("Title")));
//! ```

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::{Duration, SystemTime};

use crate::artwork::{CoverArtOutput, ImageProcessor, art_key};
use crate::error::{Error, Result};
use crate::fs::{FileSystem, FileTimes};
use crate::tags::{RawTags, SyncedLyrics, TagReadError, TagReader};

// ============================================================================
// File system
// ============================================================================

struct MemoryFile {
    data: Vec<u8>,
    times: FileTimes,
}

/// In-memory file system.
///
/// Every mutation advances a logical clock by one second, so a file written
/// later always has a strictly newer modification time.
#[derive(Default)]
pub struct MemoryFileSystem {
    files: Mutex<HashMap<PathBuf, MemoryFile>>,
    dirs: Mutex<HashSet<PathBuf>>,
    clock: AtomicU64,
    writes: AtomicUsize,
}

impl MemoryFileSystem {
    pub fn new() -> Self {
        Self::default()
    }

    fn tick(&self) -> SystemTime {
        let secs = self.clock.fetch_add(1, Ordering::SeqCst) + 1;
        SystemTime::UNIX_EPOCH + Duration::from_secs(1_700_000_000 + secs)
    }

    fn put(&self, path: &Path, data: Vec<u8>) {
        let now = self.tick();
        let mut files = self.files.lock();
        let created = files.get(path).and_then(|f| f.times.created).unwrap_or(now);
        files.insert(
            path.to_path_buf(),
            MemoryFile {
                times: FileTimes {
                    created: Some(created),
                    modified: now,
                    len: data.len() as u64,
                },
                data,
            },
        );
    }

    /// Seed a file without counting it as a write.
    pub fn add_file(&self, path: &Path, data: &[u8]) {
        self.put(path, data.to_vec());
    }

    /// Bump a file's modification time.
    pub fn touch(&self, path: &Path) {
        let now = self.tick();
        if let Some(file) = self.files.lock().get_mut(path) {
            file.times.modified = now;
        }
    }

    pub fn contents(&self, path: &Path) -> Option<Vec<u8>> {
        self.files.lock().get(path).map(|f| f.data.clone())
    }

    /// Number of [`FileSystem::write`] calls so far.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

fn not_found(path: &Path) -> io::Error {
    io::Error::new(io::ErrorKind::NotFound, path.display().to_string())
}

#[async_trait]
impl FileSystem for MemoryFileSystem {
    async fn exists(&self, path: &Path) -> bool {
        self.files.lock().contains_key(path) || self.dirs.lock().contains(path)
    }

    async fn create_dir_all(&self, path: &Path) -> io::Result<()> {
        let mut dirs = self.dirs.lock();
        for ancestor in path.ancestors() {
            dirs.insert(ancestor.to_path_buf());
        }
        Ok(())
    }

    async fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        self.contents(path).ok_or_else(|| not_found(path))
    }

    async fn write(&self, path: &Path, contents: &[u8]) -> io::Result<()> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.put(path, contents.to_vec());
        Ok(())
    }

    async fn stat(&self, path: &Path) -> io::Result<FileTimes> {
        self.files
            .lock()
            .get(path)
            .map(|f| f.times)
            .ok_or_else(|| not_found(path))
    }

    async fn list_dir(&self, dir: &Path) -> io::Result<Vec<PathBuf>> {
        Ok(self
            .files
            .lock()
            .keys()
            .filter(|p| p.parent() == Some(dir))
            .cloned()
            .collect())
    }
}

// ============================================================================
// Tag reader
// ============================================================================

/// Scripted tag reader.
///
/// Unscripted paths read as an I/O error and carry no lyrics frames.
#[derive(Default)]
pub struct FakeTagReader {
    tags: Mutex<HashMap<PathBuf, std::result::Result<RawTags, TagReadError>>>,
    lyrics: Mutex<HashMap<PathBuf, std::result::Result<Vec<SyncedLyrics>, TagReadError>>>,
    panics: Mutex<HashSet<PathBuf>>,
    read_calls: AtomicUsize,
    lyrics_calls: AtomicUsize,
}

impl FakeTagReader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_tags(&self, path: &Path, result: std::result::Result<RawTags, TagReadError>) {
        self.tags.lock().insert(path.to_path_buf(), result);
    }

    pub fn set_synced_lyrics(
        &self,
        path: &Path,
        result: std::result::Result<Vec<SyncedLyrics>, TagReadError>,
    ) {
        self.lyrics.lock().insert(path.to_path_buf(), result);
    }

    /// Make [`TagReader::read`] panic for `path`.
    pub fn panic_on(&self, path: &Path) {
        self.panics.lock().insert(path.to_path_buf());
    }

    pub fn read_calls(&self) -> usize {
        self.read_calls.load(Ordering::SeqCst)
    }

    pub fn lyrics_calls(&self) -> usize {
        self.lyrics_calls.load(Ordering::SeqCst)
    }
}

impl TagReader for FakeTagReader {
    fn read(&self, path: &Path) -> std::result::Result<RawTags, TagReadError> {
        self.read_calls.fetch_add(1, Ordering::SeqCst);
        if self.panics.lock().contains(path) {
            panic!("tag reader exploded on {}", path.display());
        }
        self.tags
            .lock()
            .get(path)
            .cloned()
            .unwrap_or_else(|| Err(TagReadError::Io(format!("no such file: {}", path.display()))))
    }

    fn read_synced_lyrics(
        &self,
        path: &Path,
    ) -> std::result::Result<Vec<SyncedLyrics>, TagReadError> {
        self.lyrics_calls.fetch_add(1, Ordering::SeqCst);
        self.lyrics
            .lock()
            .get(path)
            .cloned()
            .unwrap_or_else(|| Ok(Vec::new()))
    }
}

/// Tags with only a title set.
pub fn raw_tags(title: &str) -> RawTags {
    RawTags {
        title: Some(title.to_string()),
        ..RawTags::default()
    }
}

// ============================================================================
// Image processor
// ============================================================================

#[derive(Default)]
struct InFlight {
    per_key: HashMap<String, usize>,
    max_per_key: HashMap<String, usize>,
    total: usize,
    max_total: usize,
}

/// Image processor that sleeps briefly and records call overlap.
pub struct RecordingImageProcessor {
    fail: bool,
    delay: Duration,
    calls: AtomicUsize,
    in_flight: Mutex<InFlight>,
    requests: Mutex<Vec<(String, String)>>,
}

impl RecordingImageProcessor {
    pub fn new() -> Self {
        Self {
            fail: false,
            delay: Duration::from_millis(10),
            calls: AtomicUsize::new(0),
            in_flight: Mutex::new(InFlight::default()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// A processor whose every call fails.
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Highest number of simultaneous calls seen for one album key.
    pub fn max_in_flight_for(&self, key: &str) -> usize {
        self.in_flight
            .lock()
            .max_per_key
            .get(key)
            .copied()
            .unwrap_or(0)
    }

    /// Highest number of simultaneous calls seen overall.
    pub fn max_in_flight(&self) -> usize {
        self.in_flight.lock().max_total
    }

    /// `(album, album_artist)` of every call, in call order.
    pub fn requests(&self) -> Vec<(String, String)> {
        self.requests.lock().clone()
    }
}

#[async_trait]
impl ImageProcessor for RecordingImageProcessor {
    async fn save_cover_art_and_extract_colors(
        &self,
        _bytes: &[u8],
        album: &str,
        album_artist: &str,
    ) -> Result<CoverArtOutput> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests
            .lock()
            .push((album.to_string(), album_artist.to_string()));
        let key = art_key(album, album_artist);

        {
            let mut guard = self.in_flight.lock();
            let state = &mut *guard;
            let now = {
                let n = state.per_key.entry(key.clone()).or_default();
                *n += 1;
                *n
            };
            let max = state.max_per_key.entry(key.clone()).or_default();
            *max = (*max).max(now);
            state.total += 1;
            state.max_total = state.max_total.max(state.total);
        }

        tokio::time::sleep(self.delay).await;

        {
            let mut state = self.in_flight.lock();
            if let Some(n) = state.per_key.get_mut(&key) {
                *n -= 1;
            }
            state.total -= 1;
        }

        if self.fail {
            return Err(Error::Io(io::Error::other("image decode failed")));
        }
        Ok(CoverArtOutput {
            uri: format!("memory://{key}"),
            light_swatch: "#FFFFFF".to_string(),
            dark_swatch: "#000000".to_string(),
        })
    }
}
