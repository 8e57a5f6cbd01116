//! File-system capability.
//!
//! Everything the ingestion core does to the disk goes through
//! [`FileSystem`], so the lyrics cache, sibling search and cover store can be
//! exercised against an in-memory implementation in tests. Path
//! manipulation is plain `std::path`.

mod local;

pub use local::LocalFileSystem;

use async_trait::async_trait;
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// Timestamps of a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileTimes {
    /// Creation time, when the platform records one
    pub created: Option<SystemTime>,
    pub modified: SystemTime,
    pub len: u64,
}

/// Async file-system operations used by the ingestion core.
#[async_trait]
pub trait FileSystem: Send + Sync {
    /// Whether a file or directory exists at `path`.
    async fn exists(&self, path: &Path) -> bool;

    /// Create a directory and all missing parents.
    async fn create_dir_all(&self, path: &Path) -> io::Result<()>;

    async fn read(&self, path: &Path) -> io::Result<Vec<u8>>;

    /// Write a whole file, replacing any existing content.
    async fn write(&self, path: &Path, contents: &[u8]) -> io::Result<()>;

    async fn stat(&self, path: &Path) -> io::Result<FileTimes>;

    /// Files (not directories) directly inside `dir`.
    async fn list_dir(&self, dir: &Path) -> io::Result<Vec<PathBuf>>;
}
