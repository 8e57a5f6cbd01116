//! Cover art disk store.
//!
//! Covers are written once per album under the artwork cache directory,
//! named by a hash of the album key so any title is a safe file name.

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

use super::{CoverArtOutput, ImageProcessor, art_key, extract_swatches};
use crate::error::{Result, ResultExt};
use crate::fs::FileSystem;

/// Default [`ImageProcessor`]: stores covers through a [`FileSystem`].
pub struct CoverArtStore {
    fs: Arc<dyn FileSystem>,
    cache_dir: PathBuf,
}

impl CoverArtStore {
    pub fn new(fs: Arc<dyn FileSystem>, cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            fs,
            cache_dir: cache_dir.into(),
        }
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    /// Path the cover of an album is stored at, given its file extension.
    pub fn cover_path(&self, album: &str, album_artist: &str, extension: &str) -> PathBuf {
        let digest = Sha256::digest(art_key(album, album_artist).as_bytes());
        self.cache_dir
            .join(format!("{}.{extension}", URL_SAFE_NO_PAD.encode(digest)))
    }

    /// Write `bytes` unless the stored cover already has identical content.
    async fn store(&self, path: &Path, bytes: &[u8]) -> Result<()> {
        if self.is_stored(path, bytes).await {
            debug!(path = %path.display(), "Cover already stored");
            return Ok(());
        }

        self.fs
            .create_dir_all(&self.cache_dir)
            .await
            .with_context(format!("creating {}", self.cache_dir.display()))?;
        self.fs
            .write(path, bytes)
            .await
            .with_context(format!("writing {}", path.display()))?;
        debug!(path = %path.display(), size = bytes.len(), "Stored cover");
        Ok(())
    }

    async fn is_stored(&self, path: &Path, bytes: &[u8]) -> bool {
        match self.fs.stat(path).await {
            Ok(existing) if existing.len == bytes.len() as u64 => {}
            _ => return false,
        }
        match self.fs.read(path).await {
            Ok(existing) => Sha256::digest(&existing) == Sha256::digest(bytes),
            Err(_) => false,
        }
    }
}

#[async_trait]
impl ImageProcessor for CoverArtStore {
    async fn save_cover_art_and_extract_colors(
        &self,
        bytes: &[u8],
        album: &str,
        album_artist: &str,
    ) -> Result<CoverArtOutput> {
        let format = image::guess_format(bytes)?;
        let extension = format.extensions_str().first().copied().unwrap_or("img");
        let path = self.cover_path(album, album_artist, extension);

        self.store(&path, bytes).await?;

        let owned = bytes.to_vec();
        let swatches = tokio::task::spawn_blocking(move || extract_swatches(&owned)).await??;

        let absolute = std::path::absolute(&path).unwrap_or(path);
        Ok(CoverArtOutput {
            uri: format!("file://{}", absolute.display()),
            light_swatch: swatches.light,
            dark_swatch: swatches.dark,
        })
    }
}
