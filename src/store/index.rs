//! On-disk store and in-memory index for thumbnails and originals.
//!
//! `CacheStore` owns the two cache directories and the maps rebuilt from
//! them at startup. It never fetches and never transforms; the generator
//! writes files and then records them here. Index mutations are the
//! authoritative definition of cache existence.

use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tempfile::TempDir;
use thiserror::Error;
use tokio::fs;
use tracing::{debug, warn};

use crate::config::Dimensions;
use crate::key::ImageKey;

use super::names;

/// Filesystem errors while reading or writing cache state
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("failed to create cache directory {}: {source}", path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to set up scratch directory: {0}")]
    Scratch(#[source] io::Error),
}

impl StorageError {
    pub(crate) fn read(path: &Path, source: io::Error) -> Self {
        Self::Read {
            path: path.to_path_buf(),
            source,
        }
    }

    pub(crate) fn write(path: &Path, source: io::Error) -> Self {
        Self::Write {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Index entry for a generated thumbnail
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThumbnailRecord {
    pub path: PathBuf,
    pub size: Dimensions,
    /// Lowercase codec identifier, e.g. "jpeg"
    pub format: String,
    /// Byte size on disk
    pub bytes: u64,
}

/// Index entry for a retained original
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OriginalRecord {
    pub path: PathBuf,
    /// Lowercase codec identifier, e.g. "jpeg"
    pub format: String,
}

/// Cache directories plus the in-memory index over them
pub struct CacheStore {
    thumbnails_dir: PathBuf,
    originals_dir: PathBuf,

    thumbnails: HashMap<ImageKey, ThumbnailRecord>,
    originals: HashMap<ImageKey, OriginalRecord>,

    /// False when no cache dir was configured; every lookup misses and
    /// nothing is recorded, so every request regenerates.
    persistent: bool,

    /// Whether removals also delete the underlying files
    delete_files: bool,

    /// Keeps the scratch directory alive for ephemeral stores
    _scratch: Option<TempDir>,
}

impl CacheStore {
    /// Create the cache directories (if missing) and rebuild the index
    /// from their contents.
    ///
    /// This is the one place where a filesystem failure is fatal: without
    /// writable directories the cache cannot honor its contract. File
    /// names that don't parse are warned about and skipped.
    pub async fn open(
        cache_dir: Option<&Path>,
        retain_originals: bool,
        delete_files: bool,
    ) -> Result<Self, StorageError> {
        let (root, scratch, persistent) = match cache_dir {
            Some(dir) => (dir.to_path_buf(), None, true),
            None => {
                let scratch = TempDir::new().map_err(StorageError::Scratch)?;
                (scratch.path().to_path_buf(), Some(scratch), false)
            }
        };

        let thumbnails_dir = root.join("thumbnails");
        let originals_dir = root.join("originals");

        fs::create_dir_all(&thumbnails_dir)
            .await
            .map_err(|e| StorageError::CreateDir {
                path: thumbnails_dir.clone(),
                source: e,
            })?;
        if retain_originals {
            fs::create_dir_all(&originals_dir)
                .await
                .map_err(|e| StorageError::CreateDir {
                    path: originals_dir.clone(),
                    source: e,
                })?;
        }

        let mut store = Self {
            thumbnails_dir,
            originals_dir,
            thumbnails: HashMap::new(),
            originals: HashMap::new(),
            persistent,
            delete_files,
            _scratch: scratch,
        };

        if store.persistent {
            store.scan_thumbnails().await?;
            if retain_originals {
                store.scan_originals().await?;
            }
        }

        Ok(store)
    }

    /// Rebuild the thumbnail map from directory contents
    async fn scan_thumbnails(&mut self) -> Result<(), StorageError> {
        let mut entries = fs::read_dir(&self.thumbnails_dir)
            .await
            .map_err(|e| StorageError::read(&self.thumbnails_dir, e))?;

        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| StorageError::read(&self.thumbnails_dir, e))?
        {
            let file_name = entry.file_name();
            let Some(name) = file_name.to_str() else {
                warn!(path = %entry.path().display(), "skipping cache entry with non-UTF-8 name");
                continue;
            };

            match names::parse_thumbnail_name(name) {
                Some(parsed) => {
                    let bytes = entry.metadata().await.map(|m| m.len()).unwrap_or(0);
                    self.thumbnails.insert(
                        parsed.key,
                        ThumbnailRecord {
                            path: entry.path(),
                            size: parsed.size,
                            format: parsed.format,
                            bytes,
                        },
                    );
                }
                None => warn!(file = name, "skipping thumbnail entry with unrecognized name"),
            }
        }

        debug!(entries = self.thumbnails.len(), "thumbnail index rebuilt");
        Ok(())
    }

    /// Rebuild the originals map from directory contents
    async fn scan_originals(&mut self) -> Result<(), StorageError> {
        let mut entries = fs::read_dir(&self.originals_dir)
            .await
            .map_err(|e| StorageError::read(&self.originals_dir, e))?;

        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| StorageError::read(&self.originals_dir, e))?
        {
            let file_name = entry.file_name();
            let Some(name) = file_name.to_str() else {
                warn!(path = %entry.path().display(), "skipping cache entry with non-UTF-8 name");
                continue;
            };

            match names::parse_original_name(name) {
                Some(parsed) => {
                    self.originals.insert(
                        parsed.key,
                        OriginalRecord {
                            path: entry.path(),
                            format: parsed.format,
                        },
                    );
                }
                None => warn!(file = name, "skipping original entry with unrecognized name"),
            }
        }

        debug!(entries = self.originals.len(), "originals index rebuilt");
        Ok(())
    }

    pub fn lookup_thumbnail(&self, key: &ImageKey) -> Option<&ThumbnailRecord> {
        if !self.persistent {
            return None;
        }
        self.thumbnails.get(key)
    }

    pub fn lookup_original(&self, key: &ImageKey) -> Option<&OriginalRecord> {
        if !self.persistent {
            return None;
        }
        self.originals.get(key)
    }

    /// Record a thumbnail the caller already wrote to disk
    pub fn record_thumbnail(&mut self, key: ImageKey, record: ThumbnailRecord) {
        if self.persistent {
            self.thumbnails.insert(key, record);
        }
    }

    /// Record an original the caller already wrote to disk
    pub fn record_original(&mut self, key: ImageKey, record: OriginalRecord) {
        if self.persistent {
            self.originals.insert(key, record);
        }
    }

    /// Path a thumbnail for `key` should be written to
    pub fn thumbnail_path(&self, key: &ImageKey, size: Dimensions, format: &str) -> PathBuf {
        self.thumbnails_dir
            .join(names::thumbnail_file_name(key, size, format))
    }

    /// Path an original for `key` should be written to
    pub fn original_path(&self, key: &ImageKey, format: &str) -> PathBuf {
        self.originals_dir.join(names::original_file_name(key, format))
    }

    /// Drop the thumbnail entry for `key`, and the original entry too
    /// unless `keep_original`. Absent keys are a no-op. File deletion
    /// follows the configured policy; deletion failures are logged and
    /// swallowed because the index update already decided existence.
    pub async fn remove(&mut self, key: &ImageKey, keep_original: bool) {
        if let Some(record) = self.thumbnails.remove(key) {
            debug!(%key, path = %record.path.display(), "removed thumbnail entry");
            self.delete_file(&record.path).await;
        }

        if !keep_original {
            if let Some(record) = self.originals.remove(key) {
                debug!(%key, path = %record.path.display(), "removed original entry");
                self.delete_file(&record.path).await;
            }
        }
    }

    async fn delete_file(&self, path: &Path) {
        if !self.delete_files {
            return;
        }
        if let Err(e) = fs::remove_file(path).await {
            warn!(path = %path.display(), error = %e, "failed to delete cache file");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_record(path: &Path) -> ThumbnailRecord {
        ThumbnailRecord {
            path: path.to_path_buf(),
            size: Dimensions::new(200, 200),
            format: "png".to_string(),
            bytes: 42,
        }
    }

    #[tokio::test]
    async fn test_record_then_lookup() {
        let dir = TempDir::new().unwrap();
        let mut store = CacheStore::open(Some(dir.path()), true, true).await.unwrap();
        let key = ImageKey::from_url("https://example.com/a.jpg");

        assert!(store.lookup_thumbnail(&key).is_none());

        let path = store.thumbnail_path(&key, Dimensions::new(200, 200), "png");
        store.record_thumbnail(key.clone(), sample_record(&path));

        assert_eq!(store.lookup_thumbnail(&key).unwrap().path, path);
    }

    #[tokio::test]
    async fn test_ephemeral_store_never_hits() {
        let mut store = CacheStore::open(None, false, true).await.unwrap();
        let key = ImageKey::from_url("https://example.com/a.jpg");

        let path = store.thumbnail_path(&key, Dimensions::new(200, 200), "png");
        store.record_thumbnail(key.clone(), sample_record(&path));

        assert!(store.lookup_thumbnail(&key).is_none());
    }

    #[tokio::test]
    async fn test_remove_keep_original() {
        let dir = TempDir::new().unwrap();
        let mut store = CacheStore::open(Some(dir.path()), true, true).await.unwrap();
        let key = ImageKey::from_url("https://example.com/a.jpg");

        let thumb_path = store.thumbnail_path(&key, Dimensions::new(200, 200), "png");
        let orig_path = store.original_path(&key, "png");
        store.record_thumbnail(key.clone(), sample_record(&thumb_path));
        store.record_original(
            key.clone(),
            OriginalRecord {
                path: orig_path,
                format: "png".to_string(),
            },
        );

        store.remove(&key, true).await;
        assert!(store.lookup_thumbnail(&key).is_none());
        assert!(store.lookup_original(&key).is_some());

        store.remove(&key, false).await;
        assert!(store.lookup_original(&key).is_none());

        // absent key: no-op
        store.remove(&key, false).await;
    }
}
