//! The thumbnail generator: orchestrates fetch, validation, transform
//! and persistence for a single cache instance.
//!
//! A request moves through CheckThumbnail → CheckOriginal → Fetch →
//! Validate → Transform → Persist → Reconcile. A cache hit short-circuits
//! at the first step; any unrecoverable error ends the request with no
//! thumbnail. Once a thumbnail is recorded it stays recorded, even if a
//! later reconciliation step fails.

use std::path::PathBuf;

use thiserror::Error;
use tokio::fs;
use tracing::{debug, error, info, instrument, warn};

use crate::config::{CacheConfig, Dimensions};
use crate::fetch::{CurlDownloader, FetchError, Fetcher, HttpFetcher};
use crate::key::ImageKey;
use crate::store::{CacheStore, OriginalRecord, StorageError, ThumbnailRecord};
use crate::transform::{ImageTransform, Letterbox, TransformError};

/// Errors that fail a thumbnail request
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("fetch failed: {0}")]
    Fetch(#[from] FetchError),

    #[error("image error: {0}")]
    Image(#[from] TransformError),

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("image is {width}x{height}, below the configured minimum {min}")]
    TooSmall { width: u32, height: u32, min: Dimensions },
}

/// Content-addressed thumbnail cache
///
/// Owns the on-disk store and its index exclusively; all mutation goes
/// through `&mut self`, so exclusive access is compiler-enforced. For
/// concurrent callers, wrap the cache in a `tokio::sync::Mutex` — that
/// also serializes generation per key, so two tasks can't race to fetch
/// the same uncached URL.
pub struct ThumbnailCache {
    config: CacheConfig,
    store: CacheStore,
    fetcher: Box<dyn Fetcher>,
    transform: Box<dyn ImageTransform>,
}

impl ThumbnailCache {
    /// Open a cache with the stock HTTP fetcher (curl fallback on 403)
    /// and the stock letterbox transform.
    ///
    /// Creates missing cache directories and rebuilds the index from
    /// their contents. This is the only fatal path: a cache that can't
    /// write its directories is refused outright.
    pub async fn open(config: CacheConfig) -> Result<Self, CacheError> {
        let fallback = CurlDownloader::new(config.user_agent.clone(), config.fetch_timeout());
        let fetcher =
            HttpFetcher::new(&config.user_agent, config.fetch_timeout())?.with_fallback(Box::new(fallback));

        Self::open_with(config, Box::new(fetcher), Box::new(Letterbox)).await
    }

    /// Open a cache with custom fetch and transform collaborators
    pub async fn open_with(
        config: CacheConfig,
        fetcher: Box<dyn Fetcher>,
        transform: Box<dyn ImageTransform>,
    ) -> Result<Self, CacheError> {
        let store = CacheStore::open(
            config.cache_dir.as_deref(),
            config.retain_originals,
            config.delete_removed_files,
        )
        .await?;

        Ok(Self {
            config,
            store,
            fetcher,
            transform,
        })
    }

    /// Return the cached thumbnail for `url`, generating it on a miss
    #[instrument(skip(self))]
    pub async fn thumbnail(&mut self, url: &str) -> Result<PathBuf, CacheError> {
        let key = ImageKey::from_url(url);

        // CheckThumbnail
        if let Some(record) = self.store.lookup_thumbnail(&key) {
            debug!(%key, path = %record.path.display(), "thumbnail already cached");
            return Ok(record.path.clone());
        }

        // CheckOriginal, then Fetch on a miss. `fetched` drives Reconcile:
        // an original that was already on disk needs no finalizing.
        let (bytes, fetched) = match self.cached_original(&key).await? {
            Some(bytes) => (bytes, false),
            None => {
                let bytes = self.fetcher.fetch(url).await.inspect_err(|e| {
                    error!(%key, error = %e, "unable to download image");
                })?;
                (bytes, true)
            }
        };

        // Validate
        let info = self.transform.probe(&bytes).inspect_err(|e| {
            error!(%key, error = %e, "fetched bytes are not a readable image");
        })?;

        if let Some(min) = self.config.min_image_size {
            if info.width < min.width || info.height < min.height {
                warn!(
                    %key,
                    width = info.width,
                    height = info.height,
                    "source image below minimum size, not thumbnailing"
                );
                // Retention still applies to rejected images: keeping the
                // original saves the fetch on the next attempt, but no
                // thumbnail record is ever created for it.
                if self.config.retain_originals && fetched {
                    self.persist_original(&key, &info.format, &bytes).await?;
                }
                return Err(CacheError::TooSmall {
                    width: info.width,
                    height: info.height,
                    min,
                });
            }
        }

        // Transform
        let padded = self
            .transform
            .pad(&bytes, self.config.thumbnail_size, self.config.fill_color)
            .inspect_err(|e| {
                error!(%key, error = %e, "unable to generate thumbnail");
            })?;

        // Persist
        let path = self
            .store
            .thumbnail_path(&key, self.config.thumbnail_size, &padded.format);
        fs::write(&path, &padded.bytes)
            .await
            .map_err(|e| StorageError::write(&path, e))?;
        self.store.record_thumbnail(
            key.clone(),
            ThumbnailRecord {
                path: path.clone(),
                size: self.config.thumbnail_size,
                format: padded.format.clone(),
                bytes: padded.bytes.len() as u64,
            },
        );
        info!(%key, path = %path.display(), "thumbnail generated");

        // Reconcile: finalize a freshly fetched original if we're keeping
        // it. The recorded thumbnail survives a failure here.
        if self.config.retain_originals && fetched {
            self.persist_original(&key, &info.format, &bytes)
                .await
                .inspect_err(|e| {
                    error!(%key, error = %e, "thumbnail written but original could not be retained");
                })?;
        }

        Ok(path)
    }

    /// Whether a thumbnail for `url` is currently indexed
    pub fn has_thumbnail(&self, url: &str) -> bool {
        self.store
            .lookup_thumbnail(&ImageKey::from_url(url))
            .is_some()
    }

    /// Whether a retained original for `url` is currently indexed
    pub fn has_original(&self, url: &str) -> bool {
        self.store
            .lookup_original(&ImageKey::from_url(url))
            .is_some()
    }

    /// Remove the cached thumbnail for `url`, and the retained original
    /// too unless `keep_original`. Unknown URLs are a no-op.
    #[instrument(skip(self))]
    pub async fn remove(&mut self, url: &str, keep_original: bool) {
        let key = ImageKey::from_url(url);
        self.store.remove(&key, keep_original).await;
    }

    /// Load a retained original from disk, if one is indexed
    async fn cached_original(&self, key: &ImageKey) -> Result<Option<Vec<u8>>, CacheError> {
        if !self.config.retain_originals {
            return Ok(None);
        }

        let Some(record) = self.store.lookup_original(key) else {
            return Ok(None);
        };

        debug!(%key, path = %record.path.display(), "reusing retained original");
        let bytes = fs::read(&record.path)
            .await
            .map_err(|e| StorageError::read(&record.path, e))?;

        Ok(Some(bytes))
    }

    /// Write raw fetched bytes into the originals directory and index them
    async fn persist_original(
        &mut self,
        key: &ImageKey,
        format: &str,
        bytes: &[u8],
    ) -> Result<(), StorageError> {
        let path = self.store.original_path(key, format);
        fs::write(&path, bytes)
            .await
            .map_err(|e| StorageError::write(&path, e))?;

        self.store.record_original(
            key.clone(),
            OriginalRecord {
                path,
                format: format.to_string(),
            },
        );

        Ok(())
    }
}
