//! thumbcache - content-addressed image thumbnail cache
//!
//! Given a source image URL, returns a locally cached, resized and
//! letterboxed thumbnail file, fetching and transforming the source at
//! most once per distinct URL.
//!
//! # Architecture
//!
//! The cache directory is the only persisted state:
//! - File names encode everything (`<key>.<WxH>.<format>`); there is no
//!   manifest to corrupt or migrate
//! - The in-memory index is rebuilt by scanning the directories at open
//! - Originals are optionally retained next to their thumbnails so a
//!   rejected or re-requested image never pays the fetch twice
//!
//! # Modules
//!
//! - `key`: content addressing (URL → digest)
//! - `fetch`: origin download, with a curl fallback for hostile servers
//! - `store`: cache directories, file-name codec, in-memory index
//! - `transform`: image probing and the letterbox transform
//! - `cache`: the generator tying it all together
//!
//! # Usage
//!
//! ```no_run
//! use thumbcache::{CacheConfig, Dimensions, ThumbnailCache};
//!
//! # async fn demo() -> Result<(), thumbcache::CacheError> {
//! let mut cache = ThumbnailCache::open(CacheConfig {
//!     thumbnail_size: Dimensions::new(400, 400),
//!     cache_dir: Some("/var/cache/thumbs".into()),
//!     retain_originals: true,
//!     ..CacheConfig::default()
//! })
//! .await?;
//!
//! let path = cache.thumbnail("https://example.com/a.jpg").await?;
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod config;
pub mod fetch;
pub mod key;
pub mod store;
pub mod transform;

// Re-export main types at crate root for convenience
pub use cache::{CacheError, ThumbnailCache};
pub use config::{CacheConfig, Dimensions, DEFAULT_USER_AGENT};
pub use fetch::{CurlDownloader, FallbackDownloader, FetchError, Fetcher, HttpFetcher};
pub use key::ImageKey;
pub use store::{OriginalRecord, StorageError, ThumbnailRecord};
pub use transform::{ImageInfo, ImageTransform, Letterbox, PaddedImage, TransformError};
