//! Persistence for thumbnails and retained originals.
//!
//! There is no manifest file; the file names *are* the database:
//!
//! ```text
//! <cache_dir>/
//! ├── thumbnails/
//! │   └── <key>.<width>x<height>.<format>   # e.g. d41d8….400x400.jpeg
//! └── originals/                            # only with retain_originals
//!     └── <key>.<format>
//! ```
//!
//! The in-memory index is rebuilt by scanning these directories once at
//! startup; files with names that don't parse are skipped with a warning.

mod names;

pub mod index;

pub use index::{CacheStore, OriginalRecord, StorageError, ThumbnailRecord};
