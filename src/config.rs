//! Cache configuration.
//!
//! `CacheConfig` is a plain in-process options struct; there is no config
//! file and no environment lookup. Every field has a serde default so
//! embedders can deserialize partial configs from their own settings.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// User agent presented to origin servers. Some image hosts reject
/// obviously non-browser clients outright.
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Windows; U; Windows NT 5.1; en-US; rv:1.9.0.7) Gecko/2009021910 Firefox/3.0.7";

/// A width/height pair in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl std::fmt::Display for Dimensions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Error parsing a `<width>x<height>` string
#[derive(Debug, Error)]
#[error("expected <width>x<height>")]
pub struct ParseDimensionsError;

impl std::str::FromStr for Dimensions {
    type Err = ParseDimensionsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (w, h) = s.split_once('x').ok_or(ParseDimensionsError)?;

        Ok(Self {
            width: w.parse().map_err(|_| ParseDimensionsError)?,
            height: h.parse().map_err(|_| ParseDimensionsError)?,
        })
    }
}

/// Options for a thumbnail cache instance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Target thumbnail size (default: 200x200)
    #[serde(default = "default_thumbnail_size")]
    pub thumbnail_size: Dimensions,

    /// Reject source images with either dimension below this (default: no minimum)
    #[serde(default)]
    pub min_image_size: Option<Dimensions>,

    /// Cache root directory. `None` disables persistence entirely: every
    /// call re-fetches and re-transforms into a scratch location.
    #[serde(default)]
    pub cache_dir: Option<PathBuf>,

    /// Keep fetched originals on disk next to their thumbnails (default: false)
    #[serde(default)]
    pub retain_originals: bool,

    /// RGB fill for the letterbox bars (default: #34495e)
    #[serde(default = "default_fill_color")]
    pub fill_color: [u8; 3],

    /// User agent sent with every fetch
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Fetch timeout in seconds (default: 10)
    #[serde(default = "default_fetch_timeout")]
    pub fetch_timeout_seconds: u64,

    /// Delete the underlying files when an entry is removed (default: true).
    /// The index update happens either way and is what decides cache hits.
    #[serde(default = "default_delete_removed_files")]
    pub delete_removed_files: bool,
}

fn default_thumbnail_size() -> Dimensions {
    Dimensions::new(200, 200)
}
fn default_fill_color() -> [u8; 3] {
    [0x34, 0x49, 0x5e]
}
fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}
fn default_fetch_timeout() -> u64 {
    10
}
fn default_delete_removed_files() -> bool {
    true
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            thumbnail_size: default_thumbnail_size(),
            min_image_size: None,
            cache_dir: None,
            retain_originals: false,
            fill_color: default_fill_color(),
            user_agent: default_user_agent(),
            fetch_timeout_seconds: default_fetch_timeout(),
            delete_removed_files: default_delete_removed_files(),
        }
    }
}

impl CacheConfig {
    /// Fetch timeout as a `Duration`
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_seconds)
    }
}
