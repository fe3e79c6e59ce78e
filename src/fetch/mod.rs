//! Origin fetching for source images.
//!
//! The primary path is a plain HTTP GET with a browser user agent. Hosts
//! that block automated clients answer 403, and for those a pluggable
//! [`FallbackDownloader`] gets one shot before the fetch is declared dead.
//! Fetchers never write to storage; they hand bytes back to the caller.

pub mod curl;
pub mod http;

use async_trait::async_trait;
use thiserror::Error;

pub use curl::CurlDownloader;
pub use http::HttpFetcher;

/// Errors from fetching a source image
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("origin returned HTTP {status} for {url}")]
    Status { status: u16, url: String },

    #[error("request for {url} timed out")]
    Timeout { url: String },

    #[error("not a fetchable URL: {url}")]
    InvalidUrl { url: String },

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("fallback downloader failed: {0}")]
    Fallback(String),
}

/// Retrieves raw image bytes for a URL
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError>;
}

/// Secondary retrieval strategy for origins that reject the primary client
#[async_trait]
pub trait FallbackDownloader: Send + Sync {
    /// Human-readable downloader name, for logs
    fn name(&self) -> &str;

    async fn download(&self, url: &str) -> Result<Vec<u8>, FetchError>;
}
