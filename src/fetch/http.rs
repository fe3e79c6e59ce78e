//! Primary HTTP fetcher built on reqwest.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use tracing::{debug, warn};

use super::{FallbackDownloader, FetchError, Fetcher};

/// HTTP GET fetcher with an optional 403 fallback
pub struct HttpFetcher {
    client: reqwest::Client,
    fallback: Option<Box<dyn FallbackDownloader>>,
}

impl HttpFetcher {
    /// Build a fetcher with the given user agent and request timeout
    pub fn new(user_agent: &str, timeout: Duration) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            fallback: None,
        })
    }

    /// Attach a secondary downloader, tried once on HTTP 403
    pub fn with_fallback(mut self, fallback: Box<dyn FallbackDownloader>) -> Self {
        self.fallback = Some(fallback);
        self
    }

    /// Classify a reqwest error into the fetch taxonomy
    fn classify(url: &str, err: reqwest::Error) -> FetchError {
        if err.is_timeout() {
            FetchError::Timeout {
                url: url.to_string(),
            }
        } else if err.is_builder() {
            FetchError::InvalidUrl {
                url: url.to_string(),
            }
        } else {
            FetchError::Transport(err)
        }
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| Self::classify(url, e))?;

        let status = response.status();

        // 403 means "server is blocking automated clients" here; nothing
        // else is worth a second attempt.
        if status == StatusCode::FORBIDDEN {
            if let Some(fallback) = &self.fallback {
                warn!(url, downloader = fallback.name(), "origin returned 403, trying fallback");
                return fallback.download(url).await;
            }
        }

        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let bytes = response.bytes().await.map_err(|e| Self::classify(url, e))?;
        debug!(url, bytes = bytes.len(), "fetched origin image");

        Ok(bytes.to_vec())
    }
}
