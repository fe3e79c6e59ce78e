//! curl-based fallback downloader.
//!
//! Shells out to the `curl` binary and captures stdout. Process-level
//! downloaders get past some origins that reject library HTTP clients;
//! whatever goes wrong inside curl is opaque to us and surfaces as a
//! plain fallback failure.

use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use super::{FallbackDownloader, FetchError};

/// Fallback downloader spawning the `curl` CLI
pub struct CurlDownloader {
    /// Path to the curl binary (default: "curl")
    binary_path: String,
    user_agent: String,
    timeout: Duration,
}

impl CurlDownloader {
    /// Create a downloader using `curl` from PATH, re-sending the same
    /// user agent and timeout as the primary fetcher
    pub fn new(user_agent: impl Into<String>, timeout: Duration) -> Self {
        Self {
            binary_path: "curl".to_string(),
            user_agent: user_agent.into(),
            timeout,
        }
    }

    /// Use a custom curl binary path
    pub fn with_binary_path(mut self, binary_path: impl Into<String>) -> Self {
        self.binary_path = binary_path.into();
        self
    }
}

#[async_trait]
impl FallbackDownloader for CurlDownloader {
    fn name(&self) -> &str {
        "curl"
    }

    async fn download(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let max_time = self.timeout.as_secs().max(1).to_string();

        let output = Command::new(&self.binary_path)
            .args(["-fsS", "-A", &self.user_agent, "--max-time", &max_time, url])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| {
                FetchError::Fallback(format!("failed to spawn {}: {}", self.binary_path, e))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let exit_code = output.status.code().unwrap_or(-1);
            return Err(FetchError::Fallback(format!(
                "{} exited with code {}: {}",
                self.binary_path,
                exit_code,
                stderr.trim()
            )));
        }

        debug!(url, bytes = output.stdout.len(), "fallback download succeeded");

        Ok(output.stdout)
    }
}
