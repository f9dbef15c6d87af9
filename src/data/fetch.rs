//! Retrieval of the raw CSV bodies
//!
//! Locations starting with `http://` or `https://` are downloaded; anything
//! else is read from the local filesystem (useful for offline snapshots).

use reqwest::Client;
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::SourceConfig;
use crate::error::LoadError;

#[derive(Clone)]
pub struct SourceClient {
    client: Client,
    retries: u32,
    retry_backoff: Duration,
}

impl SourceClient {
    pub fn new(config: &SourceConfig) -> reqwest::Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            retries: config.retries,
            retry_backoff: Duration::from_millis(config.retry_backoff_ms),
        })
    }

    /// Fetch a CSV body, retrying failed attempts up to the configured count.
    pub async fn fetch_text(&self, location: &str) -> Result<String, LoadError> {
        let mut attempt = 0;
        loop {
            match self.fetch_once(location).await {
                Ok(body) => {
                    debug!("Fetched {} ({} bytes)", location, body.len());
                    return Ok(body);
                }
                Err(e) if attempt < self.retries => {
                    attempt += 1;
                    warn!(
                        "Fetch of {} failed (attempt {}/{}): {}",
                        location,
                        attempt,
                        self.retries + 1,
                        e
                    );
                    tokio::time::sleep(self.retry_backoff).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn fetch_once(&self, location: &str) -> Result<String, LoadError> {
        if !is_remote(location) {
            return tokio::fs::read_to_string(location)
                .await
                .map_err(|e| LoadError::unavailable(location, e));
        }

        let response = self
            .client
            .get(location)
            .send()
            .await
            .map_err(|e| LoadError::unavailable(location, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(LoadError::unavailable(location, format!("HTTP {}", status)));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| LoadError::unavailable(location, e))?;
        String::from_utf8(bytes.to_vec()).map_err(|e| LoadError::unavailable(location, e))
    }
}

fn is_remote(location: &str) -> bool {
    location.starts_with("http://") || location.starts_with("https://")
}

/// Join a base URL (or directory) with a file name.
pub fn source_location(base: &str, file: &str) -> String {
    if base.is_empty() || base.ends_with('/') {
        format!("{}{}", base, file)
    } else {
        format!("{}/{}", base, file)
    }
}
