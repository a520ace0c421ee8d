//! HTTP client for the remote card archive.

use std::time::Duration;

use async_trait::async_trait;

use super::{FetchError, Fetcher};

/// Default archive holding the Rider-Waite scans
pub const DEFAULT_BASE_URL: &str = "https://archive.org/download/rider-waite-tarot";

/// Per-request timeout so a stalled transfer does not hang the batch
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Archive download client
pub struct ArchiveClient {
    /// HTTP client
    client: reqwest::Client,
}

impl Default for ArchiveClient {
    fn default() -> Self {
        Self::new()
    }
}

impl ArchiveClient {
    /// Create a new archive client
    pub fn new() -> Self {
        let client = reqwest::Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_default();

        Self { client }
    }

    /// Create from an existing HTTP client
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Fetcher for ArchiveClient {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let bytes = response.bytes().await?;
        Ok(bytes.to_vec())
    }
}
