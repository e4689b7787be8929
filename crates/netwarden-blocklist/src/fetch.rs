//! Remote blocklist retrieval

use std::time::Duration;

use crate::error::{RefreshError, RefreshResult};

/// Downloads a blocklist document
pub trait BlocklistFetcher: Send + Sync {
    /// Fetch the document at `url` as text
    fn fetch(&self, url: &str) -> RefreshResult<String>;
}

/// HTTP(S) fetcher with a bounded timeout
pub struct HttpFetcher {
    client: reqwest::blocking::Client,
}

impl HttpFetcher {
    /// Create a fetcher whose requests give up after `timeout`
    pub fn new(timeout: Duration) -> RefreshResult<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("netwarden/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| RefreshError::Network {
                url: String::new(),
                message: format!("failed to build HTTP client: {}", e),
            })?;

        Ok(Self { client })
    }
}

impl BlocklistFetcher for HttpFetcher {
    fn fetch(&self, url: &str) -> RefreshResult<String> {
        let network = |e: reqwest::Error| RefreshError::Network {
            url: url.to_string(),
            message: e.to_string(),
        };

        let response = self
            .client
            .get(url)
            .send()
            .map_err(network)?
            .error_for_status()
            .map_err(network)?;

        response.text().map_err(|e| RefreshError::Decode {
            url: url.to_string(),
            message: e.to_string(),
        })
    }
}
