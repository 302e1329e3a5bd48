//! Direct HTTP page fetcher.
//!
//! Retrieves the auction page with a plain GET. The CBE site rejects
//! unidentified clients, so a realistic desktop browser User-Agent is
//! mandatory.

use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, info};

use super::PageFetcher;
use crate::types::FetchError;

const STRATEGY_NAME: &str = "http";

/// User-Agent presented to the upstream site. Unidentified clients get
/// rejected, so this mirrors a common desktop Chrome.
const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

pub struct HttpFetcher {
    http: Client,
    url: String,
}

impl HttpFetcher {
    /// Build a fetcher for the given page URL with a bounded timeout.
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, FetchError> {
        let http = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| FetchError::Transport(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self {
            http,
            url: url.into(),
        })
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch_page(&self) -> Result<String, FetchError> {
        info!(url = %self.url, "Fetching auction page over HTTP");

        let resp = self
            .http
            .get(&self.url)
            .send()
            .await
            .map_err(|e| FetchError::Transport(format!("Request to CBE failed: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::Transport(format!(
                "CBE returned HTTP {status} for {}",
                self.url
            )));
        }

        let body = resp
            .text()
            .await
            .map_err(|e| FetchError::Transport(format!("Failed to read CBE response body: {e}")))?;

        debug!(bytes = body.len(), "Auction page retrieved");
        Ok(body)
    }

    fn name(&self) -> &str {
        STRATEGY_NAME
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetcher_construction() {
        let f = HttpFetcher::new(
            "https://www.cbe.org.eg/ar/auctions/egp-t-bills",
            Duration::from_secs(20),
        )
        .unwrap();
        assert_eq!(f.name(), "http");
    }

    #[tokio::test]
    async fn test_unreachable_host_is_transport_error() {
        // Reserved TLD, guaranteed not to resolve.
        let f = HttpFetcher::new("http://cbe.invalid/auctions", Duration::from_secs(2)).unwrap();
        let err = f.fetch_page().await.unwrap_err();
        assert!(matches!(err, FetchError::Transport(_)));
    }
}
