//! WebDriver page fetcher.
//!
//! Drives a headless browser session against a WebDriver endpoint
//! (chromedriver/geckodriver) for the case where the CBE page renders
//! the auction tables client-side and a plain GET comes back empty.
//!
//! Session discipline: the session is acquired, driven, and closed in
//! one place — close runs on every exit path, because leaked sessions
//! accumulate inside the driver and eventually exhaust it.

use async_trait::async_trait;
use fantoccini::{Client, ClientBuilder, Locator};
use serde_json::json;
use std::time::Duration;
use tracing::{debug, info, warn};

use super::PageFetcher;
use crate::extract::ANCHOR_HEADING;
use crate::types::FetchError;

const STRATEGY_NAME: &str = "browser";

/// Bounded wait for the results heading to appear in the DOM.
const DEFAULT_ANCHOR_WAIT: Duration = Duration::from_secs(30);

pub struct BrowserFetcher {
    webdriver_url: String,
    page_url: String,
    anchor_wait: Duration,
}

impl BrowserFetcher {
    pub fn new(webdriver_url: impl Into<String>, page_url: impl Into<String>) -> Self {
        Self {
            webdriver_url: webdriver_url.into(),
            page_url: page_url.into(),
            anchor_wait: DEFAULT_ANCHOR_WAIT,
        }
    }

    /// Override the bounded anchor wait.
    pub fn with_anchor_wait(mut self, wait: Duration) -> Self {
        self.anchor_wait = wait;
        self
    }

    /// Chrome capabilities for a non-interactive server context:
    /// headless, sandbox off (irrelevant under a dedicated service
    /// user), shared-memory workaround for containers.
    fn capabilities() -> serde_json::map::Map<String, serde_json::Value> {
        let mut caps = serde_json::map::Map::new();
        caps.insert(
            "goog:chromeOptions".to_string(),
            json!({
                "args": [
                    "--headless=new",
                    "--no-sandbox",
                    "--disable-gpu",
                    "--disable-dev-shm-usage",
                ]
            }),
        );
        caps
    }

    /// Navigate, wait for the anchor heading, and read the page source.
    /// Split out so `fetch_page` can close the session regardless of
    /// where this fails.
    async fn drive(&self, client: &Client) -> Result<String, FetchError> {
        client
            .goto(&self.page_url)
            .await
            .map_err(|e| FetchError::Transport(format!("Navigation to CBE failed: {e}")))?;

        // The page is loaded once the results heading exists; waiting on
        // document readiness alone is not enough for a client-rendered table.
        let anchor = format!("//h2[contains(., '{ANCHOR_HEADING}')]");
        client
            .wait()
            .at_most(self.anchor_wait)
            .for_element(Locator::XPath(&anchor))
            .await
            .map_err(|e| {
                FetchError::Transport(format!(
                    "Results heading did not appear within {}s: {e}",
                    self.anchor_wait.as_secs()
                ))
            })?;

        let source = client
            .source()
            .await
            .map_err(|e| FetchError::Transport(format!("Failed to read page source: {e}")))?;

        debug!(bytes = source.len(), "Page source captured from browser");
        Ok(source)
    }
}

#[async_trait]
impl PageFetcher for BrowserFetcher {
    async fn fetch_page(&self) -> Result<String, FetchError> {
        info!(
            webdriver = %self.webdriver_url,
            url = %self.page_url,
            "Starting browser session"
        );

        let client = ClientBuilder::native()
            .capabilities(Self::capabilities())
            .connect(&self.webdriver_url)
            .await
            .map_err(|e| FetchError::Transport(format!("WebDriver session failed: {e}")))?;

        let result = self.drive(&client).await;

        // Close on every path; a failed close is logged, not propagated,
        // so it never masks the drive result.
        if let Err(e) = client.close().await {
            warn!(error = %e, "Failed to close browser session");
        }

        result
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

    // Driving a real session needs a live WebDriver; unit tests cover
    // construction and the capability set only.

    #[test]
    fn test_fetcher_construction() {
        let f = BrowserFetcher::new("http://localhost:4444", "https://www.cbe.org.eg")
            .with_anchor_wait(Duration::from_secs(25));
        assert_eq!(f.name(), "browser");
        assert_eq!(f.anchor_wait, Duration::from_secs(25));
    }

    #[test]
    fn test_capabilities_are_headless_and_sandboxless() {
        let caps = BrowserFetcher::capabilities();
        let args = caps["goog:chromeOptions"]["args"].as_array().unwrap();
        let args: Vec<&str> = args.iter().filter_map(|a| a.as_str()).collect();
        assert!(args.iter().any(|a| a.starts_with("--headless")));
        assert!(args.contains(&"--no-sandbox"));
    }
}
