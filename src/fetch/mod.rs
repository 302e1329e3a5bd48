//! Page acquisition strategies.
//!
//! Defines the `PageFetcher` trait and provides implementations for:
//! - Direct HTTP retrieval (reqwest): cheap, works as long as the CBE
//!   serves the auction tables in the initial document.
//! - WebDriver browser session (fantoccini): expensive fallback for
//!   when the page only renders the tables client-side.
//!
//! The extraction pipeline depends only on the trait; which strategy is
//! active is a configuration concern.

pub mod browser;
pub mod http;

use async_trait::async_trait;

use crate::types::FetchError;

/// Abstraction over ways of retrieving the raw auction page markup.
///
/// Implementors return the full HTML document on success, or a
/// transport-level `FetchError`, never a content-level one. Whether
/// the markup actually contains auction data is the extraction
/// pipeline's judgement, not the fetcher's.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Retrieve the raw HTML of the publication page.
    async fn fetch_page(&self) -> Result<String, FetchError>;

    /// Strategy name for logging and identification.
    fn name(&self) -> &str;
}
