//! Browser automation seam.
//!
//! The table scraper and the citation-link resolver are written against the
//! [`Browser`] and [`Page`] traits rather than a concrete driver, so the
//! scraping logic can be exercised against an in-memory page in tests.
//!
//! The production implementation, [`webdriver::WebDriverBrowser`], talks to a
//! W3C WebDriver server (chromedriver, geckodriver, selenium) and opens one
//! window per [`Page`].
//!
//! Pages are driven strictly one at a time. Every method is fallible and every
//! failure is recoverable: callers fall through to the next strategy or return
//! an empty result.

pub mod webdriver;

#[cfg(test)]
pub(crate) mod testing;

use crate::error::BrowserError;
use async_trait::async_trait;
use std::time::Duration;

/// A single browser tab.
#[async_trait]
pub trait Page: Send {
    /// Navigate and wait for the document to load, bounded by `timeout`.
    async fn goto(&mut self, url: &str, timeout: Duration) -> Result<(), BrowserError>;

    /// Wait until at least one element matches `selector`.
    async fn wait_for(&mut self, selector: &str, timeout: Duration) -> Result<(), BrowserError>;

    /// Replace the value of an input field.
    async fn fill(&mut self, selector: &str, text: &str) -> Result<(), BrowserError>;

    /// Press Enter inside the element matching `selector`.
    async fn press_enter(&mut self, selector: &str) -> Result<(), BrowserError>;

    async fn click(&mut self, selector: &str) -> Result<(), BrowserError>;

    /// Snapshot of the currently rendered DOM.
    async fn html(&mut self) -> Result<String, BrowserError>;

    /// Read attribute `name` of the first element matching `selector`, waiting
    /// up to `timeout` for the element to appear. `Ok(None)` means the element
    /// exists but has no such attribute.
    async fn attribute(
        &mut self,
        selector: &str,
        name: &str,
        timeout: Duration,
    ) -> Result<Option<String>, BrowserError>;

    /// Scroll the element matching `selector` to its maximum scroll extent.
    async fn scroll_to_end(&mut self, selector: &str) -> Result<(), BrowserError>;

    /// Release the tab. Must be called on every exit path.
    async fn close(&mut self) -> Result<(), BrowserError>;
}

/// A browser session that hands out pages.
#[async_trait]
pub trait Browser: Send + Sync {
    async fn new_page(&self) -> Result<Box<dyn Page>, BrowserError>;

    /// End the session and release the browser process.
    async fn close(&self) -> Result<(), BrowserError>;
}
