//! Browser sessions for pages that only fill in after scrolling.
//!
//! A [`BrowserLauncher`] hands out [`BrowserSession`]s; whoever launches a
//! session must `quit` it on every path, including errors.

pub mod chrome;

use crate::error::Result;
use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, warn};

pub use chrome::ChromeLauncher;

/// One live browser with a single tab.
#[async_trait]
pub trait BrowserSession: Send {
    /// Navigates the tab to `url` and waits for the load to finish.
    async fn goto(&mut self, url: &str) -> Result<()>;

    /// Scrolls the document to its current bottom.
    async fn scroll_to_bottom(&mut self) -> Result<()>;

    /// Current `document.body.scrollHeight`.
    async fn document_height(&mut self) -> Result<u64>;

    /// Rendered HTML of the current document.
    async fn content(&mut self) -> Result<String>;

    /// Clicks the first element matching `selector`.
    ///
    /// Returns `Ok(false)` when nothing matches.
    async fn click(&mut self, selector: &str) -> Result<bool>;

    /// Shuts the browser down and releases its process.
    async fn quit(&mut self) -> Result<()>;
}

/// Factory for browser sessions.
#[async_trait]
pub trait BrowserLauncher: Send + Sync {
    async fn launch(&self) -> Result<Box<dyn BrowserSession>>;
}

/// Scrolls until two consecutive height readings match.
///
/// Bounded by `max_scrolls` so a feed that keeps growing still ends.
/// Returns the number of scrolls performed.
pub async fn scroll_until_stable(
    session: &mut dyn BrowserSession,
    delay: Duration,
    max_scrolls: u32,
) -> Result<u32> {
    let mut last_height = 0;
    let mut scrolls = 0;

    while scrolls < max_scrolls {
        session.scroll_to_bottom().await?;
        scrolls += 1;
        tokio::time::sleep(delay).await;

        let height = session.document_height().await?;
        debug!("Scroll {}: document height {}", scrolls, height);
        if height == last_height {
            return Ok(scrolls);
        }
        last_height = height;
    }

    warn!("Page height still changing after {} scrolls, reading it anyway", max_scrolls);
    Ok(scrolls)
}

/// Loads `url` in a fresh session and returns the rendered document.
///
/// The session is quit whether or not the load succeeded.
pub async fn fetch_rendered(launcher: &dyn BrowserLauncher, url: &str) -> Result<String> {
    let mut session = launcher.launch().await?;

    let result = match session.goto(url).await {
        Ok(()) => session.content().await,
        Err(e) => Err(e),
    };

    if let Err(e) = session.quit().await {
        warn!("Failed to shut down browser: {}", e);
    }
    result
}
