//! Headless Chromium sessions over the DevTools protocol.

use super::{BrowserLauncher, BrowserSession};
use crate::config::Config;
use crate::error::{Error, Result};
use async_trait::async_trait;
use std::path::PathBuf;
use std::time::Duration;

#[cfg(feature = "browser")]
use chromiumoxide::cdp::browser_protocol::network::SetUserAgentOverrideParams;
#[cfg(feature = "browser")]
use chromiumoxide::{Browser, BrowserConfig, Page};
#[cfg(feature = "browser")]
use futures::StreamExt;
#[cfg(feature = "browser")]
use tracing::{debug, info, warn};

/// Default user agent for browser requests.
#[cfg(feature = "browser")]
const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36";

/// Launches a fresh Chromium process per session.
#[derive(Debug, Clone)]
#[cfg_attr(not(feature = "browser"), allow(dead_code))]
pub struct ChromeLauncher {
    headless: bool,
    chrome_path: Option<PathBuf>,
    proxy: Option<String>,
    /// Navigation timeout.
    timeout: Duration,
}

impl ChromeLauncher {
    pub fn from_config(config: &Config) -> Self {
        Self {
            headless: config.headless,
            chrome_path: config.chrome_path.clone(),
            proxy: config.proxy.clone(),
            timeout: Duration::from_secs(60),
        }
    }
}

#[cfg(feature = "browser")]
#[async_trait]
impl BrowserLauncher for ChromeLauncher {
    async fn launch(&self) -> Result<Box<dyn BrowserSession>> {
        info!("Launching browser (headless={})", self.headless);

        let mut builder = BrowserConfig::builder()
            .no_sandbox()
            .arg("--disable-gpu")
            .arg("--disable-dev-shm-usage")
            .arg("--disable-extensions")
            .arg("--disable-blink-features=AutomationControlled")
            .arg("--no-first-run");

        // with_head means NOT headless
        if !self.headless {
            builder = builder.with_head();
        }

        if let Some(path) = &self.chrome_path {
            builder = builder.chrome_executable(path);
        }

        if let Some(proxy) = &self.proxy {
            builder = builder.arg(format!("--proxy-server={}", proxy));
        }

        let config = builder
            .build()
            .map_err(|e| Error::Browser(format!("Failed to build browser config: {}", e)))?;

        let (mut browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| Error::Browser(format!("Failed to launch browser: {}", e)))?;

        let handler_task = tokio::spawn(async move {
            while let Some(h) = handler.next().await {
                if h.is_err() {
                    break;
                }
            }
        });

        let page = match open_page(&browser).await {
            Ok(page) => page,
            Err(e) => {
                let _ = browser.close().await;
                let _ = browser.wait().await;
                handler_task.abort();
                return Err(e);
            }
        };

        Ok(Box::new(ChromeSession { browser, page, handler_task, timeout: self.timeout }))
    }
}

#[cfg(feature = "browser")]
async fn open_page(browser: &Browser) -> Result<Page> {
    let page = browser
        .new_page("about:blank")
        .await
        .map_err(|e| Error::Browser(format!("Failed to open tab: {}", e)))?;

    page.execute(SetUserAgentOverrideParams::new(BROWSER_USER_AGENT.to_string()))
        .await
        .map_err(|e| Error::Browser(format!("Failed to set user agent: {}", e)))?;

    Ok(page)
}

#[cfg(feature = "browser")]
pub struct ChromeSession {
    browser: Browser,
    page: Page,
    handler_task: tokio::task::JoinHandle<()>,
    timeout: Duration,
}

#[cfg(feature = "browser")]
#[async_trait]
impl BrowserSession for ChromeSession {
    async fn goto(&mut self, url: &str) -> Result<()> {
        info!("Navigating to {}", url);

        tokio::time::timeout(self.timeout, self.page.goto(url))
            .await
            .map_err(|_| {
                Error::Browser(format!(
                    "Navigation timed out after {}s for {}",
                    self.timeout.as_secs(),
                    url
                ))
            })?
            .map_err(|e| Error::Browser(format!("Navigation failed for {}: {}", url, e)))?;

        Ok(())
    }

    async fn scroll_to_bottom(&mut self) -> Result<()> {
        self.page
            .evaluate("window.scrollTo(0, document.body.scrollHeight);".to_string())
            .await
            .map_err(|e| Error::Browser(format!("Scroll failed: {}", e)))?;
        Ok(())
    }

    async fn document_height(&mut self) -> Result<u64> {
        let height: f64 = self
            .page
            .evaluate("document.body.scrollHeight".to_string())
            .await
            .map_err(|e| Error::Browser(format!("Height query failed: {}", e)))?
            .into_value()
            .map_err(|e| Error::Browser(format!("Unexpected height value: {}", e)))?;
        Ok(height as u64)
    }

    async fn content(&mut self) -> Result<String> {
        self.page
            .content()
            .await
            .map_err(|e| Error::Browser(format!("Failed to read page content: {}", e)))
    }

    async fn click(&mut self, selector: &str) -> Result<bool> {
        let element = match self.page.find_element(selector).await {
            Ok(element) => element,
            Err(e) => {
                debug!("No element for '{}': {}", selector, e);
                return Ok(false);
            }
        };

        if let Err(e) = element.click().await {
            warn!("Click on '{}' failed: {}", selector, e);
            return Ok(false);
        }

        if let Err(e) = self.page.wait_for_navigation().await {
            debug!("No navigation after clicking '{}': {}", selector, e);
        }
        Ok(true)
    }

    async fn quit(&mut self) -> Result<()> {
        debug!("Closing browser");
        let closed = self
            .browser
            .close()
            .await
            .map(|_| ())
            .map_err(|e| Error::Browser(format!("Failed to close browser: {}", e)));

        // Reap the child even if the close command failed
        let _ = self.browser.wait().await;
        self.handler_task.abort();
        closed
    }
}

// Stub for when browser feature is disabled
#[cfg(not(feature = "browser"))]
#[async_trait]
impl BrowserLauncher for ChromeLauncher {
    async fn launch(&self) -> Result<Box<dyn BrowserSession>> {
        Err(Error::Browser(
            "Browser support not compiled. Rebuild with: cargo build --features browser, \
             or use --mode http"
                .to_string(),
        ))
    }
}
