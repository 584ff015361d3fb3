//! HTTP client for Amazon requests using wreq for TLS fingerprint emulation.

use crate::amazon::models::Asin;
use crate::amazon::regions::{self, Region};
use crate::config::Config;
use crate::error::{Error, Result};
use async_trait::async_trait;
use rand::RngExt;
use std::time::Duration;
use tracing::{debug, info, warn};
use wreq::Client;
use wreq_util::Emulation;

/// Plain-HTTP access to Amazon pages - enables mocking for tests.
#[async_trait]
pub trait AmazonPages: Send + Sync {
    /// Fetches one page (1-based) of the review listing for an ASIN.
    async fn reviews(&self, asin: &Asin, page: u32) -> Result<String>;

    /// Fetches the product detail page for an ASIN.
    async fn product(&self, asin: &Asin) -> Result<String>;

    /// Fetches one page of search results.
    async fn search(&self, query: &str, page: u32) -> Result<String>;

    /// Base URL that page URLs are built from.
    fn base_url(&self) -> String;
}

/// Amazon HTTP client with browser impersonation and anti-bot measures.
pub struct AmazonClient {
    client: Client,
    region: Region,
    delay_ms: u64,
    delay_jitter_ms: u64,
    base_url: Option<String>,
}

impl AmazonClient {
    /// Creates a new Amazon client with the given configuration.
    pub async fn new(config: &Config) -> Result<Self> {
        Self::with_base_url(config, None).await
    }

    /// Creates a new Amazon client with an optional custom base URL (for testing).
    pub async fn with_base_url(config: &Config, base_url: Option<String>) -> Result<Self> {
        let mut builder = Client::builder()
            .cookie_store(true)
            .gzip(true)
            .brotli(true)
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(10));

        if let Some(proxy_url) = &config.proxy {
            debug!("Configuring proxy: {}", proxy_url);
            let proxy = wreq::Proxy::all(proxy_url)
                .map_err(|e| Error::Fetch(format!("Failed to configure proxy: {}", e)))?;
            builder = builder.proxy(proxy);
        }

        let client = builder
            .build()
            .map_err(|e| Error::Fetch(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            region: config.region,
            delay_ms: config.delay_ms,
            delay_jitter_ms: config.delay_jitter_ms,
            base_url,
        })
    }

    /// Performs a GET request with all anti-bot measures.
    pub async fn get(&self, url: &str) -> Result<String> {
        // Add human-like delay with jitter
        self.delay().await;

        debug!("GET {}", url);

        let response = self
            .client
            .get(url)
            .emulation(Emulation::Chrome131)
            .header("Accept", "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,image/apng,*/*;q=0.8")
            .header("Accept-Language", self.region.accept_language())
            .header("Accept-Encoding", "gzip, deflate, br")
            .header("Cache-Control", "no-cache")
            .header("Pragma", "no-cache")
            .header("Sec-Ch-Ua", "\"Chromium\";v=\"131\", \"Not_A Brand\";v=\"24\"")
            .header("Sec-Ch-Ua-Mobile", "?0")
            .header("Sec-Ch-Ua-Platform", "\"macOS\"")
            .header("Sec-Fetch-Dest", "document")
            .header("Sec-Fetch-Mode", "navigate")
            .header("Sec-Fetch-Site", "none")
            .header("Sec-Fetch-User", "?1")
            .header("Upgrade-Insecure-Requests", "1")
            .send()
            .await
            .map_err(|e| Error::Fetch(format!("Failed to send request to {}: {}", url, e)))?;

        let status = response.status();
        debug!("Response status: {}", status);

        if status == 503 {
            warn!("Rate limited (503). Consider using a proxy or increasing delay.");
            return Err(Error::Fetch(
                "Rate limited by Amazon. Try increasing --delay or using a proxy.".to_string(),
            ));
        }

        if !status.is_success() {
            return Err(Error::Fetch(format!("Request failed with status: {}", status)));
        }

        // Check for redirect to different region
        let final_url = response.uri().to_string();
        if !final_url.contains(self.region.domain()) && self.base_url.is_none() {
            warn!(
                "Redirected to different domain: {}. Your IP may be associated with a different region.",
                final_url
            );
        }

        response
            .text()
            .await
            .map_err(|e| Error::Fetch(format!("Failed to read response body: {}", e)))
    }

    /// Adds a random delay to mimic human behavior.
    async fn delay(&self) {
        if self.delay_ms == 0 {
            return;
        }

        let jitter = if self.delay_jitter_ms > 0 {
            rand::rng().random_range(0..=self.delay_jitter_ms)
        } else {
            0
        };

        let total_delay = self.delay_ms + jitter;
        debug!("Delaying {}ms", total_delay);
        tokio::time::sleep(Duration::from_millis(total_delay)).await;
    }

    pub fn region(&self) -> Region {
        self.region
    }
}

#[async_trait]
impl AmazonPages for AmazonClient {
    async fn reviews(&self, asin: &Asin, page: u32) -> Result<String> {
        let url = regions::review_page_url(&self.base_url(), asin, page);

        info!("Fetching reviews: {} (page {})", asin, page);
        self.get(&url).await
    }

    async fn product(&self, asin: &Asin) -> Result<String> {
        let url = regions::product_url(&self.base_url(), asin);

        info!("Fetching product: {}", asin);
        self.get(&url).await
    }

    async fn search(&self, query: &str, page: u32) -> Result<String> {
        let url = regions::search_url(&self.base_url(), query, page);

        info!("Searching: {} (page {})", query, page);
        self.get(&url).await
    }

    /// Custom base for testing, otherwise the region's storefront.
    fn base_url(&self) -> String {
        self.base_url.clone().unwrap_or_else(|| self.region.base_url())
    }
}
