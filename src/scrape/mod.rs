//! Multi-page review scraping, product page capture and the record cache
//! in front of both.

pub mod discovery;
pub mod paginator;

use crate::amazon::models::{Asin, ProductInfo, ProductRecord, Review};
use crate::amazon::{regions, AmazonClient, AmazonPages, Parser};
use crate::browser::{self, BrowserLauncher, BrowserSession, ChromeLauncher};
use crate::config::{Config, FetchMode};
use crate::error::Result;
use crate::store::RecordStore;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Bounded retry with exponential backoff for transient fetch failures.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_retries: u32,
    /// Delay before the first retry; doubled for each one after.
    pub backoff: Duration,
}

impl RetryPolicy {
    /// Runs `op` until it succeeds, fails with a non-retryable error, or
    /// the retries are used up.
    pub async fn run<T, F, Fut>(&self, what: &str, mut op: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut attempt = 0;
        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_retryable() && attempt < self.max_retries => {
                    let delay = self.backoff.saturating_mul(2u32.saturating_pow(attempt));
                    attempt += 1;
                    warn!(
                        "{} failed: {}. Retry {}/{} in {:?}",
                        what, e, attempt, self.max_retries, delay
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

/// Knobs for one scraper, lifted from [`Config`].
#[derive(Debug, Clone)]
pub struct ScrapeOptions {
    pub mode: FetchMode,
    pub scroll_delay: Duration,
    pub settle_delay: Duration,
    pub max_scrolls: u32,
    pub max_review_pages: Option<u32>,
    pub retry: RetryPolicy,
}

impl ScrapeOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            mode: config.mode,
            scroll_delay: Duration::from_millis(config.scroll_delay_ms),
            settle_delay: Duration::from_millis(config.settle_delay_ms),
            max_scrolls: config.max_scrolls,
            max_review_pages: config.max_review_pages,
            retry: RetryPolicy {
                max_retries: config.max_retries,
                backoff: Duration::from_millis(config.retry_backoff_ms),
            },
        }
    }
}

/// Fetches and parses everything recorded for a product.
pub struct Scraper {
    pages: Box<dyn AmazonPages>,
    launcher: Box<dyn BrowserLauncher>,
    parser: Parser,
    options: ScrapeOptions,
}

impl Scraper {
    pub fn new(
        pages: Box<dyn AmazonPages>,
        launcher: Box<dyn BrowserLauncher>,
        options: ScrapeOptions,
    ) -> Self {
        Self { pages, launcher, parser: Parser::new(), options }
    }

    /// Scraper backed by the real HTTP client and Chromium.
    pub async fn from_config(config: &Config) -> Result<Self> {
        let client = AmazonClient::new(config).await?;
        Ok(Self::new(
            Box::new(client),
            Box::new(ChromeLauncher::from_config(config)),
            ScrapeOptions::from_config(config),
        ))
    }

    pub fn options(&self) -> &ScrapeOptions {
        &self.options
    }

    /// Returns the cached record, or scrapes and stores a new one.
    ///
    /// Nothing is written unless both the reviews and the product page were
    /// fetched.
    pub async fn load_or_scrape(
        &self,
        store: &dyn RecordStore,
        asin: &Asin,
    ) -> Result<ProductRecord> {
        if let Some(record) = store.get_record(asin)? {
            info!("Loaded cached record for {}", asin);
            return Ok(record);
        }

        let reviews = self.scrape_reviews(asin).await?;
        let product_info = self.scrape_product_info(asin).await?;
        let record = ProductRecord { product_info, reviews };

        store.put_record(asin, &record)?;
        info!("Saved {} reviews for {}", record.reviews.len(), asin);
        Ok(record)
    }

    /// Every review in the listing, in page order.
    pub async fn scrape_reviews(&self, asin: &Asin) -> Result<Vec<Review>> {
        match self.options.mode {
            FetchMode::Browser => {
                self.options
                    .retry
                    .run("review listing", move || self.browser_reviews(asin))
                    .await
            }
            FetchMode::Http => self.http_reviews(asin).await,
        }
    }

    /// Description text from the product detail page.
    pub async fn scrape_product_info(&self, asin: &Asin) -> Result<ProductInfo> {
        let url = regions::product_url(&self.pages.base_url(), asin);
        let pages = self.pages.as_ref();
        let launcher = self.launcher.as_ref();
        let mode = self.options.mode;
        let target = url.as_str();

        let html = self
            .options
            .retry
            .run("product page", move || async move {
                match mode {
                    FetchMode::Browser => browser::fetch_rendered(launcher, target).await,
                    FetchMode::Http => pages.product(asin).await,
                }
            })
            .await?;

        self.parser.parse_product_info(&html, &url)
    }

    async fn browser_reviews(&self, asin: &Asin) -> Result<Vec<Review>> {
        let url = regions::review_url(&self.pages.base_url(), asin);
        let mut session = self.launcher.launch().await?;

        let result = self.collect_rendered_reviews(session.as_mut(), &url).await;

        if let Err(e) = session.quit().await {
            warn!("Failed to shut down browser: {}", e);
        }
        result
    }

    async fn collect_rendered_reviews(
        &self,
        session: &mut dyn BrowserSession,
        url: &str,
    ) -> Result<Vec<Review>> {
        session.goto(url).await?;

        let mut reviews = Vec::new();
        let mut page = 1;
        loop {
            browser::scroll_until_stable(session, self.options.scroll_delay, self.options.max_scrolls)
                .await?;
            tokio::time::sleep(self.options.settle_delay).await;

            let html = session.content().await?;
            self.parser.check_page(&html)?;

            let batch = self.parser.parse_reviews(&html);
            info!("Review page {}: {} reviews", page, batch.len());
            reviews.extend(batch);

            if self.page_limit_reached(page) || !paginator::has_next(&html) {
                break;
            }
            if !paginator::advance(session).await? {
                break;
            }
            page += 1;
        }

        Ok(reviews)
    }

    async fn http_reviews(&self, asin: &Asin) -> Result<Vec<Review>> {
        let pages = self.pages.as_ref();
        let mut reviews = Vec::new();
        let mut page = 1;

        loop {
            let html = self
                .options
                .retry
                .run("review page", move || async move { pages.reviews(asin, page).await })
                .await?;
            self.parser.check_page(&html)?;

            let batch = self.parser.parse_reviews(&html);
            info!("Review page {}: {} reviews", page, batch.len());
            reviews.extend(batch);

            if self.page_limit_reached(page) || !paginator::has_next(&html) {
                break;
            }
            page += 1;
        }

        Ok(reviews)
    }

    fn page_limit_reached(&self, page: u32) -> bool {
        let reached = self.options.max_review_pages.is_some_and(|max| page >= max);
        if reached {
            debug!("Stopping at configured page limit ({})", page);
        }
        reached
    }
}

#[cfg(test)]
pub(crate) mod mock {
    //! Scripted Amazon pages shared by scraper and pipeline tests.

    use super::*;
    use crate::browser::fake::FakeLauncher;
    use crate::error::Error;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    /// Serves canned HTML and counts every request.
    #[derive(Default)]
    pub struct MockPages {
        /// Review listing pages, page 1 first.
        pub review_pages: Vec<String>,
        pub product_page: String,
        pub search_pages: Vec<String>,
        /// Review requests that fail with a fetch error before any succeed.
        pub transient_failures: Arc<AtomicU32>,
        pub fail_product: bool,
        pub review_calls: Arc<AtomicU32>,
        pub product_calls: Arc<AtomicU32>,
        pub search_calls: Arc<AtomicU32>,
    }

    #[async_trait]
    impl AmazonPages for MockPages {
        async fn reviews(&self, _asin: &Asin, page: u32) -> Result<String> {
            self.review_calls.fetch_add(1, Ordering::SeqCst);
            let pending = self.transient_failures.load(Ordering::SeqCst);
            if pending > 0 {
                self.transient_failures.store(pending - 1, Ordering::SeqCst);
                return Err(Error::Fetch("connection reset".to_string()));
            }
            Ok(self.review_pages.get(page as usize - 1).cloned().unwrap_or_default())
        }

        async fn product(&self, _asin: &Asin) -> Result<String> {
            self.product_calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_product {
                return Err(Error::Fetch("Request failed with status: 500".to_string()));
            }
            Ok(self.product_page.clone())
        }

        async fn search(&self, _query: &str, page: u32) -> Result<String> {
            self.search_calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.search_pages.get(page as usize - 1).cloned().unwrap_or_default())
        }

        fn base_url(&self) -> String {
            "https://www.amazon.test".to_string()
        }
    }

    /// Scraper with no waits and no retries.
    pub fn make_scraper(pages: MockPages, browser_pages: Vec<String>, mode: FetchMode) -> Scraper {
        let config = Config { mode, ..Config::immediate() };
        Scraper::new(
            Box::new(pages),
            Box::new(FakeLauncher::new(browser_pages)),
            ScrapeOptions::from_config(&config),
        )
    }

    /// A review listing page holding `titles`, linking onward when `next`.
    pub fn review_page(titles: &[&str], next: bool) -> String {
        let reviews: String = titles
            .iter()
            .map(|t| {
                format!(
                    r#"<div data-hook="review">
                        <a data-hook="review-title"><span>{t}</span></a>
                        <span data-hook="review-body"><span>{t} body</span></span>
                    </div>"#
                )
            })
            .collect();
        let pager = if next {
            r#"<ul class="a-pagination"><li class="a-last"><a href="?pageNumber=2">Next page</a></li></ul>"#
        } else {
            r#"<ul class="a-pagination"><li class="a-disabled a-last">Next page</li></ul>"#
        };
        format!("<html><body>{}{}</body></html>", reviews, pager)
    }

    pub fn product_page(text: &str) -> String {
        format!(r#"<html><body><span id="productTitle">{}</span></body></html>"#, text)
    }
}

#[cfg(test)]
mod tests {
    use super::mock::{make_scraper, product_page, review_page, MockPages};
    use super::*;
    use crate::browser::fake::{Calls, FakeLauncher};
    use crate::error::Error;
    use crate::store::{JsonFileStore, MemoryStore};
    use std::sync::atomic::Ordering;
    use tempfile::TempDir;

    fn asin() -> Asin {
        Asin::parse("B07VFHFBLL").unwrap()
    }

    #[tokio::test]
    async fn test_http_reviews_follow_pager() {
        let mut pages = MockPages::default();
        pages.review_pages = vec![
            review_page(&["a", "b"], true),
            review_page(&["c"], true),
            review_page(&["d"], false),
        ];
        let calls = pages.review_calls.clone();
        let scraper = make_scraper(pages, vec![], FetchMode::Http);

        let reviews = scraper.scrape_reviews(&asin()).await.unwrap();
        let titles: Vec<_> = reviews.iter().map(|r| r.title.as_deref().unwrap()).collect();
        assert_eq!(titles, vec!["a", "b", "c", "d"]);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_empty_listing_terminates() {
        let mut pages = MockPages::default();
        pages.review_pages = vec![review_page(&[], false)];
        let calls = pages.review_calls.clone();
        let scraper = make_scraper(pages, vec![], FetchMode::Http);

        assert!(scraper.scrape_reviews(&asin()).await.unwrap().is_empty());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_review_page_limit() {
        let mut pages = MockPages::default();
        pages.review_pages = (0..10).map(|_| review_page(&["same"], true)).collect();
        let calls = pages.review_calls.clone();
        let config = Config { mode: FetchMode::Http, max_review_pages: Some(3), ..Config::immediate() };
        let scraper = Scraper::new(
            Box::new(pages),
            Box::new(FakeLauncher::new(vec![])),
            ScrapeOptions::from_config(&config),
        );

        let reviews = scraper.scrape_reviews(&asin()).await.unwrap();
        // Repeated content is kept as-is
        assert_eq!(reviews.len(), 3);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_browser_reviews_click_through_pages() {
        let launcher = FakeLauncher::new(vec![
            review_page(&["first"], true),
            review_page(&["second"], false),
        ]);
        let calls = launcher.calls.clone();
        let visited = launcher.visited.clone();
        let config = Config::immediate();
        let scraper = Scraper::new(
            Box::new(MockPages::default()),
            Box::new(launcher),
            ScrapeOptions::from_config(&config),
        );

        let reviews = scraper.scrape_reviews(&asin()).await.unwrap();
        assert_eq!(reviews.len(), 2);
        assert_eq!(reviews[1].body.as_deref(), Some("second body"));

        assert_eq!(Calls::get(&calls.launches), 1);
        assert_eq!(Calls::get(&calls.quits), 1);
        assert_eq!(Calls::get(&calls.clicks), 1);
        assert_eq!(
            visited.lock().unwrap().as_slice(),
            ["https://www.amazon.test/product-reviews/B07VFHFBLL/"]
        );
    }

    #[tokio::test]
    async fn test_browser_session_quit_when_blocked() {
        let launcher = FakeLauncher::new(vec![
            r#"<html><form action="/errors/validateCaptcha"></form></html>"#.to_string(),
        ]);
        let calls = launcher.calls.clone();
        let scraper = Scraper::new(
            Box::new(MockPages::default()),
            Box::new(launcher),
            ScrapeOptions::from_config(&Config { max_retries: 3, ..Config::immediate() }),
        );

        let err = scraper.scrape_reviews(&asin()).await.unwrap_err();
        assert!(matches!(err, Error::Blocked(_)));
        // Blocks are never retried
        assert_eq!(Calls::get(&calls.launches), 1);
        assert_eq!(Calls::get(&calls.quits), 1);
    }

    #[tokio::test]
    async fn test_browser_goto_failure_is_retried() {
        let mut launcher = FakeLauncher::new(vec![]);
        launcher.fail_goto = true;
        let calls = launcher.calls.clone();
        let scraper = Scraper::new(
            Box::new(MockPages::default()),
            Box::new(launcher),
            ScrapeOptions::from_config(&Config { max_retries: 2, ..Config::immediate() }),
        );

        assert!(scraper.scrape_reviews(&asin()).await.is_err());
        assert_eq!(Calls::get(&calls.launches), 3);
        assert_eq!(Calls::get(&calls.quits), 3);
    }

    #[tokio::test]
    async fn test_transient_fetch_error_retried() {
        let mut pages = MockPages::default();
        pages.review_pages = vec![review_page(&["ok"], false)];
        pages.transient_failures.store(2, Ordering::SeqCst);
        let calls = pages.review_calls.clone();
        let config = Config { mode: FetchMode::Http, max_retries: 2, ..Config::immediate() };
        let scraper = Scraper::new(
            Box::new(pages),
            Box::new(FakeLauncher::new(vec![])),
            ScrapeOptions::from_config(&config),
        );

        assert_eq!(scraper.scrape_reviews(&asin()).await.unwrap().len(), 1);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_product_info_http() {
        let mut pages = MockPages::default();
        pages.product_page = product_page("USB-C Charger, made in China");
        let scraper = make_scraper(pages, vec![], FetchMode::Http);

        let info = scraper.scrape_product_info(&asin()).await.unwrap();
        assert_eq!(info.url, "https://www.amazon.test/dp/B07VFHFBLL");
        assert_eq!(info.text, "USB-C Charger, made in China");
    }

    #[tokio::test]
    async fn test_product_info_browser() {
        let launcher = FakeLauncher::new(vec![product_page("Rendered title")]);
        let calls = launcher.calls.clone();
        let scraper = Scraper::new(
            Box::new(MockPages::default()),
            Box::new(launcher),
            ScrapeOptions::from_config(&Config::immediate()),
        );

        let info = scraper.scrape_product_info(&asin()).await.unwrap();
        assert_eq!(info.text, "Rendered title");
        assert_eq!(Calls::get(&calls.quits), 1);
    }

    #[tokio::test]
    async fn test_load_or_scrape_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileStore::new(dir.path());

        let mut pages = MockPages::default();
        pages.review_pages = vec![review_page(&["one", "two"], false)];
        pages.product_page = product_page("Cable");
        let review_calls = pages.review_calls.clone();
        let product_calls = pages.product_calls.clone();
        let scraper = make_scraper(pages, vec![], FetchMode::Http);

        let first = scraper.load_or_scrape(&store, &asin()).await.unwrap();
        let bytes = std::fs::read(store.record_path(&asin())).unwrap();

        let second = scraper.load_or_scrape(&store, &asin()).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(std::fs::read(store.record_path(&asin())).unwrap(), bytes);
        assert_eq!(review_calls.load(Ordering::SeqCst), 1);
        assert_eq!(product_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_nothing_written_when_product_fetch_fails() {
        let mut pages = MockPages::default();
        pages.review_pages = vec![review_page(&["one"], false)];
        pages.fail_product = true;
        let scraper = make_scraper(pages, vec![], FetchMode::Http);
        let store = MemoryStore::new();

        let err = scraper.load_or_scrape(&store, &asin()).await.unwrap_err();
        assert!(matches!(err, Error::Fetch(_)));
        assert!(store.get_record(&asin()).unwrap().is_none());
    }

    #[tokio::test]
    async fn test_retry_backoff_doubles() {
        let policy = RetryPolicy { max_retries: 3, backoff: Duration::from_millis(1) };
        let attempts = &std::sync::atomic::AtomicU32::new(0);

        let started = std::time::Instant::now();
        let result: Result<()> = policy
            .run("op", move || async move {
                attempts.fetch_add(1, Ordering::SeqCst);
                Err(Error::Fetch("down".to_string()))
            })
            .await;

        assert!(result.is_err());
        assert_eq!(attempts.load(Ordering::SeqCst), 4);
        // 1 + 2 + 4 ms of backoff
        assert!(started.elapsed() >= Duration::from_millis(7));
    }
}
