//! Review listing command: scrape (or load cached) reviews and print them.

use crate::amazon::models::Asin;
use crate::config::Config;
use crate::format::Formatter;
use crate::scrape::Scraper;
use crate::store::{JsonFileStore, RecordStore};
use anyhow::{Context, Result};
use tracing::info;

/// Prints the reviews recorded for one product.
pub struct ReviewsCommand {
    config: Config,
}

impl ReviewsCommand {
    /// Creates a new reviews command.
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Loads or scrapes reviews for an ASIN and returns formatted output.
    pub async fn execute(&self, asin: &str) -> Result<String> {
        let scraper = Scraper::from_config(&self.config).await.context("Failed to set up scraper")?;
        let store = JsonFileStore::new(&self.config.data_dir);

        self.execute_with(&scraper, &store, asin).await
    }

    /// Loads or scrapes with a provided scraper and store (for testing).
    pub async fn execute_with(
        &self,
        scraper: &Scraper,
        store: &dyn RecordStore,
        asin: &str,
    ) -> Result<String> {
        let asin = Asin::parse(asin)?;

        info!("Collecting reviews for {}", asin);
        let record = scraper
            .load_or_scrape(store, &asin)
            .await
            .with_context(|| format!("Failed to collect reviews for {}", asin))?;

        let formatter = Formatter::new(self.config.format);
        Ok(formatter.format_reviews(&asin, &record.reviews))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{FetchMode, OutputFormat};
    use crate::scrape::mock::{make_scraper, product_page, review_page, MockPages};
    use std::sync::atomic::Ordering;
    use tempfile::TempDir;

    fn make_test_config(format: OutputFormat) -> Config {
        Config { format, mode: FetchMode::Http, ..Config::immediate() }
    }

    #[tokio::test]
    async fn test_reviews_scraped_then_cached() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileStore::new(dir.path());

        let mut pages = MockPages::default();
        pages.review_pages = vec![review_page(&["Great"], true), review_page(&["Awful"], false)];
        pages.product_page = product_page("Lamp");
        let review_calls = pages.review_calls.clone();
        let scraper = make_scraper(pages, vec![], FetchMode::Http);
        let cmd = ReviewsCommand::new(make_test_config(OutputFormat::Table));

        let output = cmd.execute_with(&scraper, &store, "B07VFHFBLL").await.unwrap();
        assert!(output.contains("Reviews for B07VFHFBLL"));
        assert!(output.contains("Great"));
        assert!(output.contains("Awful"));
        assert!(output.contains("Total: 2 reviews"));

        let again = cmd.execute_with(&scraper, &store, "B07VFHFBLL").await.unwrap();
        assert_eq!(again, output);
        assert_eq!(review_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_reviews_json_output() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileStore::new(dir.path());

        let mut pages = MockPages::default();
        pages.review_pages = vec![review_page(&["Only"], false)];
        let scraper = make_scraper(pages, vec![], FetchMode::Http);
        let cmd = ReviewsCommand::new(make_test_config(OutputFormat::Json));

        let output = cmd.execute_with(&scraper, &store, "B07VFHFBLL").await.unwrap();
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(value[0]["title"], "Only");
        assert_eq!(value[0]["rating"], "Rating not found");
    }

    #[tokio::test]
    async fn test_reviews_invalid_asin() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileStore::new(dir.path());
        let scraper = make_scraper(MockPages::default(), vec![], FetchMode::Http);
        let cmd = ReviewsCommand::new(make_test_config(OutputFormat::Table));

        let err = cmd.execute_with(&scraper, &store, "B07").await.unwrap_err();
        assert!(err.to_string().contains("invalid ASIN"));
    }

    #[tokio::test]
    async fn test_reviews_fetch_failure_has_context() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileStore::new(dir.path());

        let mut pages = MockPages::default();
        pages.review_pages = vec![review_page(&["x"], false)];
        pages.fail_product = true;
        let scraper = make_scraper(pages, vec![], FetchMode::Http);
        let cmd = ReviewsCommand::new(make_test_config(OutputFormat::Table));

        let err = cmd.execute_with(&scraper, &store, "B07VFHFBLL").await.unwrap_err();
        assert!(err.to_string().contains("Failed to collect reviews for B07VFHFBLL"));
        assert!(!dir.path().join("B07VFHFBLL.json").exists());
    }
}
