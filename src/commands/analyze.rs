//! Full analysis: scrape (or load), classify, mark done.

use crate::amazon::models::{AnalysisStatus, Asin};
use crate::classify::ProductClassifier;
use crate::commands::parse_asins;
use crate::config::Config;
use crate::error;
use crate::format::{Formatter, StatusRow};
use crate::scrape::Scraper;
use crate::store::{JsonFileStore, RecordStore};
use anyhow::{Context, Result};
use console::style;
use tracing::{info, warn};

/// What [`Pipeline::process`] did for one ASIN.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// An earlier run already classified it; nothing was fetched.
    Cached(AnalysisStatus),
    Analyzed { made_in_china: bool, reviews: usize },
}

/// Scraper, store and classifier wired together, one product at a time.
pub struct Pipeline {
    scraper: Scraper,
    store: Box<dyn RecordStore>,
    classifier: ProductClassifier,
}

impl Pipeline {
    pub fn new(scraper: Scraper, store: Box<dyn RecordStore>, classifier: ProductClassifier) -> Self {
        Self { scraper, store, classifier }
    }

    /// Pipeline over the configured data directory, network and classifier.
    pub async fn from_config(config: &Config) -> error::Result<Self> {
        let scraper = Scraper::from_config(config).await?;
        let store = JsonFileStore::new(&config.data_dir);
        Ok(Self::new(scraper, Box::new(store), ProductClassifier::from_config(config)))
    }

    pub fn scraper(&self) -> &Scraper {
        &self.scraper
    }

    pub fn store(&self) -> &dyn RecordStore {
        self.store.as_ref()
    }

    /// Runs one ASIN end to end.
    ///
    /// A done marker short-circuits everything. A classification error
    /// leaves no marker, so the next run tries again.
    pub async fn process(&self, asin: &Asin) -> error::Result<Outcome> {
        if let Some(status) = self.store.get_status(asin)? {
            info!("{} already analyzed", asin);
            return Ok(Outcome::Cached(status));
        }

        let record = self.scraper.load_or_scrape(self.store.as_ref(), asin).await?;
        let made_in_china = self.classifier.classify_record(&record)?;
        self.store.mark_done(asin, made_in_china)?;

        Ok(Outcome::Analyzed { made_in_china, reviews: record.reviews.len() })
    }

    /// Processes `asins` in order, reporting failures and moving on.
    pub async fn run(&self, asins: &[Asin]) -> Vec<StatusRow> {
        let mut rows = Vec::with_capacity(asins.len());

        for (i, asin) in asins.iter().enumerate() {
            eprintln!(
                "{} {} {}",
                style(format!("[{}/{}]", i + 1, asins.len())).dim(),
                style("Analyzing").cyan().bold(),
                asin
            );

            let row = match self.process(asin).await {
                Ok(Outcome::Cached(status)) => {
                    eprintln!("  {} already analyzed", style("•").dim());
                    StatusRow::cached(asin.clone(), status.made_in_china)
                }
                Ok(Outcome::Analyzed { made_in_china, reviews }) => {
                    if made_in_china {
                        eprintln!("  {} Made in China ({} reviews)", style("✔").red().bold(), reviews);
                    } else {
                        eprintln!("  {} No sign of Chinese origin ({} reviews)", style("✔").green(), reviews);
                    }
                    StatusRow::analyzed(asin.clone(), made_in_china, reviews)
                }
                Err(e) => {
                    warn!("Failed to analyze {}: {}", asin, e);
                    eprintln!("  {} {}", style("✘").red().bold(), e);
                    StatusRow::failed(asin.clone(), e.to_string())
                }
            };
            rows.push(row);
        }

        rows
    }
}

/// Executes the analysis pipeline for a list of ASINs.
pub struct AnalyzeCommand {
    config: Config,
}

impl AnalyzeCommand {
    /// Creates a new analyze command.
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Analyzes the given ASINs and returns a formatted report.
    pub async fn execute(&self, asins: &[String]) -> Result<String> {
        let pipeline =
            Pipeline::from_config(&self.config).await.context("Failed to set up scraper")?;

        self.execute_with_pipeline(&pipeline, asins).await
    }

    /// Analyzes with a provided pipeline (for testing).
    pub async fn execute_with_pipeline(
        &self,
        pipeline: &Pipeline,
        asins: &[String],
    ) -> Result<String> {
        let asins = parse_asins(asins);
        if asins.is_empty() {
            anyhow::bail!("No valid ASINs given. An ASIN is 10 alphanumeric characters.");
        }

        let rows = pipeline.run(&asins).await;

        let formatter = Formatter::new(self.config.format);
        Ok(formatter.format_statuses(&rows))
    }
}
