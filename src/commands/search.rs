//! Search command: discover ASINs for a query, then analyze each.

use crate::commands::analyze::Pipeline;
use crate::commands::status::status_rows;
use crate::config::Config;
use crate::format::Formatter;
use anyhow::{Context, Result};
use console::style;
use tracing::info;

/// Executes search discovery and, unless asked not to, the analysis pipeline.
pub struct SearchCommand {
    config: Config,
}

impl SearchCommand {
    /// Creates a new search command.
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Runs the search and returns a formatted report.
    pub async fn execute(
        &self,
        query: &str,
        max_pages: Option<u32>,
        discover_only: bool,
    ) -> Result<String> {
        let pipeline =
            Pipeline::from_config(&self.config).await.context("Failed to set up scraper")?;

        self.execute_with_pipeline(&pipeline, query, max_pages, discover_only).await
    }

    /// Runs the search with a provided pipeline (for testing).
    pub async fn execute_with_pipeline(
        &self,
        pipeline: &Pipeline,
        query: &str,
        max_pages: Option<u32>,
        discover_only: bool,
    ) -> Result<String> {
        let query = query.trim();
        if query.is_empty() {
            anyhow::bail!("Search query is empty");
        }

        info!("Searching for: {}", query);

        let max_pages = max_pages.unwrap_or(self.config.search_max_pages);
        let asins = pipeline
            .scraper()
            .discover_asins(pipeline.store(), query, max_pages)
            .await
            .with_context(|| format!("Search for '{}' failed", query))?;

        eprintln!("{} {} products for '{}'", style("Found").green().bold(), asins.len(), query);

        let rows = if discover_only {
            status_rows(pipeline.store(), &asins)
        } else {
            pipeline.run(&asins).await
        };

        let formatter = Formatter::new(self.config.format);
        Ok(formatter.format_statuses(&rows))
    }
}
