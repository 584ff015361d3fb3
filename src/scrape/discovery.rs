//! Collects product ASINs from search result pages.

use super::Scraper;
use crate::amazon::models::Asin;
use crate::error::Result;
use crate::store::RecordStore;
use std::collections::HashSet;
use tracing::{debug, info, warn};

impl Scraper {
    /// Returns the ASINs listed for `query`, walking at most `max_pages`
    /// result pages.
    ///
    /// First-seen order is kept and repeats are dropped. A non-empty list is
    /// cached under the normalized query and returned as-is on later calls.
    pub async fn discover_asins(
        &self,
        store: &dyn RecordStore,
        query: &str,
        max_pages: u32,
    ) -> Result<Vec<Asin>> {
        if let Some(asins) = store.get_asin_list(query)? {
            info!("Using {} cached ASINs for '{}'", asins.len(), query);
            return Ok(asins);
        }

        let pages = self.pages.as_ref();
        let mut seen = HashSet::new();
        let mut asins = Vec::new();

        for page in 1..=max_pages {
            let html = self
                .options
                .retry
                .run("search page", move || async move { pages.search(query, page).await })
                .await?;

            let (found, has_more) = self.parser.parse_search_asins(&html)?;
            debug!("Search page {}: {} results", page, found.len());

            for asin in found {
                if seen.insert(asin.clone()) {
                    asins.push(asin);
                }
            }

            if !has_more {
                break;
            }
        }

        if asins.is_empty() {
            warn!("No products found for '{}'", query);
        } else {
            store.put_asin_list(query, &asins)?;
        }

        info!("Discovered {} ASINs for '{}'", asins.len(), query);
        Ok(asins)
    }
}
