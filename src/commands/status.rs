//! Reports cached analysis markers without touching the network.

use crate::amazon::models::Asin;
use crate::commands::parse_asins;
use crate::config::Config;
use crate::format::{Formatter, StatusRow};
use crate::store::{JsonFileStore, RecordStore};
use anyhow::Result;

/// Shows what earlier runs concluded for a list of ASINs.
pub struct StatusCommand {
    config: Config,
}

impl StatusCommand {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    pub fn execute(&self, asins: &[String]) -> Result<String> {
        let store = JsonFileStore::new(&self.config.data_dir);
        self.execute_with_store(&store, asins)
    }

    /// Reads markers from a provided store (for testing).
    pub fn execute_with_store(&self, store: &dyn RecordStore, asins: &[String]) -> Result<String> {
        let asins = parse_asins(asins);
        if asins.is_empty() {
            anyhow::bail!("No valid ASINs given. An ASIN is 10 alphanumeric characters.");
        }

        let formatter = Formatter::new(self.config.format);
        Ok(formatter.format_statuses(&status_rows(store, &asins)))
    }
}

/// One row per ASIN from whatever markers the store holds.
///
/// An unreadable marker is reported on its row rather than aborting.
pub fn status_rows(store: &dyn RecordStore, asins: &[Asin]) -> Vec<StatusRow> {
    asins
        .iter()
        .map(|asin| match store.get_status(asin) {
            Ok(Some(status)) => StatusRow::cached(asin.clone(), status.made_in_china),
            Ok(None) => StatusRow::pending(asin.clone()),
            Err(e) => StatusRow::failed(asin.clone(), e.to_string()),
        })
        .collect()
}
