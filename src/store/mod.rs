//! Cache of scraped records and analysis markers.
//!
//! Records are write-once: nothing here updates or evicts an entry. Two
//! processes sharing one store can both miss and both write; that mode is
//! unsupported.

pub mod json;
pub mod memory;

use crate::amazon::models::{AnalysisStatus, Asin, ProductRecord};
use crate::error::Result;

pub use json::JsonFileStore;
pub use memory::MemoryStore;

/// Key/value access to per-product cache entries - swappable for tests.
pub trait RecordStore: Send + Sync {
    /// Returns the cached record, `None` on a cache miss.
    fn get_record(&self, asin: &Asin) -> Result<Option<ProductRecord>>;

    fn put_record(&self, asin: &Asin, record: &ProductRecord) -> Result<()>;

    /// Returns the analysis marker, `None` if the ASIN was never classified.
    fn get_status(&self, asin: &Asin) -> Result<Option<AnalysisStatus>>;

    fn mark_done(&self, asin: &Asin, made_in_china: bool) -> Result<()>;

    /// Whether classification already ran for this ASIN.
    fn is_done(&self, asin: &Asin) -> Result<bool> {
        Ok(self.get_status(asin)?.is_some())
    }

    /// Returns the ASINs discovered for a search query.
    fn get_asin_list(&self, query: &str) -> Result<Option<Vec<Asin>>>;

    fn put_asin_list(&self, query: &str, asins: &[Asin]) -> Result<()>;
}

/// Cache key for a search query: whitespace runs become `_`.
pub fn query_key(query: &str) -> String {
    query.split_whitespace().collect::<Vec<_>>().join("_")
}
