//! In-process store with no persistence.
//!
//! Backs the unit tests of the scraper and commands; nothing is written to disk.

use super::{query_key, RecordStore};
use crate::amazon::models::{AnalysisStatus, Asin, ProductRecord};
use crate::error::Result;
use std::collections::HashMap;
use std::sync::RwLock;

#[derive(Debug, Default)]
pub struct MemoryStore {
    records: RwLock<HashMap<Asin, ProductRecord>>,
    statuses: RwLock<HashMap<Asin, AnalysisStatus>>,
    asin_lists: RwLock<HashMap<String, Vec<Asin>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RecordStore for MemoryStore {
    fn get_record(&self, asin: &Asin) -> Result<Option<ProductRecord>> {
        Ok(self.records.read().unwrap_or_else(|e| e.into_inner()).get(asin).cloned())
    }

    fn put_record(&self, asin: &Asin, record: &ProductRecord) -> Result<()> {
        self.records.write().unwrap_or_else(|e| e.into_inner()).insert(asin.clone(), record.clone());
        Ok(())
    }

    fn get_status(&self, asin: &Asin) -> Result<Option<AnalysisStatus>> {
        Ok(self.statuses.read().unwrap_or_else(|e| e.into_inner()).get(asin).cloned())
    }

    fn mark_done(&self, asin: &Asin, made_in_china: bool) -> Result<()> {
        self.statuses
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(asin.clone(), AnalysisStatus::done(made_in_china));
        Ok(())
    }

    fn get_asin_list(&self, query: &str) -> Result<Option<Vec<Asin>>> {
        Ok(self.asin_lists.read().unwrap_or_else(|e| e.into_inner()).get(&query_key(query)).cloned())
    }

    fn put_asin_list(&self, query: &str, asins: &[Asin]) -> Result<()> {
        self.asin_lists
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(query_key(query), asins.to_vec());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store_behaves_like_cache() {
        let store = MemoryStore::new();
        let asin = Asin::parse("B07VFHFBLL").unwrap();

        assert!(store.get_record(&asin).unwrap().is_none());
        store.put_record(&asin, &ProductRecord::default()).unwrap();
        assert_eq!(store.get_record(&asin).unwrap(), Some(ProductRecord::default()));

        assert!(!store.is_done(&asin).unwrap());
        store.mark_done(&asin, true).unwrap();
        assert_eq!(store.get_status(&asin).unwrap(), Some(AnalysisStatus::done(true)));

        store.put_asin_list("a  b", &[asin.clone()]).unwrap();
        assert_eq!(store.get_asin_list("a b").unwrap(), Some(vec![asin]));
    }
}
