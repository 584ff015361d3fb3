//! Flat-file store: one pretty-printed JSON file per entry.
//!
//! Layout under the data directory:
//! - `{asin}.json` for the scraped record
//! - `analysis_status_{asin}.json` for the analysis marker
//! - `asin_list/asin_list_{query}.json` for discovered ASINs

use super::{query_key, RecordStore};
use crate::amazon::models::{AnalysisStatus, Asin, ProductRecord};
use crate::error::{Error, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

/// JSON files under a working directory created on first write.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    root: PathBuf,
}

impl JsonFileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn record_path(&self, asin: &Asin) -> PathBuf {
        self.root.join(format!("{}.json", asin))
    }

    pub fn status_path(&self, asin: &Asin) -> PathBuf {
        self.root.join(format!("analysis_status_{}.json", asin))
    }

    pub fn asin_list_path(&self, query: &str) -> PathBuf {
        self.root.join("asin_list").join(format!("asin_list_{}.json", query_key(query)))
    }

    fn read<T: DeserializeOwned>(&self, path: &Path) -> Result<Option<T>> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        debug!("Cache hit: {}", path.display());
        serde_json::from_str(&content)
            .map(Some)
            .map_err(|source| Error::CacheCorrupt { path: path.to_path_buf(), source })
    }

    fn write<T: Serialize + ?Sized>(&self, path: &Path, value: &T) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        fs::write(path, to_pretty_json(value)?)?;
        debug!("Wrote {}", path.display());
        Ok(())
    }
}

/// Serializes with 4-space indentation.
pub fn to_pretty_json<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(b"    "));
    value.serialize(&mut ser)?;
    Ok(buf)
}

impl RecordStore for JsonFileStore {
    fn get_record(&self, asin: &Asin) -> Result<Option<ProductRecord>> {
        self.read(&self.record_path(asin))
    }

    fn put_record(&self, asin: &Asin, record: &ProductRecord) -> Result<()> {
        self.write(&self.record_path(asin), record)
    }

    fn get_status(&self, asin: &Asin) -> Result<Option<AnalysisStatus>> {
        self.read(&self.status_path(asin))
    }

    fn mark_done(&self, asin: &Asin, made_in_china: bool) -> Result<()> {
        self.write(&self.status_path(asin), &AnalysisStatus::done(made_in_china))
    }

    fn get_asin_list(&self, query: &str) -> Result<Option<Vec<Asin>>> {
        self.read(&self.asin_list_path(query))
    }

    fn put_asin_list(&self, query: &str, asins: &[Asin]) -> Result<()> {
        self.write(&self.asin_list_path(query), asins)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::amazon::models::{ProductInfo, Review};
    use tempfile::TempDir;

    fn asin() -> Asin {
        Asin::parse("B07VFHFBLL").unwrap()
    }

    fn make_record() -> ProductRecord {
        ProductRecord {
            product_info: ProductInfo {
                url: "https://www.amazon.com/dp/B07VFHFBLL".to_string(),
                text: "Charger".to_string(),
            },
            reviews: vec![Review {
                title: Some("Fine".to_string()),
                body: None,
                rating: Some("4.0 out of 5 stars".to_string()),
                date: None,
            }],
        }
    }

    #[test]
    fn test_missing_entries_are_cache_misses() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileStore::new(dir.path().join("json"));

        assert!(store.get_record(&asin()).unwrap().is_none());
        assert!(!store.is_done(&asin()).unwrap());
        assert!(store.get_asin_list("cable").unwrap().is_none());
        // Reads never create the directory
        assert!(!store.root().exists());
    }

    #[test]
    fn test_record_round_trip_and_layout() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileStore::new(dir.path().join("json"));
        let record = make_record();

        store.put_record(&asin(), &record).unwrap();
        assert!(dir.path().join("json/B07VFHFBLL.json").exists());
        assert_eq!(store.get_record(&asin()).unwrap(), Some(record));
    }

    #[test]
    fn test_files_use_four_space_indent() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileStore::new(dir.path());

        store.put_record(&asin(), &make_record()).unwrap();
        let content = fs::read_to_string(store.record_path(&asin())).unwrap();
        assert!(content.starts_with("{\n    \"product_info\": {\n        \"url\""));
        assert!(content.contains("\"body\": \"Body not found\""));
    }

    #[test]
    fn test_mark_done() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileStore::new(dir.path());

        store.mark_done(&asin(), false).unwrap();
        assert!(store.is_done(&asin()).unwrap());

        let content = fs::read_to_string(dir.path().join("analysis_status_B07VFHFBLL.json")).unwrap();
        let value: serde_json::Value = serde_json::from_str(&content).unwrap();
        assert_eq!(value, serde_json::json!({"status": "done", "made_in_china": false}));
    }

    #[test]
    fn test_legacy_null_status_counts_as_done() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileStore::new(dir.path());
        fs::write(store.status_path(&asin()), r#"{"status": "done", "made_in_china": null}"#).unwrap();

        assert!(store.is_done(&asin()).unwrap());
        assert_eq!(store.get_status(&asin()).unwrap().unwrap().made_in_china, None);
    }

    #[test]
    fn test_corrupt_file_fails_fast() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileStore::new(dir.path());
        fs::write(store.record_path(&asin()), "{\"product_info\": {\"url\": ").unwrap();

        let err = store.get_record(&asin()).unwrap_err();
        assert!(matches!(err, Error::CacheCorrupt { .. }));
        assert!(err.to_string().contains("B07VFHFBLL.json"));
    }

    #[test]
    fn test_asin_list_keyed_by_normalized_query() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileStore::new(dir.path());
        let asins = vec![asin(), Asin::parse("B08N5WRWNW").unwrap()];

        store.put_asin_list("usb  c cable", &asins).unwrap();
        assert!(dir.path().join("asin_list/asin_list_usb_c_cable.json").exists());
        assert_eq!(store.get_asin_list("usb c cable").unwrap(), Some(asins));
    }
}
