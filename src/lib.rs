//! amz-origin - Amazon review scraper with cached "made in China" detection
//!
//! Scrapes review listings and product pages (headless Chromium or plain
//! HTTP with TLS fingerprint emulation), caches each product as JSON and
//! flags products whose description or reviews point at Chinese origin.

pub mod amazon;
pub mod browser;
pub mod classify;
pub mod commands;
pub mod config;
pub mod error;
pub mod format;
pub mod scrape;
pub mod store;

pub use amazon::models::{AnalysisStatus, Asin, ProductInfo, ProductRecord, Review};
pub use amazon::regions::Region;
pub use config::Config;
pub use error::{Error, Result};
