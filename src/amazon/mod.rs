//! Amazon-specific modules for HTTP client, parsing, and data models.

pub mod client;
pub mod models;
pub mod parser;
pub mod regions;
pub mod selectors;

pub use client::{AmazonClient, AmazonPages};
pub use models::{AnalysisStatus, Asin, ProductInfo, ProductRecord, Review};
pub use parser::Parser;
pub use regions::Region;
