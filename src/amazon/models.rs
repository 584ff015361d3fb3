//! Data models for reviews, product pages and analysis results.

use crate::error::Error;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Amazon Standard Identification Number.
///
/// Always 10 upper-case ASCII alphanumerics.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Asin(String);

impl Asin {
    /// Validates and normalizes (trim, upper-case) a raw ASIN.
    pub fn parse(raw: &str) -> Result<Self, Error> {
        let asin = raw.trim().to_uppercase();
        if asin.len() != 10 || !asin.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(Error::InvalidAsin(raw.trim().to_string()));
        }
        Ok(Self(asin))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Asin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Asin {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Asin> for String {
    fn from(asin: Asin) -> Self {
        asin.0
    }
}

impl std::str::FromStr for Asin {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Placeholders written to disk in place of fields the page did not carry.
pub mod sentinel {
    pub const TITLE: &str = "Title not found";
    pub const BODY: &str = "Body not found";
    pub const RATING: &str = "Rating not found";
    pub const DATE: &str = "Date not found";
}

/// A single customer review. `None` means the field was absent in the markup.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "StoredReview", into = "StoredReview")]
pub struct Review {
    pub title: Option<String>,
    pub body: Option<String>,
    pub rating: Option<String>,
    pub date: Option<String>,
}

impl Review {
    /// Number of fields that could not be located.
    pub fn missing_fields(&self) -> usize {
        [&self.title, &self.body, &self.rating, &self.date].iter().filter(|f| f.is_none()).count()
    }
}

/// On-disk shape of a review: plain strings, sentinels for absent fields.
#[derive(Serialize, Deserialize)]
struct StoredReview {
    #[serde(default)]
    title: String,
    #[serde(default)]
    body: String,
    #[serde(default)]
    rating: String,
    #[serde(default)]
    date: String,
}

fn from_stored(value: String, placeholder: &str) -> Option<String> {
    if value.is_empty() || value == placeholder {
        None
    } else {
        Some(value)
    }
}

impl From<StoredReview> for Review {
    fn from(stored: StoredReview) -> Self {
        Self {
            title: from_stored(stored.title, sentinel::TITLE),
            body: from_stored(stored.body, sentinel::BODY),
            rating: from_stored(stored.rating, sentinel::RATING),
            date: from_stored(stored.date, sentinel::DATE),
        }
    }
}

impl From<Review> for StoredReview {
    fn from(review: Review) -> Self {
        Self {
            title: review.title.unwrap_or_else(|| sentinel::TITLE.to_string()),
            body: review.body.unwrap_or_else(|| sentinel::BODY.to_string()),
            rating: review.rating.unwrap_or_else(|| sentinel::RATING.to_string()),
            date: review.date.unwrap_or_else(|| sentinel::DATE.to_string()),
        }
    }
}

/// Description text captured from a product detail page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductInfo {
    pub url: String,
    pub text: String,
}

/// Everything scraped for one product; persisted once and then read-only.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductRecord {
    pub product_info: ProductInfo,
    pub reviews: Vec<Review>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusKind {
    Done,
}

/// Marker recording that an ASIN has been classified.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisStatus {
    pub status: StatusKind,
    /// `null` only appears in files written by older runs.
    pub made_in_china: Option<bool>,
}

impl AnalysisStatus {
    pub fn done(made_in_china: bool) -> Self {
        Self { status: StatusKind::Done, made_in_china: Some(made_in_china) }
    }

    /// Verdict with legacy `null` read as "not made in China".
    pub fn verdict(&self) -> bool {
        self.made_in_china.unwrap_or(false)
    }
}
