//! Amazon storefronts and the URLs derived from them.
//!
//! Only English-language storefronts are listed: origin detection matches
//! English keywords, so reviews written in other languages would never match.

use crate::amazon::models::Asin;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Supported Amazon storefronts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Region {
    #[default]
    Us,
    Uk,
    Ca,
    Au,
    In,
    Sg,
    Ae,
}

impl Region {
    /// Returns the Amazon domain for this region.
    pub fn domain(&self) -> &'static str {
        match self {
            Region::Us => "amazon.com",
            Region::Uk => "amazon.co.uk",
            Region::Ca => "amazon.ca",
            Region::Au => "amazon.com.au",
            Region::In => "amazon.in",
            Region::Sg => "amazon.sg",
            Region::Ae => "amazon.ae",
        }
    }

    /// Returns the base URL for this region.
    pub fn base_url(&self) -> String {
        format!("https://www.{}", self.domain())
    }

    pub fn accept_language(&self) -> &'static str {
        match self {
            Region::Us | Region::Ca => "en-US,en;q=0.9",
            Region::Uk => "en-GB,en;q=0.9",
            Region::Au => "en-AU,en;q=0.9",
            Region::In => "en-IN,en;q=0.9,hi;q=0.8",
            Region::Sg => "en-SG,en;q=0.9",
            Region::Ae => "en-AE,en;q=0.9,ar;q=0.8",
        }
    }

    /// Returns all supported regions.
    pub fn all() -> &'static [Region] {
        &[Region::Us, Region::Uk, Region::Ca, Region::Au, Region::In, Region::Sg, Region::Ae]
    }
}

/// Review listing URL for an ASIN under `base`.
pub fn review_url(base: &str, asin: &Asin) -> String {
    format!("{}/product-reviews/{}/", base.trim_end_matches('/'), asin)
}

/// Review listing URL for a specific page (1-based).
pub fn review_page_url(base: &str, asin: &Asin, page: u32) -> String {
    format!("{}?pageNumber={}", review_url(base, asin), page)
}

/// Product detail page URL for an ASIN under `base`.
pub fn product_url(base: &str, asin: &Asin) -> String {
    format!("{}/dp/{}", base.trim_end_matches('/'), asin)
}

/// Search results URL for a query and page (1-based).
pub fn search_url(base: &str, query: &str, page: u32) -> String {
    format!("{}/s?k={}&page={}", base.trim_end_matches('/'), urlencoding::encode(query), page)
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let code = match self {
            Region::Us => "us",
            Region::Uk => "uk",
            Region::Ca => "ca",
            Region::Au => "au",
            Region::In => "in",
            Region::Sg => "sg",
            Region::Ae => "ae",
        };
        write!(f, "{}", code)
    }
}

impl FromStr for Region {
    type Err = RegionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "us" | "usa" | "united states" => Ok(Region::Us),
            "uk" | "gb" | "united kingdom" => Ok(Region::Uk),
            "ca" | "canada" => Ok(Region::Ca),
            "au" | "australia" => Ok(Region::Au),
            "in" | "india" => Ok(Region::In),
            "sg" | "singapore" => Ok(Region::Sg),
            "ae" | "uae" | "united arab emirates" => Ok(Region::Ae),
            _ => Err(RegionParseError(s.to_string())),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RegionParseError(String);

impl fmt::Display for RegionParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Unknown region '{}'. Valid regions: us, uk, ca, au, in, sg, ae", self.0)
    }
}

impl std::error::Error for RegionParseError {}
