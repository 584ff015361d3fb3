//! Error taxonomy for scraping, caching and classification.

use std::path::PathBuf;

/// Errors surfaced by the library layers.
///
/// Field-level parse problems never show up here: the review parser absorbs
/// them into absent fields.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Network or HTTP failure while fetching a page.
    #[error("fetch failed: {0}")]
    Fetch(String),

    /// Amazon served a CAPTCHA or error page instead of content.
    #[error("request blocked: {0}")]
    Blocked(String),

    /// Browser failed to launch, navigate or evaluate.
    #[error("browser error: {0}")]
    Browser(String),

    /// A cache file exists but does not hold valid JSON for its type.
    #[error("corrupt cache file {}: {source}", path.display())]
    CacheCorrupt { path: PathBuf, source: serde_json::Error },

    #[error("invalid ASIN '{0}': expected 10 alphanumeric characters")]
    InvalidAsin(String),

    #[error("classifier error: {0}")]
    Classifier(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Whether retrying the same request could plausibly succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::Fetch(_) | Error::Browser(_))
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
