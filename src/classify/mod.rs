//! "Made in China" detection over product descriptions and review text.

pub mod lexical;
pub mod model;

use crate::amazon::models::ProductRecord;
use crate::config::{ClassifierKind, Config};
use crate::error::Result;
use regex_lite::Regex;
use std::sync::LazyLock;
use tracing::debug;

pub use lexical::{GazetteerRecognizer, LexicalClassifier};
pub use model::ModelClassifier;

/// Word tokens, keeping hyphenated compounds and possessives whole.
pub(crate) static WORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[A-Za-z0-9]+(?:['’\-][A-Za-z0-9]+)*").unwrap());

/// Decides whether a piece of text points at Chinese origin.
pub trait OriginClassifier: Send + Sync {
    fn classify(&self, text: &str) -> Result<bool>;
}

/// Applies one strategy across a whole product record.
pub struct ProductClassifier {
    inner: Box<dyn OriginClassifier>,
}

impl ProductClassifier {
    pub fn new(inner: Box<dyn OriginClassifier>) -> Self {
        Self { inner }
    }

    /// Builds the configured strategy. Done once per run.
    pub fn from_config(config: &Config) -> Self {
        let inner: Box<dyn OriginClassifier> = match config.classifier {
            ClassifierKind::Lexical => Box::new(LexicalClassifier::new(
                Box::new(GazetteerRecognizer::default()),
                config.chunk_size,
            )),
            ClassifierKind::Model => Box::new(ModelClassifier::placeholder()),
        };
        Self::new(inner)
    }

    /// Checks the description, then each review body in order.
    ///
    /// Stops at the first positive; reviews without a body are skipped.
    pub fn classify_record(&self, record: &ProductRecord) -> Result<bool> {
        if self.inner.classify(&record.product_info.text)? {
            debug!("Origin matched in product description");
            return Ok(true);
        }

        for (i, review) in record.reviews.iter().enumerate() {
            let Some(body) = review.body.as_deref() else {
                continue;
            };
            if self.inner.classify(body)? {
                debug!("Origin matched in review {}", i + 1);
                return Ok(true);
            }
        }

        Ok(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::amazon::models::{ProductInfo, Review};
    use crate::error::Error;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::{Arc, Mutex};

    /// Flags texts containing a marker and records what it was shown.
    struct RecordingClassifier {
        marker: &'static str,
        seen: Arc<Mutex<Vec<String>>>,
        calls: Arc<AtomicU32>,
    }

    impl OriginClassifier for RecordingClassifier {
        fn classify(&self, text: &str) -> Result<bool> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.seen.lock().unwrap().push(text.to_string());
            Ok(text.contains(self.marker))
        }
    }

    fn make_record(description: &str, bodies: &[Option<&str>]) -> ProductRecord {
        ProductRecord {
            product_info: ProductInfo {
                url: "https://www.amazon.com/dp/B07VFHFBLL".to_string(),
                text: description.to_string(),
            },
            reviews: bodies
                .iter()
                .map(|b| Review { body: b.map(str::to_string), ..Review::default() })
                .collect(),
        }
    }

    fn recording(marker: &'static str) -> (ProductClassifier, Arc<Mutex<Vec<String>>>, Arc<AtomicU32>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let calls = Arc::new(AtomicU32::new(0));
        let classifier = ProductClassifier::new(Box::new(RecordingClassifier {
            marker,
            seen: seen.clone(),
            calls: calls.clone(),
        }));
        (classifier, seen, calls)
    }

    #[test]
    fn test_description_match_skips_reviews() {
        let (classifier, _, calls) = recording("HIT");
        let record = make_record("HIT in description", &[Some("r1"), Some("r2")]);

        assert!(classifier.classify_record(&record).unwrap());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_reviews_checked_in_order_until_match() {
        let (classifier, seen, calls) = recording("HIT");
        let record = make_record("plain", &[Some("r1"), None, Some("r2 HIT"), Some("r3")]);

        assert!(classifier.classify_record(&record).unwrap());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(*seen.lock().unwrap(), vec!["plain", "r1", "r2 HIT"]);
    }

    #[test]
    fn test_no_match_checks_everything() {
        let (classifier, _, calls) = recording("HIT");
        let record = make_record("plain", &[Some("r1"), Some("r2")]);

        assert!(!classifier.classify_record(&record).unwrap());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_classifier_error_propagates() {
        struct Failing;
        impl OriginClassifier for Failing {
            fn classify(&self, _text: &str) -> Result<bool> {
                Err(Error::Classifier("model unavailable".to_string()))
            }
        }

        let classifier = ProductClassifier::new(Box::new(Failing));
        let err = classifier.classify_record(&make_record("x", &[])).unwrap_err();
        assert!(matches!(err, Error::Classifier(_)));
    }

    #[test]
    fn test_from_config_picks_strategy() {
        let record = make_record("Made in China", &[]);

        let lexical = ProductClassifier::from_config(&Config::default());
        assert!(lexical.classify_record(&record).unwrap());

        // The untrained model never reports a positive
        let config = Config { classifier: ClassifierKind::Model, ..Config::default() };
        assert!(!ProductClassifier::from_config(&config).classify_record(&record).unwrap());
    }

    #[test]
    fn test_word_tokens() {
        let words: Vec<&str> =
            WORD.find_iter("China-made, it's China's best!").map(|m| m.as_str()).collect();
        assert_eq!(words, vec!["China-made", "it's", "China's", "best"]);
    }
}
