//! Entity-based origin detection.
//!
//! Text is cut into windows, each window is run through an entity
//! recognizer, and a product matches when any place or nationality entity
//! reads as one of [`ORIGIN_KEYWORDS`].

use super::{OriginClassifier, WORD};
use crate::error::Result;
use std::collections::HashMap;
use tracing::{debug, trace};

/// Lower-cased entity surface forms that count as Chinese origin.
pub const ORIGIN_KEYWORDS: [&str; 4] = ["china", "chinese", "china's", "china-made"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityLabel {
    /// Country, region or city.
    Place,
    /// Nationality or demonym.
    Nationality,
}

/// An entity as it appeared in the text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entity {
    pub text: String,
    pub label: EntityLabel,
}

/// Named-entity recognition over a bounded window of text.
pub trait EntityRecognizer: Send + Sync {
    fn entities(&self, text: &str) -> Result<Vec<Entity>>;
}

/// Dictionary recognizer for countries and nationalities.
///
/// A token is an entity when its base form is in the gazetteer and it is
/// capitalized, or it directly follows "in"/"from" ("made in china"). Curly
/// apostrophes read as straight ones. A possessive or compound that is itself
/// a keyword ("China's", "China-made") keeps its full form; any other
/// compound ("Chinese-made", "China-based") is reported as its leading word.
pub struct GazetteerRecognizer {
    entries: HashMap<String, EntityLabel>,
}

const PLACES: &[&str] = &[
    "china", "prc", "taiwan", "hongkong", "japan", "korea", "vietnam", "thailand", "malaysia",
    "indonesia", "india", "bangladesh", "cambodia", "philippines", "usa", "america", "canada",
    "mexico", "brazil", "uk", "britain", "england", "germany", "france", "italy", "spain",
    "turkey", "australia", "shenzhen", "guangzhou", "shanghai", "beijing",
];

const NATIONALITIES: &[&str] = &[
    "chinese", "taiwanese", "japanese", "korean", "vietnamese", "thai", "malaysian",
    "indonesian", "indian", "american", "canadian", "mexican", "brazilian", "british",
    "english", "german", "french", "italian", "spanish", "turkish", "australian",
];

/// Lowercase words after which a lowercase place name still counts.
const ORIGIN_PREPOSITIONS: &[&str] = &["in", "from"];

impl Default for GazetteerRecognizer {
    fn default() -> Self {
        let entries = PLACES
            .iter()
            .map(|p| (p.to_string(), EntityLabel::Place))
            .chain(NATIONALITIES.iter().map(|n| (n.to_string(), EntityLabel::Nationality)))
            .collect();
        Self { entries }
    }
}

impl GazetteerRecognizer {
    /// Resolves a token to an entity, trimming unlisted compounds to their base.
    fn lookup(&self, token: &str) -> Option<Entity> {
        let surface = normalize_apostrophes(token);
        let lower = surface.to_lowercase();

        if let Some(label) = self.entries.get(&lower) {
            return Some(Entity { text: surface, label: *label });
        }

        let base_len = surface.find(['\'', '-']).unwrap_or(surface.len());
        let label = *self.entries.get(&lower[..base_len])?;

        let text = if ORIGIN_KEYWORDS.contains(&lower.as_str()) {
            surface
        } else {
            surface[..base_len].to_string()
        };
        Some(Entity { text, label })
    }
}

impl EntityRecognizer for GazetteerRecognizer {
    fn entities(&self, text: &str) -> Result<Vec<Entity>> {
        let mut previous: Option<&str> = None;
        let mut entities = Vec::new();

        for token in WORD.find_iter(text).map(|m| m.as_str()) {
            let capitalized = token.chars().next().is_some_and(char::is_uppercase);
            let after_preposition = previous
                .is_some_and(|p| ORIGIN_PREPOSITIONS.iter().any(|w| p.eq_ignore_ascii_case(w)));

            if capitalized || after_preposition {
                entities.extend(self.lookup(token));
            }
            previous = Some(token);
        }
        Ok(entities)
    }
}

fn normalize_apostrophes(text: &str) -> String {
    text.replace('’', "'")
}

/// Splits `text` into windows of at most `size` characters.
///
/// A window is cut at its last whitespace so words stay whole, unless the
/// window holds a single unbroken run.
pub fn windows(text: &str, size: usize) -> impl Iterator<Item = &str> {
    let size = size.max(1);
    let mut rest = text.trim_start();

    std::iter::from_fn(move || {
        if rest.is_empty() {
            return None;
        }

        let window = match rest.char_indices().nth(size) {
            None => rest,
            Some((end, _)) => {
                let cut = rest[..end].rfind(char::is_whitespace).filter(|&i| i > 0).unwrap_or(end);
                &rest[..cut]
            }
        };

        rest = rest[window.len()..].trim_start();
        Some(window)
    })
}

/// Keyword match over recognized entities.
pub struct LexicalClassifier {
    recognizer: Box<dyn EntityRecognizer>,
    chunk_size: usize,
}

impl LexicalClassifier {
    pub fn new(recognizer: Box<dyn EntityRecognizer>, chunk_size: usize) -> Self {
        Self { recognizer, chunk_size }
    }
}

impl OriginClassifier for LexicalClassifier {
    fn classify(&self, text: &str) -> Result<bool> {
        for (i, window) in windows(text, self.chunk_size).enumerate() {
            let entities = self.recognizer.entities(window)?;
            trace!("Window {}: {} entities", i, entities.len());

            if let Some(hit) = entities.iter().find(|e| {
                let surface = normalize_apostrophes(&e.text).to_lowercase();
                ORIGIN_KEYWORDS.contains(&surface.as_str())
            }) {
                debug!("Matched origin entity '{}' ({:?})", hit.text, hit.label);
                return Ok(true);
            }
        }
        Ok(false)
    }
}
