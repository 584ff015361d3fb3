//! Sequence-classifier strategy.
//!
//! The bundled model is an untrained stand-in that always scores both
//! classes equally, so it never reports a positive. Plug a real model in
//! through [`SequenceModel`].

use super::{OriginClassifier, WORD};
use crate::error::{Error, Result};
use tracing::trace;

/// Index of the "made in China" class in the model output.
const POSITIVE: usize = 1;

/// Maps text to a bounded sequence of vocabulary ids.
#[derive(Debug, Clone)]
pub struct HashingTokenizer {
    vocab_size: u32,
    max_len: usize,
}

impl Default for HashingTokenizer {
    fn default() -> Self {
        Self { vocab_size: 30_522, max_len: 512 }
    }
}

impl HashingTokenizer {
    /// Reserved id for the leading classification token.
    pub const CLS: u32 = 0;

    pub fn new(vocab_size: u32, max_len: usize) -> Self {
        Self { vocab_size: vocab_size.max(2), max_len: max_len.max(1) }
    }

    /// Lower-cases, splits into words and hashes each into the vocabulary.
    ///
    /// Output starts with [`Self::CLS`] and is truncated to `max_len` ids.
    pub fn encode(&self, text: &str) -> Vec<u32> {
        std::iter::once(Self::CLS)
            .chain(WORD.find_iter(text).map(|m| self.token_id(&m.as_str().to_lowercase())))
            .take(self.max_len)
            .collect()
    }

    fn token_id(&self, word: &str) -> u32 {
        // FNV-1a; ids start at 1 so none collide with CLS
        let hash = word.bytes().fold(0x811c_9dc5u32, |h, b| (h ^ b as u32).wrapping_mul(0x0100_0193));
        1 + hash % (self.vocab_size - 1)
    }
}

/// Binary sequence classifier producing one logit per class.
pub trait SequenceModel: Send + Sync {
    fn logits(&self, input_ids: &[u32]) -> Result<[f32; 2]>;
}

/// Model that ignores its input.
#[derive(Debug, Clone, Default)]
pub struct ConstantModel {
    pub logits: [f32; 2],
}

impl SequenceModel for ConstantModel {
    fn logits(&self, _input_ids: &[u32]) -> Result<[f32; 2]> {
        Ok(self.logits)
    }
}

/// Class with the highest logit; ties resolve to class 0.
fn argmax(logits: &[f32; 2]) -> usize {
    if logits[1] > logits[0] {
        1
    } else {
        0
    }
}

pub struct ModelClassifier {
    tokenizer: HashingTokenizer,
    model: Box<dyn SequenceModel>,
}

impl ModelClassifier {
    pub fn new(tokenizer: HashingTokenizer, model: Box<dyn SequenceModel>) -> Self {
        Self { tokenizer, model }
    }

    /// Default tokenizer with the constant untrained model.
    pub fn placeholder() -> Self {
        Self::new(HashingTokenizer::default(), Box::new(ConstantModel::default()))
    }
}

impl OriginClassifier for ModelClassifier {
    fn classify(&self, text: &str) -> Result<bool> {
        let ids = self.tokenizer.encode(text);
        let logits = self.model.logits(&ids)?;
        trace!("{} tokens -> logits {:?}", ids.len(), logits);

        if logits.iter().any(|l| !l.is_finite()) {
            return Err(Error::Classifier(format!("non-finite logits {:?}", logits)));
        }
        Ok(argmax(&logits) == POSITIVE)
    }
}
