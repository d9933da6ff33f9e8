//! The full text classification pipeline: tokenize, score with an external model, threshold.
//!
//! Running the model itself is left to an [`InferenceEngine`] implementation, so this crate has no
//! opinion about which ML runtime is used.
use crate::error::*;
use crate::postprocess::{threshold_softmax, validate_threshold, Prediction};
use crate::{Result, TokenInt, Tokenizer};
use snafu::ResultExt;
use tracing::*;

/// A trained classification model, seen only as a function from a tokenized sequence to one raw
/// score per class.
///
/// Both slices always have the tokenizer's configured maximum length.  Any closure with the same
/// signature is also an engine, which is convenient for tests and for thin wrappers around an ML
/// runtime.
pub trait InferenceEngine: Send + Sync {
    fn infer(
        &self,
        input_ids: &[TokenInt],
        attention_mask: &[u8],
    ) -> std::result::Result<Vec<f32>, BoxError>;
}

impl<F> InferenceEngine for F
where
    F: Fn(&[TokenInt], &[u8]) -> std::result::Result<Vec<f32>, BoxError> + Send + Sync,
{
    fn infer(
        &self,
        input_ids: &[TokenInt],
        attention_mask: &[u8],
    ) -> std::result::Result<Vec<f32>, BoxError> {
        self(input_ids, attention_mask)
    }
}

pub struct Classifier<E> {
    tokenizer: Tokenizer,
    engine: E,
    threshold: f32,
}

impl<E: InferenceEngine> Classifier<E> {
    /// Create a classifier that reports a class only when its probability is above `threshold`.
    pub fn new(tokenizer: Tokenizer, engine: E, threshold: f32) -> Result<Self> {
        validate_threshold(threshold)?;

        Ok(Self {
            tokenizer,
            engine,
            threshold,
        })
    }

    /// Classify a single text.
    ///
    /// A text the model isn't confident about is not an error; it yields a [`Prediction`] with no
    /// class.
    pub fn classify(&self, text: &str) -> Result<Prediction> {
        let encoded = self.tokenizer.encode(text)?;

        let scores = self
            .engine
            .infer(&encoded.input_ids, &encoded.attention_mask)
            .context(InferenceSnafu)?;

        let prediction = threshold_softmax(&scores, self.threshold);
        debug!(
            num_tokens = encoded.num_tokens,
            num_classes = scores.len(),
            class = ?prediction.class,
            probability = prediction.probability,
            "Classified text"
        );

        Ok(prediction)
    }

    pub fn tokenizer(&self) -> &Tokenizer {
        &self.tokenizer
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }
}
