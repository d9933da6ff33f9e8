//! Assembly of segmented tokens into the fixed-length arrays a BERT-family classifier consumes.
use crate::error::*;
use crate::{Result, TokenInt, Vocabulary};
use serde::{Deserialize, Serialize};
use snafu::ensure;
use strum::{EnumIter, EnumString};
use tracing::*;

/// Sequence length used when none is configured
pub const DEFAULT_MAX_LEN: usize = 256;

/// The start and end tokens always occupy two positions of every sequence
pub const SPECIAL_TOKEN_COUNT: usize = 2;

/// What to do when a text has more content tokens than fit between the start and end tokens.
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    Eq,
    PartialEq,
    EnumString,
    EnumIter,
    strum::Display,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum TruncationStrategy {
    /// Keep the beginning of the text and drop the tokens that don't fit at the end
    #[default]
    KeepFirst,

    /// Keep the end of the text and drop the tokens that don't fit at the beginning
    KeepLast,

    /// Fail with [`BertokenError::SequenceOverflow`] instead of truncating
    Error,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SequenceConfig {
    /// Length of both output arrays, including the start and end tokens
    pub max_len: usize,

    pub truncation: TruncationStrategy,
}

impl Default for SequenceConfig {
    fn default() -> Self {
        Self {
            max_len: DEFAULT_MAX_LEN,
            truncation: TruncationStrategy::default(),
        }
    }
}

impl SequenceConfig {
    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.max_len >= SPECIAL_TOKEN_COUNT,
            InvalidMaxLenSnafu {
                max_len: self.max_len
            }
        );

        Ok(())
    }

    /// How many content tokens fit between the start and end tokens
    pub fn content_capacity(&self) -> usize {
        self.max_len.saturating_sub(SPECIAL_TOKEN_COUNT)
    }
}

/// The token ids and attention mask for one text, ready to be passed to the classifier.
///
/// Both arrays always have exactly the configured maximum length.  The first `num_tokens`
/// positions hold the start token, the content tokens and the end token, with a mask of 1; every
/// later position holds the pad token with a mask of 0.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct EncodedSequence {
    pub input_ids: Vec<TokenInt>,

    pub attention_mask: Vec<u8>,

    /// Number of positions holding real tokens, i.e. the number of 1s in the mask
    pub num_tokens: usize,

    /// Number of content tokens dropped to make the sequence fit
    pub truncated: usize,
}

impl EncodedSequence {
    /// Length of the arrays, regardless of how many positions are padding
    pub fn max_len(&self) -> usize {
        self.input_ids.len()
    }

    /// The ids between the start and end tokens
    pub fn content_ids(&self) -> &[TokenInt] {
        &self.input_ids[1..self.num_tokens - 1]
    }
}

/// Build the fixed-length id and mask arrays from a stream of segmented tokens.
///
/// Content that doesn't fit in `max_len - 2` positions is handled according to
/// `config.truncation`; the start and end tokens are never truncated.
pub fn assemble(
    tokens: &[&str],
    vocab: &Vocabulary,
    config: &SequenceConfig,
) -> Result<EncodedSequence> {
    config.validate()?;

    let capacity = config.content_capacity();
    let (content, truncated) = if tokens.len() <= capacity {
        (tokens, 0)
    } else {
        let excess = tokens.len() - capacity;
        match config.truncation {
            TruncationStrategy::KeepFirst => (&tokens[..capacity], excess),
            TruncationStrategy::KeepLast => (&tokens[excess..], excess),
            TruncationStrategy::Error => {
                return SequenceOverflowSnafu {
                    content_len: tokens.len(),
                    max_len: config.max_len,
                }
                .fail()
            }
        }
    };

    if truncated > 0 {
        debug!(
            content_len = tokens.len(),
            max_len = config.max_len,
            truncated,
            strategy = %config.truncation,
            "Truncated content tokens to fit the sequence"
        );
    }

    let special = vocab.special_ids();
    let mut input_ids = vec![special.pad; config.max_len];
    let mut attention_mask = vec![0u8; config.max_len];

    input_ids[0] = special.cls;
    attention_mask[0] = 1;

    for ((slot, mask), token) in input_ids[1..]
        .iter_mut()
        .zip(attention_mask[1..].iter_mut())
        .zip(content)
    {
        // The segmenter only emits vocabulary entries, so the fallback is never hit with its
        // output.  It keeps unmapped ids out of the array for any other caller.
        *slot = vocab.lookup_id(token).unwrap_or(special.unk);
        *mask = 1;
    }

    let end = content.len() + 1;
    input_ids[end] = special.sep;
    attention_mask[end] = 1;

    Ok(EncodedSequence {
        input_ids,
        attention_mask,
        num_tokens: end + 1,
        truncated,
    })
}
