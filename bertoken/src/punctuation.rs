//! Splitting punctuation off of the words it's attached to.
//!
//! The input is assumed to be whitespace-tokenized already, so words are separated by exactly one
//! space.  Only a small, conservative set of punctuation characters is split off; everything else
//! stays fused to the word it appears in.
use serde::{Deserialize, Serialize};

/// The set of characters that [`split_on_punctuation`] isolates into their own tokens.
///
/// Serializes as a plain string holding every character in the set.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct PunctuationSet(Vec<char>);

impl PunctuationSet {
    /// Period, comma, apostrophe and double quote
    pub const BASIC: &'static [char] = &['.', ',', '\'', '"'];

    pub fn new(chars: impl IntoIterator<Item = char>) -> Self {
        let mut chars = chars.into_iter().collect::<Vec<_>>();
        chars.sort_unstable();
        chars.dedup();

        Self(chars)
    }

    pub fn contains(&self, ch: char) -> bool {
        self.0.binary_search(&ch).is_ok()
    }
}

impl Default for PunctuationSet {
    fn default() -> Self {
        Self::new(Self::BASIC.iter().copied())
    }
}

impl From<String> for PunctuationSet {
    fn from(chars: String) -> Self {
        Self::new(chars.chars())
    }
}

impl From<PunctuationSet> for String {
    fn from(set: PunctuationSet) -> Self {
        set.0.into_iter().collect()
    }
}

/// Split each space-delimited word of `text` so that every punctuation character becomes a token
/// of its own, while runs of other characters stay together.
///
/// The tokens are slices of `text`.  No token is ever empty, so a word that starts with
/// punctuation, or input that starts with it, yields the punctuation as the first token rather
/// than an empty one ahead of it.  Empty words (from consecutive spaces) produce nothing.
pub fn split_on_punctuation<'a>(text: &'a str, punctuation: &PunctuationSet) -> Vec<&'a str> {
    let mut tokens = Vec::with_capacity(text.len() / 4 + 1);

    for word in text.split(' ') {
        // Byte offset where the current run of non-punctuation characters began
        let mut run_start = None;

        for (index, ch) in word.char_indices() {
            if punctuation.contains(ch) {
                if let Some(start) = run_start.take() {
                    tokens.push(&word[start..index]);
                }
                tokens.push(&word[index..index + ch.len_utf8()]);
            } else if run_start.is_none() {
                run_start = Some(index);
            }
        }

        if let Some(start) = run_start {
            tokens.push(&word[start..]);
        }
    }

    tokens
}
