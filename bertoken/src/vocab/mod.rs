//! The WordPiece vocabulary: a fixed list of subword strings, where each string's position in the
//! list is its token id.
use crate::error::*;
use crate::{Result, TokenInt};
use serde::{Deserialize, Serialize};
use snafu::{ensure, OptionExt, ResultExt};
use std::path::Path;
use tracing::*;

mod hash;

use hash::{TokenDecoder, TokenEncoder};

/// The strings of the four tokens with a structural role in every sequence.
///
/// Each of them must appear somewhere in the vocabulary.  The defaults are the names used by all
/// BERT-family vocabularies.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SpecialTokens {
    /// Fills the positions after the end of the sequence
    pub pad: String,

    /// Start of every sequence
    pub cls: String,

    /// End of every sequence
    pub sep: String,

    /// Stands in for a whole word that can't be segmented into known subwords
    pub unk: String,
}

impl Default for SpecialTokens {
    fn default() -> Self {
        Self {
            pad: "[PAD]".to_string(),
            cls: "[CLS]".to_string(),
            sep: "[SEP]".to_string(),
            unk: "[UNK]".to_string(),
        }
    }
}

/// The ids the [`SpecialTokens`] resolved to in a particular vocabulary.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct SpecialTokenIds {
    pub pad: TokenInt,
    pub cls: TokenInt,
    pub sep: TokenInt,
    pub unk: TokenInt,
}

/// An immutable, bidirectional mapping between subword strings and dense integer ids.
///
/// A vocabulary is built once and never modified afterwards, so a single instance (usually behind
/// an `Arc`) can be read from any number of threads at once.
#[derive(Clone, Debug)]
pub struct Vocabulary {
    encode: TokenEncoder,
    decode: TokenDecoder,
    special: SpecialTokenIds,
}

impl Vocabulary {
    /// Load a vocabulary file: UTF-8 text with one token per line, where the 0-based line number
    /// is the token's id.
    pub fn load(path: impl AsRef<Path>, special_tokens: &SpecialTokens) -> Result<Self> {
        let path = path.as_ref();

        let text = std::fs::read_to_string(path).with_context(|_| FileIoSnafu {
            path: path.to_path_buf(),
        })?;

        let vocab = Self::parse(&text, special_tokens)?;

        debug!(path = %path.display(),
            size = vocab.len(),
            pad = vocab.special.pad,
            cls = vocab.special.cls,
            sep = vocab.special.sep,
            unk = vocab.special.unk,
            "Loaded vocabulary");

        Ok(vocab)
    }

    /// Parse the contents of a vocabulary file.
    ///
    /// The token on each line is the first whitespace-delimited field; anything after it is
    /// ignored.  A line without any field is malformed, since skipping it would shift the ids of
    /// every token after it.
    pub fn parse(text: &str, special_tokens: &SpecialTokens) -> Result<Self> {
        let text = text.strip_prefix('\u{feff}').unwrap_or(text);

        let tokens = text
            .lines()
            .enumerate()
            .map(|(index, line)| {
                line.split_whitespace()
                    .next()
                    .context(MalformedLineSnafu { line: index + 1 })
            })
            .collect::<Result<Vec<_>>>()?;

        Self::from_tokens(tokens, special_tokens)
    }

    /// Build a vocabulary from a list of tokens given in id order.
    pub fn from_tokens<I, S>(tokens: I, special_tokens: &SpecialTokens) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let tokens = tokens.into_iter();
        let (capacity, _) = tokens.size_hint();
        let mut encode = TokenEncoder::with_capacity(capacity);
        let mut decode = TokenDecoder::with_capacity(capacity);

        for (id, token) in tokens.enumerate() {
            let token: String = token.into();
            ensure!(!token.is_empty(), MalformedLineSnafu { line: id + 1 });

            if let Err(first_id) = encode.try_insert(token.clone(), id) {
                return DuplicateTokenSnafu {
                    token,
                    line: id + 1,
                    first_line: first_id + 1,
                }
                .fail();
            }
            decode.push(token);
        }

        ensure!(!decode.is_empty(), EmptyVocabularySnafu);

        let resolve = |token: &str| {
            encode
                .token_for_str(token)
                .context(MissingSpecialTokenSnafu { token })
        };
        let special = SpecialTokenIds {
            pad: resolve(&special_tokens.pad)?,
            cls: resolve(&special_tokens.cls)?,
            sep: resolve(&special_tokens.sep)?,
            unk: resolve(&special_tokens.unk)?,
        };

        Ok(Self {
            encode,
            decode,
            special,
        })
    }

    /// The id of `token`, if it's in the vocabulary.
    pub fn lookup_id(&self, token: &str) -> Option<TokenInt> {
        self.encode.token_for_str(token)
    }

    /// The token string with the given id, if the id is in range.
    pub fn lookup_token(&self, id: TokenInt) -> Option<&str> {
        self.decode.str_for_token(id)
    }

    /// The vocabulary's own copy of `token`, if present.
    ///
    /// Unlike [`Self::lookup_id`] the result borrows from the vocabulary rather than from the
    /// caller's string, so it can outlive the scratch buffer the candidate was built in.
    pub fn get_key(&self, token: &str) -> Option<&str> {
        self.lookup_id(token)
            .and_then(|id| self.decode.str_for_token(id))
    }

    pub fn special_ids(&self) -> SpecialTokenIds {
        self.special
    }

    /// The string of the unknown-word token
    pub fn unk_token(&self) -> &str {
        self.decode
            .str_for_token(self.special.unk)
            .unwrap_or_default()
    }

    /// Number of tokens in the vocabulary.  Valid ids are `0..len()`.
    pub fn len(&self) -> usize {
        self.decode.len()
    }

    /// Always `false` for a successfully constructed vocabulary, which must at least hold the
    /// special tokens.
    pub fn is_empty(&self) -> bool {
        self.decode.is_empty()
    }

    /// All tokens with their ids, in id order
    pub fn tokens(&self) -> impl Iterator<Item = (TokenInt, &str)> {
        self.decode.iter().enumerate()
    }
}
