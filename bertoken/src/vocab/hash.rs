//! The lookup tables behind [`super::Vocabulary`].
//!
//! Segmenting a word probes the token-to-id table once per candidate substring, so the choice of
//! hash function matters more here than anywhere else.  It's isolated to this module to make it
//! easy to experiment with other impls.
use crate::TokenInt;

pub use rustc_hash::FxHashMap as HashMap;

/// Maps token strings to their integer ids.
#[derive(Clone, Debug, Default)]
pub(crate) struct TokenEncoder(HashMap<String, TokenInt>);

/// The reverse mapping, from integer id to token string.
///
/// Ids are dense and start at zero, so this is just a vector indexed by id.
#[derive(Clone, Debug, Default)]
pub(crate) struct TokenDecoder(Vec<String>);

impl TokenEncoder {
    pub fn with_capacity(capacity: usize) -> Self {
        Self(HashMap::with_capacity_and_hasher(capacity, Default::default()))
    }

    /// Add a token.  If the token is already present the table is left untouched and the id it
    /// was first assigned is returned as the error.
    pub fn try_insert(&mut self, token: String, id: TokenInt) -> Result<(), TokenInt> {
        use std::collections::hash_map::Entry;

        match self.0.entry(token) {
            Entry::Occupied(entry) => Err(*entry.get()),
            Entry::Vacant(entry) => {
                entry.insert(id);
                Ok(())
            }
        }
    }

    pub fn token_for_str(&self, token: &str) -> Option<TokenInt> {
        self.0.get(token).copied()
    }
}

impl TokenDecoder {
    pub fn with_capacity(capacity: usize) -> Self {
        Self(Vec::with_capacity(capacity))
    }

    pub fn push(&mut self, token: String) {
        self.0.push(token)
    }

    pub fn str_for_token(&self, id: TokenInt) -> Option<&str> {
        self.0.get(id).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}
