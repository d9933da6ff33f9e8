//! Greedy longest-match-first WordPiece segmentation.
//!
//! This must agree exactly with the segmentation the model was trained with.  See
//! <https://github.com/google-research/bert/blob/master/tokenization.py> for the reference
//! implementation.
use crate::Vocabulary;
use tracing::*;

/// Marks a subword that continues the word started by the previous subword.
pub const CONTINUATION_PREFIX: &str = "##";

/// Break a single word into subwords from `vocab`.
///
/// At each position the longest substring present in the vocabulary is taken, with every subword
/// after the first carrying the [`CONTINUATION_PREFIX`].  If at some position not even a single
/// character matches, the word as a whole can't be segmented and `None` is returned; the subwords
/// matched up to that point are discarded rather than returned as a partial result.
///
/// The returned subwords borrow from `vocab`.
pub fn segment_word<'v>(word: &str, vocab: &'v Vocabulary) -> Option<Vec<&'v str>> {
    // Byte offset of every character boundary, including the end of the word, so the cursors
    // below move by characters rather than bytes
    let mut boundaries = word.char_indices().map(|(index, _)| index).collect::<Vec<_>>();
    boundaries.push(word.len());
    let num_chars = boundaries.len() - 1;

    let mut subwords = Vec::new();
    let mut candidate = String::with_capacity(CONTINUATION_PREFIX.len() + word.len());
    let mut start = 0;

    while start < num_chars {
        let mut end = num_chars;
        let mut found = None;

        while start < end {
            candidate.clear();
            if start > 0 {
                candidate.push_str(CONTINUATION_PREFIX);
            }
            candidate.push_str(&word[boundaries[start]..boundaries[end]]);

            if let Some(subword) = vocab.get_key(&candidate) {
                found = Some(subword);
                break;
            }
            end -= 1;
        }

        subwords.push(found?);
        start = end;
    }

    Some(subwords)
}

/// Segment every word of a punctuation-split stream.
///
/// Words that can't be segmented are replaced by the vocabulary's unknown token.  That's ordinary
/// output, not an error.  With a `max_input_chars_per_word` limit, words longer than that many
/// characters are also unknown, without any attempt to segment them.
pub fn segment<'v>(
    words: &[&str],
    vocab: &'v Vocabulary,
    max_input_chars_per_word: Option<usize>,
) -> Vec<&'v str> {
    let mut subwords = Vec::with_capacity(words.len());
    let mut unknown_words = 0usize;

    for word in words {
        let too_long = max_input_chars_per_word.map_or(false, |max| word.chars().count() > max);
        let pieces = if too_long {
            None
        } else {
            segment_word(word, vocab)
        };

        match pieces {
            Some(pieces) => subwords.extend(pieces),
            None => {
                unknown_words += 1;
                subwords.push(vocab.unk_token());
            }
        }
    }

    trace!(
        words = words.len(),
        subwords = subwords.len(),
        unknown_words,
        "Segmented words into subwords"
    );

    subwords
}
