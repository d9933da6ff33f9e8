use crate::TokenInt;
use snafu::Snafu;
use std::path::PathBuf;

/// Error type that external inference engines report their failures with.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum BertokenError {
    #[snafu(display("File I/O error on file '{}'", path.display()))]
    FileIo {
        path: PathBuf,
        source: std::io::Error,
    },

    #[snafu(display("Vocabulary line {line} does not contain a token"))]
    MalformedLine { line: usize },

    #[snafu(display(
        "Vocabulary token '{token}' on line {line} was already defined on line {first_line}"
    ))]
    DuplicateToken {
        token: String,
        line: usize,
        first_line: usize,
    },

    #[snafu(display("Vocabulary is missing the reserved token '{token}'"))]
    MissingSpecialToken { token: String },

    #[snafu(display("Vocabulary doesn't contain any tokens"))]
    EmptyVocabulary,

    #[snafu(display(
        "{content_len} content tokens plus the start and end tokens don't fit in the maximum sequence length {max_len}"
    ))]
    SequenceOverflow { content_len: usize, max_len: usize },

    #[snafu(display("Maximum sequence length {max_len} is too short to hold the start and end tokens"))]
    InvalidMaxLen { max_len: usize },

    #[snafu(display("Classification threshold {threshold} is not a probability between 0 and 1"))]
    InvalidThreshold { threshold: f32 },

    #[snafu(display("Invalid tokenizer config file '{}'", path.display()))]
    ConfigParse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[snafu(display("Token id {id} isn't part of the vocabulary"))]
    UnknownTokenId { id: TokenInt },

    #[snafu(display("Inference engine failed to score the sequence"))]
    Inference { source: BoxError },
}
