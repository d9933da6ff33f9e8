use snafu::OptionExt;
use std::path::Path;
use std::sync::Arc;
use tracing::*;

mod classifier;
mod config;
mod error;
mod postprocess;
mod punctuation;
mod sequence;
mod token;
mod vocab;
mod wordpiece;

pub use classifier::*;
pub use config::*;
pub use error::*;
pub use postprocess::*;
pub use punctuation::*;
pub use sequence::*;
pub use token::*;
pub use vocab::*;
pub use wordpiece::*;

pub type Result<T> = std::result::Result<T, BertokenError>;

/// Prepares text for a BERT-family classifier.
///
/// Text goes through three stages: punctuation is split off of words, each word is segmented into
/// WordPiece subwords from the vocabulary, and the subwords' ids are laid out in a fixed-length
/// array between the start and end tokens, together with the matching attention mask.
///
/// The input must already be normalized the way the vocabulary expects: lowercase, without
/// accents, with words separated by single spaces.  The tokenizer doesn't do any of that itself.
///
/// Instances of `Tokenizer` are cheap to clone, since the vocabulary is shared rather than copied.
/// They are also thread safe; a single instance can tokenize text on many threads at once.
#[derive(Clone, Debug)]
pub struct Tokenizer {
    vocab: Arc<Vocabulary>,
    config: Arc<TokenizerConfig>,
}

impl Tokenizer {
    pub fn new(vocab: Arc<Vocabulary>, config: TokenizerConfig) -> Result<Self> {
        config.validate()?;

        if !config.assume_lowercase {
            // Capitalized words will come out unknown or oddly segmented
            warn!("Tokenizer input is not assumed to be lowercase, but it will not be lowercased");
        }

        Ok(Self {
            vocab,
            config: Arc::new(config),
        })
    }

    /// Load the vocabulary from a file and create a tokenizer that uses it.
    pub fn from_vocab_file(path: impl AsRef<Path>, config: TokenizerConfig) -> Result<Self> {
        let vocab = Vocabulary::load(path, &config.special_tokens)?;

        Self::new(Arc::new(vocab), config)
    }

    pub fn vocab(&self) -> &Arc<Vocabulary> {
        &self.vocab
    }

    pub fn config(&self) -> &TokenizerConfig {
        &self.config
    }

    /// Split and segment `text` into WordPiece tokens, without the special tokens and without
    /// any length limit.
    pub fn tokenize(&self, text: &str) -> Vec<&str> {
        let words = split_on_punctuation(text, &self.config.punctuation);
        trace!(words = %join_stream(&words), "Split on punctuation");

        let subwords = segment(&words, &self.vocab, self.config.max_input_chars_per_word);
        trace!(subwords = %join_stream(&subwords), "WordPiece tokenized");

        subwords
    }

    /// The WordPiece tokens of `text` as a single space-separated string.
    ///
    /// Handy for eyeballing what the model will actually see.
    pub fn process_text(&self, text: &str) -> String {
        join_stream(&self.tokenize(text))
    }

    /// Tokenize `text` into the fixed-length token id and attention mask arrays.
    pub fn encode(&self, text: &str) -> Result<EncodedSequence> {
        let tokens = self.tokenize(text);
        let encoded = assemble(&tokens, &self.vocab, &self.config.sequence)?;

        trace!(input_ids = ?encoded.input_ids, attention_mask = ?encoded.attention_mask, "Encoded");

        Ok(encoded)
    }

    /// Encode several texts.  Fails on the first text that can't be encoded.
    pub fn encode_batch<I, S>(&self, texts: I) -> Result<Vec<EncodedSequence>>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        texts
            .into_iter()
            .map(|text| self.encode(text.as_ref()))
            .collect()
    }

    /// Map token ids back to their strings.
    pub fn decode(&self, ids: &[TokenInt]) -> Result<Vec<&str>> {
        ids.iter()
            .map(|&id| {
                self.vocab
                    .lookup_token(id)
                    .context(UnknownTokenIdSnafu { id })
            })
            .collect()
    }
}

#[cfg(test)]
pub mod test_helpers {
    use super::*;
    use std::sync::OnceLock;
    use tracing_subscriber::{fmt::format::FmtSpan, EnvFilter};

    static TRACING: OnceLock<()> = OnceLock::new();

    /// Initialize tracing for tests with a stdout subscriber.
    /// Safe to call multiple times - will only initialize once.
    pub fn init_test_logging() {
        TRACING.get_or_init(|| {
            let filter = std::env::var("RUST_LOG")
                .map(EnvFilter::new)
                .unwrap_or_else(|_| EnvFilter::new("trace"));

            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_span_events(FmtSpan::CLOSE)
                .with_test_writer()
                .try_init()
                .ok();
        });
    }

    /// The small vocabulary used throughout the tests, with the given sequence length
    pub fn scenario_tokenizer(max_len: usize) -> Tokenizer {
        let vocab = Vocabulary::from_tokens(
            ["[PAD]", "[CLS]", "[SEP]", "[UNK]", "un", "##able", "happy", "."],
            &SpecialTokens::default(),
        )
        .unwrap();

        let config = TokenizerConfig {
            sequence: SequenceConfig {
                max_len,
                ..Default::default()
            },
            ..Default::default()
        };

        Tokenizer::new(Arc::new(vocab), config).unwrap()
    }
}
