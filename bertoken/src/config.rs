//! Tokenizer configuration, loadable from a JSON file.
//!
//! Every field has a default, so a config file only needs to name the settings it changes:
//!
//! ```json
//! { "sequence": { "max_len": 128, "truncation": "keep-last" } }
//! ```
use crate::error::*;
use crate::{PunctuationSet, Result, SequenceConfig, SpecialTokens};
use serde::{Deserialize, Serialize};
use snafu::ResultExt;
use std::path::Path;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TokenizerConfig {
    pub sequence: SequenceConfig,

    /// Characters split off into tokens of their own
    pub punctuation: PunctuationSet,

    /// Words longer than this many characters are unknown without attempting to segment them.
    ///
    /// There's no limit by default, so every word is segmented in full.  BERT's Python tokenizer
    /// uses 100.
    pub max_input_chars_per_word: Option<usize>,

    pub special_tokens: SpecialTokens,

    /// Whether the text given to the tokenizer is already lowercase.
    ///
    /// The tokenizer never changes case itself.  Setting this to `false` only logs a warning that
    /// the vocabulary expects lowercase input.
    pub assume_lowercase: bool,
}

impl Default for TokenizerConfig {
    fn default() -> Self {
        Self {
            sequence: SequenceConfig::default(),
            punctuation: PunctuationSet::default(),
            max_input_chars_per_word: None,
            special_tokens: SpecialTokens::default(),
            assume_lowercase: true,
        }
    }
}

impl TokenizerConfig {
    /// Read a config from a JSON file.  Fields missing from the file take their default values.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        let text = std::fs::read_to_string(path).with_context(|_| FileIoSnafu {
            path: path.to_path_buf(),
        })?;
        let config: Self = serde_json::from_str(&text).with_context(|_| ConfigParseSnafu {
            path: path.to_path_buf(),
        })?;
        config.validate()?;

        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.sequence.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{BertokenError, TruncationStrategy};
    use assert_matches::assert_matches;
    use std::io::Write;

    fn write_config(json: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(json.as_bytes()).unwrap();
        file
    }

    #[test]
    fn defaults() {
        let config = TokenizerConfig::default();

        assert_eq!(256, config.sequence.max_len);
        assert_eq!(TruncationStrategy::KeepFirst, config.sequence.truncation);
        assert_eq!(None, config.max_input_chars_per_word);
        assert_eq!("[UNK]", config.special_tokens.unk);
        assert!(config.punctuation.contains('\''));
        assert!(config.assume_lowercase);
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let file = write_config(
            r#"{
                "sequence": { "truncation": "keep-last" },
                "punctuation": ".,!?",
                "max_input_chars_per_word": 100,
                "special_tokens": { "unk": "<unk>" }
            }"#,
        );

        let config = TokenizerConfig::from_json_file(file.path()).unwrap();

        assert_eq!(256, config.sequence.max_len);
        assert_eq!(TruncationStrategy::KeepLast, config.sequence.truncation);
        assert!(config.punctuation.contains('!'));
        assert!(!config.punctuation.contains('"'));
        assert_eq!(Some(100), config.max_input_chars_per_word);
        assert_eq!("<unk>", config.special_tokens.unk);
        assert_eq!("[CLS]", config.special_tokens.cls);
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let file = write_config(r#"{ "max_length": 128 }"#);

        assert_matches!(
            TokenizerConfig::from_json_file(file.path()),
            Err(BertokenError::ConfigParse { .. })
        );
    }

    #[test]
    fn too_short_sequence_is_rejected() {
        let file = write_config(r#"{ "sequence": { "max_len": 1 } }"#);

        assert_matches!(
            TokenizerConfig::from_json_file(file.path()),
            Err(BertokenError::InvalidMaxLen { max_len: 1 })
        );
    }

    #[test]
    fn missing_file() {
        assert_matches!(
            TokenizerConfig::from_json_file("/this/path/does/not/exist.json"),
            Err(BertokenError::FileIo { .. })
        );
    }
}
