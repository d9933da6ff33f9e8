use anyhow::Context;
use bertoken::{
    threshold_softmax, validate_threshold, Tokenizer, TokenizerConfig, TruncationStrategy,
    DEFAULT_THRESHOLD,
};
use clap::{Args, Parser, Subcommand};
use futures::StreamExt;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::exit;
use tracing::*;
use tracing_subscriber::{filter::LevelFilter, EnvFilter, FmtSubscriber};

mod batch;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(flatten)]
    globals: Globals,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct Globals {
    /// Read tokenizer settings from a JSON config file
    ///
    /// Options given on the command line take precedence over the config file.
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Turn debugging information on
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    debug: u8,
}

#[derive(Args)]
struct VocabArgs {
    /// Vocabulary file with one token per line, in token id order
    #[arg(long, env = "BTK_VOCAB", value_name = "FILE")]
    vocab: PathBuf,
}

#[derive(Args)]
struct SequenceArgs {
    /// Length of the token id and attention mask arrays, including the start and end tokens
    #[arg(long)]
    max_len: Option<usize>,

    /// What to do with text that has more tokens than fit: keep-first, keep-last, or error
    #[arg(long)]
    truncation: Option<TruncationStrategy>,
}

#[derive(Subcommand)]
enum Commands {
    /// Encode text into token ids and an attention mask, printed as JSON
    Tokenize {
        #[command(flatten)]
        vocab: VocabArgs,

        #[command(flatten)]
        sequence: SequenceArgs,

        /// Lowercase, whitespace-tokenized text
        text: String,
    },

    /// Print the WordPiece tokens of the text, separated by spaces
    Segment {
        #[command(flatten)]
        vocab: VocabArgs,

        /// Lowercase, whitespace-tokenized text
        text: String,
    },

    /// Encode every line of one or more files, printing one JSON object per line
    Batch {
        #[command(flatten)]
        vocab: VocabArgs,

        #[command(flatten)]
        sequence: SequenceArgs,

        /// Maximum number of files to process at the same time
        #[arg(long, default_value_t = 4)]
        parallelism: usize,

        /// Files holding one text per line
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// Print the size of a vocabulary and the ids of its special tokens
    Vocab {
        #[command(flatten)]
        vocab: VocabArgs,
    },

    /// Apply softmax to raw class scores and print the most likely class, or -1 if no class is
    /// likely enough
    Threshold {
        /// Probability the most likely class must exceed
        #[arg(long, default_value_t = DEFAULT_THRESHOLD)]
        threshold: f32,

        /// One raw score per class, as output by the classifier
        #[arg(required = true, allow_negative_numbers = true)]
        scores: Vec<f32>,
    },
}

impl Commands {
    async fn execute(self, globals: &Globals) -> anyhow::Result<()> {
        use Commands::*;
        match self {
            Tokenize {
                vocab,
                sequence,
                text,
            } => {
                let tokenizer = load_tokenizer(globals, &vocab.vocab, Some(&sequence))?;
                let encoded = tokenizer.encode(&text)?;

                println!("{}", serde_json::to_string(&encoded)?);
            }
            Segment { vocab, text } => {
                let tokenizer = load_tokenizer(globals, &vocab.vocab, None)?;

                println!("{}", tokenizer.process_text(&text));
            }
            Batch {
                vocab,
                sequence,
                parallelism,
                files,
            } => {
                let tokenizer = load_tokenizer(globals, &vocab.vocab, Some(&sequence))?;
                let mut results = batch::tokenize_files_streaming(tokenizer, files, parallelism);

                let stdout = std::io::stdout();
                while let Some(result) = results.next().await {
                    let (path, encoded) = result?;
                    info!(path = %path.display(), lines = encoded.len(), "Tokenized file");

                    let mut stdout = stdout.lock();
                    for (index, sequence) in encoded.iter().enumerate() {
                        let line = serde_json::json!({
                            "path": path.display().to_string(),
                            "line": index + 1,
                            "input_ids": sequence.input_ids,
                            "attention_mask": sequence.attention_mask,
                            "truncated": sequence.truncated,
                        });
                        writeln!(stdout, "{line}")?;
                    }
                }
            }
            Vocab { vocab } => {
                let tokenizer = load_tokenizer(globals, &vocab.vocab, None)?;
                let special = tokenizer.vocab().special_ids();
                let names = &tokenizer.config().special_tokens;

                println!("Vocabulary size: {}", tokenizer.vocab().len());
                println!("  {}: {}", names.pad, special.pad);
                println!("  {}: {}", names.cls, special.cls);
                println!("  {}: {}", names.sep, special.sep);
                println!("  {}: {}", names.unk, special.unk);
            }
            Threshold { threshold, scores } => {
                validate_threshold(threshold)?;
                let prediction = threshold_softmax(&scores, threshold);
                debug!(probability = prediction.probability, "Thresholded scores");

                println!("{}", prediction.class_or_sentinel());
            }
        }

        Ok(())
    }
}

/// Build the tokenizer from the config file, if any, with command line options applied on top.
fn load_tokenizer(
    globals: &Globals,
    vocab: &Path,
    sequence: Option<&SequenceArgs>,
) -> anyhow::Result<Tokenizer> {
    let mut config = match globals.config.as_deref() {
        Some(path) => TokenizerConfig::from_json_file(path)?,
        None => TokenizerConfig::default(),
    };

    if let Some(sequence) = sequence {
        if let Some(max_len) = sequence.max_len {
            config.sequence.max_len = max_len;
        }
        if let Some(truncation) = sequence.truncation {
            config.sequence.truncation = truncation;
        }
    }

    Tokenizer::from_vocab_file(vocab, config)
        .with_context(|| format!("Error loading tokenizer with vocabulary '{}'", vocab.display()))
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let default_log_directive = match cli.globals.debug {
        0 => LevelFilter::WARN,
        1 => LevelFilter::INFO,
        2 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    };

    // Log events are JSON on stderr, so they never mix with the output on stdout
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(default_log_directive.into())
                .from_env_lossy(),
        )
        .json()
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("Failed to set subscriber");

    if let Some(config_path) = cli.globals.config.as_deref() {
        debug!("Value for config: {}", config_path.display());
    }

    if let Err(e) = cli.command.execute(&cli.globals).await {
        error!("{:#}", e);
        exit(1);
    } else {
        debug!("command executed successfully");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Verify that there aren't any invalid attributes in the CLI definition that can only be
    /// detected at runtime
    #[test]
    fn verify_cli() {
        use clap::CommandFactory;
        Cli::command().debug_assert()
    }

    #[test]
    fn parses_tokenize_options() {
        let cli = Cli::try_parse_from([
            "btk",
            "tokenize",
            "--vocab",
            "vocab.txt",
            "--max-len",
            "128",
            "--truncation",
            "keep-last",
            "hello world",
        ])
        .unwrap();

        match cli.command {
            Commands::Tokenize {
                vocab,
                sequence,
                text,
            } => {
                assert_eq!(Path::new("vocab.txt"), vocab.vocab);
                assert_eq!(Some(128), sequence.max_len);
                assert_eq!(Some(TruncationStrategy::KeepLast), sequence.truncation);
                assert_eq!("hello world", text);
            }
            _ => panic!("parsed the wrong command"),
        }
    }

    #[test]
    fn threshold_accepts_negative_scores() {
        let cli = Cli::try_parse_from(["btk", "threshold", "--threshold", "0.5", "-1.5", "2"])
            .unwrap();

        match cli.command {
            Commands::Threshold { threshold, scores } => {
                assert_eq!(0.5f32, threshold);
                assert_eq!(vec![-1.5f32, 2.0], scores);
            }
            _ => panic!("parsed the wrong command"),
        }
    }

    #[tokio::test]
    async fn threshold_outside_zero_to_one_is_rejected() {
        let globals = Globals {
            config: None,
            debug: 0,
        };
        let command = Commands::Threshold {
            threshold: 1.5,
            scores: vec![0.0, 8.0],
        };

        let err = command.execute(&globals).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<bertoken::BertokenError>(),
            Some(bertoken::BertokenError::InvalidThreshold { .. })
        ));
    }

    #[test]
    fn command_line_overrides_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let vocab = dir.path().join("vocab.txt");
        std::fs::write(&vocab, "[PAD]\n[CLS]\n[SEP]\n[UNK]\nhappy\n").unwrap();
        let config = dir.path().join("config.json");
        std::fs::write(
            &config,
            r#"{ "sequence": { "max_len": 16, "truncation": "error" } }"#,
        )
        .unwrap();

        let globals = Globals {
            config: Some(config),
            debug: 0,
        };
        let sequence = SequenceArgs {
            max_len: Some(4),
            truncation: None,
        };

        let tokenizer = load_tokenizer(&globals, &vocab, Some(&sequence)).unwrap();
        assert_eq!(4, tokenizer.config().sequence.max_len);
        assert_eq!(
            TruncationStrategy::Error,
            tokenizer.config().sequence.truncation
        );
        assert_eq!(vec![1, 4, 2, 0], tokenizer.encode("happy").unwrap().input_ids);
    }
}
