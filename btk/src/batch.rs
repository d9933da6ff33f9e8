//! Tokenizing whole files of text, one text per line.
use anyhow::{Context, Result};
use bertoken::{EncodedSequence, Tokenizer};
use futures::{Stream, StreamExt};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::*;

/// Tokenize one or more files in parallel.
///
/// Up to `parallelism` files are processed at once.  The result is a `Stream` that yields the
/// results of tokenizing each file, in whatever order they finish.
pub fn tokenize_files_streaming<I, P>(
    tokenizer: Tokenizer,
    files: I,
    parallelism: usize,
) -> impl Stream<Item = Result<(Arc<PathBuf>, Vec<EncodedSequence>)>>
where
    I: IntoIterator<Item = P>,
    P: Into<PathBuf>,
{
    let tokenize_futs = files
        .into_iter()
        .map(move |file| tokenize_file(tokenizer.clone(), file));

    futures::stream::iter(tokenize_futs).buffer_unordered(parallelism.max(1))
}

/// Tokenize every line of a single file.
///
/// The file is read asynchronously, but tokenizing is CPU-bound so it runs on the blocking thread
/// pool rather than holding up the async runtime.
pub async fn tokenize_file(
    tokenizer: Tokenizer,
    path: impl Into<PathBuf>,
) -> Result<(Arc<PathBuf>, Vec<EncodedSequence>)> {
    let path = path.into();

    let contents = tokio::fs::read(&path)
        .await
        .with_context(|| format!("Error reading '{}'", path.display()))?;

    // Rather than fail on a file with a few bad bytes, substitute the placeholder character.  The
    // affected words will most likely come out as unknown tokens.
    let contents = match String::from_utf8(contents) {
        Ok(contents) => contents,
        Err(e) => {
            warn!(path = %path.display(),
                "Input file did not decode as clean UTF-8.   \
                Invalid bytes have been replaced with a UTF-8 placeholder sequence");
            String::from_utf8_lossy(e.as_bytes()).into_owned()
        }
    };

    let path = Arc::new(path);

    let encoded = tokio::task::spawn_blocking(move || tokenizer.encode_batch(contents.lines()))
        .await
        .context("Tokenizing task panicked")?
        .with_context(|| format!("Error tokenizing '{}'", path.display()))?;

    debug!(path = %path.display(), lines = encoded.len(), "Tokenized file");

    Ok((path, encoded))
}
