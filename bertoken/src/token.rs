/// A token output by the tokenizer, represented in its integer form corresponding to the line
/// on which the token appears in the vocabulary file.
///
/// The classifier only ever sees these integers.  The strings they stand for are only needed while
/// segmenting words and when turning ids back into text for debugging.
pub type TokenInt = usize;

/// Render a stream of tokens the way the reference tokenizer prints it: separated by single spaces,
/// with no separator before the first token or after the last.
pub fn join_stream(tokens: &[&str]) -> String {
    tokens.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn join_never_adds_leading_or_trailing_separators() {
        assert_eq!("", join_stream(&[]));
        assert_eq!(".", join_stream(&["."]));
        assert_eq!(". hello , world", join_stream(&[".", "hello", ",", "world"]));
    }
}
