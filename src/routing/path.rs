//! Path tokenizer: splits a topic/filter on `/`, keeping empty segments.

/// Tokenize a topic or filter string into its `/`-separated segments.
///
/// Empty segments are preserved: `"a//b"` yields `["a", "", "b"]`, `""` yields
/// `[""]`. No trimming, no normalization.
pub fn tokenize(path: &str) -> Vec<&str> {
    path.split('/').collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_on_slash() {
        assert_eq!(tokenize("a/b"), vec!["a", "b"]);
    }

    #[test]
    fn keeps_empty_segments() {
        assert_eq!(tokenize("a//b"), vec!["a", "", "b"]);
        assert_eq!(tokenize(""), vec![""]);
        assert_eq!(tokenize("/a"), vec!["", "a"]);
    }

    #[test]
    fn single_segment() {
        assert_eq!(tokenize("a"), vec!["a"]);
    }
}
