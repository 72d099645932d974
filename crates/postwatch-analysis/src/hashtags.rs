use std::sync::LazyLock;

use regex::Regex;

static HASHTAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"#(\w+)").expect("valid hashtag regex"));

/// Hashtags in order of appearance, without the leading `#`.
#[must_use]
pub fn extract_hashtags(text: &str) -> Vec<String> {
    HASHTAG_RE
        .captures_iter(text)
        .filter_map(|c| c.get(1).map(|m| m.as_str().to_string()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_tags_in_order() {
        assert_eq!(
            extract_hashtags("Hiring! #rust #backend and more #rust"),
            vec!["rust", "backend", "rust"]
        );
    }

    #[test]
    fn lone_hash_is_ignored() {
        assert!(extract_hashtags("item # 4 costs $5").is_empty());
    }
}
