//! Cache key builders for every archive cache entry.
//!
//! Keys are grouped by memo operation so a whole operation can be flushed
//! with one prefix pattern. Backend-level prefixes (e.g. the Redis
//! `key_prefix`) are applied by the provider, not here.

/// Namespace shared by all memoized resolver results.
const MEMO: &str = "memo";

/// Cache key for one memoized call: `memo:{operation}:{args}`.
pub fn memo(operation: &str, args: &str) -> String {
    format!("{MEMO}:{operation}:{args}")
}

/// Pattern matching every memoized call of `operation`.
pub fn memo_pattern(operation: &str) -> String {
    format!("{MEMO}:{operation}:*")
}

/// Join argument parts into the `args` segment of a memo key.
pub fn args<I, T>(parts: I) -> String
where
    I: IntoIterator<Item = T>,
    T: std::fmt::Display,
{
    parts
        .into_iter()
        .map(|p| p.to_string())
        .collect::<Vec<_>>()
        .join(":")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memo_key() {
        assert_eq!(
            memo("ancestors", "00000000-0000-0000-0000-000000000000"),
            "memo:ancestors:00000000-0000-0000-0000-000000000000"
        );
    }

    #[test]
    fn test_pattern_is_prefix_of_key() {
        let key = memo("category", &args(["collection", "document"]));
        let pattern = memo_pattern("category");
        assert_eq!(key, "memo:category:collection:document");
        assert!(key.starts_with(pattern.trim_end_matches('*')));
        assert!(!memo("categoryx", "a").starts_with(pattern.trim_end_matches('*')));
    }
}
