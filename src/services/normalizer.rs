//! Query canonicalization.
//!
//! Two searches count as the same query when they differ only in case or
//! in the amount of whitespace around and between words.

/// Shortest normalized query, in characters, that is worth recording.
pub const MIN_QUERY_LENGTH: usize = 2;

/// Normalizes with the default minimum length.
#[must_use]
pub fn normalize(raw: &str) -> Option<String> {
    QueryNormalizer::default().normalize(raw)
}

#[derive(Debug, Clone, Copy)]
pub struct QueryNormalizer {
    min_length: usize,
}

impl Default for QueryNormalizer {
    fn default() -> Self {
        Self::new(MIN_QUERY_LENGTH)
    }
}

impl QueryNormalizer {
    #[must_use]
    pub const fn new(min_length: usize) -> Self {
        Self { min_length }
    }

    /// Trims, collapses whitespace runs to one space and lowercases.
    /// Returns `None` when the result is shorter than the minimum length.
    #[must_use]
    pub fn normalize(&self, raw: &str) -> Option<String> {
        let collapsed = raw.split_whitespace().collect::<Vec<_>>().join(" ");
        let normalized = collapsed.to_lowercase();

        if normalized.chars().count() < self.min_length {
            return None;
        }

        Some(normalized)
    }
}
