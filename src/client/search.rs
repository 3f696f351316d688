//! In-memory search over already-fetched entries.

use crate::api::projection::{Expression, Word};

/// Anything that can be matched by a free-text query.
pub trait Searchable {
    /// The display text (term or expression).
    fn headline(&self) -> &str;
    /// The definition or meaning.
    fn body(&self) -> &str;
}

impl Searchable for Word {
    fn headline(&self) -> &str {
        &self.term
    }

    fn body(&self) -> &str {
        &self.definition
    }
}

impl Searchable for Expression {
    fn headline(&self) -> &str {
        &self.expression
    }

    fn body(&self) -> &str {
        &self.meaning
    }
}

/// Normalize a raw query: trimmed and lower-cased. `None` means "match all".
pub fn normalize_query(query: &str) -> Option<String> {
    let normalized = query.trim().to_lowercase();
    (!normalized.is_empty()).then_some(normalized)
}

pub fn matches<T: Searchable>(entry: &T, normalized: &str) -> bool {
    entry.headline().to_lowercase().contains(normalized)
        || entry.body().to_lowercase().contains(normalized)
}

/// Case-insensitive substring filter, preserving the input order.
pub fn filter<T: Searchable + Clone>(entries: &[T], query: &str) -> Vec<T> {
    match normalize_query(query) {
        None => entries.to_vec(),
        Some(normalized) => entries
            .iter()
            .filter(|entry| matches(*entry, &normalized))
            .cloned()
            .collect(),
    }
}

pub fn filter_words(words: &[Word], query: &str) -> Vec<Word> {
    filter(words, query)
}

pub fn filter_expressions(expressions: &[Expression], query: &str) -> Vec<Expression> {
    filter(expressions, query)
}
