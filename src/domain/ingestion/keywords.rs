//! Keyword extraction used by the graph and hybrid indexes

use std::collections::{HashMap, HashSet};

use once_cell::sync::Lazy;
use regex::Regex;

/// Keywords kept per text
pub const MAX_KEYWORDS: usize = 15;

static PUNCTUATION: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\w\s]").unwrap());

static STOP_WORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "the", "a", "an", "in", "on", "at", "to", "for", "with", "by", "of", "and", "or", "is",
        "are", "was", "were", "be", "been", "being", "have", "has", "had", "do", "does", "did",
        "but", "if", "then", "else", "when", "where", "why", "how", "all", "any", "both", "each",
        "few", "more", "most", "some", "such", "no", "nor", "not", "only", "own", "same", "so",
        "than", "too", "very",
    ]
    .into_iter()
    .collect()
});

/// Lowercased words with punctuation removed
pub fn tokenize(text: &str) -> Vec<String> {
    PUNCTUATION
        .replace_all(&text.to_lowercase(), "")
        .split_whitespace()
        .map(str::to_string)
        .collect()
}

/// Tokens that carry meaning: no stop words, longer than two characters
pub fn content_terms(text: &str) -> Vec<String> {
    tokenize(text)
        .into_iter()
        .filter(|w| w.chars().count() > 2 && !STOP_WORDS.contains(w.as_str()))
        .collect()
}

/// Up to `max` most frequent content terms. Ties keep first-occurrence order.
pub fn extract_keywords_with_limit(text: &str, max: usize) -> Vec<String> {
    let mut counts: HashMap<String, usize> = HashMap::new();
    let mut order: Vec<String> = Vec::new();

    for term in content_terms(text) {
        let count = counts.entry(term.clone()).or_insert(0);
        if *count == 0 {
            order.push(term);
        }
        *count += 1;
    }

    // stable: equal counts stay in first-seen order
    order.sort_by(|a, b| counts[b].cmp(&counts[a]));
    order.truncate(max);
    order
}

pub fn extract_keywords(text: &str) -> Vec<String> {
    extract_keywords_with_limit(text, MAX_KEYWORDS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_punctuation_and_stop_words() {
        let keywords = extract_keywords("What is the Refund policy?");
        assert_eq!(keywords, vec!["what", "refund", "policy"]);
    }

    #[test]
    fn test_short_words_dropped() {
        assert!(extract_keywords("an ox is by me").is_empty());
    }

    #[test]
    fn test_ranked_by_frequency_then_first_seen() {
        let keywords = extract_keywords("alpha beta gamma beta gamma gamma");
        assert_eq!(keywords, vec!["gamma", "beta", "alpha"]);
    }

    #[test]
    fn test_limit() {
        let text = (0..30).map(|i| format!("word{:02}", i)).collect::<Vec<_>>().join(" ");
        assert_eq!(extract_keywords(&text).len(), MAX_KEYWORDS);
        assert_eq!(extract_keywords_with_limit(&text, 3).len(), 3);
    }

    #[test]
    fn test_tokenize_keeps_underscores_and_digits() {
        assert_eq!(tokenize("Snake_case, v2!"), vec!["snake_case", "v2"]);
    }
}
