//! Question keyword extraction

use indexmap::IndexSet;
use once_cell::sync::Lazy;
use std::collections::HashSet;

static QUESTION_STOPWORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    HashSet::from([
        "the", "a", "an", "and", "or", "but", "in", "on", "at", "to", "for", "of", "with", "by",
        "is", "are", "was", "were", "be", "been", "have", "has", "had", "do", "does", "did",
        "will", "would", "could", "should", "may", "might", "can", "what", "when", "where",
        "who", "why", "how",
    ])
});

/// Lowercased content words of a question, deduplicated in order of appearance
pub fn extract_keywords(question: &str) -> Vec<String> {
    let cleaned: String = question
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '_' { c } else { ' ' })
        .collect();

    cleaned
        .split_whitespace()
        .filter(|word| word.chars().count() > 1 && !QUESTION_STOPWORDS.contains(word))
        .map(str::to_string)
        .collect::<IndexSet<String>>()
        .into_iter()
        .collect()
}
