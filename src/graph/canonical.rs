//! Label canonicalization
//!
//! Entity and relation labels arrive as free text from extractors. Every label
//! is normalized (lowercase, punctuation stripped, whitespace collapsed, one
//! leading article removed) and then resolved through a static alias table so
//! that "AI", "artificial intelligence" and " Artificial   Intelligence " all
//! land on the same node.

use once_cell::sync::Lazy;
use std::collections::{HashMap, HashSet};

/// Minimum length of a canonical entity label that survives cleanup
pub const MIN_LABEL_LEN: usize = 3;

const LEADING_ARTICLES: [&str; 3] = ["a", "an", "the"];

static ENTITY_ALIASES: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("ai", "artificial intelligence"),
        ("ml", "machine learning"),
        ("llm", "large language model"),
        ("llms", "large language model"),
        ("large language models", "large language model"),
        ("nlp", "natural language processing"),
        ("cv", "computer vision"),
        ("dl", "deep learning"),
        ("nn", "neural network"),
        ("neural networks", "neural network"),
        ("neural net", "neural network"),
        ("neural nets", "neural network"),
        ("robot", "robotics"),
        ("robotic", "robotics"),
        ("robots", "robotics"),
    ])
});

static RELATION_SYNONYMS: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("is a", "is_a"),
        ("is an", "is_a"),
        ("type of", "is_a"),
        ("kind of", "is_a"),
        ("is defined as", "defined_as"),
        ("defined as", "defined_as"),
        ("is part of", "part_of"),
        ("part of", "part_of"),
        ("is a subset of", "subset_of"),
        ("subset of", "subset_of"),
        ("is an instance of", "instance_of"),
        ("instance of", "instance_of"),
        ("use", "uses"),
        ("used", "uses"),
        ("utilizes", "uses"),
        ("depends on", "depends_on"),
        ("relies on", "depends_on"),
        ("enable", "enables"),
        ("cause", "causes"),
        ("prevent", "prevents"),
        ("is similar to", "similar_to"),
        ("similar to", "similar_to"),
        ("related to", "related_to"),
        ("is related to", "related_to"),
    ])
});

/// Relations accepted from extractors when strict relation filtering is on
pub static CANONICAL_RELATIONS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    HashSet::from([
        "is_a",
        "defined_as",
        "part_of",
        "uses",
        "depends_on",
        "causes",
        "enables",
        "prevents",
        "similar_to",
        "subset_of",
        "instance_of",
        "related_to",
    ])
});

/// Function words that never make a useful entity
pub static STOPWORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    HashSet::from([
        "a", "an", "the", "and", "or", "but", "if", "then", "so", "of", "in", "on", "at", "to",
        "for", "with", "by", "from", "as", "is", "are", "was", "were", "be", "been", "being",
        "have", "has", "had", "do", "does", "did", "will", "would", "could", "should", "may",
        "might", "can", "this", "that", "these", "those", "there", "here", "what", "when",
        "where", "who", "whom", "which", "why", "how", "not", "no", "yes", "it", "its", "they",
        "them", "their", "we", "us", "our", "you", "your", "he", "she", "him", "her", "i", "me",
        "my", "also", "very", "such", "other", "another", "some", "any", "all", "each", "more",
        "most", "many", "much",
    ])
});

/// Vague nouns an extractor tends to emit as entities
pub static BAD_ENTITIES: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    HashSet::from([
        "thing", "things", "something", "anything", "everything", "nothing", "issue", "issues",
        "stuff", "way", "ways", "lot", "example", "someone", "anyone", "everyone", "one",
        "people", "type", "kind",
    ])
});

/// Normalize a free-text label.
///
/// Lowercases, replaces every character that is neither alphanumeric nor
/// whitespace with a space, collapses whitespace, trims, and strips a single
/// leading article when more text follows it.
pub fn normalize(label: &str) -> String {
    if label.is_empty() {
        return String::new();
    }

    let cleaned: String = label
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() || c.is_whitespace() { c } else { ' ' })
        .collect();

    let collapsed = cleaned.split_whitespace().collect::<Vec<_>>().join(" ");

    match collapsed.split_once(' ') {
        Some((first, rest)) if LEADING_ARTICLES.contains(&first) => rest.to_string(),
        _ => collapsed,
    }
}

/// Canonical form of an entity label: normalized, then alias-resolved
pub fn canonicalize(label: &str) -> String {
    let normalized = normalize(label);
    match ENTITY_ALIASES.get(normalized.as_str()) {
        Some(target) => (*target).to_string(),
        None => normalized,
    }
}

/// Canonical form of a relation label, e.g. "Depends on" -> "depends_on"
pub fn canonical_relation(relation: &str) -> String {
    let normalized = normalize(relation);
    if let Some(target) = RELATION_SYNONYMS.get(normalized.as_str()) {
        return (*target).to_string();
    }
    normalized.replace(' ', "_")
}

/// Alias target for a single keyword, if one exists
pub fn alias_of(keyword: &str) -> Option<&'static str> {
    ENTITY_ALIASES.get(normalize(keyword).as_str()).copied()
}

/// Whether a canonical label should be pruned as junk
pub fn is_junk_label(canonical: &str) -> bool {
    canonical.chars().count() < MIN_LABEL_LEN
        || STOPWORDS.contains(canonical)
        || BAD_ENTITIES.contains(canonical)
}

/// Whether a relation is in the accepted relation vocabulary
pub fn is_canonical_relation(relation: &str) -> bool {
    CANONICAL_RELATIONS.contains(relation)
}

/// Display form of a raw label: trimmed with whitespace collapsed
pub fn display_label(label: &str) -> String {
    label.split_whitespace().collect::<Vec<_>>().join(" ")
}
