//! Pattern-based triple extraction used when no LLM is available

use super::models::{ExtractedTriple, ExtractionError, RULE_CONFIDENCE};
use super::TripleExtractor;
use crate::graph::canonical::{canonicalize, is_junk_label, STOPWORDS};
use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

const MIN_SENTENCE_LEN: usize = 10;
const MAX_PHRASE_WORDS: usize = 4;

struct RelationPattern {
    regex: Regex,
    relation: &'static str,
}

fn compile(patterns: &[(&str, &'static str)]) -> Vec<RelationPattern> {
    patterns
        .iter()
        .map(|(pattern, relation)| RelationPattern {
            regex: Regex::new(pattern).expect("Failed to compile relation pattern"),
            relation,
        })
        .collect()
}

// Ordered most specific first; only the first match per sentence is used.
static COPULA_PATTERNS: Lazy<Vec<RelationPattern>> = Lazy::new(|| {
    compile(&[
        (r"(?i)^(.+?)\s+(?:is|are)\s+an?\s+subset\s+of\s+(.+)$", "subset_of"),
        (r"(?i)^(.+?)\s+(?:is|are)\s+(?:an?\s+)?part\s+of\s+(.+)$", "part_of"),
        (r"(?i)^(.+?)\s+is\s+an?\s+instance\s+of\s+(.+)$", "instance_of"),
        (r"(?i)^(.+?)\s+is\s+an?\s+(.+)$", "is_a"),
    ])
});

static VERB_PATTERNS: Lazy<Vec<RelationPattern>> = Lazy::new(|| {
    compile(&[
        (r"(?i)^(.+?)\s+uses\s+(.+)$", "uses"),
        (r"(?i)^(.+?)\s+depends\s+on\s+(.+)$", "depends_on"),
        (r"(?i)^(.+?)\s+enables\s+(.+)$", "enables"),
        (r"(?i)^(.+?)\s+causes\s+(.+)$", "causes"),
    ])
});

/// Regex heuristics over sentences
#[derive(Debug, Clone)]
pub struct RuleBasedExtractor {
    max_triples: usize,
}

impl Default for RuleBasedExtractor {
    fn default() -> Self {
        Self::new(8)
    }
}

impl RuleBasedExtractor {
    pub fn new(max_triples: usize) -> Self {
        Self { max_triples }
    }

    /// Synchronous extraction; never fails
    pub fn extract_sync(&self, text: &str, source_id: &str) -> Vec<ExtractedTriple> {
        let mut triples = Vec::new();

        for sentence in text.split(['.', '!', '?']) {
            let sentence = sentence.trim();
            if sentence.chars().count() < MIN_SENTENCE_LEN {
                continue;
            }

            let copula = COPULA_PATTERNS.iter().find_map(|p| self.match_pattern(p, sentence, source_id));
            triples.extend(copula);

            for pattern in VERB_PATTERNS.iter() {
                triples.extend(self.match_pattern(pattern, sentence, source_id));
            }

            if triples.len() >= self.max_triples {
                break;
            }
        }

        triples.truncate(self.max_triples);
        debug!("Rule-based extraction produced {} triples for {}", triples.len(), source_id);
        triples
    }

    fn match_pattern(
        &self,
        pattern: &RelationPattern,
        sentence: &str,
        source_id: &str,
    ) -> Option<ExtractedTriple> {
        let caps = pattern.regex.captures(sentence)?;
        let subject = subject_phrase(caps.get(1)?.as_str())?;
        let object = object_phrase(caps.get(2)?.as_str())?;

        if is_junk_entity(&subject) || is_junk_entity(&object) {
            return None;
        }

        Some(ExtractedTriple::new(
            subject,
            pattern.relation,
            object,
            RULE_CONFIDENCE,
            source_id,
        ))
    }
}

#[async_trait]
impl TripleExtractor for RuleBasedExtractor {
    async fn extract(
        &self,
        text: &str,
        source_id: &str,
    ) -> Result<Vec<ExtractedTriple>, ExtractionError> {
        Ok(self.extract_sync(text, source_id))
    }

    fn name(&self) -> &'static str {
        "rules"
    }
}

fn clean_word(word: &str) -> &str {
    word.trim_matches(|c: char| !(c.is_alphanumeric() || c == '+' || c == '#'))
}

fn is_stopword(word: &str) -> bool {
    STOPWORDS.contains(word.to_lowercase().as_str())
}

fn is_junk_entity(phrase: &str) -> bool {
    phrase.chars().count() <= 2 || is_junk_label(&canonicalize(phrase))
}

/// Words nearest the relation, walking backwards until a function word
fn subject_phrase(raw: &str) -> Option<String> {
    let clause = raw.rsplit([',', ';', ':', '(', ')']).next().unwrap_or(raw);
    let mut words: Vec<&str> = clause
        .split_whitespace()
        .rev()
        .map(clean_word)
        .take_while(|w| !w.is_empty() && !is_stopword(w))
        .take(MAX_PHRASE_WORDS)
        .collect();
    words.reverse();
    join_phrase(&words)
}

/// Words following the relation, after a leading article, until a function word
fn object_phrase(raw: &str) -> Option<String> {
    let clause = raw.split([',', ';', ':', '(', ')']).next().unwrap_or(raw);
    let mut words = clause.split_whitespace().map(clean_word).peekable();
    if let Some(first) = words.peek() {
        if matches!(first.to_lowercase().as_str(), "a" | "an" | "the") {
            words.next();
        }
    }
    let words: Vec<&str> = words
        .take_while(|w| !w.is_empty() && !is_stopword(w))
        .take(MAX_PHRASE_WORDS)
        .collect();
    join_phrase(&words)
}

fn join_phrase(words: &[&str]) -> Option<String> {
    if words.is_empty() {
        None
    } else {
        Some(words.join(" "))
    }
}
