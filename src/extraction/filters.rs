//! Post-processing applied to every extractor's output

use super::models::ExtractedTriple;
use crate::graph::canonical::{canonical_relation, canonicalize, is_canonical_relation, is_junk_label};
use tracing::debug;

/// Quality gates for extracted triples
#[derive(Debug, Clone, Copy)]
pub struct TripleFilter {
    pub min_confidence: f32,
    pub strict_relations: bool,
    pub max_triples: usize,
}

impl Default for TripleFilter {
    fn default() -> Self {
        Self {
            min_confidence: 0.3,
            strict_relations: false,
            max_triples: 8,
        }
    }
}

impl TripleFilter {
    /// Whether one triple survives the quality gates
    pub fn accepts(&self, triple: &ExtractedTriple) -> bool {
        let subject = canonicalize(&triple.subject);
        let object = canonicalize(&triple.object);
        let relation = canonical_relation(&triple.relation);

        if subject.is_empty() || object.is_empty() || relation.is_empty() {
            return false;
        }
        if is_junk_label(&subject) || is_junk_label(&object) {
            return false;
        }
        if subject == object {
            return false;
        }
        if triple.confidence.is_nan() || triple.confidence < self.min_confidence {
            return false;
        }
        if self.strict_relations && !is_canonical_relation(&relation) {
            return false;
        }
        true
    }

    /// Drop rejected triples and cap the rest
    pub fn apply(&self, triples: Vec<ExtractedTriple>) -> Vec<ExtractedTriple> {
        let before = triples.len();
        let kept: Vec<ExtractedTriple> = triples
            .into_iter()
            .filter(|t| self.accepts(t))
            .take(self.max_triples)
            .collect();

        if kept.len() < before {
            debug!("Triple filter kept {} of {} triples", kept.len(), before);
        }
        kept
    }
}
