//! Triple extraction
//!
//! Turns a chunk of free text into subject-relation-object triples. An LLM
//! extractor is used when an API key is configured; every failure falls back
//! to sentence-level regex heuristics. All output passes through
//! [`TripleFilter`] before reaching the graph.

pub mod circuit_breaker;
pub mod fallback;
pub mod filters;
pub mod llm;
pub mod models;
pub mod rule_based;

pub use fallback::FallbackExtractor;
pub use filters::TripleFilter;
pub use llm::LlmExtractor;
pub use models::{ExtractedTriple, ExtractionError};
pub use rule_based::RuleBasedExtractor;

use crate::config::ExtractionConfig;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{info, warn};

/// Source of triples for a chunk of text
#[async_trait]
pub trait TripleExtractor: Send + Sync {
    async fn extract(
        &self,
        text: &str,
        source_id: &str,
    ) -> Result<Vec<ExtractedTriple>, ExtractionError>;

    /// Short label used in logs and metrics
    fn name(&self) -> &'static str;
}

/// Build the extractor chain described by the configuration
pub fn build_extractor(config: &ExtractionConfig) -> FallbackExtractor {
    let rules = RuleBasedExtractor::new(config.max_triples);

    if !config.llm_enabled() {
        info!("LLM extraction disabled (no API key), using rule-based extraction");
        return FallbackExtractor::rules_only(rules);
    }

    match LlmExtractor::new(config.clone()) {
        Ok(llm) => {
            info!("LLM extraction enabled: model={}", config.model);
            FallbackExtractor::new(Some(Arc::new(llm)), rules)
        }
        Err(e) => {
            warn!("Failed to initialize LLM extractor, using rules: {}", e);
            FallbackExtractor::rules_only(rules)
        }
    }
}

impl From<&ExtractionConfig> for TripleFilter {
    fn from(config: &ExtractionConfig) -> Self {
        Self {
            min_confidence: config.min_confidence,
            strict_relations: config.strict_relations,
            max_triples: config.max_triples,
        }
    }
}
