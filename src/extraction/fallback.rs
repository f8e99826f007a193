//! Primary/secondary extractor composition

use super::models::{ExtractedTriple, ExtractionError};
use super::rule_based::RuleBasedExtractor;
use super::TripleExtractor;
use crate::metrics::METRICS;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Instant;
use tracing::warn;

/// Runs the primary extractor and recovers every failure with rule-based
/// extraction. Never returns an error.
pub struct FallbackExtractor {
    primary: Option<Arc<dyn TripleExtractor>>,
    rules: RuleBasedExtractor,
}

impl FallbackExtractor {
    pub fn new(primary: Option<Arc<dyn TripleExtractor>>, rules: RuleBasedExtractor) -> Self {
        Self { primary, rules }
    }

    /// Rule-based extraction only
    pub fn rules_only(rules: RuleBasedExtractor) -> Self {
        Self::new(None, rules)
    }

    pub fn primary_name(&self) -> &'static str {
        self.primary
            .as_ref()
            .map(|p| p.name())
            .unwrap_or_else(|| self.rules.name())
    }

    fn run_rules(&self, text: &str, source_id: &str) -> Vec<ExtractedTriple> {
        let start = Instant::now();
        let triples = self.rules.extract_sync(text, source_id);
        METRICS
            .extraction_duration
            .with_label_values(&[self.rules.name()])
            .observe(start.elapsed().as_secs_f64());
        triples
    }
}

#[async_trait]
impl TripleExtractor for FallbackExtractor {
    async fn extract(
        &self,
        text: &str,
        source_id: &str,
    ) -> Result<Vec<ExtractedTriple>, ExtractionError> {
        let Some(primary) = &self.primary else {
            return Ok(self.run_rules(text, source_id));
        };

        let start = Instant::now();
        let result = primary.extract(text, source_id).await;
        METRICS
            .extraction_duration
            .with_label_values(&[primary.name()])
            .observe(start.elapsed().as_secs_f64());

        match result {
            Ok(triples) => Ok(triples),
            Err(e) => {
                warn!(
                    "{} extraction failed for {}, falling back to rules: {}",
                    primary.name(),
                    source_id,
                    e
                );
                METRICS.extractor_fallbacks.inc();
                Ok(self.run_rules(text, source_id))
            }
        }
    }

    fn name(&self) -> &'static str {
        "fallback"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FailingExtractor;

    #[async_trait]
    impl TripleExtractor for FailingExtractor {
        async fn extract(&self, _: &str, _: &str) -> Result<Vec<ExtractedTriple>, ExtractionError> {
            Err(ExtractionError::NetworkError("connection refused".to_string()))
        }

        fn name(&self) -> &'static str {
            "failing"
        }
    }

    struct FixedExtractor;

    #[async_trait]
    impl TripleExtractor for FixedExtractor {
        async fn extract(&self, _: &str, source_id: &str) -> Result<Vec<ExtractedTriple>, ExtractionError> {
            Ok(vec![ExtractedTriple::new("Kafka", "uses", "ZooKeeper", 0.9, source_id)])
        }

        fn name(&self) -> &'static str {
            "fixed"
        }
    }

    #[tokio::test]
    async fn test_primary_result_is_used() {
        let extractor = FallbackExtractor::new(Some(Arc::new(FixedExtractor)), RuleBasedExtractor::default());
        let triples = extractor.extract("Rust uses LLVM internally.", "s").await.unwrap();
        assert_eq!(triples[0].subject, "Kafka");
        assert_eq!(extractor.primary_name(), "fixed");
    }

    #[tokio::test]
    async fn test_failure_falls_back_to_rules() {
        let extractor =
            FallbackExtractor::new(Some(Arc::new(FailingExtractor)), RuleBasedExtractor::default());
        let triples = extractor.extract("Rust uses LLVM internally.", "s").await.unwrap();
        assert_eq!(triples.len(), 1);
        assert_eq!(triples[0].relation, "uses");
    }

    #[test]
    fn test_rules_only() {
        let extractor = FallbackExtractor::rules_only(RuleBasedExtractor::default());
        let triples = tokio_test::block_on(extractor.extract("Tokio is a runtime for Rust.", "s")).unwrap();
        assert_eq!(triples[0].relation, "is_a");
        assert_eq!(extractor.primary_name(), "rules");
    }
}
