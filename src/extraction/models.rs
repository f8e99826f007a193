//! Extraction data types

use serde::{Deserialize, Serialize};

/// Confidence assigned when an extractor does not report one
pub const DEFAULT_CONFIDENCE: f32 = 0.5;

/// Confidence assigned to pattern-matched triples
pub const RULE_CONFIDENCE: f32 = 0.7;

/// A subject-relation-object triple produced by an extractor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedTriple {
    pub subject: String,
    pub relation: String,
    pub object: String,
    #[serde(default = "default_confidence")]
    pub confidence: f32,
    /// Provenance token, e.g. `https://example.com#chunk_0`
    pub source: String,
}

fn default_confidence() -> f32 {
    DEFAULT_CONFIDENCE
}

impl ExtractedTriple {
    pub fn new(
        subject: impl Into<String>,
        relation: impl Into<String>,
        object: impl Into<String>,
        confidence: f32,
        source: impl Into<String>,
    ) -> Self {
        Self {
            subject: subject.into(),
            relation: relation.into(),
            object: object.into(),
            confidence,
            source: source.into(),
        }
    }
}

/// Extraction errors
#[derive(Debug, thiserror::Error)]
pub enum ExtractionError {
    #[error("Initialization error: {0}")]
    InitializationError(String),

    #[error("API error: {0}")]
    ApiError(String),

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Malformed model output: {0}")]
    ParseError(String),

    #[error("Circuit breaker open for {0}")]
    CircuitOpen(String),
}

impl From<ExtractionError> for crate::error::Error {
    fn from(err: ExtractionError) -> Self {
        crate::error::Error::Extraction(err.to_string())
    }
}
