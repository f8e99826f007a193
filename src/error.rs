//! Error types for the knowledge graph service

use thiserror::Error as ThisError;

/// Crate-wide result alias
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by the graph engine and its collaborators
#[derive(Debug, ThisError)]
pub enum Error {
    /// Caller supplied something unusable (bad upload, empty question)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Configuration could not be loaded or failed validation
    #[error("Configuration error: {0}")]
    Config(String),

    /// A document could not be fetched
    #[error("Failed to fetch {url}: {cause}")]
    Fetch { url: String, cause: String },

    /// Triple extraction failed and no fallback applied
    #[error("Extraction error: {0}")]
    Extraction(String),

    /// Broken internal state; fatal to the current request
    #[error("Internal error: {0}")]
    Internal(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub fn fetch(url: impl Into<String>, cause: impl std::fmt::Display) -> Self {
        Self::Fetch {
            url: url.into(),
            cause: cause.to_string(),
        }
    }
}

impl From<config::ConfigError> for Error {
    fn from(err: config::ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}
