//! Knowledge graph service
//!
//! Ingests unstructured text, extracts subject-relation-object triples,
//! accumulates them into a deduplicated multigraph and answers questions by
//! keyword-driven subgraph retrieval.

pub mod api;
pub mod config;
pub mod error;
pub mod extraction;
pub mod graph;
pub mod ingest;
pub mod metrics;
pub mod qa;

pub use config::Config;
pub use error::{Error, Result};
pub use graph::{GraphStore, RetrievalLimits, SharedGraph};
