//! Knowledge graph engine
//!
//! Implements the entity-relation multigraph at the heart of the service:
//! - Label canonicalization and alias resolution
//! - Triple upsert with (subject, object, relation) deduplication
//! - Provenance accumulation and max-confidence reconciliation
//! - Keyword-driven, deterministically capped subgraph retrieval
//! - Junk-node cleanup

pub mod canonical;
pub mod models;
pub mod retrieval;
pub mod shared;
pub mod store;

pub use canonical::{canonical_relation, canonicalize, normalize};
pub use models::{Edge, EdgeId, GraphSnapshot, Node, NodeId, NodeKind, UpsertOutcome};
pub use retrieval::RetrievalLimits;
pub use shared::{ApplyStats, SharedGraph};
pub use store::GraphStore;
