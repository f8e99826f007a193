//! Shared, lock-guarded graph handle for request handlers
//!
//! One mutex serializes every mutation and read. No operation awaits while
//! holding the lock.

use super::models::{GraphSnapshot, UpsertOutcome};
use super::retrieval::RetrievalLimits;
use super::store::GraphStore;
use crate::error::{Error, Result};
use crate::extraction::ExtractedTriple;
use crate::metrics::METRICS;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::debug;

/// Counts from applying a batch of triples
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ApplyStats {
    pub created: usize,
    pub merged: usize,
    pub dropped: usize,
}

impl ApplyStats {
    pub fn applied(&self) -> usize {
        self.created + self.merged
    }

    pub fn absorb(&mut self, other: ApplyStats) {
        self.created += other.created;
        self.merged += other.merged;
        self.dropped += other.dropped;
    }

    fn record(&mut self, outcome: &UpsertOutcome) {
        match outcome {
            UpsertOutcome::Created(_) => self.created += 1,
            UpsertOutcome::Merged(_) => self.merged += 1,
            UpsertOutcome::Dropped => self.dropped += 1,
        }
    }
}

/// Cloneable handle to the process-wide graph
#[derive(Clone, Default)]
pub struct SharedGraph {
    inner: Arc<Mutex<GraphStore>>,
}

impl SharedGraph {
    pub fn new(store: GraphStore) -> Self {
        Self {
            inner: Arc::new(Mutex::new(store)),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, GraphStore>> {
        self.inner
            .lock()
            .map_err(|_| Error::Internal("graph lock poisoned".to_string()))
    }

    /// Upsert one triple
    pub fn upsert_triple(
        &self,
        subject: &str,
        relation: &str,
        object: &str,
        source_id: &str,
        confidence: f32,
    ) -> Result<UpsertOutcome> {
        let outcome = {
            let mut graph = self.lock()?;
            let outcome = graph.upsert_triple(subject, relation, object, source_id, confidence);
            METRICS.record_graph_size(graph.node_count(), graph.edge_count());
            outcome
        };
        METRICS.record_upsert(&outcome);
        Ok(outcome)
    }

    /// Apply a batch of extracted triples in one critical section
    pub fn apply_triples(&self, triples: &[ExtractedTriple]) -> Result<ApplyStats> {
        let outcomes = {
            let mut graph = self.lock()?;
            Self::upsert_all(&mut graph, triples)
        };
        Ok(Self::tally(&outcomes))
    }

    /// Apply `triples` only if the graph has no nodes, checked under the same
    /// lock. Returns `None` when the graph was already populated.
    pub fn apply_if_empty(&self, triples: &[ExtractedTriple]) -> Result<Option<ApplyStats>> {
        let outcomes = {
            let mut graph = self.lock()?;
            if !graph.is_empty() {
                return Ok(None);
            }
            Self::upsert_all(&mut graph, triples)
        };
        Ok(Some(Self::tally(&outcomes)))
    }

    fn upsert_all(graph: &mut GraphStore, triples: &[ExtractedTriple]) -> Vec<UpsertOutcome> {
        let outcomes = triples
            .iter()
            .map(|triple| {
                graph.upsert_triple(
                    &triple.subject,
                    &triple.relation,
                    &triple.object,
                    &triple.source,
                    triple.confidence,
                )
            })
            .collect();
        METRICS.record_graph_size(graph.node_count(), graph.edge_count());
        outcomes
    }

    fn tally(outcomes: &[UpsertOutcome]) -> ApplyStats {
        let mut stats = ApplyStats::default();
        for outcome in outcomes {
            stats.record(outcome);
            METRICS.record_upsert(outcome);
        }
        debug!(
            "Applied triples: created={}, merged={}, dropped={}",
            stats.created, stats.merged, stats.dropped
        );
        stats
    }

    pub fn snapshot(&self) -> Result<GraphSnapshot> {
        Ok(self.lock()?.to_snapshot())
    }

    /// Node and edge counts
    pub fn size(&self) -> Result<(usize, usize)> {
        let graph = self.lock()?;
        Ok((graph.node_count(), graph.edge_count()))
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.lock()?.is_empty())
    }

    pub fn subgraph_for_keywords<S: AsRef<str>>(
        &self,
        keywords: &[S],
        limits: &RetrievalLimits,
    ) -> Result<GraphStore> {
        let subgraph = self.lock()?.subgraph_for_keywords(keywords, limits)?;
        METRICS.record_subgraph(subgraph.node_count(), subgraph.edge_count());
        Ok(subgraph)
    }

    pub fn cleanup_junk_nodes(&self) -> Result<usize> {
        let removed = {
            let mut graph = self.lock()?;
            let removed = graph.cleanup_junk_nodes();
            METRICS.record_graph_size(graph.node_count(), graph.edge_count());
            removed
        };
        METRICS.junk_nodes_removed.inc_by(removed as f64);
        Ok(removed)
    }

    /// Run a read-only closure against the graph
    pub fn read<T>(&self, f: impl FnOnce(&GraphStore) -> T) -> Result<T> {
        let graph = self.lock()?;
        Ok(f(&*graph))
    }
}
