//! In-memory entity-relation multigraph
//!
//! Nodes and edges live in insertion-ordered arenas keyed by opaque ids, with
//! two lookup indices: canonical label -> node id and
//! (subject id, object id, relation) -> edge id.

use super::canonical::{canonical_relation, canonicalize, display_label, is_junk_label};
use super::models::*;
use indexmap::IndexMap;
use std::collections::{HashMap, HashSet};
use tracing::{debug, info};

/// Entity-relation multigraph with dedup and provenance accumulation
#[derive(Debug, Clone, Default)]
pub struct GraphStore {
    nodes: IndexMap<NodeId, Node>,
    edges: IndexMap<EdgeId, Edge>,
    node_index: HashMap<String, NodeId>,
    edge_index: HashMap<EdgeKey, EdgeId>,
}

impl GraphStore {
    /// Create an empty graph
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Nodes in insertion order
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    /// Edges in insertion order
    pub fn edges(&self) -> impl Iterator<Item = &Edge> {
        self.edges.values()
    }

    pub fn node(&self, id: &NodeId) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub fn edge(&self, id: &EdgeId) -> Option<&Edge> {
        self.edges.get(id)
    }

    /// Insertion position of a node
    pub fn node_position(&self, id: &NodeId) -> Option<usize> {
        self.nodes.get_index_of(id)
    }

    /// Look up a node by any label that canonicalizes to it
    pub fn find_node(&self, label: &str) -> Option<&Node> {
        let key = canonicalize(label);
        self.node_index.get(&key).and_then(|id| self.nodes.get(id))
    }

    /// Look up the edge for a (subject, relation, object) triple
    pub fn find_edge(&self, subject: &str, relation: &str, object: &str) -> Option<&Edge> {
        let source = self.find_node(subject)?.id.clone();
        let target = self.find_node(object)?.id.clone();
        let key = EdgeKey {
            source,
            target,
            relation: canonical_relation(relation),
        };
        self.edge_index.get(&key).and_then(|id| self.edges.get(id))
    }

    /// Add or merge a triple.
    ///
    /// Subject and object are resolved to nodes by canonical label, creating
    /// them on first reference. An existing (subject, object, relation) edge
    /// gets the source appended and keeps the maximum confidence; otherwise a
    /// new edge is created. Labels that canonicalize to nothing drop the
    /// triple without error.
    pub fn upsert_triple(
        &mut self,
        subject: &str,
        relation: &str,
        object: &str,
        source_id: &str,
        confidence: f32,
    ) -> UpsertOutcome {
        let subject_key = canonicalize(subject);
        let object_key = canonicalize(object);
        let relation_key = canonical_relation(relation);

        if subject_key.is_empty() || object_key.is_empty() || relation_key.is_empty() {
            debug!(
                "Dropping malformed triple: subject={:?}, relation={:?}, object={:?}, source={}",
                subject, relation, object, source_id
            );
            return UpsertOutcome::Dropped;
        }

        let subject_id = self.get_or_create_node(subject_key, subject);
        let object_id = self.get_or_create_node(object_key, object);

        let key = EdgeKey {
            source: subject_id,
            target: object_id,
            relation: relation_key,
        };

        if let Some(edge_id) = self.edge_index.get(&key) {
            if let Some(edge) = self.edges.get_mut(edge_id) {
                edge.sources.push(source_id.to_string());
                edge.confidence = edge.confidence.max(confidence);
                debug!(
                    "Merged edge: id={}, sources={}, confidence={}",
                    edge.id,
                    edge.sources.len(),
                    edge.confidence
                );
                return UpsertOutcome::Merged(edge.id.clone());
            }
        }

        let edge = Edge {
            id: EdgeId::new(),
            source: key.source.clone(),
            target: key.target.clone(),
            relation: key.relation.clone(),
            sources: vec![source_id.to_string()],
            confidence,
        };
        let edge_id = edge.id.clone();
        debug!("Created edge: id={}, relation={}", edge_id, edge.relation);

        self.edge_index.insert(key, edge_id.clone());
        self.edges.insert(edge_id.clone(), edge);

        UpsertOutcome::Created(edge_id)
    }

    fn get_or_create_node(&mut self, canonical: String, raw_label: &str) -> NodeId {
        if let Some(id) = self.node_index.get(&canonical) {
            return id.clone();
        }

        let node = Node {
            id: NodeId::new(),
            label: display_label(raw_label),
            canonical,
            kind: NodeKind::Entity,
        };
        let id = node.id.clone();
        debug!("Created node: id={}, label={}", id, node.label);

        self.node_index.insert(node.canonical.clone(), id.clone());
        self.nodes.insert(id.clone(), node);
        id
    }

    /// Copy a node from another graph, keeping its id
    pub(crate) fn insert_node(&mut self, node: Node) {
        self.node_index.insert(node.canonical.clone(), node.id.clone());
        self.nodes.insert(node.id.clone(), node);
    }

    /// Copy an edge from another graph, keeping its id
    pub(crate) fn insert_edge(&mut self, edge: Edge) {
        let key = EdgeKey {
            source: edge.source.clone(),
            target: edge.target.clone(),
            relation: edge.relation.clone(),
        };
        self.edge_index.insert(key, edge.id.clone());
        self.edges.insert(edge.id.clone(), edge);
    }

    /// Serializable view of the whole graph, in insertion order
    pub fn to_snapshot(&self) -> GraphSnapshot {
        GraphSnapshot {
            nodes: self.nodes.values().map(NodeView::from).collect(),
            edges: self.edges.values().map(EdgeView::from).collect(),
        }
    }

    /// Remove junk nodes and every edge touching them.
    ///
    /// A node is junk when its canonical label is a stop word, a known vague
    /// entity, or shorter than the minimum label length. Returns the number of
    /// nodes removed.
    pub fn cleanup_junk_nodes(&mut self) -> usize {
        let junk: HashSet<NodeId> = self
            .nodes
            .values()
            .filter(|node| is_junk_label(&node.canonical))
            .map(|node| node.id.clone())
            .collect();

        if junk.is_empty() {
            return 0;
        }

        let edges_before = self.edges.len();

        self.nodes.retain(|id, _| !junk.contains(id));
        self.node_index.retain(|_, id| !junk.contains(id));
        self.edges
            .retain(|_, edge| !junk.contains(&edge.source) && !junk.contains(&edge.target));
        self.edge_index.retain(|_, id| self.edges.contains_key(id));

        info!(
            "Cleanup removed {} junk nodes and {} edges",
            junk.len(),
            edges_before - self.edges.len()
        );

        junk.len()
    }
}
