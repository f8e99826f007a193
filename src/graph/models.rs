//! Data models for the knowledge graph

use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque node identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for NodeId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Opaque edge identifier, independent of the edge's dedup key
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EdgeId(String);

impl EdgeId {
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for EdgeId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for EdgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Node type tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Entity,
}

impl Default for NodeKind {
    fn default() -> Self {
        Self::Entity
    }
}

/// Entity node
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub id: NodeId,
    /// Identity key: normalized, alias-resolved label
    pub canonical: String,
    /// First-seen label as written by the source
    pub label: String,
    pub kind: NodeKind,
}

/// Directed relation edge
#[derive(Debug, Clone, PartialEq)]
pub struct Edge {
    pub id: EdgeId,
    pub source: NodeId,
    pub target: NodeId,
    pub relation: String,
    /// Every source that asserted this triple, in arrival order
    pub sources: Vec<String>,
    /// Highest confidence ever observed for this triple
    pub confidence: f32,
}

/// Dedup key for edges
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EdgeKey {
    pub source: NodeId,
    pub target: NodeId,
    pub relation: String,
}

/// Result of a single upsert
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpsertOutcome {
    Created(EdgeId),
    Merged(EdgeId),
    /// Subject, object or relation was empty after canonicalization
    Dropped,
}

impl UpsertOutcome {
    pub fn edge_id(&self) -> Option<&EdgeId> {
        match self {
            Self::Created(id) | Self::Merged(id) => Some(id),
            Self::Dropped => None,
        }
    }
}

/// Serializable node view
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeView {
    pub id: NodeId,
    pub label: String,
    #[serde(rename = "type")]
    pub kind: NodeKind,
}

/// Serializable edge view
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeView {
    pub id: EdgeId,
    pub source: NodeId,
    pub target: NodeId,
    pub relation: String,
    pub sources: Vec<String>,
}

/// Whole-graph snapshot for transport to a presentation layer
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphSnapshot {
    pub nodes: Vec<NodeView>,
    pub edges: Vec<EdgeView>,
}

impl From<&Node> for NodeView {
    fn from(node: &Node) -> Self {
        Self {
            id: node.id.clone(),
            label: node.label.clone(),
            kind: node.kind,
        }
    }
}

impl From<&Edge> for EdgeView {
    fn from(edge: &Edge) -> Self {
        Self {
            id: edge.id.clone(),
            source: edge.source.clone(),
            target: edge.target.clone(),
            relation: edge.relation.clone(),
            sources: edge.sources.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_unique() {
        assert_ne!(NodeId::new(), NodeId::new());
        assert_ne!(EdgeId::new(), EdgeId::new());
    }

    #[test]
    fn test_node_view_serializes_type_tag() {
        let node = Node {
            id: NodeId::new(),
            canonical: "rust".to_string(),
            label: "Rust".to_string(),
            kind: NodeKind::Entity,
        };
        let json = serde_json::to_value(NodeView::from(&node)).unwrap();
        assert_eq!(json["type"], "entity");
        assert_eq!(json["label"], "Rust");
        assert_eq!(json["id"], node.id.as_str());
    }

    #[test]
    fn test_upsert_outcome_edge_id() {
        let id = EdgeId::new();
        assert_eq!(UpsertOutcome::Merged(id.clone()).edge_id(), Some(&id));
        assert_eq!(UpsertOutcome::Dropped.edge_id(), None);
    }
}
