//! Template answers over a retrieved subgraph

use super::keywords::extract_keywords;
use crate::error::Result;
use crate::graph::{EdgeId, GraphStore, NodeId, RetrievalLimits, SharedGraph};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Answer returned when the graph has nothing to offer
pub const NO_INFORMATION_ANSWER: &str = "I don't have enough information to answer this question.";

const MAX_NAMED_NODES: usize = 3;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QaAnswer {
    pub answer: String,
    pub cited_nodes: Vec<NodeId>,
    pub cited_edges: Vec<EdgeId>,
}

impl QaAnswer {
    pub fn no_information() -> Self {
        Self {
            answer: NO_INFORMATION_ANSWER.to_string(),
            cited_nodes: Vec::new(),
            cited_edges: Vec::new(),
        }
    }
}

/// Answer a question from the shared graph
pub fn answer_question(question: &str, graph: &SharedGraph, limits: &RetrievalLimits) -> Result<QaAnswer> {
    let keywords = extract_keywords(question);
    debug!("QA keywords: {:?}", keywords);

    let subgraph = graph.subgraph_for_keywords(&keywords, limits)?;
    Ok(answer_from_subgraph(&keywords, &subgraph))
}

/// Render an answer from an already retrieved subgraph.
///
/// Names up to three nodes in subgraph order, which is relevance order
/// (keyword hits first, then path nodes, then neighbours) rather than graph
/// insertion order, so the named nodes are the ones the question matched.
/// Lists the facts whose relation mentions a keyword. Every node and edge of
/// the subgraph is cited.
pub fn answer_from_subgraph<S: AsRef<str>>(keywords: &[S], subgraph: &GraphStore) -> QaAnswer {
    if subgraph.is_empty() {
        return QaAnswer::no_information();
    }

    let labels: Vec<&str> = subgraph
        .nodes()
        .take(MAX_NAMED_NODES)
        .map(|node| node.label.as_str())
        .collect();
    let mut answer = format!(
        "Based on the knowledge graph, I found information about: {}.",
        labels.join(", ")
    );

    let facts: Vec<String> = subgraph
        .edges()
        .filter(|edge| {
            keywords
                .iter()
                .any(|k| edge.relation.contains(k.as_ref().to_lowercase().as_str()))
        })
        .filter_map(|edge| {
            let subject = subgraph.node(&edge.source)?;
            let object = subgraph.node(&edge.target)?;
            Some(format!(
                "{} {} {}",
                subject.label,
                edge.relation.replace('_', " "),
                object.label
            ))
        })
        .collect();
    if !facts.is_empty() {
        answer.push_str(&format!(" Related facts: {}.", facts.join("; ")));
    }

    QaAnswer {
        answer,
        cited_nodes: subgraph.nodes().map(|n| n.id.clone()).collect(),
        cited_edges: subgraph.edges().map(|e| e.id.clone()).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn graph() -> SharedGraph {
        let graph = SharedGraph::default();
        graph
            .upsert_triple("Rust", "uses", "LLVM", "a#chunk_0", 0.9)
            .unwrap();
        graph
            .upsert_triple("Rust", "is_a", "Programming Language", "a#chunk_0", 0.8)
            .unwrap();
        graph
    }

    #[test]
    fn test_empty_graph_gives_canned_answer() {
        let answer =
            answer_question("What is AI?", &SharedGraph::default(), &RetrievalLimits::default()).unwrap();
        assert_eq!(answer, QaAnswer::no_information());
    }

    #[test]
    fn test_answer_names_hits_and_cites_subgraph() {
        let graph = graph();
        let answer = answer_question("What does LLVM do?", &graph, &RetrievalLimits::default()).unwrap();

        assert!(answer
            .answer
            .starts_with("Based on the knowledge graph, I found information about: LLVM, Rust"));
        assert_eq!(answer.cited_nodes.len(), 3);
        assert_eq!(answer.cited_edges.len(), 2);
    }

    #[test]
    fn test_late_inserted_hit_is_named_first() {
        let graph = graph();
        graph
            .upsert_triple("Serde", "is_a", "Serialization Framework", "b#chunk_0", 0.8)
            .unwrap();

        let answer = answer_question("What is Serde?", &graph, &RetrievalLimits::default()).unwrap();

        assert_eq!(
            answer.answer,
            "Based on the knowledge graph, I found information about: Serde, Serialization Framework."
        );
        assert_eq!(answer.cited_nodes.len(), 2);
        assert_eq!(answer.cited_edges.len(), 1);
    }

    #[test]
    fn test_relation_keyword_lists_facts() {
        let graph = graph();
        let answer = answer_question("Which compiler uses LLVM?", &graph, &RetrievalLimits::default()).unwrap();
        assert!(answer.answer.contains("Related facts: Rust uses LLVM."));
        assert!(!answer.answer.contains("is a"));
    }
}
