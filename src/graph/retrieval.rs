//! Keyword-driven subgraph retrieval
//!
//! A query selects "hit" nodes whose labels contain a keyword, grows them into
//! a neighbourhood (bounded undirected hops plus the shortest connecting chain
//! between every pair of hits), and caps the result deterministically. With no
//! hits a fixed-size sample of the graph is returned instead so the answering
//! layer always has something to cite.

use super::canonical::alias_of;
use super::models::{Edge, Node, NodeId};
use super::store::GraphStore;
use crate::error::{Error, Result};
use indexmap::IndexSet;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use tracing::debug;

/// Bounds applied to every subgraph query
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetrievalLimits {
    /// Undirected hop radius around each hit
    #[serde(default = "default_max_hops")]
    pub max_hops: usize,

    #[serde(default = "default_max_nodes")]
    pub max_nodes: usize,

    #[serde(default = "default_max_edges")]
    pub max_edges: usize,

    /// Sample size returned when no node matches
    #[serde(default = "default_fallback_nodes")]
    pub fallback_nodes: usize,

    /// Only the first N hits take part in pairwise shortest-path search
    #[serde(default = "default_max_path_seeds")]
    pub max_path_seeds: usize,
}

fn default_max_hops() -> usize {
    2
}

fn default_max_nodes() -> usize {
    25
}

fn default_max_edges() -> usize {
    40
}

fn default_fallback_nodes() -> usize {
    10
}

fn default_max_path_seeds() -> usize {
    10
}

impl Default for RetrievalLimits {
    fn default() -> Self {
        Self {
            max_hops: default_max_hops(),
            max_nodes: default_max_nodes(),
            max_edges: default_max_edges(),
            fallback_nodes: default_fallback_nodes(),
            max_path_seeds: default_max_path_seeds(),
        }
    }
}

/// Lowercased query terms, with alias targets for abbreviations
struct KeywordTerms {
    display: Vec<String>,
    canonical: Vec<String>,
}

impl KeywordTerms {
    fn new<S: AsRef<str>>(keywords: &[S]) -> Self {
        let mut display = Vec::new();
        let mut canonical = Vec::new();

        for keyword in keywords {
            let term = keyword.as_ref().trim().to_lowercase();
            if term.is_empty() {
                continue;
            }
            if let Some(alias) = alias_of(&term) {
                canonical.push(alias.to_string());
            }
            canonical.push(term.clone());
            display.push(term);
        }

        Self { display, canonical }
    }

    fn is_empty(&self) -> bool {
        self.display.is_empty()
    }

    fn matches(&self, node: &Node) -> bool {
        let label = node.label.to_lowercase();
        self.display.iter().any(|term| label.contains(term.as_str()))
            || self.canonical.iter().any(|term| node.canonical.contains(term.as_str()))
    }
}

type Adjacency<'a> = HashMap<&'a NodeId, Vec<&'a NodeId>>;

impl GraphStore {
    /// Select a bounded subgraph relevant to a set of keywords.
    ///
    /// The returned graph carries the original node and edge ids. Node order
    /// is relevance order: hits, then shortest-path nodes, then neighbours by
    /// hop distance. Identical graphs and keyword sets always produce the
    /// same result.
    pub fn subgraph_for_keywords<S: AsRef<str>>(
        &self,
        keywords: &[S],
        limits: &RetrievalLimits,
    ) -> Result<GraphStore> {
        if self.is_empty() {
            return Ok(GraphStore::new());
        }

        let terms = KeywordTerms::new(keywords);
        let hits: Vec<&NodeId> = if terms.is_empty() {
            Vec::new()
        } else {
            self.nodes()
                .filter(|node| terms.matches(node))
                .map(|node| &node.id)
                .collect()
        };

        let ranked: Vec<&NodeId> = if hits.is_empty() {
            debug!(
                "No keyword hits among {} nodes, sampling first {}",
                self.node_count(),
                limits.fallback_nodes
            );
            self.nodes()
                .take(limits.fallback_nodes)
                .map(|node| &node.id)
                .collect()
        } else {
            debug!("Keyword hits: {} of {} nodes", hits.len(), self.node_count());
            self.expand_hits(&hits, limits)
        };

        let selected: Vec<&NodeId> = ranked.into_iter().take(limits.max_nodes).collect();
        self.induced_subgraph(&selected, limits.max_edges)
    }

    fn undirected_adjacency(&self) -> Adjacency<'_> {
        let mut adjacency: Adjacency<'_> = HashMap::new();
        for edge in self.edges() {
            adjacency.entry(&edge.source).or_default().push(&edge.target);
            adjacency.entry(&edge.target).or_default().push(&edge.source);
        }
        adjacency
    }

    fn expand_hits<'a>(&'a self, hits: &[&'a NodeId], limits: &RetrievalLimits) -> Vec<&'a NodeId> {
        let adjacency = self.undirected_adjacency();
        let mut ranked: IndexSet<&NodeId> = hits.iter().copied().collect();

        let seeds = &hits[..hits.len().min(limits.max_path_seeds)];
        for (i, &from) in seeds.iter().enumerate() {
            for &to in &seeds[i + 1..] {
                if let Some(path) = shortest_path(&adjacency, from, to) {
                    ranked.extend(path);
                }
            }
        }

        let mut neighbours: Vec<(&NodeId, usize)> = hop_distances(&adjacency, hits, limits.max_hops)
            .into_iter()
            .filter(|(_, distance)| *distance > 0)
            .collect();
        neighbours.sort_by_key(|(id, distance)| {
            (*distance, self.node_position(id).unwrap_or(usize::MAX))
        });
        ranked.extend(neighbours.into_iter().map(|(id, _)| id));

        ranked.into_iter().collect()
    }

    fn induced_subgraph(&self, selected: &[&NodeId], max_edges: usize) -> Result<GraphStore> {
        let rank: HashMap<&NodeId, usize> = selected
            .iter()
            .enumerate()
            .map(|(position, id)| (*id, position))
            .collect();

        let mut subgraph = GraphStore::new();
        for id in selected {
            let node = self.node(id).ok_or_else(|| {
                Error::Internal(format!("subgraph references unknown node {}", id))
            })?;
            subgraph.insert_node(node.clone());
        }

        let mut candidates: Vec<(usize, usize, &Edge)> = self
            .edges()
            .enumerate()
            .filter_map(|(position, edge)| {
                let source = rank.get(&edge.source)?;
                let target = rank.get(&edge.target)?;
                Some(((*source).max(*target), position, edge))
            })
            .collect();
        candidates.sort_by_key(|(priority, position, _)| (*priority, *position));

        for (_, _, edge) in candidates.into_iter().take(max_edges) {
            subgraph.insert_edge(edge.clone());
        }

        Ok(subgraph)
    }
}

/// Breadth-first shortest path over undirected adjacency, endpoints included
fn shortest_path<'a>(
    adjacency: &Adjacency<'a>,
    from: &'a NodeId,
    to: &'a NodeId,
) -> Option<Vec<&'a NodeId>> {
    if from == to {
        return Some(vec![from]);
    }

    let mut parents: HashMap<&NodeId, &NodeId> = HashMap::new();
    let mut queue = VecDeque::new();
    queue.push_back(from);
    parents.insert(from, from);

    while let Some(current) = queue.pop_front() {
        let Some(neighbours) = adjacency.get(current) else {
            continue;
        };
        for &next in neighbours {
            if parents.contains_key(next) {
                continue;
            }
            parents.insert(next, current);
            if next == to {
                let mut path = vec![to];
                let mut cursor = to;
                while cursor != from {
                    cursor = *parents.get(cursor)?;
                    path.push(cursor);
                }
                path.reverse();
                return Some(path);
            }
            queue.push_back(next);
        }
    }

    None
}

/// Multi-source BFS distances up to `max_hops`, seeds at distance zero
fn hop_distances<'a>(
    adjacency: &Adjacency<'a>,
    seeds: &[&'a NodeId],
    max_hops: usize,
) -> HashMap<&'a NodeId, usize> {
    let mut distances: HashMap<&NodeId, usize> = HashMap::new();
    let mut queue = VecDeque::new();

    for &seed in seeds {
        if distances.insert(seed, 0).is_none() {
            queue.push_back((seed, 0usize));
        }
    }

    while let Some((current, depth)) = queue.pop_front() {
        if depth >= max_hops {
            continue;
        }
        let Some(neighbours) = adjacency.get(current) else {
            continue;
        };
        for &next in neighbours {
            if !distances.contains_key(next) {
                distances.insert(next, depth + 1);
                queue.push_back((next, depth + 1));
            }
        }
    }

    distances
}
