//! Integration tests for graph accumulation and keyword subgraph retrieval

use knowledge_graph::graph::{GraphStore, RetrievalLimits};

fn sample_graph() -> GraphStore {
    // AI -> Machine Learning -> Neural Networks
    // AI -> Natural Language Processing -> Text
    // AI -> Computer Vision -> Images
    // Machine Learning -> Deep Learning
    // Neural Networks -> Deep Learning
    let triples = [
        ("AI", "includes", "Machine Learning"),
        ("AI", "includes", "Natural Language Processing"),
        ("AI", "includes", "Computer Vision"),
        ("Machine Learning", "includes", "Neural Networks"),
        ("Machine Learning", "includes", "Deep Learning"),
        ("Neural Networks", "enables", "Deep Learning"),
        ("Natural Language Processing", "processes", "Text"),
        ("Computer Vision", "processes", "Images"),
        ("Deep Learning", "uses", "Neural Networks"),
        ("Text", "contains", "Language"),
        ("Images", "contains", "Visual Data"),
    ];

    let mut graph = GraphStore::new();
    for (subject, relation, object) in triples {
        graph.upsert_triple(subject, relation, object, "source1", 0.8);
    }
    graph
}

fn labels(graph: &GraphStore) -> Vec<&str> {
    graph.nodes().map(|n| n.label.as_str()).collect()
}

fn relations(graph: &GraphStore) -> Vec<&str> {
    graph.edges().map(|e| e.relation.as_str()).collect()
}

fn subgraph(graph: &GraphStore, keywords: &[&str]) -> GraphStore {
    graph
        .subgraph_for_keywords(keywords, &RetrievalLimits::default())
        .unwrap()
}

#[test]
fn test_repeated_triple_is_deduplicated() {
    let mut graph = GraphStore::new();
    graph.upsert_triple("Rust", "uses", "LLVM", "a#chunk_0", 0.6);
    graph.upsert_triple("Rust", "uses", "LLVM", "b#chunk_3", 0.9);

    assert_eq!(graph.node_count(), 2);
    assert_eq!(graph.edge_count(), 1);
    let edge = graph.edges().next().unwrap();
    assert_eq!(edge.sources, vec!["a#chunk_0", "b#chunk_3"]);
    assert_eq!(edge.confidence, 0.9);
}

#[test]
fn test_label_variants_share_a_node() {
    let mut graph = GraphStore::new();
    graph.upsert_triple("AI", "uses", "Data", "s1", 0.5);
    graph.upsert_triple("artificial intelligence", "uses", "Data", "s2", 0.5);
    graph.upsert_triple(" Artificial   Intelligence ", "uses", "Data", "s3", 0.5);

    assert_eq!(graph.node_count(), 2);
    assert_eq!(graph.edge_count(), 1);
    assert_eq!(graph.find_node("ai").unwrap().label, "AI");
    assert_eq!(graph.edges().next().unwrap().sources.len(), 3);
}

#[test]
fn test_concrete_ai_deep_learning_scenario() {
    let mut graph = GraphStore::new();
    graph.upsert_triple("AI", "includes", "ML", "seed", 1.0);
    graph.upsert_triple("ML", "includes", "DeepLearning", "seed", 1.0);
    graph.upsert_triple("DeepLearning", "uses", "NeuralNetworks", "seed", 1.0);

    let result = subgraph(&graph, &["ai", "deep", "learning"]);
    let node_labels = labels(&result);
    for expected in ["AI", "ML", "DeepLearning"] {
        assert!(node_labels.contains(&expected), "missing {}", expected);
    }
    let includes = relations(&result).iter().filter(|r| **r == "includes").count();
    assert_eq!(includes, 2);
}

#[test]
fn test_two_related_hits_include_path_and_neighbours() {
    let graph = sample_graph();
    let result = subgraph(&graph, &["ai", "machine", "learning"]);
    let node_labels = labels(&result);

    assert!(node_labels.contains(&"AI"));
    assert!(node_labels.contains(&"Machine Learning"));
    assert!(node_labels.contains(&"Neural Networks"));
    assert!(node_labels.contains(&"Deep Learning"));
    assert!(relations(&result).contains(&"includes"));
}

#[test]
fn test_path_between_distant_hits() {
    let mut graph = GraphStore::new();
    graph.upsert_triple("Alpha", "links", "Bravo", "s", 0.5);
    graph.upsert_triple("Bravo", "links", "Charlie", "s", 0.5);
    graph.upsert_triple("Charlie", "links", "Delta", "s", 0.5);
    graph.upsert_triple("Delta", "links", "Echo", "s", 0.5);
    graph.upsert_triple("Echo", "links", "Foxtrot", "s", 0.5);

    let limits = RetrievalLimits {
        max_hops: 1,
        ..RetrievalLimits::default()
    };
    let result = graph.subgraph_for_keywords(&["alpha", "foxtrot"], &limits).unwrap();

    assert_eq!(
        labels(&result),
        vec!["Alpha", "Foxtrot", "Bravo", "Charlie", "Delta", "Echo"]
    );
    assert_eq!(result.edge_count(), 5);
}

#[test]
fn test_single_hit_expands_two_hops() {
    let graph = sample_graph();
    let result = subgraph(&graph, &["neural", "networks"]);
    let node_labels = labels(&result);

    assert_eq!(node_labels[0], "Neural Networks");
    assert!(node_labels.contains(&"Machine Learning"));
    assert!(node_labels.contains(&"Deep Learning"));
    assert!(node_labels.contains(&"AI"));
    assert!(!node_labels.contains(&"Visual Data"));
}

#[test]
fn test_no_hits_returns_bounded_fallback() {
    let graph = sample_graph();
    let result = subgraph(&graph, &["xyz", "unknown", "term"]);

    assert!(result.node_count() > 0);
    assert!(result.node_count() <= 25);
    assert!(result.edge_count() <= 40);
}

#[test]
fn test_relation_only_keyword_falls_back_to_sample() {
    let graph = sample_graph();
    let result = subgraph(&graph, &["includes"]);

    assert!(relations(&result).contains(&"includes"));
    let node_labels = labels(&result);
    assert!(node_labels.contains(&"AI"));
    assert!(node_labels.contains(&"Machine Learning"));
}

#[test]
fn test_alias_keyword_finds_canonical_node() {
    let graph = sample_graph();
    let result = subgraph(&graph, &["ml"]);
    assert_eq!(labels(&result)[0], "Machine Learning");
}

#[test]
fn test_large_chain_is_capped() {
    let mut graph = GraphStore::new();
    for i in 0..50 {
        graph.upsert_triple(&format!("Node{}", i), "connects", &format!("Node{}", i + 1), "source", 0.5);
    }
    assert_eq!(graph.node_count(), 51);

    let result = subgraph(&graph, &["node"]);
    assert_eq!(result.node_count(), 25);
    assert!(result.edge_count() <= 40);
    assert_eq!(labels(&result)[0], "Node0");
}

#[test]
fn test_retrieval_is_deterministic() {
    let graph = sample_graph();
    let keywords = ["learning", "text"];

    let first = subgraph(&graph, &keywords);
    let second = subgraph(&graph, &keywords);

    let ids = |g: &GraphStore| {
        (
            g.nodes().map(|n| n.id.clone()).collect::<Vec<_>>(),
            g.edges().map(|e| e.id.clone()).collect::<Vec<_>>(),
        )
    };
    assert_eq!(ids(&first), ids(&second));
}

#[test]
fn test_empty_graph_returns_empty_subgraph() {
    let graph = GraphStore::new();
    let result = subgraph(&graph, &["anything"]);
    assert!(result.is_empty());
    assert_eq!(result.edge_count(), 0);
}

#[test]
fn test_subgraph_edges_keep_provenance_and_ids() {
    let graph = sample_graph();
    let result = subgraph(&graph, &["images"]);

    for edge in result.edges() {
        let original = graph.edge(&edge.id).unwrap();
        assert_eq!(original.sources, edge.sources);
        assert!(result.node(&edge.source).is_some());
        assert!(result.node(&edge.target).is_some());
    }
}

#[test]
fn test_cleanup_removes_junk_nodes_with_edges() {
    let mut graph = sample_graph();
    graph.upsert_triple("it", "uses", "Text", "noise", 0.4);
    graph.upsert_triple("Images", "related_to", "things", "noise", 0.4);
    let edges_before = graph.edge_count();

    let removed = graph.cleanup_junk_nodes();

    assert_eq!(removed, 2);
    assert!(graph.find_node("it").is_none());
    assert!(graph.find_node("things").is_none());
    assert_eq!(graph.edge_count(), edges_before - 2);
}
