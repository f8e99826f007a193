//! Metrics collection for observability

use crate::graph::UpsertOutcome;
use once_cell::sync::Lazy;
use prometheus::{
    register_counter_vec_with_registry, register_counter_with_registry,
    register_histogram_vec_with_registry, register_histogram_with_registry,
    register_int_gauge_with_registry, Counter, CounterVec, Histogram, HistogramOpts,
    HistogramVec, IntGauge, Opts, Registry,
};
use std::sync::Arc;

/// Global metrics registry
pub static METRICS: Lazy<Arc<Metrics>> = Lazy::new(|| {
    Arc::new(Metrics::new().expect("Failed to initialize metrics"))
});

/// Metrics collector
pub struct Metrics {
    registry: Registry,

    // Ingestion metrics
    pub ingest_requests: CounterVec,
    pub chunks_processed: Counter,
    pub chunks_skipped: Counter,
    pub extractor_fallbacks: Counter,
    pub extraction_duration: HistogramVec,

    // Graph metrics
    pub triples_upserted: CounterVec,
    pub junk_nodes_removed: Counter,
    pub graph_nodes: IntGauge,
    pub graph_edges: IntGauge,

    // QA metrics
    pub qa_requests: CounterVec,
    pub subgraph_nodes: Histogram,
    pub subgraph_edges: Histogram,

    // HTTP metrics
    pub request_duration: HistogramVec,
}

impl Metrics {
    /// Create a new metrics collector
    pub fn new() -> Result<Self, Box<dyn std::error::Error>> {
        let registry = Registry::new();

        let ingest_requests = register_counter_vec_with_registry!(
            Opts::new("kg_ingest_requests_total", "Total ingestion requests"),
            &["kind", "status"],
            registry
        )?;

        let chunks_processed = register_counter_with_registry!(
            Opts::new("kg_chunks_processed_total", "Text chunks sent to extraction"),
            registry
        )?;

        let chunks_skipped = register_counter_with_registry!(
            Opts::new("kg_chunks_skipped_total", "Text chunks skipped as oversized"),
            registry
        )?;

        let extractor_fallbacks = register_counter_with_registry!(
            Opts::new(
                "kg_extractor_fallbacks_total",
                "LLM extractions that fell back to rule-based extraction"
            ),
            registry
        )?;

        let extraction_duration = register_histogram_vec_with_registry!(
            "kg_extraction_duration_seconds",
            "Triple extraction duration in seconds",
            &["extractor"],
            registry
        )?;

        let triples_upserted = register_counter_vec_with_registry!(
            Opts::new("kg_triples_upserted_total", "Triples applied to the graph"),
            &["outcome"],
            registry
        )?;

        let junk_nodes_removed = register_counter_with_registry!(
            Opts::new("kg_junk_nodes_removed_total", "Nodes pruned by junk cleanup"),
            registry
        )?;

        let graph_nodes = register_int_gauge_with_registry!(
            Opts::new("kg_graph_nodes", "Current node count"),
            registry
        )?;

        let graph_edges = register_int_gauge_with_registry!(
            Opts::new("kg_graph_edges", "Current edge count"),
            registry
        )?;

        let qa_requests = register_counter_vec_with_registry!(
            Opts::new("kg_qa_requests_total", "Total question answering requests"),
            &["status"],
            registry
        )?;

        let size_buckets = vec![0.0, 1.0, 5.0, 10.0, 15.0, 20.0, 25.0, 30.0, 40.0];

        let subgraph_nodes = register_histogram_with_registry!(
            HistogramOpts::new("kg_subgraph_nodes", "Nodes per retrieved subgraph")
                .buckets(size_buckets.clone()),
            registry
        )?;

        let subgraph_edges = register_histogram_with_registry!(
            HistogramOpts::new("kg_subgraph_edges", "Edges per retrieved subgraph")
                .buckets(size_buckets),
            registry
        )?;

        let request_duration = register_histogram_vec_with_registry!(
            "kg_request_duration_seconds",
            "HTTP request duration in seconds",
            &["endpoint"],
            registry
        )?;

        Ok(Self {
            registry,
            ingest_requests,
            chunks_processed,
            chunks_skipped,
            extractor_fallbacks,
            extraction_duration,
            triples_upserted,
            junk_nodes_removed,
            graph_nodes,
            graph_edges,
            qa_requests,
            subgraph_nodes,
            subgraph_edges,
            request_duration,
        })
    }

    /// Get the metrics registry for exporting
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Record an ingestion request
    pub fn record_ingest(&self, kind: &str, success: bool) {
        let status = if success { "success" } else { "error" };
        self.ingest_requests.with_label_values(&[kind, status]).inc();
    }

    /// Record the outcome of one upsert
    pub fn record_upsert(&self, outcome: &UpsertOutcome) {
        let label = match outcome {
            UpsertOutcome::Created(_) => "created",
            UpsertOutcome::Merged(_) => "merged",
            UpsertOutcome::Dropped => "dropped",
        };
        self.triples_upserted.with_label_values(&[label]).inc();
    }

    /// Update graph size gauges
    pub fn record_graph_size(&self, nodes: usize, edges: usize) {
        self.graph_nodes.set(nodes as i64);
        self.graph_edges.set(edges as i64);
    }

    /// Record a retrieved subgraph
    pub fn record_subgraph(&self, nodes: usize, edges: usize) {
        self.subgraph_nodes.observe(nodes as f64);
        self.subgraph_edges.observe(edges as f64);
    }

    /// Record a QA request
    pub fn record_qa(&self, success: bool) {
        let status = if success { "success" } else { "error" };
        self.qa_requests.with_label_values(&[status]).inc();
    }

    /// Record how long an HTTP endpoint took
    pub fn record_request(&self, endpoint: &str, start: std::time::Instant) {
        self.request_duration
            .with_label_values(&[endpoint])
            .observe(start.elapsed().as_secs_f64());
    }

    /// Export metrics in Prometheus text format
    pub fn export_prometheus(&self) -> String {
        use prometheus::Encoder;

        let encoder = prometheus::TextEncoder::new();
        let metric_families = self.registry.gather();

        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer).unwrap_or_default();

        String::from_utf8(buffer).unwrap_or_default()
    }
}
