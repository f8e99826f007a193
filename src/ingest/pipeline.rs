//! Fetch, chunk, extract, upsert

use super::chunker::chunk_text;
use super::fetcher::DocumentFetcher;
use crate::config::IngestConfig;
use crate::error::{Error, Result};
use crate::extraction::{ExtractedTriple, TripleExtractor, TripleFilter};
use crate::graph::{ApplyStats, SharedGraph};
use crate::metrics::METRICS;
use futures::stream::{self, StreamExt};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Source identifier attached to seed triples
pub const SEED_SOURCE: &str = "seed";

/// Triples inserted when a URL ingestion leaves the graph empty
pub const SEED_TRIPLES: [(&str, &str, &str, f32); 3] = [
    ("Artificial Intelligence", "defined_as", "Field of Computer Science", 1.0),
    ("Artificial Intelligence", "related_to", "Machine Learning", 0.9),
    ("Machine Learning", "subset_of", "Artificial Intelligence", 0.9),
];

fn seed_triples() -> Vec<ExtractedTriple> {
    SEED_TRIPLES
        .iter()
        .map(|&(subject, relation, object, confidence)| {
            ExtractedTriple::new(subject, relation, object, confidence, SEED_SOURCE)
        })
        .collect()
}

/// Summary of one ingestion request
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestReport {
    pub documents: usize,
    pub failed_documents: usize,
    pub chunks: usize,
    pub skipped_chunks: usize,
    pub triples: ApplyStats,
    pub seeded: bool,
    pub junk_removed: usize,
}

/// Drives documents from raw input into the shared graph
pub struct IngestPipeline {
    graph: SharedGraph,
    fetcher: Arc<dyn DocumentFetcher>,
    extractor: Arc<dyn TripleExtractor>,
    filter: TripleFilter,
    config: IngestConfig,
}

impl IngestPipeline {
    pub fn new(
        graph: SharedGraph,
        fetcher: Arc<dyn DocumentFetcher>,
        extractor: Arc<dyn TripleExtractor>,
        filter: TripleFilter,
        config: IngestConfig,
    ) -> Self {
        Self {
            graph,
            fetcher,
            extractor,
            filter,
            config,
        }
    }

    pub fn graph(&self) -> &SharedGraph {
        &self.graph
    }

    pub fn config(&self) -> &IngestConfig {
        &self.config
    }

    /// Ingest a list of URLs.
    ///
    /// Pages are fetched concurrently but applied in request order. A page
    /// that cannot be fetched is logged and contributes nothing.
    pub async fn ingest_urls(&self, urls: &[String]) -> Result<IngestReport> {
        let result = self.ingest_urls_inner(urls).await;
        METRICS.record_ingest("url", result.is_ok());
        result
    }

    async fn ingest_urls_inner(&self, urls: &[String]) -> Result<IngestReport> {
        let mut report = IngestReport::default();
        info!("Ingesting {} URLs", urls.len());

        let fetcher = self.fetcher.clone();
        let mut pages = stream::iter(urls.to_vec())
            .map(move |url| {
                let fetcher = fetcher.clone();
                async move {
                    let fetched = fetcher.fetch_text(&url).await;
                    (url, fetched)
                }
            })
            .buffered(self.config.max_concurrent_fetches.max(1));

        while let Some((url, fetched)) = pages.next().await {
            match fetched {
                Ok(text) => {
                    report.documents += 1;
                    self.ingest_document(&url, &text, &mut report).await?;
                }
                Err(e) => {
                    warn!("Skipping {}: {}", url, e);
                    report.failed_documents += 1;
                }
            }
        }

        if let Some(stats) = self.graph.apply_if_empty(&seed_triples())? {
            warn!("Graph empty after ingest; inserted seed triples");
            report.triples.absorb(stats);
            report.seeded = true;
        }

        self.finish(&mut report)?;
        Ok(report)
    }

    /// Ingest an uploaded text file
    pub async fn ingest_file(&self, filename: &str, content: &[u8]) -> Result<IngestReport> {
        let result = self.ingest_file_inner(filename, content).await;
        METRICS.record_ingest("file", result.is_ok());
        result
    }

    async fn ingest_file_inner(&self, filename: &str, content: &[u8]) -> Result<IngestReport> {
        if !filename.to_lowercase().ends_with(".txt") {
            return Err(Error::InvalidInput("Only TXT files supported for now".to_string()));
        }
        if content.len() > self.config.max_upload_bytes {
            return Err(Error::InvalidInput(format!(
                "File too large. Maximum size is {} bytes",
                self.config.max_upload_bytes
            )));
        }

        let text = String::from_utf8_lossy(content);
        if text.trim().is_empty() {
            return Err(Error::InvalidInput("No readable content found in file".to_string()));
        }

        let mut report = IngestReport {
            documents: 1,
            ..IngestReport::default()
        };
        self.ingest_document(filename, &text, &mut report).await?;
        self.finish(&mut report)?;
        Ok(report)
    }

    /// Chunk one document and apply each chunk's triples under `name#chunk_<i>`
    pub async fn ingest_document(&self, name: &str, text: &str, report: &mut IngestReport) -> Result<()> {
        let chunks = chunk_text(text, self.config.chunk_target, self.config.chunk_overlap);
        debug!("Chunked {}: count={}", name, chunks.len());

        for (i, chunk) in chunks.iter().enumerate() {
            let len = chunk.chars().count();
            if len > self.config.max_chunk_chars {
                info!("Skipping chunk {} from {}: too large ({} chars)", i, name, len);
                METRICS.chunks_skipped.inc();
                report.skipped_chunks += 1;
                continue;
            }

            let source_id = format!("{}#chunk_{}", name, i);
            let triples = match self.extractor.extract(chunk, &source_id).await {
                Ok(triples) => triples,
                Err(e) => {
                    warn!("Extraction failed for {}: {}", source_id, e);
                    Vec::new()
                }
            };
            let triples = self.filter.apply(triples);

            let stats = self.graph.apply_triples(&triples)?;
            METRICS.chunks_processed.inc();
            report.chunks += 1;
            report.triples.absorb(stats);
        }
        Ok(())
    }

    fn finish(&self, report: &mut IngestReport) -> Result<()> {
        if self.config.cleanup_after_ingest {
            report.junk_removed = self.graph.cleanup_junk_nodes()?;
        }
        let (nodes, edges) = self.graph.size()?;
        info!(
            "Ingest complete: documents={} chunks={} created={} merged={} nodes={} edges={}",
            report.documents,
            report.chunks,
            report.triples.created,
            report.triples.merged,
            nodes,
            edges
        );
        Ok(())
    }
}
