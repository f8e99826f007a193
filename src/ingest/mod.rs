//! Document ingestion: fetching, chunking and feeding extracted triples
//! into the shared graph

pub mod chunker;
pub mod fetcher;
pub mod pipeline;

pub use chunker::chunk_text;
pub use fetcher::{html_to_text, DocumentFetcher, HttpFetcher};
pub use pipeline::{IngestPipeline, IngestReport, SEED_SOURCE, SEED_TRIPLES};
