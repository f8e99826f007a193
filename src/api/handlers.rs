//! HTTP handlers

use super::models::*;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::extraction::{build_extractor, TripleFilter};
use crate::graph::{GraphSnapshot, RetrievalLimits, SharedGraph};
use crate::ingest::{HttpFetcher, IngestPipeline};
use crate::metrics::METRICS;
use crate::qa::{answer_question, QaAnswer};
use axum::{
    extract::{Multipart, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, warn};

type ApiResult<T> = std::result::Result<Json<T>, (StatusCode, Json<ApiError>)>;

/// Shared state for all routes
#[derive(Clone)]
pub struct AppState {
    pub graph: SharedGraph,
    pub pipeline: Arc<IngestPipeline>,
    pub limits: RetrievalLimits,
}

impl AppState {
    pub fn new(pipeline: Arc<IngestPipeline>, limits: RetrievalLimits) -> Self {
        Self {
            graph: pipeline.graph().clone(),
            pipeline,
            limits,
        }
    }

    /// Wire the graph, fetcher and extractor chain from configuration
    pub fn from_config(config: &Config) -> Result<Self> {
        let graph = SharedGraph::default();
        let fetcher = HttpFetcher::new(&config.ingest)?;
        let extractor = build_extractor(&config.extraction);
        let pipeline = IngestPipeline::new(
            graph,
            Arc::new(fetcher),
            Arc::new(extractor),
            TripleFilter::from(&config.extraction),
            config.ingest.clone(),
        );
        Ok(Self::new(Arc::new(pipeline), config.graph.clone()))
    }
}

fn validation_error(message: impl Into<String>) -> (StatusCode, Json<ApiError>) {
    (
        StatusCode::BAD_REQUEST,
        Json(ApiError::new(error_codes::VALIDATION_ERROR, message)),
    )
}

/// Map a crate error onto a status code and error body
fn error_response(err: Error) -> (StatusCode, Json<ApiError>) {
    let (status, code) = match &err {
        Error::InvalidInput(_) => (StatusCode::BAD_REQUEST, error_codes::VALIDATION_ERROR),
        Error::Fetch { .. } => (StatusCode::BAD_GATEWAY, error_codes::FETCH_ERROR),
        Error::Extraction(_) => (StatusCode::BAD_GATEWAY, error_codes::EXTRACTION_ERROR),
        Error::Config(_) | Error::Internal(_) | Error::Io(_) => {
            error!("Request failed: {}", err);
            (StatusCode::INTERNAL_SERVER_ERROR, error_codes::INTERNAL_ERROR)
        }
    };
    let message = match err {
        Error::InvalidInput(message) => message,
        other => other.to_string(),
    };
    (status, Json(ApiError::new(code, message)))
}

/// GET /
pub async fn root() -> Json<RootResponse> {
    Json(RootResponse {
        message: "Universal Knowledge Graph API".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// GET /health
pub async fn health(State(state): State<AppState>) -> ApiResult<HealthResponse> {
    let (nodes, edges) = state.graph.size().map_err(error_response)?;
    Ok(Json(HealthResponse {
        status: "healthy".to_string(),
        nodes,
        edges,
        timestamp: Utc::now(),
    }))
}

/// GET /metrics
pub async fn metrics() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        METRICS.export_prometheus(),
    )
}

/// Fetch and ingest web pages
///
/// POST /api/ingest
pub async fn ingest_urls(
    State(state): State<AppState>,
    Json(request): Json<IngestRequest>,
) -> ApiResult<GraphSnapshot> {
    let start = Instant::now();
    info!("Ingest request: urls={}", request.urls.len());

    if request.urls.len() > MAX_URLS_PER_REQUEST {
        METRICS.record_request("ingest", start);
        return Err(validation_error(format!(
            "At most {} URLs per request",
            MAX_URLS_PER_REQUEST
        )));
    }

    let urls: Vec<String> = request.urls.iter().map(|u| u.trim().to_string()).collect();
    if let Some(bad) = urls
        .iter()
        .find(|u| !(u.starts_with("http://") || u.starts_with("https://")))
    {
        METRICS.record_request("ingest", start);
        return Err(validation_error(format!("Invalid URL: {:?}", bad)));
    }

    let result = state.pipeline.ingest_urls(&urls).await.and_then(|report| {
        info!(
            "Ingest finished: documents={} failed={} seeded={}",
            report.documents, report.failed_documents, report.seeded
        );
        state.graph.snapshot()
    });
    METRICS.record_request("ingest", start);

    result.map(Json).map_err(error_response)
}

/// Ingest an uploaded `.txt` file from the multipart field `file`
///
/// POST /api/ingest-file
pub async fn ingest_file(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> ApiResult<GraphSnapshot> {
    let start = Instant::now();

    let mut upload = None;
    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => {
                METRICS.record_request("ingest_file", start);
                return Err(validation_error(format!("Invalid multipart body: {}", e)));
            }
        };
        if field.name() != Some("file") {
            continue;
        }

        let filename = field.file_name().unwrap_or_default().to_string();
        match field.bytes().await {
            Ok(bytes) => upload = Some((filename, bytes)),
            Err(e) => {
                METRICS.record_request("ingest_file", start);
                return Err(validation_error(format!("Failed to read upload: {}", e)));
            }
        }
        break;
    }

    let Some((filename, bytes)) = upload else {
        METRICS.record_request("ingest_file", start);
        return Err(validation_error("Missing multipart field \"file\""));
    };
    info!("File ingest request: filename={} bytes={}", filename, bytes.len());

    let result = state
        .pipeline
        .ingest_file(&filename, &bytes)
        .await
        .and_then(|_| state.graph.snapshot());
    METRICS.record_request("ingest_file", start);

    result.map(Json).map_err(|e| {
        warn!("File ingest rejected: {}", e);
        error_response(e)
    })
}

/// GET /api/graph
pub async fn get_graph(State(state): State<AppState>) -> ApiResult<GraphSnapshot> {
    state.graph.snapshot().map(Json).map_err(error_response)
}

/// Answer a question from the graph
///
/// POST /api/qa
pub async fn answer(
    State(state): State<AppState>,
    Json(request): Json<QaRequest>,
) -> ApiResult<QaAnswer> {
    let start = Instant::now();
    let question = request.question.trim();

    if question.is_empty() {
        METRICS.record_qa(false);
        METRICS.record_request("qa", start);
        return Err(validation_error("Question cannot be empty"));
    }
    if question.chars().count() > MAX_QUESTION_CHARS {
        METRICS.record_qa(false);
        METRICS.record_request("qa", start);
        return Err(validation_error(format!(
            "Question cannot exceed {} characters",
            MAX_QUESTION_CHARS
        )));
    }

    let result = answer_question(question, &state.graph, &state.limits);
    METRICS.record_qa(result.is_ok());
    METRICS.record_request("qa", start);

    match result {
        Ok(answer) => {
            info!(
                "QA answered: cited_nodes={} cited_edges={}",
                answer.cited_nodes.len(),
                answer.cited_edges.len()
            );
            Ok(Json(answer))
        }
        Err(e) => Err(error_response(e)),
    }
}

/// Prune junk nodes
///
/// POST /api/graph/cleanup
pub async fn cleanup_graph(State(state): State<AppState>) -> ApiResult<CleanupResponse> {
    let removed = state.graph.cleanup_junk_nodes().map_err(error_response)?;
    let (nodes, edges) = state.graph.size().map_err(error_response)?;
    Ok(Json(CleanupResponse {
        removed,
        nodes,
        edges,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_response_status_codes() {
        let (status, body) = error_response(Error::InvalidInput("bad upload".to_string()));
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body.code, error_codes::VALIDATION_ERROR);
        assert_eq!(body.message, "bad upload");

        let (status, _) = error_response(Error::fetch("https://x.example", "timeout"));
        assert_eq!(status, StatusCode::BAD_GATEWAY);

        let (status, body) = error_response(Error::Internal("missing node".to_string()));
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body.code, error_codes::INTERNAL_ERROR);
    }

    #[tokio::test]
    async fn test_state_from_default_config() {
        let state = AppState::from_config(&Config::default()).unwrap();
        assert!(state.graph.is_empty().unwrap());
        assert_eq!(state.limits, RetrievalLimits::default());
    }
}
