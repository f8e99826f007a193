//! Layered service configuration
//!
//! Sources, lowest precedence first:
//! 1. built-in defaults
//! 2. optional TOML file (`config.toml`, or the path in `KG_CONFIG`)
//! 3. `KG__SECTION__KEY` environment variables
//! 4. well-known variables (`OPENAI_API_KEY`, `OPENAI_MODEL`, `OPENAI_BASE_URL`, `PORT`)

use crate::error::{Error, Result};
use crate::graph::RetrievalLimits;
use secrecy::SecretString;
use serde::Deserialize;
use std::time::Duration;

/// Environment variable naming an alternate config file
pub const CONFIG_PATH_ENV: &str = "KG_CONFIG";

const DEFAULT_CONFIG_PATH: &str = "config.toml";

/// Top-level configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub graph: RetrievalLimits,

    #[serde(default)]
    pub extraction: ExtractionConfig,

    #[serde(default)]
    pub ingest: IngestConfig,
}

/// HTTP listener settings
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Request body limit applied to every route
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_max_body_bytes() -> usize {
    6 * 1024 * 1024
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

impl ServerConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Default filter directive; `RUST_LOG` takes precedence
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default)]
    pub format: LogFormat,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

/// Triple extraction settings
#[derive(Debug, Clone, Deserialize)]
pub struct ExtractionConfig {
    /// LLM API key; rule-based extraction is used when absent
    #[serde(default)]
    pub api_key: Option<SecretString>,

    /// OpenAI-compatible chat completions endpoint
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: usize,

    /// Request timeout in milliseconds
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    #[serde(default = "default_max_retries")]
    pub max_retries: usize,

    /// Base backoff in milliseconds, doubled per attempt
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,

    /// Text beyond this many characters is not sent to the model
    #[serde(default = "default_max_input_chars")]
    pub max_input_chars: usize,

    #[serde(default = "default_max_triples")]
    pub max_triples: usize,

    /// Triples below this confidence are discarded
    #[serde(default = "default_min_confidence")]
    pub min_confidence: f32,

    /// Discard LLM relations outside the canonical relation vocabulary
    #[serde(default)]
    pub strict_relations: bool,

    #[serde(default = "default_breaker_failures")]
    pub circuit_breaker_failures: usize,

    #[serde(default = "default_breaker_reset")]
    pub circuit_breaker_reset_secs: u64,
}

fn default_endpoint() -> String {
    "https://api.openai.com/v1/chat/completions".to_string()
}

fn default_model() -> String {
    "gpt-3.5-turbo".to_string()
}

fn default_temperature() -> f32 {
    0.1
}

fn default_max_tokens() -> usize {
    1000
}

fn default_timeout_ms() -> u64 {
    30_000
}

fn default_max_retries() -> usize {
    2
}

fn default_retry_backoff_ms() -> u64 {
    200
}

fn default_max_input_chars() -> usize {
    3500
}

fn default_max_triples() -> usize {
    8
}

fn default_min_confidence() -> f32 {
    0.3
}

fn default_breaker_failures() -> usize {
    5
}

fn default_breaker_reset() -> u64 {
    30
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            endpoint: default_endpoint(),
            model: default_model(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            timeout_ms: default_timeout_ms(),
            max_retries: default_max_retries(),
            retry_backoff_ms: default_retry_backoff_ms(),
            max_input_chars: default_max_input_chars(),
            max_triples: default_max_triples(),
            min_confidence: default_min_confidence(),
            strict_relations: false,
            circuit_breaker_failures: default_breaker_failures(),
            circuit_breaker_reset_secs: default_breaker_reset(),
        }
    }
}

impl ExtractionConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn retry_backoff(&self) -> Duration {
        Duration::from_millis(self.retry_backoff_ms)
    }

    pub fn circuit_breaker_reset(&self) -> Duration {
        Duration::from_secs(self.circuit_breaker_reset_secs)
    }

    /// Whether an LLM extractor can be built
    pub fn llm_enabled(&self) -> bool {
        self.api_key.is_some()
    }
}

/// Document ingestion settings
#[derive(Debug, Clone, Deserialize)]
pub struct IngestConfig {
    /// Target chunk length in characters
    #[serde(default = "default_chunk_target")]
    pub chunk_target: usize,

    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: usize,

    /// Chunks longer than this are skipped
    #[serde(default = "default_max_chunk_chars")]
    pub max_chunk_chars: usize,

    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,

    #[serde(default = "default_fetch_timeout_secs")]
    pub fetch_timeout_secs: u64,

    /// Response bodies above this size are rejected
    #[serde(default = "default_max_html_bytes")]
    pub max_html_bytes: usize,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    #[serde(default = "default_max_concurrent_fetches")]
    pub max_concurrent_fetches: usize,

    /// Prune junk nodes after every ingestion request
    #[serde(default = "default_cleanup_after_ingest")]
    pub cleanup_after_ingest: bool,
}

fn default_chunk_target() -> usize {
    1800
}

fn default_chunk_overlap() -> usize {
    200
}

fn default_max_chunk_chars() -> usize {
    4000
}

fn default_max_upload_bytes() -> usize {
    5 * 1024 * 1024
}

fn default_fetch_timeout_secs() -> u64 {
    15
}

fn default_max_html_bytes() -> usize {
    10 * 1024 * 1024
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36".to_string()
}

fn default_max_concurrent_fetches() -> usize {
    4
}

fn default_cleanup_after_ingest() -> bool {
    true
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            chunk_target: default_chunk_target(),
            chunk_overlap: default_chunk_overlap(),
            max_chunk_chars: default_max_chunk_chars(),
            max_upload_bytes: default_max_upload_bytes(),
            fetch_timeout_secs: default_fetch_timeout_secs(),
            max_html_bytes: default_max_html_bytes(),
            user_agent: default_user_agent(),
            max_concurrent_fetches: default_max_concurrent_fetches(),
            cleanup_after_ingest: default_cleanup_after_ingest(),
        }
    }
}

impl IngestConfig {
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }
}

impl Config {
    /// Load from the default file location (or `KG_CONFIG`) plus environment
    pub fn load() -> Result<Self> {
        let path = std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        Self::from_file(&path)
    }

    /// Load from a specific file (missing files are tolerated) plus environment
    pub fn from_file(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path).required(false))
            .add_source(
                config::Environment::with_prefix("KG")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: Config = settings.try_deserialize()?;
        let config = config.from_env();
        config.validate()?;
        Ok(config)
    }

    /// Apply well-known environment variables on top of loaded values
    pub fn from_env(mut self) -> Self {
        if let Ok(val) = std::env::var("OPENAI_API_KEY") {
            if !val.trim().is_empty() {
                self.extraction.api_key = Some(SecretString::new(val));
            }
        }

        if let Ok(val) = std::env::var("OPENAI_MODEL") {
            self.extraction.model = val;
        }

        if let Ok(val) = std::env::var("OPENAI_BASE_URL") {
            self.extraction.endpoint = format!("{}/chat/completions", val.trim_end_matches('/'));
        }

        if let Ok(val) = std::env::var("PORT") {
            if let Ok(port) = val.parse() {
                self.server.port = port;
            }
        }

        self
    }

    /// Reject settings the service cannot run with
    pub fn validate(&self) -> Result<()> {
        let graph = &self.graph;
        if graph.max_nodes == 0 || graph.max_edges == 0 || graph.fallback_nodes == 0 {
            return Err(Error::Config("graph caps must be greater than zero".to_string()));
        }
        if graph.max_path_seeds < 2 {
            return Err(Error::Config("graph.max_path_seeds must be at least 2".to_string()));
        }

        let ingest = &self.ingest;
        if ingest.chunk_target == 0 {
            return Err(Error::Config("ingest.chunk_target must be greater than zero".to_string()));
        }
        if ingest.chunk_overlap >= ingest.chunk_target {
            return Err(Error::Config(format!(
                "ingest.chunk_overlap ({}) must be smaller than ingest.chunk_target ({})",
                ingest.chunk_overlap, ingest.chunk_target
            )));
        }
        if ingest.max_concurrent_fetches == 0 {
            return Err(Error::Config(
                "ingest.max_concurrent_fetches must be greater than zero".to_string(),
            ));
        }

        let extraction = &self.extraction;
        if !(0.0..=1.0).contains(&extraction.min_confidence) {
            return Err(Error::Config("extraction.min_confidence must be within [0, 1]".to_string()));
        }
        if extraction.max_retries == 0 {
            return Err(Error::Config("extraction.max_retries must be at least 1".to_string()));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.server.port, 8000);
        assert_eq!(config.graph.max_hops, 2);
        assert_eq!(config.graph.max_nodes, 25);
        assert_eq!(config.graph.max_edges, 40);
        assert_eq!(config.graph.fallback_nodes, 10);
        assert_eq!(config.graph.max_path_seeds, 10);
        assert_eq!(config.server.max_body_bytes, 6 * 1024 * 1024);
        assert_eq!(config.extraction.max_input_chars, 3500);
        assert_eq!(config.extraction.min_confidence, 0.3);
        assert_eq!(config.ingest.max_concurrent_fetches, 4);
        assert!(config.ingest.user_agent.starts_with("Mozilla/5.0"));
        assert_eq!(config.ingest.chunk_target, 1800);
        assert_eq!(config.ingest.chunk_overlap, 200);
        assert_eq!(config.extraction.max_triples, 8);
        assert!(config.ingest.cleanup_after_ingest);
        assert!(!config.extraction.llm_enabled());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_duration_getters() {
        let config = ExtractionConfig::default();
        assert_eq!(config.timeout(), Duration::from_secs(30));
        assert_eq!(config.retry_backoff(), Duration::from_millis(200));
        assert_eq!(IngestConfig::default().fetch_timeout(), Duration::from_secs(15));
    }

    #[test]
    fn test_validate_rejects_overlap_not_smaller_than_target() {
        let mut config = Config::default();
        config.ingest.chunk_overlap = config.ingest.chunk_target;
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_validate_rejects_zero_caps() {
        let mut config = Config::default();
        config.graph.max_nodes = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_from_file_reads_sections() {
        let path = std::env::temp_dir().join(format!("kg-config-{}.toml", uuid::Uuid::new_v4()));
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(
            file,
            "[server]\nport = 9100\n\n[graph]\nmax_nodes = 12\n\n[logging]\nformat = \"json\"\n\n[ingest]\ncleanup_after_ingest = false"
        )
        .unwrap();

        let config = Config::from_file(path.to_str().unwrap()).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(config.graph.max_nodes, 12);
        assert_eq!(config.graph.max_edges, 40);
        assert_eq!(config.logging.format, LogFormat::Json);
        assert!(!config.ingest.cleanup_after_ingest);
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let config = Config::from_file("/nonexistent/kg-config").unwrap();
        assert_eq!(config.graph.max_hops, 2);
    }
}
