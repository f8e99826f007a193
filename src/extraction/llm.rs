//! LLM-backed triple extraction over an OpenAI-compatible API

use super::circuit_breaker::{CircuitBreaker, CircuitBreakerConfig};
use super::models::{ExtractedTriple, ExtractionError, DEFAULT_CONFIDENCE};
use super::TripleExtractor;
use crate::config::ExtractionConfig;
use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

const SYSTEM_PROMPT: &str =
    "You extract knowledge graph triples from text and reply with JSON only.";

/// Chat-completion based extractor
pub struct LlmExtractor {
    client: Client,
    config: ExtractionConfig,
    api_key: SecretString,
    breaker: CircuitBreaker,
}

impl LlmExtractor {
    /// Create a new extractor; fails when no API key is configured
    pub fn new(config: ExtractionConfig) -> Result<Self, ExtractionError> {
        let api_key = config
            .api_key
            .clone()
            .ok_or_else(|| ExtractionError::InitializationError("missing API key".to_string()))?;

        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| ExtractionError::InitializationError(e.to_string()))?;

        let breaker = CircuitBreaker::new(CircuitBreakerConfig {
            failure_threshold: config.circuit_breaker_failures.max(1),
            reset_timeout: config.circuit_breaker_reset(),
        });

        Ok(Self {
            client,
            config,
            api_key,
            breaker,
        })
    }

    fn build_prompt(&self, text: &str, source_id: &str) -> String {
        format!(
            "Extract factual triples from the text below. Return ONLY valid JSON with this schema:\n\n\
            {{\"triples\": [{{\"subject\": \"<Concept>\", \"relation\": \"<Relation>\", \"object\": \"<Concept>\", \"confidence\": 0.0, \"source\": \"{source}\"}}]}}\n\n\
            Rules:\n\
            - Subjects and objects are specific concepts, entities or technologies\n\
            - Prefer relations such as is_a, part_of, uses, depends_on, enables, causes, subset_of\n\
            - Avoid generic relations like \"is\", \"has\" or \"contains\"\n\
            - Return at most {max} triples\n\
            - Confidence is between 0.0 and 1.0\n\n\
            Text: {text}",
            source = source_id,
            max = self.config.max_triples,
            text = text,
        )
    }

    fn calculate_backoff(&self, attempt: usize) -> Duration {
        let multiplier = 2_u32.saturating_pow(attempt.saturating_sub(1) as u32);
        self.config.retry_backoff().saturating_mul(multiplier)
    }

    async fn call_api(&self, request: &ChatCompletionRequest) -> Result<String, ExtractionError> {
        let response = self
            .client
            .post(&self.config.endpoint)
            .bearer_auth(self.api_key.expose_secret())
            .json(request)
            .send()
            .await
            .map_err(|e| ExtractionError::NetworkError(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ExtractionError::ApiError(format!("HTTP {}: {}", status, body)));
        }

        let completion: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| ExtractionError::ApiError(format!("Failed to parse response: {}", e)))?;

        completion
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| ExtractionError::ApiError("No choices in response".to_string()))
    }
}

#[async_trait]
impl TripleExtractor for LlmExtractor {
    async fn extract(
        &self,
        text: &str,
        source_id: &str,
    ) -> Result<Vec<ExtractedTriple>, ExtractionError> {
        if text.trim().is_empty() {
            return Ok(Vec::new());
        }

        if self.breaker.is_open() {
            return Err(ExtractionError::CircuitOpen(self.config.endpoint.clone()));
        }

        let text = truncate_chars(text, self.config.max_input_chars);
        debug!("LLM extraction: source={} len={}", source_id, text.len());

        let request = ChatCompletionRequest {
            model: self.config.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: SYSTEM_PROMPT.to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: self.build_prompt(text, source_id),
                },
            ],
            max_tokens: Some(self.config.max_tokens),
            temperature: Some(self.config.temperature),
        };

        let mut attempt = 0;
        let content = loop {
            attempt += 1;
            match self.call_api(&request).await {
                Ok(content) => {
                    self.breaker.mark_success();
                    break content;
                }
                Err(e) => {
                    self.breaker.mark_failure();
                    if attempt >= self.config.max_retries || self.breaker.is_open() {
                        warn!("LLM extraction failed after {} attempts: {}", attempt, e);
                        return Err(e);
                    }
                    let backoff = self.calculate_backoff(attempt);
                    debug!("Retrying LLM extraction in {:?} (attempt {})", backoff, attempt);
                    tokio::time::sleep(backoff).await;
                }
            }
        };

        let mut triples = parse_triples(&content, source_id)?;
        triples.truncate(self.config.max_triples);
        debug!("LLM extraction returned {} triples for {}", triples.len(), source_id);
        Ok(triples)
    }

    fn name(&self) -> &'static str {
        "llm"
    }
}

/// Longest prefix of at most `max_chars` characters
fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Parse a `{"triples": [...]}` reply, tolerating code fences and prose
/// around the JSON object. Items missing a field are skipped.
pub fn parse_triples(content: &str, source_id: &str) -> Result<Vec<ExtractedTriple>, ExtractionError> {
    let start = content.find('{');
    let end = content.rfind('}');
    let json = match (start, end) {
        (Some(start), Some(end)) if start < end => &content[start..=end],
        _ => {
            return Err(ExtractionError::ParseError(preview(content)));
        }
    };

    let value: Value =
        serde_json::from_str(json).map_err(|_| ExtractionError::ParseError(preview(content)))?;

    let items = value
        .get("triples")
        .and_then(Value::as_array)
        .ok_or_else(|| ExtractionError::ParseError("missing \"triples\" array".to_string()))?;

    let triples = items
        .iter()
        .filter_map(|item| {
            let field = |name: &str| {
                item.get(name)
                    .and_then(Value::as_str)
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
            };
            let confidence = match item.get("confidence") {
                Some(Value::Number(n)) => n.as_f64().map(|c| c as f32),
                Some(Value::String(s)) => s.trim().parse().ok(),
                _ => None,
            }
            .unwrap_or(DEFAULT_CONFIDENCE);

            Some(ExtractedTriple::new(
                field("subject")?,
                field("relation")?,
                field("object")?,
                confidence,
                source_id,
            ))
        })
        .collect();

    Ok(triples)
}

fn preview(content: &str) -> String {
    truncate_chars(content, 80).to_string()
}

// OpenAI-compatible API types
#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config(endpoint: String) -> ExtractionConfig {
        ExtractionConfig {
            api_key: Some(SecretString::new("test-key".to_string())),
            endpoint,
            max_retries: 2,
            retry_backoff_ms: 1,
            timeout_ms: 2000,
            ..ExtractionConfig::default()
        }
    }

    fn completion_body(content: &str) -> String {
        serde_json::json!({
            "choices": [{"message": {"role": "assistant", "content": content}}]
        })
        .to_string()
    }

    #[test]
    fn test_requires_api_key() {
        let result = LlmExtractor::new(ExtractionConfig::default());
        assert!(matches!(result, Err(ExtractionError::InitializationError(_))));
    }

    #[test]
    fn test_parse_triples_with_code_fence() {
        let content = "```json\n{\"triples\": [\
            {\"subject\": \" Rust \", \"relation\": \"uses\", \"object\": \"LLVM\", \"confidence\": 0.9},\
            {\"subject\": \"Cargo\", \"relation\": \"depends_on\", \"object\": \"Rust\"},\
            {\"subject\": \"Orphan\", \"relation\": \"uses\"},\
            {\"subject\": \"Tokio\", \"relation\": \"uses\", \"object\": \"Mio\", \"confidence\": \"0.8\"}\
        ]}\n```";

        let triples = parse_triples(content, "doc#chunk_1").unwrap();
        assert_eq!(triples.len(), 3);
        assert_eq!(triples[0].subject, "Rust");
        assert_eq!(triples[0].confidence, 0.9);
        assert_eq!(triples[1].confidence, DEFAULT_CONFIDENCE);
        assert_eq!(triples[2].confidence, 0.8);
        assert!(triples.iter().all(|t| t.source == "doc#chunk_1"));
    }

    #[test]
    fn test_parse_triples_rejects_prose() {
        assert!(matches!(
            parse_triples("I could not find any triples.", "s"),
            Err(ExtractionError::ParseError(_))
        ));
        assert!(parse_triples("{\"facts\": []}", "s").is_err());
    }

    #[test]
    fn test_truncate_chars_is_char_safe() {
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("abc", 10), "abc");
    }

    #[tokio::test]
    async fn test_extract_against_mock_server() {
        let mut server = mockito::Server::new_async().await;
        let content = r#"{"triples":[{"subject":"Machine Learning","relation":"subset_of","object":"Artificial Intelligence","confidence":0.95}]}"#;
        let mock = server
            .mock("POST", "/v1/chat/completions")
            .match_header("authorization", "Bearer test-key")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(completion_body(content))
            .create_async()
            .await;

        let extractor =
            LlmExtractor::new(test_config(format!("{}/v1/chat/completions", server.url()))).unwrap();
        let triples = extractor
            .extract("Machine learning is a subset of AI.", "https://example.com#chunk_0")
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(triples.len(), 1);
        assert_eq!(triples[0].relation, "subset_of");
        assert_eq!(triples[0].source, "https://example.com#chunk_0");
    }

    #[tokio::test]
    async fn test_retries_then_fails() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/chat/completions")
            .with_status(503)
            .with_body("unavailable")
            .expect(2)
            .create_async()
            .await;

        let extractor =
            LlmExtractor::new(test_config(format!("{}/v1/chat/completions", server.url()))).unwrap();
        let result = extractor.extract("Rust uses LLVM.", "s").await;

        mock.assert_async().await;
        assert!(matches!(result, Err(ExtractionError::ApiError(_))));
    }

    #[tokio::test]
    async fn test_open_breaker_short_circuits() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/chat/completions")
            .with_status(500)
            .expect(1)
            .create_async()
            .await;

        let config = ExtractionConfig {
            max_retries: 1,
            circuit_breaker_failures: 1,
            ..test_config(format!("{}/v1/chat/completions", server.url()))
        };
        let extractor = LlmExtractor::new(config).unwrap();

        assert!(extractor.extract("Rust uses LLVM.", "s").await.is_err());
        let second = extractor.extract("Rust uses LLVM.", "s").await;

        mock.assert_async().await;
        assert!(matches!(second, Err(ExtractionError::CircuitOpen(_))));
    }
}
