//! Remote document retrieval and HTML-to-text conversion

use crate::config::IngestConfig;
use crate::error::{Error, Result};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use reqwest::Client;
use scraper::Html;
use tracing::{debug, info};

const SKIPPED_ELEMENTS: [&str; 3] = ["script", "style", "noscript"];

/// Produces the plain text of a document addressed by URL
#[async_trait]
pub trait DocumentFetcher: Send + Sync {
    async fn fetch_text(&self, url: &str) -> Result<String>;
}

/// reqwest-based fetcher for HTML pages
pub struct HttpFetcher {
    client: Client,
    max_html_bytes: usize,
}

impl HttpFetcher {
    pub fn new(config: &IngestConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&config.user_agent)
                .unwrap_or_else(|_| HeaderValue::from_static("knowledge-graph")),
        );

        let client = Client::builder()
            .default_headers(headers)
            .timeout(config.fetch_timeout())
            .build()
            .map_err(|e| Error::Config(format!("failed to build http client: {}", e)))?;

        Ok(Self {
            client,
            max_html_bytes: config.max_html_bytes,
        })
    }
}

#[async_trait]
impl DocumentFetcher for HttpFetcher {
    async fn fetch_text(&self, url: &str) -> Result<String> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| Error::fetch(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::fetch(url, format!("http status {}", status)));
        }

        if let Some(len) = response.content_length() {
            if len as usize > self.max_html_bytes {
                return Err(Error::fetch(
                    url,
                    format!("content-length {} exceeds limit {}", len, self.max_html_bytes),
                ));
            }
        }

        let bytes = response.bytes().await.map_err(|e| Error::fetch(url, e))?;
        if bytes.len() > self.max_html_bytes {
            return Err(Error::fetch(
                url,
                format!("body size {} exceeds limit {}", bytes.len(), self.max_html_bytes),
            ));
        }

        let html = String::from_utf8_lossy(&bytes);
        let text = html_to_text(&html);
        info!("Fetched {}: status={} text_len={}", url, status.as_u16(), text.len());
        Ok(text)
    }
}

/// Visible text of an HTML document with whitespace collapsed.
///
/// Text inside `script`, `style` and `noscript` elements is dropped.
pub fn html_to_text(html: &str) -> String {
    let document = Html::parse_document(html);
    let mut text = String::new();

    for node in document.tree.root().descendants() {
        let Some(fragment) = node.value().as_text() else {
            continue;
        };
        let hidden = node.ancestors().any(|ancestor| {
            ancestor
                .value()
                .as_element()
                .map(|element| SKIPPED_ELEMENTS.contains(&element.name()))
                .unwrap_or(false)
        });
        if hidden {
            continue;
        }
        text.push_str(fragment);
        text.push(' ');
    }

    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    debug!("Extracted {} chars of text from {} bytes of HTML", collapsed.len(), html.len());
    collapsed
}
