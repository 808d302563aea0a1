//! Anthropic Messages API implementation of [`Agent`].

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use tailor_shared::{Result, TailorError};

use crate::{Agent, AskOptions};

/// Public Anthropic API root.
pub const ANTHROPIC_API_URL: &str = "https://api.anthropic.com/v1";

/// Model used when none is configured.
pub const DEFAULT_MODEL: &str = "claude-sonnet-4-5-20250929";

/// System prompt used when a request does not override it.
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful research assistant. Answer questions \
     about the provided paper concisely and accurately.";

const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Long papers with a 4k-token answer can take a while.
const REQUEST_TIMEOUT_SECS: u64 = 300;

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    system: &'a str,
    messages: Vec<WireMessage>,
}

#[derive(Debug, Serialize)]
struct WireMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
enum ContentBlock {
    #[serde(rename = "text")]
    Text { text: String },
    #[serde(other)]
    Other,
}

impl MessagesResponse {
    fn first_text(self) -> Option<String> {
        self.content.into_iter().find_map(|block| match block {
            ContentBlock::Text { text } => Some(text),
            ContentBlock::Other => None,
        })
    }
}

// ---------------------------------------------------------------------------
// Agent
// ---------------------------------------------------------------------------

/// Agent backed by Anthropic's Messages API.
#[derive(Clone)]
pub struct AnthropicAgent {
    api_key: String,
    model: String,
    base_url: String,
    http: Client,
}

impl std::fmt::Debug for AnthropicAgent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnthropicAgent")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl AnthropicAgent {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| TailorError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            api_key: api_key.into(),
            model: model.into(),
            base_url: ANTHROPIC_API_URL.to_string(),
            http,
        })
    }

    /// Point the agent at a different API root (proxies, tests).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        let key = HeaderValue::from_str(&self.api_key)
            .map_err(|e| TailorError::config(format!("invalid API key header: {e}")))?;
        headers.insert("x-api-key", key);
        headers.insert(
            "anthropic-version",
            HeaderValue::from_static(ANTHROPIC_VERSION),
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        Ok(headers)
    }
}

/// The single user turn: the paper wrapped in tags, then the question.
fn user_message(document: &str, question: &str) -> String {
    format!("<paper>\n{document}\n</paper>\n\n{question}")
}

#[async_trait]
impl Agent for AnthropicAgent {
    #[instrument(skip_all, fields(model = %self.model, doc_chars = document.len()))]
    async fn ask(&self, document: &str, question: &str, options: &AskOptions) -> Result<String> {
        let request = MessagesRequest {
            model: &self.model,
            max_tokens: options.max_tokens,
            system: options.system.as_deref().unwrap_or(DEFAULT_SYSTEM_PROMPT),
            messages: vec![WireMessage {
                role: "user",
                content: user_message(document, question),
            }],
        };

        let url = format!("{}/messages", self.base_url);
        debug!(%url, max_tokens = options.max_tokens, "sending messages request");

        let response = self
            .http
            .post(&url)
            .headers(self.headers()?)
            .json(&request)
            .send()
            .await
            .map_err(|e| TailorError::Network(format!("{url}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TailorError::Agent(format!(
                "Anthropic API error ({status}): {body}"
            )));
        }

        let parsed: MessagesResponse = response
            .json()
            .await
            .map_err(|e| TailorError::Agent(format!("invalid Anthropic response: {e}")))?;

        parsed
            .first_text()
            .ok_or_else(|| TailorError::Agent("no text content in Anthropic response".into()))
    }
}
