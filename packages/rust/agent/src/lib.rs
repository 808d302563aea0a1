//! Language-model capability used by the classify and generate stages.
//!
//! The pipeline only ever issues single-turn, stateless requests: a document
//! plus one question. [`Agent`] captures exactly that, so tests can swap in a
//! fake and production code can use [`AnthropicAgent`].

mod anthropic;

use async_trait::async_trait;
use tailor_shared::Result;

pub use anthropic::{ANTHROPIC_API_URL, AnthropicAgent, DEFAULT_MODEL, DEFAULT_SYSTEM_PROMPT};

/// Default output token cap for a single answer.
pub const DEFAULT_MAX_TOKENS: u32 = 4096;

/// Per-request options for [`Agent::ask`].
#[derive(Debug, Clone)]
pub struct AskOptions {
    /// System prompt override; the agent's default is used when `None`.
    pub system: Option<String>,
    /// Maximum tokens in the answer.
    pub max_tokens: u32,
}

impl Default for AskOptions {
    fn default() -> Self {
        Self {
            system: None,
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }
}

impl AskOptions {
    pub fn new(system: impl Into<String>, max_tokens: u32) -> Self {
        Self {
            system: Some(system.into()),
            max_tokens,
        }
    }
}

/// Ask a question about a document and get the answer text back.
#[async_trait]
pub trait Agent: Send + Sync {
    async fn ask(&self, document: &str, question: &str, options: &AskOptions) -> Result<String>;
}
