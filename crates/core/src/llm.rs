//! LlmClient trait — the abstraction over language-model backends.
//!
//! A client knows how to send an ordered list of prompt messages to an
//! LLM and return the completed text, optionally forwarding partial text
//! to a chunk sink as it arrives. The agent loop only ever consumes the
//! full text; streaming exists for hosts that render tokens live.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::LlmError;

/// The role of a prompt message sent to the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PromptRole {
    System,
    User,
    Assistant,
}

/// A single message in a completion request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptMessage {
    pub role: PromptRole,
    pub content: String,
}

impl PromptMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: PromptRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: PromptRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: PromptRole::Assistant,
            content: content.into(),
        }
    }
}

/// A request for a text completion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionRequest {
    /// The ordered prompt messages.
    pub messages: Vec<PromptMessage>,

    /// Temperature (0.0 = deterministic, 1.0 = creative).
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Maximum tokens to generate.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

fn default_temperature() -> f32 {
    0.7
}

impl CompletionRequest {
    pub fn new(messages: Vec<PromptMessage>) -> Self {
        Self {
            messages,
            temperature: default_temperature(),
            max_tokens: None,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max: u32) -> Self {
        self.max_tokens = Some(max);
        self
    }
}

/// Callback receiving partial text during a streaming completion.
pub type ChunkSink = dyn Fn(&str) + Send + Sync;

/// The core LlmClient trait.
///
/// Every backend (OpenAI-compatible endpoints, LM Studio, scripted test
/// doubles) implements this trait. Failures surface as `LlmError`; there
/// is no automatic retry at this layer.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// A human-readable name for this client (e.g. "openai", "lmstudio").
    fn name(&self) -> &str;

    /// Send a request and resolve with the complete text.
    async fn complete(&self, request: &CompletionRequest) -> Result<String, LlmError>;

    /// Send a request, forwarding partial text to `on_chunk` as it
    /// arrives, and still resolve with the complete concatenated text.
    ///
    /// Default implementation calls `complete()` and emits the whole
    /// text as a single chunk — callers that only need the final string
    /// can ignore streaming entirely.
    async fn complete_streaming(
        &self,
        request: &CompletionRequest,
        on_chunk: &ChunkSink,
    ) -> Result<String, LlmError> {
        let text = self.complete(request).await?;
        on_chunk(&text);
        Ok(text)
    }
}
