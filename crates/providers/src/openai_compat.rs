//! OpenAI-compatible LLM client.
//!
//! Works with: OpenAI, LM Studio, Ollama, vLLM, and any endpoint that
//! exposes an OpenAI-compatible `/chat/completions` route.
//!
//! Supports:
//! - Chat completions (non-streaming and streaming SSE)
//! - Incremental chunk forwarding while still resolving with the full text

use async_trait::async_trait;
use confidant_config::{LlmServer, ServerKind};
use confidant_core::error::LlmError;
use confidant_core::llm::{ChunkSink, CompletionRequest, LlmClient};
use futures::StreamExt;
use serde::Deserialize;
use tracing::{debug, trace, warn};

const LM_STUDIO_DEFAULT_MODEL: &str = "lmstudio-community/Meta-Llama-3.1-8B-Instruct-GGUF";
const OPENAI_DEFAULT_MODEL: &str = "gpt-3.5-turbo";

/// An OpenAI-compatible LLM client.
pub struct OpenAiCompatClient {
    name: String,
    base_url: String,
    api_key: String,
    model: String,
    client: reqwest::Client,
}

impl OpenAiCompatClient {
    /// Create a new client against an arbitrary OpenAI-compatible endpoint.
    pub fn new(
        name: impl Into<String>,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> Result<Self, LlmError> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(120))
            .build()
            .map_err(|e| LlmError::NotConfigured(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            name: name.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            model: model.into(),
            client,
        })
    }

    /// Create an OpenAI client (convenience constructor).
    pub fn openai(api_key: impl Into<String>) -> Result<Self, LlmError> {
        Self::new(
            "openai",
            "https://api.openai.com/v1",
            api_key,
            OPENAI_DEFAULT_MODEL,
        )
    }

    /// Create an LM Studio client. LM Studio ignores the key but expects
    /// one to be present.
    pub fn lm_studio(base_url: Option<&str>) -> Result<Self, LlmError> {
        Self::new(
            "lmstudio",
            base_url.unwrap_or("http://localhost:1234/v1"),
            "lm-studio",
            LM_STUDIO_DEFAULT_MODEL,
        )
    }

    /// Build a client from a configured server entry.
    pub fn from_server(server: &LlmServer) -> Result<Self, LlmError> {
        match server.kind {
            ServerKind::LmStudio => Self::lm_studio(Some(&server.url)),
            ServerKind::OpenAi | ServerKind::Custom => Self::new(
                server.id.clone(),
                server.url.clone(),
                server.api_key.clone().unwrap_or_default(),
                OPENAI_DEFAULT_MODEL,
            ),
        }
    }

    /// Override the model sent with each request.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    fn request_body(&self, request: &CompletionRequest, stream: bool) -> serde_json::Value {
        let mut body = serde_json::json!({
            "model": self.model,
            "messages": request.messages,
            "temperature": request.temperature,
            "stream": stream,
        });
        if let Some(max_tokens) = request.max_tokens {
            body["max_tokens"] = serde_json::json!(max_tokens);
        }
        body
    }

    async fn send(
        &self,
        body: &serde_json::Value,
        accept_sse: bool,
    ) -> Result<reqwest::Response, LlmError> {
        let url = format!("{}/chat/completions", self.base_url);

        let mut req = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json");
        if accept_sse {
            req = req.header("Accept", "text/event-stream");
        }

        let response = req
            .json(body)
            .send()
            .await
            .map_err(|e| LlmError::Network(e.to_string()))?;

        let status = response.status().as_u16();

        if status == 429 {
            return Err(LlmError::RateLimited { retry_after_secs: 5 });
        }

        if status == 401 || status == 403 {
            return Err(LlmError::AuthenticationFailed(
                "Invalid API key or insufficient permissions".into(),
            ));
        }

        if status != 200 {
            let error_body = response.text().await.unwrap_or_default();
            warn!(status, body = %error_body, "LLM server returned error");
            return Err(LlmError::ApiError {
                status_code: status,
                message: error_body,
            });
        }

        Ok(response)
    }
}

#[async_trait]
impl LlmClient for OpenAiCompatClient {
    fn name(&self) -> &str {
        &self.name
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<String, LlmError> {
        debug!(client = %self.name, model = %self.model, "Sending completion request");

        let body = self.request_body(request, false);
        let response = self.send(&body, false).await?;

        let api_response: ApiResponse =
            response.json().await.map_err(|e| LlmError::ApiError {
                status_code: 200,
                message: format!("Failed to parse response: {e}"),
            })?;

        let choice = api_response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| LlmError::ApiError {
                status_code: 200,
                message: "No choices in response".into(),
            })?;

        Ok(choice.message.content.unwrap_or_default())
    }

    async fn complete_streaming(
        &self,
        request: &CompletionRequest,
        on_chunk: &ChunkSink,
    ) -> Result<String, LlmError> {
        debug!(client = %self.name, model = %self.model, "Sending streaming request");

        let body = self.request_body(request, true);
        let response = self.send(&body, true).await?;

        let mut byte_stream = response.bytes_stream();
        let mut buffer = String::new();
        let mut full_message = String::new();

        while let Some(chunk_result) = byte_stream.next().await {
            let bytes =
                chunk_result.map_err(|e| LlmError::StreamInterrupted(e.to_string()))?;
            buffer.push_str(&String::from_utf8_lossy(&bytes));

            // Process complete lines
            while let Some(line_end) = buffer.find('\n') {
                let line = buffer[..line_end].trim_end_matches('\r').to_string();
                buffer = buffer[line_end + 1..].to_string();

                // Skip empty lines and SSE comments
                if line.is_empty() || line.starts_with(':') {
                    continue;
                }

                let Some(data) = line.strip_prefix("data: ") else {
                    continue;
                };
                let data = data.trim();

                // "[DONE]" signals end of stream
                if data == "[DONE]" {
                    return Ok(full_message);
                }

                match serde_json::from_str::<StreamResponse>(data) {
                    Ok(stream_resp) => {
                        if let Some(content) = stream_resp
                            .choices
                            .first()
                            .and_then(|c| c.delta.content.as_deref())
                            && !content.is_empty()
                        {
                            full_message.push_str(content);
                            on_chunk(content);
                        }
                    }
                    Err(e) => {
                        trace!(client = %self.name, data = %data, error = %e,
                            "Ignoring unparseable SSE chunk");
                    }
                }
            }
        }

        // Stream ended without [DONE] — return whatever accumulated.
        Ok(full_message)
    }
}

// --- OpenAI API types (internal) ---

#[derive(Debug, Deserialize)]
struct ApiResponse {
    choices: Vec<ApiChoice>,
}

#[derive(Debug, Deserialize)]
struct ApiChoice {
    message: ApiMessage,
}

#[derive(Debug, Deserialize)]
struct ApiMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StreamResponse {
    #[serde(default)]
    choices: Vec<StreamChoice>,
}

#[derive(Debug, Deserialize)]
struct StreamChoice {
    delta: StreamDelta,
}

#[derive(Debug, Deserialize)]
struct StreamDelta {
    #[serde(default)]
    content: Option<String>,
}
