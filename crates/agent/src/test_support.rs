//! Shared test helpers for session tests.

use async_trait::async_trait;
use confidant_core::error::LlmError;
use confidant_core::llm::{CompletionRequest, LlmClient};
use std::collections::VecDeque;
use std::sync::Mutex;

/// A scripted LLM client that returns a queue of canned outcomes.
///
/// Each call to `complete` pops the next outcome and records the request.
/// Panics if more calls are made than outcomes provided.
pub struct ScriptedClient {
    responses: Mutex<VecDeque<Result<String, LlmError>>>,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl ScriptedClient {
    pub fn new(responses: Vec<Result<String, LlmError>>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Script a sequence of successful text responses.
    pub fn texts(texts: &[&str]) -> Self {
        Self::new(texts.iter().map(|t| Ok((*t).to_string())).collect())
    }

    /// How many completion calls have been made.
    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    /// Copies of every request seen so far, in order.
    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl LlmClient for ScriptedClient {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<String, LlmError> {
        self.requests.lock().unwrap().push(request.clone());
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| {
                panic!(
                    "ScriptedClient: no more responses (call #{})",
                    self.requests.lock().unwrap().len()
                )
            })
    }
}
