//! Tool-action capability — the act/observe/reflect sub-loop.
//!
//! This is a separate, explicitly invoked entry point: the normal turn
//! state machine never calls it. Execution is simulated — the model
//! narrates what the action would do and analyzes the result; no real
//! side effect happens here.

use chrono::Utc;
use confidant_core::error::{Error, LlmError};
use confidant_core::llm::PromptMessage;
use confidant_core::step::{StepKind, StepObserver};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use tracing::{debug, warn};

use crate::session::{AgentSession, keys};

/// The kind of code action the model can request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionKind {
    Analyze,
    Edit,
    Create,
    Delete,
    Search,
    Execute,
}

impl ActionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionKind::Analyze => "analyze",
            ActionKind::Edit => "edit",
            ActionKind::Create => "create",
            ActionKind::Delete => "delete",
            ActionKind::Search => "search",
            ActionKind::Execute => "execute",
        }
    }
}

impl std::fmt::Display for ActionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An action descriptor produced by the model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentAction {
    #[serde(rename = "type")]
    pub kind: ActionKind,

    #[serde(default)]
    pub payload: Map<String, Value>,
}

/// What executing an action produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObservationKind {
    Success,
    Error,
    Info,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentObservation {
    #[serde(rename = "type")]
    pub kind: ObservationKind,

    #[serde(default)]
    pub data: Map<String, Value>,
}

impl AgentObservation {
    fn error(message: &str, action: &AgentAction) -> Self {
        let mut data = Map::new();
        data.insert("error".into(), Value::String(message.into()));
        data.insert(
            "metadata".into(),
            json!({ "action": serde_json::to_value(action).unwrap_or(Value::Null) }),
        );
        Self {
            kind: ObservationKind::Error,
            data,
        }
    }

    /// The headline text of this observation, for step emission.
    pub fn summary(&self) -> String {
        self.data
            .get("result")
            .or_else(|| self.data.get("error"))
            .and_then(Value::as_str)
            .map(String::from)
            .unwrap_or_else(|| serde_json::to_string(&self.data).unwrap_or_default())
    }
}

const ACT_PROMPT: &str = "Based on the thought process, determine the next action.
Consider the context of the request and any previous steps taken.
Return a simple JSON object with 'type' and 'payload'.
Available actions: analyze, edit, create, delete, search, execute.
Be concise.";

const ANALYZE_PROMPT: &str = "Analyze the result of the action.
Consider success criteria, unexpected results, and potential implications.
Include context from previous steps to inform the analysis.
Keep it concise.";

const REFLECT_PROMPT: &str = "Briefly reflect on the action and its results.
What worked? What didn't? What's next?
Include context from previous steps to inform the reflection.
Keep it short and actionable.";

impl AgentSession {
    /// Run one full act → observe → reflect pass over a thought,
    /// emitting the corresponding steps. Returns the rendered reflection.
    pub async fn run_tool_action(
        &mut self,
        thought: &str,
        on_step: Option<&StepObserver>,
    ) -> Result<String, Error> {
        let action = self.act(thought).await?;
        self.emit(
            on_step,
            StepKind::Action,
            &serde_json::to_string(&action)?,
        );

        let observation = self.observe(&action).await;
        self.emit(on_step, StepKind::Observation, &observation.summary());

        let reflection = self.reflect(&observation).await?;
        self.emit(on_step, StepKind::Reflection, &reflection);

        Ok(reflection)
    }

    /// Ask the model for the next action descriptor.
    ///
    /// The response is untrusted: a descriptor that doesn't parse falls
    /// back to analyzing the current file rather than surfacing an error.
    pub async fn act(&self, thought: &str) -> Result<AgentAction, LlmError> {
        let request = self.request(vec![
            PromptMessage::system(ACT_PROMPT),
            PromptMessage::user(format!("Thought: {thought}")),
        ]);
        let response = self.llm.complete(&request).await?;

        match serde_json::from_str(response.trim()) {
            Ok(action) => Ok(action),
            Err(e) => {
                debug!(error = %e, "Unparseable action descriptor, falling back to analyze");
                let mut payload = Map::new();
                if let Some(current_file) = self.state.recall(keys::CURRENT_FILE) {
                    payload.insert("path".into(), current_file.clone());
                }
                Ok(AgentAction {
                    kind: ActionKind::Analyze,
                    payload,
                })
            }
        }
    }

    /// Execute the action (simulated) and fold the model's analysis of
    /// the result into the observation. Failures become an `Error`
    /// observation — this method never fails.
    pub async fn observe(&self, action: &AgentAction) -> AgentObservation {
        match self.execute_action(action).await {
            Ok(observation) => observation,
            Err(e) => {
                warn!(error = %e, "Action execution failed");
                AgentObservation::error(&e.to_string(), action)
            }
        }
    }

    async fn execute_action(&self, action: &AgentAction) -> Result<AgentObservation, LlmError> {
        let action_json = serde_json::to_string(action).unwrap_or_default();

        // Simulated execution: the model narrates the result.
        let request = self.request(vec![
            PromptMessage::system(format!(
                "Execute the {} action and provide a brief result.\nFocus on what was done and what was found.\nKeep it simple and clear.",
                action.kind
            )),
            PromptMessage::user(format!("Action: {action_json}")),
        ]);
        let result = self.llm.complete(&request).await?;

        let mut observation = AgentObservation {
            kind: ObservationKind::Success,
            data: Map::new(),
        };
        observation
            .data
            .insert("result".into(), Value::String(result.clone()));

        // Second pass: analyze the outcome.
        let request = self.request(vec![
            PromptMessage::system(ANALYZE_PROMPT),
            PromptMessage::user(format!(
                "Action: {action_json}\nObservation: {result}"
            )),
        ]);
        let analysis = self.llm.complete(&request).await?;

        observation.data.insert(
            "metadata".into(),
            json!({
                "action": serde_json::to_value(action).unwrap_or(Value::Null),
                "analysis": analysis,
                "timestamp": Utc::now().to_rfc3339(),
            }),
        );

        Ok(observation)
    }

    /// Ask the model for a short retrospective and record it.
    pub async fn reflect(&mut self, observation: &AgentObservation) -> Result<String, Error> {
        let success = observation.kind == ObservationKind::Success;

        let request = self.request(vec![
            PromptMessage::system(REFLECT_PROMPT),
            PromptMessage::user(format!(
                "Result: {}\nSuccess: {success}",
                serde_json::to_string(observation)?
            )),
        ]);
        let reflection = self.llm.complete(&request).await?;

        let outcome = if success { "succeeded" } else { "failed" };
        self.state.remember(
            keys::LAST_REFLECTION,
            json!({
                "success": success,
                "outcome": outcome,
                "details": observation.data,
                "reflection": reflection,
                "timestamp": Utc::now().to_rfc3339(),
            }),
        );

        Ok(format!("Action {}\n{reflection}", outcome.to_uppercase()))
    }
}
