//! Reasoning step types emitted to the host during a turn.
//!
//! A turn emits zero or more intermediate steps and exactly one `Final`
//! step — the `Final` step is the host's only reliable completion signal,
//! and its content always equals the turn's returned text.

use serde::{Deserialize, Serialize};

/// The kind of step in the agent's reasoning loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepKind {
    Thought,
    Action,
    Observation,
    Reflection,
    Final,
}

impl StepKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StepKind::Thought => "thought",
            StepKind::Action => "action",
            StepKind::Observation => "observation",
            StepKind::Reflection => "reflection",
            StepKind::Final => "final",
        }
    }
}

impl std::fmt::Display for StepKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One step surfaced to the host's step observer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepResult {
    #[serde(rename = "type")]
    pub kind: StepKind,
    pub content: String,
}

impl StepResult {
    pub fn new(kind: StepKind, content: impl Into<String>) -> Self {
        Self {
            kind,
            content: content.into(),
        }
    }
}

/// Host-provided callback invoked for each emitted step.
///
/// May be called zero or more times per turn; exactly one `Final`-kinded
/// step is guaranteed per turn, including the error path.
pub type StepObserver = dyn Fn(&StepResult) + Send + Sync;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_kind_wire_names() {
        assert_eq!(StepKind::Thought.as_str(), "thought");
        assert_eq!(StepKind::Final.to_string(), "final");
    }

    #[test]
    fn step_serializes_with_type_key() {
        let step = StepResult::new(StepKind::Final, "done");
        let json = serde_json::to_string(&step).unwrap();
        assert!(json.contains(r#""type":"final""#));
        assert!(json.contains(r#""content":"done""#));
    }
}
