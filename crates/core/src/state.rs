//! Agent session state — the transcript plus the key/value memory.
//!
//! `AgentState` is the unit of persistence: the host snapshots it via
//! `AgentSession::state()` and the whole struct round-trips through a
//! `StateStore` between sessions.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::message::ChatMessage;

/// The complete serializable state of one agent session.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AgentState {
    /// Ordered transcript messages.
    pub messages: Vec<ChatMessage>,

    /// Key/value scratch space. All cross-turn state (conversation
    /// history, serialized profile, last thought, current input) lives
    /// here — it is the only channel by which one turn's side effects
    /// become visible to the next.
    pub memory: Map<String, Value>,

    /// Optional free-form context string set by the host.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

impl AgentState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a message to the transcript.
    ///
    /// A message whose content exactly matches an already-present message
    /// is silently dropped — transcript dedup is a session invariant, not
    /// an optimization. Returns whether the message was appended.
    pub fn push_message(&mut self, message: ChatMessage) -> bool {
        if self.messages.iter().any(|m| m.content == message.content) {
            return false;
        }
        self.messages.push(message);
        true
    }

    /// The transcript as the host should render it: messages still marked
    /// as processing are filtered out.
    pub fn visible_messages(&self) -> Vec<&ChatMessage> {
        self.messages.iter().filter(|m| !m.is_processing()).collect()
    }

    // ── Embedded memory store ──
    //
    // No TTL, no size bound. A value set here is visible to later turns
    // and to anything that round-trips the state through a store.

    /// Store a value under a key, replacing any previous value.
    pub fn remember(&mut self, key: impl Into<String>, value: Value) {
        self.memory.insert(key.into(), value);
    }

    /// Fetch a raw value by key.
    pub fn recall(&self, key: &str) -> Option<&Value> {
        self.memory.get(key)
    }

    /// Fetch and deserialize a value by key; `None` on absence or shape
    /// mismatch.
    pub fn recall_as<T: serde::de::DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.memory
            .get(key)
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }

    /// Fetch a string value by key.
    pub fn recall_str(&self, key: &str) -> Option<&str> {
        self.memory.get(key).and_then(Value::as_str)
    }

    /// Drop every stored value.
    pub fn clear_memory(&mut self) {
        self.memory.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::{MessageMetadata, StepStatus};

    #[test]
    fn push_deduplicates_by_content() {
        let mut state = AgentState::new();
        assert!(state.push_message(ChatMessage::user("hello")));
        assert!(state.push_message(ChatMessage::assistant("hi there")));
        // Same content again, different id/role — dropped.
        assert!(!state.push_message(ChatMessage::assistant("hello")));
        assert_eq!(state.messages.len(), 2);
    }

    #[test]
    fn visible_messages_hides_processing() {
        let mut state = AgentState::new();
        state.push_message(ChatMessage::user("question"));
        let mut in_flight = ChatMessage::assistant("partial answer");
        in_flight.metadata = Some(MessageMetadata {
            current_step: Some(StepStatus::Processing),
            kind: None,
            summary: None,
        });
        state.push_message(in_flight);

        let visible = state.visible_messages();
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].content, "question");
    }

    #[test]
    fn memory_set_get_clear() {
        let mut state = AgentState::new();
        assert!(state.recall("lastThought").is_none());

        state.remember("lastThought", Value::String("pondering".into()));
        assert_eq!(state.recall_str("lastThought"), Some("pondering"));

        // Typed recall tolerates shape mismatch.
        state.remember("count", Value::from(3));
        assert_eq!(state.recall_as::<u64>("count"), Some(3));
        assert_eq!(state.recall_as::<String>("count"), None);

        state.clear_memory();
        assert!(state.recall("lastThought").is_none());
    }

    #[test]
    fn memory_survives_state_roundtrip() {
        let mut state = AgentState::new();
        state.remember("currentInput", Value::String("hello".into()));

        let json = serde_json::to_string(&state).unwrap();
        let restored: AgentState = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.recall_str("currentInput"), Some("hello"));
    }

    #[test]
    fn state_roundtrips_through_json() {
        let mut state = AgentState::new();
        state.push_message(ChatMessage::user("remember me"));
        state.memory.insert("lastThought".into(), Value::String("a thought".into()));
        state.context = Some("workspace".into());

        let json = serde_json::to_string(&state).unwrap();
        let restored: AgentState = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.messages.len(), 1);
        assert_eq!(restored.memory["lastThought"], "a thought");
        assert_eq!(restored.context.as_deref(), Some("workspace"));
    }
}
