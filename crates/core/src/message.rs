//! Chat message domain types.
//!
//! These are the value objects that flow between the host UI and the
//! agent session: the user sends a message, the session processes it,
//! and the assistant's steps and replies come back as messages.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::step::StepKind;

/// The role of a message sender in a chat transcript.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The end user
    User,
    /// The AI assistant
    Assistant,
}

/// Host-visible processing status of a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepStatus {
    Thinking,
    Processing,
    Complete,
    Error,
}

/// Optional metadata attached to a chat message.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MessageMetadata {
    /// Where this message is in its lifecycle (in-flight messages are
    /// hidden from the transcript until complete).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_step: Option<StepStatus>,

    /// Which step of the reasoning loop produced this message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<StepKind>,

    /// Optional short summary (set by hosts that render collapsed steps).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
}

/// A single message in the session transcript.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Unique message ID
    pub id: String,

    /// Who sent this message
    pub role: Role,

    /// The text content
    pub content: String,

    /// Optional step/lifecycle metadata
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<MessageMetadata>,

    /// Timestamp
    pub timestamp: DateTime<Utc>,
}

impl ChatMessage {
    /// Create a new user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            role: Role::User,
            content: content.into(),
            metadata: None,
            timestamp: Utc::now(),
        }
    }

    /// Create a new assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            role: Role::Assistant,
            content: content.into(),
            metadata: None,
            timestamp: Utc::now(),
        }
    }

    /// Create a completed assistant message tagged with the step that
    /// produced it.
    pub fn assistant_step(kind: StepKind, content: impl Into<String>) -> Self {
        Self {
            metadata: Some(MessageMetadata {
                current_step: Some(StepStatus::Complete),
                kind: Some(kind),
                summary: None,
            }),
            ..Self::assistant(content)
        }
    }

    /// Whether the host should hide this message (still being produced).
    pub fn is_processing(&self) -> bool {
        self.metadata
            .as_ref()
            .is_some_and(|m| m.current_step == Some(StepStatus::Processing))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_user_message() {
        let msg = ChatMessage::user("Hello!");
        assert_eq!(msg.role, Role::User);
        assert_eq!(msg.content, "Hello!");
        assert!(msg.metadata.is_none());
    }

    #[test]
    fn assistant_step_is_complete() {
        let msg = ChatMessage::assistant_step(StepKind::Final, "Done.");
        assert_eq!(msg.role, Role::Assistant);
        assert!(!msg.is_processing());
        let meta = msg.metadata.unwrap();
        assert_eq!(meta.kind, Some(StepKind::Final));
    }

    #[test]
    fn processing_detection() {
        let mut msg = ChatMessage::assistant("...");
        msg.metadata = Some(MessageMetadata {
            current_step: Some(StepStatus::Processing),
            kind: None,
            summary: None,
        });
        assert!(msg.is_processing());
    }

    #[test]
    fn message_serialization_roundtrip() {
        let msg = ChatMessage::user("Test message");
        let json = serde_json::to_string(&msg).unwrap();
        let deserialized: ChatMessage = serde_json::from_str(&json).unwrap();
        assert_eq!(deserialized.content, "Test message");
        assert_eq!(deserialized.role, Role::User);
    }
}
