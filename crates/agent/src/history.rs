//! Bounded conversation history — the agent's short-term recall.
//!
//! A ring of the last ten thought/response entries. Distinct from the
//! transcript: the transcript is what the user saw, the history is what
//! the agent remembers saying and thinking, and it feeds every think
//! prompt. Persisted into session memory after every mutation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

/// Appending beyond this capacity evicts the oldest entry.
pub const HISTORY_CAPACITY: usize = 10;

/// History entries whose content starts with this prefix record a
/// profile update and are surfaced first in the think prompt.
pub const PROFILE_UPDATE_PREFIX: &str = "Updated profile:";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    Thought,
    Response,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryEntry {
    #[serde(rename = "type")]
    pub kind: EntryKind,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

/// The bounded ring of recent entries, oldest first.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConversationHistory {
    entries: Vec<HistoryEntry>,
}

impl ConversationHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rehydrate from a persisted JSON value; malformed data starts
    /// fresh rather than failing the session.
    pub fn from_value(value: &Value) -> Self {
        match serde_json::from_value(value.clone()) {
            Ok(history) => history,
            Err(e) => {
                warn!(error = %e, "Discarding malformed saved conversation history");
                Self::default()
            }
        }
    }

    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }

    /// Append an entry, evicting the oldest when over capacity.
    pub fn push(&mut self, kind: EntryKind, content: impl Into<String>) {
        self.entries.push(HistoryEntry {
            kind,
            content: content.into(),
            timestamp: Utc::now(),
        });
        if self.entries.len() > HISTORY_CAPACITY {
            self.entries.remove(0);
        }
    }

    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The full history rendered for prompt injection.
    pub fn context_block(&self) -> String {
        if self.entries.is_empty() {
            return "No previous conversation.".into();
        }
        self.entries
            .iter()
            .map(|e| match e.kind {
                EntryKind::Thought => format!("I thought: {}", e.content),
                EntryKind::Response => format!("I responded: {}", e.content),
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// The last `n` entries rendered for the think prompt: profile-update
    /// entries come first, reworded as just-updated lines; ordinary
    /// entries follow.
    pub fn immediate_context(&self, n: usize) -> String {
        let recent = &self.entries[self.entries.len().saturating_sub(n)..];

        let profile_updates = recent
            .iter()
            .filter(|e| e.content.starts_with(PROFILE_UPDATE_PREFIX))
            .map(|e| {
                let updates = e.content[PROFILE_UPDATE_PREFIX.len()..].trim();
                format!(
                    "IMPORTANT - Just now in this conversation: I updated their profile with {updates}"
                )
            });

        let regular = recent
            .iter()
            .filter(|e| !e.content.starts_with(PROFILE_UPDATE_PREFIX))
            .map(|e| match e.kind {
                EntryKind::Thought => format!("I thought: {}", e.content),
                EntryKind::Response => format!("I said: {}", e.content),
            });

        profile_updates.chain(regular).collect::<Vec<_>>().join("\n")
    }
}
