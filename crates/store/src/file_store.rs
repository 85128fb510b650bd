//! File-backed state store — a single pretty-printed JSON document.
//!
//! Storage location: `~/.confidant/state.json` by default.
//!
//! Simple, portable, and human-inspectable. The whole `AgentState` is
//! rewritten on every save.

use async_trait::async_trait;
use confidant_core::error::StoreError;
use confidant_core::state::AgentState;
use confidant_core::store::StateStore;
use std::path::PathBuf;
use tracing::{debug, warn};

pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Default path: `~/.confidant/state.json`
    pub fn default_path() -> PathBuf {
        let home = std::env::var("HOME")
            .or_else(|_| std::env::var("USERPROFILE"))
            .unwrap_or_else(|_| ".".to_string());
        PathBuf::from(home).join(".confidant").join("state.json")
    }
}

#[async_trait]
impl StateStore for FileStore {
    fn name(&self) -> &str {
        "file"
    }

    async fn save(&self, state: &AgentState) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                StoreError::Storage(format!("Failed to create state directory: {e}"))
            })?;
        }

        let content = serde_json::to_string_pretty(state)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        std::fs::write(&self.path, content)
            .map_err(|e| StoreError::Storage(format!("Failed to write state file: {e}")))?;

        debug!(path = %self.path.display(), messages = state.messages.len(), "Saved session state");
        Ok(())
    }

    async fn load(&self) -> Result<Option<AgentState>, StoreError> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(StoreError::Storage(format!(
                    "Failed to read state file: {e}"
                )));
            }
        };

        match serde_json::from_str(&content) {
            Ok(state) => Ok(Some(state)),
            Err(e) => {
                // Malformed saved state is "no prior state", never fatal.
                warn!(path = %self.path.display(), error = %e, "Discarding malformed saved state");
                Ok(None)
            }
        }
    }

    async fn clear(&self) -> Result<(), StoreError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StoreError::Storage(format!(
                "Failed to remove state file: {e}"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use confidant_core::message::ChatMessage;

    #[tokio::test]
    async fn save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");

        let mut state = AgentState::new();
        state.push_message(ChatMessage::user("hello"));
        state
            .memory
            .insert("lastThought".into(), serde_json::json!("thinking"));

        let store = FileStore::new(path.clone());
        store.save(&state).await.unwrap();

        let loaded = store.load().await.unwrap().unwrap();
        assert_eq!(loaded.messages.len(), 1);
        assert_eq!(loaded.memory["lastThought"], "thinking");
    }

    #[tokio::test]
    async fn missing_file_is_no_prior_state() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().join("nope.json"));
        assert!(store.load().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn malformed_file_is_no_prior_state() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        std::fs::write(&path, "{ not json").unwrap();

        let store = FileStore::new(path);
        assert!(store.load().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn clear_removes_state() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");

        let store = FileStore::new(path.clone());
        store.save(&AgentState::new()).await.unwrap();
        assert!(path.exists());

        store.clear().await.unwrap();
        assert!(!path.exists());
        // Clearing twice is fine.
        store.clear().await.unwrap();
    }
}
