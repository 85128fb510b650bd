//! In-memory store — useful for testing and ephemeral sessions.

use async_trait::async_trait;
use confidant_core::error::StoreError;
use confidant_core::state::AgentState;
use confidant_core::store::StateStore;
use tokio::sync::RwLock;

/// Holds the last saved state in memory. Useful for tests and sessions
/// where persistence isn't wanted but round-tripping still matters.
#[derive(Default)]
pub struct InMemoryStore {
    state: RwLock<Option<AgentState>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// How many messages the last saved snapshot holds (test helper).
    pub async fn saved_message_count(&self) -> usize {
        self.state
            .read()
            .await
            .as_ref()
            .map(|s| s.messages.len())
            .unwrap_or(0)
    }
}

#[async_trait]
impl StateStore for InMemoryStore {
    fn name(&self) -> &str {
        "in_memory"
    }

    async fn save(&self, state: &AgentState) -> Result<(), StoreError> {
        *self.state.write().await = Some(state.clone());
        Ok(())
    }

    async fn load(&self) -> Result<Option<AgentState>, StoreError> {
        Ok(self.state.read().await.clone())
    }

    async fn clear(&self) -> Result<(), StoreError> {
        *self.state.write().await = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use confidant_core::message::ChatMessage;

    #[tokio::test]
    async fn save_load_clear() {
        let store = InMemoryStore::new();
        assert!(store.load().await.unwrap().is_none());

        let mut state = AgentState::new();
        state.push_message(ChatMessage::user("hi"));
        store.save(&state).await.unwrap();

        let loaded = store.load().await.unwrap().unwrap();
        assert_eq!(loaded.messages.len(), 1);

        store.clear().await.unwrap();
        assert!(store.load().await.unwrap().is_none());
    }
}
