//! No-op store — persistence disabled.

use async_trait::async_trait;
use confidant_core::error::StoreError;
use confidant_core::state::AgentState;
use confidant_core::store::StateStore;

/// Accepts saves and always loads nothing.
#[derive(Debug, Default)]
pub struct NoopStore;

#[async_trait]
impl StateStore for NoopStore {
    fn name(&self) -> &str {
        "noop"
    }

    async fn save(&self, _state: &AgentState) -> Result<(), StoreError> {
        Ok(())
    }

    async fn load(&self) -> Result<Option<AgentState>, StoreError> {
        Ok(None)
    }

    async fn clear(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
