//! StateStore trait — best-effort persistence of session state.
//!
//! The store is a collaborator, not a source of truth: in-memory state is
//! authoritative for the session's lifetime, saves are fire-and-forget,
//! and a missing or unreadable prior state is simply "no prior state".
//!
//! Implementations: file-backed JSON, in-memory (for testing), no-op.

use async_trait::async_trait;

use crate::error::StoreError;
use crate::state::AgentState;

#[async_trait]
pub trait StateStore: Send + Sync {
    /// The backend name (e.g. "file", "in_memory", "noop").
    fn name(&self) -> &str;

    /// Persist a snapshot of the session state.
    async fn save(&self, state: &AgentState) -> Result<(), StoreError>;

    /// Load the previously saved state.
    ///
    /// `Ok(None)` covers both "nothing saved yet" and "saved bytes are
    /// malformed" — implementations log the latter and never fail on it.
    async fn load(&self) -> Result<Option<AgentState>, StoreError>;

    /// Discard any saved state.
    async fn clear(&self) -> Result<(), StoreError>;
}
