//! The Confidant agent session — one conversational turn at a time.
//!
//! A turn runs the profile change pipeline first and short-circuits on a
//! profile update; otherwise it thinks (what do I want to say?), responds
//! (say exactly that), records both into the bounded conversation
//! history, and persists state. A separate, explicitly invoked
//! act/observe/reflect capability handles tool-mediated actions.

pub mod actions;
pub mod history;
pub mod prompt;
pub mod session;
pub mod test_support;

pub use actions::{ActionKind, AgentAction, AgentObservation, ObservationKind};
pub use history::{ConversationHistory, EntryKind, HistoryEntry, HISTORY_CAPACITY};
pub use session::AgentSession;
