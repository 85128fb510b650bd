//! The agent session — turn state machine and state ownership.
//!
//! One session per host, constructed explicitly (no global instance).
//! `process` takes `&mut self`, so at most one turn can be in flight per
//! session; hosts that want concurrency run more sessions.
//!
//! Turn flow, strictly sequential:
//! profile check → (short-circuit | think → respond) → history update,
//! with an error terminal reachable from anywhere. Exactly one `Final`
//! step is emitted per turn, including the error path.

use confidant_core::diag::{DiagnosticSink, NoopSink};
use confidant_core::error::{Error, ToolError};
use confidant_core::llm::{CompletionRequest, LlmClient, PromptMessage};
use confidant_core::message::ChatMessage;
use confidant_core::profile::{ProfileChange, UserProfile};
use confidant_core::state::AgentState;
use confidant_core::step::{StepKind, StepObserver, StepResult};
use confidant_core::store::StateStore;
use confidant_core::tool::{Tool, ToolRegistry, ToolResult};
use confidant_profile::ProfileManager;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::history::{ConversationHistory, EntryKind};
use crate::prompt::{self, ThinkContext};

/// Memory keys the session reads and writes. Everything here survives
/// a round-trip through the state store.
pub mod keys {
    pub const USER_PROFILE: &str = "userProfile";
    pub const CONVERSATION_HISTORY: &str = "conversationHistory";
    pub const CURRENT_INPUT: &str = "currentInput";
    pub const LAST_THOUGHT: &str = "lastThought";
    pub const RECENT_PROFILE_CHANGES: &str = "recentProfileChanges";
    pub const CURRENT_FILE: &str = "currentFile";
    pub const LAST_REFLECTION: &str = "lastReflection";
}

/// One agent session: owns the state, the profile, the history, and the
/// tool registry; talks to the LLM, the state store, and the diagnostic
/// sink through injected collaborators.
pub struct AgentSession {
    pub(crate) state: AgentState,
    pub(crate) profile: UserProfile,
    history: ConversationHistory,
    tools: ToolRegistry,
    profile_manager: ProfileManager,
    pub(crate) llm: Arc<dyn LlmClient>,
    store: Arc<dyn StateStore>,
    pub(crate) temperature: f32,
    pub(crate) max_tokens: Option<u32>,
}

impl AgentSession {
    /// Create a fresh session with no persistence and no diagnostics.
    pub fn new(llm: Arc<dyn LlmClient>) -> Self {
        Self {
            state: AgentState::new(),
            profile: UserProfile::default(),
            history: ConversationHistory::new(),
            tools: ToolRegistry::new(),
            profile_manager: ProfileManager::new(llm.clone(), Arc::new(NoopSink)),
            llm,
            store: Arc::new(no_store::NoStore),
            temperature: 0.7,
            max_tokens: None,
        }
    }

    /// Attach a state store for persistence.
    pub fn with_store(mut self, store: Arc<dyn StateStore>) -> Self {
        self.store = store;
        self
    }

    /// Attach a diagnostic sink for user-visible log lines.
    pub fn with_sink(mut self, sink: Arc<dyn DiagnosticSink>) -> Self {
        self.profile_manager = ProfileManager::new(self.llm.clone(), sink);
        self
    }

    /// Replace the tool registry.
    pub fn with_tools(mut self, tools: ToolRegistry) -> Self {
        self.tools = tools;
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max: u32) -> Self {
        self.max_tokens = Some(max);
        self
    }

    /// Load prior state from the attached store and rehydrate the
    /// profile and conversation history from it. Absent or malformed
    /// prior state starts fresh — never an error.
    pub async fn restore(mut self) -> Self {
        let loaded = match self.store.load().await {
            Ok(state) => state,
            Err(e) => {
                warn!(error = %e, "Failed to load saved state, starting fresh");
                None
            }
        };

        if let Some(state) = loaded {
            info!(messages = state.messages.len(), "Restored session state");
            self.profile = state
                .recall(keys::USER_PROFILE)
                .map(UserProfile::from_value)
                .unwrap_or_default();
            self.history = state
                .recall(keys::CONVERSATION_HISTORY)
                .map(ConversationHistory::from_value)
                .unwrap_or_default();
            self.state = state;
        }
        self
    }

    // ── Host surface ──

    /// Snapshot the session state, with the profile and history synced
    /// into memory.
    pub fn state(&self) -> AgentState {
        let mut state = self.state.clone();
        state.remember(keys::USER_PROFILE, self.profile.to_value());
        state.remember(keys::CONVERSATION_HISTORY, self.history.to_value());
        state
    }

    /// The transcript as the host should render it.
    pub fn messages(&self) -> Vec<&ChatMessage> {
        self.state.visible_messages()
    }

    pub fn profile(&self) -> &UserProfile {
        &self.profile
    }

    pub fn history(&self) -> &ConversationHistory {
        &self.history
    }

    pub fn add_tool(&mut self, tool: Box<dyn Tool>) {
        self.tools.register(tool);
    }

    pub fn tool(&self, name: &str) -> Option<&dyn Tool> {
        self.tools.get(name)
    }

    pub fn tools(&self) -> Vec<&dyn Tool> {
        self.tools.all()
    }

    pub fn tool_names(&self) -> Vec<&str> {
        self.tools.names()
    }

    pub async fn use_tool(&self, name: &str, params: Value) -> Result<ToolResult, ToolError> {
        self.tools.use_tool(name, params).await
    }

    // ── The turn state machine ──

    /// Process one user turn.
    ///
    /// Always resolves to the turn's final text; an error anywhere
    /// becomes `Error: <message>` rather than propagating. Exactly one
    /// `Final` step reaches the observer either way.
    pub async fn process(&mut self, input: &str, on_step: Option<&StepObserver>) -> String {
        match self.run_turn(input, on_step).await {
            Ok(response) => response,
            Err(e) => {
                warn!(error = %e, "Turn failed");
                let message = format!("Error: {e}");
                self.emit(on_step, StepKind::Final, &message);
                message
            }
        }
    }

    async fn run_turn(
        &mut self,
        input: &str,
        on_step: Option<&StepObserver>,
    ) -> Result<String, Error> {
        debug!(history = self.history.len(), "Processing turn");

        self.state.push_message(ChatMessage::user(input));
        self.state
            .remember(keys::CURRENT_INPUT, Value::String(input.into()));

        // ── Profile check: updates take priority over reasoning ──
        if let Some(outcome) = self
            .profile_manager
            .handle_input(&mut self.profile, input)
            .await
        {
            let changed = outcome
                .changes
                .iter()
                .map(|c| format!("{}={}", c.field, prompt::plain_value(&c.value)))
                .collect::<Vec<_>>()
                .join(", ");
            info!(%changed, "Profile updated, short-circuiting turn");

            self.state.remember(
                keys::RECENT_PROFILE_CHANGES,
                serde_json::to_value(&outcome.changes)?,
            );
            self.history
                .push(EntryKind::Response, format!("Updated profile: {changed}"));
            self.history
                .push(EntryKind::Response, outcome.acknowledgment.clone());
            self.state.push_message(ChatMessage::assistant_step(
                StepKind::Final,
                &outcome.acknowledgment,
            ));
            self.emit(on_step, StepKind::Final, &outcome.acknowledgment);
            self.persist().await;
            return Ok(outcome.acknowledgment);
        }

        // ── Think ──
        let thought = self.think(input).await?;
        self.history.push(EntryKind::Thought, thought.clone());
        if !thought.trim().is_empty() {
            self.emit(on_step, StepKind::Thought, &thought);
        }

        self.profile.update_interaction();
        self.persist().await;

        // ── Respond ──
        let response = self.generate_response().await?;
        self.history.push(EntryKind::Response, response.clone());
        self.state
            .push_message(ChatMessage::assistant_step(StepKind::Final, &response));
        self.emit(on_step, StepKind::Final, &response);
        self.persist().await;

        Ok(response)
    }

    /// Ask the model what it wants to say and stash the raw answer.
    pub(crate) async fn think(&mut self, input: &str) -> Result<String, Error> {
        let recent_changes: Vec<ProfileChange> = self
            .state
            .recall_as(keys::RECENT_PROFILE_CHANGES)
            .unwrap_or_default();
        let summary = self.profile.summary();
        let immediate = self.history.immediate_context(3);

        let system = prompt::think_system(&ThinkContext {
            profile_summary: &summary,
            immediate_context: &immediate,
            recent_changes: &recent_changes,
        });

        let request = self.request(vec![
            PromptMessage::system(system),
            PromptMessage::user(prompt::think_user(input)),
        ]);
        let thought = self.llm.complete(&request).await?;
        debug!(chars = thought.len(), "Generated thought");

        self.state
            .remember(keys::LAST_THOUGHT, Value::String(thought.clone()));
        Ok(thought)
    }

    /// Restate the last thought as the user-facing reply.
    async fn generate_response(&mut self) -> Result<String, Error> {
        let last_thought = self
            .state
            .recall_str(keys::LAST_THOUGHT)
            .unwrap_or_default()
            .to_string();
        let current_input = self
            .state
            .recall_str(keys::CURRENT_INPUT)
            .unwrap_or_default()
            .to_string();

        let request = self.request(vec![
            PromptMessage::system(prompt::respond_system(self.profile.name(), &last_thought)),
            PromptMessage::user(prompt::respond_user(&current_input, &last_thought)),
        ]);
        let response = self.llm.complete(&request).await?;

        Ok(strip_quotes(&response))
    }

    // ── Internals ──

    pub(crate) fn request(&self, messages: Vec<PromptMessage>) -> CompletionRequest {
        let mut request = CompletionRequest::new(messages).with_temperature(self.temperature);
        if let Some(max) = self.max_tokens {
            request = request.with_max_tokens(max);
        }
        request
    }

    pub(crate) fn emit(&self, on_step: Option<&StepObserver>, kind: StepKind, content: &str) {
        if let Some(observer) = on_step {
            observer(&StepResult::new(kind, content));
        }
    }

    /// Sync the profile and history into memory and save. Best-effort:
    /// a store failure is logged, never propagated — in-memory state
    /// stays authoritative for the session's lifetime.
    async fn persist(&mut self) {
        self.state
            .remember(keys::USER_PROFILE, self.profile.to_value());
        self.state
            .remember(keys::CONVERSATION_HISTORY, self.history.to_value());
        if let Err(e) = self.store.save(&self.state).await {
            warn!(store = self.store.name(), error = %e, "Failed to persist session state");
        }
    }
}

/// Strip one leading and one trailing quote character, then trim.
fn strip_quotes(text: &str) -> String {
    const QUOTES: &[char] = &['"', '\''];
    let text = text.trim();
    let text = text.strip_prefix(QUOTES).unwrap_or(text);
    let text = text.strip_suffix(QUOTES).unwrap_or(text);
    text.trim().to_string()
}

mod no_store {
    //! The default store: persistence disabled until the host attaches one.

    use async_trait::async_trait;
    use confidant_core::error::StoreError;
    use confidant_core::state::AgentState;
    use confidant_core::store::StateStore;

    pub struct NoStore;

    #[async_trait]
    impl StateStore for NoStore {
        fn name(&self) -> &str {
            "none"
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
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::ScriptedClient;
    use confidant_core::diag::BufferSink;
    use confidant_core::error::LlmError;
    use confidant_store::InMemoryStore;
    use std::sync::Mutex;

    const NO_CHANGES: &str = "[]";

    #[tokio::test]
    async fn normal_turn_thinks_then_responds() {
        let llm = Arc::new(ScriptedClient::texts(&[
            NO_CHANGES,
            "They're greeting me - I'll greet them back warmly.",
            "\"Hey there! Good to see you.\"",
        ]));
        let mut session = AgentSession::new(llm.clone());

        let steps: Arc<Mutex<Vec<StepResult>>> = Arc::new(Mutex::new(Vec::new()));
        let observer = {
            let steps = steps.clone();
            move |s: &StepResult| steps.lock().unwrap().push(s.clone())
        };
        let response = session.process("hello!", Some(&observer)).await;

        // Quotes are stripped from the reply.
        assert_eq!(response, "Hey there! Good to see you.");
        assert_eq!(llm.call_count(), 3);

        let steps = steps.lock().unwrap();
        assert_eq!(steps.len(), 2);
        assert_eq!(steps[0].kind, StepKind::Thought);
        assert_eq!(steps[1].kind, StepKind::Final);
        assert_eq!(steps[1].content, response);

        // History holds the thought and the response, in order.
        let entries = session.history().entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].kind, EntryKind::Thought);
        assert_eq!(entries[1].kind, EntryKind::Response);

        // The turn counted as an interaction.
        assert_eq!(session.profile().interaction_stats().total_interactions, 1);
    }

    #[tokio::test]
    async fn profile_update_short_circuits_turn() {
        let llm = Arc::new(ScriptedClient::texts(&[
            r#"[{"field": "name", "value": "John", "confidence": 0.95}]"#,
            "Nice to meet you, John! I'll remember that.",
        ]));
        let sink = Arc::new(BufferSink::new());
        let mut session = AgentSession::new(llm.clone()).with_sink(sink.clone());

        let steps: Arc<Mutex<Vec<StepResult>>> = Arc::new(Mutex::new(Vec::new()));
        let observer = {
            let steps = steps.clone();
            move |s: &StepResult| steps.lock().unwrap().push(s.clone())
        };
        let response = session.process("my name is John", Some(&observer)).await;

        assert_eq!(response, "Nice to meet you, John! I'll remember that.");
        assert_eq!(session.profile().name(), Some("John"));

        // Detect + acknowledge only: think/respond never ran.
        assert_eq!(llm.call_count(), 2);

        // One step total, and it's Final.
        let steps = steps.lock().unwrap();
        assert_eq!(steps.len(), 1);
        assert_eq!(steps[0].kind, StepKind::Final);

        // History records the update then the acknowledgment.
        let entries = session.history().entries();
        assert_eq!(entries[0].content, "Updated profile: name=John");
        assert_eq!(entries[1].content, response);

        // The detected changes are available to the next think prompt.
        assert!(session.state().recall(keys::RECENT_PROFILE_CHANGES).is_some());

        // The short-circuit path does not count an interaction.
        assert_eq!(session.profile().interaction_stats().total_interactions, 0);

        assert!(sink.logs().iter().any(|l| l.contains("Updated name")));
    }

    #[tokio::test]
    async fn failed_turn_still_emits_one_final_step() {
        let llm = Arc::new(ScriptedClient::new(vec![
            Ok(NO_CHANGES.into()),
            Err(LlmError::Network("connection refused".into())),
        ]));
        let mut session = AgentSession::new(llm);

        let steps: Arc<Mutex<Vec<StepResult>>> = Arc::new(Mutex::new(Vec::new()));
        let observer = {
            let steps = steps.clone();
            move |s: &StepResult| steps.lock().unwrap().push(s.clone())
        };
        let response = session.process("hello", Some(&observer)).await;

        assert!(response.starts_with("Error: "));
        assert!(response.contains("connection refused"));

        let steps = steps.lock().unwrap();
        let finals: Vec<_> = steps.iter().filter(|s| s.kind == StepKind::Final).collect();
        assert_eq!(finals.len(), 1);
        assert_eq!(finals[0].content, response);
    }

    #[tokio::test]
    async fn transcript_deduplicates_repeated_content() {
        let llm = Arc::new(ScriptedClient::texts(&[
            NO_CHANGES,
            "thought one",
            "reply one",
            NO_CHANGES,
            "thought two",
            "reply two",
        ]));
        let mut session = AgentSession::new(llm);

        session.process("same input", None).await;
        session.process("same input", None).await;

        // Second user message had identical content — dropped.
        let user_messages: Vec<_> = session
            .messages()
            .into_iter()
            .filter(|m| m.role == confidant_core::message::Role::User)
            .collect();
        assert_eq!(user_messages.len(), 1);
    }

    #[tokio::test]
    async fn state_roundtrips_through_store() {
        let store = Arc::new(InMemoryStore::new());

        let llm = Arc::new(ScriptedClient::texts(&[
            r#"[{"field": "name", "value": "Ann", "confidence": 0.9}]"#,
            "Got it, Ann!",
        ]));
        let mut session = AgentSession::new(llm).with_store(store.clone());
        session.process("my name is Ann", None).await;
        let saved = session.state();

        // A new session restored from the same store sees everything.
        let llm2 = Arc::new(ScriptedClient::texts(&[]));
        let restored = AgentSession::new(llm2).with_store(store).restore().await;

        assert_eq!(restored.profile().name(), Some("Ann"));
        assert_eq!(restored.history().len(), 2);
        let restored_state = restored.state();
        assert_eq!(restored_state.messages.len(), saved.messages.len());
        assert_eq!(restored_state.memory, saved.memory);
    }

    #[tokio::test]
    async fn think_prompt_carries_profile_summary_and_updates() {
        // Turn 1 updates the profile; turn 2's think prompt must surface it.
        let llm = Arc::new(ScriptedClient::texts(&[
            r#"[{"field": "name", "value": "Ann", "confidence": 0.9}]"#,
            "Got it, Ann!",
            NO_CHANGES,
            "She's asking about her name",
            "Your name is Ann!",
        ]));
        let mut session = AgentSession::new(llm.clone());

        session.process("my name is Ann", None).await;
        session.process("do you remember my name?", None).await;

        let requests = llm.requests();
        // Request 3 (index 2) is the second turn's detect; index 3 is think.
        let think_system = &requests[3].messages[0].content;
        assert!(think_system.contains("name: Ann"));
        assert!(think_system.contains("I updated their profile with name=Ann"));
        assert!(think_system.contains("JUST UPDATED in this conversation - name to: Ann"));
    }

    #[tokio::test]
    async fn empty_thought_emits_no_thought_step() {
        let llm = Arc::new(ScriptedClient::texts(&[NO_CHANGES, "   ", "A reply."]));
        let mut session = AgentSession::new(llm);

        let steps: Arc<Mutex<Vec<StepResult>>> = Arc::new(Mutex::new(Vec::new()));
        let observer = {
            let steps = steps.clone();
            move |s: &StepResult| steps.lock().unwrap().push(s.clone())
        };
        session.process("hi", Some(&observer)).await;

        let steps = steps.lock().unwrap();
        assert_eq!(steps.len(), 1);
        assert_eq!(steps[0].kind, StepKind::Final);
    }

    #[test]
    fn strip_quotes_variants() {
        assert_eq!(strip_quotes("\"hello\""), "hello");
        assert_eq!(strip_quotes("'hello'"), "hello");
        assert_eq!(strip_quotes("  \"hello\"  "), "hello");
        assert_eq!(strip_quotes("say \"hi\" now"), "say \"hi\" now");
        assert_eq!(strip_quotes("plain"), "plain");
    }
}
