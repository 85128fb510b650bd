//! Profile change pipeline — turns free text into gated profile mutations.
//!
//! Three stages, driven by the LLM collaborator:
//! 1. **Detect**: a closed-vocabulary extraction prompt produces a JSON
//!    array of proposed changes; the response is untrusted input and is
//!    validated entry by entry.
//! 2. **Apply**: changes at or above the confidence threshold dispatch to
//!    the profile entity's setters; everything below is silently ignored.
//! 3. **Acknowledge**: a second LLM call phrases a warm acknowledgment of
//!    exactly the applied updates.
//!
//! The pipeline runs as the first step of every turn; a non-`None`
//! outcome short-circuits the rest of the turn.

mod prompts;

use confidant_core::diag::DiagnosticSink;
use confidant_core::llm::{CompletionRequest, LlmClient, PromptMessage};
use confidant_core::profile::{ProfileChange, ProfileField, UserProfile};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, warn};

/// Changes below this confidence are never applied. The boundary is
/// inclusive: exactly 0.8 passes.
pub const CONFIDENCE_THRESHOLD: f64 = 0.8;

/// The result of a turn that updated the profile.
#[derive(Debug, Clone)]
pub struct ProfileUpdateOutcome {
    /// Everything the detection stage proposed (including unapplied
    /// changes — the think prompt surfaces these as recent context).
    pub changes: Vec<ProfileChange>,

    /// Human-readable descriptions of the updates actually applied.
    pub applied: Vec<String>,

    /// The acknowledgment text to return to the user.
    pub acknowledgment: String,
}

/// Drives the detect → apply → acknowledge flow against a profile entity.
pub struct ProfileManager {
    llm: Arc<dyn LlmClient>,
    sink: Arc<dyn DiagnosticSink>,
}

impl ProfileManager {
    pub fn new(llm: Arc<dyn LlmClient>, sink: Arc<dyn DiagnosticSink>) -> Self {
        Self { llm, sink }
    }

    fn log(&self, message: &str) {
        self.sink.add_log(&format!("[UserProfile] {message}"));
    }

    /// Ask the LLM whether the input contains explicit statements about
    /// the user, and parse its answer into validated changes.
    ///
    /// Extraction failure never propagates: a malformed response, a
    /// non-array, or an invalid entry degrades to skipping that entry or
    /// the whole set.
    pub async fn detect_changes(&self, input: &str) -> Vec<ProfileChange> {
        let request = CompletionRequest::new(vec![
            PromptMessage::system(prompts::DETECTION_PROMPT),
            PromptMessage::user(input),
        ]);

        let response = match self.llm.complete(&request).await {
            Ok(text) => text,
            Err(e) => {
                warn!(error = %e, "Profile change detection failed");
                return Vec::new();
            }
        };

        parse_changes(&response)
    }

    /// Apply every change that clears the confidence gate, returning the
    /// descriptions of the updates made.
    ///
    /// A single bad change is caught and logged; the rest still apply.
    pub fn process_changes(
        &self,
        profile: &mut UserProfile,
        changes: &[ProfileChange],
    ) -> Vec<String> {
        let mut updates = Vec::new();

        for change in changes {
            if change.confidence < CONFIDENCE_THRESHOLD {
                debug!(field = %change.field, confidence = change.confidence,
                    "Skipping low-confidence profile change");
                continue;
            }

            let old_value = profile.current_value_text(change.field);
            match profile.apply(change.field, &change.value) {
                Ok(description) => {
                    self.log(&format!(
                        "Updated {}: {} -> {}",
                        change.field,
                        old_value,
                        render_value(&change.value)
                    ));
                    updates.push(description);
                }
                Err(e) => {
                    warn!(field = %change.field, error = %e, "Failed to apply profile change");
                    self.log(&format!("Error updating {}: {e}", change.field));
                }
            }
        }

        updates
    }

    /// Run the full pipeline. `None` means "no profile-driven response;
    /// continue normal turn processing".
    pub async fn handle_input(
        &self,
        profile: &mut UserProfile,
        input: &str,
    ) -> Option<ProfileUpdateOutcome> {
        let changes = self.detect_changes(input).await;
        if changes.is_empty() {
            return None;
        }

        let applied = self.process_changes(profile, &changes);
        if applied.is_empty() {
            return None;
        }

        let request = CompletionRequest::new(vec![
            PromptMessage::system(prompts::acknowledgment_prompt(&applied)),
            PromptMessage::user("Generate a natural response about these updates:"),
        ]);

        match self.llm.complete(&request).await {
            Ok(acknowledgment) => Some(ProfileUpdateOutcome {
                changes,
                applied,
                acknowledgment,
            }),
            Err(e) => {
                // The mutations stand; the turn falls through to normal
                // processing instead of failing.
                warn!(error = %e, "Failed to phrase profile acknowledgment");
                None
            }
        }
    }
}

/// Parse the detection response as an untrusted JSON array of changes.
fn parse_changes(response: &str) -> Vec<ProfileChange> {
    let value: Value = match serde_json::from_str(response.trim()) {
        Ok(v) => v,
        Err(e) => {
            warn!(error = %e, "Profile detection response is not valid JSON");
            return Vec::new();
        }
    };

    let Some(entries) = value.as_array() else {
        warn!("Profile detection response is not an array");
        return Vec::new();
    };

    entries
        .iter()
        .filter_map(|entry| match parse_change(entry) {
            Ok(change) => Some(change),
            Err(reason) => {
                warn!(%reason, "Skipping invalid profile change entry");
                None
            }
        })
        .collect()
}

fn parse_change(entry: &Value) -> Result<ProfileChange, String> {
    let field_str = entry
        .get("field")
        .and_then(Value::as_str)
        .ok_or_else(|| "missing field".to_string())?;
    let field: ProfileField = field_str.parse().map_err(|e| format!("{e}"))?;

    let value = entry
        .get("value")
        .cloned()
        .ok_or_else(|| format!("missing value for {field}"))?;

    let confidence = entry
        .get("confidence")
        .and_then(Value::as_f64)
        .ok_or_else(|| format!("missing confidence for {field}"))?;

    Ok(ProfileChange {
        field,
        value,
        confidence,
    })
}

fn render_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Array(items) => items
            .iter()
            .map(render_value)
            .collect::<Vec<_>>()
            .join(", "),
        other => other.to_string(),
    }
}
