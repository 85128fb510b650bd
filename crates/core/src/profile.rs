//! User profile entity — structured facts accumulated about the user.
//!
//! The profile is loaded from session memory at construction, mutated
//! only through its setters (or `apply`, the change pipeline's entry
//! point), and re-persisted after the mutating turn. `summary()` is the
//! deterministic one-line view injected into every prompt that needs to
//! "remember" the user.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::str::FromStr;

use crate::error::ProfileError;

/// Interaction bookkeeping carried inside the profile.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileMetadata {
    pub first_interaction: DateTime<Utc>,
    pub last_interaction: DateTime<Utc>,
    pub total_interactions: u64,
}

impl Default for ProfileMetadata {
    fn default() -> Self {
        let now = Utc::now();
        Self {
            first_interaction: now,
            last_interaction: now,
            total_interactions: 0,
        }
    }
}

/// The raw profile data, shaped for JSON persistence.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProfileData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default)]
    pub preferences: Map<String, Value>,

    #[serde(default)]
    pub expertise: Map<String, Value>,

    #[serde(default)]
    pub location: Map<String, Value>,

    #[serde(default)]
    pub metadata: ProfileMetadata,
}

/// The closed set of profile fields the change pipeline recognizes.
///
/// The wire representation is the dotted path the extraction prompt
/// speaks (`expertise.yearsOfExperience` etc.); unknown paths are
/// rejected at the parse boundary instead of silently no-op'ing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ProfileField {
    Name,
    PreferenceTheme,
    ExpertiseLevel,
    ExpertiseYears,
    ExpertiseLanguages,
    ExpertiseFrameworks,
    LocationCountry,
    LocationCity,
}

impl ProfileField {
    pub const ALL: [ProfileField; 8] = [
        ProfileField::Name,
        ProfileField::PreferenceTheme,
        ProfileField::ExpertiseLevel,
        ProfileField::ExpertiseYears,
        ProfileField::ExpertiseLanguages,
        ProfileField::ExpertiseFrameworks,
        ProfileField::LocationCountry,
        ProfileField::LocationCity,
    ];

    /// The dotted wire path for this field.
    pub fn as_str(&self) -> &'static str {
        match self {
            ProfileField::Name => "name",
            ProfileField::PreferenceTheme => "preferences.theme",
            ProfileField::ExpertiseLevel => "expertise.level",
            ProfileField::ExpertiseYears => "expertise.yearsOfExperience",
            ProfileField::ExpertiseLanguages => "expertise.languages",
            ProfileField::ExpertiseFrameworks => "expertise.frameworks",
            ProfileField::LocationCountry => "location.country",
            ProfileField::LocationCity => "location.city",
        }
    }
}

impl FromStr for ProfileField {
    type Err = ProfileError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "name" => Ok(ProfileField::Name),
            "preferences.theme" => Ok(ProfileField::PreferenceTheme),
            "expertise.level" => Ok(ProfileField::ExpertiseLevel),
            "expertise.yearsOfExperience" => Ok(ProfileField::ExpertiseYears),
            "expertise.languages" => Ok(ProfileField::ExpertiseLanguages),
            "expertise.frameworks" => Ok(ProfileField::ExpertiseFrameworks),
            "location.country" => Ok(ProfileField::LocationCountry),
            "location.city" => Ok(ProfileField::LocationCity),
            other => Err(ProfileError::UnknownField(other.into())),
        }
    }
}

impl TryFrom<String> for ProfileField {
    type Error = ProfileError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<ProfileField> for String {
    fn from(f: ProfileField) -> Self {
        f.as_str().into()
    }
}

impl std::fmt::Display for ProfileField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A proposed profile mutation. Never applied directly: every change
/// passes through the pipeline's confidence gate first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileChange {
    pub field: ProfileField,
    pub value: Value,
    pub confidence: f64,
}

/// Interaction statistics derived from the profile metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InteractionStats {
    pub total_interactions: u64,
    pub days_since_first_interaction: i64,
}

/// The profile entity: getters, setters, and the summary view.
#[derive(Debug, Clone, Default)]
pub struct UserProfile {
    data: ProfileData,
}

impl UserProfile {
    pub fn new(data: ProfileData) -> Self {
        Self { data }
    }

    /// Rehydrate from a persisted JSON value; malformed data starts a
    /// fresh profile rather than failing the session.
    pub fn from_value(value: &Value) -> Self {
        match serde_json::from_value::<ProfileData>(value.clone()) {
            Ok(data) => Self { data },
            Err(e) => {
                tracing::warn!(error = %e, "Discarding malformed saved profile");
                Self::default()
            }
        }
    }

    pub fn data(&self) -> &ProfileData {
        &self.data
    }

    pub fn to_value(&self) -> Value {
        serde_json::to_value(&self.data).unwrap_or(Value::Null)
    }

    // ── Getters / setters ──

    pub fn name(&self) -> Option<&str> {
        self.data.name.as_deref()
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.data.name = Some(name.into());
    }

    pub fn preference(&self, key: &str) -> Option<&Value> {
        self.data.preferences.get(key)
    }

    pub fn set_preference(&mut self, key: impl Into<String>, value: Value) {
        self.data.preferences.insert(key.into(), value);
    }

    pub fn expertise(&self, key: &str) -> Option<&Value> {
        self.data.expertise.get(key)
    }

    pub fn set_expertise(&mut self, key: impl Into<String>, value: Value) {
        self.data.expertise.insert(key.into(), value);
    }

    pub fn location(&self, key: &str) -> Option<&Value> {
        self.data.location.get(key)
    }

    pub fn set_location(&mut self, key: impl Into<String>, value: Value) {
        self.data.location.insert(key.into(), value);
    }

    // ── Interaction metadata ──

    /// Record a completed turn: stamps `last_interaction`, bumps the
    /// counter. Called exactly once per turn that reaches normal
    /// (non-profile-short-circuit) processing.
    pub fn update_interaction(&mut self) {
        self.data.metadata.last_interaction = Utc::now();
        self.data.metadata.total_interactions += 1;
    }

    pub fn interaction_stats(&self) -> InteractionStats {
        let days = (Utc::now() - self.data.metadata.first_interaction).num_days();
        InteractionStats {
            total_interactions: self.data.metadata.total_interactions,
            days_since_first_interaction: days,
        }
    }

    // ── Views ──

    /// Deterministic one-line summary in fixed field order: name,
    /// expertise level, years of experience, location. Absent fields are
    /// omitted entirely.
    pub fn summary(&self) -> String {
        let mut parts: Vec<String> = Vec::new();

        if let Some(name) = &self.data.name {
            parts.push(format!("name: {name}"));
        }

        if let Some(level) = self.data.expertise.get("level").and_then(Value::as_str) {
            parts.push(format!("level: {level}"));
        }

        if let Some(years) = self
            .data
            .expertise
            .get("yearsOfExperience")
            .and_then(value_as_display_number)
        {
            parts.push(format!("{years} years of experience"));
        }

        if let Some(country) = self.data.location.get("country").and_then(Value::as_str) {
            match self.data.location.get("city").and_then(Value::as_str) {
                Some(city) => parts.push(format!("from {city}, {country}")),
                None => parts.push(format!("from {country}")),
            }
        }

        parts.join(", ")
    }

    // ── Change application ──

    /// Apply a gated change, returning the human-readable description of
    /// what was updated (the text the acknowledgment prompt receives).
    pub fn apply(&mut self, field: ProfileField, value: &Value) -> Result<String, ProfileError> {
        match field {
            ProfileField::Name => {
                let name = expect_str(field, value)?;
                self.set_name(name);
                Ok(format!("name to {name}"))
            }
            ProfileField::PreferenceTheme => {
                let theme = expect_str(field, value)?;
                self.set_preference("theme", value.clone());
                Ok(format!("theme preference to {theme}"))
            }
            ProfileField::ExpertiseLevel => {
                let level = expect_str(field, value)?;
                self.set_expertise("level", value.clone());
                Ok(format!("experience level to {level}"))
            }
            ProfileField::ExpertiseYears => {
                let years = expect_years(field, value)?;
                self.set_expertise("yearsOfExperience", Value::from(years));
                Ok(format!("years of experience to {years}"))
            }
            ProfileField::ExpertiseLanguages => {
                let langs = expect_string_list(field, value)?;
                self.set_expertise("languages", value.clone());
                Ok(format!("programming languages: {}", langs.join(", ")))
            }
            ProfileField::ExpertiseFrameworks => {
                let frameworks = expect_string_list(field, value)?;
                self.set_expertise("frameworks", value.clone());
                Ok(format!("frameworks: {}", frameworks.join(", ")))
            }
            ProfileField::LocationCountry => {
                let country = expect_str(field, value)?;
                self.set_location("country", value.clone());
                Ok(format!("country to {country}"))
            }
            ProfileField::LocationCity => {
                let city = expect_str(field, value)?;
                self.set_location("city", value.clone());
                Ok(format!("city to {city}"))
            }
        }
    }

    /// The current value of a field rendered for before/after logging;
    /// `"none"` when unset.
    pub fn current_value_text(&self, field: ProfileField) -> String {
        let value = match field {
            ProfileField::Name => return self.data.name.clone().unwrap_or_else(|| "none".into()),
            ProfileField::PreferenceTheme => self.data.preferences.get("theme"),
            ProfileField::ExpertiseLevel => self.data.expertise.get("level"),
            ProfileField::ExpertiseYears => self.data.expertise.get("yearsOfExperience"),
            ProfileField::ExpertiseLanguages => self.data.expertise.get("languages"),
            ProfileField::ExpertiseFrameworks => self.data.expertise.get("frameworks"),
            ProfileField::LocationCountry => self.data.location.get("country"),
            ProfileField::LocationCity => self.data.location.get("city"),
        };
        match value {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(Value::as_str)
                .collect::<Vec<_>>()
                .join(", "),
            Some(Value::Number(n)) => n.to_string(),
            _ => "none".into(),
        }
    }
}

fn expect_str<'v>(field: ProfileField, value: &'v Value) -> Result<&'v str, ProfileError> {
    value.as_str().ok_or_else(|| ProfileError::InvalidValue {
        field: field.to_string(),
        reason: "expected a string".into(),
    })
}

fn expect_years(field: ProfileField, value: &Value) -> Result<u64, ProfileError> {
    // Extraction sometimes quotes numbers; accept both shapes.
    match value {
        Value::Number(n) => n.as_u64().or_else(|| n.as_f64().map(|f| f as u64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
    .ok_or_else(|| ProfileError::InvalidValue {
        field: field.to_string(),
        reason: "expected a number".into(),
    })
}

fn expect_string_list(field: ProfileField, value: &Value) -> Result<Vec<String>, ProfileError> {
    let items = value.as_array().ok_or_else(|| ProfileError::InvalidValue {
        field: field.to_string(),
        reason: "expected an array of strings".into(),
    })?;
    items
        .iter()
        .map(|v| v.as_str().map(String::from))
        .collect::<Option<Vec<_>>>()
        .ok_or_else(|| ProfileError::InvalidValue {
            field: field.to_string(),
            reason: "expected an array of strings".into(),
        })
}

fn value_as_display_number(value: &Value) -> Option<String> {
    match value {
        Value::Number(n) => Some(n.to_string()),
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn field_paths_roundtrip() {
        for field in ProfileField::ALL {
            assert_eq!(field.as_str().parse::<ProfileField>().unwrap(), field);
        }
    }

    #[test]
    fn unknown_field_is_rejected() {
        let err = "preferences.fontSize".parse::<ProfileField>().unwrap_err();
        assert!(matches!(err, ProfileError::UnknownField(_)));
    }

    #[test]
    fn summary_fixed_order_and_omission() {
        let mut profile = UserProfile::default();
        profile.set_name("Ann");
        profile.set_expertise("level", json!("senior"));
        profile.set_location("country", json!("NL"));
        assert_eq!(profile.summary(), "name: Ann, level: senior, from NL");
    }

    #[test]
    fn summary_with_city_and_years() {
        let mut profile = UserProfile::default();
        profile.set_name("john");
        profile.set_expertise("yearsOfExperience", json!(14));
        profile.set_location("country", json!("Netherlands"));
        profile.set_location("city", json!("Rotterdam"));
        assert_eq!(
            profile.summary(),
            "name: john, 14 years of experience, from Rotterdam, Netherlands"
        );
    }

    #[test]
    fn empty_profile_summary_is_empty() {
        assert_eq!(UserProfile::default().summary(), "");
    }

    #[test]
    fn apply_dispatches_to_setters() {
        let mut profile = UserProfile::default();

        let desc = profile.apply(ProfileField::Name, &json!("John")).unwrap();
        assert_eq!(desc, "name to John");
        assert_eq!(profile.name(), Some("John"));

        let desc = profile
            .apply(ProfileField::ExpertiseLanguages, &json!(["rust", "go"]))
            .unwrap();
        assert_eq!(desc, "programming languages: rust, go");
        assert_eq!(profile.expertise("languages").unwrap(), &json!(["rust", "go"]));
    }

    #[test]
    fn apply_accepts_quoted_years() {
        let mut profile = UserProfile::default();
        let desc = profile
            .apply(ProfileField::ExpertiseYears, &json!("14"))
            .unwrap();
        assert_eq!(desc, "years of experience to 14");
        assert_eq!(profile.expertise("yearsOfExperience").unwrap(), &json!(14));
    }

    #[test]
    fn apply_rejects_wrong_types() {
        let mut profile = UserProfile::default();
        let err = profile.apply(ProfileField::Name, &json!(42)).unwrap_err();
        assert!(matches!(err, ProfileError::InvalidValue { .. }));

        let err = profile
            .apply(ProfileField::ExpertiseYears, &json!("senior"))
            .unwrap_err();
        assert!(matches!(err, ProfileError::InvalidValue { .. }));
    }

    #[test]
    fn update_interaction_bumps_metadata() {
        let mut profile = UserProfile::default();
        let before = profile.data().metadata.last_interaction;
        profile.update_interaction();
        profile.update_interaction();
        assert_eq!(profile.interaction_stats().total_interactions, 2);
        assert!(profile.data().metadata.last_interaction >= before);
        assert_eq!(profile.interaction_stats().days_since_first_interaction, 0);
    }

    #[test]
    fn current_value_text_renders_each_shape() {
        let mut profile = UserProfile::default();
        assert_eq!(profile.current_value_text(ProfileField::Name), "none");

        profile.set_name("Ann");
        profile.set_expertise("yearsOfExperience", json!(3));
        profile.set_expertise("languages", json!(["rust"]));
        assert_eq!(profile.current_value_text(ProfileField::Name), "Ann");
        assert_eq!(profile.current_value_text(ProfileField::ExpertiseYears), "3");
        assert_eq!(
            profile.current_value_text(ProfileField::ExpertiseLanguages),
            "rust"
        );
    }

    #[test]
    fn from_value_tolerates_garbage() {
        let profile = UserProfile::from_value(&json!("not a profile"));
        assert!(profile.name().is_none());

        let profile = UserProfile::from_value(&json!({"name": "Ann"}));
        assert_eq!(profile.name(), Some("Ann"));
    }

    #[test]
    fn data_roundtrips_through_json() {
        let mut profile = UserProfile::default();
        profile.set_name("Ann");
        profile.set_preference("theme", json!("dark"));

        let value = profile.to_value();
        let restored = UserProfile::from_value(&value);
        assert_eq!(restored.name(), Some("Ann"));
        assert_eq!(restored.preference("theme").unwrap(), &json!("dark"));
    }
}
