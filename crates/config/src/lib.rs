//! Settings loading, validation, and management for Confidant.
//!
//! Loads settings from `~/.confidant/config.toml` with environment
//! variable overrides. The settings model mirrors what the chat host
//! edits: a list of LLM servers, the selected server id, and a theme.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::warn;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Read(String),

    #[error("Failed to parse config file: {0}")]
    Parse(String),

    #[error("Failed to write config file: {0}")]
    Write(String),

    #[error("No LLM server selected (selected_server = {0:?})")]
    NoServerSelected(String),
}

/// The kind of LLM server endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServerKind {
    OpenAi,
    Custom,
    LmStudio,
}

/// One configured LLM server.
#[derive(Clone, Serialize, Deserialize)]
pub struct LlmServer {
    /// Stable id referenced by `Settings::selected_server`
    pub id: String,

    /// Display name
    pub name: String,

    /// Base URL of the OpenAI-compatible API (e.g. `http://localhost:1234/v1`)
    pub url: String,

    /// API key; LM Studio servers don't need one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Endpoint kind
    pub kind: ServerKind,
}

impl std::fmt::Debug for LlmServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmServer")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("url", &self.url)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("kind", &self.kind)
            .finish()
    }
}

/// UI theme preference, persisted alongside the server list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Dark,
    Light,
}

/// The root settings structure, mapped to `~/.confidant/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Id of the active server in `servers`
    pub selected_server: String,

    /// All configured servers
    #[serde(default)]
    pub servers: Vec<LlmServer>,

    /// Theme preference
    #[serde(default)]
    pub theme: Theme,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            selected_server: "lmstudio".into(),
            servers: vec![LlmServer {
                id: "lmstudio".into(),
                name: "LM Studio".into(),
                url: "http://localhost:1234/v1".into(),
                api_key: None,
                kind: ServerKind::LmStudio,
            }],
            theme: Theme::Dark,
        }
    }
}

impl Settings {
    /// Default config file path: `~/.confidant/config.toml`.
    pub fn default_path() -> PathBuf {
        let home = std::env::var("HOME")
            .or_else(|_| std::env::var("USERPROFILE"))
            .unwrap_or_else(|_| ".".to_string());
        PathBuf::from(home).join(".confidant").join("config.toml")
    }

    /// Load settings from the given path.
    ///
    /// A missing file yields the defaults; a present but unparseable file
    /// is an error (a hand-edited config should not be silently dropped).
    /// `CONFIDANT_API_KEY` overrides the selected server's key.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let mut settings = match std::fs::read_to_string(path) {
            Ok(content) => {
                toml::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))?
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!(path = %path.display(), "No config file found, using defaults");
                Self::default()
            }
            Err(e) => return Err(ConfigError::Read(e.to_string())),
        };
        settings.apply_env_overrides();
        Ok(settings)
    }

    /// Write settings to the given path, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::Write(e.to_string()))?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| ConfigError::Write(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| ConfigError::Write(e.to_string()))
    }

    /// Resolve the currently selected server.
    pub fn selected(&self) -> Result<&LlmServer, ConfigError> {
        self.servers
            .iter()
            .find(|s| s.id == self.selected_server)
            .ok_or_else(|| ConfigError::NoServerSelected(self.selected_server.clone()))
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(key) = std::env::var("CONFIDANT_API_KEY") {
            let selected = self.selected_server.clone();
            if let Some(server) = self.servers.iter_mut().find(|s| s.id == selected) {
                server.api_key = Some(key);
            }
        }
    }
}
