//! Tool trait — named, independently invokable capabilities.
//!
//! Tools validate their parameters up front and fail fast with an error
//! naming the missing key. `execute` never propagates an error past its
//! own boundary: failures come back as a `ToolResult` with
//! `success: false`, so callers never need a recovery path around tool
//! invocation. The only error a caller can see is a registry lookup miss.

use async_trait::async_trait;
use chrono::Utc;
use serde_json::{Map, Value};
use std::collections::HashMap;

use crate::error::ToolError;

/// The uniform result shape every tool execution produces.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ToolResult {
    /// Whether the tool executed successfully
    pub success: bool,

    /// Optional structured output
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,

    /// Error message when `success` is false
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Tool name, timestamp, and any tool-specific extras
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub metadata: Map<String, Value>,
}

impl ToolResult {
    /// Build a result stamped with the producing tool's name and the
    /// current time.
    pub fn new(
        tool_name: &str,
        success: bool,
        data: Option<Value>,
        error: Option<String>,
    ) -> Self {
        let mut metadata = Map::new();
        metadata.insert("toolName".into(), Value::String(tool_name.into()));
        metadata.insert(
            "timestamp".into(),
            Value::String(Utc::now().to_rfc3339()),
        );
        Self {
            success,
            data,
            error,
            metadata,
        }
    }

    pub fn ok(tool_name: &str, data: Value) -> Self {
        Self::new(tool_name, true, Some(data), None)
    }

    pub fn fail(tool_name: &str, error: impl Into<String>) -> Self {
        Self::new(tool_name, false, None, Some(error.into()))
    }
}

/// Check that every required key is present in `params`.
///
/// Fails with the first missing key by name, before any work is done.
pub fn validate_params(params: &Value, required: &[&str]) -> Result<(), ToolError> {
    for key in required {
        if params.get(key).is_none() {
            return Err(ToolError::MissingParameter((*key).into()));
        }
    }
    Ok(())
}

/// The core Tool trait.
#[async_trait]
pub trait Tool: Send + Sync {
    /// The unique name of this tool (e.g. "tester").
    fn name(&self) -> &str;

    /// A description of what this tool does.
    fn description(&self) -> &str;

    /// Execute the tool with the given parameters.
    ///
    /// Must not panic and must not surface errors: any failure —
    /// including missing parameters — is returned as a failed
    /// `ToolResult`.
    async fn execute(&self, params: Value) -> ToolResult;
}

/// A registry of available tools, keyed by name.
pub struct ToolRegistry {
    tools: HashMap<String, Box<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
        }
    }

    /// Register a tool. Silently replaces any existing tool with the
    /// same name.
    pub fn register(&mut self, tool: Box<dyn Tool>) {
        let name = tool.name().to_string();
        self.tools.insert(name, tool);
    }

    /// Get a tool by name.
    pub fn get(&self, name: &str) -> Option<&dyn Tool> {
        self.tools.get(name).map(|t| t.as_ref())
    }

    /// List all registered tool names.
    pub fn names(&self) -> Vec<&str> {
        self.tools.keys().map(|s| s.as_str()).collect()
    }

    /// All registered tools.
    pub fn all(&self) -> Vec<&dyn Tool> {
        self.tools.values().map(|t| t.as_ref()).collect()
    }

    /// Invoke a tool by name.
    ///
    /// Fails with `ToolError::NotFound` when the name is unregistered —
    /// a caller error, never retried. A registered tool's own failures
    /// arrive inside the `ToolResult`.
    pub async fn use_tool(&self, name: &str, params: Value) -> Result<ToolResult, ToolError> {
        let tool = self
            .tools
            .get(name)
            .ok_or_else(|| ToolError::NotFound(name.into()))?;
        Ok(tool.execute(params).await)
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    /// A simple test tool that echoes back its "text" parameter.
    struct EchoTool;

    #[async_trait]
    impl Tool for EchoTool {
        fn name(&self) -> &str {
            "echo"
        }

        fn description(&self) -> &str {
            "Echoes back the input"
        }

        async fn execute(&self, params: Value) -> ToolResult {
            if let Err(e) = validate_params(&params, &["text"]) {
                return ToolResult::fail(self.name(), e.to_string());
            }
            ToolResult::ok(self.name(), params["text"].clone())
        }
    }

    #[test]
    fn registry_register_and_lookup() {
        let mut registry = ToolRegistry::new();
        registry.register(Box::new(EchoTool));
        assert!(registry.get("echo").is_some());
        assert!(registry.get("nonexistent").is_none());
    }

    #[test]
    fn register_replaces_same_name() {
        let mut registry = ToolRegistry::new();
        registry.register(Box::new(EchoTool));
        registry.register(Box::new(EchoTool));
        assert_eq!(registry.names(), vec!["echo"]);
    }

    #[tokio::test]
    async fn use_tool_delegates() {
        let mut registry = ToolRegistry::new();
        registry.register(Box::new(EchoTool));

        let result = registry
            .use_tool("echo", json!({"text": "hello world"}))
            .await
            .unwrap();
        assert!(result.success);
        assert_eq!(result.data.unwrap(), "hello world");
        assert_eq!(result.metadata["toolName"], "echo");
    }

    #[tokio::test]
    async fn use_tool_missing_is_not_found() {
        let registry = ToolRegistry::new();
        let err = registry.use_tool("nonexistent", json!({})).await.unwrap_err();
        assert!(matches!(err, ToolError::NotFound(_)));
    }

    #[tokio::test]
    async fn missing_parameter_fails_inside_result() {
        let mut registry = ToolRegistry::new();
        registry.register(Box::new(EchoTool));

        // No "text" key — the tool fails fast but never errors out.
        let result = registry.use_tool("echo", json!({})).await.unwrap();
        assert!(!result.success);
        assert!(result.error.unwrap().contains("text"));
    }
}
