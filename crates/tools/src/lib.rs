//! Built-in tool implementations for Confidant.
//!
//! Tools are registered by name on an agent session and invoked through
//! its registry. Every tool validates its parameters up front and
//! returns failures inside the uniform `ToolResult` shape.

pub mod tester;

use confidant_core::tool::ToolRegistry;

pub use tester::TesterTool;

/// Create a registry with all built-in tools.
pub fn default_registry() -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    registry.register(Box::new(TesterTool));
    registry
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_registry_has_tester() {
        let registry = default_registry();
        assert!(registry.get("tester").is_some());
    }
}
