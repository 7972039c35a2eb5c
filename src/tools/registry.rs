//! Tool registry - the fixed set of tools built at startup

use std::collections::HashMap;

use log::warn;

use super::{GetWeatherTool, SendEmailTool, Tool, ToolSpec};
use crate::error::{Result, ToolchatError};

/// Maps tool names to their implementations
pub struct ToolRegistry {
    tools: HashMap<String, Box<dyn Tool>>,
}

impl ToolRegistry {
    /// Create a registry with the standard mock tools
    pub fn standard() -> Self {
        let mut registry = Self::new();
        let tools: Vec<Box<dyn Tool>> = vec![Box::new(GetWeatherTool), Box::new(SendEmailTool)];
        for tool in tools {
            if let Err(e) = registry.register(tool) {
                warn!("Skipping tool: {}", e);
            }
        }
        registry
    }

    /// Create an empty registry (for custom tool sets)
    pub fn new() -> Self {
        Self { tools: HashMap::new() }
    }

    /// Add a tool; names must be unique
    pub fn register(&mut self, tool: Box<dyn Tool>) -> Result<()> {
        let name = tool.name();
        if self.has_tool(name) {
            return Err(ToolchatError::Tool(format!("duplicate tool: {}", name)));
        }
        self.tools.insert(name.to_string(), tool);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&dyn Tool> {
        self.tools.get(name).map(|t| t.as_ref())
    }

    /// Check if a tool exists
    pub fn has_tool(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    /// Tool names, sorted
    pub fn tool_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.tools.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }

    /// Registration specs for every tool, sorted by name
    pub fn specs(&self) -> Vec<ToolSpec> {
        self.tool_names()
            .into_iter()
            .filter_map(|name| self.get(name))
            .map(ToolSpec::from_tool)
            .collect()
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::{ArgumentSchema, ValidatedArgs};

    struct EchoTool;

    impl Tool for EchoTool {
        fn name(&self) -> &'static str {
            "echo"
        }

        fn description(&self) -> &'static str {
            "Echo nothing back"
        }

        fn schema(&self) -> ArgumentSchema {
            ArgumentSchema::new()
        }

        fn execute(&self, _args: &ValidatedArgs) -> eyre::Result<String> {
            Ok("echo".to_string())
        }
    }

    #[test]
    fn test_standard_registry_has_all_tools() {
        let registry = ToolRegistry::standard();
        assert!(registry.has_tool("get_weather"));
        assert!(registry.has_tool("send_email"));
        assert_eq!(registry.tool_names(), vec!["get_weather", "send_email"]);
    }

    #[test]
    fn test_standard_registry_keys_match_tool_names() {
        let registry = ToolRegistry::standard();
        for name in registry.tool_names() {
            assert_eq!(registry.get(name).unwrap().name(), name);
        }
    }

    #[test]
    fn test_specs_sorted() {
        let specs = ToolRegistry::standard().specs();
        assert_eq!(specs.len(), 2);
        assert_eq!(specs[0].name, "get_weather");
        assert_eq!(specs[1].name, "send_email");
    }

    #[test]
    fn test_empty_registry() {
        let registry = ToolRegistry::new();
        assert!(registry.tool_names().is_empty());
        assert!(registry.get("get_weather").is_none());
    }

    #[test]
    fn test_register_custom_tool() {
        let mut registry = ToolRegistry::new();
        registry.register(Box::new(EchoTool)).unwrap();
        assert!(registry.has_tool("echo"));
        assert!(!registry.has_tool("get_weather"));
    }

    #[test]
    fn test_register_duplicate_rejected() {
        let mut registry = ToolRegistry::standard();
        let result = registry.register(Box::new(GetWeatherTool));
        assert!(matches!(result, Err(ToolchatError::Tool(m)) if m.contains("get_weather")));
    }
}
