mod error;

pub use error::RegistryError;

use std::collections::HashMap;

use crate::models::{McpServerConfig, ToolInfo, ToolSource};

/// The nine built-in Claude Code tools, pre-registered by
/// [`ToolRegistry::with_defaults`].
const BUILTIN_TOOLS: &[(&str, &str)] = &[
    ("Read", "Read files (text, images, PDFs, notebooks)"),
    ("Write", "Write files"),
    ("Edit", "Edit file content"),
    ("Bash", "Execute shell commands"),
    ("Glob", "File pattern matching"),
    ("Grep", "Search with regex"),
    ("WebSearch", "Search the web"),
    ("WebFetch", "Fetch and analyze web content"),
    ("AskUserQuestion", "Get user input (Tier-3 implicit tool)"),
];

/// Name-keyed map of every tool currently available to the executor,
/// whether built-in or contributed by a registered MCP server.
#[derive(Debug, Default)]
pub struct ToolRegistry {
    tools: HashMap<String, ToolInfo>,
    mcp_servers: HashMap<String, McpServerConfig>,
    mcp_server_tools: HashMap<String, Vec<String>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry with the nine built-in Claude Code tools pre-registered.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        for (name, description) in BUILTIN_TOOLS {
            registry
                .register_builtin(name, description)
                .expect("builtin tool names are unique by construction");
        }
        registry
    }

    pub fn register_builtin(
        &mut self,
        tool_name: &str,
        description: &str,
    ) -> Result<(), RegistryError> {
        if self.tools.contains_key(tool_name) {
            return Err(RegistryError::ToolAlreadyRegistered(tool_name.to_string()));
        }
        self.tools.insert(
            tool_name.to_string(),
            ToolInfo {
                name: tool_name.to_string(),
                description: description.to_string(),
                source: ToolSource::Builtin,
                server_name: None,
            },
        );
        Ok(())
    }

    /// Registers an MCP server and the tools it contributes, atomically:
    /// if the server name or any tool name collides with what's already
    /// registered, nothing is mutated.
    pub fn register_mcp_server(
        &mut self,
        server_name: &str,
        server_config: McpServerConfig,
        tools: Vec<ToolInfo>,
    ) -> Result<(), RegistryError> {
        if self.mcp_servers.contains_key(server_name) {
            return Err(RegistryError::ServerAlreadyRegistered(
                server_name.to_string(),
            ));
        }
        for tool in &tools {
            if self.tools.contains_key(&tool.name) {
                return Err(RegistryError::ToolAlreadyRegistered(tool.name.clone()));
            }
        }

        let tool_names: Vec<String> = tools.iter().map(|t| t.name.clone()).collect();
        self.mcp_servers
            .insert(server_name.to_string(), server_config);
        self.mcp_server_tools
            .insert(server_name.to_string(), tool_names);
        for tool in tools {
            self.tools.insert(tool.name.clone(), tool);
        }
        Ok(())
    }

    pub fn unregister_mcp_server(&mut self, server_name: &str) -> Result<(), RegistryError> {
        if !self.mcp_servers.contains_key(server_name) {
            return Err(RegistryError::ServerNotRegistered(server_name.to_string()));
        }
        if let Some(tool_names) = self.mcp_server_tools.remove(server_name) {
            for tool_name in tool_names {
                self.tools.remove(&tool_name);
            }
        }
        self.mcp_servers.remove(server_name);
        Ok(())
    }

    pub fn list_tools(&self) -> Vec<&ToolInfo> {
        self.tools.values().collect()
    }

    pub fn get_tool_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.tools.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn validate_tool_name(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    pub fn get_mcp_server_configs(&self) -> &HashMap<String, McpServerConfig> {
        &self.mcp_servers
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn with_defaults_registers_nine_builtins() {
        let registry = ToolRegistry::with_defaults();
        assert_eq!(registry.list_tools().len(), 9);
        assert!(registry.validate_tool_name("AskUserQuestion"));
    }

    #[test]
    fn register_builtin_rejects_duplicates() {
        let mut registry = ToolRegistry::new();
        registry.register_builtin("Read", "read files").unwrap();
        let err = registry.register_builtin("Read", "again").unwrap_err();
        assert_eq!(err, RegistryError::ToolAlreadyRegistered("Read".to_string()));
    }

    #[test]
    fn register_mcp_server_is_atomic_on_tool_collision() {
        let mut registry = ToolRegistry::with_defaults();
        let tools = vec![
            ToolInfo {
                name: "CustomTool".to_string(),
                description: "new".to_string(),
                source: ToolSource::Mcp,
                server_name: Some("srv".to_string()),
            },
            ToolInfo {
                name: "Read".to_string(),
                description: "collides".to_string(),
                source: ToolSource::Mcp,
                server_name: Some("srv".to_string()),
            },
        ];
        let err = registry
            .register_mcp_server("srv", McpServerConfig::default(), tools)
            .unwrap_err();
        assert_eq!(err, RegistryError::ToolAlreadyRegistered("Read".to_string()));
        assert!(!registry.validate_tool_name("CustomTool"));
    }

    #[test]
    fn unregister_mcp_server_removes_its_tools() {
        let mut registry = ToolRegistry::new();
        let tools = vec![ToolInfo {
            name: "CustomTool".to_string(),
            description: "new".to_string(),
            source: ToolSource::Mcp,
            server_name: Some("srv".to_string()),
        }];
        registry
            .register_mcp_server("srv", McpServerConfig::default(), tools)
            .unwrap();
        assert!(registry.validate_tool_name("CustomTool"));
        registry.unregister_mcp_server("srv").unwrap();
        assert!(!registry.validate_tool_name("CustomTool"));
    }

    #[test]
    fn unregister_unknown_server_errors() {
        let mut registry = ToolRegistry::new();
        let err = registry.unregister_mcp_server("nope").unwrap_err();
        assert_eq!(err, RegistryError::ServerNotRegistered("nope".to_string()));
    }
}
