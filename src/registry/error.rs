use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("Tool '{0}' already registered")]
    ToolAlreadyRegistered(String),
    #[error("MCP server '{0}' already registered")]
    ServerAlreadyRegistered(String),
    #[error("MCP server '{0}' not registered")]
    ServerNotRegistered(String),
}
