//! Tool-specific error types.

use rmcp::ErrorData as McpError;
use thiserror::Error;

use super::schema::ValidationErrors;

/// Errors that can occur during tool operations.
#[derive(Debug, Error)]
pub enum ToolError {
    /// The requested tool was not found.
    #[error("Tool not found: {0}")]
    NotFound(String),

    /// The arguments did not satisfy the tool's parameter schema.
    #[error("Invalid arguments: {0}")]
    Validation(#[from] ValidationErrors),

    /// Two tool definitions declared the same name.
    #[error("Duplicate tool name: {0}")]
    DuplicateName(String),

    /// A tool definition is malformed (bad name, empty description, ...).
    #[error("Invalid tool definition: {0}")]
    InvalidDefinition(String),

    /// The tool execution failed.
    #[error("Execution failed: {0}")]
    ExecutionFailed(String),

    /// An internal error occurred.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ToolError {
    /// Create a new "not found" error.
    pub fn not_found(name: impl Into<String>) -> Self {
        Self::NotFound(name.into())
    }

    /// Create a new "duplicate name" error.
    pub fn duplicate_name(name: impl Into<String>) -> Self {
        Self::DuplicateName(name.into())
    }

    /// Create a new "invalid definition" error.
    pub fn invalid_definition(msg: impl Into<String>) -> Self {
        Self::InvalidDefinition(msg.into())
    }

    /// Create a new "execution failed" error.
    pub fn execution_failed(msg: impl Into<String>) -> Self {
        Self::ExecutionFailed(msg.into())
    }

    /// Create a new "internal" error.
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Whether this error was raised before the implementation routine ran.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Convert into the rmcp protocol error returned to clients.
    ///
    /// Unknown tools and validation failures are `invalid_params`; the
    /// latter carries the per-parameter violations as structured data.
    pub fn to_mcp_error(&self) -> McpError {
        match self {
            Self::NotFound(_) => McpError::invalid_params(self.to_string(), None),
            Self::Validation(errors) => {
                McpError::invalid_params(self.to_string(), Some(errors.to_json()))
            }
            _ => McpError::internal_error(self.to_string(), None),
        }
    }
}

impl From<ToolError> for McpError {
    fn from(err: ToolError) -> Self {
        err.to_mcp_error()
    }
}
