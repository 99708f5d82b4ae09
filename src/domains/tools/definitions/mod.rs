//! Tool definitions module.
//!
//! Each tool is defined in its own file with:
//! - Metadata (name, description, behavior hints)
//! - A parameter schema
//! - The implementation routine
//!
//! ## Adding a New Tool
//!
//! 1. Create a new file (e.g., `my_tool.rs`)
//! 2. Implement the `ToolDefinition` trait
//! 3. Export it here
//! 4. Add it to `builtin_definitions()` in `registry.rs`

use async_trait::async_trait;
use rmcp::model::{CallToolResult, JsonObject};
use std::sync::Arc;

use super::error::ToolError;
use super::metadata::ToolMetadata;
use super::schema::{ParameterSchema, ToolParams};

pub mod fs;
pub mod greet;
pub mod math;

pub use fs::{FsDeleteTool, FsListDirTool};
pub use greet::GreetTool;
pub use math::AddTool;

/// Trait for tool definitions.
///
/// The registry reads `metadata()` and `schema()` once at registration and
/// validates every call against the schema before `call()` runs.
#[async_trait]
pub trait ToolDefinition: Send + Sync {
    /// Identity, description and behavior hints.
    fn metadata(&self) -> ToolMetadata;

    /// Parameters accepted by `call()`.
    fn schema(&self) -> ParameterSchema;

    /// JSON Schema of the structured content, if the tool returns any.
    fn output_schema(&self) -> Option<Arc<JsonObject>> {
        None
    }

    /// Run the tool with arguments that satisfied `schema()`.
    async fn call(&self, params: ToolParams) -> Result<CallToolResult, ToolError>;
}
