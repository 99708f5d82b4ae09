//! Tools domain module.
//!
//! This module handles all tool-related functionality for the MCP server.
//! Tools are executable functions that can be called by MCP clients to perform
//! specific actions or computations.
//!
//! ## Architecture
//!
//! - `definitions/` - Individual tool implementations (one file per tool)
//! - `schema.rs` - Parameter rules and argument validation
//! - `metadata.rs` - Tool names, descriptions and behavior hints
//! - `registry.rs` - Central tool registry and dispatch
//! - `error.rs` - Tool-specific error types
//!
//! ## Adding a New Tool
//!
//! 1. Create a new file in `definitions/` (e.g., `my_tool.rs`)
//! 2. Implement `ToolDefinition`: metadata, schema and `call()`
//! 3. Export in `definitions/mod.rs`
//! 4. Add it to `builtin_definitions()` in `registry.rs`
//!
//! **No need to modify `server.rs` or any transport!**

pub mod definitions;
mod error;
pub mod metadata;
mod registry;
pub mod schema;

pub use definitions::ToolDefinition;
pub use error::ToolError;
pub use metadata::{ToolHints, ToolMetadata};
pub use registry::{RegisteredTool, ToolRegistry, builtin_definitions, find_duplicate_names};
pub use schema::{
    CompiledRule, CompiledSchema, ParamKind, ParamRule, ParameterSchema, ToolParams, ValidationError,
    ValidationErrors,
};
