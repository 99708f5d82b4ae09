//! MCP Tool Server Library
//!
//! This crate provides a Model Context Protocol (MCP) server built around
//! declarative tool definitions. Each tool pairs a parameter schema and
//! descriptive metadata with an async implementation routine; the registry
//! validates every call against the schema before the routine runs.
//!
//! # Architecture
//!
//! - **core**: Configuration, error handling, path security, the MCP server
//!   handler and the transports (STDIO, SSE)
//! - **domains**: Business logic organized by bounded contexts
//!   - **tools**: Tool schemas, metadata, definitions and the registry
//!
//! # Example
//!
//! ```rust,no_run
//! use mcp_tool_server::core::{Config, McpServer, TransportService};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::from_env();
//!     let transport = TransportService::new(config.transport.clone());
//!     let server = McpServer::new(config)?;
//!     transport.run(server).await?;
//!     Ok(())
//! }
//! ```

pub mod core;
pub mod domains;

// Re-export commonly used types for convenience
pub use core::{Config, Error, McpServer, Result};
pub use domains::tools::{ParamRule, ParameterSchema, ToolDefinition, ToolMetadata, ToolRegistry};
