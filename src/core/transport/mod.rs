//! Transport layer for the MCP server.
//!
//! This module provides different transport implementations:
//! - **STDIO**: Standard input/output (default for MCP) - feature: `stdio`
//! - **SSE**: HTTP with Server-Sent Events plus a direct JSON-RPC endpoint -
//!   feature: `sse`
//!
//! Each transport handles the connection lifecycle and delegates
//! message processing to the MCP server handler.
//!
//! # Feature Flags
//!
//! Transport implementations are conditionally compiled based on features:
//! - `stdio` (default): STDIO transport - minimal dependencies
//! - `sse` (default): SSE transport - adds tokio/net, axum, tower, tower-http, uuid

mod config;
mod error;
mod service;

#[cfg(feature = "sse")]
pub mod jsonrpc;

#[cfg(feature = "sse")]
pub mod sse;

#[cfg(feature = "stdio")]
pub mod stdio;

pub use config::TransportConfig;
pub use error::{TransportError, TransportResult};
pub use service::{TransportService, TransportServiceBuilder};

#[cfg(feature = "sse")]
pub use config::SseConfig;
