//! Domains module containing business logic organized by bounded contexts.
//!
//! The server currently exposes a single capability, tools. New MCP
//! capabilities get their own subdomain next to it.

pub mod tools;
