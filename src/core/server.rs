//! MCP Server implementation and lifecycle management.
//!
//! This module contains the main server handler that implements the MCP
//! protocol by delegating to the tool registry.
//!
//! ## Tool Architecture
//!
//! Tools are defined in `domains/tools/definitions/` with one file per tool
//! and listed once in the registration table in `domains/tools/registry.rs`.
//! Every transport goes through the same registry, so validation and error
//! shaping behave identically over STDIO and SSE.

use rmcp::{
    ErrorData as McpError, RoleServer, ServerHandler, model::*, service::RequestContext,
};
use std::sync::Arc;
use tracing::{debug, info, instrument};

use super::config::Config;
use crate::domains::tools::{ToolError, ToolRegistry};

/// The main MCP server handler.
///
/// This struct implements the `ServerHandler` trait from rmcp. It is cheap
/// to clone; clones share the same configuration and registry.
#[derive(Clone)]
pub struct McpServer {
    /// Server configuration.
    config: Arc<Config>,

    /// Registered tools, keyed by name.
    registry: Arc<ToolRegistry>,
}

impl McpServer {
    /// Create a new MCP server exposing the built-in tools.
    ///
    /// Fails if the built-in registration table is inconsistent (for
    /// example two tools sharing a name).
    pub fn new(config: Config) -> Result<Self, ToolError> {
        let config = Arc::new(config);
        let registry = ToolRegistry::builtin(config.clone())?;
        info!("Registered tools: {}", registry.tool_names().join(", "));

        Ok(Self {
            config,
            registry: Arc::new(registry),
        })
    }

    /// Create a server around an already-built registry.
    pub fn with_registry(config: Config, registry: ToolRegistry) -> Self {
        Self {
            config: Arc::new(config),
            registry: Arc::new(registry),
        }
    }

    /// Get the server name.
    pub fn name(&self) -> &str {
        &self.config.server.name
    }

    /// Get the server version.
    pub fn version(&self) -> &str {
        &self.config.server.version
    }

    /// Instructions advertised to clients on initialization.
    pub fn instructions(&self) -> Option<&str> {
        self.config.server.instructions.as_deref()
    }

    /// Get the server configuration (for tool access).
    pub fn config(&self) -> &Arc<Config> {
        &self.config
    }

    pub fn registry(&self) -> &Arc<ToolRegistry> {
        &self.registry
    }

    // ========================================================================
    // HTTP Transport Support Methods
    // ========================================================================

    /// List all available tools as JSON (for the SSE transport).
    pub fn list_tools(&self) -> Vec<serde_json::Value> {
        self.registry
            .list_tools()
            .iter()
            .filter_map(|tool| serde_json::to_value(tool).ok())
            .collect()
    }

    /// Call a tool by name (for the SSE transport).
    pub async fn call_tool(
        &self,
        name: &str,
        arguments: Option<JsonObject>,
    ) -> Result<CallToolResult, ToolError> {
        self.registry.call_tool(name, arguments).await
    }
}

impl ServerHandler for McpServer {
    fn get_info(&self) -> ServerInfo {
        let mut server_info = Implementation::from_build_env();
        server_info.name = self.config.server.name.clone();
        server_info.version = self.config.server.version.clone();

        ServerInfo {
            instructions: self.config.server.instructions.clone(),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info,
            ..Default::default()
        }
    }

    #[instrument(skip(self, _context))]
    async fn list_tools(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, McpError> {
        debug!("Listing tools");
        Ok(ListToolsResult {
            tools: self.registry.list_tools(),
            next_cursor: None,
            meta: None,
        })
    }

    #[instrument(skip(self, _context), fields(tool = %request.name))]
    async fn call_tool(
        &self,
        request: CallToolRequestParam,
        _context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, McpError> {
        info!("Calling tool: {}", request.name);
        self.registry
            .call_tool(&request.name, request.arguments)
            .await
            .map_err(|e| e.to_mcp_error())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn server() -> McpServer {
        McpServer::new(Config::default()).unwrap()
    }

    #[test]
    fn test_get_info_advertises_tools_only() {
        let info = server().get_info();
        assert!(info.capabilities.tools.is_some());
        assert!(info.capabilities.resources.is_none());
        assert!(info.capabilities.prompts.is_none());
        assert_eq!(info.server_info.name, "mcp-tool-server");
    }

    #[test]
    fn test_list_tools_json_shape() {
        let tools = server().list_tools();
        let add = tools
            .iter()
            .find(|t| t["name"] == "add")
            .expect("add tool listed");
        assert_eq!(add["inputSchema"]["type"], "object");
        assert!(add["inputSchema"]["properties"]["a"].is_object());
        assert_eq!(add["annotations"]["readOnlyHint"], true);
    }

    #[tokio::test]
    async fn test_call_tool_goes_through_registry() {
        let server = server();
        let result = server
            .call_tool("add", json!({"a": 2, "b": 3}).as_object().cloned())
            .await
            .unwrap();
        assert_ne!(result.is_error, Some(true));

        let err = server.call_tool("nope", None).await.unwrap_err();
        assert!(matches!(err, ToolError::NotFound(_)));
    }

    #[test]
    fn test_with_registry_uses_given_tools() {
        let server = McpServer::with_registry(Config::default(), ToolRegistry::new());
        assert!(server.list_tools().is_empty());
        assert!(server.registry().is_empty());
    }
}
