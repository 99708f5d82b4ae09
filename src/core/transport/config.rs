//! Transport configuration types.

use serde::{Deserialize, Serialize};

/// Transport configuration options.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum TransportConfig {
    /// Standard input/output transport (default for MCP).
    #[cfg(feature = "stdio")]
    Stdio,

    /// HTTP transport: JSON-RPC over POST, responses on a Server-Sent Events stream.
    #[cfg(feature = "sse")]
    Sse(SseConfig),
}

/// SSE transport configuration.
#[cfg(feature = "sse")]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SseConfig {
    /// Port number to listen on.
    pub port: u16,

    /// Host address to bind to.
    #[serde(default = "default_host")]
    pub host: String,

    /// Path clients open the event stream on.
    #[serde(default = "default_sse_path")]
    pub sse_path: String,

    /// Path clients POST session messages to.
    #[serde(default = "default_message_path")]
    pub message_path: String,

    /// Path for plain request/response JSON-RPC (no session).
    #[serde(default = "default_rpc_path")]
    pub rpc_path: String,

    /// Enable CORS for browser clients.
    #[serde(default = "default_cors")]
    pub enable_cors: bool,

    /// Interval between keep-alive comments on idle streams, in seconds.
    #[serde(default = "default_keep_alive_secs")]
    pub keep_alive_secs: u64,
}

#[cfg(feature = "sse")]
fn default_host() -> String {
    "127.0.0.1".to_string()
}

#[cfg(feature = "sse")]
fn default_sse_path() -> String {
    "/sse".to_string()
}

#[cfg(feature = "sse")]
fn default_message_path() -> String {
    "/message".to_string()
}

#[cfg(feature = "sse")]
fn default_rpc_path() -> String {
    "/mcp".to_string()
}

#[cfg(feature = "sse")]
fn default_cors() -> bool {
    true
}

#[cfg(feature = "sse")]
fn default_keep_alive_secs() -> u64 {
    15
}

impl Default for TransportConfig {
    fn default() -> Self {
        #[cfg(feature = "stdio")]
        {
            Self::Stdio
        }

        #[cfg(all(not(feature = "stdio"), feature = "sse"))]
        {
            Self::Sse(SseConfig::default())
        }

        #[cfg(not(any(feature = "stdio", feature = "sse")))]
        {
            compile_error!("At least one transport feature must be enabled: stdio or sse");
        }
    }
}

#[cfg(feature = "sse")]
impl Default for SseConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            host: default_host(),
            sse_path: default_sse_path(),
            message_path: default_message_path(),
            rpc_path: default_rpc_path(),
            enable_cors: default_cors(),
            keep_alive_secs: default_keep_alive_secs(),
        }
    }
}

impl TransportConfig {
    /// Create a STDIO transport config.
    #[cfg(feature = "stdio")]
    pub fn stdio() -> Self {
        Self::Stdio
    }

    /// Create an SSE transport config.
    #[cfg(feature = "sse")]
    pub fn sse(port: u16, host: impl Into<String>) -> Self {
        Self::Sse(SseConfig {
            port,
            host: host.into(),
            ..Default::default()
        })
    }

    /// Load transport config from environment variables.
    ///
    /// `MCP_TRANSPORT` selects `stdio` or `sse`; anything else falls back to
    /// the default transport.
    pub fn from_env() -> Self {
        let transport = std::env::var("MCP_TRANSPORT")
            .unwrap_or_default()
            .to_lowercase();

        match transport.as_str() {
            #[cfg(feature = "sse")]
            "sse" => Self::Sse(SseConfig::from_env()),
            _ => Self::default(),
        }
    }

    /// Get a description of this transport for logging.
    pub fn description(&self) -> String {
        match self {
            #[cfg(feature = "stdio")]
            Self::Stdio => "STDIO (standard MCP mode)".to_string(),
            #[cfg(feature = "sse")]
            Self::Sse(cfg) => format!("SSE on {}:{}{}", cfg.host, cfg.port, cfg.sse_path),
        }
    }

    /// Check if this transport is the standard STDIO mode.
    pub fn is_stdio(&self) -> bool {
        #[cfg(feature = "stdio")]
        {
            matches!(self, Self::Stdio)
        }
        #[cfg(not(feature = "stdio"))]
        {
            false
        }
    }
}

#[cfg(feature = "sse")]
impl SseConfig {
    /// Read `MCP_SSE_*` variables over the defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let var = |name: &str| std::env::var(name).ok();

        Self {
            port: var("MCP_SSE_PORT")
                .and_then(|p| p.parse().ok())
                .unwrap_or(defaults.port),
            host: var("MCP_SSE_HOST").unwrap_or(defaults.host),
            sse_path: var("MCP_SSE_PATH").unwrap_or(defaults.sse_path),
            message_path: var("MCP_SSE_MESSAGE_PATH").unwrap_or(defaults.message_path),
            rpc_path: var("MCP_SSE_RPC_PATH").unwrap_or(defaults.rpc_path),
            enable_cors: var("MCP_SSE_CORS")
                .map(|v| crate::core::config::parse_flag(&v, true))
                .unwrap_or(defaults.enable_cors),
            keep_alive_secs: var("MCP_SSE_KEEP_ALIVE")
                .and_then(|s| s.parse().ok())
                .filter(|secs| *secs > 0)
                .unwrap_or(defaults.keep_alive_secs),
        }
    }

    /// Get the bind address.
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
