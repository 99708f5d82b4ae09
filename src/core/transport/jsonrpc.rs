//! JSON-RPC 2.0 message types and dispatch for the HTTP-based transport.
//!
//! The STDIO transport gets all of this from rmcp. The SSE transport
//! receives raw HTTP bodies, so it parses them here and routes each request
//! to the same [`McpServer`] used by STDIO.

use rmcp::ErrorData as McpError;
use rmcp::model::JsonObject;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{debug, info, warn};

use crate::core::McpServer;
use crate::domains::tools::ValidationErrors;

/// Protocol version reported by `initialize`.
pub const PROTOCOL_VERSION: &str = "2024-11-05";

pub const PARSE_ERROR: i32 = -32700;
pub const INVALID_REQUEST: i32 = -32600;
pub const METHOD_NOT_FOUND: i32 = -32601;
pub const INVALID_PARAMS: i32 = -32602;
pub const INTERNAL_ERROR: i32 = -32603;

/// JSON-RPC request structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: String,
    #[serde(default)]
    pub id: Option<Value>,
    pub method: String,
    #[serde(default)]
    pub params: Option<Value>,
}

/// JSON-RPC response structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: String,
    pub id: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

/// JSON-RPC error structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcError {
    pub code: i32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl JsonRpcRequest {
    /// Build a request (used by tests and in-process callers).
    pub fn new(id: impl Into<Value>, method: impl Into<String>, params: Option<Value>) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id: Some(id.into()),
            method: method.into(),
            params,
        }
    }

    /// Parse a raw HTTP body.
    ///
    /// Malformed JSON yields a parse error; well-formed JSON that is not a
    /// request object yields an invalid-request error.
    pub fn parse(body: &str) -> Result<Self, JsonRpcResponse> {
        let value: Value = serde_json::from_str(body)
            .map_err(|e| JsonRpcResponse::error(None, PARSE_ERROR, format!("Parse error: {}", e)))?;

        let id = value.get("id").cloned();
        serde_json::from_value(value).map_err(|e| {
            JsonRpcResponse::error(id, INVALID_REQUEST, format!("Invalid Request: {}", e))
        })
    }

    /// Requests without an id, and anything under `notifications/`, get no reply.
    pub fn is_notification(&self) -> bool {
        self.id.is_none() || self.method.starts_with("notifications/")
    }
}

impl JsonRpcResponse {
    /// Create a success response.
    pub fn success(id: Option<Value>, result: Value) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: Some(result),
            error: None,
        }
    }

    /// Create an error response.
    pub fn error(id: Option<Value>, code: i32, message: impl Into<String>) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: None,
            error: Some(JsonRpcError {
                code,
                message: message.into(),
                data: None,
            }),
        }
    }

    /// Method not found error.
    pub fn method_not_found(id: Option<Value>, method: &str) -> Self {
        Self::error(id, METHOD_NOT_FOUND, format!("Method not found: {}", method))
    }

    /// Invalid request error.
    pub fn invalid_request(id: Option<Value>) -> Self {
        Self::error(id, INVALID_REQUEST, "Invalid Request")
    }

    /// Invalid params error.
    pub fn invalid_params(id: Option<Value>, msg: impl Into<String>) -> Self {
        Self::error(id, INVALID_PARAMS, msg)
    }

    /// Internal error.
    pub fn internal_error(id: Option<Value>, msg: impl Into<String>) -> Self {
        Self::error(id, INTERNAL_ERROR, msg)
    }

    /// Carry an rmcp protocol error over unchanged, including its data.
    pub fn from_mcp_error(id: Option<Value>, err: McpError) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: None,
            error: Some(JsonRpcError {
                code: err.code.0,
                message: err.message.into_owned(),
                data: err.data,
            }),
        }
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

/// Route one request to the server.
///
/// Returns `None` for notifications, which must not be answered.
pub async fn dispatch(server: &McpServer, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
    if request.is_notification() {
        if request.jsonrpc != "2.0" {
            warn!("Ignoring notification with version '{}'", request.jsonrpc);
        } else {
            handle_notification(&request);
        }
        return None;
    }

    if request.jsonrpc != "2.0" {
        return Some(JsonRpcResponse::invalid_request(request.id));
    }

    let response = match request.method.as_str() {
        "initialize" => handle_initialize(server, request),
        "ping" => JsonRpcResponse::success(request.id, json!({})),
        "tools/list" => handle_tools_list(server, request),
        "tools/call" => handle_tools_call(server, request).await,
        _ => {
            warn!("Unknown method: {}", request.method);
            JsonRpcResponse::method_not_found(request.id, &request.method)
        }
    };

    Some(response)
}

/// Parse a raw body and dispatch it.
pub async fn handle_message(server: &McpServer, body: &str) -> Option<JsonRpcResponse> {
    match JsonRpcRequest::parse(body) {
        Ok(request) => dispatch(server, request).await,
        Err(response) => Some(response),
    }
}

fn handle_initialize(server: &McpServer, request: JsonRpcRequest) -> JsonRpcResponse {
    let client = request
        .params
        .as_ref()
        .and_then(|p| p.get("clientInfo"))
        .and_then(|c| c.get("name"))
        .and_then(Value::as_str)
        .unwrap_or("unknown");
    info!("Initializing session for client '{}'", client);

    let mut result = json!({
        "protocolVersion": PROTOCOL_VERSION,
        "capabilities": {
            "tools": {}
        },
        "serverInfo": {
            "name": server.name(),
            "version": server.version()
        }
    });
    if let Some(instructions) = server.instructions() {
        result["instructions"] = json!(instructions);
    }

    JsonRpcResponse::success(request.id, result)
}

fn handle_tools_list(server: &McpServer, request: JsonRpcRequest) -> JsonRpcResponse {
    debug!("Processing tools/list request");
    JsonRpcResponse::success(request.id, json!({ "tools": server.list_tools() }))
}

async fn handle_tools_call(server: &McpServer, request: JsonRpcRequest) -> JsonRpcResponse {
    let Some(params) = request.params else {
        return JsonRpcResponse::invalid_params(request.id, "Missing params");
    };

    let Some(name) = params.get("name").and_then(Value::as_str) else {
        return JsonRpcResponse::invalid_params(request.id, "Missing tool name");
    };

    let arguments: Option<JsonObject> = match params.get("arguments") {
        None | Some(Value::Null) => None,
        Some(Value::Object(map)) => Some(map.clone()),
        Some(other) => {
            let errors = ValidationErrors::not_an_object(other);
            let err = McpError::invalid_params(
                format!("Invalid arguments: {}", errors),
                Some(errors.to_json()),
            );
            return JsonRpcResponse::from_mcp_error(request.id, err);
        }
    };

    match server.call_tool(name, arguments).await {
        Ok(result) => match serde_json::to_value(&result) {
            Ok(value) => JsonRpcResponse::success(request.id, value),
            Err(e) => JsonRpcResponse::internal_error(request.id, e.to_string()),
        },
        Err(e) => JsonRpcResponse::from_mcp_error(request.id, e.to_mcp_error()),
    }
}

fn handle_notification(request: &JsonRpcRequest) {
    match request.method.as_str() {
        "notifications/initialized" => info!("Client sent initialized notification"),
        method => debug!("Received notification: {}", method),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::Config;

    fn server() -> McpServer {
        McpServer::new(Config::default()).unwrap()
    }

    async fn call(method: &str, params: Option<Value>) -> JsonRpcResponse {
        dispatch(&server(), JsonRpcRequest::new(1, method, params))
            .await
            .expect("requests with an id are answered")
    }

    #[tokio::test]
    async fn test_initialize_reports_tools_capability() {
        let response = call("initialize", Some(json!({"clientInfo": {"name": "test"}}))).await;
        let result = response.result.unwrap();
        assert_eq!(result["protocolVersion"], PROTOCOL_VERSION);
        assert!(result["capabilities"]["tools"].is_object());
        assert!(result["capabilities"].get("resources").is_none());
        assert_eq!(result["serverInfo"]["name"], "mcp-tool-server");
    }

    #[tokio::test]
    async fn test_ping() {
        let response = call("ping", None).await;
        assert_eq!(response.result, Some(json!({})));
        assert_eq!(response.id, Some(json!(1)));
    }

    #[tokio::test]
    async fn test_tools_list() {
        let response = call("tools/list", None).await;
        let tools = response.result.unwrap()["tools"].as_array().unwrap().clone();
        let names: Vec<_> = tools.iter().map(|t| t["name"].as_str().unwrap()).collect();
        assert!(names.contains(&"add"));
        assert!(names.contains(&"greet"));
    }

    #[tokio::test]
    async fn test_tools_call_success() {
        let response = call(
            "tools/call",
            Some(json!({"name": "add", "arguments": {"a": 2, "b": 3}})),
        )
        .await;
        let result = response.result.unwrap();
        assert_eq!(result["content"][0]["text"], "5");
        assert_ne!(result["isError"], json!(true));
    }

    #[tokio::test]
    async fn test_tools_call_validation_error() {
        let response = call(
            "tools/call",
            Some(json!({"name": "add", "arguments": {"a": 2, "b": "x"}})),
        )
        .await;
        let error = response.error.unwrap();
        assert_eq!(error.code, INVALID_PARAMS);
        let violations = error.data.unwrap()["violations"].clone();
        assert_eq!(violations[0]["parameter"], "b");
    }

    #[tokio::test]
    async fn test_tools_call_non_object_arguments() {
        let response = call("tools/call", Some(json!({"name": "add", "arguments": [1, 2]}))).await;
        let error = response.error.unwrap();
        assert_eq!(error.code, INVALID_PARAMS);
        assert!(error.data.unwrap()["violations"].is_array());
    }

    #[tokio::test]
    async fn test_tools_call_unknown_tool() {
        let response = call("tools/call", Some(json!({"name": "nope"}))).await;
        assert_eq!(response.error.unwrap().code, INVALID_PARAMS);
    }

    #[tokio::test]
    async fn test_tools_call_missing_name() {
        let response = call("tools/call", Some(json!({"arguments": {}}))).await;
        assert_eq!(response.error.unwrap().code, INVALID_PARAMS);
    }

    #[tokio::test]
    async fn test_unknown_method() {
        let response = call("resources/list", None).await;
        assert_eq!(response.error.unwrap().code, METHOD_NOT_FOUND);
    }

    #[tokio::test]
    async fn test_wrong_version_rejected() {
        let mut request = JsonRpcRequest::new(7, "ping", None);
        request.jsonrpc = "1.0".to_string();
        let response = dispatch(&server(), request).await.unwrap();
        assert_eq!(response.error.unwrap().code, INVALID_REQUEST);
        assert_eq!(response.id, Some(json!(7)));
    }

    #[tokio::test]
    async fn test_notifications_get_no_response() {
        let server = server();
        let body = r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#;
        assert!(handle_message(&server, body).await.is_none());
    }

    #[tokio::test]
    async fn test_notification_with_wrong_version_gets_no_response() {
        let server = server();
        let body = r#"{"jsonrpc":"1.0","method":"notifications/initialized"}"#;
        assert!(handle_message(&server, body).await.is_none());

        let body = r#"{"jsonrpc":"1.0","method":"ping"}"#;
        assert!(handle_message(&server, body).await.is_none());
    }

    #[tokio::test]
    async fn test_parse_errors() {
        let server = server();
        let response = handle_message(&server, "{not json").await.unwrap();
        assert_eq!(response.error.unwrap().code, PARSE_ERROR);

        let response = handle_message(&server, r#"{"id": 3}"#).await.unwrap();
        assert_eq!(response.error.unwrap().code, INVALID_REQUEST);
        assert_eq!(response.id, Some(json!(3)));
    }

    #[test]
    fn test_error_response_serialization() {
        let response = JsonRpcResponse::method_not_found(Some(json!("a")), "x");
        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value["jsonrpc"], "2.0");
        assert_eq!(value["error"]["code"], -32601);
        assert!(value.get("result").is_none());
        assert!(response.is_error());
    }
}
