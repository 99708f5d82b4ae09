//! SSE transport implementation.
//!
//! HTTP server speaking MCP the way SSE clients expect:
//!
//! 1. The client opens `GET {sse_path}` and keeps the event stream open.
//! 2. The first event (`endpoint`) tells it where to POST messages,
//!    including its session id.
//! 3. Each `POST {message_path}?sessionId=...` is acknowledged with
//!    `202 Accepted`; the JSON-RPC response arrives as a `message` event on
//!    that session's stream.
//!
//! `POST {rpc_path}` additionally answers JSON-RPC directly in the HTTP
//! response, which is convenient for curl and health checks.
//!
//! Both POST endpoints require `Content-Type: application/json`, so plain
//! cross-origin form posts cannot reach them without a CORS preflight.

use axum::{
    Json, Router,
    extract::{Query, State, rejection::QueryRejection},
    response::{
        IntoResponse, Response,
        sse::{Event, KeepAlive, Sse},
    },
    routing::{get, post},
};
use futures::stream::{self, Stream, StreamExt};
use http::{HeaderMap, StatusCode, header};
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::mpsc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use super::config::SseConfig;
use super::jsonrpc::{self, JsonRpcResponse};
use super::{TransportError, TransportResult};
use crate::core::McpServer;

type SessionMap = Arc<Mutex<HashMap<String, mpsc::UnboundedSender<JsonRpcResponse>>>>;

/// SSE transport handler.
pub struct SseTransport {
    config: SseConfig,
}

/// Application state shared across HTTP handlers.
#[derive(Clone)]
pub struct SseState {
    /// The MCP server instance.
    server: McpServer,
    /// Open event streams, keyed by session id.
    sessions: SessionMap,
    /// Path advertised in the `endpoint` event.
    message_path: String,
    sse_path: String,
    rpc_path: String,
}

impl SseState {
    pub fn new(server: McpServer, config: &SseConfig) -> Self {
        Self {
            server,
            sessions: Arc::new(Mutex::new(HashMap::new())),
            message_path: config.message_path.clone(),
            sse_path: config.sse_path.clone(),
            rpc_path: config.rpc_path.clone(),
        }
    }

    /// Number of currently open event streams.
    pub fn session_count(&self) -> usize {
        lock(&self.sessions).len()
    }

    fn open_session(&self) -> (String, mpsc::UnboundedReceiver<JsonRpcResponse>) {
        let id = Uuid::new_v4().to_string();
        let (tx, rx) = mpsc::unbounded_channel();
        lock(&self.sessions).insert(id.clone(), tx);
        (id, rx)
    }

    fn sender(&self, session_id: &str) -> Option<mpsc::UnboundedSender<JsonRpcResponse>> {
        lock(&self.sessions).get(session_id).cloned()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Removes its session from the map when the event stream is dropped.
struct SessionGuard {
    id: String,
    sessions: SessionMap,
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        lock(&self.sessions).remove(&self.id);
        info!("SSE session {} closed", self.id);
    }
}

impl SseTransport {
    /// Create a new SSE transport with the given config.
    pub fn new(config: SseConfig) -> Self {
        Self { config }
    }

    /// Get the bind address.
    pub fn address(&self) -> String {
        self.config.address()
    }

    /// Build the axum router serving all SSE transport endpoints.
    pub fn router(&self, state: SseState) -> Router {
        let keep_alive = Duration::from_secs(self.config.keep_alive_secs);

        let mut app = Router::new()
            .route(
                &self.config.sse_path,
                get(move |state: State<SseState>| sse_handler(state, keep_alive)),
            )
            .route(&self.config.message_path, post(message_handler))
            .route(&self.config.rpc_path, post(rpc_handler))
            .route("/health", get(health_check))
            .route("/", get(root_handler))
            .layer(TraceLayer::new_for_http())
            .with_state(state);

        if self.config.enable_cors {
            let cors = CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any);
            app = app.layer(cors);
        }

        app
    }

    /// Run the SSE transport until the listener fails.
    pub async fn run(self, server: McpServer) -> TransportResult<()> {
        let addr = self.address();
        let app = self.router(SseState::new(server, &self.config));

        let listener = tokio::net::TcpListener::bind(&addr)
            .await
            .map_err(|e| TransportError::bind(&addr, e))?;

        let cors_status = if self.config.enable_cors {
            "enabled"
        } else {
            "disabled"
        };
        info!("Ready - listening on {} (MCP over SSE, CORS {})", addr, cors_status);
        info!("  → Events:   GET {}", self.config.sse_path);
        info!("  → Messages: POST {}?sessionId=<id>", self.config.message_path);
        info!("  → JSON-RPC: POST {}", self.config.rpc_path);
        info!("  → Health:   GET /health");

        axum::serve(listener, app)
            .await
            .map_err(|e| TransportError::http(e.to_string()))?;

        Ok(())
    }
}

/// Open an event stream for a new session.
async fn sse_handler(
    State(state): State<SseState>,
    keep_alive: Duration,
) -> Sse<impl Stream<Item = Result<Event, axum::Error>>> {
    let (id, rx) = state.open_session();
    info!("SSE session {} opened", id);

    let endpoint = Event::default()
        .event("endpoint")
        .data(format!("{}?sessionId={}", state.message_path, id));

    let guard = SessionGuard {
        id,
        sessions: state.sessions.clone(),
    };

    let messages = stream::unfold((rx, guard), |(mut rx, guard)| async move {
        let response = rx.recv().await?;
        let event = Event::default().event("message").json_data(&response);
        Some((event, (rx, guard)))
    });

    let events = stream::once(async move { Ok::<_, axum::Error>(endpoint) }).chain(messages);

    Sse::new(events).keep_alive(KeepAlive::new().interval(keep_alive))
}

#[derive(Debug, Deserialize)]
struct MessageQuery {
    #[serde(rename = "sessionId")]
    session_id: String,
}

fn is_json(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(';').next())
        .is_some_and(|mime| mime.trim().eq_ignore_ascii_case("application/json"))
}

fn unsupported_media_type() -> Response {
    (
        StatusCode::UNSUPPORTED_MEDIA_TYPE,
        "Expected Content-Type: application/json",
    )
        .into_response()
}

/// Accept a JSON-RPC message for an open session.
#[instrument(skip_all)]
async fn message_handler(
    State(state): State<SseState>,
    query: Result<Query<MessageQuery>, QueryRejection>,
    headers: HeaderMap,
    body: String,
) -> Response {
    if !is_json(&headers) {
        return unsupported_media_type();
    }

    let Ok(Query(query)) = query else {
        return (StatusCode::BAD_REQUEST, "Missing sessionId query parameter").into_response();
    };

    let Some(tx) = state.sender(&query.session_id) else {
        warn!("Message for unknown session {}", query.session_id);
        return (StatusCode::NOT_FOUND, "Unknown session").into_response();
    };

    let server = state.server.clone();
    tokio::spawn(async move {
        let Some(response) = jsonrpc::handle_message(&server, &body).await else {
            return;
        };
        if tx.send(response).is_err() {
            debug!("Session closed before response was delivered");
        }
    });

    StatusCode::ACCEPTED.into_response()
}

/// Handle a JSON-RPC request and answer it in the HTTP response.
#[instrument(skip_all)]
async fn rpc_handler(State(state): State<SseState>, headers: HeaderMap, body: String) -> Response {
    if !is_json(&headers) {
        return unsupported_media_type();
    }

    match jsonrpc::handle_message(&state.server, &body).await {
        Some(response) => (StatusCode::OK, Json(response)).into_response(),
        None => StatusCode::ACCEPTED.into_response(),
    }
}

/// Root handler - provides API info.
async fn root_handler(State(state): State<SseState>) -> impl IntoResponse {
    Json(serde_json::json!({
        "name": state.server.name(),
        "version": state.server.version(),
        "transport": "SSE",
        "endpoints": {
            "sse": state.sse_path,
            "message": state.message_path,
            "rpc": state.rpc_path,
            "health": "/health"
        },
        "protocol": "JSON-RPC 2.0",
        "tools": state.server.registry().tool_names(),
    }))
}

/// Health check endpoint.
async fn health_check(State(state): State<SseState>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "sessions": state.session_count(),
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}
