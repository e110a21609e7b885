//! HTTP/SSE transport implementation.
//!
//! Clients open `GET /sse` and receive an `endpoint` event naming the URL
//! to post messages to. Each message posted there is answered with
//! `202 Accepted`; the JSON-RPC response arrives later as a `message`
//! event on the same stream. Every route sits behind the API key gate.

use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    middleware,
    response::{
        IntoResponse, Sse,
        sse::{Event, KeepAlive},
    },
    routing::{get, post},
};
use bytes::Bytes;
use futures::{Stream, StreamExt, stream};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{Instrument, debug, info, info_span, warn};
use uuid::Uuid;

use super::config::{HEALTH_PATH, HttpConfig, MESSAGES_PATH, SSE_PATH};
use super::error::{TransportError, TransportResult};
use super::jsonrpc::{JsonRpcRequest, JsonRpcResponse};
use super::session::{SessionManager, SessionSubscription};
use crate::core::McpServer;
use crate::core::security::{ApiKeyGate, require_api_key};

/// HTTP/SSE transport handler.
pub struct HttpTransport {
    config: HttpConfig,
    sessions: Arc<SessionManager>,
}

/// Application state shared across HTTP handlers.
#[derive(Clone)]
struct AppState {
    server: McpServer,
    sessions: Arc<SessionManager>,
    keep_alive: Duration,
}

impl HttpTransport {
    /// Create a new HTTP transport with the given config.
    pub fn new(config: HttpConfig) -> Self {
        Self {
            config,
            sessions: Arc::new(SessionManager::new()),
        }
    }

    /// Get the bind address.
    pub fn address(&self) -> String {
        self.config.address()
    }

    /// Sessions opened through this transport.
    pub fn sessions(&self) -> &Arc<SessionManager> {
        &self.sessions
    }

    /// Build the router serving `server`.
    pub fn router(&self, server: McpServer) -> Router {
        let gate = ApiKeyGate::new(&server.config().auth.api_key);
        let state = AppState {
            server,
            sessions: Arc::clone(&self.sessions),
            keep_alive: Duration::from_secs(self.config.keep_alive_secs),
        };

        let mut app = Router::new()
            .route(
                SSE_PATH,
                get(handle_sse).head(sse_liveness).options(sse_liveness),
            )
            .route(HEALTH_PATH, get(health_check))
            .route(
                &format!("{}/{{session_id}}", MESSAGES_PATH),
                post(handle_message),
            )
            .with_state(state);

        if self.config.enable_cors {
            let cors = CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any);
            app = app.layer(cors);
        }

        app.layer(middleware::from_fn_with_state(gate, require_api_key))
            .layer(TraceLayer::new_for_http())
    }

    /// Run the HTTP transport until Ctrl-C.
    pub async fn run(self, server: McpServer) -> TransportResult<()> {
        let addr = self.address();
        let app = self.router(server);

        let listener = tokio::net::TcpListener::bind(&addr)
            .await
            .map_err(|e| TransportError::bind(&addr, e))?;

        let cors_status = if self.config.enable_cors {
            "enabled"
        } else {
            "disabled"
        };
        info!("Ready - {} (CORS {})", self.config.description(), cors_status);
        info!("  → SSE:      GET {}", SSE_PATH);
        info!("  → Messages: POST {}/{{session_id}}", MESSAGES_PATH);
        info!("  → Health:   GET {}", HEALTH_PATH);

        let sessions = Arc::clone(&self.sessions);
        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                if let Err(e) = tokio::signal::ctrl_c().await {
                    warn!("Failed to listen for shutdown signal: {}", e);
                    std::future::pending::<()>().await;
                }
                info!("Shutdown signal received, closing sessions");
                sessions.close_all();
            })
            .await
            .map_err(|e| TransportError::http(e.to_string()))?;

        Ok(())
    }
}

/// Health report.
async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "service": state.server.name(),
        "version": state.server.version(),
        "sessions": state.sessions.len(),
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

/// Liveness probe on the SSE path; does not open a session.
async fn sse_liveness() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(serde_json::json!({
            "status": "ok",
            "timestamp": chrono::Utc::now().to_rfc3339()
        })),
    )
}

/// Open a session and stream its messages.
async fn handle_sse(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let subscription = state.sessions.open();
    let endpoint = format!("{}/{}", MESSAGES_PATH, subscription.id());
    debug!(session_id = %subscription.id(), "Announcing endpoint {}", endpoint);

    Sse::new(session_events(endpoint, subscription))
        .keep_alive(KeepAlive::new().interval(state.keep_alive))
}

fn session_events(
    endpoint: String,
    subscription: SessionSubscription,
) -> impl Stream<Item = Result<Event, Infallible>> {
    let announce = stream::once(async move { Event::default().event("endpoint").data(endpoint) });
    let messages = subscription.map(|response| message_event(&response));
    announce.chain(messages).map(Ok::<_, Infallible>)
}

fn message_event(response: &JsonRpcResponse) -> Event {
    let payload = serde_json::to_string(response).unwrap_or_else(|e| {
        warn!("Failed to serialize response: {}", e);
        serde_json::json!({
            "jsonrpc": "2.0",
            "id": response.id,
            "error": { "code": -32603, "message": "Internal error" }
        })
        .to_string()
    });
    Event::default().event("message").data(payload)
}

/// Accept a client message for asynchronous processing.
async fn handle_message(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    body: Bytes,
) -> Result<impl IntoResponse, TransportError> {
    let session = Uuid::parse_str(&session_id)
        .ok()
        .and_then(|id| state.sessions.get(&id))
        .ok_or_else(|| {
            warn!("Message for unknown session {}", session_id);
            TransportError::unknown_session(&session_id)
        })?;

    let request: JsonRpcRequest = serde_json::from_slice(&body).map_err(|e| {
        warn!(session_id = %session.id(), "Could not parse message: {}", e);
        TransportError::parse(e)
    })?;

    let span = info_span!("session", session_id = %session.id(), method = %request.method);
    let server = state.server.clone();
    tokio::spawn(
        async move {
            if let Some(response) = server.handle_request(request).await {
                if !session.enqueue(response) {
                    debug!("Session closed before response was delivered");
                }
            }
        }
        .instrument(span),
    );

    Ok((StatusCode::ACCEPTED, "Accepted"))
}
