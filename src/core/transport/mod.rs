//! Transport layer for the MCP server.
//!
//! The server speaks MCP over HTTP with Server-Sent Events:
//! - `GET /sse` opens a session stream
//! - `POST /messages/{session_id}` submits a JSON-RPC message
//! - `GET /health` reports the server name and version
//!
//! Responses are queued per session and delivered in order on the
//! session's stream.

mod config;
mod error;
pub mod http;
mod jsonrpc;
pub mod session;

pub use config::{HEALTH_PATH, HttpConfig, MESSAGES_PATH, SSE_PATH};
pub use error::{TransportError, TransportResult};
pub use self::http::HttpTransport;
pub use jsonrpc::{JsonRpcError, JsonRpcRequest, JsonRpcResponse};
pub use session::{Session, SessionId, SessionManager, SessionState, SessionSubscription};
