//! Core module containing shared infrastructure components.
//!
//! This module provides the foundational building blocks for the MCP server,
//! including error handling, configuration, authentication, server lifecycle
//! management, and the HTTP/SSE transport.

pub mod config;
pub mod error;
pub mod security;
pub mod server;
pub mod transport;

pub use config::Config;
pub use error::{Error, Result};
pub use security::{API_KEY_HEADER, ApiKeyGate};
pub use server::McpServer;
pub use transport::{HttpConfig, HttpTransport};
