//! MCP SSE Server Library
//!
//! This crate provides a Model Context Protocol (MCP) tool server served
//! over HTTP with Server-Sent Events, guarded by a static API key.
//!
//! # Architecture
//!
//! - **core**: configuration, error handling, the API key gate, the MCP
//!   request handler and the HTTP/SSE transport
//! - **domains**: business logic organized by bounded contexts
//!   - **tools**: tool registry, parameter schemas, credential injection
//!     and action discovery
//!   - **actions**: the functions exposed as tools (`send_email`, `status`)
//!   - **mail**: email address validation and the SMTP relay
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use mcp_sse_server::core::{Config, HttpTransport, McpServer};
//! use mcp_sse_server::domains::mail::SmtpMailer;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::from_env()?;
//!     let mailer = Arc::new(SmtpMailer::new(&config.smtp.host, config.smtp.port));
//!     let transport = HttpTransport::new(config.http.clone());
//!     let server = McpServer::from_config(config, mailer)?;
//!     transport.run(server).await?;
//!     Ok(())
//! }
//! ```

pub mod core;
pub mod domains;

// Re-export commonly used types for convenience
pub use core::{Config, Error, McpServer, Result};
