//! Transport configuration types.

use serde::{Deserialize, Serialize};

use crate::core::error::{Error, Result};

/// Path of the SSE stream.
pub const SSE_PATH: &str = "/sse";

/// Path of the health report.
pub const HEALTH_PATH: &str = "/health";

/// Path prefix clients post messages to; the session id follows it.
pub const MESSAGES_PATH: &str = "/messages";

/// HTTP transport configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Port number to listen on.
    pub port: u16,

    /// Host address to bind to.
    #[serde(default = "default_host")]
    pub host: String,

    /// Enable permissive CORS for browser clients.
    #[serde(default)]
    pub enable_cors: bool,

    /// Seconds between SSE keep-alive comments.
    #[serde(default = "default_keep_alive_secs")]
    pub keep_alive_secs: u64,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_keep_alive_secs() -> u64 {
    15
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            host: default_host(),
            enable_cors: false,
            keep_alive_secs: default_keep_alive_secs(),
        }
    }
}

impl HttpConfig {
    /// Load HTTP config through a key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(host) = lookup("MCP_HTTP_HOST") {
            config.host = host;
        }
        if let Some(port) = lookup("MCP_HTTP_PORT") {
            config.port = port
                .parse()
                .map_err(|_| Error::config(format!("Invalid MCP_HTTP_PORT: {}", port)))?;
        }
        if let Some(cors) = lookup("MCP_HTTP_CORS") {
            config.enable_cors = cors.to_lowercase() == "true" || cors == "1";
        }
        if let Some(secs) = lookup("MCP_SSE_KEEP_ALIVE_SECS") {
            config.keep_alive_secs = secs
                .parse()
                .map_err(|_| Error::config(format!("Invalid MCP_SSE_KEEP_ALIVE_SECS: {}", secs)))?;
        }

        Ok(config)
    }

    /// Get the bind address.
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Get a description of this transport for logging.
    pub fn description(&self) -> String {
        format!("HTTP/SSE on {}{}", self.address(), SSE_PATH)
    }
}
