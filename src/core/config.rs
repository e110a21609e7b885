//! Configuration management for the MCP server.
//!
//! This module provides a centralized configuration structure populated from
//! environment variables (optionally seeded from a `.env` file) with
//! defaults for everything that is not a secret.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::error::{Error, Result};
use super::transport::HttpConfig;

/// Main configuration structure for the MCP server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Server identification and metadata.
    pub server: ServerConfig,

    /// Logging configuration.
    pub logging: LoggingConfig,

    /// HTTP transport configuration.
    pub http: HttpConfig,

    /// Static API key guarding every route.
    pub auth: AuthConfig,

    /// Values injected into tools.
    pub credentials: CredentialsConfig,

    /// Upstream mail relay.
    pub smtp: SmtpConfig,
}

/// Server identification configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// The name of the server as reported to clients.
    pub name: String,

    /// The version of the server.
    pub version: String,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "trace").
    pub level: String,
}

/// API key authentication configuration.
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Value clients must send in the `X-API-Key` header.
    pub api_key: String,
}

/// Credentials injected into tools.
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct CredentialsConfig {
    /// Postmark server token, used as SMTP username and password.
    pub postmark_api_key: String,

    /// Address emails are sent from.
    pub sender_email: String,
}

/// Mail relay configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
}

/// Custom Debug implementation to redact secrets from logs.
impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("api_key", &"[REDACTED]")
            .finish()
    }
}

/// Custom Debug implementation to redact secrets from logs.
impl std::fmt::Debug for CredentialsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialsConfig")
            .field("postmark_api_key", &"[REDACTED]")
            .field("sender_email", &self.sender_email)
            .finish()
    }
}

impl Default for SmtpConfig {
    fn default() -> Self {
        Self {
            host: "smtp.postmarkapp.com".to_string(),
            port: 587,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                name: "mcp-sse-server".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
            logging: LoggingConfig {
                level: "info".to_string(),
            },
            http: HttpConfig::default(),
            auth: AuthConfig::default(),
            credentials: CredentialsConfig::default(),
            smtp: SmtpConfig::default(),
        }
    }
}

/// Environment variables that must be present and non-empty.
pub const REQUIRED_KEYS: [&str; 3] = ["MCP_SERVER_AUTH_KEY", "POSTMARK_API_KEY", "SENDER_EMAIL"];

impl Config {
    /// Load configuration from the process environment.
    ///
    /// A `.env` file in the working directory is loaded first if present;
    /// variables already set in the environment take precedence.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration, seeding the environment from `dotenv_path`.
    pub fn from_dotenv_path(dotenv_path: &Path) -> Result<Self> {
        dotenvy::from_path(dotenv_path).map_err(|e| {
            Error::config(format!(
                "Failed to load {}: {}",
                dotenv_path.display(),
                e
            ))
        })?;
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    ///
    /// Every required key that is missing or empty is reported in a single
    /// error.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let missing: Vec<&str> = REQUIRED_KEYS
            .iter()
            .copied()
            .filter(|key| lookup(*key).is_none_or(|v| v.is_empty()))
            .collect();
        if !missing.is_empty() {
            return Err(Error::config(format!(
                "Missing required configuration: {}",
                missing.join(", ")
            )));
        }

        let mut config = Self::default();

        config.auth.api_key = lookup("MCP_SERVER_AUTH_KEY").unwrap_or_default();
        config.credentials.postmark_api_key = lookup("POSTMARK_API_KEY").unwrap_or_default();
        config.credentials.sender_email = lookup("SENDER_EMAIL").unwrap_or_default();

        if let Some(name) = lookup("MCP_SERVER_NAME") {
            config.server.name = name;
        }

        if let Some(level) = lookup("MCP_LOG_LEVEL") {
            config.logging.level = level;
        }

        config.http = HttpConfig::from_lookup(&lookup)?;

        if let Some(host) = lookup("MCP_SMTP_HOST") {
            config.smtp.host = host;
        }
        if let Some(port) = lookup("MCP_SMTP_PORT") {
            config.smtp.port = port
                .parse()
                .map_err(|_| Error::config(format!("Invalid MCP_SMTP_PORT: {}", port)))?;
        }

        info!("Configuration loaded");
        if config.http.enable_cors {
            warn!("CORS is enabled for all origins");
        }

        Ok(config)
    }
}
