//! MCP Server Entry Point
//!
//! Loads configuration, initializes logging, discovers the tools and serves
//! them over HTTP/SSE until interrupted.

use std::sync::Arc;

use anyhow::Result;
use tracing::{Level, info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use mcp_sse_server::core::{Config, HttpTransport, McpServer};
use mcp_sse_server::domains::mail::SmtpMailer;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration from environment
    let config = Config::from_env()?;

    // Initialize logging
    init_logging(&config.logging.level);

    info!("Starting {} v{}", config.server.name, config.server.version);

    let mailer = Arc::new(SmtpMailer::new(&config.smtp.host, config.smtp.port));
    info!("Mail relay: {}", mailer.address());

    let transport = HttpTransport::new(config.http.clone());
    let server = McpServer::from_config(config, mailer)?;

    info!("Server initialized");

    transport.run(server).await?;

    info!("Server shutting down");

    Ok(())
}

/// Initialize the logging subsystem.
///
/// Configures tracing with the specified log level and format.
fn init_logging(level: &str) {
    let level = match level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let filter = EnvFilter::from_default_env().add_directive(level.into());

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .with_writer(std::io::stderr)
        .init();

    if level >= Level::DEBUG {
        warn!("Verbose logging enabled; request details may appear in logs");
    }
}
