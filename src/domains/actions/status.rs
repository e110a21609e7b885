//! Status action.
//!
//! Reports that the server is up. Takes no parameters and no dependencies.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Value, json};
use tracing::info;

use super::ActionContext;
use crate::domains::tools::{Action, ActionArgs, ActionError, ActionParam};

/// Get server status information.
pub async fn status_action() -> Value {
    info!("Status action called");
    json!({
        "status": "ok",
        "message": "MCP SSE Server is running",
        "version": env!("CARGO_PKG_VERSION")
    })
}

/// `status_action` as a discoverable action.
pub struct StatusAction;

#[async_trait]
impl Action for StatusAction {
    fn function_name(&self) -> &'static str {
        "status_action"
    }

    fn doc(&self) -> Option<&'static str> {
        Some("Get server status information.\n\nReturns status, a short message and the server version.")
    }

    fn params(&self) -> &'static [ActionParam] {
        &[]
    }

    async fn call(&self, _args: ActionArgs) -> Result<Value, ActionError> {
        Ok(status_action().await)
    }
}

/// Module loader.
pub fn load(_context: &ActionContext) -> Result<Vec<Arc<dyn Action>>, ActionError> {
    Ok(vec![Arc::new(StatusAction)])
}
