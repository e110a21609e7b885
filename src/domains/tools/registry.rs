//! Tool Registry - central registration and dispatch for all tools.
//!
//! This module provides:
//! - The `Tool` model: a name, a description, a parameter schema and a
//!   bound handler
//! - An insertion-ordered registry, append-only during startup and read-only
//!   while serving
//! - Argument validation and sanitized invocation

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::{Map, Value};
use tracing::{error, info, instrument, warn};

use super::error::{DiscoveryError, ToolError};
use super::injection::BoundAction;
use super::schema::ParameterSchema;

// ============================================================================
// Tool
// ============================================================================

/// A named, schema-described callable exposed to clients.
#[derive(Debug, Clone)]
pub struct Tool {
    name: String,
    description: String,
    schema: ParameterSchema,
    handler: BoundAction,
}

impl Tool {
    /// Create a tool.
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        schema: ParameterSchema,
        handler: BoundAction,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            schema,
            handler,
        }
    }

    /// Tool name as registered.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Tool description shown to clients.
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Caller-supplied parameters.
    pub fn schema(&self) -> &ParameterSchema {
        &self.schema
    }

    /// The bound handler.
    pub fn handler(&self) -> &BoundAction {
        &self.handler
    }

    /// Create an rmcp Tool model for this tool (metadata).
    pub fn to_tool(&self) -> rmcp::model::Tool {
        rmcp::model::Tool {
            name: self.name.clone().into(),
            description: Some(self.description.clone().into()),
            input_schema: Arc::new(self.schema.to_json_schema()),
            annotations: None,
            output_schema: None,
            icons: None,
            meta: None,
            title: None,
        }
    }

    /// Validate `arguments` and run the handler.
    ///
    /// Action failures are logged with full detail and returned to the
    /// caller with every injected value redacted.
    #[instrument(skip_all, fields(tool = %self.name))]
    pub async fn invoke(&self, arguments: Map<String, Value>) -> Result<Value, ToolError> {
        self.schema.validate(&arguments).inspect_err(|e| {
            warn!("Rejected arguments: {}", e);
        })?;

        match self.handler.invoke(arguments).await {
            Ok(value) => {
                info!("Tool completed");
                Ok(value)
            }
            Err(e) => {
                error!(error = ?e, "Tool execution failed");
                Err(ToolError::execution_failed(
                    self.handler.sanitize(&e.to_string()),
                ))
            }
        }
    }
}

// ============================================================================
// Tool Registry
// ============================================================================

/// Tool registry - manages all available tools.
#[derive(Debug, Default)]
pub struct ToolRegistry {
    tools: Vec<Tool>,
    index: HashMap<String, usize>,
}

impl ToolRegistry {
    /// Create an empty tool registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `tool`.
    ///
    /// Fails if the name is empty or taken, or if the schema still exposes a
    /// parameter the handler injects.
    pub fn register(&mut self, tool: Tool) -> Result<(), DiscoveryError> {
        if tool.name.trim().is_empty() {
            return Err(DiscoveryError::invalid_signature(
                tool.handler.function_name(),
                "tool name must not be empty",
            ));
        }

        if self.index.contains_key(&tool.name) {
            return Err(DiscoveryError::DuplicateTool(tool.name));
        }

        if let Some(leaked) = tool
            .handler
            .injected_names()
            .find(|name| tool.schema.contains(name))
        {
            return Err(DiscoveryError::invalid_signature(
                tool.handler.function_name(),
                format!("injected parameter '{}' must not be exposed", leaked),
            ));
        }

        info!("Registering MCP tool: {}", tool.name);
        self.index.insert(tool.name.clone(), self.tools.len());
        self.tools.push(tool);
        Ok(())
    }

    /// Look up a tool by name.
    pub fn resolve(&self, name: &str) -> Result<&Tool, ToolError> {
        self.index
            .get(name)
            .and_then(|&i| self.tools.get(i))
            .ok_or_else(|| {
                warn!("Unknown tool requested: {}", name);
                ToolError::not_found(name)
            })
    }

    /// All tools in registration order.
    pub fn list(&self) -> &[Tool] {
        &self.tools
    }

    /// All tool names in registration order.
    pub fn tool_names(&self) -> Vec<&str> {
        self.tools.iter().map(Tool::name).collect()
    }

    /// Number of registered tools.
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Whether no tool is registered.
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}
