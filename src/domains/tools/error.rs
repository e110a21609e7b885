//! Tool-specific error types.

use thiserror::Error;

/// Errors that can occur while resolving or invoking a tool.
///
/// These are per-request errors: they are reported to the calling session
/// and never affect other sessions.
#[derive(Debug, Error)]
pub enum ToolError {
    /// The requested tool was not found.
    #[error("Unknown tool: {0}")]
    NotFound(String),

    /// Invalid arguments were provided to the tool.
    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),

    /// The tool's action failed. The message is already sanitized.
    #[error("Execution failed: {0}")]
    ExecutionFailed(String),
}

impl ToolError {
    /// Create a new "not found" error.
    pub fn not_found(name: impl Into<String>) -> Self {
        Self::NotFound(name.into())
    }

    /// Create a new "invalid arguments" error.
    pub fn invalid_arguments(msg: impl Into<String>) -> Self {
        Self::InvalidArguments(msg.into())
    }

    /// Create a new "execution failed" error.
    pub fn execution_failed(msg: impl Into<String>) -> Self {
        Self::ExecutionFailed(msg.into())
    }
}

/// Errors raised while discovering and registering tools at startup.
///
/// Every variant is fatal: the server refuses to start with a broken tool.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    /// An action module could not be loaded.
    #[error("Failed to load action module '{module}': {reason}")]
    ModuleLoad { module: String, reason: String },

    /// Two actions map to the same tool name.
    #[error("Tool '{0}' is already registered")]
    DuplicateTool(String),

    /// An action's exposed parameters cannot be mapped to a schema.
    #[error("Invalid signature for '{function}': {reason}")]
    InvalidSignature { function: String, reason: String },

    /// A caller-supplied parameter carries no type annotation.
    #[error("Cannot infer schema for '{function}': parameter '{param}' has no type annotation")]
    SchemaInference { function: String, param: String },
}

impl DiscoveryError {
    /// Create a module load error.
    pub fn module_load(module: impl Into<String>, reason: impl ToString) -> Self {
        Self::ModuleLoad {
            module: module.into(),
            reason: reason.to_string(),
        }
    }

    /// Create an invalid signature error.
    pub fn invalid_signature(function: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidSignature {
            function: function.into(),
            reason: reason.into(),
        }
    }
}

/// Errors raised by action functions.
#[derive(Debug, Error)]
pub enum ActionError {
    /// The action rejected its input.
    #[error("{0}")]
    InvalidInput(String),

    /// The action could not complete.
    #[error("{0}")]
    Failed(String),
}

impl ActionError {
    /// Create an invalid input error.
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Create a failure error.
    pub fn failed(msg: impl Into<String>) -> Self {
        Self::Failed(msg.into())
    }
}
