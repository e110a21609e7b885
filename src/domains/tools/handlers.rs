//! Tool handlers module.
//!
//! Actions are the business logic behind tools. An action declares the
//! parameters it takes (including any it expects the server to inject) and
//! implements a single asynchronous `call`. Actions know nothing about the
//! transport, the registry, or the protocol framing.

use async_trait::async_trait;
use serde_json::{Map, Value};

use super::error::ActionError;

/// A declared action parameter.
///
/// `annotation` is the parameter's type as written by the action author.
/// Discovery maps it onto a [`ParamKind`](super::ParamKind); a missing
/// annotation makes the action undiscoverable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActionParam {
    pub name: &'static str,
    pub annotation: Option<&'static str>,
    pub required: bool,
}

impl ActionParam {
    /// A required parameter of the given type.
    pub const fn required(name: &'static str, annotation: &'static str) -> Self {
        Self {
            name,
            annotation: Some(annotation),
            required: true,
        }
    }

    /// An optional parameter of the given type.
    pub const fn optional(name: &'static str, annotation: &'static str) -> Self {
        Self {
            name,
            annotation: Some(annotation),
            required: false,
        }
    }

    /// A parameter declared without a type.
    pub const fn unannotated(name: &'static str) -> Self {
        Self {
            name,
            annotation: None,
            required: true,
        }
    }
}

/// Arguments handed to an action: caller-supplied values merged with the
/// injected dependencies.
#[derive(Debug, Clone, Default)]
pub struct ActionArgs(Map<String, Value>);

impl ActionArgs {
    /// Wrap an argument map.
    pub fn new(arguments: Map<String, Value>) -> Self {
        Self(arguments)
    }

    /// A required string argument.
    pub fn string(&self, name: &str) -> Result<String, ActionError> {
        self.0
            .get(name)
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| missing(name, "a string"))
    }

    /// A required list-of-strings argument.
    pub fn string_list(&self, name: &str) -> Result<Vec<String>, ActionError> {
        self.0
            .get(name)
            .and_then(Value::as_array)
            .and_then(|items| {
                items
                    .iter()
                    .map(|v| v.as_str().map(str::to_string))
                    .collect::<Option<Vec<_>>>()
            })
            .ok_or_else(|| missing(name, "a list of strings"))
    }
}

impl From<Map<String, Value>> for ActionArgs {
    fn from(arguments: Map<String, Value>) -> Self {
        Self::new(arguments)
    }
}

fn missing(name: &str, expected: &str) -> ActionError {
    ActionError::invalid_input(format!("Argument '{}' must be {}", name, expected))
}

/// An executable action.
#[async_trait]
pub trait Action: Send + Sync {
    /// Function name. Exposed actions end with the `_action` suffix.
    fn function_name(&self) -> &'static str;

    /// Documentation string; its first line becomes the tool description.
    fn doc(&self) -> Option<&'static str> {
        None
    }

    /// Every parameter the action takes, injected ones included.
    fn params(&self) -> &'static [ActionParam];

    /// Run the action.
    async fn call(&self, args: ActionArgs) -> Result<Value, ActionError>;
}
