//! Dependency injection for actions.
//!
//! Server-held values (relay credential, sender address) are bound into a
//! [`BoundAction`] at registration time. The bound handler fills them in on
//! every call, so remote callers never see or supply them.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde_json::{Map, Value};

use super::error::ActionError;
use super::handlers::{Action, ActionArgs, ActionParam};
use crate::core::config::CredentialsConfig;

const REDACTED: &str = "[REDACTED]";

/// Named infrastructure values available for injection.
#[derive(Clone, Default)]
pub struct Dependencies {
    values: BTreeMap<String, String>,
}

impl Dependencies {
    /// Key under which the relay credential is injected.
    pub const POSTMARK_API_KEY: &'static str = "postmark_api_key";

    /// Key under which the sender address is injected.
    pub const SENDER_EMAIL: &'static str = "sender_email";

    /// Create an empty dependency set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the dependency set from configured credentials.
    pub fn from_credentials(credentials: &CredentialsConfig) -> Self {
        Self::new()
            .with(Self::POSTMARK_API_KEY, credentials.postmark_api_key.clone())
            .with(Self::SENDER_EMAIL, credentials.sender_email.clone())
    }

    /// Add or replace a dependency.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }

    /// Whether `key` names an injectable dependency.
    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Look up a dependency value.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// Dependency names.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }
}

impl fmt::Debug for Dependencies {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.values.keys().map(|k| (k, REDACTED)))
            .finish()
    }
}

/// An action with its injectable parameters pre-filled.
#[derive(Clone)]
pub struct BoundAction {
    action: Arc<dyn Action>,
    injected: BTreeMap<&'static str, String>,
}

impl BoundAction {
    /// Bind every parameter of `action` whose name is a dependency key.
    pub fn bind(action: Arc<dyn Action>, dependencies: &Dependencies) -> Self {
        let injected = action
            .params()
            .iter()
            .filter_map(|p| dependencies.get(p.name).map(|v| (p.name, v.to_string())))
            .collect();

        Self { action, injected }
    }

    /// Name of the underlying function.
    pub fn function_name(&self) -> &'static str {
        self.action.function_name()
    }

    /// Documentation of the underlying function.
    pub fn doc(&self) -> Option<&'static str> {
        self.action.doc()
    }

    /// Names of the injected parameters.
    pub fn injected_names(&self) -> impl Iterator<Item = &str> {
        self.injected.keys().copied()
    }

    /// Parameters the caller still has to supply.
    pub fn exposed_params(&self) -> Vec<&'static ActionParam> {
        self.action
            .params()
            .iter()
            .filter(|p| !self.injected.contains_key(p.name))
            .collect()
    }

    /// Call the action with caller `arguments` plus the injected values.
    ///
    /// Injected values always win over a caller-supplied value of the same name.
    pub async fn invoke(&self, mut arguments: Map<String, Value>) -> Result<Value, ActionError> {
        for (name, value) in &self.injected {
            arguments.insert((*name).to_string(), Value::String(value.clone()));
        }
        self.action.call(ActionArgs::new(arguments)).await
    }

    /// Replace every injected value occurring in `message`.
    pub fn sanitize(&self, message: &str) -> String {
        self.injected
            .values()
            .filter(|v| !v.is_empty())
            .fold(message.to_string(), |acc, secret| acc.replace(secret.as_str(), REDACTED))
    }
}

impl fmt::Debug for BoundAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoundAction")
            .field("function", &self.function_name())
            .field("injected", &self.injected.keys().collect::<Vec<_>>())
            .finish()
    }
}
