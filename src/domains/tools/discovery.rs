//! Action discovery.
//!
//! Walks a fixed table of action modules, keeps every function following the
//! `_action` naming convention, binds its injectable parameters and
//! registers the resulting tool. Any failure aborts startup: a misdeclared
//! action must never be published as a broken tool.

use std::sync::Arc;

use tracing::{debug, error, info};

use super::error::DiscoveryError;
use super::handlers::Action;
use super::injection::{BoundAction, Dependencies};
use super::registry::{Tool, ToolRegistry};
use super::schema::ParameterSchema;
use crate::domains::actions::{ActionContext, ActionModule};

/// Suffix marking a function as an exposed action.
pub const ACTION_SUFFIX: &str = "_action";

/// Description used when an action carries no documentation.
pub const DEFAULT_DESCRIPTION: &str = "No description provided";

/// Load every module in `modules` and register its actions.
pub fn discover(
    modules: &[ActionModule],
    context: &ActionContext,
    dependencies: &Dependencies,
) -> Result<ToolRegistry, DiscoveryError> {
    info!("Starting auto-discovery of action modules");
    let mut registry = ToolRegistry::new();

    for module in modules {
        let functions = (module.load)(context).map_err(|e| {
            error!("Failed to load action module {}: {}", module.name, e);
            DiscoveryError::module_load(module.name, e)
        })?;
        debug!("Loaded action module: {}", module.name);

        for action in functions {
            if tool_name(action.function_name()).is_none() {
                debug!("Skipping {}: not an action", action.function_name());
                continue;
            }

            info!("Registering action: {}", action.function_name());
            registry.register(build_tool(action, dependencies)?)?;
        }
    }

    info!(
        tools = registry.len(),
        "Action module auto-discovery completed"
    );
    Ok(registry)
}

/// Turn one action into a tool.
///
/// The tool name is the function name without its suffix, the description
/// is the first line of its documentation, and the schema covers only the
/// parameters left after injection.
pub fn build_tool(
    action: Arc<dyn Action>,
    dependencies: &Dependencies,
) -> Result<Tool, DiscoveryError> {
    let function = action.function_name();
    let name = tool_name(function).ok_or_else(|| {
        DiscoveryError::invalid_signature(
            function,
            format!("function name must end with '{}'", ACTION_SUFFIX),
        )
    })?;

    let handler = BoundAction::bind(action, dependencies);
    let schema = ParameterSchema::infer(function, &handler.exposed_params())?;
    let description = describe(handler.doc());

    Ok(Tool::new(name, description, schema, handler))
}

/// Public tool name for `function`, if it follows the action convention.
pub fn tool_name(function: &str) -> Option<&str> {
    function.strip_suffix(ACTION_SUFFIX)
}

fn describe(doc: Option<&str>) -> String {
    doc.and_then(|d| d.lines().map(str::trim).find(|line| !line.is_empty()))
        .unwrap_or(DEFAULT_DESCRIPTION)
        .to_string()
}
