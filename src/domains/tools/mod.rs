//! Tools domain module.
//!
//! This module handles all tool-related functionality for the MCP server.
//! Tools are executable functions that can be called by MCP clients.
//!
//! ## Architecture
//!
//! - `handlers.rs` - The `Action` trait and declared parameters
//! - `schema.rs` - Parameter kinds, schema inference and argument validation
//! - `injection.rs` - Server-held dependencies and bound actions
//! - `registry.rs` - The `Tool` model and the ordered tool registry
//! - `discovery.rs` - Builds the registry from the action module table
//! - `error.rs` - Tool-specific error types
//!
//! ## Adding a New Tool
//!
//! 1. Write the action in `domains/actions/` and name it `<tool>_action`
//! 2. Declare its parameters; name injected ones after a `Dependencies` key
//! 3. Add its module to `ACTION_MODULES`
//!
//! Nothing in the transport or the server needs to change.

pub mod discovery;
mod error;
mod handlers;
mod injection;
mod registry;
mod schema;

pub use discovery::{ACTION_SUFFIX, DEFAULT_DESCRIPTION, build_tool, discover};
pub use error::{ActionError, DiscoveryError, ToolError};
pub use handlers::{Action, ActionArgs, ActionParam};
pub use injection::{BoundAction, Dependencies};
pub use registry::{Tool, ToolRegistry};
pub use schema::{ParamKind, ParameterSchema, SchemaField};
