//! Action modules.
//!
//! Each submodule holds framework-free business logic plus a loader that
//! hands its functions to discovery. `ACTION_MODULES` is the fixed set of
//! modules scanned at startup.

pub mod send_email;
pub mod status;

use std::fmt;
use std::sync::Arc;

use crate::domains::mail::Mailer;
use crate::domains::tools::{Action, ActionError};

/// Loads the functions a module exposes.
pub type ModuleLoader = fn(&ActionContext) -> Result<Vec<Arc<dyn Action>>, ActionError>;

/// Infrastructure handed to module loaders.
#[derive(Clone)]
pub struct ActionContext {
    mailer: Arc<dyn Mailer>,
}

impl ActionContext {
    /// Create a context around the given mail transport.
    pub fn new(mailer: Arc<dyn Mailer>) -> Self {
        Self { mailer }
    }

    /// The outgoing mail transport.
    pub fn mailer(&self) -> Arc<dyn Mailer> {
        self.mailer.clone()
    }
}

impl fmt::Debug for ActionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionContext").finish_non_exhaustive()
    }
}

/// A named, loadable action module.
#[derive(Debug, Clone, Copy)]
pub struct ActionModule {
    pub name: &'static str,
    pub load: ModuleLoader,
}

impl ActionModule {
    /// Declare a module.
    pub const fn new(name: &'static str, load: ModuleLoader) -> Self {
        Self { name, load }
    }
}

/// Every action module the server exposes.
pub const ACTION_MODULES: &[ActionModule] = &[
    ActionModule::new("send_email", send_email::load),
    ActionModule::new("status", status::load),
];
