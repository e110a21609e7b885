//! Security module.
//!
//! This module provides the API key gate applied in front of every HTTP
//! route.

mod api_key;

pub use api_key::{API_KEY_HEADER, ApiKeyGate, constant_time_eq, require_api_key};
