//! Domains module containing business logic organized by bounded contexts.
//!
//! - **tools**: registry, schema inference, dependency injection and discovery
//! - **actions**: the action functions exposed as tools
//! - **mail**: address validation and the outbound mail relay

pub mod actions;
pub mod mail;
pub mod tools;
