//! Mail-specific error types.

use thiserror::Error;

/// Errors raised while building or delivering an email.
#[derive(Debug, Error)]
pub enum MailError {
    /// An address could not be parsed into a mailbox.
    #[error("Invalid address '{address}': {reason}")]
    InvalidAddress { address: String, reason: String },

    /// The message could not be assembled.
    #[error("Failed to build email message: {0}")]
    Build(String),

    /// The relay refused the message or could not be reached.
    #[error("Relay error: {0}")]
    Relay(String),
}

impl MailError {
    /// Create an invalid address error.
    pub fn invalid_address(address: impl Into<String>, reason: impl ToString) -> Self {
        Self::InvalidAddress {
            address: address.into(),
            reason: reason.to_string(),
        }
    }

    /// Create a relay error.
    pub fn relay(msg: impl ToString) -> Self {
        Self::Relay(msg.to_string())
    }
}
