//! Mail domain module.
//!
//! Everything the email action needs to talk to the upstream relay:
//! address validation, the outgoing message model, and the `Mailer`
//! transport seam with its SMTP implementation.

mod address;
mod error;
mod transport;

pub use address::{AddressPartition, partition_addresses};
pub use error::MailError;
pub use transport::{Mailer, OutgoingEmail, SmtpMailer};
