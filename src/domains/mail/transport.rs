//! Outgoing mail transport.
//!
//! The `Mailer` trait is the narrow seam the email action talks to. The
//! production implementation relays over SMTP with STARTTLS; the relay
//! credential is supplied per call because it is an injected dependency
//! held by the bound tool, not by the transport.

use async_trait::async_trait;
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor, message::Mailbox,
    transport::smtp::authentication::Credentials,
};
use tracing::{info, instrument};

use super::MailError;

/// A plain-text email ready to be relayed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingEmail {
    pub from: String,
    pub to: Vec<String>,
    pub subject: String,
    pub body: String,
}

/// Delivers outgoing email through an upstream relay.
#[async_trait]
pub trait Mailer: Send + Sync {
    /// Send `email`, authenticating to the relay with `credential`.
    async fn send(&self, email: &OutgoingEmail, credential: &str) -> Result<(), MailError>;
}

/// SMTP relay mailer (STARTTLS).
///
/// Postmark expects its server token as both SMTP username and password.
#[derive(Debug, Clone)]
pub struct SmtpMailer {
    host: String,
    port: u16,
}

impl SmtpMailer {
    /// Postmark's SMTP relay host.
    pub const POSTMARK_HOST: &'static str = "smtp.postmarkapp.com";

    /// Submission port used with STARTTLS.
    pub const SUBMISSION_PORT: u16 = 587;

    /// Create a mailer relaying through `host:port`.
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// Get the relay address.
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    fn build_message(email: &OutgoingEmail) -> Result<Message, MailError> {
        let from: Mailbox = email
            .from
            .parse()
            .map_err(|e| MailError::invalid_address(&email.from, e))?;

        let mut builder = Message::builder().from(from).subject(email.subject.as_str());
        for address in &email.to {
            let mailbox: Mailbox = address
                .parse()
                .map_err(|e| MailError::invalid_address(address, e))?;
            builder = builder.to(mailbox);
        }

        builder
            .body(email.body.clone())
            .map_err(|e| MailError::Build(e.to_string()))
    }
}

impl Default for SmtpMailer {
    fn default() -> Self {
        Self::new(Self::POSTMARK_HOST, Self::SUBMISSION_PORT)
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    #[instrument(skip_all, fields(relay = %self.address(), recipients = email.to.len()))]
    async fn send(&self, email: &OutgoingEmail, credential: &str) -> Result<(), MailError> {
        let message = Self::build_message(email)?;

        info!("Connecting to SMTP relay");
        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&self.host)
            .map_err(MailError::relay)?
            .port(self.port)
            .credentials(Credentials::new(
                credential.to_string(),
                credential.to_string(),
            ))
            .build();

        transport.send(message).await.map_err(MailError::relay)?;

        info!("Relay accepted message");
        Ok(())
    }
}
