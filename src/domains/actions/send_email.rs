//! Send email action.
//!
//! Sends a plain-text email to a list of recipients through the mail relay.
//! The relay credential and the sender address are injected by the server.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{error, info, instrument, warn};

use super::ActionContext;
use crate::domains::mail::{Mailer, OutgoingEmail, partition_addresses};
use crate::domains::tools::{Action, ActionArgs, ActionError, ActionParam, Dependencies};

const NO_VALID_RECIPIENTS: &str = "No valid email addresses provided";

/// Send a simple email to the specified recipients.
///
/// Invalid addresses are skipped; the call fails only when none is left.
#[instrument(skip_all, fields(recipients = recipients.len()))]
pub async fn send_email_action(
    mailer: &dyn Mailer,
    recipients: &[String],
    subject: &str,
    body: &str,
    postmark_api_key: &str,
    sender_email: &str,
) -> Result<String, ActionError> {
    info!("Send email action called with {} recipients", recipients.len());

    if recipients.is_empty() {
        return Err(ActionError::invalid_input(NO_VALID_RECIPIENTS));
    }

    let addresses = partition_addresses(recipients);
    if !addresses.invalid.is_empty() {
        warn!(
            "Skipping {} invalid email addresses",
            addresses.invalid.len()
        );
    }
    if addresses.valid.is_empty() {
        return Err(ActionError::invalid_input(NO_VALID_RECIPIENTS));
    }

    let email = OutgoingEmail {
        from: sender_email.to_string(),
        to: addresses.valid,
        subject: subject.to_string(),
        body: body.to_string(),
    };

    mailer.send(&email, postmark_api_key).await.map_err(|e| {
        error!("Error sending email: {}", e);
        ActionError::failed(format!("Failed to send email: {}", e))
    })?;

    let message = format!("Email sent successfully to {} recipients", email.to.len());
    info!("{}", message);
    Ok(message)
}

const PARAMS: &[ActionParam] = &[
    ActionParam::required("recipients", "Vec<String>"),
    ActionParam::required("subject", "String"),
    ActionParam::required("body", "String"),
    ActionParam::required(Dependencies::POSTMARK_API_KEY, "String"),
    ActionParam::required(Dependencies::SENDER_EMAIL, "String"),
];

/// `send_email_action` as a discoverable action.
pub struct SendEmailAction {
    mailer: Arc<dyn Mailer>,
}

impl SendEmailAction {
    /// Create the action around a mail transport.
    pub fn new(mailer: Arc<dyn Mailer>) -> Self {
        Self { mailer }
    }
}

#[async_trait]
impl Action for SendEmailAction {
    fn function_name(&self) -> &'static str {
        "send_email_action"
    }

    fn doc(&self) -> Option<&'static str> {
        Some(
            "Send a simple email to the specified recipients.\n\n\
             Invalid addresses are skipped. Returns a success message with the recipient count.",
        )
    }

    fn params(&self) -> &'static [ActionParam] {
        PARAMS
    }

    async fn call(&self, args: ActionArgs) -> Result<Value, ActionError> {
        let recipients = args.string_list("recipients")?;
        let subject = args.string("subject")?;
        let body = args.string("body")?;
        let api_key = args.string(Dependencies::POSTMARK_API_KEY)?;
        let sender = args.string(Dependencies::SENDER_EMAIL)?;

        send_email_action(
            self.mailer.as_ref(),
            &recipients,
            &subject,
            &body,
            &api_key,
            &sender,
        )
        .await
        .map(Value::String)
    }
}

/// Module loader.
pub fn load(context: &ActionContext) -> Result<Vec<Arc<dyn Action>>, ActionError> {
    Ok(vec![Arc::new(SendEmailAction::new(context.mailer()))])
}
