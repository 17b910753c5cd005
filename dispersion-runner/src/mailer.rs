//! Alert delivery. The pipeline talks to [`AlertMailer`]; [`SmtpMailer`] is
//! the real implementation.

use lettre::message::{Mailbox, MultiPart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};
use thiserror::Error;

use crate::config::EmailConfig;
use crate::report::AlertEmail;

#[derive(Debug, Error)]
pub enum EmailError {
    #[error("email configuration incomplete: missing {}", .missing.join(", "))]
    Incomplete { missing: Vec<&'static str> },

    #[error("invalid address '{address}': {reason}")]
    Address { address: String, reason: String },

    #[error("failed to build message: {0}")]
    Build(String),

    #[error("SMTP delivery failed: {0}")]
    Transport(String),
}

/// Something that can deliver a composed alert.
pub trait AlertMailer: Send + Sync {
    fn send(&self, email: &AlertEmail) -> Result<(), EmailError>;

    /// False when sending would fail for lack of configuration.
    fn is_configured(&self) -> bool {
        true
    }
}

/// STARTTLS SMTP relay with username/password login.
#[derive(Debug, Clone)]
pub struct SmtpMailer {
    config: EmailConfig,
}

struct Credentialed<'a> {
    sender: &'a str,
    password: &'a str,
    recipient: &'a str,
}

fn mailbox(address: &str) -> Result<Mailbox, EmailError> {
    address.trim().parse().map_err(|e: lettre::address::AddressError| EmailError::Address {
        address: address.to_string(),
        reason: e.to_string(),
    })
}

impl SmtpMailer {
    pub fn new(config: EmailConfig) -> Self {
        Self { config }
    }

    fn credentials(&self) -> Result<Credentialed<'_>, EmailError> {
        match (&self.config.sender, &self.config.password, &self.config.recipient) {
            (Some(sender), Some(password), Some(recipient)) if self.config.is_complete() => {
                Ok(Credentialed {
                    sender,
                    password,
                    recipient,
                })
            }
            _ => Err(EmailError::Incomplete {
                missing: self.config.missing_fields(),
            }),
        }
    }

    /// Build the multipart/alternative message without sending it.
    pub fn build_message(&self, email: &AlertEmail) -> Result<Message, EmailError> {
        let creds = self.credentials()?;
        Message::builder()
            .from(mailbox(creds.sender)?)
            .to(mailbox(creds.recipient)?)
            .subject(email.subject.clone())
            .multipart(MultiPart::alternative_plain_html(
                email.text.clone(),
                email.html.clone(),
            ))
            .map_err(|e| EmailError::Build(e.to_string()))
    }
}

impl AlertMailer for SmtpMailer {
    fn send(&self, email: &AlertEmail) -> Result<(), EmailError> {
        let message = self.build_message(email)?;
        let creds = self.credentials()?;

        tracing::info!(
            server = %self.config.smtp_server,
            port = self.config.smtp_port,
            "connecting to SMTP server"
        );
        let transport = SmtpTransport::starttls_relay(&self.config.smtp_server)
            .map_err(|e| EmailError::Transport(e.to_string()))?
            .port(self.config.smtp_port)
            .credentials(Credentials::new(
                creds.sender.trim().to_string(),
                creds.password.to_string(),
            ))
            .build();

        transport
            .send(&message)
            .map_err(|e| EmailError::Transport(e.to_string()))?;
        tracing::info!(recipient = creds.recipient, "alert email sent");
        Ok(())
    }

    fn is_configured(&self) -> bool {
        self.config.is_complete()
    }
}
