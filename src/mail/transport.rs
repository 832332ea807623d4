use async_trait::async_trait;

use super::MailMessage;
use crate::WorkspaceError;

/// Accepts a message for later delivery.
///
/// Implementations must not wait for the message to actually be sent; issuing
/// an invitation never blocks on mail delivery.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn queue(&self, message: MailMessage) -> Result<(), WorkspaceError>;
}

/// Delivers a message (SMTP, an HTTP mail API, ...).
#[async_trait]
pub trait MailTransport: Send + Sync + 'static {
    async fn send(&self, message: &MailMessage) -> Result<(), WorkspaceError>;
}

/// Transport that only logs the envelope. Useful in development.
#[derive(Debug, Clone, Default)]
pub struct LogTransport;

#[async_trait]
impl MailTransport for LogTransport {
    async fn send(&self, message: &MailMessage) -> Result<(), WorkspaceError> {
        log::info!(
            target: "tenancy::mail",
            "msg=\"mail delivered to log transport\", to=\"{}\", subject=\"{}\"",
            message.to,
            message.subject
        );
        log::debug!(target: "tenancy::mail", "{}", message.text_body);
        Ok(())
    }
}
