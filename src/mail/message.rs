use serde::{Deserialize, Serialize};

/// A rendered outbound email.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MailMessage {
    /// `Name <address>` of the sender.
    pub from: String,
    pub to: String,
    pub subject: String,
    pub html_body: String,
    /// Plain-text alternative for clients that do not render HTML.
    pub text_body: String,
}
