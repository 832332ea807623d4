//! Invitation notifications: rendering and delivery.
//!
//! Rendering is pure ([`InvitationMail::render`]). Delivery is split in two:
//! actions hand messages to a [`Mailer`], which must return without waiting
//! for the network; a [`MailTransport`] performs the actual send. The
//! [`QueuedMailer`] connects the two through a bounded channel and a
//! background worker.

mod message;
mod queue;
mod render;
mod transport;

#[cfg(any(test, feature = "mocks"))]
mod mocks;

pub use message::MailMessage;
pub use queue::QueuedMailer;
pub use render::InvitationMail;
pub use transport::{LogTransport, MailTransport, Mailer};

#[cfg(any(test, feature = "mocks"))]
pub use mocks::{MockMailTransport, MockMailer};
