use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::task::JoinHandle;

use super::{MailMessage, MailTransport, Mailer};
use crate::WorkspaceError;

/// [`Mailer`] backed by a bounded channel and a spawned delivery worker.
///
/// The worker exits once every clone of the mailer has been dropped and the
/// queue is drained.
#[derive(Debug, Clone)]
pub struct QueuedMailer {
    tx: mpsc::Sender<MailMessage>,
}

impl QueuedMailer {
    /// Spawns the delivery worker on the current tokio runtime.
    pub fn spawn<T: MailTransport>(transport: T, capacity: usize) -> (Self, JoinHandle<()>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let worker = tokio::spawn(deliver(transport, rx));
        (Self { tx }, worker)
    }
}

async fn deliver<T: MailTransport>(transport: T, mut rx: mpsc::Receiver<MailMessage>) {
    while let Some(message) = rx.recv().await {
        if let Err(e) = transport.send(&message).await {
            log::error!(
                target: "tenancy::mail",
                "msg=\"mail delivery failed\", to=\"{}\", error=\"{e}\"",
                message.to
            );
        }
    }
    log::debug!(target: "tenancy::mail", "msg=\"mail worker stopped\"");
}

#[async_trait]
impl Mailer for QueuedMailer {
    async fn queue(&self, message: MailMessage) -> Result<(), WorkspaceError> {
        self.tx.try_send(message).map_err(|e| match e {
            TrySendError::Full(_) => WorkspaceError::Internal("mail queue is full".to_owned()),
            TrySendError::Closed(_) => WorkspaceError::Internal("mail queue is closed".to_owned()),
        })
    }
}
