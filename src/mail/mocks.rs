use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use super::{MailMessage, MailTransport, Mailer};
use crate::WorkspaceError;

/// Records queued messages instead of delivering them.
#[derive(Clone, Default)]
pub struct MockMailer {
    queued: Arc<Mutex<Vec<MailMessage>>>,
    closed: Arc<AtomicBool>,
}

impl MockMailer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything queued so far.
    pub fn queued(&self) -> Vec<MailMessage> {
        self.queued.lock().map(|q| q.clone()).unwrap_or_default()
    }

    /// Makes every later `queue` call fail as if the queue were closed.
    pub fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl Mailer for MockMailer {
    async fn queue(&self, message: MailMessage) -> Result<(), WorkspaceError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(WorkspaceError::Internal("mail queue is closed".to_owned()));
        }
        self.queued
            .lock()
            .map_err(|_| WorkspaceError::Internal("lock poisoned".into()))?
            .push(message);
        Ok(())
    }
}

/// Transport that records sent messages and can be told to fail.
#[derive(Clone, Default)]
pub struct MockMailTransport {
    sent: Arc<Mutex<Vec<MailMessage>>>,
    failures: Arc<AtomicU32>,
}

impl MockMailTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<MailMessage> {
        self.sent.lock().map(|s| s.clone()).unwrap_or_default()
    }

    /// Fails the next `count` sends.
    pub fn fail_next(&self, count: u32) {
        self.failures.store(count, Ordering::SeqCst);
    }
}

#[async_trait]
impl MailTransport for MockMailTransport {
    async fn send(&self, message: &MailMessage) -> Result<(), WorkspaceError> {
        if self
            .failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
        {
            return Err(WorkspaceError::Internal("smtp unavailable".to_owned()));
        }
        self.sent
            .lock()
            .map_err(|_| WorkspaceError::Internal("lock poisoned".into()))?
            .push(message.clone());
        Ok(())
    }
}
