use async_trait::async_trait;

use super::InvitationEvent;

/// Receives invitation events.
///
/// Handlers run inline on the request that produced the event, so keep them
/// short or hand work off to a queue.
#[async_trait]
pub trait Listener: Send + Sync + 'static {
    async fn handle(&self, event: &InvitationEvent);
}
