use async_trait::async_trait;

use crate::events::{InvitationEvent, Listener};

/// Emits invitation events as tracing events.
pub struct TracingListener;

#[async_trait]
impl Listener for TracingListener {
    async fn handle(&self, event: &InvitationEvent) {
        tracing::info!(
            target: "tenancy::events",
            event_name = event.name(),
            workspace_id = event.workspace_id(),
            ?event,
            "invitation event"
        );
    }
}
