use std::sync::Arc;

use super::{InvitationEvent, Listener};

/// Ordered set of listeners, cloned into each action that emits events.
#[derive(Clone, Default)]
pub struct EventDispatcher {
    listeners: Vec<Arc<dyn Listener>>,
}

impl EventDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a listener. Listeners are called in the order they were added.
    #[must_use]
    pub fn listen(mut self, listener: impl Listener) -> Self {
        self.listeners.push(Arc::new(listener));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    pub async fn dispatch(&self, event: &InvitationEvent) {
        for listener in &self.listeners {
            listener.handle(event).await;
        }
    }
}

impl std::fmt::Debug for EventDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventDispatcher")
            .field("listeners", &self.listeners.len())
            .finish()
    }
}
