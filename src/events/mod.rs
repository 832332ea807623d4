//! Invitation lifecycle events.
//!
//! Actions emit an [`InvitationEvent`] after each successful state change. The
//! [`EventDispatcher`] is handed to actions explicitly; an action built without
//! one dispatches to nobody.
//!
//! # Custom Listeners
//!
//! ```rust,ignore
//! use tenancy::events::{EventDispatcher, InvitationEvent, Listener};
//! use async_trait::async_trait;
//!
//! struct AcceptedCounter;
//!
//! #[async_trait]
//! impl Listener for AcceptedCounter {
//!     async fn handle(&self, event: &InvitationEvent) {
//!         if let InvitationEvent::Accepted { workspace_id, .. } = event {
//!             // bump a per-workspace counter
//!         }
//!     }
//! }
//!
//! let events = EventDispatcher::new().listen(AcceptedCounter);
//! ```

mod dispatcher;
mod event;
mod listener;

pub mod listeners;

pub use dispatcher::EventDispatcher;
pub use event::InvitationEvent;
pub use listener::Listener;
