//! Axum handlers for issuing, showing and accepting invitations.
//!
//! ```rust,ignore
//! use axum::Router;
//! use tenancy::api::axum::{InvitationsState, invitation_routes, workspace_invitation_routes};
//!
//! let state = InvitationsState::new(workspaces, users, invitations, memberships, mailer, sessions);
//!
//! let app = Router::new()
//!     .nest("/workspaces", workspace_invitation_routes())
//!     .nest("/invitations", invitation_routes())
//!     .with_state(state);
//! ```

mod error;
mod handlers;
mod middleware;
mod routes;

pub use error::AppError;
pub use middleware::{AuthenticatedUser, extract_bearer_token};
pub use routes::{InvitationsState, invitation_routes, workspace_invitation_routes};
