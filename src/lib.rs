//! Workspace invitation lifecycle.
//!
//! `tenancy` issues tokenized invitations into a workspace, renders and queues
//! the invitation email, and turns a valid token into a workspace membership.
//! Storage, mail delivery and authentication are injected through traits, so the
//! same actions run against SQLite, the in-memory mocks, or your own backends.
//!
//! # Quick start
//!
//! ```rust,ignore
//! use tenancy::workspaces::{AcceptInvitationAction, IssueInvitationAction, IssueInvitationInput, WorkspaceRole};
//!
//! let issued = IssueInvitationAction::new(workspaces, users, invitations.clone(), mailer)
//!     .execute(IssueInvitationInput {
//!         workspace_id: 1,
//!         invited_by: 1,
//!         email: "bob@example.com".to_owned(),
//!         role: WorkspaceRole::Member,
//!     })
//!     .await?;
//!
//! // later, when bob follows the link
//! let accepted = AcceptInvitationAction::new(invitations, memberships)
//!     .execute(&issued.token, bob.id)
//!     .await?;
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

pub mod api;
pub mod config;
pub mod crypto;
pub mod events;
pub mod mail;
mod secret;
pub mod validators;
pub mod workspaces;

#[cfg(feature = "sqlx_sqlite")]
pub mod sqlite;

pub use secret::SecretString;

/// Why an existing invitation can no longer be accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotAcceptableReason {
    /// The invitation passed its `expires_at` before being accepted.
    Expired,
    /// The invitation was already used.
    AlreadyAccepted,
}

impl NotAcceptableReason {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Expired => "expired",
            Self::AlreadyAccepted => "already_accepted",
        }
    }
}

impl fmt::Display for NotAcceptableReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum WorkspaceError {
    /// The workspace does not exist.
    NotFound,
    UserNotFound,
    /// No invitation matches the presented token.
    InvitationNotFound,
    InvitationNotAcceptable(NotAcceptableReason),
    /// A freshly generated token collided with a stored one.
    DuplicateToken,
    /// A pending invitation for the same workspace and email already exists.
    AlreadyInvited,
    AlreadyMember,
    InvalidRole(String),
    InvalidEmail,
    Validation(String),
    Unauthorized,
    DatabaseError(String),
    Internal(String),
}

impl WorkspaceError {
    /// Stable machine-readable error code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotFound => "workspace_not_found",
            Self::UserNotFound => "user_not_found",
            Self::InvitationNotFound => "invitation_not_found",
            Self::InvitationNotAcceptable(_) => "invitation_not_acceptable",
            Self::DuplicateToken => "duplicate_token",
            Self::AlreadyInvited => "already_invited",
            Self::AlreadyMember => "already_member",
            Self::InvalidRole(_) => "invalid_role",
            Self::InvalidEmail => "invalid_email",
            Self::Validation(_) => "validation_error",
            Self::Unauthorized => "unauthorized",
            Self::DatabaseError(_) => "database_error",
            Self::Internal(_) => "internal_error",
        }
    }
}

impl std::error::Error for WorkspaceError {}

impl fmt::Display for WorkspaceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "Workspace not found"),
            Self::UserNotFound => write!(f, "User not found"),
            Self::InvitationNotFound => write!(f, "Invitation not found"),
            Self::InvitationNotAcceptable(NotAcceptableReason::Expired) => {
                write!(f, "Invitation has expired")
            }
            Self::InvitationNotAcceptable(NotAcceptableReason::AlreadyAccepted) => {
                write!(f, "Invitation has already been accepted")
            }
            Self::DuplicateToken => write!(f, "Invitation token already exists"),
            Self::AlreadyInvited => {
                write!(f, "A pending invitation already exists for this email")
            }
            Self::AlreadyMember => write!(f, "User is already a member of this workspace"),
            Self::InvalidRole(role) => write!(f, "Invalid role: {role}"),
            Self::InvalidEmail => write!(f, "Invalid email format"),
            Self::Validation(msg) => write!(f, "Validation error: {msg}"),
            Self::Unauthorized => write!(f, "Authentication required"),
            Self::DatabaseError(msg) => write!(f, "Database error: {msg}"),
            Self::Internal(msg) => write!(f, "Internal error: {msg}"),
        }
    }
}
