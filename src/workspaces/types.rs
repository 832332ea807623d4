//! Core types for workspaces, memberships and invitations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{InvitationState, WorkspaceRole};

/// A tenant-scoped container for projects, tasks and members.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Workspace {
    pub id: i64,
    pub name: String,
    /// URL-friendly unique identifier.
    pub slug: String,
    pub description: Option<String>,
    /// User ID of the workspace owner.
    pub owner_id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// An account as seen by this crate: enough to address and greet it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

/// Links a user to a workspace with a role.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkspaceMembership {
    pub id: i64,
    pub workspace_id: i64,
    pub user_id: i64,
    pub role: WorkspaceRole,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// An invitation for an email address to join a workspace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkspaceInvitation {
    pub id: i64,
    pub workspace_id: i64,
    /// Normalized invitee address. Does not need to belong to an account.
    pub email: String,
    /// Role granted on acceptance.
    pub role: WorkspaceRole,
    /// SHA-256 hex digest of the plain token. Unique and never updated.
    #[serde(skip_serializing)]
    pub token_hash: String,
    pub invited_by: i64,
    pub expires_at: DateTime<Utc>,
    /// Set once, on acceptance.
    pub accepted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl WorkspaceInvitation {
    pub fn state_at(&self, now: DateTime<Utc>) -> InvitationState {
        InvitationState::evaluate(self.accepted_at, self.expires_at, now)
    }

    pub fn state(&self) -> InvitationState {
        self.state_at(Utc::now())
    }

    pub fn is_acceptable_at(&self, now: DateTime<Utc>) -> bool {
        self.state_at(now).is_acceptable()
    }

    pub fn is_expired(&self) -> bool {
        self.state() == InvitationState::Expired
    }

    pub fn is_accepted(&self) -> bool {
        self.accepted_at.is_some()
    }
}
