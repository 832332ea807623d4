use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::WorkspaceRole;
use super::types::{User, Workspace, WorkspaceInvitation, WorkspaceMembership};
use crate::WorkspaceError;

#[derive(Debug, Clone)]
pub struct CreateWorkspace {
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub owner_id: i64,
}

#[derive(Debug, Clone)]
pub struct CreateUser {
    pub name: String,
    pub email: String,
}

#[derive(Debug, Clone)]
pub struct CreateMembership {
    pub workspace_id: i64,
    pub user_id: i64,
    pub role: WorkspaceRole,
}

#[derive(Debug, Clone)]
pub struct CreateInvitation {
    pub workspace_id: i64,
    pub email: String,
    pub role: WorkspaceRole,
    pub token_hash: String,
    pub invited_by: i64,
    pub expires_at: DateTime<Utc>,
}

/// Workspace entity store. Deleting a workspace cascades to its memberships and
/// invitations.
#[async_trait]
pub trait WorkspaceRepository: Send + Sync {
    async fn create(&self, data: CreateWorkspace) -> Result<Workspace, WorkspaceError>;
    async fn find_by_id(&self, id: i64) -> Result<Option<Workspace>, WorkspaceError>;
    async fn find_by_owner(&self, owner_id: i64) -> Result<Vec<Workspace>, WorkspaceError>;
    async fn delete(&self, id: i64) -> Result<(), WorkspaceError>;
}

/// Account lookups. Deleting a user cascades to the invitations they issued.
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn create(&self, data: CreateUser) -> Result<User, WorkspaceError>;
    async fn find_by_id(&self, id: i64) -> Result<Option<User>, WorkspaceError>;
    async fn delete(&self, id: i64) -> Result<(), WorkspaceError>;
}

#[async_trait]
pub trait WorkspaceMembershipRepository: Send + Sync {
    /// Fails with [`WorkspaceError::AlreadyMember`] when the pair already exists.
    async fn create(&self, data: CreateMembership) -> Result<WorkspaceMembership, WorkspaceError>;
    async fn find_by_workspace_and_user(
        &self,
        workspace_id: i64,
        user_id: i64,
    ) -> Result<Option<WorkspaceMembership>, WorkspaceError>;
    async fn find_by_workspace(
        &self,
        workspace_id: i64,
    ) -> Result<Vec<WorkspaceMembership>, WorkspaceError>;
    async fn find_by_user(&self, user_id: i64) -> Result<Vec<WorkspaceMembership>, WorkspaceError>;
}

/// The invitation store.
///
/// There is no update or delete beyond [`accept`](Self::accept): records only
/// disappear through cascade from their workspace or inviter.
#[async_trait]
pub trait WorkspaceInvitationRepository: Send + Sync {
    /// Fails with [`WorkspaceError::DuplicateToken`] when `token_hash` is taken,
    /// and with [`WorkspaceError::AlreadyInvited`] when a pending invitation for
    /// the same workspace and email exists at insert time.
    async fn create(&self, data: CreateInvitation) -> Result<WorkspaceInvitation, WorkspaceError>;
    async fn find_by_id(&self, id: i64) -> Result<Option<WorkspaceInvitation>, WorkspaceError>;
    async fn find_by_token_hash(
        &self,
        token_hash: &str,
    ) -> Result<Option<WorkspaceInvitation>, WorkspaceError>;
    async fn find_pending_by_workspace(
        &self,
        workspace_id: i64,
        now: DateTime<Utc>,
    ) -> Result<Vec<WorkspaceInvitation>, WorkspaceError>;
    async fn find_pending_by_email(
        &self,
        email: &str,
        now: DateTime<Utc>,
    ) -> Result<Vec<WorkspaceInvitation>, WorkspaceError>;
    async fn find_pending_for(
        &self,
        workspace_id: i64,
        email: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<WorkspaceInvitation>, WorkspaceError>;

    /// Claims the pending invitation with this token for `user_id`.
    ///
    /// In one atomic step: sets `accepted_at = now` only if the invitation is
    /// still pending (`accepted_at IS NULL AND expires_at > now`), and creates
    /// the membership at the invitation's role. If the membership cannot be
    /// created the claim is undone and the error returned, so the invitation
    /// stays pending.
    ///
    /// Returns `None` when no pending row matched, which is how the loser of a
    /// concurrent acceptance finds out.
    async fn accept(
        &self,
        token_hash: &str,
        user_id: i64,
        now: DateTime<Utc>,
    ) -> Result<Option<(WorkspaceInvitation, WorkspaceMembership)>, WorkspaceError>;
}
