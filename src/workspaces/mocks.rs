#![allow(clippy::significant_drop_tightening)]

//! In-memory repositories. Clones share the same storage, so a clone handed to
//! one action sees writes made through another.

use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, AtomicU32, Ordering};
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::repository::{
    CreateInvitation, CreateMembership, CreateUser, CreateWorkspace, UserRepository,
    WorkspaceInvitationRepository, WorkspaceMembershipRepository, WorkspaceRepository,
};
use super::types::{User, Workspace, WorkspaceInvitation, WorkspaceMembership};
use super::InvitationState;
use crate::WorkspaceError;

fn poisoned<T>(_: T) -> WorkspaceError {
    WorkspaceError::Internal("lock poisoned".into())
}

#[derive(Clone)]
pub struct MockWorkspaceRepository {
    workspaces: Arc<RwLock<HashMap<i64, Workspace>>>,
    next_id: Arc<AtomicI64>,
}

impl MockWorkspaceRepository {
    pub fn new() -> Self {
        Self {
            workspaces: Arc::new(RwLock::new(HashMap::new())),
            next_id: Arc::new(AtomicI64::new(1)),
        }
    }
}

impl Default for MockWorkspaceRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl WorkspaceRepository for MockWorkspaceRepository {
    async fn create(&self, data: CreateWorkspace) -> Result<Workspace, WorkspaceError> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let now = Utc::now();
        let workspace = Workspace {
            id,
            name: data.name,
            slug: data.slug,
            description: data.description,
            owner_id: data.owner_id,
            created_at: now,
            updated_at: now,
        };

        let mut workspaces = self.workspaces.write().map_err(poisoned)?;
        workspaces.insert(id, workspace.clone());

        Ok(workspace)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Workspace>, WorkspaceError> {
        let workspaces = self.workspaces.read().map_err(poisoned)?;
        Ok(workspaces.get(&id).cloned())
    }

    async fn find_by_owner(&self, owner_id: i64) -> Result<Vec<Workspace>, WorkspaceError> {
        let workspaces = self.workspaces.read().map_err(poisoned)?;
        let mut owned: Vec<Workspace> = workspaces
            .values()
            .filter(|w| w.owner_id == owner_id)
            .cloned()
            .collect();
        owned.sort_by_key(|w| w.id);
        Ok(owned)
    }

    async fn delete(&self, id: i64) -> Result<(), WorkspaceError> {
        let mut workspaces = self.workspaces.write().map_err(poisoned)?;
        workspaces.remove(&id);
        Ok(())
    }
}

#[derive(Clone)]
pub struct MockUserRepository {
    users: Arc<RwLock<HashMap<i64, User>>>,
    next_id: Arc<AtomicI64>,
}

impl MockUserRepository {
    pub fn new() -> Self {
        Self {
            users: Arc::new(RwLock::new(HashMap::new())),
            next_id: Arc::new(AtomicI64::new(1)),
        }
    }
}

impl Default for MockUserRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl UserRepository for MockUserRepository {
    async fn create(&self, data: CreateUser) -> Result<User, WorkspaceError> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let user = User {
            id,
            name: data.name,
            email: data.email,
            created_at: Utc::now(),
        };

        let mut users = self.users.write().map_err(poisoned)?;
        users.insert(id, user.clone());

        Ok(user)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<User>, WorkspaceError> {
        let users = self.users.read().map_err(poisoned)?;
        Ok(users.get(&id).cloned())
    }

    async fn delete(&self, id: i64) -> Result<(), WorkspaceError> {
        let mut users = self.users.write().map_err(poisoned)?;
        users.remove(&id);
        Ok(())
    }
}

#[derive(Clone)]
pub struct MockWorkspaceMembershipRepository {
    memberships: Arc<RwLock<HashMap<i64, WorkspaceMembership>>>,
    next_id: Arc<AtomicI64>,
    forced_failures: Arc<AtomicU32>,
}

impl MockWorkspaceMembershipRepository {
    pub fn new() -> Self {
        Self {
            memberships: Arc::new(RwLock::new(HashMap::new())),
            next_id: Arc::new(AtomicI64::new(1)),
            forced_failures: Arc::new(AtomicU32::new(0)),
        }
    }

    /// Makes the next `count` membership inserts fail with
    /// [`WorkspaceError::DatabaseError`], including those made while accepting
    /// an invitation.
    pub fn force_insert_failures(&self, count: u32) {
        self.forced_failures.store(count, Ordering::SeqCst);
    }

    fn insert(&self, data: CreateMembership) -> Result<WorkspaceMembership, WorkspaceError> {
        let mut memberships = self.memberships.write().map_err(poisoned)?;

        if self
            .forced_failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
        {
            return Err(WorkspaceError::DatabaseError("forced membership insert failure".into()));
        }

        if memberships
            .values()
            .any(|m| m.workspace_id == data.workspace_id && m.user_id == data.user_id)
        {
            return Err(WorkspaceError::AlreadyMember);
        }

        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let now = Utc::now();
        let membership = WorkspaceMembership {
            id,
            workspace_id: data.workspace_id,
            user_id: data.user_id,
            role: data.role,
            created_at: now,
            updated_at: now,
        };
        memberships.insert(id, membership.clone());

        Ok(membership)
    }

    /// Number of stored memberships.
    pub fn len(&self) -> usize {
        self.memberships.read().map(|m| m.len()).unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for MockWorkspaceMembershipRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl WorkspaceMembershipRepository for MockWorkspaceMembershipRepository {
    async fn create(&self, data: CreateMembership) -> Result<WorkspaceMembership, WorkspaceError> {
        self.insert(data)
    }

    async fn find_by_workspace_and_user(
        &self,
        workspace_id: i64,
        user_id: i64,
    ) -> Result<Option<WorkspaceMembership>, WorkspaceError> {
        let memberships = self.memberships.read().map_err(poisoned)?;
        Ok(memberships
            .values()
            .find(|m| m.workspace_id == workspace_id && m.user_id == user_id)
            .cloned())
    }

    async fn find_by_workspace(
        &self,
        workspace_id: i64,
    ) -> Result<Vec<WorkspaceMembership>, WorkspaceError> {
        let memberships = self.memberships.read().map_err(poisoned)?;
        let mut found: Vec<WorkspaceMembership> = memberships
            .values()
            .filter(|m| m.workspace_id == workspace_id)
            .cloned()
            .collect();
        found.sort_by_key(|m| m.id);
        Ok(found)
    }

    async fn find_by_user(&self, user_id: i64) -> Result<Vec<WorkspaceMembership>, WorkspaceError> {
        let memberships = self.memberships.read().map_err(poisoned)?;
        let mut found: Vec<WorkspaceMembership> = memberships
            .values()
            .filter(|m| m.user_id == user_id)
            .cloned()
            .collect();
        found.sort_by_key(|m| m.id);
        Ok(found)
    }
}

/// In-memory invitations.
///
/// Accepting writes the membership into the store passed to
/// [`with_memberships`](Self::with_memberships); [`new`](Self::new) gives the
/// repository a private membership store of its own.
#[derive(Clone)]
pub struct MockWorkspaceInvitationRepository {
    invitations: Arc<RwLock<HashMap<i64, WorkspaceInvitation>>>,
    memberships: MockWorkspaceMembershipRepository,
    next_id: Arc<AtomicI64>,
    forced_collisions: Arc<AtomicU32>,
}

impl MockWorkspaceInvitationRepository {
    pub fn new() -> Self {
        Self::with_memberships(&MockWorkspaceMembershipRepository::new())
    }

    /// Shares `memberships` as the store that acceptance writes into.
    pub fn with_memberships(memberships: &MockWorkspaceMembershipRepository) -> Self {
        Self {
            invitations: Arc::new(RwLock::new(HashMap::new())),
            memberships: memberships.clone(),
            next_id: Arc::new(AtomicI64::new(1)),
            forced_collisions: Arc::new(AtomicU32::new(0)),
        }
    }

    /// Makes the next `count` calls to `create` fail with
    /// [`WorkspaceError::DuplicateToken`].
    pub fn force_token_collisions(&self, count: u32) {
        self.forced_collisions.store(count, Ordering::SeqCst);
    }

    /// Overwrites `expires_at` on a stored invitation.
    pub fn set_expires_at(&self, id: i64, expires_at: DateTime<Utc>) -> Result<(), WorkspaceError> {
        let mut invitations = self.invitations.write().map_err(poisoned)?;
        let invitation = invitations
            .get_mut(&id)
            .ok_or(WorkspaceError::InvitationNotFound)?;
        invitation.expires_at = expires_at;
        Ok(())
    }

    /// Drops every invitation of a workspace, standing in for the database
    /// cascade.
    pub fn cascade_workspace(&self, workspace_id: i64) -> Result<(), WorkspaceError> {
        let mut invitations = self.invitations.write().map_err(poisoned)?;
        invitations.retain(|_, i| i.workspace_id != workspace_id);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.invitations.read().map(|i| i.len()).unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn take_forced_collision(&self) -> bool {
        self.forced_collisions
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }

    fn pending_sorted<F>(&self, now: DateTime<Utc>, filter: F) -> Result<Vec<WorkspaceInvitation>, WorkspaceError>
    where
        F: Fn(&WorkspaceInvitation) -> bool,
    {
        let invitations = self.invitations.read().map_err(poisoned)?;
        let mut found: Vec<WorkspaceInvitation> = invitations
            .values()
            .filter(|i| i.state_at(now) == InvitationState::Pending && filter(i))
            .cloned()
            .collect();
        found.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(found)
    }
}

impl Default for MockWorkspaceInvitationRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl WorkspaceInvitationRepository for MockWorkspaceInvitationRepository {
    async fn create(&self, data: CreateInvitation) -> Result<WorkspaceInvitation, WorkspaceError> {
        if self.take_forced_collision() {
            return Err(WorkspaceError::DuplicateToken);
        }

        let mut invitations = self.invitations.write().map_err(poisoned)?;
        let now = Utc::now();

        if invitations.values().any(|i| {
            i.workspace_id == data.workspace_id
                && i.email == data.email
                && i.state_at(now) == InvitationState::Pending
        }) {
            return Err(WorkspaceError::AlreadyInvited);
        }

        if invitations.values().any(|i| i.token_hash == data.token_hash) {
            return Err(WorkspaceError::DuplicateToken);
        }

        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let invitation = WorkspaceInvitation {
            id,
            workspace_id: data.workspace_id,
            email: data.email,
            role: data.role,
            token_hash: data.token_hash,
            invited_by: data.invited_by,
            expires_at: data.expires_at,
            accepted_at: None,
            created_at: now,
            updated_at: now,
        };
        invitations.insert(id, invitation.clone());

        Ok(invitation)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<WorkspaceInvitation>, WorkspaceError> {
        let invitations = self.invitations.read().map_err(poisoned)?;
        Ok(invitations.get(&id).cloned())
    }

    async fn find_by_token_hash(
        &self,
        token_hash: &str,
    ) -> Result<Option<WorkspaceInvitation>, WorkspaceError> {
        let invitations = self.invitations.read().map_err(poisoned)?;
        Ok(invitations
            .values()
            .find(|i| i.token_hash == token_hash)
            .cloned())
    }

    async fn find_pending_by_workspace(
        &self,
        workspace_id: i64,
        now: DateTime<Utc>,
    ) -> Result<Vec<WorkspaceInvitation>, WorkspaceError> {
        self.pending_sorted(now, |i| i.workspace_id == workspace_id)
    }

    async fn find_pending_by_email(
        &self,
        email: &str,
        now: DateTime<Utc>,
    ) -> Result<Vec<WorkspaceInvitation>, WorkspaceError> {
        self.pending_sorted(now, |i| i.email == email)
    }

    async fn find_pending_for(
        &self,
        workspace_id: i64,
        email: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<WorkspaceInvitation>, WorkspaceError> {
        Ok(self
            .pending_sorted(now, |i| i.workspace_id == workspace_id && i.email == email)?
            .into_iter()
            .next())
    }

    async fn accept(
        &self,
        token_hash: &str,
        user_id: i64,
        now: DateTime<Utc>,
    ) -> Result<Option<(WorkspaceInvitation, WorkspaceMembership)>, WorkspaceError> {
        // claim and membership insert under one write guard
        let mut invitations = self.invitations.write().map_err(poisoned)?;

        let Some(invitation) = invitations
            .values_mut()
            .find(|i| i.token_hash == token_hash && i.state_at(now) == InvitationState::Pending)
        else {
            return Ok(None);
        };

        let membership = self.memberships.insert(CreateMembership {
            workspace_id: invitation.workspace_id,
            user_id,
            role: invitation.role,
        })?;

        invitation.accepted_at = Some(now);
        invitation.updated_at = now;

        Ok(Some((invitation.clone(), membership)))
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;
    use crate::workspaces::WorkspaceRole;

    fn create_data(token_hash: &str, expires_at: DateTime<Utc>) -> CreateInvitation {
        CreateInvitation {
            workspace_id: 1,
            email: format!("{token_hash}@example.com"),
            role: WorkspaceRole::Member,
            token_hash: token_hash.to_owned(),
            invited_by: 1,
            expires_at,
        }
    }

    #[tokio::test]
    async fn test_duplicate_token_hash_rejected() {
        let repo = MockWorkspaceInvitationRepository::new();
        let expires_at = Utc::now() + Duration::days(7);

        repo.create(create_data("same", expires_at)).await.unwrap();
        let mut other_address = create_data("same", expires_at);
        other_address.email = "carol@example.com".to_owned();
        let err = repo.create(other_address).await.unwrap_err();
        assert_eq!(err, WorkspaceError::DuplicateToken);
        assert_eq!(repo.len(), 1);
    }

    #[tokio::test]
    async fn test_second_pending_for_same_address_rejected() {
        let repo = MockWorkspaceInvitationRepository::new();
        let expires_at = Utc::now() + Duration::days(7);

        repo.create(create_data("first", expires_at)).await.unwrap();
        let mut again = create_data("first", expires_at);
        again.token_hash = "second".to_owned();
        assert_eq!(
            repo.create(again.clone()).await.unwrap_err(),
            WorkspaceError::AlreadyInvited
        );

        repo.accept("first", 2, Utc::now()).await.unwrap().unwrap();
        assert!(repo.create(again).await.is_ok());
        assert_eq!(repo.len(), 2);
    }

    #[tokio::test]
    async fn test_forced_collisions_are_consumed() {
        let repo = MockWorkspaceInvitationRepository::new();
        let expires_at = Utc::now() + Duration::days(7);
        repo.force_token_collisions(1);

        assert_eq!(
            repo.create(create_data("a", expires_at)).await.unwrap_err(),
            WorkspaceError::DuplicateToken
        );
        assert!(repo.create(create_data("a", expires_at)).await.is_ok());
    }

    #[tokio::test]
    async fn test_accept_only_once() {
        let memberships = MockWorkspaceMembershipRepository::new();
        let repo = MockWorkspaceInvitationRepository::with_memberships(&memberships);
        repo.create(create_data("tok", Utc::now() + Duration::days(7)))
            .await
            .unwrap();

        let now = Utc::now();
        let (invitation, membership) = repo.accept("tok", 2, now).await.unwrap().unwrap();
        assert_eq!(invitation.accepted_at, Some(now));
        assert_eq!(membership.user_id, 2);
        assert_eq!(membership.role, WorkspaceRole::Member);

        let second = repo.accept("tok", 3, Utc::now()).await.unwrap();
        assert!(second.is_none());

        let stored = repo.find_by_token_hash("tok").await.unwrap().unwrap();
        assert_eq!(stored.accepted_at, Some(now));
        assert_eq!(memberships.len(), 1);
    }

    #[tokio::test]
    async fn test_accept_skips_expired() {
        let memberships = MockWorkspaceMembershipRepository::new();
        let repo = MockWorkspaceInvitationRepository::with_memberships(&memberships);
        repo.create(create_data("old", Utc::now() - Duration::hours(1)))
            .await
            .unwrap();

        assert!(repo.accept("old", 2, Utc::now()).await.unwrap().is_none());
        assert!(memberships.is_empty());
    }

    #[tokio::test]
    async fn test_accept_leaves_invitation_pending_when_insert_fails() {
        let memberships = MockWorkspaceMembershipRepository::new();
        let repo = MockWorkspaceInvitationRepository::with_memberships(&memberships);
        repo.create(create_data("tok", Utc::now() + Duration::days(7)))
            .await
            .unwrap();

        memberships.force_insert_failures(1);
        let err = repo.accept("tok", 2, Utc::now()).await.unwrap_err();
        assert!(matches!(err, WorkspaceError::DatabaseError(_)));

        let stored = repo.find_by_token_hash("tok").await.unwrap().unwrap();
        assert!(stored.accepted_at.is_none());
        assert!(memberships.is_empty());

        assert!(repo.accept("tok", 2, Utc::now()).await.unwrap().is_some());
        assert_eq!(memberships.len(), 1);
    }

    #[tokio::test]
    async fn test_accept_leaves_invitation_pending_for_existing_member() {
        let memberships = MockWorkspaceMembershipRepository::new();
        let repo = MockWorkspaceInvitationRepository::with_memberships(&memberships);
        repo.create(create_data("tok", Utc::now() + Duration::days(7)))
            .await
            .unwrap();
        memberships
            .create(CreateMembership {
                workspace_id: 1,
                user_id: 2,
                role: WorkspaceRole::Client,
            })
            .await
            .unwrap();

        let err = repo.accept("tok", 2, Utc::now()).await.unwrap_err();
        assert_eq!(err, WorkspaceError::AlreadyMember);
        let stored = repo.find_by_token_hash("tok").await.unwrap().unwrap();
        assert_eq!(stored.state(), InvitationState::Pending);
    }

    #[tokio::test]
    async fn test_pending_queries_exclude_expired_and_accepted() {
        let repo = MockWorkspaceInvitationRepository::new();
        let future = Utc::now() + Duration::days(7);

        repo.create(create_data("pending", future)).await.unwrap();
        repo.create(create_data("expired", Utc::now() - Duration::days(1)))
            .await
            .unwrap();
        repo.create(create_data("accepted", future)).await.unwrap();
        repo.accept("accepted", 2, Utc::now()).await.unwrap();

        let now = Utc::now();
        let pending = repo.find_pending_by_workspace(1, now).await.unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].token_hash, "pending");

        let by_email = repo.find_pending_by_email("pending@example.com", now).await.unwrap();
        assert_eq!(by_email.len(), 1);
        assert!(repo.find_pending_by_email("expired@example.com", now).await.unwrap().is_empty());

        assert!(repo.find_pending_for(1, "pending@example.com", now).await.unwrap().is_some());
        assert!(repo.find_pending_for(2, "pending@example.com", now).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_membership_pair_unique() {
        let repo = MockWorkspaceMembershipRepository::new();
        let data = CreateMembership {
            workspace_id: 1,
            user_id: 2,
            role: WorkspaceRole::Client,
        };

        repo.create(data.clone()).await.unwrap();
        assert_eq!(
            repo.create(data).await.unwrap_err(),
            WorkspaceError::AlreadyMember
        );
        assert_eq!(repo.len(), 1);
    }
}
