use chrono::Utc;

use crate::crypto::hash_token;
use crate::events::{EventDispatcher, InvitationEvent};
use crate::workspaces::{
    InvitationState, WorkspaceInvitation, WorkspaceInvitationRepository, WorkspaceMembership,
    WorkspaceMembershipRepository,
};
use crate::{NotAcceptableReason, SecretString, WorkspaceError};

/// Output from accepting an invitation.
#[derive(Debug, Clone)]
pub struct AcceptInvitationOutput {
    /// The invitation with `accepted_at` set.
    pub invitation: WorkspaceInvitation,
    pub membership: WorkspaceMembership,
}

/// Action to accept a workspace invitation.
///
/// This action:
/// 1. Hashes the presented token and finds the invitation
/// 2. Checks the invitation is neither expired nor already accepted
/// 3. Refuses users who already belong to the workspace
/// 4. Claims the invitation and creates the membership at its stored role in
///    one atomic repository call, so only one of two concurrent acceptances
///    succeeds and a failed membership insert leaves the invitation pending
///
/// Any authenticated user holding the token may accept it; the invitation email
/// is not compared with the account email.
pub struct AcceptInvitationAction<I, M>
where
    I: WorkspaceInvitationRepository,
    M: WorkspaceMembershipRepository,
{
    invitation_repo: I,
    membership_repo: M,
    events: EventDispatcher,
}

impl<I, M> AcceptInvitationAction<I, M>
where
    I: WorkspaceInvitationRepository,
    M: WorkspaceMembershipRepository,
{
    pub fn new(invitation_repo: I, membership_repo: M) -> Self {
        Self {
            invitation_repo,
            membership_repo,
            events: EventDispatcher::default(),
        }
    }

    #[must_use]
    pub fn events(mut self, events: EventDispatcher) -> Self {
        self.events = events;
        self
    }

    /// Accepts an invitation using the plain token from the email link.
    ///
    /// # Returns
    ///
    /// - `Ok(output)` - invitation accepted, user added to the workspace
    /// - `Err(WorkspaceError::InvitationNotFound)` - no invitation for this token
    /// - `Err(WorkspaceError::InvitationNotAcceptable(reason))` - expired or used
    /// - `Err(WorkspaceError::AlreadyMember)` - user already in the workspace
    /// - `Err(_)` - database errors
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "accept_invitation", skip_all, err)
    )]
    pub async fn execute(
        &self,
        token: &SecretString,
        user_id: i64,
    ) -> Result<AcceptInvitationOutput, WorkspaceError> {
        let token_hash = hash_token(token.expose_secret());

        let invitation = self
            .invitation_repo
            .find_by_token_hash(&token_hash)
            .await?
            .ok_or(WorkspaceError::InvitationNotFound)?;

        let now = Utc::now();
        invitation.state_at(now).ensure_acceptable()?;

        if self
            .membership_repo
            .find_by_workspace_and_user(invitation.workspace_id, user_id)
            .await?
            .is_some()
        {
            return Err(WorkspaceError::AlreadyMember);
        }

        let Some((invitation, membership)) = self
            .invitation_repo
            .accept(&token_hash, user_id, now)
            .await
            .map_err(|e| {
                log::warn!(
                    target: "tenancy",
                    "msg=\"invitation acceptance rolled back\", invitation_id={}, user_id={user_id}, error=\"{e}\"",
                    invitation.id
                );
                e
            })?
        else {
            return Err(self.claim_failure(&token_hash).await);
        };

        log::info!(
            target: "tenancy",
            "msg=\"invitation accepted\", workspace_id={}, invitation_id={}, user_id={user_id}",
            invitation.workspace_id,
            invitation.id
        );

        self.events
            .dispatch(&InvitationEvent::Accepted {
                invitation_id: invitation.id,
                workspace_id: invitation.workspace_id,
                user_id,
                membership_id: membership.id,
                at: now,
            })
            .await;

        Ok(AcceptInvitationOutput {
            invitation,
            membership,
        })
    }

    /// Explains why the conditional update matched no row.
    async fn claim_failure(&self, token_hash: &str) -> WorkspaceError {
        let current = match self.invitation_repo.find_by_token_hash(token_hash).await {
            Ok(Some(invitation)) => invitation,
            Ok(None) => return WorkspaceError::InvitationNotFound,
            Err(e) => return e,
        };

        match current.state_at(Utc::now()) {
            InvitationState::Accepted => {
                WorkspaceError::InvitationNotAcceptable(NotAcceptableReason::AlreadyAccepted)
            }
            InvitationState::Expired => {
                WorkspaceError::InvitationNotAcceptable(NotAcceptableReason::Expired)
            }
            InvitationState::Pending => WorkspaceError::Internal("invitation claim failed".into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use chrono::{DateTime, Duration};

    use super::*;
    use crate::events::Listener;
    use crate::workspaces::{
        CreateInvitation, CreateMembership, MockWorkspaceInvitationRepository,
        MockWorkspaceMembershipRepository, WorkspaceRole,
    };

    async fn seed(
        invitations: &MockWorkspaceInvitationRepository,
        token: &str,
        role: WorkspaceRole,
        expires_at: DateTime<Utc>,
    ) -> WorkspaceInvitation {
        invitations
            .create(CreateInvitation {
                workspace_id: 1,
                email: "bob@example.com".to_owned(),
                role,
                token_hash: hash_token(token),
                invited_by: 1,
                expires_at,
            })
            .await
            .unwrap()
    }

    fn in_a_week() -> DateTime<Utc> {
        Utc::now() + Duration::days(7)
    }

    #[tokio::test]
    async fn test_accept_creates_membership_with_stored_role() {
        let memberships = MockWorkspaceMembershipRepository::new();
        let invitations = MockWorkspaceInvitationRepository::with_memberships(&memberships);
        seed(&invitations, "tok", WorkspaceRole::Manager, in_a_week()).await;

        let action = AcceptInvitationAction::new(invitations.clone(), memberships.clone());
        let output = action.execute(&SecretString::new("tok"), 2).await.unwrap();

        assert_eq!(output.membership.workspace_id, 1);
        assert_eq!(output.membership.user_id, 2);
        assert_eq!(output.membership.role, WorkspaceRole::Manager);
        assert!(output.invitation.accepted_at.is_some());
        assert_eq!(output.invitation.state(), InvitationState::Accepted);
        assert_eq!(memberships.len(), 1);
    }

    #[tokio::test]
    async fn test_accept_unknown_token() {
        let action = AcceptInvitationAction::new(
            MockWorkspaceInvitationRepository::new(),
            MockWorkspaceMembershipRepository::new(),
        );

        let err = action
            .execute(&SecretString::new("nope"), 2)
            .await
            .unwrap_err();
        assert_eq!(err, WorkspaceError::InvitationNotFound);
    }

    #[tokio::test]
    async fn test_accept_expired() {
        let memberships = MockWorkspaceMembershipRepository::new();
        let invitations = MockWorkspaceInvitationRepository::with_memberships(&memberships);
        seed(
            &invitations,
            "old",
            WorkspaceRole::Member,
            Utc::now() - Duration::days(1),
        )
        .await;

        let action = AcceptInvitationAction::new(invitations.clone(), memberships.clone());
        let err = action
            .execute(&SecretString::new("old"), 2)
            .await
            .unwrap_err();

        assert_eq!(
            err,
            WorkspaceError::InvitationNotAcceptable(NotAcceptableReason::Expired)
        );
        assert!(memberships.is_empty());
        let stored = invitations
            .find_by_token_hash(&hash_token("old"))
            .await
            .unwrap()
            .unwrap();
        assert!(stored.accepted_at.is_none());
    }

    #[tokio::test]
    async fn test_accept_twice() {
        let memberships = MockWorkspaceMembershipRepository::new();
        let invitations = MockWorkspaceInvitationRepository::with_memberships(&memberships);
        seed(&invitations, "tok", WorkspaceRole::Member, in_a_week()).await;

        let action = AcceptInvitationAction::new(invitations.clone(), memberships.clone());
        let first = action.execute(&SecretString::new("tok"), 2).await.unwrap();

        let err = action
            .execute(&SecretString::new("tok"), 3)
            .await
            .unwrap_err();
        assert_eq!(
            err,
            WorkspaceError::InvitationNotAcceptable(NotAcceptableReason::AlreadyAccepted)
        );

        let stored = invitations
            .find_by_token_hash(&hash_token("tok"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.accepted_at, first.invitation.accepted_at);
        assert_eq!(memberships.len(), 1);
    }

    #[tokio::test]
    async fn test_accept_already_member() {
        let memberships = MockWorkspaceMembershipRepository::new();
        let invitations = MockWorkspaceInvitationRepository::with_memberships(&memberships);
        seed(&invitations, "tok", WorkspaceRole::Member, in_a_week()).await;
        memberships
            .create(CreateMembership {
                workspace_id: 1,
                user_id: 2,
                role: WorkspaceRole::Client,
            })
            .await
            .unwrap();

        let action = AcceptInvitationAction::new(invitations.clone(), memberships.clone());
        let err = action
            .execute(&SecretString::new("tok"), 2)
            .await
            .unwrap_err();

        assert_eq!(err, WorkspaceError::AlreadyMember);
        // the invitation stays usable
        let stored = invitations
            .find_by_token_hash(&hash_token("tok"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.state(), InvitationState::Pending);
    }

    #[tokio::test]
    async fn test_failed_membership_insert_keeps_invitation_pending() {
        let memberships = MockWorkspaceMembershipRepository::new();
        let invitations = MockWorkspaceInvitationRepository::with_memberships(&memberships);
        seed(&invitations, "tok", WorkspaceRole::Client, in_a_week()).await;
        memberships.force_insert_failures(1);

        let action = AcceptInvitationAction::new(invitations.clone(), memberships.clone());
        let err = action
            .execute(&SecretString::new("tok"), 2)
            .await
            .unwrap_err();
        assert!(matches!(err, WorkspaceError::DatabaseError(_)));

        let stored = invitations
            .find_by_token_hash(&hash_token("tok"))
            .await
            .unwrap()
            .unwrap();
        assert!(stored.accepted_at.is_none());
        assert!(memberships.is_empty());

        let output = action.execute(&SecretString::new("tok"), 2).await.unwrap();
        assert_eq!(output.membership.role, WorkspaceRole::Client);
        assert_eq!(memberships.len(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_accepts_yield_one_membership() {
        let memberships = MockWorkspaceMembershipRepository::new();
        let invitations = MockWorkspaceInvitationRepository::with_memberships(&memberships);
        seed(&invitations, "race", WorkspaceRole::Member, in_a_week()).await;

        let a = AcceptInvitationAction::new(invitations.clone(), memberships.clone());
        let b = AcceptInvitationAction::new(invitations.clone(), memberships.clone());
        let token = SecretString::new("race");

        let (ra, rb) = tokio::join!(a.execute(&token, 2), b.execute(&token, 3));

        let results = [ra, rb];
        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        let err = results
            .iter()
            .find_map(|r| r.as_ref().err())
            .unwrap();
        assert_eq!(
            *err,
            WorkspaceError::InvitationNotAcceptable(NotAcceptableReason::AlreadyAccepted)
        );
        assert_eq!(memberships.len(), 1);
    }

    #[tokio::test]
    async fn test_accept_dispatches_event() {
        struct Counter(Arc<AtomicUsize>);

        #[async_trait]
        impl Listener for Counter {
            async fn handle(&self, event: &InvitationEvent) {
                if matches!(event, InvitationEvent::Accepted { user_id: 2, .. }) {
                    self.0.fetch_add(1, Ordering::SeqCst);
                }
            }
        }

        let invitations = MockWorkspaceInvitationRepository::new();
        seed(&invitations, "tok", WorkspaceRole::Member, in_a_week()).await;
        let count = Arc::new(AtomicUsize::new(0));

        let action =
            AcceptInvitationAction::new(invitations, MockWorkspaceMembershipRepository::new())
                .events(EventDispatcher::new().listen(Counter(count.clone())));
        action.execute(&SecretString::new("tok"), 2).await.unwrap();

        assert_eq!(count.load(Ordering::SeqCst), 1);
    }
}
