//! End-to-end tests for the invitation lifecycle.
//!
//! These tests use mock repositories - no database required.
//! Run with: `cargo test --features mocks --test e2e_invitations`

#![cfg(feature = "mocks")]
#![allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{Duration, Utc};
use tenancy::config::InvitationConfig;
use tenancy::crypto::hash_token;
use tenancy::events::{EventDispatcher, InvitationEvent, Listener};
use tenancy::mail::{MockMailTransport, MockMailer, QueuedMailer};
use tenancy::workspaces::{
    AcceptInvitationAction, CreateUser, CreateWorkspace, InvitationState, IssueInvitationAction,
    IssueInvitationInput, ListPendingInvitationsAction, LookupInvitationAction, MockUserRepository,
    MockWorkspaceInvitationRepository, MockWorkspaceMembershipRepository, MockWorkspaceRepository,
    User, UserRepository, Workspace, WorkspaceInvitationRepository,
    WorkspaceMembershipRepository, WorkspaceRepository, WorkspaceRole,
};
use tenancy::{NotAcceptableReason, SecretString, WorkspaceError};

struct World {
    workspaces: MockWorkspaceRepository,
    users: MockUserRepository,
    invitations: MockWorkspaceInvitationRepository,
    memberships: MockWorkspaceMembershipRepository,
    acme: Workspace,
    alice: User,
}

impl World {
    async fn new() -> Self {
        let workspaces = MockWorkspaceRepository::new();
        let users = MockUserRepository::new();

        let alice = users
            .create(CreateUser {
                name: "Alice".to_owned(),
                email: "alice@example.com".to_owned(),
            })
            .await
            .unwrap();
        let acme = workspaces
            .create(CreateWorkspace {
                name: "Acme".to_owned(),
                slug: "acme".to_owned(),
                description: Some("We build rockets.".to_owned()),
                owner_id: alice.id,
            })
            .await
            .unwrap();

        let memberships = MockWorkspaceMembershipRepository::new();

        Self {
            workspaces,
            users,
            invitations: MockWorkspaceInvitationRepository::with_memberships(&memberships),
            memberships,
            acme,
            alice,
        }
    }

    async fn sign_up(&self, name: &str, email: &str) -> User {
        self.users
            .create(CreateUser {
                name: name.to_owned(),
                email: email.to_owned(),
            })
            .await
            .unwrap()
    }

    fn issuer(
        &self,
        mailer: MockMailer,
    ) -> IssueInvitationAction<
        MockWorkspaceRepository,
        MockUserRepository,
        MockWorkspaceInvitationRepository,
        MockMailer,
    > {
        IssueInvitationAction::new(
            self.workspaces.clone(),
            self.users.clone(),
            self.invitations.clone(),
            mailer,
        )
    }

    fn acceptor(
        &self,
    ) -> AcceptInvitationAction<MockWorkspaceInvitationRepository, MockWorkspaceMembershipRepository>
    {
        AcceptInvitationAction::new(self.invitations.clone(), self.memberships.clone())
    }

    fn invite(&self, email: &str, role: WorkspaceRole) -> IssueInvitationInput {
        IssueInvitationInput {
            workspace_id: self.acme.id,
            invited_by: self.alice.id,
            email: email.to_owned(),
            role,
        }
    }
}

#[tokio::test]
async fn test_invite_then_accept() {
    let world = World::new().await;
    let mailer = MockMailer::new();

    let issued = world
        .issuer(mailer.clone())
        .execute(world.invite("bob@example.com", WorkspaceRole::Member))
        .await
        .unwrap();

    // the stored record never holds the plain token
    let stored = world
        .invitations
        .find_by_id(issued.invitation.id)
        .await
        .unwrap()
        .unwrap();
    assert_ne!(stored.token_hash, issued.token.expose_secret());
    assert_eq!(stored.token_hash, hash_token(issued.token.expose_secret()));
    assert_eq!(stored.state(), InvitationState::Pending);

    let queued = mailer.queued();
    assert_eq!(queued.len(), 1);
    let mail = &queued[0];
    assert_eq!(mail.to, "bob@example.com");
    assert!(mail.subject.contains("Acme"));
    assert!(mail.text_body.contains("Alice"));
    assert!(mail.text_body.contains("Member"));
    assert!(mail.text_body.contains("We build rockets."));
    assert!(mail.text_body.contains(issued.accept_url.expose_secret()));
    assert!(mail.html_body.contains(issued.accept_url.expose_secret()));

    let bob = world.sign_up("Bob", "bob@example.com").await;
    let accepted = world
        .acceptor()
        .execute(&issued.token, bob.id)
        .await
        .unwrap();

    assert_eq!(accepted.membership.workspace_id, world.acme.id);
    assert_eq!(accepted.membership.user_id, bob.id);
    assert_eq!(accepted.membership.role, WorkspaceRole::Member);
    assert_eq!(accepted.invitation.state(), InvitationState::Accepted);

    let members = world
        .memberships
        .find_by_workspace(world.acme.id)
        .await
        .unwrap();
    assert_eq!(members.len(), 1);

    // second use of the same link
    let err = world
        .acceptor()
        .execute(&issued.token, bob.id)
        .await
        .unwrap_err();
    assert_eq!(
        err,
        WorkspaceError::InvitationNotAcceptable(NotAcceptableReason::AlreadyAccepted)
    );
}

#[tokio::test]
async fn test_expired_invitation_cannot_be_accepted() {
    let world = World::new().await;
    let issued = world
        .issuer(MockMailer::new())
        .execute(world.invite("carol@example.com", WorkspaceRole::Client))
        .await
        .unwrap();
    world
        .invitations
        .set_expires_at(issued.invitation.id, Utc::now() - Duration::days(1))
        .unwrap();

    let carol = world.sign_up("Carol", "carol@example.com").await;
    let err = world
        .acceptor()
        .execute(&issued.token, carol.id)
        .await
        .unwrap_err();

    assert_eq!(
        err,
        WorkspaceError::InvitationNotAcceptable(NotAcceptableReason::Expired)
    );
    assert!(world.memberships.is_empty());

    let stored = world
        .invitations
        .find_by_id(issued.invitation.id)
        .await
        .unwrap()
        .unwrap();
    assert!(stored.accepted_at.is_none());
    assert_eq!(stored.state(), InvitationState::Expired);
}

#[tokio::test]
async fn test_unknown_and_tampered_tokens() {
    let world = World::new().await;
    let issued = world
        .issuer(MockMailer::new())
        .execute(world.invite("bob@example.com", WorkspaceRole::Member))
        .await
        .unwrap();

    let mut tampered = issued.token.expose_secret().to_owned();
    tampered.pop();
    tampered.push('#');

    for token in [SecretString::new(tampered), SecretString::new("")] {
        let err = world.acceptor().execute(&token, 7).await.unwrap_err();
        assert_eq!(err, WorkspaceError::InvitationNotFound);

        let err = LookupInvitationAction::new(world.workspaces.clone(), world.invitations.clone())
            .execute(&token)
            .await
            .unwrap_err();
        assert_eq!(err, WorkspaceError::InvitationNotFound);
    }
}

#[tokio::test]
async fn test_accept_does_not_require_matching_email() {
    let world = World::new().await;
    let issued = world
        .issuer(MockMailer::new())
        .execute(world.invite("bob@example.com", WorkspaceRole::Manager))
        .await
        .unwrap();

    let someone = world.sign_up("Dave", "dave@other.test").await;
    let accepted = world
        .acceptor()
        .execute(&issued.token, someone.id)
        .await
        .unwrap();
    assert_eq!(accepted.membership.user_id, someone.id);
    assert_eq!(accepted.membership.role, WorkspaceRole::Manager);
}

#[tokio::test]
async fn test_lookup_then_accept_reflects_state() {
    let world = World::new().await;
    let issued = world
        .issuer(MockMailer::new())
        .execute(world.invite("bob@example.com", WorkspaceRole::Member))
        .await
        .unwrap();
    let lookup = LookupInvitationAction::new(world.workspaces.clone(), world.invitations.clone());

    let before = lookup.execute(&issued.token).await.unwrap();
    assert_eq!(before.state, InvitationState::Pending);
    assert_eq!(before.workspace.name, "Acme");

    let bob = world.sign_up("Bob", "bob@example.com").await;
    world.acceptor().execute(&issued.token, bob.id).await.unwrap();

    let after = lookup.execute(&issued.token).await.unwrap();
    assert_eq!(after.state, InvitationState::Accepted);
}

#[tokio::test]
async fn test_pending_list_tracks_lifecycle() {
    let world = World::new().await;
    let issuer = world.issuer(MockMailer::new());

    let bob = issuer
        .execute(world.invite("bob@example.com", WorkspaceRole::Member))
        .await
        .unwrap();
    let carol = issuer
        .execute(world.invite("carol@example.com", WorkspaceRole::Client))
        .await
        .unwrap();
    issuer
        .execute(world.invite("dave@example.com", WorkspaceRole::Manager))
        .await
        .unwrap();

    world
        .invitations
        .set_expires_at(carol.invitation.id, Utc::now() - Duration::minutes(1))
        .unwrap();
    let bob_user = world.sign_up("Bob", "bob@example.com").await;
    world.acceptor().execute(&bob.token, bob_user.id).await.unwrap();

    let pending = ListPendingInvitationsAction::new(world.invitations.clone())
        .execute(world.acme.id)
        .await
        .unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].email, "dave@example.com");

    let by_email = world
        .invitations
        .find_pending_by_email("carol@example.com", Utc::now())
        .await
        .unwrap();
    assert!(by_email.is_empty());
}

#[tokio::test]
async fn test_reinvite_after_acceptance_rejected_as_member() {
    let world = World::new().await;
    let issuer = world.issuer(MockMailer::new());

    let first = issuer
        .execute(world.invite("bob@example.com", WorkspaceRole::Member))
        .await
        .unwrap();
    let bob = world.sign_up("Bob", "bob@example.com").await;
    world.acceptor().execute(&first.token, bob.id).await.unwrap();

    // a fresh invitation can be issued, but bob cannot join twice
    let second = issuer
        .execute(world.invite("bob@example.com", WorkspaceRole::Manager))
        .await
        .unwrap();
    let err = world
        .acceptor()
        .execute(&second.token, bob.id)
        .await
        .unwrap_err();
    assert_eq!(err, WorkspaceError::AlreadyMember);
    assert_eq!(world.memberships.len(), 1);
}

#[tokio::test]
async fn test_workspace_deletion_removes_invitations() {
    let world = World::new().await;
    let issued = world
        .issuer(MockMailer::new())
        .execute(world.invite("bob@example.com", WorkspaceRole::Member))
        .await
        .unwrap();

    world.workspaces.delete(world.acme.id).await.unwrap();
    world.invitations.cascade_workspace(world.acme.id).unwrap();

    assert!(world.invitations.is_empty());
    let err = world
        .acceptor()
        .execute(&issued.token, 9)
        .await
        .unwrap_err();
    assert_eq!(err, WorkspaceError::InvitationNotFound);
}

#[tokio::test]
async fn test_concurrent_acceptance_single_winner() {
    let world = World::new().await;
    let issued = world
        .issuer(MockMailer::new())
        .execute(world.invite("bob@example.com", WorkspaceRole::Member))
        .await
        .unwrap();
    let bob = world.sign_up("Bob", "bob@example.com").await;
    let eve = world.sign_up("Eve", "eve@example.com").await;

    let first = world.acceptor();
    let second = world.acceptor();
    let token = issued.token.clone();

    let (a, b) = tokio::join!(
        first.execute(&issued.token, bob.id),
        second.execute(&token, eve.id)
    );

    let winners = [a.is_ok(), b.is_ok()].iter().filter(|ok| **ok).count();
    assert_eq!(winners, 1);
    assert_eq!(world.memberships.len(), 1);
}

#[tokio::test]
async fn test_queued_mailer_delivers_in_background() {
    let world = World::new().await;
    let transport = MockMailTransport::new();
    let (mailer, worker) = QueuedMailer::spawn(transport.clone(), 8);

    let issued = IssueInvitationAction::with_config(
        world.workspaces.clone(),
        world.users.clone(),
        world.invitations.clone(),
        mailer,
        InvitationConfig {
            accept_url_base: "https://app.acme.test/invitations".to_owned(),
            ..Default::default()
        },
    )
    .execute(world.invite("bob@example.com", WorkspaceRole::Member))
    .await
    .unwrap();

    // the action owned the only mailer handle; the worker drains and stops
    worker.await.unwrap();

    let sent = transport.sent();
    assert_eq!(sent.len(), 1);
    assert!(sent[0]
        .text_body
        .contains(&format!("https://app.acme.test/invitations/{}", issued.token.expose_secret())));
}

#[tokio::test]
async fn test_events_emitted_for_issue_and_accept() {
    #[derive(Clone, Default)]
    struct Recorder(Arc<Mutex<Vec<&'static str>>>);

    #[async_trait]
    impl Listener for Recorder {
        async fn handle(&self, event: &InvitationEvent) {
            self.0.lock().unwrap().push(event.name());
        }
    }

    let world = World::new().await;
    let recorder = Recorder::default();
    let events = EventDispatcher::new().listen(recorder.clone());

    let issued = world
        .issuer(MockMailer::new())
        .events(events.clone())
        .execute(world.invite("bob@example.com", WorkspaceRole::Member))
        .await
        .unwrap();
    let bob = world.sign_up("Bob", "bob@example.com").await;
    world
        .acceptor()
        .events(events)
        .execute(&issued.token, bob.id)
        .await
        .unwrap();

    assert_eq!(
        *recorder.0.lock().unwrap(),
        vec!["invitation.issued", "invitation.accepted"]
    );
}

#[tokio::test]
async fn test_failed_membership_insert_does_not_consume_invitation() {
    let world = World::new().await;
    let issued = world
        .issuer(MockMailer::new())
        .execute(world.invite("bob@example.com", WorkspaceRole::Manager))
        .await
        .unwrap();
    let bob = world.sign_up("Bob", "bob@example.com").await;

    world.memberships.force_insert_failures(1);
    let err = world
        .acceptor()
        .execute(&issued.token, bob.id)
        .await
        .unwrap_err();
    assert!(matches!(err, WorkspaceError::DatabaseError(_)));

    let stored = world
        .invitations
        .find_by_id(issued.invitation.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.state(), InvitationState::Pending);
    assert!(world.memberships.is_empty());

    // the same token works once the store recovers
    let accepted = world
        .acceptor()
        .execute(&issued.token, bob.id)
        .await
        .unwrap();
    assert_eq!(accepted.membership.role, WorkspaceRole::Manager);
    assert_eq!(
        world
            .memberships
            .find_by_workspace(world.acme.id)
            .await
            .unwrap()
            .len(),
        1
    );
}
