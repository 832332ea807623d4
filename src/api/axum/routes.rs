//! Route configuration for the invitation endpoints.

use axum::Router;
use axum::routing::{get, post};

use super::handlers;
use crate::api::SessionResolver;
use crate::config::InvitationConfig;
use crate::events::EventDispatcher;
use crate::mail::{InvitationMail, Mailer};
use crate::workspaces::{
    UserRepository, WorkspaceInvitationRepository, WorkspaceMembershipRepository,
    WorkspaceRepository,
};

/// Application state shared by the invitation handlers.
#[derive(Clone)]
pub struct InvitationsState<W, U, I, M, ML, S> {
    pub workspace_repo: W,
    pub user_repo: U,
    pub invitation_repo: I,
    pub membership_repo: M,
    /// Queue for invitation emails.
    pub mailer: ML,
    /// Resolves bearer tokens to users.
    pub sessions: S,
    pub config: InvitationConfig,
    pub renderer: InvitationMail,
    pub events: EventDispatcher,
}

impl<W, U, I, M, ML, S> InvitationsState<W, U, I, M, ML, S> {
    /// State with default invitation config, renderer and no listeners.
    pub fn new(
        workspace_repo: W,
        user_repo: U,
        invitation_repo: I,
        membership_repo: M,
        mailer: ML,
        sessions: S,
    ) -> Self {
        Self {
            workspace_repo,
            user_repo,
            invitation_repo,
            membership_repo,
            mailer,
            sessions,
            config: InvitationConfig::default(),
            renderer: InvitationMail::default(),
            events: EventDispatcher::default(),
        }
    }

    #[must_use]
    pub fn with_config(mut self, config: InvitationConfig) -> Self {
        self.config = config;
        self
    }

    #[must_use]
    pub fn with_renderer(mut self, renderer: InvitationMail) -> Self {
        self.renderer = renderer;
        self
    }

    #[must_use]
    pub fn with_events(mut self, events: EventDispatcher) -> Self {
        self.events = events;
        self
    }
}

/// Invitation management routes, mounted under `/workspaces`.
///
/// Both routes require a bearer token, but any signed-in user is accepted: no
/// workspace role is checked. The pending list exposes every invitee email of
/// the workspace, so the host application must gate these routes (for example
/// with a layer that checks the caller manages workspace `{id}`) before
/// mounting them.
///
/// # Routes
/// - `POST /{id}/invitations` - Issue an invitation
/// - `GET /{id}/invitations` - List pending invitations
pub fn workspace_invitation_routes<W, U, I, M, ML, S>() -> Router<InvitationsState<W, U, I, M, ML, S>>
where
    W: WorkspaceRepository + Clone + Send + Sync + 'static,
    U: UserRepository + Clone + Send + Sync + 'static,
    I: WorkspaceInvitationRepository + Clone + Send + Sync + 'static,
    M: WorkspaceMembershipRepository + Clone + Send + Sync + 'static,
    ML: Mailer + Clone + Send + Sync + 'static,
    S: SessionResolver + Clone + Send + Sync + 'static,
{
    Router::new().route(
        "/{id}/invitations",
        post(handlers::issue_invitation::<W, U, I, M, ML, S>)
            .get(handlers::list_invitations::<W, U, I, M, ML, S>),
    )
}

/// Token routes, mounted under `/invitations`.
///
/// # Routes
/// - `GET /{token}` - Show the invitation behind a token (no authentication)
/// - `POST /{token}/accept` - Accept as the signed-in user
pub fn invitation_routes<W, U, I, M, ML, S>() -> Router<InvitationsState<W, U, I, M, ML, S>>
where
    W: WorkspaceRepository + Clone + Send + Sync + 'static,
    U: UserRepository + Clone + Send + Sync + 'static,
    I: WorkspaceInvitationRepository + Clone + Send + Sync + 'static,
    M: WorkspaceMembershipRepository + Clone + Send + Sync + 'static,
    ML: Mailer + Clone + Send + Sync + 'static,
    S: SessionResolver + Clone + Send + Sync + 'static,
{
    Router::new()
        .route(
            "/{token}",
            get(handlers::show_invitation::<W, U, I, M, ML, S>),
        )
        .route(
            "/{token}/accept",
            post(handlers::accept_invitation::<W, U, I, M, ML, S>),
        )
}
