use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;

use super::error::AppError;
use super::middleware::AuthenticatedUser;
use super::routes::InvitationsState;
use crate::{SecretString, WorkspaceError};
use crate::api::{
    AcceptInvitationResponse, CreateInvitationRequest, InvitationDetailsResponse,
    InvitationResponse, SessionResolver,
};
use crate::mail::Mailer;
use crate::workspaces::{
    AcceptInvitationAction, IssueInvitationAction, IssueInvitationInput,
    ListPendingInvitationsAction, LookupInvitationAction, UserRepository,
    WorkspaceInvitationRepository, WorkspaceMembershipRepository, WorkspaceRepository,
};

pub async fn issue_invitation<W, U, I, M, ML, S>(
    State(state): State<InvitationsState<W, U, I, M, ML, S>>,
    user: AuthenticatedUser,
    Path(workspace_id): Path<i64>,
    Json(body): Json<CreateInvitationRequest>,
) -> Result<(StatusCode, Json<InvitationResponse>), AppError>
where
    W: WorkspaceRepository + Clone + Send + Sync + 'static,
    U: UserRepository + Clone + Send + Sync + 'static,
    I: WorkspaceInvitationRepository + Clone + Send + Sync + 'static,
    M: Clone + Send + Sync + 'static,
    ML: Mailer + Clone + Send + Sync + 'static,
    S: SessionResolver + Clone + Send + Sync + 'static,
{
    let role = body.role()?;

    let action = IssueInvitationAction::with_config(
        state.workspace_repo,
        state.user_repo,
        state.invitation_repo,
        state.mailer,
        state.config,
    )
    .renderer(state.renderer)
    .events(state.events);

    let output = action
        .execute(IssueInvitationInput {
            workspace_id,
            invited_by: user.user().id,
            email: body.email,
            role,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(output.invitation.into())))
}

/// Lists pending invitations, invitee emails included. Only authentication is
/// checked here; see [`workspace_invitation_routes`](super::workspace_invitation_routes).
pub async fn list_invitations<W, U, I, M, ML, S>(
    State(state): State<InvitationsState<W, U, I, M, ML, S>>,
    _user: AuthenticatedUser,
    Path(workspace_id): Path<i64>,
) -> Result<Json<Vec<InvitationResponse>>, AppError>
where
    W: WorkspaceRepository + Clone + Send + Sync + 'static,
    U: Clone + Send + Sync + 'static,
    I: WorkspaceInvitationRepository + Clone + Send + Sync + 'static,
    M: Clone + Send + Sync + 'static,
    ML: Clone + Send + Sync + 'static,
    S: SessionResolver + Clone + Send + Sync + 'static,
{
    state
        .workspace_repo
        .find_by_id(workspace_id)
        .await?
        .ok_or(WorkspaceError::NotFound)?;

    let invitations = ListPendingInvitationsAction::new(state.invitation_repo)
        .execute(workspace_id)
        .await?;

    Ok(Json(invitations.into_iter().map(Into::into).collect()))
}

pub async fn show_invitation<W, U, I, M, ML, S>(
    State(state): State<InvitationsState<W, U, I, M, ML, S>>,
    Path(token): Path<String>,
) -> Result<Json<InvitationDetailsResponse>, AppError>
where
    W: WorkspaceRepository + Clone + Send + Sync + 'static,
    U: Clone + Send + Sync + 'static,
    I: WorkspaceInvitationRepository + Clone + Send + Sync + 'static,
    M: Clone + Send + Sync + 'static,
    ML: Clone + Send + Sync + 'static,
    S: Clone + Send + Sync + 'static,
{
    let details = LookupInvitationAction::new(state.workspace_repo, state.invitation_repo)
        .execute(&SecretString::new(token))
        .await?;

    Ok(Json(details.into()))
}

pub async fn accept_invitation<W, U, I, M, ML, S>(
    State(state): State<InvitationsState<W, U, I, M, ML, S>>,
    user: AuthenticatedUser,
    Path(token): Path<String>,
) -> Result<Json<AcceptInvitationResponse>, AppError>
where
    W: Clone + Send + Sync + 'static,
    U: Clone + Send + Sync + 'static,
    I: WorkspaceInvitationRepository + Clone + Send + Sync + 'static,
    M: WorkspaceMembershipRepository + Clone + Send + Sync + 'static,
    ML: Clone + Send + Sync + 'static,
    S: SessionResolver + Clone + Send + Sync + 'static,
{
    let output = AcceptInvitationAction::new(state.invitation_repo, state.membership_repo)
        .events(state.events)
        .execute(&SecretString::new(token), user.user().id)
        .await?;

    Ok(Json(output.into()))
}
