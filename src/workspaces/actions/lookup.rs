use chrono::Utc;
use serde::Serialize;

use crate::crypto::hash_token;
use crate::workspaces::{
    InvitationState, Workspace, WorkspaceInvitation, WorkspaceInvitationRepository,
    WorkspaceRepository,
};
use crate::{SecretString, WorkspaceError};

/// What the acceptance page shows for a token.
#[derive(Debug, Clone, Serialize)]
pub struct InvitationDetails {
    pub invitation: WorkspaceInvitation,
    pub workspace: Workspace,
    /// State at the time of the lookup.
    pub state: InvitationState,
}

/// Resolves a plain token to its invitation and workspace without changing
/// anything. Expired and accepted invitations are still returned so the caller
/// can explain why they cannot be used.
pub struct LookupInvitationAction<W, I>
where
    W: WorkspaceRepository,
    I: WorkspaceInvitationRepository,
{
    workspace_repo: W,
    invitation_repo: I,
}

impl<W, I> LookupInvitationAction<W, I>
where
    W: WorkspaceRepository,
    I: WorkspaceInvitationRepository,
{
    pub fn new(workspace_repo: W, invitation_repo: I) -> Self {
        Self {
            workspace_repo,
            invitation_repo,
        }
    }

    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "lookup_invitation", skip_all, err)
    )]
    pub async fn execute(&self, token: &SecretString) -> Result<InvitationDetails, WorkspaceError> {
        let invitation = self
            .invitation_repo
            .find_by_token_hash(&hash_token(token.expose_secret()))
            .await?
            .ok_or(WorkspaceError::InvitationNotFound)?;

        let workspace = self
            .workspace_repo
            .find_by_id(invitation.workspace_id)
            .await?
            .ok_or(WorkspaceError::NotFound)?;

        let state = invitation.state_at(Utc::now());

        Ok(InvitationDetails {
            invitation,
            workspace,
            state,
        })
    }
}
