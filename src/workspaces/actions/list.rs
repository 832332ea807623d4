use chrono::Utc;

use crate::WorkspaceError;
use crate::workspaces::{WorkspaceInvitation, WorkspaceInvitationRepository};

/// Lists the invitations of a workspace that can still be accepted, newest
/// first.
pub struct ListPendingInvitationsAction<I: WorkspaceInvitationRepository> {
    invitation_repo: I,
}

impl<I: WorkspaceInvitationRepository> ListPendingInvitationsAction<I> {
    pub fn new(invitation_repo: I) -> Self {
        Self { invitation_repo }
    }

    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "list_pending_invitations", skip_all, err)
    )]
    pub async fn execute(
        &self,
        workspace_id: i64,
    ) -> Result<Vec<WorkspaceInvitation>, WorkspaceError> {
        self.invitation_repo
            .find_pending_by_workspace(workspace_id, Utc::now())
            .await
    }
}
