use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::workspaces::{
    AcceptInvitationOutput, InvitationDetails, InvitationState, Workspace, WorkspaceInvitation,
    WorkspaceMembership, WorkspaceRole,
};
use crate::{NotAcceptableReason, WorkspaceError};

// Request DTOs

#[derive(Debug, Deserialize)]
pub struct CreateInvitationRequest {
    pub email: String,
    /// One of `manager`, `member`, `client`. Defaults to `member`.
    #[serde(default)]
    pub role: Option<String>,
}

impl CreateInvitationRequest {
    pub fn role(&self) -> Result<WorkspaceRole, WorkspaceError> {
        self.role
            .as_deref()
            .map(str::parse::<WorkspaceRole>)
            .transpose()
            .map(Option::unwrap_or_default)
    }
}

// Response DTOs

/// An invitation as exposed over HTTP. Neither the token nor its hash is ever
/// included.
#[derive(Debug, Serialize)]
pub struct InvitationResponse {
    pub id: i64,
    pub workspace_id: i64,
    pub email: String,
    pub role: WorkspaceRole,
    pub invited_by: i64,
    pub state: InvitationState,
    pub expires_at: DateTime<Utc>,
    pub accepted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<WorkspaceInvitation> for InvitationResponse {
    fn from(invitation: WorkspaceInvitation) -> Self {
        Self {
            state: invitation.state(),
            id: invitation.id,
            workspace_id: invitation.workspace_id,
            email: invitation.email,
            role: invitation.role,
            invited_by: invitation.invited_by,
            expires_at: invitation.expires_at,
            accepted_at: invitation.accepted_at,
            created_at: invitation.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct WorkspaceResponse {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
}

impl From<Workspace> for WorkspaceResponse {
    fn from(workspace: Workspace) -> Self {
        Self {
            id: workspace.id,
            name: workspace.name,
            slug: workspace.slug,
            description: workspace.description,
        }
    }
}

/// Body of `GET /invitations/{token}`.
#[derive(Debug, Serialize)]
pub struct InvitationDetailsResponse {
    pub workspace: WorkspaceResponse,
    pub email: String,
    pub role: WorkspaceRole,
    pub state: InvitationState,
    pub expires_at: DateTime<Utc>,
}

impl From<InvitationDetails> for InvitationDetailsResponse {
    fn from(details: InvitationDetails) -> Self {
        Self {
            workspace: details.workspace.into(),
            email: details.invitation.email,
            role: details.invitation.role,
            state: details.state,
            expires_at: details.invitation.expires_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MembershipResponse {
    pub id: i64,
    pub workspace_id: i64,
    pub user_id: i64,
    pub role: WorkspaceRole,
    pub created_at: DateTime<Utc>,
}

impl From<WorkspaceMembership> for MembershipResponse {
    fn from(membership: WorkspaceMembership) -> Self {
        Self {
            id: membership.id,
            workspace_id: membership.workspace_id,
            user_id: membership.user_id,
            role: membership.role,
            created_at: membership.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AcceptInvitationResponse {
    pub membership: MembershipResponse,
    pub invitation: InvitationResponse,
}

impl From<AcceptInvitationOutput> for AcceptInvitationResponse {
    fn from(output: AcceptInvitationOutput) -> Self {
        Self {
            membership: output.membership.into(),
            invitation: output.invitation.into(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<NotAcceptableReason>,
}

impl From<WorkspaceError> for ErrorResponse {
    fn from(err: WorkspaceError) -> Self {
        let reason = match &err {
            WorkspaceError::InvitationNotAcceptable(reason) => Some(*reason),
            _ => None,
        };

        Self {
            error: err.to_string(),
            code: err.code().to_owned(),
            reason,
        }
    }
}
