use chrono::{DateTime, Utc};

use crate::workspaces::WorkspaceRole;

/// Events emitted by the invitation actions.
#[derive(Debug, Clone, PartialEq)]
pub enum InvitationEvent {
    Issued {
        invitation_id: i64,
        workspace_id: i64,
        email: String,
        role: WorkspaceRole,
        invited_by: i64,
        at: DateTime<Utc>,
    },
    Accepted {
        invitation_id: i64,
        workspace_id: i64,
        user_id: i64,
        membership_id: i64,
        at: DateTime<Utc>,
    },
}

impl InvitationEvent {
    /// Dot-separated event name for logging/tracing.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Issued { .. } => "invitation.issued",
            Self::Accepted { .. } => "invitation.accepted",
        }
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            Self::Issued { at, .. } | Self::Accepted { at, .. } => *at,
        }
    }

    pub fn workspace_id(&self) -> i64 {
        match self {
            Self::Issued { workspace_id, .. } | Self::Accepted { workspace_id, .. } => *workspace_id,
        }
    }
}
