//! Invitation acceptance state, derived from timestamps.
//!
//! Nothing persists the state itself. `Pending -> Expired` happens by the clock
//! passing `expires_at`, so the state is recomputed from
//! `(accepted_at, expires_at, now)` every time it is needed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{NotAcceptableReason, WorkspaceError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvitationState {
    /// Not accepted and `now < expires_at`.
    Pending,
    /// Not accepted and `now >= expires_at`.
    Expired,
    /// `accepted_at` is set. Wins over expiry.
    Accepted,
}

impl InvitationState {
    pub fn evaluate(
        accepted_at: Option<DateTime<Utc>>,
        expires_at: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Self {
        if accepted_at.is_some() {
            Self::Accepted
        } else if now >= expires_at {
            Self::Expired
        } else {
            Self::Pending
        }
    }

    pub fn is_acceptable(self) -> bool {
        self == Self::Pending
    }

    /// Maps a terminal state to the matching acceptance error.
    pub fn ensure_acceptable(self) -> Result<(), WorkspaceError> {
        match self {
            Self::Pending => Ok(()),
            Self::Expired => Err(WorkspaceError::InvitationNotAcceptable(
                NotAcceptableReason::Expired,
            )),
            Self::Accepted => Err(WorkspaceError::InvitationNotAcceptable(
                NotAcceptableReason::AlreadyAccepted,
            )),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Expired => "expired",
            Self::Accepted => "accepted",
        }
    }
}
