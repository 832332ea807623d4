//! The closed set of roles an invitation can grant.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::WorkspaceError;

/// Role assigned to a member of a workspace.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkspaceRole {
    Manager,
    #[default]
    Member,
    Client,
}

impl WorkspaceRole {
    pub const ALL: [Self; 3] = [Self::Manager, Self::Member, Self::Client];

    /// Storage representation.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Manager => "manager",
            Self::Member => "member",
            Self::Client => "client",
        }
    }

    /// Human-readable name used in notifications.
    pub fn label(self) -> &'static str {
        match self {
            Self::Manager => "Manager",
            Self::Member => "Member",
            Self::Client => "Client",
        }
    }
}

impl FromStr for WorkspaceRole {
    type Err = WorkspaceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "manager" => Ok(Self::Manager),
            "member" => Ok(Self::Member),
            "client" => Ok(Self::Client),
            other => Err(WorkspaceError::InvalidRole(other.to_owned())),
        }
    }
}

impl fmt::Display for WorkspaceRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
