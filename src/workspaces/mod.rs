//! Workspaces, memberships and the invitation lifecycle.
//!
//! An invitation is issued for an email address with a role, delivered as a
//! link containing a random token, and accepted by presenting that token. Only
//! the SHA-256 digest of the token is stored.
//!
//! ```text
//! Pending --(accept before expires_at)--> Accepted
//! Pending --(clock passes expires_at)---> Expired
//! ```

mod actions;
#[cfg(any(test, feature = "mocks"))]
mod mocks;
mod repository;
mod role;
mod state;
mod types;

pub use actions::{
    AcceptInvitationAction, AcceptInvitationOutput, InvitationDetails, IssueInvitationAction,
    IssueInvitationInput, IssueInvitationOutput, ListPendingInvitationsAction,
    LookupInvitationAction,
};
#[cfg(any(test, feature = "mocks"))]
pub use mocks::{
    MockUserRepository, MockWorkspaceInvitationRepository, MockWorkspaceMembershipRepository,
    MockWorkspaceRepository,
};
pub use repository::{
    CreateInvitation, CreateMembership, CreateUser, CreateWorkspace, UserRepository,
    WorkspaceInvitationRepository, WorkspaceMembershipRepository, WorkspaceRepository,
};
pub use role::WorkspaceRole;
pub use state::InvitationState;
pub use types::{User, Workspace, WorkspaceInvitation, WorkspaceMembership};
