mod accept;
mod issue;
mod list;
mod lookup;

pub use accept::{AcceptInvitationAction, AcceptInvitationOutput};
pub use issue::{IssueInvitationAction, IssueInvitationInput, IssueInvitationOutput};
pub use list::ListPendingInvitationsAction;
pub use lookup::{InvitationDetails, LookupInvitationAction};
