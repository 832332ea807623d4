//! `SQLite` implementations of the workspace repositories.
//!
//! Run [`migrations::run`] once against the pool before using them.

pub mod migrations;
mod invitation;
mod membership;
mod user;
mod workspace;

pub use invitation::SqliteWorkspaceInvitationRepository;
pub use membership::SqliteWorkspaceMembershipRepository;
use sqlx::SqlitePool;
pub use user::SqliteUserRepository;
pub use workspace::SqliteWorkspaceRepository;

/// Creates every `SQLite` repository over one connection pool.
pub fn create_repositories(
    pool: SqlitePool,
) -> (
    SqliteWorkspaceRepository,
    SqliteUserRepository,
    SqliteWorkspaceMembershipRepository,
    SqliteWorkspaceInvitationRepository,
) {
    (
        SqliteWorkspaceRepository::new(pool.clone()),
        SqliteUserRepository::new(pool.clone()),
        SqliteWorkspaceMembershipRepository::new(pool.clone()),
        SqliteWorkspaceInvitationRepository::new(pool),
    )
}

fn is_unique_violation(e: &sqlx::Error) -> bool {
    e.as_database_error()
        .is_some_and(|d| d.is_unique_violation())
}
