//! Embedded database migrations for `SQLite`.
//!
//! # Example
//!
//! ```rust,ignore
//! use sqlx::SqlitePool;
//! use tenancy::sqlite::migrations;
//!
//! async fn setup_database(pool: &SqlitePool) -> Result<(), sqlx::Error> {
//!     migrations::run(pool).await?;
//!     Ok(())
//! }
//! ```

use sqlx::{Executor, SqlitePool};

const MIGRATIONS: &[(&str, &str)] = &[
    (
        "20260101000001_create_users_table",
        include_str!("../../migrations_sqlite/20260101000001_create_users_table.sql"),
    ),
    (
        "20260101000002_create_workspaces_table",
        include_str!("../../migrations_sqlite/20260101000002_create_workspaces_table.sql"),
    ),
    (
        "20260101000003_create_workspace_memberships_table",
        include_str!(
            "../../migrations_sqlite/20260101000003_create_workspace_memberships_table.sql"
        ),
    ),
    (
        "20260101000004_create_workspace_invitations_table",
        include_str!(
            "../../migrations_sqlite/20260101000004_create_workspace_invitations_table.sql"
        ),
    ),
];

/// Runs every pending migration, in order, recording each in
/// `_tenancy_migrations`. Safe to call on every startup.
pub async fn run(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    pool.execute(
        r"
        CREATE TABLE IF NOT EXISTS _tenancy_migrations (
            name TEXT PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
        )
        ",
    )
    .await?;

    for (name, sql) in MIGRATIONS {
        let applied: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM _tenancy_migrations WHERE name = ?)")
                .bind(*name)
                .fetch_one(pool)
                .await?;

        if applied {
            continue;
        }

        // one statement per execute; bundled migrations keep ';' out of literals
        for statement in sql.split(';') {
            let trimmed = statement.trim();
            if !trimmed.is_empty() {
                pool.execute(trimmed).await?;
            }
        }

        sqlx::query("INSERT INTO _tenancy_migrations (name) VALUES (?)")
            .bind(*name)
            .execute(pool)
            .await?;

        log::info!(target: "tenancy", "msg=\"migration applied\", name=\"{name}\"");
    }

    Ok(())
}
