//! `SQLite` implementation of [`WorkspaceMembershipRepository`].

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, SqlitePool};

use super::is_unique_violation;
use crate::WorkspaceError;
use crate::workspaces::{CreateMembership, WorkspaceMembership, WorkspaceMembershipRepository};

#[derive(Clone)]
pub struct SqliteWorkspaceMembershipRepository {
    pool: SqlitePool,
}

impl SqliteWorkspaceMembershipRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[derive(FromRow)]
pub(super) struct MembershipRecord {
    id: i64,
    workspace_id: i64,
    user_id: i64,
    role: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<MembershipRecord> for WorkspaceMembership {
    type Error = WorkspaceError;

    fn try_from(row: MembershipRecord) -> Result<Self, Self::Error> {
        Ok(WorkspaceMembership {
            id: row.id,
            workspace_id: row.workspace_id,
            user_id: row.user_id,
            role: row.role.parse()?,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[async_trait]
impl WorkspaceMembershipRepository for SqliteWorkspaceMembershipRepository {
    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self), err))]
    async fn create(&self, data: CreateMembership) -> Result<WorkspaceMembership, WorkspaceError> {
        let now = Utc::now();

        let row: MembershipRecord = sqlx::query_as(
            r"
            INSERT INTO workspace_memberships (workspace_id, user_id, role, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?)
            RETURNING id, workspace_id, user_id, role, created_at, updated_at
            ",
        )
        .bind(data.workspace_id)
        .bind(data.user_id)
        .bind(data.role.as_str())
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                return WorkspaceError::AlreadyMember;
            }
            log::error!(target: "tenancy", "msg=\"database error\", operation=\"create_membership\", error=\"{e}\"");
            WorkspaceError::DatabaseError(e.to_string())
        })?;

        row.try_into()
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self), err))]
    async fn find_by_workspace_and_user(
        &self,
        workspace_id: i64,
        user_id: i64,
    ) -> Result<Option<WorkspaceMembership>, WorkspaceError> {
        let row: Option<MembershipRecord> = sqlx::query_as(
            "SELECT id, workspace_id, user_id, role, created_at, updated_at FROM workspace_memberships WHERE workspace_id = ? AND user_id = ?",
        )
        .bind(workspace_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            log::error!(target: "tenancy", "msg=\"database error\", operation=\"find_membership_by_workspace_and_user\", error=\"{e}\"");
            WorkspaceError::DatabaseError(e.to_string())
        })?;

        row.map(TryInto::try_into).transpose()
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self), err))]
    async fn find_by_workspace(
        &self,
        workspace_id: i64,
    ) -> Result<Vec<WorkspaceMembership>, WorkspaceError> {
        let rows: Vec<MembershipRecord> = sqlx::query_as(
            "SELECT id, workspace_id, user_id, role, created_at, updated_at FROM workspace_memberships WHERE workspace_id = ? ORDER BY id ASC",
        )
        .bind(workspace_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            log::error!(target: "tenancy", "msg=\"database error\", operation=\"find_memberships_by_workspace\", error=\"{e}\"");
            WorkspaceError::DatabaseError(e.to_string())
        })?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self), err))]
    async fn find_by_user(&self, user_id: i64) -> Result<Vec<WorkspaceMembership>, WorkspaceError> {
        let rows: Vec<MembershipRecord> = sqlx::query_as(
            "SELECT id, workspace_id, user_id, role, created_at, updated_at FROM workspace_memberships WHERE user_id = ? ORDER BY id ASC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            log::error!(target: "tenancy", "msg=\"database error\", operation=\"find_memberships_by_user\", error=\"{e}\"");
            WorkspaceError::DatabaseError(e.to_string())
        })?;

        rows.into_iter().map(TryInto::try_into).collect()
    }
}
