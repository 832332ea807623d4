//! `SQLite` implementation of [`WorkspaceRepository`].

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, SqlitePool};

use super::is_unique_violation;
use crate::WorkspaceError;
use crate::workspaces::{CreateWorkspace, Workspace, WorkspaceRepository};

#[derive(Clone)]
pub struct SqliteWorkspaceRepository {
    pool: SqlitePool,
}

impl SqliteWorkspaceRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[derive(FromRow)]
struct WorkspaceRecord {
    id: i64,
    name: String,
    slug: String,
    description: Option<String>,
    owner_id: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<WorkspaceRecord> for Workspace {
    fn from(row: WorkspaceRecord) -> Self {
        Workspace {
            id: row.id,
            name: row.name,
            slug: row.slug,
            description: row.description,
            owner_id: row.owner_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[async_trait]
impl WorkspaceRepository for SqliteWorkspaceRepository {
    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self), err))]
    async fn create(&self, data: CreateWorkspace) -> Result<Workspace, WorkspaceError> {
        let now = Utc::now();

        let row: WorkspaceRecord = sqlx::query_as(
            r"
            INSERT INTO workspaces (name, slug, description, owner_id, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            RETURNING id, name, slug, description, owner_id, created_at, updated_at
            ",
        )
        .bind(&data.name)
        .bind(&data.slug)
        .bind(&data.description)
        .bind(data.owner_id)
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                return WorkspaceError::Validation(format!("slug '{}' is taken", data.slug));
            }
            log::error!(target: "tenancy", "msg=\"database error\", operation=\"create_workspace\", error=\"{e}\"");
            WorkspaceError::DatabaseError(e.to_string())
        })?;

        Ok(row.into())
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self), err))]
    async fn find_by_id(&self, id: i64) -> Result<Option<Workspace>, WorkspaceError> {
        let row: Option<WorkspaceRecord> = sqlx::query_as(
            "SELECT id, name, slug, description, owner_id, created_at, updated_at FROM workspaces WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            log::error!(target: "tenancy", "msg=\"database error\", operation=\"find_workspace_by_id\", error=\"{e}\"");
            WorkspaceError::DatabaseError(e.to_string())
        })?;

        Ok(row.map(Into::into))
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self), err))]
    async fn find_by_owner(&self, owner_id: i64) -> Result<Vec<Workspace>, WorkspaceError> {
        let rows: Vec<WorkspaceRecord> = sqlx::query_as(
            "SELECT id, name, slug, description, owner_id, created_at, updated_at FROM workspaces WHERE owner_id = ? ORDER BY id ASC",
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            log::error!(target: "tenancy", "msg=\"database error\", operation=\"find_workspaces_by_owner\", error=\"{e}\"");
            WorkspaceError::DatabaseError(e.to_string())
        })?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self), err))]
    async fn delete(&self, id: i64) -> Result<(), WorkspaceError> {
        sqlx::query("DELETE FROM workspaces WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                log::error!(target: "tenancy", "msg=\"database error\", operation=\"delete_workspace\", error=\"{e}\"");
                WorkspaceError::DatabaseError(e.to_string())
            })?;

        Ok(())
    }
}
