//! `SQLite` implementation of [`UserRepository`].

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, SqlitePool};

use super::is_unique_violation;
use crate::WorkspaceError;
use crate::workspaces::{CreateUser, User, UserRepository};

#[derive(Clone)]
pub struct SqliteUserRepository {
    pool: SqlitePool,
}

impl SqliteUserRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[derive(FromRow)]
struct UserRecord {
    id: i64,
    name: String,
    email: String,
    created_at: DateTime<Utc>,
}

impl From<UserRecord> for User {
    fn from(row: UserRecord) -> Self {
        User {
            id: row.id,
            name: row.name,
            email: row.email,
            created_at: row.created_at,
        }
    }
}

#[async_trait]
impl UserRepository for SqliteUserRepository {
    #[cfg_attr(feature = "tracing", tracing::instrument(skip_all, err))]
    async fn create(&self, data: CreateUser) -> Result<User, WorkspaceError> {
        let row: UserRecord = sqlx::query_as(
            r"
            INSERT INTO users (name, email, created_at)
            VALUES (?, ?, ?)
            RETURNING id, name, email, created_at
            ",
        )
        .bind(&data.name)
        .bind(&data.email)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                return WorkspaceError::Validation("email is already registered".to_owned());
            }
            log::error!(target: "tenancy", "msg=\"database error\", operation=\"create_user\", error=\"{e}\"");
            WorkspaceError::DatabaseError(e.to_string())
        })?;

        Ok(row.into())
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self), err))]
    async fn find_by_id(&self, id: i64) -> Result<Option<User>, WorkspaceError> {
        let row: Option<UserRecord> =
            sqlx::query_as("SELECT id, name, email, created_at FROM users WHERE id = ?")
                .bind(id)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| {
                    log::error!(target: "tenancy", "msg=\"database error\", operation=\"find_user_by_id\", error=\"{e}\"");
                    WorkspaceError::DatabaseError(e.to_string())
                })?;

        Ok(row.map(Into::into))
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self), err))]
    async fn delete(&self, id: i64) -> Result<(), WorkspaceError> {
        sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                log::error!(target: "tenancy", "msg=\"database error\", operation=\"delete_user\", error=\"{e}\"");
                WorkspaceError::DatabaseError(e.to_string())
            })?;

        Ok(())
    }
}
