//! `SQLite` implementation of [`WorkspaceInvitationRepository`].

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, SqlitePool};

use super::is_unique_violation;
use super::membership::MembershipRecord;
use crate::WorkspaceError;
use crate::workspaces::{
    CreateInvitation, WorkspaceInvitation, WorkspaceInvitationRepository, WorkspaceMembership,
};

const COLUMNS: &str = "id, workspace_id, email, role, token_hash, invited_by, expires_at, accepted_at, created_at, updated_at";

#[derive(Clone)]
pub struct SqliteWorkspaceInvitationRepository {
    pool: SqlitePool,
}

impl SqliteWorkspaceInvitationRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[derive(FromRow)]
struct InvitationRecord {
    id: i64,
    workspace_id: i64,
    email: String,
    role: String,
    token_hash: String,
    invited_by: i64,
    expires_at: DateTime<Utc>,
    accepted_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<InvitationRecord> for WorkspaceInvitation {
    type Error = WorkspaceError;

    fn try_from(row: InvitationRecord) -> Result<Self, Self::Error> {
        Ok(WorkspaceInvitation {
            id: row.id,
            workspace_id: row.workspace_id,
            email: row.email,
            role: row.role.parse()?,
            token_hash: row.token_hash,
            invited_by: row.invited_by,
            expires_at: row.expires_at,
            accepted_at: row.accepted_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

fn db_error(operation: &'static str) -> impl FnOnce(sqlx::Error) -> WorkspaceError {
    move |e| {
        log::error!(target: "tenancy", "msg=\"database error\", operation=\"{operation}\", error=\"{e}\"");
        WorkspaceError::DatabaseError(e.to_string())
    }
}

#[async_trait]
impl WorkspaceInvitationRepository for SqliteWorkspaceInvitationRepository {
    #[cfg_attr(feature = "tracing", tracing::instrument(skip_all, err))]
    async fn create(&self, data: CreateInvitation) -> Result<WorkspaceInvitation, WorkspaceError> {
        let now = Utc::now();

        // one statement, so a concurrent issue for the same address sees this row
        let row: Option<InvitationRecord> = sqlx::query_as(&format!(
            r"
            INSERT INTO workspace_invitations
                (workspace_id, email, role, token_hash, invited_by, expires_at, created_at, updated_at)
            SELECT ?, ?, ?, ?, ?, ?, ?, ?
            WHERE NOT EXISTS (
                SELECT 1 FROM workspace_invitations
                WHERE workspace_id = ? AND email = ? AND accepted_at IS NULL AND expires_at > ?
            )
            RETURNING {COLUMNS}
            "
        ))
        .bind(data.workspace_id)
        .bind(&data.email)
        .bind(data.role.as_str())
        .bind(&data.token_hash)
        .bind(data.invited_by)
        .bind(data.expires_at)
        .bind(now)
        .bind(now)
        .bind(data.workspace_id)
        .bind(&data.email)
        .bind(now)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                return WorkspaceError::DuplicateToken;
            }
            db_error("create_invitation")(e)
        })?;

        row.ok_or(WorkspaceError::AlreadyInvited)?.try_into()
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self), err))]
    async fn find_by_id(&self, id: i64) -> Result<Option<WorkspaceInvitation>, WorkspaceError> {
        let row: Option<InvitationRecord> = sqlx::query_as(&format!(
            "SELECT {COLUMNS} FROM workspace_invitations WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("find_invitation_by_id"))?;

        row.map(TryInto::try_into).transpose()
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(skip_all, err))]
    async fn find_by_token_hash(
        &self,
        token_hash: &str,
    ) -> Result<Option<WorkspaceInvitation>, WorkspaceError> {
        let row: Option<InvitationRecord> = sqlx::query_as(&format!(
            "SELECT {COLUMNS} FROM workspace_invitations WHERE token_hash = ?"
        ))
        .bind(token_hash)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("find_invitation_by_token_hash"))?;

        row.map(TryInto::try_into).transpose()
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self), err))]
    async fn find_pending_by_workspace(
        &self,
        workspace_id: i64,
        now: DateTime<Utc>,
    ) -> Result<Vec<WorkspaceInvitation>, WorkspaceError> {
        let rows: Vec<InvitationRecord> = sqlx::query_as(&format!(
            r"
            SELECT {COLUMNS}
            FROM workspace_invitations
            WHERE workspace_id = ? AND accepted_at IS NULL AND expires_at > ?
            ORDER BY created_at DESC, id DESC
            "
        ))
        .bind(workspace_id)
        .bind(now)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("find_pending_invitations_by_workspace"))?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(skip_all, err))]
    async fn find_pending_by_email(
        &self,
        email: &str,
        now: DateTime<Utc>,
    ) -> Result<Vec<WorkspaceInvitation>, WorkspaceError> {
        let rows: Vec<InvitationRecord> = sqlx::query_as(&format!(
            r"
            SELECT {COLUMNS}
            FROM workspace_invitations
            WHERE email = ? AND accepted_at IS NULL AND expires_at > ?
            ORDER BY created_at DESC, id DESC
            "
        ))
        .bind(email)
        .bind(now)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("find_pending_invitations_by_email"))?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(skip_all, err))]
    async fn find_pending_for(
        &self,
        workspace_id: i64,
        email: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<WorkspaceInvitation>, WorkspaceError> {
        let row: Option<InvitationRecord> = sqlx::query_as(&format!(
            r"
            SELECT {COLUMNS}
            FROM workspace_invitations
            WHERE workspace_id = ? AND email = ? AND accepted_at IS NULL AND expires_at > ?
            ORDER BY created_at DESC, id DESC
            LIMIT 1
            "
        ))
        .bind(workspace_id)
        .bind(email)
        .bind(now)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("find_pending_invitation_for"))?;

        row.map(TryInto::try_into).transpose()
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self, token_hash), err))]
    async fn accept(
        &self,
        token_hash: &str,
        user_id: i64,
        now: DateTime<Utc>,
    ) -> Result<Option<(WorkspaceInvitation, WorkspaceMembership)>, WorkspaceError> {
        // dropping the transaction without commit rolls the claim back
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(db_error("begin_accept_invitation"))?;

        // the WHERE clause is the claim: a second caller matches no row
        let row: Option<InvitationRecord> = sqlx::query_as(&format!(
            r"
            UPDATE workspace_invitations SET accepted_at = ?, updated_at = ?
            WHERE token_hash = ? AND accepted_at IS NULL AND expires_at > ?
            RETURNING {COLUMNS}
            "
        ))
        .bind(now)
        .bind(now)
        .bind(token_hash)
        .bind(now)
        .fetch_optional(&mut *tx)
        .await
        .map_err(db_error("claim_invitation"))?;

        let Some(row) = row else {
            return Ok(None);
        };
        let invitation: WorkspaceInvitation = row.try_into()?;

        let membership: MembershipRecord = sqlx::query_as(
            r"
            INSERT INTO workspace_memberships (workspace_id, user_id, role, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?)
            RETURNING id, workspace_id, user_id, role, created_at, updated_at
            ",
        )
        .bind(invitation.workspace_id)
        .bind(user_id)
        .bind(invitation.role.as_str())
        .bind(now)
        .bind(now)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                return WorkspaceError::AlreadyMember;
            }
            db_error("create_membership_on_accept")(e)
        })?;
        let membership: WorkspaceMembership = membership.try_into()?;

        tx.commit()
            .await
            .map_err(db_error("commit_accept_invitation"))?;

        Ok(Some((invitation, membership)))
    }
}
