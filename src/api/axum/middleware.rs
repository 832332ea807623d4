use axum::extract::FromRequestParts;
use axum::http::HeaderMap;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;

use super::error::AppError;
use super::routes::InvitationsState;
use crate::WorkspaceError;
use crate::api::SessionResolver;
use crate::workspaces::User;

/// resolves the bearer token from the `Authorization` header to a user
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    user: User,
}

impl AuthenticatedUser {
    pub fn into_inner(self) -> User {
        self.user
    }

    pub fn user(&self) -> &User {
        &self.user
    }
}

pub fn extract_bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()
        .and_then(|auth| auth.strip_prefix("Bearer "))
        .filter(|token| !token.is_empty())
        .map(ToOwned::to_owned)
}

impl<W, U, I, M, ML, S> FromRequestParts<InvitationsState<W, U, I, M, ML, S>> for AuthenticatedUser
where
    W: Clone + Send + Sync + 'static,
    U: Clone + Send + Sync + 'static,
    I: Clone + Send + Sync + 'static,
    M: Clone + Send + Sync + 'static,
    ML: Clone + Send + Sync + 'static,
    S: SessionResolver + Clone + Send + Sync + 'static,
{
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &InvitationsState<W, U, I, M, ML, S>,
    ) -> Result<Self, Self::Rejection> {
        let token =
            extract_bearer_token(&parts.headers).ok_or(AppError(WorkspaceError::Unauthorized))?;

        let user = state
            .sessions
            .resolve(&token)
            .await
            .map_err(AppError)?
            .ok_or(AppError(WorkspaceError::Unauthorized))?;

        Ok(AuthenticatedUser { user })
    }
}
