use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::WorkspaceError;
use crate::api::ErrorResponse;

/// converts `WorkspaceError` into appropriate HTTP responses
#[derive(Debug)]
pub struct AppError(pub WorkspaceError);

impl From<WorkspaceError> for AppError {
    fn from(err: WorkspaceError) -> Self {
        Self(err)
    }
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            WorkspaceError::NotFound
            | WorkspaceError::UserNotFound
            | WorkspaceError::InvitationNotFound => StatusCode::NOT_FOUND,
            WorkspaceError::InvitationNotAcceptable(_) => StatusCode::GONE,
            WorkspaceError::AlreadyInvited | WorkspaceError::AlreadyMember => StatusCode::CONFLICT,
            WorkspaceError::InvalidRole(_)
            | WorkspaceError::InvalidEmail
            | WorkspaceError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            WorkspaceError::Unauthorized => StatusCode::UNAUTHORIZED,
            WorkspaceError::DuplicateToken
            | WorkspaceError::DatabaseError(_)
            | WorkspaceError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            log::error!(target: "tenancy", "msg=\"request failed\", code=\"{}\", error=\"{}\"", self.0.code(), self.0);
        }

        (status, Json(ErrorResponse::from(self.0))).into_response()
    }
}
