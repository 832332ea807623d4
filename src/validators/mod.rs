pub mod email;

pub use email::{InviteeEmail, normalize_email, validate_email};

use serde::{Deserialize, Serialize};

use crate::WorkspaceError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ValidationError {
    EmailEmpty,
    EmailTooLong,
    EmailInvalidFormat,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmailEmpty => write!(f, "Email cannot be empty"),
            Self::EmailTooLong => write!(f, "Email is too long (max 254 characters)"),
            Self::EmailInvalidFormat => write!(f, "Invalid email format"),
        }
    }
}

impl std::error::Error for ValidationError {}

impl From<ValidationError> for WorkspaceError {
    fn from(err: ValidationError) -> Self {
        match err {
            ValidationError::EmailInvalidFormat => Self::InvalidEmail,
            other => Self::Validation(other.to_string()),
        }
    }
}
