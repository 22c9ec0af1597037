//! Shared error and result types for Bridgeway
//!
//! Every fallible path in the crate funnels into [`BridgewayError`], which
//! carries enough structure for route handlers to pick an HTTP status and a
//! stable machine-readable code. None of these are fatal to the process;
//! handlers translate them into JSON error envelopes.

use hyper::StatusCode;
use thiserror::Error;

/// Crate-wide error type
#[derive(Debug, Error)]
pub enum BridgewayError {
    /// Input rejected before it reaches the store (empty title, short answer)
    #[error("Validation error: {0}")]
    Validation(String),

    /// Referenced question/answer/profile does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Precondition on status or selection violated
    #[error("State conflict: {0}")]
    StateConflict(String),

    /// Caller lacks the role or ownership the operation requires
    #[error("Permission denied: {0}")]
    Permission(String),

    /// A profile exists with a different role than the login surface expects
    #[error("Role mismatch: {0}")]
    RoleMismatch(String),

    /// Profile write failed during first-login auto-creation
    #[error("Profile creation failed: {0}")]
    ProfileCreation(String),

    /// A question's owner tried to answer their own question
    #[error("Cannot answer your own question")]
    SelfAnswerForbidden,

    /// A different answer was already accepted for this question
    #[error("An answer has already been accepted for this question")]
    AlreadyAccepted,

    /// Credential or token failure
    #[error("Authentication error: {0}")]
    Auth(String),

    /// MongoDB transport or write failure
    #[error("Database error: {0}")]
    Database(String),

    /// Malformed request (bad JSON, oversized body)
    #[error("HTTP error: {0}")]
    Http(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl BridgewayError {
    /// HTTP status the error maps to
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) | Self::Http(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::StateConflict(_) | Self::AlreadyAccepted => StatusCode::CONFLICT,
            Self::Permission(_) | Self::RoleMismatch(_) | Self::SelfAnswerForbidden => {
                StatusCode::FORBIDDEN
            }
            Self::Auth(_) => StatusCode::UNAUTHORIZED,
            Self::Database(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::ProfileCreation(_) | Self::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Stable machine-readable code for JSON error envelopes
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "VALIDATION",
            Self::NotFound(_) => "NOT_FOUND",
            Self::StateConflict(_) => "STATE_CONFLICT",
            Self::Permission(_) => "PERMISSION_DENIED",
            Self::RoleMismatch(_) => "ROLE_MISMATCH",
            Self::ProfileCreation(_) => "PROFILE_CREATION_FAILED",
            Self::SelfAnswerForbidden => "SELF_ANSWER_FORBIDDEN",
            Self::AlreadyAccepted => "ALREADY_ACCEPTED",
            Self::Auth(_) => "UNAUTHORIZED",
            Self::Database(_) => "DB_UNAVAILABLE",
            Self::Http(_) => "BAD_REQUEST",
            Self::Io(_) => "IO_ERROR",
        }
    }

    /// Whether a client retry of the identical request can succeed
    ///
    /// Transport/store failures are retryable; validation, permission and
    /// state-conflict rejections are not.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Database(_) | Self::Io(_))
    }
}

pub type Result<T> = std::result::Result<T, BridgewayError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            BridgewayError::Validation("empty title".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            BridgewayError::AlreadyAccepted.status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            BridgewayError::SelfAnswerForbidden.status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            BridgewayError::Database("down".into()).status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[test]
    fn test_retryable() {
        assert!(BridgewayError::Database("timeout".into()).is_retryable());
        assert!(!BridgewayError::AlreadyAccepted.is_retryable());
        assert!(!BridgewayError::Validation("x".into()).is_retryable());
    }
}
