//! Admin authentication error types.

use axum::http::StatusCode;
use thiserror::Error;

use rentacam_core::password::PasswordError;
use rentacam_core::store::StoreError;

/// Errors that can occur during admin authentication operations.
#[derive(Debug, Error)]
pub enum AdminAuthError {
    /// Invalid email format.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] rentacam_core::EmailError),

    /// Unknown email or wrong password. The two are not distinguished.
    #[error("invalid email or password")]
    InvalidCredentials,

    /// An account with this email already exists.
    #[error("an admin account with this email already exists")]
    AdminAlreadyExists,

    /// The new password is too short or could not be hashed.
    #[error("{0}")]
    Password(#[from] PasswordError),

    /// Store error.
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

impl AdminAuthError {
    /// Whether this is a server-side failure rather than a bad request.
    #[must_use]
    pub const fn is_server_error(&self) -> bool {
        matches!(self, Self::Store(_) | Self::Password(PasswordError::Hash))
    }

    /// HTTP status for this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::InvalidEmail(_) | Self::Password(PasswordError::TooShort) => {
                StatusCode::BAD_REQUEST
            }
            Self::InvalidCredentials | Self::Password(PasswordError::Mismatch) => {
                StatusCode::UNAUTHORIZED
            }
            Self::AdminAlreadyExists => StatusCode::CONFLICT,
            Self::Password(PasswordError::Hash) | Self::Store(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Request field the error refers to, if any.
    #[must_use]
    pub const fn field(&self) -> Option<&'static str> {
        match self {
            Self::InvalidEmail(_) | Self::AdminAlreadyExists => Some("email"),
            Self::Password(PasswordError::TooShort) => Some("password"),
            _ => None,
        }
    }
}
