//! Authentication error types.

use axum::http::StatusCode;
use thiserror::Error;

use rentacam_core::password::PasswordError;
use rentacam_core::store::StoreError;

/// Errors that can occur during authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Invalid email format.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] rentacam_core::EmailError),

    /// Invalid credentials (wrong password or user not found).
    #[error("invalid email or password")]
    InvalidCredentials,

    /// User already exists.
    #[error("an account with this email already exists")]
    UserAlreadyExists,

    /// The customer account was suspended by the back office.
    #[error("this account has been suspended")]
    AccountSuspended,

    /// Password too short or could not be hashed.
    #[error("{0}")]
    Password(#[from] PasswordError),

    /// Store error.
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

impl AuthError {
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
            Self::UserAlreadyExists => StatusCode::CONFLICT,
            Self::AccountSuspended => StatusCode::FORBIDDEN,
            Self::Password(PasswordError::Hash) | Self::Store(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Request field the error refers to, if any.
    #[must_use]
    pub const fn field(&self) -> Option<&'static str> {
        match self {
            Self::InvalidEmail(_) | Self::UserAlreadyExists => Some("email"),
            Self::Password(PasswordError::TooShort) => Some("password"),
            _ => None,
        }
    }
}
