//! Unified error handling for admin.
//!
//! Every handler returns `Result<T, AppError>`. Server errors are captured to
//! Sentry and replaced by a generic message; client errors are returned as
//! JSON `{ "error": message }`, with a `field` key for validation errors so
//! the back-office UI can show them next to the offending input.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use rentacam_core::store::StoreError;

use crate::services::auth::AdminAuthError;
use crate::services::email::EmailError;
use crate::services::uploads::UploadError;

/// Application-level error type for the admin API.
#[derive(Debug, Error)]
pub enum AppError {
    /// Document store operation failed.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Authentication operation failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AdminAuthError),

    /// Email delivery failed.
    #[error("Email error: {0}")]
    Email(#[from] EmailError),

    /// File upload rejected or failed.
    #[error("Upload error: {0}")]
    Upload(#[from] UploadError),

    /// A request field failed validation.
    #[error("{message}")]
    Validation {
        /// Name of the offending field.
        field: String,
        /// Human-readable message.
        message: String,
    },

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// User is not authenticated.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// User lacks permission.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Conflicts with existing data.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Build a validation error for a named field.
    #[must_use]
    pub fn validation(field: &str, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.to_string(),
            message: message.into(),
        }
    }

    fn is_server_error(&self) -> bool {
        match self {
            Self::Store(err) => !matches!(err, StoreError::NotFound { .. }),
            Self::Upload(err) => matches!(err, UploadError::Io(_)),
            Self::Email(err) => !matches!(err, EmailError::InvalidAddress(_)),
            Self::Auth(err) => err.is_server_error(),
            Self::Internal(_) => true,
            _ => false,
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            Self::Store(StoreError::NotFound { .. }) | Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Store(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Email(EmailError::InvalidAddress(_)) => StatusCode::BAD_REQUEST,
            Self::Email(_) => StatusCode::BAD_GATEWAY,
            Self::Upload(err) => err.status(),
            Self::Auth(err) => err.status(),
            Self::Validation { .. } | Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::Conflict(_) => StatusCode::CONFLICT,
        }
    }
}

/// JSON error body.
#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    field: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Log server errors with Sentry
        if self.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Admin request error"
            );
        }

        let status = self.status();

        // Don't expose internal error details to clients
        let body = match self {
            Self::Store(StoreError::NotFound { collection, id }) => ErrorBody {
                error: format!("Not found: {collection}/{id}"),
                field: None,
            },
            Self::Store(_) | Self::Internal(_) => ErrorBody {
                error: "Internal server error".to_string(),
                field: None,
            },
            Self::Email(EmailError::InvalidAddress(address)) => ErrorBody {
                error: format!("Invalid email address: {address}"),
                field: Some("email".to_string()),
            },
            Self::Email(_) => ErrorBody {
                error: "Email delivery failed".to_string(),
                field: None,
            },
            Self::Upload(err) => ErrorBody {
                field: err.field().map(String::from),
                error: if matches!(err, UploadError::Io(_)) {
                    "Internal server error".to_string()
                } else {
                    err.to_string()
                },
            },
            Self::Auth(err) if err.is_server_error() => ErrorBody {
                error: "Internal server error".to_string(),
                field: None,
            },
            Self::Auth(err) => ErrorBody {
                field: err.field().map(String::from),
                error: err.to_string(),
            },
            Self::Validation { field, message } => ErrorBody {
                error: message,
                field: Some(field),
            },
            other => ErrorBody {
                error: other.to_string(),
                field: None,
            },
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context from an admin id.
pub fn set_sentry_user(admin_id: &str, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(admin_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    async fn body_json(err: AppError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[test]
    fn test_app_error_display() {
        let err = AppError::NotFound("order-123".to_string());
        assert_eq!(err.to_string(), "Not found: order-123");

        let err = AppError::validation("name", "Name is required");
        assert_eq!(err.to_string(), "Name is required");
    }

    #[test]
    fn test_app_error_status_codes() {
        fn get_status(err: AppError) -> StatusCode {
            err.into_response().status()
        }

        assert_eq!(
            get_status(AppError::NotFound("test".to_string())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(AppError::Store(StoreError::not_found("inventory", "RACIN0001"))),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(AppError::Forbidden("test".to_string())),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            get_status(AppError::Conflict("test".to_string())),
            StatusCode::CONFLICT
        );
        assert_eq!(
            get_status(AppError::Internal("test".to_string())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn test_validation_error_names_field() {
        let (status, body) = body_json(AppError::validation("stock", "Stock must be positive")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["field"], "stock");
        assert_eq!(body["error"], "Stock must be positive");
    }

    #[tokio::test]
    async fn test_internal_error_is_hidden() {
        let (status, body) = body_json(AppError::Internal("db password leaked".to_string())).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Internal server error");
        assert!(body.get("field").is_none());
    }
}
