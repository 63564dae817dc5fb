//! Authentication route handlers for admin.

use axum::{Json, extract::State, http::StatusCode};
use serde::Deserialize;
use tower_sessions::Session;

use crate::error::{AppError, Result, clear_sentry_user, set_sentry_user};
use crate::middleware::{RequireAdminAuth, clear_current_admin, set_current_admin};
use crate::models::CurrentAdmin;
use crate::services::AdminAuthService;
use crate::state::AppState;

/// Login request body.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Change-password request body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

/// Sign in and start a session.
///
/// POST /api/auth/login
#[tracing::instrument(skip(state, session, body))]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Json(body): Json<LoginRequest>,
) -> Result<Json<CurrentAdmin>> {
    let account = AdminAuthService::new(state.store())
        .login(&body.email, &body.password)
        .await?;

    let current = CurrentAdmin::from(&account);
    set_current_admin(&session, &current)
        .await
        .map_err(|e| AppError::Internal(format!("session error: {e}")))?;
    set_sentry_user(current.id.as_str(), Some(current.email.as_str()));

    Ok(Json(current))
}

/// End the session.
///
/// POST /api/auth/logout
pub async fn logout(session: Session) -> StatusCode {
    let _ = clear_current_admin(&session).await;
    clear_sentry_user();
    StatusCode::NO_CONTENT
}

/// The signed-in admin.
///
/// GET /api/auth/me
pub async fn me(RequireAdminAuth(admin): RequireAdminAuth) -> Json<CurrentAdmin> {
    Json(admin)
}

/// Replace the signed-in admin's password.
///
/// POST /api/auth/password
#[tracing::instrument(skip(state, session, admin, body), fields(admin_id = %admin.id))]
pub async fn change_password(
    State(state): State<AppState>,
    session: Session,
    RequireAdminAuth(admin): RequireAdminAuth,
    Json(body): Json<ChangePasswordRequest>,
) -> Result<Json<CurrentAdmin>> {
    let account = AdminAuthService::new(state.store())
        .change_password(&admin.id, &body.current_password, &body.new_password)
        .await?;

    let current = CurrentAdmin::from(&account);
    session
        .insert(crate::models::session_keys::CURRENT_ADMIN, &current)
        .await
        .map_err(|e| AppError::Internal(format!("session error: {e}")))?;

    Ok(Json(current))
}
