//! Authentication route handlers.

use axum::{Json, extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;

use rentacam_core::models::Customer;

use crate::error::{AppError, Result, add_breadcrumb, clear_sentry_user, set_sentry_user};
use crate::middleware::{OptionalAuth, RequireAuth, clear_current_customer, set_current_customer};
use crate::models::CurrentCustomer;
use crate::services::{AuthService, Registration};
use crate::state::AppState;

/// Login request body.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Registration response: the session identity and the new profile.
#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub user: CurrentCustomer,
    pub customer: Customer,
}

async fn start_session(session: &Session, current: &CurrentCustomer) -> Result<()> {
    set_current_customer(session, current)
        .await
        .map_err(|e| AppError::Internal(format!("session error: {e}")))?;
    set_sentry_user(&current.uid, Some(current.email.as_str()));
    Ok(())
}

/// Register and sign in.
///
/// POST /api/auth/register
#[tracing::instrument(skip(state, session, body))]
pub async fn register(
    State(state): State<AppState>,
    session: Session,
    Json(body): Json<Registration>,
) -> Result<(StatusCode, Json<RegisterResponse>)> {
    let (user, customer) = AuthService::new(state.store()).register(body).await?;

    let current = CurrentCustomer::from(&user);
    start_session(&session, &current).await?;
    add_breadcrumb("auth", "Customer registered", None);

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            user: current,
            customer,
        }),
    ))
}

/// Sign in and start a session.
///
/// POST /api/auth/login
#[tracing::instrument(skip(state, session, body))]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Json(body): Json<LoginRequest>,
) -> Result<Json<CurrentCustomer>> {
    let user = AuthService::new(state.store())
        .login(&body.email, &body.password)
        .await?;

    let current = CurrentCustomer::from(&user);
    start_session(&session, &current).await?;

    Ok(Json(current))
}

/// End the session.
///
/// POST /api/auth/logout
pub async fn logout(OptionalAuth(customer): OptionalAuth, session: Session) -> StatusCode {
    if let Some(customer) = customer {
        tracing::info!(uid = %customer.uid, "Customer signed out");
    }
    let _ = clear_current_customer(&session).await;
    clear_sentry_user();
    StatusCode::NO_CONTENT
}

/// The signed-in customer identity.
///
/// GET /api/auth/me
pub async fn me(RequireAuth(customer): RequireAuth) -> Json<CurrentCustomer> {
    Json(customer)
}
