//! Account route handlers.

use axum::{Json, extract::State};

use rentacam_core::models::Customer;

use crate::error::Result;
use crate::middleware::RequireAuth;
use crate::services::AccountService;
use crate::services::account::{IdSubmission, ProfilePatch};
use crate::state::AppState;

/// GET /api/account
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(customer): RequireAuth,
) -> Result<Json<Customer>> {
    Ok(Json(
        AccountService::new(state.store())
            .profile(&customer.uid)
            .await?,
    ))
}

/// PATCH /api/account
pub async fn update(
    State(state): State<AppState>,
    RequireAuth(customer): RequireAuth,
    Json(patch): Json<ProfilePatch>,
) -> Result<Json<Customer>> {
    let updated = AccountService::new(state.store())
        .update_profile(&customer.uid, patch)
        .await?;
    Ok(Json(updated))
}

/// POST /api/account/id-verification
pub async fn submit_id(
    State(state): State<AppState>,
    RequireAuth(customer): RequireAuth,
    Json(submission): Json<IdSubmission>,
) -> Result<Json<Customer>> {
    let updated = AccountService::new(state.store())
        .submit_id_verification(&customer.uid, submission)
        .await?;
    Ok(Json(updated))
}
