//! Customer route handlers.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::Deserialize;

use rentacam_core::models::Customer;
use rentacam_core::{AccountStatus, CustomerId};

use crate::error::Result;
use crate::middleware::{RequireAdminAuth, RequireWriter};
use crate::services::CustomerService;
use crate::services::customers::CustomerFilter;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusRequest {
    pub account_status: AccountStatus,
}

#[derive(Debug, Deserialize)]
pub struct VerificationRequest {
    pub verified: bool,
}

/// GET /api/customers
pub async fn index(
    State(state): State<AppState>,
    RequireAdminAuth(_admin): RequireAdminAuth,
    Query(filter): Query<CustomerFilter>,
) -> Result<Json<Vec<Customer>>> {
    Ok(Json(CustomerService::new(state.store()).list(&filter).await?))
}

/// GET /api/customers/{id}
pub async fn show(
    State(state): State<AppState>,
    RequireAdminAuth(_admin): RequireAdminAuth,
    Path(id): Path<String>,
) -> Result<Json<Customer>> {
    let customer = CustomerService::new(state.store())
        .get(&CustomerId::new(id))
        .await?;
    Ok(Json(customer))
}

/// DELETE /api/customers/{id}
pub async fn delete(
    State(state): State<AppState>,
    RequireWriter(_admin): RequireWriter,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    CustomerService::new(state.store())
        .delete(&CustomerId::new(id))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/customers/{id}/status
pub async fn set_status(
    State(state): State<AppState>,
    RequireWriter(_admin): RequireWriter,
    Path(id): Path<String>,
    Json(body): Json<StatusRequest>,
) -> Result<Json<Customer>> {
    let customer = CustomerService::new(state.store())
        .set_account_status(&CustomerId::new(id), body.account_status)
        .await?;
    Ok(Json(customer))
}

/// POST /api/customers/{id}/verification
pub async fn set_verification(
    State(state): State<AppState>,
    RequireWriter(_admin): RequireWriter,
    Path(id): Path<String>,
    Json(body): Json<VerificationRequest>,
) -> Result<Json<Customer>> {
    let customer = CustomerService::new(state.store())
        .set_id_verified(&CustomerId::new(id), body.verified)
        .await?;
    Ok(Json(customer))
}
