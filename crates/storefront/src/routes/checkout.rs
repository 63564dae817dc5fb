//! Checkout and order history route handlers.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};

use rentacam_core::CheckoutId;
use rentacam_core::models::Checkout;

use crate::error::Result;
use crate::middleware::RequireAuth;
use crate::services::CheckoutService;
use crate::state::AppState;

/// POST /api/checkout
#[tracing::instrument(skip(state, customer), fields(uid = %customer.uid))]
pub async fn create(
    State(state): State<AppState>,
    RequireAuth(customer): RequireAuth,
) -> Result<(StatusCode, Json<Checkout>)> {
    let order = CheckoutService::new(state.store())
        .place_order(&customer.uid)
        .await?;
    Ok((StatusCode::CREATED, Json(order)))
}

/// GET /api/orders
pub async fn index(
    State(state): State<AppState>,
    RequireAuth(customer): RequireAuth,
) -> Result<Json<Vec<Checkout>>> {
    Ok(Json(
        CheckoutService::new(state.store())
            .orders(&customer.uid)
            .await?,
    ))
}

/// GET /api/orders/{id}
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(customer): RequireAuth,
    Path(id): Path<String>,
) -> Result<Json<Checkout>> {
    let order = CheckoutService::new(state.store())
        .order(&customer.uid, &CheckoutId::new(id))
        .await?;
    Ok(Json(order))
}
