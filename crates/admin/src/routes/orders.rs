//! Order route handlers.

use axum::{
    Json,
    extract::{Path, Query, State},
};

use rentacam_core::CheckoutId;
use rentacam_core::models::Checkout;

use crate::error::Result;
use crate::middleware::{RequireAdminAuth, RequireWriter};
use crate::services::OrderService;
use crate::services::orders::{OrderFilter, OrderStatusUpdate};
use crate::state::AppState;

/// GET /api/orders
pub async fn index(
    State(state): State<AppState>,
    RequireAdminAuth(_admin): RequireAdminAuth,
    Query(filter): Query<OrderFilter>,
) -> Result<Json<Vec<Checkout>>> {
    Ok(Json(OrderService::new(state.store()).list(&filter).await?))
}

/// GET /api/orders/{id}
pub async fn show(
    State(state): State<AppState>,
    RequireAdminAuth(_admin): RequireAdminAuth,
    Path(id): Path<String>,
) -> Result<Json<Checkout>> {
    let order = OrderService::new(state.store())
        .get(&CheckoutId::new(id))
        .await?;
    Ok(Json(order))
}

/// PATCH /api/orders/{id}/status
pub async fn update_status(
    State(state): State<AppState>,
    RequireWriter(_admin): RequireWriter,
    Path(id): Path<String>,
    Json(body): Json<OrderStatusUpdate>,
) -> Result<Json<Checkout>> {
    let order = OrderService::new(state.store())
        .update_status(&CheckoutId::new(id), &body)
        .await?;
    Ok(Json(order))
}
