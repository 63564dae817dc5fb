//! Cart route handlers.

use axum::{
    Json,
    extract::{Path, State},
};
use serde::Deserialize;

use rentacam_core::CartLineId;

use crate::error::Result;
use crate::middleware::RequireAuth;
use crate::services::CartService;
use crate::services::cart::{AddToCart, CartView};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct QuantityRequest {
    pub quantity: u32,
}

/// GET /api/cart
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(customer): RequireAuth,
) -> Result<Json<CartView>> {
    Ok(Json(CartService::new(state.store()).view(&customer.uid).await?))
}

/// POST /api/cart/items
pub async fn add(
    State(state): State<AppState>,
    RequireAuth(customer): RequireAuth,
    Json(item): Json<AddToCart>,
) -> Result<Json<CartView>> {
    let cart = CartService::new(state.store())
        .add_to_cart(&customer.uid, item)
        .await?;
    Ok(Json(cart))
}

/// PATCH /api/cart/items/{line_id}
pub async fn update(
    State(state): State<AppState>,
    RequireAuth(customer): RequireAuth,
    Path(line_id): Path<String>,
    Json(body): Json<QuantityRequest>,
) -> Result<Json<CartView>> {
    let cart = CartService::new(state.store())
        .update_quantity(&customer.uid, &CartLineId::new(line_id), body.quantity)
        .await?;
    Ok(Json(cart))
}

/// DELETE /api/cart/items/{line_id}
pub async fn remove(
    State(state): State<AppState>,
    RequireAuth(customer): RequireAuth,
    Path(line_id): Path<String>,
) -> Result<Json<CartView>> {
    let cart = CartService::new(state.store())
        .remove_from_cart(&customer.uid, &CartLineId::new(line_id))
        .await?;
    Ok(Json(cart))
}

/// DELETE /api/cart
pub async fn clear(
    State(state): State<AppState>,
    RequireAuth(customer): RequireAuth,
) -> Result<Json<CartView>> {
    Ok(Json(
        CartService::new(state.store()).clear_cart(&customer.uid).await?,
    ))
}
