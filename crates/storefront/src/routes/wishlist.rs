//! Wishlist route handlers.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

use rentacam_core::ProductId;
use rentacam_core::models::Product;

use crate::error::Result;
use crate::middleware::RequireAuth;
use crate::services::WishlistService;
use crate::state::AppState;

/// GET /api/wishlist
pub async fn index(
    State(state): State<AppState>,
    RequireAuth(customer): RequireAuth,
) -> Result<Json<Vec<Product>>> {
    Ok(Json(
        WishlistService::new(state.store())
            .products(&customer.uid)
            .await?,
    ))
}

/// Toggle a product. Answers 204 when the identity has no customer profile.
///
/// POST /api/wishlist/{product_id}
pub async fn toggle(
    State(state): State<AppState>,
    RequireAuth(customer): RequireAuth,
    Path(product_id): Path<String>,
) -> Result<Response> {
    let wishlist = WishlistService::new(state.store())
        .toggle(&customer.uid, &ProductId::new(product_id))
        .await?;
    Ok(match wishlist {
        Some(ids) => Json(json!({ "wishlist": ids })).into_response(),
        None => StatusCode::NO_CONTENT.into_response(),
    })
}
