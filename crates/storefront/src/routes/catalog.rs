//! Catalog route handlers. Public, no sign-in required.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::header,
    response::IntoResponse,
};

use rentacam_core::ProductId;
use rentacam_core::models::Product;

use crate::error::Result;
use crate::services::CatalogService;
use crate::services::catalog::{CatalogFilter, CategorySummary};
use crate::state::AppState;

const PUBLIC_CACHE: &str = "public, max-age=60";

/// GET /api/products
pub async fn index(
    State(state): State<AppState>,
    Query(filter): Query<CatalogFilter>,
) -> Result<impl IntoResponse> {
    let products = CatalogService::new(state.store()).list(&filter).await?;
    Ok(([(header::CACHE_CONTROL, PUBLIC_CACHE)], Json(products)))
}

/// GET /api/products/{id}
pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Product>> {
    let product = CatalogService::new(state.store())
        .get(&ProductId::new(id))
        .await?;
    Ok(Json(product))
}

/// GET /api/categories
pub async fn categories(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let categories: Vec<CategorySummary> = CatalogService::new(state.store()).categories().await?;
    Ok(([(header::CACHE_CONTROL, PUBLIC_CACHE)], Json(categories)))
}
