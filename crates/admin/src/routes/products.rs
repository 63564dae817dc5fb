//! Product route handlers.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::Deserialize;

use rentacam_core::ProductId;
use rentacam_core::models::Product;

use crate::error::Result;
use crate::middleware::{RequireAdminAuth, RequireWriter};
use crate::services::ProductService;
use crate::services::products::{NewProduct, ProductFilter, ProductPatch, ReconcileReport};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ApprovalRequest {
    pub approved: bool,
}

#[derive(Debug, Default, Deserialize)]
pub struct ReconcileRequest {
    #[serde(default)]
    pub force: bool,
}

/// GET /api/products
pub async fn index(
    State(state): State<AppState>,
    RequireAdminAuth(_admin): RequireAdminAuth,
    Query(filter): Query<ProductFilter>,
) -> Result<Json<Vec<Product>>> {
    Ok(Json(ProductService::new(state.store()).list(&filter).await?))
}

/// GET /api/products/{id}
pub async fn show(
    State(state): State<AppState>,
    RequireAdminAuth(_admin): RequireAdminAuth,
    Path(id): Path<String>,
) -> Result<Json<Product>> {
    let product = ProductService::new(state.store())
        .get(&ProductId::new(id))
        .await?;
    Ok(Json(product))
}

/// POST /api/products
pub async fn create(
    State(state): State<AppState>,
    RequireWriter(_admin): RequireWriter,
    Json(body): Json<NewProduct>,
) -> Result<(StatusCode, Json<Product>)> {
    let product = ProductService::new(state.store()).create(body).await?;
    Ok((StatusCode::CREATED, Json(product)))
}

/// PATCH /api/products/{id}
pub async fn update(
    State(state): State<AppState>,
    RequireWriter(_admin): RequireWriter,
    Path(id): Path<String>,
    Json(body): Json<ProductPatch>,
) -> Result<Json<Product>> {
    let product = ProductService::new(state.store())
        .update(&ProductId::new(id), body)
        .await?;
    Ok(Json(product))
}

/// DELETE /api/products/{id}
pub async fn delete(
    State(state): State<AppState>,
    RequireWriter(_admin): RequireWriter,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    ProductService::new(state.store())
        .delete(&ProductId::new(id))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/products/{id}/approval
pub async fn set_approval(
    State(state): State<AppState>,
    RequireWriter(_admin): RequireWriter,
    Path(id): Path<String>,
    Json(body): Json<ApprovalRequest>,
) -> Result<Json<Product>> {
    let product = ProductService::new(state.store())
        .set_approved(&ProductId::new(id), body.approved)
        .await?;
    Ok(Json(product))
}

/// POST /api/products/reconcile
pub async fn reconcile(
    State(state): State<AppState>,
    RequireWriter(_admin): RequireWriter,
    body: Option<Json<ReconcileRequest>>,
) -> Result<Json<ReconcileReport>> {
    let force = body.is_some_and(|Json(request)| request.force);
    let report = ProductService::new(state.store())
        .reconcile_stock(force)
        .await?;
    Ok(Json(report))
}
