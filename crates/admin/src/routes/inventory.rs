//! Inventory route handlers.

use std::convert::Infallible;

use async_stream::stream;
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::Sse,
    response::sse::{Event, KeepAlive},
};
use serde::{Deserialize, Serialize};

use rentacam_core::InventoryId;
use rentacam_core::models::InventoryItem;
use rentacam_core::store::decode_all;

use crate::error::Result;
use crate::middleware::{RequireAdminAuth, RequireWriter};
use crate::services::InventoryService;
use crate::services::inventory::{InventoryPatch, NewInventoryItem};
use crate::state::AppState;

/// Stock adjustment request body.
#[derive(Debug, Deserialize)]
pub struct StockDelta {
    pub delta: i64,
}

#[derive(Debug, Serialize)]
pub struct NextId {
    pub id: InventoryId,
}

/// GET /api/inventory
pub async fn index(
    State(state): State<AppState>,
    RequireAdminAuth(_admin): RequireAdminAuth,
) -> Result<Json<Vec<InventoryItem>>> {
    Ok(Json(InventoryService::new(state.store()).list().await?))
}

/// GET /api/inventory/next-id
pub async fn next_id(
    State(state): State<AppState>,
    RequireAdminAuth(_admin): RequireAdminAuth,
) -> Result<Json<NextId>> {
    let id = InventoryService::new(state.store()).next_id().await?;
    Ok(Json(NextId { id }))
}

/// GET /api/inventory/{id}
pub async fn show(
    State(state): State<AppState>,
    RequireAdminAuth(_admin): RequireAdminAuth,
    Path(id): Path<String>,
) -> Result<Json<InventoryItem>> {
    let item = InventoryService::new(state.store())
        .get(&InventoryId::new(id))
        .await?;
    Ok(Json(item))
}

/// POST /api/inventory
pub async fn create(
    State(state): State<AppState>,
    RequireWriter(_admin): RequireWriter,
    Json(body): Json<NewInventoryItem>,
) -> Result<(StatusCode, Json<InventoryItem>)> {
    let item = InventoryService::new(state.store()).add_product(body).await?;
    Ok((StatusCode::CREATED, Json(item)))
}

/// PATCH /api/inventory/{id}
pub async fn update(
    State(state): State<AppState>,
    RequireWriter(_admin): RequireWriter,
    Path(id): Path<String>,
    Json(body): Json<InventoryPatch>,
) -> Result<Json<InventoryItem>> {
    let item = InventoryService::new(state.store())
        .update_product(&InventoryId::new(id), body)
        .await?;
    Ok(Json(item))
}

/// DELETE /api/inventory/{id}
pub async fn delete(
    State(state): State<AppState>,
    RequireWriter(_admin): RequireWriter,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    InventoryService::new(state.store())
        .delete_product(&InventoryId::new(id))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/inventory/{id}/stock
pub async fn adjust_stock(
    State(state): State<AppState>,
    RequireWriter(_admin): RequireWriter,
    Path(id): Path<String>,
    Json(body): Json<StockDelta>,
) -> Result<Json<InventoryItem>> {
    let item = InventoryService::new(state.store())
        .update_stock(&InventoryId::new(id), body.delta)
        .await?;
    Ok(Json(item))
}

/// The inventory list as server-sent events, one `inventory` event per
/// change.
///
/// GET /api/inventory/stream
pub async fn stream(
    State(state): State<AppState>,
    RequireAdminAuth(_admin): RequireAdminAuth,
) -> Sse<impl futures::Stream<Item = std::result::Result<Event, Infallible>>> {
    let mut subscription = InventoryService::new(state.store()).subscribe();

    let events = stream! {
        loop {
            match subscription.next().await {
                Ok(Some(snapshot)) => {
                    let items: Vec<InventoryItem> = match decode_all(&snapshot.documents) {
                        Ok(items) => items,
                        Err(e) => {
                            tracing::warn!(error = %e, "Skipping undecodable inventory snapshot");
                            continue;
                        }
                    };
                    match Event::default().event("inventory").json_data(&items) {
                        Ok(event) => yield Ok(event),
                        Err(e) => tracing::warn!(error = %e, "Failed to encode inventory event"),
                    }
                }
                Ok(None) => break,
                Err(e) => {
                    tracing::warn!(error = %e, "Inventory subscription failed");
                    break;
                }
            }
        }
    };

    Sse::new(events).keep_alive(KeepAlive::default())
}
