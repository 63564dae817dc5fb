//! Notification route handlers.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::Serialize;

use rentacam_core::NotificationId;
use rentacam_core::models::Notification;

use crate::error::Result;
use crate::middleware::RequireAdminAuth;
use crate::services::NotificationService;
use crate::services::notifications::NotificationFilter;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct Count {
    pub count: usize,
}

/// GET /api/notifications
pub async fn index(
    State(state): State<AppState>,
    RequireAdminAuth(_admin): RequireAdminAuth,
    Query(filter): Query<NotificationFilter>,
) -> Result<Json<Vec<Notification>>> {
    Ok(Json(NotificationService::new(state.store()).list(filter).await?))
}

/// GET /api/notifications/unread-count
pub async fn unread_count(
    State(state): State<AppState>,
    RequireAdminAuth(_admin): RequireAdminAuth,
) -> Result<Json<Count>> {
    let count = NotificationService::new(state.store()).unread_count().await?;
    Ok(Json(Count { count }))
}

/// POST /api/notifications/{id}/read
pub async fn mark_read(
    State(state): State<AppState>,
    RequireAdminAuth(_admin): RequireAdminAuth,
    Path(id): Path<String>,
) -> Result<Json<Notification>> {
    let notification = NotificationService::new(state.store())
        .mark_read(&NotificationId::new(id))
        .await?;
    Ok(Json(notification))
}

/// POST /api/notifications/read-all
pub async fn mark_all_read(
    State(state): State<AppState>,
    RequireAdminAuth(_admin): RequireAdminAuth,
) -> Result<Json<Count>> {
    let count = NotificationService::new(state.store()).mark_all_read().await?;
    Ok(Json(Count { count }))
}

/// DELETE /api/notifications/{id}
pub async fn delete(
    State(state): State<AppState>,
    RequireAdminAuth(_admin): RequireAdminAuth,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    NotificationService::new(state.store())
        .delete(&NotificationId::new(id))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
