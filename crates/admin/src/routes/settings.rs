//! Business settings route handlers.

use axum::{Json, extract::State};

use rentacam_core::models::BusinessSettings;

use crate::error::Result;
use crate::middleware::{RequireAdminAuth, RequireWriter};
use crate::services::SettingsService;
use crate::services::settings::SettingsPatch;
use crate::state::AppState;

/// GET /api/settings
pub async fn show(
    State(state): State<AppState>,
    RequireAdminAuth(_admin): RequireAdminAuth,
) -> Result<Json<BusinessSettings>> {
    Ok(Json(SettingsService::new(state.store()).get().await?))
}

/// PUT /api/settings
pub async fn update(
    State(state): State<AppState>,
    RequireWriter(_admin): RequireWriter,
    Json(body): Json<SettingsPatch>,
) -> Result<Json<BusinessSettings>> {
    Ok(Json(SettingsService::new(state.store()).update(body).await?))
}
