//! Dashboard statistics.

use std::convert::Infallible;

use async_stream::stream;
use axum::{
    Json,
    extract::State,
    response::Sse,
    response::sse::{Event, KeepAlive},
};

use crate::middleware::RequireAdminAuth;
use crate::services::DashboardStats;
use crate::state::AppState;

/// Current statistics.
///
/// GET /api/dashboard
pub async fn show(
    State(state): State<AppState>,
    RequireAdminAuth(_admin): RequireAdminAuth,
) -> Json<DashboardStats> {
    Json(state.dashboard().borrow().clone())
}

/// Statistics as server-sent events: the current value, then one `stats`
/// event per update.
///
/// GET /api/dashboard/stream
pub async fn stream(
    State(state): State<AppState>,
    RequireAdminAuth(_admin): RequireAdminAuth,
) -> Sse<impl futures::Stream<Item = Result<Event, Infallible>>> {
    let mut updates = state.dashboard();

    let events = stream! {
        loop {
            let stats = updates.borrow_and_update().clone();
            match Event::default().event("stats").json_data(&stats) {
                Ok(event) => yield Ok(event),
                Err(e) => tracing::warn!(error = %e, "Failed to encode dashboard event"),
            }
            if updates.changed().await.is_err() {
                break;
            }
        }
    };

    Sse::new(events).keep_alive(KeepAlive::default())
}
