//! Store backend selection.
//!
//! Same policy as the admin: `PostgreSQL` when a database URL is configured,
//! the in-memory store otherwise. Both binaries share the `documents` table,
//! so a customer's order shows up on the admin dashboard as it is placed.

use std::sync::Arc;
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

use rentacam_core::store::{MemoryStore, PgStore, SharedStore, StoreResult};

/// The document store plus the pool backing it, if any.
pub struct Backend {
    pub store: SharedStore,
    pub pool: Option<PgPool>,
}

/// Open the configured backend and start its change relay.
///
/// # Errors
///
/// Returns `StoreError::Database` if the database cannot be reached.
pub async fn connect(database_url: Option<&SecretString>) -> StoreResult<Backend> {
    let Some(url) = database_url else {
        tracing::warn!("DATABASE_URL not set, using in-memory document store");
        return Ok(Backend {
            store: Arc::new(MemoryStore::new()),
            pool: None,
        });
    };

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(url.expose_secret())
        .await?;
    let (store, _relay) = PgStore::start(pool.clone()).await?;
    tracing::info!("Database pool created, change relay started");

    Ok(Backend {
        store: Arc::new(store),
        pool: Some(pool),
    })
}
