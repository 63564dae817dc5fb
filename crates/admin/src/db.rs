//! Store backend selection.
//!
//! With `DATABASE_URL` set, documents live in `PostgreSQL` (see
//! `rentacam_core::store::PgStore`) and sessions in the same database.
//! Without it the admin runs against the in-memory store, which is only
//! suitable for local development.
//!
//! Migrations are NOT run on startup. Run them explicitly via:
//! ```bash
//! cargo run -p rentacam-cli -- migrate
//! ```

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

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
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

    let pool = create_pool(url).await?;
    let (store, _relay) = PgStore::start(pool.clone()).await?;
    tracing::info!("Database pool created, change relay started");

    Ok(Backend {
        store: Arc::new(store),
        pool: Some(pool),
    })
}
