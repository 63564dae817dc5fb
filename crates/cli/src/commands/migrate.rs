//! Database migration command.
//!
//! Creates the `documents` table with its change log and the session tables
//! of both servers. Neither server migrates on startup.

use thiserror::Error;
use tower_sessions_sqlx_store::PostgresStore;

use rentacam_admin::db;
use rentacam_core::store::PgStore;

use super::{ConnectError, database_url};

#[derive(Debug, Error)]
pub enum MigrationError {
    #[error(transparent)]
    Connect(#[from] ConnectError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Invalid session table name: {0}")]
    SessionTable(String),
}

/// Run every migration.
///
/// # Errors
///
/// Returns an error if the database is unreachable or a migration fails.
pub async fn run() -> Result<(), MigrationError> {
    let url = database_url()?;

    tracing::info!("Connecting to database...");
    let pool = db::create_pool(&url).await?;

    tracing::info!("Running document store migrations...");
    PgStore::migrate(&pool).await?;

    for table in [
        rentacam_admin::middleware::session::SESSION_TABLE,
        rentacam_storefront::middleware::session::SESSION_TABLE,
    ] {
        tracing::info!(table, "Creating session table");
        PostgresStore::new(pool.clone())
            .with_table_name(table)
            .map_err(MigrationError::SessionTable)?
            .migrate()
            .await?;
    }

    tracing::info!("Migrations complete!");
    Ok(())
}
