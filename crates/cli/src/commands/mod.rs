//! Subcommand implementations.

pub mod admin;
pub mod migrate;
pub mod seed;
pub mod stock;

use secrecy::SecretString;
use thiserror::Error;

use rentacam_admin::db;
use rentacam_core::store::{SharedStore, StoreError};

/// Errors opening the document store.
#[derive(Debug, Error)]
pub enum ConnectError {
    /// Required environment variable is missing.
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// `DATABASE_URL` from the environment or `.env`.
///
/// # Errors
///
/// Returns `ConnectError::MissingEnvVar` when it is not set.
pub fn database_url() -> Result<SecretString, ConnectError> {
    dotenvy::dotenv().ok();
    std::env::var("DATABASE_URL")
        .map(SecretString::from)
        .map_err(|_| ConnectError::MissingEnvVar("DATABASE_URL"))
}

/// Open the `PostgreSQL` document store.
///
/// # Errors
///
/// Returns an error if `DATABASE_URL` is missing or the database cannot be
/// reached.
pub async fn connect() -> Result<SharedStore, ConnectError> {
    let url = database_url()?;
    tracing::info!("Connecting to database...");
    let backend = db::connect(Some(&url)).await?;
    Ok(backend.store)
}
