//! Staff account commands.
//!
//! # Usage
//!
//! ```bash
//! rac-cli admin create -e admin@example.com -n "Admin Name" -r super_admin -p 'S3cret-pass'
//! RAC_ADMIN_PASSWORD='S3cret-pass' rac-cli admin create -e ops@example.com -n "Ops" --temporary
//! ```

use rentacam_admin::services::{AdminAuthError, AdminAuthService, NewAdmin};
use rentacam_core::{AdminId, AdminRole};
use thiserror::Error;

use super::{ConnectError, connect};

/// Errors that can occur during admin operations.
#[derive(Debug, Error)]
pub enum AdminError {
    #[error(transparent)]
    Connect(#[from] ConnectError),

    /// Invalid role.
    #[error("Invalid role: {0}. Valid roles: super_admin, admin, viewer")]
    InvalidRole(String),

    /// Neither `--password` nor `RAC_ADMIN_PASSWORD` was given.
    #[error("No password given: pass --password or set RAC_ADMIN_PASSWORD")]
    MissingPassword,

    #[error(transparent)]
    Auth(#[from] AdminAuthError),
}

/// Create a new staff account.
///
/// # Returns
///
/// The id of the created account.
///
/// # Errors
///
/// Returns an error for an unknown role, a missing or weak password, an
/// email that is taken, or a store failure.
pub async fn create_user(
    email: &str,
    name: &str,
    role: &str,
    password: Option<String>,
    temporary: bool,
) -> Result<AdminId, AdminError> {
    let role: AdminRole = role
        .parse()
        .map_err(|_| AdminError::InvalidRole(role.to_owned()))?;

    let password = password
        .or_else(|| std::env::var("RAC_ADMIN_PASSWORD").ok())
        .ok_or(AdminError::MissingPassword)?;

    let store = connect().await?;

    tracing::info!("Creating admin user: {} ({})", email, role);
    let account = AdminAuthService::new(&store)
        .create_admin(NewAdmin {
            email: email.to_owned(),
            name: name.to_owned(),
            role,
            password,
            employee_id: None,
            invited_by: None,
            must_change_password: temporary,
        })
        .await?;

    tracing::info!(
        "Admin user created successfully! ID: {}, Email: {}, Role: {}",
        account.id,
        account.email,
        account.role
    );
    if temporary {
        tracing::info!("The password must be changed at first sign-in.");
    }

    Ok(account.id)
}
