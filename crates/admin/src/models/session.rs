//! Session-related types for admin authentication.

use serde::{Deserialize, Serialize};

use rentacam_core::models::AdminAccount;
use rentacam_core::{AdminId, AdminRole, Email};

/// Session-stored admin identity.
///
/// Minimal data stored in the session to identify the logged-in admin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentAdmin {
    /// Id of the `admin` document.
    pub id: AdminId,
    pub email: Email,
    pub name: String,
    pub role: AdminRole,
    /// Set for invited staff until they choose their own password.
    #[serde(default)]
    pub must_change_password: bool,
}

impl From<&AdminAccount> for CurrentAdmin {
    fn from(account: &AdminAccount) -> Self {
        Self {
            id: account.id.clone(),
            email: account.email.clone(),
            name: account.name.clone(),
            role: account.role,
            must_change_password: account.must_change_password,
        }
    }
}

/// Session keys for admin authentication data.
pub mod keys {
    /// Key for storing the current logged-in admin.
    pub const CURRENT_ADMIN: &str = "current_admin";
}
