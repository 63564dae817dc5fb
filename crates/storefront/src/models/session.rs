//! Session-related types.
//!
//! Types stored in the session for authentication state.

use serde::{Deserialize, Serialize};

use rentacam_core::models::AuthUser;
use rentacam_core::{Email, UserUid};

/// Session-stored customer identity.
///
/// Only the sign-in identity is kept in the session; the `customers`
/// document is looked up by `firebaseUid` on every request so that admin
/// changes (suspension, verification) apply immediately.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentCustomer {
    /// Id of the `users` document.
    pub uid: UserUid,
    pub email: Email,
    #[serde(default)]
    pub display_name: String,
}

impl From<&AuthUser> for CurrentCustomer {
    fn from(user: &AuthUser) -> Self {
        Self {
            uid: user.id.clone(),
            email: user.email.clone(),
            display_name: user.display_name.clone(),
        }
    }
}

/// Session keys for authentication data.
pub mod keys {
    /// Key for storing the current signed-in customer.
    pub const CURRENT_CUSTOMER: &str = "current_customer";
}
