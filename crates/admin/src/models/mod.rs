//! Admin-only models.
//!
//! Document models shared with the storefront live in `rentacam_core::models`.

pub mod session;

pub use session::{CurrentAdmin, keys as session_keys};
