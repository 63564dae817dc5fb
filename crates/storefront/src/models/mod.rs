//! Storefront-only models.
//!
//! Document models shared with the admin live in `rentacam_core::models`.

pub mod session;

pub use session::{CurrentCustomer, keys as session_keys};
