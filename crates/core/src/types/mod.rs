//! Core types for RentACam.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod email;
pub mod id;
pub mod inventory_code;
pub mod price;
pub mod status;

pub use email::{Email, EmailError};
pub use id::*;
pub use inventory_code::{INVENTORY_PREFIX, next_inventory_code};
pub use price::{CurrencyCode, Price, rental_total};
pub use status::*;
