//! RentACam Core - Shared types, document models and the document store.
//!
//! This crate provides what every RentACam component shares:
//! - `storefront` - Customer-facing rental API
//! - `admin` - Back-office API (inventory, orders, dashboard, notifications)
//! - `cli` - Command-line tools for migrations, seeding and maintenance
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, prices, emails, and statuses
//! - [`models`] - Typed views of the documents in each collection
//! - [`store`] - The [`store::DocumentStore`] trait, its backends and live subscriptions
//! - [`password`] - Argon2 password hashing

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod models;
pub mod password;
pub mod store;
pub mod types;

pub use types::*;
