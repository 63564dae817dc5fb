//! Typed views of the documents stored in each collection.
//!
//! Documents are schemaless; these models describe the fields the
//! application reads and writes. Field names are camelCase on the wire and
//! optional fields default when absent, so older documents still decode.

pub mod account;
pub mod checkout;
pub mod customer;
pub mod inventory;
pub mod notification;
pub mod product;
pub mod settings;

pub use account::{AdminAccount, AuthUser};
pub use checkout::{Checkout, Pricing};
pub use customer::{Address, CartLine, Customer, IdVerification};
pub use inventory::InventoryItem;
pub use notification::Notification;
pub use product::Product;
pub use settings::{BusinessSettings, load_business_settings};

/// Collection names.
pub mod collections {
    pub const PRODUCTS: &str = "products";
    pub const INVENTORY: &str = "inventory";
    pub const CUSTOMERS: &str = "customers";
    /// Auth identities (one per storefront sign-up).
    pub const USERS: &str = "users";
    pub const CHECKOUTS: &str = "checkouts";
    /// Back-office staff accounts.
    pub const ADMIN: &str = "admin";
    pub const BUSINESS_SETTINGS: &str = "businessSettings";
    pub const NOTIFICATIONS: &str = "notifications";
    /// Durable change cursors of the notification watchers.
    pub const NOTIFICATION_CURSORS: &str = "notificationCursors";
}
