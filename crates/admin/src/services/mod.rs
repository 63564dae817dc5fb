//! Business logic services for admin.
//!
//! # Services
//!
//! - `auth` - Staff email/password sign-in
//! - `customers` - Customer accounts and ID verification
//! - `dashboard` - Live statistics over orders, users and products
//! - `email` - Mail delivery and the staff invite email
//! - `inventory` - Inventory items and stock levels
//! - `invites` - Staff account creation by invitation
//! - `notifications` - Change-driven notifications
//! - `orders` - Order status management
//! - `products` - Catalog products and stock reconciliation
//! - `settings` - Business settings
//! - `uploads` - File uploads to local object storage

pub mod auth;
pub mod customers;
pub mod dashboard;
pub mod email;
pub mod inventory;
pub mod invites;
pub mod notifications;
pub mod orders;
pub mod products;
pub mod settings;
pub mod uploads;

pub use auth::{AdminAuthError, AdminAuthService, NewAdmin};
pub use customers::CustomerService;
pub use dashboard::{Dashboard, DashboardStats};
pub use email::{EmailError, LogMailer, Mailer, SmtpMailer};
pub use inventory::InventoryService;
pub use invites::InviteService;
pub use notifications::{NotificationService, spawn_watchers};
pub use orders::OrderService;
pub use products::ProductService;
pub use settings::SettingsService;
pub use uploads::UploadService;
