//! Business logic services for the storefront.
//!
//! # Services
//!
//! - `auth` - Registration and password sign-in
//! - `account` - Customer profile and ID verification
//! - `catalog` - Approved products, filters and categories
//! - `cart` - Cart lines stored on the customer document
//! - `wishlist` - Saved product ids
//! - `checkout` - Order placement and order history

pub mod account;
pub mod auth;
pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod wishlist;

pub use account::AccountService;
pub use auth::{AuthError, AuthService, Registration};
pub use cart::CartService;
pub use catalog::CatalogService;
pub use checkout::CheckoutService;
pub use wishlist::WishlistService;
