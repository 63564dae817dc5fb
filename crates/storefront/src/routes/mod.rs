//! HTTP route handlers for the storefront.
//!
//! Everything is JSON under `/api`.
//!
//! # Route Structure
//!
//! ```text
//! # Auth
//! POST   /api/auth/register             - Create identity and customer profile
//! POST   /api/auth/login                - Sign in (email + password)
//! POST   /api/auth/logout               - Sign out
//! GET    /api/auth/me                   - Current customer identity
//!
//! # Catalog
//! GET    /api/products                  - Approved products (filter, sort)
//! GET    /api/products/{id}             - Product detail
//! GET    /api/categories                - Categories with sub-categories
//!
//! # Cart
//! GET    /api/cart                      - Cart with totals
//! DELETE /api/cart                      - Empty the cart
//! POST   /api/cart/items                - Add (or re-set quantity of) an item
//! PATCH  /api/cart/items/{line_id}      - Set a line's quantity
//! DELETE /api/cart/items/{line_id}      - Remove a line
//!
//! # Wishlist
//! GET    /api/wishlist                  - Wishlist products
//! POST   /api/wishlist/{product_id}     - Toggle a product
//!
//! # Checkout
//! POST   /api/checkout                  - Place an order from the cart
//! GET    /api/orders                    - Order history
//! GET    /api/orders/{id}               - Order detail
//!
//! # Account
//! GET    /api/account                   - Customer profile
//! PATCH  /api/account                   - Update name / address
//! POST   /api/account/id-verification   - Submit an ID for verification
//! ```

pub mod account;
pub mod auth;
pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod wishlist;

use axum::{
    Router,
    routing::{get, patch, post},
};

use crate::middleware::{api_rate_limiter, auth_rate_limiter};
use crate::state::AppState;

/// Create the auth routes router.
///
/// Only register and login are rate limited.
pub fn auth_routes() -> Router<AppState> {
    let limited = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .layer(auth_rate_limiter());

    Router::new()
        .merge(limited)
        .route("/logout", post(auth::logout))
        .route("/me", get(auth::me))
}

/// Create the catalog routes router.
pub fn catalog_routes() -> Router<AppState> {
    Router::new()
        .route("/products", get(catalog::index))
        .route("/products/{id}", get(catalog::show))
        .route("/categories", get(catalog::categories))
}

/// Create the cart, wishlist and checkout routes router.
pub fn shopping_routes() -> Router<AppState> {
    Router::new()
        .route("/cart", get(cart::show).delete(cart::clear))
        .route("/cart/items", post(cart::add))
        .route(
            "/cart/items/{line_id}",
            patch(cart::update).delete(cart::remove),
        )
        .route("/wishlist", get(wishlist::index))
        .route("/wishlist/{product_id}", post(wishlist::toggle))
        .route("/checkout", post(checkout::create))
        .layer(api_rate_limiter())
}

/// Create the account routes router.
pub fn account_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(account::show).patch(account::update))
        .route("/id-verification", post(account::submit_id))
}

/// All `/api` routes.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth_routes())
        .merge(catalog_routes())
        .merge(shopping_routes())
        .route("/orders", get(checkout::index))
        .route("/orders/{id}", get(checkout::show))
        .nest("/account", account_routes())
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new().nest("/api", api_routes())
}
