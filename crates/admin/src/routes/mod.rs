//! HTTP route handlers for admin.
//!
//! Everything is JSON under `/api`.
//!
//! # Route Structure
//!
//! ```text
//! # Auth
//! POST   /api/auth/login                  - Sign in (email + password)
//! POST   /api/auth/logout                 - Sign out
//! GET    /api/auth/me                     - Current admin
//! POST   /api/auth/password               - Change password
//!
//! # Staff (super admin only)
//! POST   /api/admins/invite               - Create account and email credentials
//! POST   /api/send-invite-email           - Send an invite email
//!
//! # Dashboard
//! GET    /api/dashboard                   - Current statistics
//! GET    /api/dashboard/stream            - Statistics as server-sent events
//!
//! # Inventory
//! GET    /api/inventory                   - List items
//! POST   /api/inventory                   - Add item (next RACIN code)
//! GET    /api/inventory/next-id           - Code the next item will get
//! GET    /api/inventory/stream            - Live list as server-sent events
//! GET    /api/inventory/{id}              - Item detail
//! PATCH  /api/inventory/{id}              - Update item
//! DELETE /api/inventory/{id}              - Delete item
//! POST   /api/inventory/{id}/stock        - Adjust stock by a delta
//!
//! # Products
//! GET    /api/products                    - List (all, filterable)
//! POST   /api/products                    - Create
//! POST   /api/products/reconcile          - Reconcile stock from inventory
//! GET    /api/products/{id}               - Detail
//! PATCH  /api/products/{id}               - Update
//! DELETE /api/products/{id}               - Delete
//! POST   /api/products/{id}/approval      - Approve / unapprove
//!
//! # Customers
//! GET    /api/customers                   - List (filterable)
//! GET    /api/customers/{id}              - Detail
//! DELETE /api/customers/{id}              - Delete
//! POST   /api/customers/{id}/status       - Suspend / reactivate
//! POST   /api/customers/{id}/verification - Mark ID verified
//!
//! # Orders
//! GET    /api/orders                      - List (filterable)
//! GET    /api/orders/{id}                 - Detail
//! PATCH  /api/orders/{id}/status          - Update status / payment status
//!
//! # Notifications
//! GET    /api/notifications               - List, newest first
//! GET    /api/notifications/unread-count  - Unread count
//! POST   /api/notifications/read-all      - Mark all read
//! POST   /api/notifications/{id}/read     - Mark one read
//! DELETE /api/notifications/{id}          - Delete
//!
//! # Settings
//! GET    /api/settings                    - Business settings
//! PUT    /api/settings                    - Update business settings
//!
//! # Uploads
//! POST   /api/uploads                     - Multipart upload (`kind`, `file`)
//! GET    /uploads/...                     - Stored files
//! ```

pub mod admins;
pub mod auth;
pub mod customers;
pub mod dashboard;
pub mod inventory;
pub mod notifications;
pub mod orders;
pub mod products;
pub mod settings;
pub mod uploads;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{delete, get, patch, post},
};

use crate::state::AppState;

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/login", post(auth::login))
        .route("/logout", post(auth::logout))
        .route("/me", get(auth::me))
        .route("/password", post(auth::change_password))
}

/// Create the inventory routes router.
pub fn inventory_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(inventory::index).post(inventory::create))
        .route("/next-id", get(inventory::next_id))
        .route("/stream", get(inventory::stream))
        .route(
            "/{id}",
            get(inventory::show)
                .patch(inventory::update)
                .delete(inventory::delete),
        )
        .route("/{id}/stock", post(inventory::adjust_stock))
}

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index).post(products::create))
        .route("/reconcile", post(products::reconcile))
        .route(
            "/{id}",
            get(products::show)
                .patch(products::update)
                .delete(products::delete),
        )
        .route("/{id}/approval", post(products::set_approval))
}

/// Create the customer routes router.
pub fn customer_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(customers::index))
        .route("/{id}", get(customers::show).delete(customers::delete))
        .route("/{id}/status", post(customers::set_status))
        .route("/{id}/verification", post(customers::set_verification))
}

/// Create the order routes router.
pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(orders::index))
        .route("/{id}", get(orders::show))
        .route("/{id}/status", patch(orders::update_status))
}

/// Create the notification routes router.
pub fn notification_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(notifications::index))
        .route("/unread-count", get(notifications::unread_count))
        .route("/read-all", post(notifications::mark_all_read))
        .route("/{id}/read", post(notifications::mark_read))
        .route("/{id}", delete(notifications::delete))
}

/// All `/api` routes.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth_routes())
        .route("/admins/invite", post(admins::invite))
        .route("/send-invite-email", post(admins::send_invite_email))
        .route("/dashboard", get(dashboard::show))
        .route("/dashboard/stream", get(dashboard::stream))
        .nest("/inventory", inventory_routes())
        .nest("/products", product_routes())
        .nest("/customers", customer_routes())
        .nest("/orders", order_routes())
        .nest("/notifications", notification_routes())
        .route("/settings", get(settings::show).put(settings::update))
        .route(
            "/uploads",
            post(uploads::upload).layer(DefaultBodyLimit::max(uploads::UPLOAD_BODY_LIMIT)),
        )
}

/// Create all routes for the admin.
pub fn routes() -> Router<AppState> {
    Router::new().nest("/api", api_routes())
}
