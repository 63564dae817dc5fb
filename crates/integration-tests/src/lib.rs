//! End-to-end test harness for RentACam.
//!
//! [`TestContext::start`] serves the storefront and the admin on ephemeral
//! ports over one shared in-memory document store, the same way production
//! runs both binaries against one database. Tests then drive the public
//! HTTP APIs with cookie-holding `reqwest` clients.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p rentacam-integration-tests
//! ```
//!
//! No database or external service is needed.

#![allow(clippy::missing_panics_doc, clippy::unwrap_used)]

use std::future::{Future, IntoFuture};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use reqwest::{Client, StatusCode};
use serde_json::{Value, json};
use tempfile::TempDir;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use rentacam_admin::config::AdminConfig;
use rentacam_admin::services::{AdminAuthService, LogMailer, NewAdmin, spawn_watchers};
use rentacam_core::AdminRole;
use rentacam_core::models::collections;
use rentacam_core::store::{MemoryStore, SharedStore};
use rentacam_storefront::config::StorefrontConfig;

/// Password used for every account the harness creates.
pub const PASSWORD: &str = "correct-horse-battery";

/// Both servers plus the store behind them.
pub struct TestContext {
    pub store: SharedStore,
    pub storefront_url: String,
    pub admin_url: String,
    _upload_dir: TempDir,
    _tasks: Vec<JoinHandle<()>>,
}

async fn serve(router: Router) -> (String, JoinHandle<()>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = axum::serve(
        listener,
        router.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .into_future();
    let handle = tokio::spawn(async move {
        let _ = server.await;
    });
    (format!("http://{addr}"), handle)
}

impl TestContext {
    /// Start both servers and the notification watchers.
    pub async fn start() -> Self {
        let store: SharedStore = Arc::new(MemoryStore::new());
        let upload_dir = tempfile::tempdir().unwrap();

        let mut tasks = spawn_watchers(&store);

        let admin_state = rentacam_admin::state::AppState::new(
            AdminConfig::for_local(upload_dir.path().to_path_buf()),
            store.clone(),
            None,
            Arc::new(LogMailer),
        );
        let (admin_url, admin_task) = serve(rentacam_admin::app(
            admin_state,
            tower_sessions::MemoryStore::default(),
        ))
        .await;
        tasks.push(admin_task);

        let storefront_state = rentacam_storefront::state::AppState::new(
            StorefrontConfig::for_local(),
            store.clone(),
            None,
        );
        let (storefront_url, storefront_task) = serve(rentacam_storefront::app(
            storefront_state,
            tower_sessions::MemoryStore::default(),
        ))
        .await;
        tasks.push(storefront_task);

        Self {
            store,
            storefront_url,
            admin_url,
            _upload_dir: upload_dir,
            _tasks: tasks,
        }
    }

    /// A client that keeps session cookies.
    #[must_use]
    pub fn client() -> Client {
        Client::builder().cookie_store(true).build().unwrap()
    }

    #[must_use]
    pub fn storefront(&self, path: &str) -> String {
        format!("{}{path}", self.storefront_url)
    }

    #[must_use]
    pub fn admin(&self, path: &str) -> String {
        format!("{}{path}", self.admin_url)
    }

    /// Register a customer on the storefront and return its signed-in client
    /// and the registration response body.
    pub async fn register_customer(&self, email: &str, full_name: &str) -> (Client, Value) {
        let client = Self::client();
        let response = client
            .post(self.storefront("/api/auth/register"))
            .json(&json!({ "email": email, "password": PASSWORD, "fullName": full_name }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let body = response.json().await.unwrap();
        (client, body)
    }

    /// Create a staff account directly in the store and sign it in.
    pub async fn admin_client(&self, email: &str, role: AdminRole) -> Client {
        AdminAuthService::new(&self.store)
            .create_admin(NewAdmin {
                email: email.to_string(),
                name: "Test Staff".to_string(),
                role,
                password: PASSWORD.to_string(),
                employee_id: None,
                invited_by: None,
                must_change_password: false,
            })
            .await
            .unwrap();

        let client = Self::client();
        let response = client
            .post(self.admin("/api/auth/login"))
            .json(&json!({ "email": email, "password": PASSWORD }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        client
    }

    /// Write an approved product backed by an inventory item.
    pub async fn seed_product(&self, id: &str, name: &str, price: &str, stock: u32) {
        let inventory_id = format!("RACIN-{id}");
        self.store
            .set(
                collections::INVENTORY,
                &inventory_id,
                json!({ "name": name, "stock": stock, "category": "cameras" }),
            )
            .await
            .unwrap();
        self.store
            .set(
                collections::PRODUCTS,
                id,
                json!({
                    "name": name,
                    "brand": "Sony",
                    "price": price,
                    "category": "cameras",
                    "subCategory": "mirrorless",
                    "stock": stock,
                    "approved": true,
                    "inventoryId": inventory_id
                }),
            )
            .await
            .unwrap();
    }
}

/// Poll `check` until it yields a value or about five seconds pass.
pub async fn eventually<T, F, Fut>(mut check: F) -> Option<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Option<T>>,
{
    for _ in 0..100 {
        if let Some(value) = check().await {
            return Some(value);
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    None
}
