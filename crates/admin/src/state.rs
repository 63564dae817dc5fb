//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;
use tokio::sync::watch;

use rentacam_core::store::SharedStore;

use crate::config::AdminConfig;
use crate::services::dashboard::{Dashboard, DashboardStats};
use crate::services::email::Mailer;

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: AdminConfig,
    store: SharedStore,
    pool: Option<PgPool>,
    mailer: Arc<dyn Mailer>,
    dashboard: Dashboard,
}

impl AppState {
    /// Create the state and start the dashboard followers.
    ///
    /// Must be called inside a Tokio runtime.
    #[must_use]
    pub fn new(
        config: AdminConfig,
        store: SharedStore,
        pool: Option<PgPool>,
        mailer: Arc<dyn Mailer>,
    ) -> Self {
        let dashboard = Dashboard::start(&store);
        Self {
            inner: Arc::new(AppStateInner {
                config,
                store,
                pool,
                mailer,
                dashboard,
            }),
        }
    }

    #[must_use]
    pub fn config(&self) -> &AdminConfig {
        &self.inner.config
    }

    /// The document store.
    #[must_use]
    pub fn store(&self) -> &SharedStore {
        &self.inner.store
    }

    /// The `PostgreSQL` pool, when running against a database.
    #[must_use]
    pub fn pool(&self) -> Option<&PgPool> {
        self.inner.pool.as_ref()
    }

    #[must_use]
    pub fn mailer(&self) -> &dyn Mailer {
        self.inner.mailer.as_ref()
    }

    /// Live dashboard statistics.
    #[must_use]
    pub fn dashboard(&self) -> watch::Receiver<DashboardStats> {
        self.inner.dashboard.subscribe()
    }

    /// Where invited staff sign in.
    #[must_use]
    pub fn login_url(&self) -> String {
        format!("{}/login", self.inner.config.base_url.trim_end_matches('/'))
    }
}
