//! Live dashboard statistics.
//!
//! Three background tasks follow `checkouts`, `users` and `products` and
//! each rewrites its own slice of a shared [`DashboardStats`] whenever its
//! collection changes. Slices update independently, so for a moment after a
//! checkout the order count can move before the product counts do.

use std::time::Duration;

use chrono::{DateTime, Days, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use rentacam_core::models::{Checkout, Product, collections, load_business_settings};
use rentacam_core::store::{Document, Query, SharedStore, Subscription, subscribe};
use rentacam_core::{OrderStatus, PaymentStatus};

/// Days covered by [`OrderStats::daily`], today included.
pub const DAILY_BUCKETS: u64 = 7;

const RETRY_DELAY: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyOrders {
    pub date: NaiveDate,
    pub orders: usize,
    pub revenue: Decimal,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderStats {
    pub total_orders: usize,
    pub pending: usize,
    pub completed: usize,
    pub cancelled: usize,
    /// Revenue of every order that is not cancelled.
    pub total_revenue: Decimal,
    pub paid_revenue: Decimal,
    pub pending_revenue: Decimal,
    pub today_orders: usize,
    pub today_revenue: Decimal,
    /// Oldest first.
    pub daily: Vec<DailyOrders>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserStats {
    pub total_users: usize,
    pub new_today: usize,
    /// Sign-ups in the last seven days.
    pub new_this_week: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductStats {
    pub total: usize,
    pub approved: usize,
    pub low_stock: usize,
    pub out_of_stock: usize,
}

/// Everything the dashboard shows.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub orders: OrderStats,
    pub users: UserStats,
    pub products: ProductStats,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Order slice for a set of checkouts.
#[must_use]
pub fn order_stats(checkouts: &[Checkout], now: DateTime<Utc>) -> OrderStats {
    let today = now.date_naive();
    let first_day = today
        .checked_sub_days(Days::new(DAILY_BUCKETS - 1))
        .unwrap_or(today);
    let mut daily: Vec<DailyOrders> = first_day
        .iter_days()
        .take_while(|day| *day <= today)
        .map(|date| DailyOrders {
            date,
            ..DailyOrders::default()
        })
        .collect();

    let mut stats = OrderStats::default();
    for checkout in checkouts {
        stats.total_orders += 1;
        match checkout.status {
            OrderStatus::Pending => stats.pending += 1,
            OrderStatus::Completed => stats.completed += 1,
            OrderStatus::Cancelled => stats.cancelled += 1,
        }

        let day = checkout.created_at.date_naive();
        let counts = checkout.status != OrderStatus::Cancelled;
        let total = checkout.pricing.total;

        if day == today {
            stats.today_orders += 1;
        }
        if let Some(bucket) = daily.iter_mut().find(|bucket| bucket.date == day) {
            bucket.orders += 1;
            if counts {
                bucket.revenue += total;
            }
        }
        if !counts {
            continue;
        }

        stats.total_revenue += total;
        match checkout.payment_status {
            PaymentStatus::Paid => stats.paid_revenue += total,
            PaymentStatus::Pending => stats.pending_revenue += total,
        }
        if day == today {
            stats.today_revenue += total;
        }
    }

    stats.daily = daily;
    stats
}

/// User slice from sign-up times. Users without a readable `createdAt`
/// count toward the total only.
#[must_use]
pub fn user_stats(created: &[Option<DateTime<Utc>>], now: DateTime<Utc>) -> UserStats {
    let today = now.date_naive();
    let week_ago = now - chrono::Duration::days(7);
    UserStats {
        total_users: created.len(),
        new_today: created
            .iter()
            .flatten()
            .filter(|at| at.date_naive() == today)
            .count(),
        new_this_week: created.iter().flatten().filter(|at| **at > week_ago).count(),
    }
}

/// Product slice. Low stock means `0 < stock <= threshold`.
#[must_use]
pub fn product_stats(products: &[Product], low_stock_threshold: u32) -> ProductStats {
    ProductStats {
        total: products.len(),
        approved: products.iter().filter(|p| p.approved).count(),
        low_stock: products
            .iter()
            .filter(|p| p.stock > 0 && p.stock <= low_stock_threshold)
            .count(),
        out_of_stock: products.iter().filter(|p| p.stock == 0).count(),
    }
}

/// Decode what can be decoded, skipping malformed documents.
fn decode_lenient<T: serde::de::DeserializeOwned>(documents: &[Document]) -> Vec<T> {
    documents
        .iter()
        .filter_map(|document| match document.decode() {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(id = %document.id, error = %e, "Skipping malformed document in dashboard");
                None
            }
        })
        .collect()
}

fn created_at(document: &Document) -> Option<DateTime<Utc>> {
    document
        .field("createdAt")
        .cloned()
        .and_then(|value: Value| serde_json::from_value(value).ok())
}

/// Running dashboard tasks and the channel they publish to.
pub struct Dashboard {
    receiver: watch::Receiver<DashboardStats>,
    tasks: Vec<JoinHandle<()>>,
}

impl Dashboard {
    /// Start the three collection followers.
    #[must_use]
    pub fn start(store: &SharedStore) -> Self {
        let (sender, receiver) = watch::channel(DashboardStats::default());

        let tasks = vec![
            tokio::spawn(follow_orders(
                subscribe(store.clone(), collections::CHECKOUTS, Query::new()),
                sender.clone(),
            )),
            tokio::spawn(follow_users(
                subscribe(store.clone(), collections::USERS, Query::new()),
                sender.clone(),
            )),
            tokio::spawn(follow_products(
                store.clone(),
                subscribe(store.clone(), collections::PRODUCTS, Query::new()),
                sender,
            )),
        ];

        tracing::info!("Dashboard statistics started");
        Self { receiver, tasks }
    }

    /// A receiver that sees every published update.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<DashboardStats> {
        self.receiver.clone()
    }

    /// The latest statistics.
    #[must_use]
    pub fn current(&self) -> DashboardStats {
        self.receiver.borrow().clone()
    }
}

impl Drop for Dashboard {
    fn drop(&mut self) {
        for task in &self.tasks {
            task.abort();
        }
    }
}

/// Next document set of a subscription, retrying after read errors.
/// `None` once the change feed is gone.
async fn next_documents(subscription: &mut Subscription) -> Option<Vec<Document>> {
    loop {
        match subscription.next().await {
            Ok(Some(snapshot)) => return Some(snapshot.documents),
            Ok(None) => {
                tracing::info!(collection = subscription.collection(), "Dashboard feed closed");
                return None;
            }
            Err(e) => {
                tracing::warn!(collection = subscription.collection(), error = %e, "Dashboard subscription failed, retrying");
                tokio::time::sleep(RETRY_DELAY).await;
            }
        }
    }
}

async fn follow_orders(mut subscription: Subscription, sender: watch::Sender<DashboardStats>) {
    while let Some(documents) = next_documents(&mut subscription).await {
        let now = Utc::now();
        let slice = order_stats(&decode_lenient::<Checkout>(&documents), now);
        sender.send_modify(|stats| {
            stats.orders = slice;
            stats.updated_at = Some(now);
        });
    }
}

async fn follow_users(mut subscription: Subscription, sender: watch::Sender<DashboardStats>) {
    while let Some(documents) = next_documents(&mut subscription).await {
        let now = Utc::now();
        let created: Vec<_> = documents.iter().map(created_at).collect();
        let slice = user_stats(&created, now);
        sender.send_modify(|stats| {
            stats.users = slice;
            stats.updated_at = Some(now);
        });
    }
}

async fn follow_products(
    store: SharedStore,
    mut subscription: Subscription,
    sender: watch::Sender<DashboardStats>,
) {
    while let Some(documents) = next_documents(&mut subscription).await {
        let threshold = match load_business_settings(&*store).await {
            Ok(settings) => settings.low_stock_threshold,
            Err(e) => {
                tracing::warn!(error = %e, "Could not load settings, using default low-stock threshold");
                rentacam_core::models::settings::DEFAULT_LOW_STOCK_THRESHOLD
            }
        };
        let slice = product_stats(&decode_lenient::<Product>(&documents), threshold);
        sender.send_modify(|stats| {
            stats.products = slice;
            stats.updated_at = Some(Utc::now());
        });
    }
}
