//! Order (checkout) management.

use serde::Deserialize;
use serde_json::json;

use rentacam_core::models::{Checkout, collections};
use rentacam_core::store::{Direction, Query, SharedStore, Updates, decode_all};
use rentacam_core::{CheckoutId, OrderStatus, PaymentStatus};

use crate::error::{AppError, Result};

/// Filters for the order list.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderFilter {
    pub status: Option<OrderStatus>,
    pub payment_status: Option<PaymentStatus>,
    pub limit: Option<usize>,
}

/// Status change for an order. At least one field must be set.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderStatusUpdate {
    pub status: Option<OrderStatus>,
    pub payment_status: Option<PaymentStatus>,
}

pub struct OrderService<'a> {
    store: &'a SharedStore,
}

impl<'a> OrderService<'a> {
    #[must_use]
    pub const fn new(store: &'a SharedStore) -> Self {
        Self { store }
    }

    /// Orders matching a filter, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the store read fails.
    pub async fn list(&self, filter: &OrderFilter) -> Result<Vec<Checkout>> {
        let mut query = Query::new().order_by("createdAt", Direction::Descending);
        if let Some(status) = filter.status {
            query = query.where_eq("status", json!(status));
        }
        if let Some(payment_status) = filter.payment_status {
            query = query.where_eq("paymentStatus", json!(payment_status));
        }
        if let Some(limit) = filter.limit {
            query = query.limit(limit);
        }
        let documents = self.store.query(collections::CHECKOUTS, &query).await?;
        Ok(decode_all(&documents)?)
    }

    /// Fetch one order.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the order does not exist.
    pub async fn get(&self, id: &CheckoutId) -> Result<Checkout> {
        let document = self
            .store
            .get(collections::CHECKOUTS, id.as_str())
            .await?
            .ok_or_else(|| AppError::NotFound(format!("order {id}")))?;
        Ok(document.decode()?)
    }

    /// Change an order's status and/or payment status.
    ///
    /// # Errors
    ///
    /// Returns `BadRequest` for an empty update and `NotFound` if the order
    /// does not exist.
    #[tracing::instrument(skip(self), fields(id = %id))]
    pub async fn update_status(
        &self,
        id: &CheckoutId,
        change: &OrderStatusUpdate,
    ) -> Result<Checkout> {
        let mut updates = Updates::new();
        if let Some(status) = change.status {
            updates = updates.set("status", json!(status));
        }
        if let Some(payment_status) = change.payment_status {
            updates = updates.set("paymentStatus", json!(payment_status));
        }
        if updates.is_empty() {
            return Err(AppError::BadRequest(
                "Provide status or paymentStatus".to_string(),
            ));
        }

        let document = self
            .store
            .update(collections::CHECKOUTS, id.as_str(), updates)
            .await?;
        tracing::info!(status = ?change.status, payment_status = ?change.payment_status, "Order status updated");
        Ok(document.decode()?)
    }
}
