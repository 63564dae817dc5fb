//! Checkout: turn the cart into an order.

use chrono::Utc;
use serde_json::json;

use rentacam_core::models::{Checkout, Pricing, collections, load_business_settings};
use rentacam_core::store::{Direction, Query, SharedStore, Updates, decode_all, encode};
use rentacam_core::{AccountStatus, CheckoutId, OrderStatus, PaymentStatus, UserUid};

use crate::error::{AppError, Result, add_breadcrumb};

use super::account::require_customer;
use super::cart::listed_lines;

pub struct CheckoutService<'a> {
    store: &'a SharedStore,
}

impl<'a> CheckoutService<'a> {
    #[must_use]
    pub const fn new(store: &'a SharedStore) -> Self {
        Self { store }
    }

    /// Place an order for everything in the cart, then empty the cart.
    ///
    /// Lines keep the daily rate they were added at; lines whose product is
    /// gone or unapproved are left out, as in the cart view. Tax comes from
    /// the business settings. The order starts pending with payment pending.
    ///
    /// # Errors
    ///
    /// Returns `BadRequest` when no orderable line is left and `Forbidden`
    /// for a suspended account.
    #[tracing::instrument(skip(self), fields(uid = %uid))]
    pub async fn place_order(&self, uid: &UserUid) -> Result<Checkout> {
        let customer = require_customer(self.store, uid).await?;
        if customer.account_status == AccountStatus::Suspended {
            return Err(AppError::Forbidden("This account has been suspended".to_string()));
        }
        let items = listed_lines(self.store, customer.cart).await?;
        if items.is_empty() {
            return Err(AppError::BadRequest("Cart is empty".to_string()));
        }

        let settings = load_business_settings(&**self.store).await?;
        let mut checkout = Checkout {
            id: CheckoutId::new(""),
            user_email: customer.email.as_str().to_string(),
            customer_id: Some(customer.id.clone()),
            pricing: Pricing::for_lines(&items, settings.tax_rate),
            items,
            status: OrderStatus::Pending,
            payment_status: PaymentStatus::Pending,
            created_at: Utc::now(),
        };

        let document = self
            .store
            .add(collections::CHECKOUTS, encode(&checkout)?)
            .await?;
        checkout.id = CheckoutId::new(document.id);

        self.store
            .update(
                collections::CUSTOMERS,
                customer.id.as_str(),
                Updates::new().set("cart", json!([])),
            )
            .await?;

        add_breadcrumb("checkout", "Order placed", Some(&[("order_id", checkout.id.as_str())]));
        tracing::info!(order_id = %checkout.id, total = %checkout.pricing.total, "Order placed");
        Ok(checkout)
    }

    /// The customer's orders, newest first.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` when the customer has no profile.
    pub async fn orders(&self, uid: &UserUid) -> Result<Vec<Checkout>> {
        let customer = require_customer(self.store, uid).await?;
        let documents = self
            .store
            .query(
                collections::CHECKOUTS,
                &Query::new()
                    .where_eq("userEmail", json!(customer.email.as_str()))
                    .order_by("createdAt", Direction::Descending),
            )
            .await?;
        Ok(decode_all(&documents)?)
    }

    /// One of the customer's orders. Other customers' orders are not found.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for unknown ids and orders of other customers.
    pub async fn order(&self, uid: &UserUid, id: &CheckoutId) -> Result<Checkout> {
        let customer = require_customer(self.store, uid).await?;
        let not_found = || AppError::NotFound(format!("order {id}"));

        let document = self
            .store
            .get(collections::CHECKOUTS, id.as_str())
            .await?
            .ok_or_else(not_found)?;
        let checkout: Checkout = document.decode()?;
        if !checkout
            .user_email
            .eq_ignore_ascii_case(customer.email.as_str())
        {
            return Err(not_found());
        }
        Ok(checkout)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use std::sync::Arc;

    use rust_decimal::Decimal;

    use super::*;
    use rentacam_core::models::settings::BUSINESS_SETTINGS_ID;
    use rentacam_core::store::MemoryStore;

    async fn seeded(cart: serde_json::Value) -> SharedStore {
        let store: SharedStore = Arc::new(MemoryStore::new());
        store
            .set(
                collections::CUSTOMERS,
                "c1",
                json!({ "firebaseUid": "u1", "email": "ana@example.com", "cart": cart }),
            )
            .await
            .unwrap();
        store
            .set(
                collections::CUSTOMERS,
                "c2",
                json!({ "firebaseUid": "u2", "email": "ben@example.com" }),
            )
            .await
            .unwrap();
        store
            .set(
                collections::PRODUCTS,
                "p1",
                json!({ "name": "Sony A7 IV", "price": "45.00", "approved": true }),
            )
            .await
            .unwrap();
        store
            .set(
                collections::BUSINESS_SETTINGS,
                BUSINESS_SETTINGS_ID,
                json!({ "taxRate": "0.10" }),
            )
            .await
            .unwrap();
        store
    }

    fn line(product: &str) -> serde_json::Value {
        json!({
            "id": "1700000000000",
            "productId": product,
            "name": "Sony A7 IV",
            "price": "45.00",
            "quantity": 2,
            "rentalDays": 3
        })
    }

    #[tokio::test]
    async fn test_place_order_prices_and_clears_cart() {
        let store = seeded(json!([line("p1")])).await;
        let service = CheckoutService::new(&store);
        let uid = UserUid::new("u1");

        let order = service.place_order(&uid).await.unwrap();
        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.payment_status, PaymentStatus::Pending);
        assert_eq!(order.pricing.subtotal, Decimal::new(27000, 2));
        assert_eq!(order.pricing.tax, Decimal::new(2700, 2));
        assert_eq!(order.pricing.total, Decimal::new(29700, 2));

        let customer = require_customer(&store, &uid).await.unwrap();
        assert!(customer.cart.is_empty());

        let orders = service.orders(&uid).await.unwrap();
        assert_eq!(orders.len(), 1);
        assert_eq!(orders[0].id, order.id);
        assert!(service.order(&uid, &order.id).await.is_ok());
        assert!(matches!(
            service.order(&UserUid::new("u2"), &order.id).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_empty_cart_is_rejected() {
        let store = seeded(json!([])).await;
        let service = CheckoutService::new(&store);
        assert!(matches!(
            service.place_order(&UserUid::new("u1")).await,
            Err(AppError::BadRequest(_))
        ));

        let store = seeded(json!([line("gone")])).await;
        let service = CheckoutService::new(&store);
        assert!(matches!(
            service.place_order(&UserUid::new("u1")).await,
            Err(AppError::BadRequest(_))
        ));
        assert!(store.list(collections::CHECKOUTS).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unavailable_lines_are_left_out_of_the_order() {
        let mut gone = line("gone");
        gone["id"] = json!("1700000000001");
        let store = seeded(json!([line("p1"), gone])).await;
        let service = CheckoutService::new(&store);

        let order = service.place_order(&UserUid::new("u1")).await.unwrap();
        assert_eq!(order.items.len(), 1);
        assert_eq!(order.items[0].product_id.as_str(), "p1");
        assert_eq!(order.pricing.subtotal, Decimal::new(27000, 2));
    }
}
