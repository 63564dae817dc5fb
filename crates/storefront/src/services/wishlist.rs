//! Wishlist: product ids on the customer document.
//!
//! Membership changes use the store's atomic array union/remove, so
//! concurrent toggles of different products never overwrite each other.
//! An identity without a customer document has no wishlist; changes to it
//! are silently ignored.

use serde_json::json;

use rentacam_core::models::{Customer, Product, collections};
use rentacam_core::store::{SharedStore, Updates};
use rentacam_core::{ProductId, UserUid};

use crate::error::Result;

use super::account::find_customer;

pub struct WishlistService<'a> {
    store: &'a SharedStore,
}

impl<'a> WishlistService<'a> {
    #[must_use]
    pub const fn new(store: &'a SharedStore) -> Self {
        Self { store }
    }

    /// Add or remove a product id.
    ///
    /// Returns the new wishlist, or `None` when the identity has no
    /// customer document (nothing is written).
    ///
    /// # Errors
    ///
    /// Returns an error if the store read or write fails.
    #[tracing::instrument(skip(self), fields(uid = %uid, product_id = %product_id))]
    pub async fn toggle(
        &self,
        uid: &UserUid,
        product_id: &ProductId,
    ) -> Result<Option<Vec<ProductId>>> {
        let Some(customer) = find_customer(self.store, uid).await? else {
            tracing::debug!("No customer document, wishlist toggle ignored");
            return Ok(None);
        };

        let value = vec![json!(product_id.as_str())];
        let updates = if customer.wishlist.contains(product_id) {
            Updates::new().array_remove("wishlist", value)
        } else {
            Updates::new().array_union("wishlist", value)
        };

        let document = self
            .store
            .update(collections::CUSTOMERS, customer.id.as_str(), updates)
            .await?;
        let wishlist = document.decode::<Customer>()?.wishlist;
        Ok(Some(wishlist))
    }

    /// The wishlist's products. Ids of deleted or unapproved products are
    /// skipped.
    ///
    /// # Errors
    ///
    /// Returns an error if a store read fails.
    pub async fn products(&self, uid: &UserUid) -> Result<Vec<Product>> {
        let Some(customer) = find_customer(self.store, uid).await? else {
            return Ok(Vec::new());
        };

        let mut products = Vec::with_capacity(customer.wishlist.len());
        for id in &customer.wishlist {
            let Some(document) = self.store.get(collections::PRODUCTS, id.as_str()).await? else {
                tracing::debug!(product_id = %id, "Dangling wishlist entry");
                continue;
            };
            let product: Product = document.decode()?;
            if product.is_listed() {
                products.push(product);
            }
        }
        Ok(products)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use rentacam_core::store::MemoryStore;

    async fn seeded() -> SharedStore {
        let store: SharedStore = Arc::new(MemoryStore::new());
        store
            .set(
                collections::CUSTOMERS,
                "c1",
                json!({
                    "firebaseUid": "u1",
                    "email": "ana@example.com",
                    "wishlist": ["p1"]
                }),
            )
            .await
            .unwrap();
        for (id, approved) in [("p1", true), ("p2", true), ("p3", false)] {
            store
                .set(
                    collections::PRODUCTS,
                    id,
                    json!({ "name": id, "price": "10", "approved": approved }),
                )
                .await
                .unwrap();
        }
        store
    }

    #[tokio::test]
    async fn test_toggle_twice_restores_wishlist() {
        let store = seeded().await;
        let wishlist = WishlistService::new(&store);
        let uid = UserUid::new("u1");
        let p2 = ProductId::new("p2");

        let after_add = wishlist.toggle(&uid, &p2).await.unwrap().unwrap();
        assert_eq!(after_add, vec![ProductId::new("p1"), p2.clone()]);

        let after_remove = wishlist.toggle(&uid, &p2).await.unwrap().unwrap();
        assert_eq!(after_remove, vec![ProductId::new("p1")]);
    }

    #[tokio::test]
    async fn test_no_customer_is_silent_no_op() {
        let store = seeded().await;
        let wishlist = WishlistService::new(&store);

        let result = wishlist
            .toggle(&UserUid::new("ghost"), &ProductId::new("p1"))
            .await
            .unwrap();
        assert!(result.is_none());
        assert!(wishlist.products(&UserUid::new("ghost")).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_products_skip_dangling_and_unapproved() {
        let store = seeded().await;
        let wishlist = WishlistService::new(&store);
        let uid = UserUid::new("u1");

        wishlist.toggle(&uid, &ProductId::new("p3")).await.unwrap();
        wishlist.toggle(&uid, &ProductId::new("deleted")).await.unwrap();

        let products = wishlist.products(&uid).await.unwrap();
        assert_eq!(products.len(), 1);
        assert_eq!(products[0].id.as_str(), "p1");
    }
}
