//! Inventory items and their stock levels.
//!
//! Inventory is the source of truth for stock; `Product.stock` is a copy
//! brought back in line by [`super::products::ProductService::reconcile_stock`].
//!
//! Ids are sequential codes (`RACIN0001`, ...). The next code follows the
//! numerically highest existing one, and items are created without
//! overwriting: if a concurrent add claims the same code first, the code is
//! recomputed.

use std::sync::Arc;

use chrono::Utc;
use serde::Deserialize;
use serde_json::json;

use rentacam_core::models::{InventoryItem, collections};
use rentacam_core::store::{
    Direction, Query, SharedStore, StoreError, Subscription, Updates, decode_all, encode,
    subscribe,
};
use rentacam_core::{InventoryId, next_inventory_code};

use crate::error::{AppError, Result};

/// Fields for a new inventory item.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewInventoryItem {
    pub name: String,
    #[serde(default)]
    pub stock: u32,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub image: Option<String>,
}

/// Partial update of an inventory item. Absent fields are left alone.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryPatch {
    pub name: Option<String>,
    pub stock: Option<u32>,
    pub category: Option<String>,
    pub image: Option<String>,
}

/// Codes tried before giving up when concurrent adds keep claiming them.
const ADD_ATTEMPTS: usize = 5;

/// Apply a signed delta to a stock level, clamping at zero.
#[must_use]
pub fn apply_stock_delta(current: u32, delta: i64) -> u32 {
    let next = i64::from(current).saturating_add(delta).max(0);
    u32::try_from(next).unwrap_or(u32::MAX)
}

/// Inventory operations.
pub struct InventoryService<'a> {
    store: &'a SharedStore,
}

impl<'a> InventoryService<'a> {
    #[must_use]
    pub const fn new(store: &'a SharedStore) -> Self {
        Self { store }
    }

    fn by_id() -> Query {
        Query::new().order_by("id", Direction::Ascending)
    }

    /// All inventory items, ordered by code.
    ///
    /// # Errors
    ///
    /// Returns an error if the store read fails.
    pub async fn list(&self) -> Result<Vec<InventoryItem>> {
        let documents = self
            .store
            .query(collections::INVENTORY, &Self::by_id())
            .await?;
        Ok(decode_all(&documents)?)
    }

    /// A live view of the inventory list.
    #[must_use]
    pub fn subscribe(&self) -> Subscription {
        subscribe(Arc::clone(self.store), collections::INVENTORY, Self::by_id())
    }

    /// Fetch one item.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the item does not exist.
    pub async fn get(&self, id: &InventoryId) -> Result<InventoryItem> {
        let document = self
            .store
            .get(collections::INVENTORY, id.as_str())
            .await?
            .ok_or_else(|| AppError::NotFound(format!("inventory item {id}")))?;
        Ok(document.decode()?)
    }

    /// The code the next added item will receive.
    ///
    /// # Errors
    ///
    /// Returns an error if the store read fails.
    pub async fn next_id(&self) -> Result<InventoryId> {
        let existing = self.store.list(collections::INVENTORY).await?;
        let (id, fell_back) =
            next_inventory_code(existing.iter().map(|doc| doc.id.as_str()), Utc::now());
        if fell_back {
            tracing::warn!(
                existing = existing.len(),
                fallback = %id,
                "No sequential inventory code to follow, using timestamp code"
            );
        }
        Ok(id)
    }

    /// Create an item under the next sequential code.
    ///
    /// # Errors
    ///
    /// Returns a validation error for a blank name, or a store error.
    #[tracing::instrument(skip(self, new), fields(name = %new.name))]
    pub async fn add_product(&self, new: NewInventoryItem) -> Result<InventoryItem> {
        let name = new.name.trim();
        if name.is_empty() {
            return Err(AppError::validation("name", "Name is required"));
        }

        let now = Utc::now();
        let mut item = InventoryItem {
            id: InventoryId::new(""),
            name: name.to_string(),
            stock: new.stock,
            category: new.category.trim().to_string(),
            image: new.image.filter(|url| !url.trim().is_empty()),
            created_at: Some(now),
            updated_at: Some(now),
        };

        for _ in 0..ADD_ATTEMPTS {
            item.id = self.next_id().await?;
            match self
                .store
                .create(collections::INVENTORY, item.id.as_str(), encode(&item)?)
                .await
            {
                Ok(_) => {
                    tracing::info!(id = %item.id, stock = item.stock, "Inventory item added");
                    return Ok(item);
                }
                Err(StoreError::AlreadyExists { .. }) => {
                    tracing::debug!(id = %item.id, "Inventory code taken, retrying");
                }
                Err(e) => return Err(e.into()),
            }
        }
        Err(AppError::Conflict(
            "Could not allocate an inventory code, try again".to_string(),
        ))
    }

    /// Update fields of an existing item.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the item does not exist.
    #[tracing::instrument(skip(self, patch), fields(id = %id))]
    pub async fn update_product(
        &self,
        id: &InventoryId,
        patch: InventoryPatch,
    ) -> Result<InventoryItem> {
        let mut updates = Updates::new().set("updatedAt", json!(Utc::now()));
        if let Some(name) = patch.name {
            if name.trim().is_empty() {
                return Err(AppError::validation("name", "Name is required"));
            }
            updates = updates.set("name", json!(name.trim()));
        }
        if let Some(stock) = patch.stock {
            updates = updates.set("stock", json!(stock));
        }
        if let Some(category) = patch.category {
            updates = updates.set("category", json!(category.trim()));
        }
        if let Some(image) = patch.image {
            updates = updates.set("image", json!(image));
        }

        let document = self
            .store
            .update(collections::INVENTORY, id.as_str(), updates)
            .await?;
        tracing::info!("Inventory item updated");
        Ok(document.decode()?)
    }

    /// Hard-delete an item. Products pointing at it keep their reference.
    ///
    /// # Errors
    ///
    /// Returns an error if the store write fails.
    #[tracing::instrument(skip(self), fields(id = %id))]
    pub async fn delete_product(&self, id: &InventoryId) -> Result<()> {
        if self.store.delete(collections::INVENTORY, id.as_str()).await? {
            tracing::info!("Inventory item deleted");
        }
        Ok(())
    }

    /// Add `delta` to an item's stock, never going below zero.
    ///
    /// Read-modify-write of the whole document: a concurrent change to the
    /// same item between the read and the write is lost.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the item does not exist.
    #[tracing::instrument(skip(self), fields(id = %id))]
    pub async fn update_stock(&self, id: &InventoryId, delta: i64) -> Result<InventoryItem> {
        let mut item = self.get(id).await?;
        let previous = item.stock;
        item.stock = apply_stock_delta(previous, delta);
        item.updated_at = Some(Utc::now());

        self.store
            .set(collections::INVENTORY, id.as_str(), encode(&item)?)
            .await?;
        tracing::info!(previous, stock = item.stock, "Inventory stock updated");
        Ok(item)
    }
}
