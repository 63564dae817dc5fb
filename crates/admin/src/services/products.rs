//! Catalog product management.
//!
//! Products carry a copy of their inventory item's stock. Writes keep the
//! copy at or below the inventory level, and [`ProductService::reconcile_stock`]
//! repairs products that drifted.

use chrono::Utc;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::json;

use rentacam_core::models::{InventoryItem, Product, collections};
use rentacam_core::store::{Direction, Query, SharedStore, Updates, decode_all, encode};
use rentacam_core::{InventoryId, ProductId, ProductStatus};

use crate::error::{AppError, Result};

/// Fields for a new product.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProduct {
    pub name: String,
    #[serde(default)]
    pub brand: String,
    pub price: Decimal,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub sub_category: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub stock: u32,
    #[serde(default)]
    pub approved: bool,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub inventory_id: Option<InventoryId>,
}

/// Partial update of a product. Absent fields are left alone.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductPatch {
    pub name: Option<String>,
    pub brand: Option<String>,
    pub price: Option<Decimal>,
    pub category: Option<String>,
    pub sub_category: Option<String>,
    pub description: Option<String>,
    pub stock: Option<u32>,
    pub approved: Option<bool>,
    pub status: Option<ProductStatus>,
    pub image_url: Option<String>,
    pub inventory_id: Option<InventoryId>,
}

/// Filters for the admin product list.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductFilter {
    pub approved: Option<bool>,
    pub category: Option<String>,
    pub status: Option<ProductStatus>,
}

/// One product whose stock was changed by reconciliation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StockAdjustment {
    pub product_id: ProductId,
    pub inventory_id: InventoryId,
    pub from: u32,
    pub to: u32,
}

/// Outcome of a reconciliation run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconcileReport {
    /// Products with an inventory reference that were checked.
    pub checked: usize,
    pub adjusted: Vec<StockAdjustment>,
    /// Products pointing at an inventory item that no longer exists.
    pub missing_inventory: Vec<ProductId>,
}

/// Stock a product should have given its inventory level.
///
/// Without `force` only stock above the inventory level is lowered;
/// with `force` the copy is set equal to the inventory level.
#[must_use]
pub const fn reconciled_stock(product_stock: u32, inventory_stock: u32, force: bool) -> u32 {
    if force || product_stock > inventory_stock {
        inventory_stock
    } else {
        product_stock
    }
}

/// Product operations.
pub struct ProductService<'a> {
    store: &'a SharedStore,
}

impl<'a> ProductService<'a> {
    #[must_use]
    pub const fn new(store: &'a SharedStore) -> Self {
        Self { store }
    }

    /// Products, optionally filtered, ordered by name.
    ///
    /// # Errors
    ///
    /// Returns an error if the store read fails.
    pub async fn list(&self, filter: &ProductFilter) -> Result<Vec<Product>> {
        let mut query = Query::new().order_by("name", Direction::Ascending);
        if let Some(approved) = filter.approved {
            query = query.where_eq("approved", json!(approved));
        }
        if let Some(category) = &filter.category {
            query = query.where_eq("category", json!(category));
        }
        if let Some(status) = filter.status {
            query = query.where_eq("status", json!(status));
        }

        let documents = self.store.query(collections::PRODUCTS, &query).await?;
        Ok(decode_all(&documents)?)
    }

    /// Fetch one product.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the product does not exist.
    pub async fn get(&self, id: &ProductId) -> Result<Product> {
        let document = self
            .store
            .get(collections::PRODUCTS, id.as_str())
            .await?
            .ok_or_else(|| AppError::NotFound(format!("product {id}")))?;
        Ok(document.decode()?)
    }

    async fn inventory(&self, id: &InventoryId) -> Result<Option<InventoryItem>> {
        match self.store.get(collections::INVENTORY, id.as_str()).await? {
            Some(document) => Ok(Some(document.decode()?)),
            None => Ok(None),
        }
    }

    /// Reject a stock value above the linked inventory level.
    async fn check_stock(&self, stock: u32, inventory_id: Option<&InventoryId>) -> Result<()> {
        let Some(inventory_id) = inventory_id else {
            return Ok(());
        };
        let item = self.inventory(inventory_id).await?.ok_or_else(|| {
            AppError::validation(
                "inventoryId",
                format!("Inventory item {inventory_id} does not exist"),
            )
        })?;
        if stock > item.stock {
            return Err(AppError::validation(
                "stock",
                format!(
                    "Stock ({stock}) exceeds inventory level ({}) for {inventory_id}",
                    item.stock
                ),
            ));
        }
        Ok(())
    }

    /// Create a product. New products are unapproved unless stated otherwise.
    ///
    /// # Errors
    ///
    /// Returns a validation error for a blank name, negative price or stock
    /// above the linked inventory level.
    #[tracing::instrument(skip(self, new), fields(name = %new.name))]
    pub async fn create(&self, new: NewProduct) -> Result<Product> {
        if new.name.trim().is_empty() {
            return Err(AppError::validation("name", "Name is required"));
        }
        if new.price.is_sign_negative() {
            return Err(AppError::validation("price", "Price cannot be negative"));
        }
        self.check_stock(new.stock, new.inventory_id.as_ref()).await?;

        let mut product = Product {
            id: ProductId::new(""),
            name: new.name.trim().to_string(),
            brand: new.brand.trim().to_string(),
            price: new.price,
            category: new.category.trim().to_string(),
            sub_category: new.sub_category.trim().to_string(),
            description: new.description,
            stock: new.stock,
            approved: new.approved,
            status: ProductStatus::Active.for_stock(new.stock),
            image_url: new.image_url.filter(|url| !url.trim().is_empty()),
            inventory_id: new.inventory_id,
            created_at: Some(Utc::now()),
        };

        let document = self
            .store
            .add(collections::PRODUCTS, encode(&product)?)
            .await?;
        product.id = ProductId::new(document.id);
        tracing::info!(id = %product.id, "Product created");
        Ok(product)
    }

    /// Update fields of an existing product.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the product does not exist, or a validation error.
    #[tracing::instrument(skip(self, patch), fields(id = %id))]
    pub async fn update(&self, id: &ProductId, patch: ProductPatch) -> Result<Product> {
        let current = self.get(id).await?;
        let stock = patch.stock.unwrap_or(current.stock);
        let inventory_id = patch.inventory_id.clone().or(current.inventory_id.clone());
        if patch.stock.is_some() || patch.inventory_id.is_some() {
            self.check_stock(stock, inventory_id.as_ref()).await?;
        }

        let mut updates = Updates::new();
        if let Some(name) = patch.name {
            if name.trim().is_empty() {
                return Err(AppError::validation("name", "Name is required"));
            }
            updates = updates.set("name", json!(name.trim()));
        }
        if let Some(price) = patch.price {
            if price.is_sign_negative() {
                return Err(AppError::validation("price", "Price cannot be negative"));
            }
            updates = updates.set("price", json!(price));
        }
        for (field, value) in [
            ("brand", patch.brand),
            ("category", patch.category),
            ("subCategory", patch.sub_category),
            ("description", patch.description),
            ("imageUrl", patch.image_url),
        ] {
            if let Some(value) = value {
                updates = updates.set(field, json!(value.trim()));
            }
        }
        if let Some(approved) = patch.approved {
            updates = updates.set("approved", json!(approved));
        }
        if let Some(inventory_id) = patch.inventory_id {
            updates = updates.set("inventoryId", json!(inventory_id));
        }
        if let Some(stock) = patch.stock {
            updates = updates.set("stock", json!(stock));
        }
        let status = patch.status.unwrap_or(current.status).for_stock(stock);
        updates = updates.set("status", json!(status));

        let document = self
            .store
            .update(collections::PRODUCTS, id.as_str(), updates)
            .await?;
        tracing::info!("Product updated");
        Ok(document.decode()?)
    }

    /// Show or hide a product in the storefront.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the product does not exist.
    #[tracing::instrument(skip(self), fields(id = %id))]
    pub async fn set_approved(&self, id: &ProductId, approved: bool) -> Result<Product> {
        let document = self
            .store
            .update(
                collections::PRODUCTS,
                id.as_str(),
                Updates::new().set("approved", json!(approved)),
            )
            .await?;
        tracing::info!(approved, "Product approval changed");
        Ok(document.decode()?)
    }

    /// Hard-delete a product. Carts and wishlists keep the dangling id.
    ///
    /// # Errors
    ///
    /// Returns an error if the store write fails.
    #[tracing::instrument(skip(self), fields(id = %id))]
    pub async fn delete(&self, id: &ProductId) -> Result<()> {
        if self.store.delete(collections::PRODUCTS, id.as_str()).await? {
            tracing::info!("Product deleted");
        }
        Ok(())
    }

    /// Bring every product's stock copy back in line with its inventory item.
    ///
    /// # Errors
    ///
    /// Returns an error if a store read or write fails.
    #[tracing::instrument(skip(self))]
    pub async fn reconcile_stock(&self, force: bool) -> Result<ReconcileReport> {
        let products: Vec<Product> = decode_all(&self.store.list(collections::PRODUCTS).await?)?;
        let mut report = ReconcileReport::default();

        for product in products {
            let Some(inventory_id) = product.inventory_id.clone() else {
                continue;
            };
            report.checked += 1;

            let Some(item) = self.inventory(&inventory_id).await? else {
                tracing::warn!(product = %product.id, inventory = %inventory_id, "Product references missing inventory item");
                report.missing_inventory.push(product.id);
                continue;
            };

            let target = reconciled_stock(product.stock, item.stock, force);
            if target == product.stock {
                continue;
            }

            let updates = Updates::new()
                .set("stock", json!(target))
                .set("status", json!(product.status.for_stock(target)));
            self.store
                .update(collections::PRODUCTS, product.id.as_str(), updates)
                .await?;

            report.adjusted.push(StockAdjustment {
                product_id: product.id,
                inventory_id,
                from: product.stock,
                to: target,
            });
        }

        tracing::info!(
            checked = report.checked,
            adjusted = report.adjusted.len(),
            missing = report.missing_inventory.len(),
            force,
            "Stock reconciliation finished"
        );
        Ok(report)
    }
}
