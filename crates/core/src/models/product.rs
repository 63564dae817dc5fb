//! Catalog products.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::{InventoryId, ProductId, ProductStatus};

/// A rentable product as listed in the catalog.
///
/// `stock` is a copy of the linked inventory item's stock, kept in sync by
/// the back office; the inventory item is authoritative.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    #[serde(default)]
    pub brand: String,
    /// Daily rental rate.
    pub price: Decimal,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub sub_category: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub stock: u32,
    /// Visible to customers.
    #[serde(default)]
    pub approved: bool,
    #[serde(default)]
    pub status: ProductStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inventory_id: Option<InventoryId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl Product {
    /// Whether customers may see and rent this product.
    #[must_use]
    pub fn is_listed(&self) -> bool {
        self.approved
    }
}
