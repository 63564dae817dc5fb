//! Shopping cart stored on the customer document.
//!
//! The cart is the `cart` array of `customers/{id}`. Every operation reads
//! the whole array, changes it and writes it back, so two tabs editing the
//! same cart race and the last write wins.
//!
//! Lines whose product was deleted or unapproved are dropped whenever the
//! cart is read, and the next write leaves them out.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use rentacam_core::models::{CartLine, Customer, InventoryItem, Product, collections};
use rentacam_core::store::{SharedStore, StoreResult, Updates};
use rentacam_core::{CartLineId, ProductId, UserUid, VariantId};

use crate::error::{AppError, Result};

use super::account::require_customer;

/// Item to put in the cart.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddToCart {
    pub product_id: ProductId,
    #[serde(default)]
    pub variant_id: Option<VariantId>,
    pub quantity: u32,
    #[serde(default = "one_day")]
    pub rental_days: u32,
}

const fn one_day() -> u32 {
    1
}

/// A cart line with its computed total.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLineView {
    #[serde(flatten)]
    pub line: CartLine,
    pub line_total: Decimal,
}

/// The cart as shown to the customer.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartView {
    pub lines: Vec<CartLineView>,
    pub item_count: u32,
    pub subtotal: Decimal,
}

impl CartView {
    #[must_use]
    pub fn new(lines: Vec<CartLine>) -> Self {
        let item_count = lines.iter().map(|line| line.quantity).sum();
        let subtotal = lines.iter().map(CartLine::total).sum();
        let lines = lines
            .into_iter()
            .map(|line| CartLineView {
                line_total: line.total(),
                line,
            })
            .collect();
        Self {
            lines,
            item_count,
            subtotal,
        }
    }
}

/// Line id for a new cart line: the current time in unix millis, with a
/// numeric suffix when a line added in the same millisecond already has it.
#[must_use]
pub fn new_line_id(now: DateTime<Utc>, existing: &[CartLine]) -> CartLineId {
    let base = now.timestamp_millis().to_string();
    let taken = |candidate: &str| existing.iter().any(|line| line.id.as_str() == candidate);
    if !taken(&base) {
        return CartLineId::new(base);
    }
    let mut suffix = 1_u32;
    loop {
        let candidate = format!("{base}-{suffix}");
        if !taken(&candidate) {
            return CartLineId::new(candidate);
        }
        suffix += 1;
    }
}

/// Merge an item into a cart.
///
/// A line for the same product and variant gets the new quantity (it is
/// replaced, not added to); otherwise a new line is appended.
pub fn merge_line(lines: &mut Vec<CartLine>, product: &Product, item: &AddToCart, now: DateTime<Utc>) {
    if let Some(line) = lines
        .iter_mut()
        .find(|line| line.is_same_item(&item.product_id, item.variant_id.as_ref()))
    {
        line.quantity = item.quantity;
        return;
    }

    let id = new_line_id(now, lines);
    lines.push(CartLine {
        id,
        product_id: product.id.clone(),
        variant_id: item.variant_id.clone(),
        name: product.name.clone(),
        price: product.price,
        quantity: item.quantity,
        image_url: product.image_url.clone(),
        rental_days: item.rental_days.max(1),
    });
}

/// Keep only lines whose product still exists and is listed.
///
/// # Errors
///
/// Returns an error if a product read fails.
pub async fn listed_lines(store: &SharedStore, lines: Vec<CartLine>) -> StoreResult<Vec<CartLine>> {
    let mut listed: HashMap<ProductId, bool> = HashMap::new();
    let mut kept = Vec::with_capacity(lines.len());
    for line in lines {
        let is_listed = match listed.get(&line.product_id) {
            Some(known) => *known,
            None => {
                let found = match store.get(collections::PRODUCTS, line.product_id.as_str()).await? {
                    Some(document) => document.decode::<Product>()?.is_listed(),
                    None => false,
                };
                listed.insert(line.product_id.clone(), found);
                found
            }
        };
        if is_listed {
            kept.push(line);
        } else {
            tracing::debug!(product_id = %line.product_id, line_id = %line.id, "Dropping unavailable cart line");
        }
    }
    Ok(kept)
}

/// Cart operations for the signed-in customer.
pub struct CartService<'a> {
    store: &'a SharedStore,
}

impl<'a> CartService<'a> {
    #[must_use]
    pub const fn new(store: &'a SharedStore) -> Self {
        Self { store }
    }

    /// The customer and their cart without unavailable lines.
    async fn current(&self, uid: &UserUid) -> Result<(Customer, Vec<CartLine>)> {
        let mut customer = require_customer(self.store, uid).await?;
        let lines = listed_lines(self.store, std::mem::take(&mut customer.cart)).await?;
        Ok((customer, lines))
    }

    async fn write(&self, customer: &Customer, lines: &[CartLine]) -> Result<CartView> {
        self.store
            .update(
                collections::CUSTOMERS,
                customer.id.as_str(),
                Updates::new().set_serialized("cart", &lines)?,
            )
            .await?;
        Ok(CartView::new(lines.to_vec()))
    }

    /// Listed product for a cart line.
    async fn listed_product(&self, id: &ProductId) -> Result<Product> {
        let product: Option<Product> = match self.store.get(collections::PRODUCTS, id.as_str()).await?
        {
            Some(document) => Some(document.decode()?),
            None => None,
        };
        product
            .filter(Product::is_listed)
            .ok_or_else(|| AppError::validation("productId", "This product is not available"))
    }

    /// Units available to rent. The inventory item is authoritative; the
    /// product's own copy is used only when it has no inventory link.
    async fn available(&self, product: &Product) -> Result<u32> {
        let Some(inventory_id) = &product.inventory_id else {
            return Ok(product.stock);
        };
        match self
            .store
            .get(collections::INVENTORY, inventory_id.as_str())
            .await?
        {
            Some(document) => Ok(document.decode::<InventoryItem>()?.stock),
            None => {
                tracing::warn!(product_id = %product.id, inventory_id = %inventory_id, "Product links to a missing inventory item");
                Ok(0)
            }
        }
    }

    async fn check_available(&self, product: &Product, quantity: u32) -> Result<()> {
        let available = self.available(product).await?;
        if quantity > available {
            return Err(AppError::validation(
                "quantity",
                format!("Only {available} available"),
            ));
        }
        Ok(())
    }

    /// The current cart.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` when the customer has no profile.
    pub async fn view(&self, uid: &UserUid) -> Result<CartView> {
        let (_, lines) = self.current(uid).await?;
        Ok(CartView::new(lines))
    }

    /// Add an item, or set the quantity of the matching line.
    ///
    /// # Errors
    ///
    /// Returns a validation error for a zero quantity, a product that is
    /// missing or unapproved, or a quantity above available stock.
    #[tracing::instrument(skip(self, item), fields(uid = %uid, product_id = %item.product_id, quantity = item.quantity))]
    pub async fn add_to_cart(&self, uid: &UserUid, item: AddToCart) -> Result<CartView> {
        if item.quantity < 1 {
            return Err(AppError::validation("quantity", "Quantity must be at least 1"));
        }
        let product = self.listed_product(&item.product_id).await?;
        self.check_available(&product, item.quantity).await?;

        let (customer, mut lines) = self.current(uid).await?;
        merge_line(&mut lines, &product, &item, Utc::now());

        let view = self.write(&customer, &lines).await?;
        tracing::info!(lines = view.lines.len(), "Cart updated");
        Ok(view)
    }

    /// Remove a line. Removing a line that is not there changes nothing.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` when the customer has no profile.
    #[tracing::instrument(skip(self), fields(uid = %uid))]
    pub async fn remove_from_cart(&self, uid: &UserUid, line_id: &CartLineId) -> Result<CartView> {
        let (customer, mut lines) = self.current(uid).await?;
        let before = lines.len();
        lines.retain(|line| &line.id != line_id);
        if lines.len() == before {
            return Ok(CartView::new(lines));
        }
        self.write(&customer, &lines).await
    }

    /// Set a line's quantity. Quantities below 1 are ignored; callers remove
    /// the line instead.
    ///
    /// # Errors
    ///
    /// Returns a validation error when the quantity exceeds available stock.
    #[tracing::instrument(skip(self), fields(uid = %uid))]
    pub async fn update_quantity(
        &self,
        uid: &UserUid,
        line_id: &CartLineId,
        quantity: u32,
    ) -> Result<CartView> {
        let (customer, mut lines) = self.current(uid).await?;
        if quantity < 1 {
            return Ok(CartView::new(lines));
        }

        let Some(line) = lines.iter_mut().find(|line| &line.id == line_id) else {
            return Ok(CartView::new(lines));
        };
        if quantity > line.quantity {
            let product = self.listed_product(&line.product_id).await?;
            self.check_available(&product, quantity).await?;
        }
        line.quantity = quantity;

        self.write(&customer, &lines).await
    }

    /// Empty the cart.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` when the customer has no profile.
    #[tracing::instrument(skip(self), fields(uid = %uid))]
    pub async fn clear_cart(&self, uid: &UserUid) -> Result<CartView> {
        let customer = require_customer(self.store, uid).await?;
        self.write(&customer, &[]).await
    }
}
