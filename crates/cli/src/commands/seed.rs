//! Seed the catalog from a YAML file.
//!
//! ```yaml
//! products:
//!   - name: Sony A7 IV
//!     brand: Sony
//!     price: "45.00"
//!     category: cameras
//!     subCategory: mirrorless
//!     stock: 3
//!     approved: true
//! ```
//!
//! Each product without an `inventoryId` gets a new inventory item holding
//! its stock. Products whose name already exists are skipped, so the same
//! file can be applied twice.

use std::collections::HashSet;
use std::path::Path;

use serde::Deserialize;
use tracing::info;

use rentacam_admin::error::AppError;
use rentacam_admin::services::inventory::NewInventoryItem;
use rentacam_admin::services::products::{NewProduct, ProductFilter};
use rentacam_admin::services::{InventoryService, ProductService};
use rentacam_core::store::SharedStore;

use super::connect;

/// Top-level shape of a catalog file.
#[derive(Debug, Deserialize)]
pub struct CatalogFile {
    #[serde(default)]
    pub products: Vec<NewProduct>,
}

/// What a seeding run did.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub products_created: usize,
    pub inventory_created: usize,
    /// Names of products that already existed.
    pub skipped: Vec<String>,
}

/// Create the catalog's products and their inventory items.
///
/// # Errors
///
/// Returns the first validation or store error; products created before it
/// stay in place.
pub async fn seed_catalog(store: &SharedStore, catalog: CatalogFile) -> Result<SeedReport, AppError> {
    let products = ProductService::new(store);
    let inventory = InventoryService::new(store);

    let mut known: HashSet<String> = products
        .list(&ProductFilter::default())
        .await?
        .into_iter()
        .map(|product| product.name.trim().to_lowercase())
        .collect();
    let mut report = SeedReport::default();

    for mut product in catalog.products {
        let key = product.name.trim().to_lowercase();
        if !known.insert(key) {
            info!(name = %product.name, "Product exists, skipping");
            report.skipped.push(product.name);
            continue;
        }

        if product.inventory_id.is_none() {
            let item = inventory
                .add_product(NewInventoryItem {
                    name: product.name.clone(),
                    stock: product.stock,
                    category: product.category.clone(),
                    image: product.image_url.clone(),
                })
                .await?;
            product.inventory_id = Some(item.id);
            report.inventory_created += 1;
        }

        products.create(product).await?;
        report.products_created += 1;
    }

    Ok(report)
}

/// Seed from a file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed, `DATABASE_URL` is
/// missing, or a product fails validation.
pub async fn run(path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    if !path.exists() {
        return Err(format!("File not found: {}", path.display()).into());
    }

    info!(path = %path.display(), "Loading catalog from file");

    // Parse before connecting so a broken file fails fast
    let content = tokio::fs::read_to_string(path).await?;
    let catalog: CatalogFile = serde_yaml::from_str(&content)?;
    info!(products = catalog.products.len(), "Parsed catalog");

    let store = connect().await?;
    let report = seed_catalog(&store, catalog).await?;

    info!("Seeding complete!");
    info!("  Products created: {}", report.products_created);
    info!("  Inventory items created: {}", report.inventory_created);
    info!("  Products skipped (already exist): {}", report.skipped.len());

    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use std::sync::Arc;

    use rust_decimal::Decimal;

    use super::*;
    use rentacam_core::models::{InventoryItem, Product, collections};
    use rentacam_core::store::{MemoryStore, decode_all};

    const CATALOG: &str = r#"
products:
  - name: Sony A7 IV
    brand: Sony
    price: "45.00"
    category: cameras
    subCategory: mirrorless
    stock: 3
    approved: true
  - name: DJI Mini 4 Pro
    brand: DJI
    price: "30.00"
    category: drones
    stock: 1
"#;

    fn parse() -> CatalogFile {
        serde_yaml::from_str(CATALOG).unwrap()
    }

    #[tokio::test]
    async fn test_seed_creates_products_with_inventory() {
        let store: SharedStore = Arc::new(MemoryStore::new());

        let report = seed_catalog(&store, parse()).await.unwrap();
        assert_eq!(report.products_created, 2);
        assert_eq!(report.inventory_created, 2);

        let items: Vec<InventoryItem> =
            decode_all(&store.list(collections::INVENTORY).await.unwrap()).unwrap();
        assert_eq!(items.len(), 2);

        let products: Vec<Product> =
            decode_all(&store.list(collections::PRODUCTS).await.unwrap()).unwrap();
        let sony = products.iter().find(|p| p.name == "Sony A7 IV").unwrap();
        assert_eq!(sony.price, Decimal::new(4500, 2));
        assert!(sony.approved);
        let linked = items
            .iter()
            .find(|item| Some(&item.id) == sony.inventory_id.as_ref())
            .unwrap();
        assert_eq!(linked.stock, 3);
    }

    #[tokio::test]
    async fn test_seed_twice_skips_existing() {
        let store: SharedStore = Arc::new(MemoryStore::new());
        seed_catalog(&store, parse()).await.unwrap();

        let report = seed_catalog(&store, parse()).await.unwrap();
        assert_eq!(report.products_created, 0);
        assert_eq!(report.skipped.len(), 2);
        assert_eq!(store.list(collections::INVENTORY).await.unwrap().len(), 2);
    }
}
