//! Public catalog.
//!
//! Every read here starts from `approved == true`; an unapproved product is
//! indistinguishable from a missing one.

use std::collections::{BTreeMap, BTreeSet};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::json;

use rentacam_core::models::{Product, collections};
use rentacam_core::store::{Direction, FilterOp, Query, SharedStore, decode_all};
use rentacam_core::ProductId;

use crate::error::{AppError, Result};

/// Catalog sort order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CatalogSort {
    PriceAsc,
    PriceDesc,
    #[default]
    Name,
    Newest,
}

impl CatalogSort {
    const fn order(self) -> (&'static str, Direction) {
        match self {
            Self::PriceAsc => ("price", Direction::Ascending),
            Self::PriceDesc => ("price", Direction::Descending),
            Self::Name => ("name", Direction::Ascending),
            Self::Newest => ("createdAt", Direction::Descending),
        }
    }
}

/// Catalog filters, taken from the query string.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogFilter {
    pub category: Option<String>,
    pub sub_category: Option<String>,
    pub brand: Option<String>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
    /// Case-insensitive match on name, brand or description.
    #[serde(alias = "q")]
    pub search: Option<String>,
    #[serde(default)]
    pub sort: CatalogSort,
}

impl CatalogFilter {
    fn query(&self) -> Query {
        let (field, direction) = self.sort.order();
        let mut query = Query::new()
            .where_eq("approved", json!(true))
            .order_by(field, direction);
        if let Some(category) = non_blank(self.category.as_deref()) {
            query = query.where_eq("category", json!(category));
        }
        if let Some(sub_category) = non_blank(self.sub_category.as_deref()) {
            query = query.where_eq("subCategory", json!(sub_category));
        }
        if let Some(brand) = non_blank(self.brand.as_deref()) {
            query = query.where_eq("brand", json!(brand));
        }
        if let Some(min) = self.min_price {
            query = query.filter("price", FilterOp::Ge, json!(min));
        }
        if let Some(max) = self.max_price {
            query = query.filter("price", FilterOp::Le, json!(max));
        }
        query
    }

    fn matches_search(&self, product: &Product) -> bool {
        let Some(term) = non_blank(self.search.as_deref()) else {
            return true;
        };
        let term = term.to_lowercase();
        [&product.name, &product.brand, &product.description]
            .iter()
            .any(|text| text.to_lowercase().contains(&term))
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// A category with its sub-categories and listed product count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategorySummary {
    pub name: String,
    pub sub_categories: Vec<String>,
    pub product_count: usize,
}

/// Group listed products by category, alphabetically.
#[must_use]
pub fn summarize_categories(products: &[Product]) -> Vec<CategorySummary> {
    let mut groups: BTreeMap<&str, (BTreeSet<&str>, usize)> = BTreeMap::new();
    for product in products.iter().filter(|p| p.is_listed()) {
        let category = product.category.trim();
        if category.is_empty() {
            continue;
        }
        let entry = groups.entry(category).or_default();
        entry.1 += 1;
        let sub_category = product.sub_category.trim();
        if !sub_category.is_empty() {
            entry.0.insert(sub_category);
        }
    }

    groups
        .into_iter()
        .map(|(name, (subs, count))| CategorySummary {
            name: name.to_string(),
            sub_categories: subs.into_iter().map(String::from).collect(),
            product_count: count,
        })
        .collect()
}

/// Read-only access to listed products.
pub struct CatalogService<'a> {
    store: &'a SharedStore,
}

impl<'a> CatalogService<'a> {
    #[must_use]
    pub const fn new(store: &'a SharedStore) -> Self {
        Self { store }
    }

    /// Listed products matching a filter.
    ///
    /// # Errors
    ///
    /// Returns a validation error for an inverted price range.
    #[tracing::instrument(skip(self))]
    pub async fn list(&self, filter: &CatalogFilter) -> Result<Vec<Product>> {
        if let (Some(min), Some(max)) = (filter.min_price, filter.max_price)
            && min > max
        {
            return Err(AppError::validation(
                "minPrice",
                "Minimum price is above the maximum",
            ));
        }

        let documents = self
            .store
            .query(collections::PRODUCTS, &filter.query())
            .await?;
        let products: Vec<Product> = decode_all(&documents)?;
        Ok(products
            .into_iter()
            .filter(|product| product.is_listed() && filter.matches_search(product))
            .collect())
    }

    /// One listed product.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for missing and unapproved products alike.
    pub async fn get(&self, id: &ProductId) -> Result<Product> {
        let product: Option<Product> = match self.store.get(collections::PRODUCTS, id.as_str()).await?
        {
            Some(document) => Some(document.decode()?),
            None => None,
        };
        product
            .filter(Product::is_listed)
            .ok_or_else(|| AppError::NotFound(format!("product {id}")))
    }

    /// Categories of listed products.
    ///
    /// # Errors
    ///
    /// Returns an error if the store read fails.
    pub async fn categories(&self) -> Result<Vec<CategorySummary>> {
        let documents = self
            .store
            .query(
                collections::PRODUCTS,
                &Query::new().where_eq("approved", json!(true)),
            )
            .await?;
        let products: Vec<Product> = decode_all(&documents)?;
        Ok(summarize_categories(&products))
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
        for (id, name, brand, price, category, sub, approved, created) in [
            ("p1", "Sony A7 IV", "Sony", "45.00", "cameras", "mirrorless", true, "2026-09-01T00:00:00Z"),
            ("p2", "Canon R5", "Canon", "60.00", "cameras", "mirrorless", true, "2026-09-03T00:00:00Z"),
            ("p3", "Nikon D850", "Nikon", "9.50", "cameras", "dslr", true, "2026-09-02T00:00:00Z"),
            ("p4", "Prototype Lens", "Sony", "20.00", "lenses", "prime", false, "2026-09-04T00:00:00Z"),
            ("p5", "DJI RS 3", "DJI", "25.00", "stabilizers", "", true, "2026-09-05T00:00:00Z"),
        ] {
            store
                .set(
                    collections::PRODUCTS,
                    id,
                    json!({
                        "name": name,
                        "brand": brand,
                        "price": price,
                        "category": category,
                        "subCategory": sub,
                        "approved": approved,
                        "stock": 2,
                        "createdAt": created
                    }),
                )
                .await
                .unwrap();
        }
        store
    }

    fn ids(products: &[Product]) -> Vec<&str> {
        products.iter().map(|p| p.id.as_str()).collect()
    }

    #[tokio::test]
    async fn test_unapproved_never_listed() {
        let store = seeded().await;
        let service = CatalogService::new(&store);

        let all = service.list(&CatalogFilter::default()).await.unwrap();
        assert!(!ids(&all).contains(&"p4"));

        let by_brand = service
            .list(&CatalogFilter {
                brand: Some("Sony".to_string()),
                ..CatalogFilter::default()
            })
            .await
            .unwrap();
        assert_eq!(ids(&by_brand), vec!["p1"]);

        assert!(matches!(
            service.get(&ProductId::new("p4")).await,
            Err(AppError::NotFound(_))
        ));
        assert!(service.get(&ProductId::new("p1")).await.is_ok());
    }

    #[tokio::test]
    async fn test_price_sort_is_numeric() {
        let store = seeded().await;
        let service = CatalogService::new(&store);

        let cheapest_first = service
            .list(&CatalogFilter {
                category: Some("cameras".to_string()),
                sort: CatalogSort::PriceAsc,
                ..CatalogFilter::default()
            })
            .await
            .unwrap();
        assert_eq!(ids(&cheapest_first), vec!["p3", "p1", "p2"]);
    }

    #[tokio::test]
    async fn test_price_range_search_and_newest() {
        let store = seeded().await;
        let service = CatalogService::new(&store);

        let ranged = service
            .list(&CatalogFilter {
                min_price: Some(Decimal::new(20, 0)),
                max_price: Some(Decimal::new(50, 0)),
                sort: CatalogSort::Newest,
                ..CatalogFilter::default()
            })
            .await
            .unwrap();
        assert_eq!(ids(&ranged), vec!["p5", "p1"]);

        let searched = service
            .list(&CatalogFilter {
                search: Some("canon".to_string()),
                ..CatalogFilter::default()
            })
            .await
            .unwrap();
        assert_eq!(ids(&searched), vec!["p2"]);

        let inverted = service
            .list(&CatalogFilter {
                min_price: Some(Decimal::new(50, 0)),
                max_price: Some(Decimal::new(20, 0)),
                ..CatalogFilter::default()
            })
            .await;
        assert!(matches!(inverted, Err(AppError::Validation { .. })));
    }

    #[tokio::test]
    async fn test_categories() {
        let store = seeded().await;
        let categories = CatalogService::new(&store).categories().await.unwrap();

        assert_eq!(categories.len(), 2);
        assert_eq!(categories[0].name, "cameras");
        assert_eq!(categories[0].product_count, 3);
        assert_eq!(categories[0].sub_categories, vec!["dslr", "mirrorless"]);
        assert_eq!(categories[1].name, "stabilizers");
        assert!(categories[1].sub_categories.is_empty());
    }
}
