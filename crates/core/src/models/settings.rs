//! Store-wide business settings.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::store::{DocumentStore, StoreResult};
use crate::types::CurrencyCode;

use super::collections;

/// Id of the single settings document.
pub const BUSINESS_SETTINGS_ID: &str = "store";

/// Default low-stock threshold.
pub const DEFAULT_LOW_STOCK_THRESHOLD: u32 = 5;

/// Business settings (`businessSettings/store`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BusinessSettings {
    pub store_name: String,
    /// Sales tax as a fraction (`0.08` = 8%).
    pub tax_rate: Decimal,
    pub low_stock_threshold: u32,
    pub currency: CurrencyCode,
}

impl Default for BusinessSettings {
    fn default() -> Self {
        Self {
            store_name: "RentACam".to_owned(),
            tax_rate: Decimal::ZERO,
            low_stock_threshold: DEFAULT_LOW_STOCK_THRESHOLD,
            currency: CurrencyCode::default(),
        }
    }
}

/// Read the settings document, falling back to defaults when it is absent.
///
/// # Errors
///
/// Returns an error if the store read fails or the document is malformed.
pub async fn load_business_settings(store: &dyn DocumentStore) -> StoreResult<BusinessSettings> {
    match store
        .get(collections::BUSINESS_SETTINGS, BUSINESS_SETTINGS_ID)
        .await?
    {
        Some(document) => Ok(serde_json::from_value(document.data)?),
        None => Ok(BusinessSettings::default()),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_load_without_document_uses_defaults() {
        let store = crate::store::MemoryStore::new();
        let settings = load_business_settings(&store).await.unwrap();
        assert_eq!(settings, BusinessSettings::default());

        store
            .set(
                collections::BUSINESS_SETTINGS,
                BUSINESS_SETTINGS_ID,
                json!({ "lowStockThreshold": 2 }),
            )
            .await
            .unwrap();
        let settings = load_business_settings(&store).await.unwrap();
        assert_eq!(settings.low_stock_threshold, 2);
    }

    #[test]
    fn test_partial_document_uses_defaults() {
        let settings: BusinessSettings =
            serde_json::from_value(json!({ "taxRate": "0.07" })).unwrap();
        assert_eq!(settings.tax_rate, Decimal::new(7, 2));
        assert_eq!(settings.low_stock_threshold, DEFAULT_LOW_STOCK_THRESHOLD);
        assert_eq!(settings.store_name, "RentACam");
    }
}
