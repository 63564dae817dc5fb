//! Business settings (store name, tax rate, low-stock threshold, currency).

use rust_decimal::Decimal;
use serde::Deserialize;

use rentacam_core::models::settings::BUSINESS_SETTINGS_ID;
use rentacam_core::models::{BusinessSettings, collections, load_business_settings};
use rentacam_core::store::{SharedStore, encode};
use rentacam_core::CurrencyCode;

use crate::error::{AppError, Result};

/// Partial update of the settings document.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsPatch {
    pub store_name: Option<String>,
    pub tax_rate: Option<Decimal>,
    pub low_stock_threshold: Option<u32>,
    pub currency: Option<CurrencyCode>,
}

pub struct SettingsService<'a> {
    store: &'a SharedStore,
}

impl<'a> SettingsService<'a> {
    #[must_use]
    pub const fn new(store: &'a SharedStore) -> Self {
        Self { store }
    }

    /// Current settings (defaults when never saved).
    ///
    /// # Errors
    ///
    /// Returns an error if the store read fails.
    pub async fn get(&self) -> Result<BusinessSettings> {
        Ok(load_business_settings(&**self.store).await?)
    }

    /// Apply a patch and write the whole settings document.
    ///
    /// # Errors
    ///
    /// Returns a validation error for a blank store name or a tax rate
    /// outside `0..=1`.
    #[tracing::instrument(skip(self, patch))]
    pub async fn update(&self, patch: SettingsPatch) -> Result<BusinessSettings> {
        let mut settings = self.get().await?;

        if let Some(name) = patch.store_name {
            let name = name.trim();
            if name.is_empty() {
                return Err(AppError::validation("storeName", "Store name is required"));
            }
            name.clone_into(&mut settings.store_name);
        }
        if let Some(rate) = patch.tax_rate {
            if rate.is_sign_negative() || rate > Decimal::ONE {
                return Err(AppError::validation(
                    "taxRate",
                    "Tax rate must be between 0 and 1",
                ));
            }
            settings.tax_rate = rate;
        }
        if let Some(threshold) = patch.low_stock_threshold {
            settings.low_stock_threshold = threshold;
        }
        if let Some(currency) = patch.currency {
            settings.currency = currency;
        }

        self.store
            .set(
                collections::BUSINESS_SETTINGS,
                BUSINESS_SETTINGS_ID,
                encode(&settings)?,
            )
            .await?;
        tracing::info!(tax_rate = %settings.tax_rate, threshold = settings.low_stock_threshold, "Business settings updated");
        Ok(settings)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use rentacam_core::store::MemoryStore;

    #[tokio::test]
    async fn test_update_persists_and_validates() {
        let store: SharedStore = Arc::new(MemoryStore::new());
        let service = SettingsService::new(&store);

        let updated = service
            .update(SettingsPatch {
                tax_rate: Some(Decimal::new(8, 2)),
                low_stock_threshold: Some(3),
                ..SettingsPatch::default()
            })
            .await
            .unwrap();
        assert_eq!(updated.tax_rate, Decimal::new(8, 2));
        assert_eq!(service.get().await.unwrap().low_stock_threshold, 3);

        let err = service
            .update(SettingsPatch {
                tax_rate: Some(Decimal::new(15, 1)),
                ..SettingsPatch::default()
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation { ref field, .. } if field == "taxRate"));
    }
}
