//! Customer management for the back office.

use serde::Deserialize;
use serde_json::json;

use rentacam_core::models::{Customer, collections};
use rentacam_core::store::{Direction, Query, SharedStore, Updates, decode_all};
use rentacam_core::{AccountStatus, CustomerId};

use crate::error::{AppError, Result};

/// Filters for the customer list.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerFilter {
    pub account_status: Option<AccountStatus>,
    /// Only customers with a submitted but unverified ID.
    #[serde(default)]
    pub pending_verification: bool,
    /// Case-insensitive match on name or email.
    pub search: Option<String>,
}

impl CustomerFilter {
    fn matches(&self, customer: &Customer) -> bool {
        if self.pending_verification
            && !customer
                .id_verification
                .as_ref()
                .is_some_and(|verification| !verification.verified)
        {
            return false;
        }
        match self.search.as_deref().map(str::trim) {
            Some(term) if !term.is_empty() => {
                let term = term.to_lowercase();
                customer.full_name.to_lowercase().contains(&term)
                    || customer.email.as_str().to_lowercase().contains(&term)
            }
            _ => true,
        }
    }
}

/// Customer operations.
pub struct CustomerService<'a> {
    store: &'a SharedStore,
}

impl<'a> CustomerService<'a> {
    #[must_use]
    pub const fn new(store: &'a SharedStore) -> Self {
        Self { store }
    }

    /// Customers matching a filter, ordered by name.
    ///
    /// # Errors
    ///
    /// Returns an error if the store read fails.
    pub async fn list(&self, filter: &CustomerFilter) -> Result<Vec<Customer>> {
        let mut query = Query::new().order_by("fullName", Direction::Ascending);
        if let Some(status) = filter.account_status {
            query = query.where_eq("accountStatus", json!(status));
        }
        let documents = self.store.query(collections::CUSTOMERS, &query).await?;
        let customers: Vec<Customer> = decode_all(&documents)?;
        Ok(customers
            .into_iter()
            .filter(|customer| filter.matches(customer))
            .collect())
    }

    /// Fetch one customer.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the customer does not exist.
    pub async fn get(&self, id: &CustomerId) -> Result<Customer> {
        let document = self
            .store
            .get(collections::CUSTOMERS, id.as_str())
            .await?
            .ok_or_else(|| AppError::NotFound(format!("customer {id}")))?;
        Ok(document.decode()?)
    }

    /// Suspend or reactivate a customer account.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the customer does not exist.
    #[tracing::instrument(skip(self), fields(id = %id))]
    pub async fn set_account_status(
        &self,
        id: &CustomerId,
        status: AccountStatus,
    ) -> Result<Customer> {
        let document = self
            .store
            .update(
                collections::CUSTOMERS,
                id.as_str(),
                Updates::new().set("accountStatus", json!(status)),
            )
            .await?;
        tracing::info!(?status, "Customer account status changed");
        Ok(document.decode()?)
    }

    /// Mark a customer's submitted ID as verified (or not).
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the customer does not exist and a validation
    /// error if no ID was submitted.
    #[tracing::instrument(skip(self), fields(id = %id))]
    pub async fn set_id_verified(&self, id: &CustomerId, verified: bool) -> Result<Customer> {
        let customer = self.get(id).await?;
        if customer.id_verification.is_none() {
            return Err(AppError::validation(
                "idVerification",
                "Customer has not submitted an ID",
            ));
        }

        let document = self
            .store
            .update(
                collections::CUSTOMERS,
                id.as_str(),
                Updates::new().set("idVerification.verified", json!(verified)),
            )
            .await?;
        tracing::info!(verified, "Customer ID verification changed");
        Ok(document.decode()?)
    }

    /// Hard-delete a customer. Their checkouts and sign-in identity remain.
    ///
    /// # Errors
    ///
    /// Returns an error if the store write fails.
    #[tracing::instrument(skip(self), fields(id = %id))]
    pub async fn delete(&self, id: &CustomerId) -> Result<()> {
        if self.store.delete(collections::CUSTOMERS, id.as_str()).await? {
            tracing::info!("Customer deleted");
        }
        Ok(())
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
                    "fullName": "Ana Silva",
                    "email": "ana@example.com",
                    "idVerification": { "type": "passport", "number": "X1", "verified": false }
                }),
            )
            .await
            .unwrap();
        store
            .set(
                collections::CUSTOMERS,
                "c2",
                json!({ "firebaseUid": "u2", "fullName": "Ben Okafor", "email": "ben@example.com" }),
            )
            .await
            .unwrap();
        store
            .set(
                collections::CHECKOUTS,
                "o1",
                json!({ "userEmail": "ana@example.com", "customerId": "c1", "createdAt": "2026-10-01T10:00:00Z" }),
            )
            .await
            .unwrap();
        store
    }

    #[tokio::test]
    async fn test_list_with_search_and_pending_filter() {
        let store = seeded().await;
        let service = CustomerService::new(&store);

        let all = service.list(&CustomerFilter::default()).await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].full_name, "Ana Silva");

        let found = service
            .list(&CustomerFilter {
                search: Some("OKAFOR".to_string()),
                ..CustomerFilter::default()
            })
            .await
            .unwrap();
        assert_eq!(found.len(), 1);

        let pending = service
            .list(&CustomerFilter {
                pending_verification: true,
                ..CustomerFilter::default()
            })
            .await
            .unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].id.as_str(), "c1");
    }

    #[tokio::test]
    async fn test_verify_and_suspend() {
        let store = seeded().await;
        let service = CustomerService::new(&store);

        let verified = service.set_id_verified(&CustomerId::new("c1"), true).await.unwrap();
        assert!(verified.id_verification.unwrap().verified);

        let err = service
            .set_id_verified(&CustomerId::new("c2"), true)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation { .. }));

        let suspended = service
            .set_account_status(&CustomerId::new("c2"), AccountStatus::Suspended)
            .await
            .unwrap();
        assert_eq!(suspended.account_status, AccountStatus::Suspended);
    }

    #[tokio::test]
    async fn test_delete_does_not_cascade() {
        let store = seeded().await;
        let service = CustomerService::new(&store);

        service.delete(&CustomerId::new("c1")).await.unwrap();
        assert!(matches!(
            service.get(&CustomerId::new("c1")).await,
            Err(AppError::NotFound(_))
        ));
        assert!(store.get(collections::CHECKOUTS, "o1").await.unwrap().is_some());
    }
}
