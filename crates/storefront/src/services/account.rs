//! Customer profile: name, address and ID verification.

use chrono::Utc;
use serde::Deserialize;
use serde_json::json;

use rentacam_core::models::{Address, Customer, IdVerification, collections};
use rentacam_core::store::{Query, SharedStore, StoreResult, Updates};
use rentacam_core::UserUid;

use crate::error::{AppError, Result};

/// Resolve a sign-in identity to its customer document.
///
/// # Errors
///
/// Returns an error if the store query fails.
pub async fn find_customer(store: &SharedStore, uid: &UserUid) -> StoreResult<Option<Customer>> {
    let documents = store
        .query(
            collections::CUSTOMERS,
            &Query::new()
                .where_eq("firebaseUid", json!(uid.as_str()))
                .limit(1),
        )
        .await?;
    documents.first().map(|doc| doc.decode()).transpose()
}

/// Like [`find_customer`], for operations that need a profile.
///
/// # Errors
///
/// Returns `NotFound` when the identity has no customer document.
pub async fn require_customer(store: &SharedStore, uid: &UserUid) -> Result<Customer> {
    find_customer(store, uid)
        .await?
        .ok_or_else(|| AppError::NotFound("customer profile".to_string()))
}

/// Partial profile update.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfilePatch {
    pub full_name: Option<String>,
    pub address: Option<Address>,
}

/// ID document submitted for rental approval.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdSubmission {
    #[serde(rename = "type")]
    pub kind: String,
    pub number: String,
    #[serde(default)]
    pub document_url: Option<String>,
}

pub struct AccountService<'a> {
    store: &'a SharedStore,
}

impl<'a> AccountService<'a> {
    #[must_use]
    pub const fn new(store: &'a SharedStore) -> Self {
        Self { store }
    }

    /// The signed-in customer's profile.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` when no profile exists.
    pub async fn profile(&self, uid: &UserUid) -> Result<Customer> {
        require_customer(self.store, uid).await
    }

    /// Update name and/or address.
    ///
    /// # Errors
    ///
    /// Returns a validation error for a blank name.
    #[tracing::instrument(skip(self, patch), fields(uid = %uid))]
    pub async fn update_profile(&self, uid: &UserUid, patch: ProfilePatch) -> Result<Customer> {
        let customer = require_customer(self.store, uid).await?;

        let mut updates = Updates::new();
        if let Some(name) = patch.full_name {
            let name = name.trim();
            if name.is_empty() {
                return Err(AppError::validation("fullName", "Full name is required"));
            }
            updates = updates.set("fullName", json!(name));
        }
        if let Some(address) = patch.address {
            updates = updates.set_serialized("address", &address)?;
        }
        if updates.is_empty() {
            return Ok(customer);
        }

        let document = self
            .store
            .update(collections::CUSTOMERS, customer.id.as_str(), updates)
            .await?;
        tracing::info!(customer_id = %customer.id, "Profile updated");
        Ok(document.decode()?)
    }

    /// Submit (or resubmit) an ID document. Verification starts over.
    ///
    /// # Errors
    ///
    /// Returns a validation error when the type or number is blank.
    #[tracing::instrument(skip(self, submission), fields(uid = %uid, kind = %submission.kind))]
    pub async fn submit_id_verification(
        &self,
        uid: &UserUid,
        submission: IdSubmission,
    ) -> Result<Customer> {
        let kind = submission.kind.trim();
        if kind.is_empty() {
            return Err(AppError::validation("type", "ID type is required"));
        }
        let number = submission.number.trim();
        if number.is_empty() {
            return Err(AppError::validation("number", "ID number is required"));
        }

        let customer = require_customer(self.store, uid).await?;
        let verification = IdVerification {
            kind: kind.to_string(),
            number: number.to_string(),
            document_url: submission
                .document_url
                .filter(|url| !url.trim().is_empty()),
            verified: false,
            submitted_at: Some(Utc::now()),
        };

        let document = self
            .store
            .update(
                collections::CUSTOMERS,
                customer.id.as_str(),
                Updates::new().set_serialized("idVerification", &verification)?,
            )
            .await?;
        tracing::info!(customer_id = %customer.id, "ID verification submitted");
        Ok(document.decode()?)
    }
}
