//! Authentication service.
//!
//! Customers register with email and password. Registration writes two
//! documents: the sign-in identity in `users` (its id is the uid) and the
//! customer profile in `customers`, linked back through `firebaseUid`.

mod error;

pub use error::AuthError;

use chrono::Utc;
use serde::Deserialize;
use serde_json::json;

use rentacam_core::models::{AuthUser, Customer, collections};
use rentacam_core::password::{hash_password, validate_password, verify_password};
use rentacam_core::store::{Query, SharedStore, encode};
use rentacam_core::{AccountStatus, CustomerId, Email, UserUid};

use super::account::find_customer;

/// Registration request.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Registration {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub full_name: String,
}

/// Authentication service.
///
/// Handles customer registration and password sign-in.
pub struct AuthService<'a> {
    store: &'a SharedStore,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(store: &'a SharedStore) -> Self {
        Self { store }
    }

    async fn find_user(&self, email: &Email) -> Result<Option<AuthUser>, AuthError> {
        let documents = self
            .store
            .query(
                collections::USERS,
                &Query::new().where_eq("email", json!(email.normalized())).limit(1),
            )
            .await?;
        Ok(documents.first().map(|doc| doc.decode()).transpose()?)
    }

    /// Register a new customer with email and password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidEmail` if the email format is invalid.
    /// Returns `AuthError::Password` if the password doesn't meet requirements.
    /// Returns `AuthError::UserAlreadyExists` if the email is already registered.
    #[tracing::instrument(skip(self, registration), fields(email = %registration.email))]
    pub async fn register(
        &self,
        registration: Registration,
    ) -> Result<(AuthUser, Customer), AuthError> {
        let email = Email::parse(&registration.email)?;
        let email = Email::parse(&email.normalized())?;
        validate_password(&registration.password)?;

        if self.find_user(&email).await?.is_some() {
            return Err(AuthError::UserAlreadyExists);
        }

        let password_hash = hash_password(&registration.password)?;
        let now = Utc::now();
        let full_name = registration.full_name.trim().to_string();

        let mut user = AuthUser {
            id: UserUid::new(""),
            email: email.clone(),
            display_name: full_name.clone(),
            password_hash,
            created_at: now,
        };
        let document = self.store.add(collections::USERS, encode(&user)?).await?;
        user.id = UserUid::new(document.id);

        let mut customer = Customer {
            id: CustomerId::new(""),
            firebase_uid: user.id.clone(),
            full_name,
            email,
            address: rentacam_core::models::Address::default(),
            id_verification: None,
            account_status: AccountStatus::Active,
            wishlist: Vec::new(),
            cart: Vec::new(),
            created_at: Some(now),
        };
        let document = self
            .store
            .add(collections::CUSTOMERS, encode(&customer)?)
            .await?;
        customer.id = CustomerId::new(document.id);

        tracing::info!(uid = %user.id, customer_id = %customer.id, "Customer registered");
        Ok((user, customer))
    }

    /// Sign in with email and password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if the email/password is wrong
    /// and `AuthError::AccountSuspended` for suspended customers.
    #[tracing::instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &str) -> Result<AuthUser, AuthError> {
        let email = Email::parse(email).map_err(|_| AuthError::InvalidCredentials)?;
        let user = self
            .find_user(&email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        verify_password(password, &user.password_hash)
            .map_err(|_| AuthError::InvalidCredentials)?;

        let customer = find_customer(self.store, &user.id).await?;
        if customer.is_some_and(|c| c.account_status == AccountStatus::Suspended) {
            tracing::warn!(uid = %user.id, "Suspended customer tried to sign in");
            return Err(AuthError::AccountSuspended);
        }

        tracing::info!(uid = %user.id, "Customer signed in");
        Ok(user)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use rentacam_core::store::{MemoryStore, Updates};

    fn registration(email: &str) -> Registration {
        Registration {
            email: email.to_string(),
            password: "wide-aperture-35".to_string(),
            full_name: "Ana Silva".to_string(),
        }
    }

    #[tokio::test]
    async fn test_register_links_customer_to_identity() {
        let store: SharedStore = Arc::new(MemoryStore::new());
        let service = AuthService::new(&store);

        let (user, customer) = service.register(registration("Ana@Example.com")).await.unwrap();
        assert_eq!(customer.firebase_uid, user.id);
        assert_eq!(user.email.as_str(), "ana@example.com");

        let found = find_customer(&store, &user.id).await.unwrap().unwrap();
        assert_eq!(found.id, customer.id);
        assert!(found.cart.is_empty());
    }

    #[tokio::test]
    async fn test_register_rejects_duplicate_and_short_password() {
        let store: SharedStore = Arc::new(MemoryStore::new());
        let service = AuthService::new(&store);
        service.register(registration("ana@example.com")).await.unwrap();

        let err = service
            .register(registration("ANA@example.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::UserAlreadyExists));

        let mut short = registration("ben@example.com");
        short.password = "short".to_string();
        let err = service.register(short).await.unwrap_err();
        assert_eq!(err.field(), Some("password"));
    }

    #[tokio::test]
    async fn test_login() {
        let store: SharedStore = Arc::new(MemoryStore::new());
        let service = AuthService::new(&store);
        let (user, _) = service.register(registration("ana@example.com")).await.unwrap();

        let signed_in = service
            .login("ana@example.com", "wide-aperture-35")
            .await
            .unwrap();
        assert_eq!(signed_in.id, user.id);

        assert!(matches!(
            service.login("ana@example.com", "wrong-password").await,
            Err(AuthError::InvalidCredentials)
        ));
        assert!(matches!(
            service.login("nobody@example.com", "wide-aperture-35").await,
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[tokio::test]
    async fn test_suspended_customer_cannot_sign_in() {
        let store: SharedStore = Arc::new(MemoryStore::new());
        let service = AuthService::new(&store);
        let (_, customer) = service.register(registration("ana@example.com")).await.unwrap();
        store
            .update(
                collections::CUSTOMERS,
                customer.id.as_str(),
                Updates::new().set("accountStatus", json!("suspended")),
            )
            .await
            .unwrap();

        let err = service
            .login("ana@example.com", "wide-aperture-35")
            .await
            .unwrap_err();
        assert_eq!(err.status(), axum::http::StatusCode::FORBIDDEN);
    }
}
