//! Admin authentication service.
//!
//! Staff sign in with email and password against the `admin` collection.
//! Invited accounts start with a temporary password and `mustChangePassword`
//! set until they choose their own.

mod error;

pub use error::AdminAuthError;

use chrono::Utc;
use serde_json::json;

use rentacam_core::models::{AdminAccount, collections};
use rentacam_core::password::{hash_password, validate_password, verify_password};
use rentacam_core::store::{Query, SharedStore, Updates, encode};
use rentacam_core::{AdminId, AdminRole, Email};

/// Fields for a new staff account.
#[derive(Debug, Clone)]
pub struct NewAdmin {
    pub email: String,
    pub name: String,
    pub role: AdminRole,
    pub password: String,
    pub employee_id: Option<String>,
    pub invited_by: Option<String>,
    pub must_change_password: bool,
}

/// Admin authentication service.
pub struct AdminAuthService<'a> {
    store: &'a SharedStore,
}

impl<'a> AdminAuthService<'a> {
    /// Create a new admin authentication service.
    #[must_use]
    pub const fn new(store: &'a SharedStore) -> Self {
        Self { store }
    }

    /// Look up a staff account by email (case-insensitive).
    ///
    /// # Errors
    ///
    /// Returns `AdminAuthError::Store` if the query fails.
    pub async fn find_by_email(&self, email: &Email) -> Result<Option<AdminAccount>, AdminAuthError> {
        let documents = self
            .store
            .query(
                collections::ADMIN,
                &Query::new().where_eq("email", json!(email.normalized())).limit(1),
            )
            .await?;
        Ok(documents.first().map(|doc| doc.decode()).transpose()?)
    }

    /// Fetch a staff account by id.
    ///
    /// # Errors
    ///
    /// Returns `AdminAuthError::Store` if the read fails.
    pub async fn get(&self, id: &AdminId) -> Result<Option<AdminAccount>, AdminAuthError> {
        let document = self.store.get(collections::ADMIN, id.as_str()).await?;
        Ok(document.map(|doc| doc.decode()).transpose()?)
    }

    /// Create a staff account.
    ///
    /// # Errors
    ///
    /// Returns `AdminAuthError::AdminAlreadyExists` if the email is taken,
    /// `AdminAuthError::InvalidEmail` or `AdminAuthError::Password` for bad
    /// input.
    #[tracing::instrument(skip(self, new), fields(email = %new.email, role = ?new.role))]
    pub async fn create_admin(&self, new: NewAdmin) -> Result<AdminAccount, AdminAuthError> {
        let email = Email::parse(&new.email)?;
        validate_password(&new.password)?;

        if self.find_by_email(&email).await?.is_some() {
            return Err(AdminAuthError::AdminAlreadyExists);
        }

        let password_hash = hash_password(&new.password)?;
        let mut account = AdminAccount {
            id: AdminId::new(""),
            email: Email::parse(&email.normalized())?,
            name: new.name.trim().to_string(),
            role: new.role,
            employee_id: new.employee_id.filter(|id| !id.trim().is_empty()),
            password_hash,
            must_change_password: new.must_change_password,
            invited_by: new.invited_by,
            created_at: Utc::now(),
            last_login_at: None,
        };

        let document = self.store.add(collections::ADMIN, encode(&account)?).await?;
        account.id = AdminId::new(document.id);

        tracing::info!(admin_id = %account.id, "Admin account created");
        Ok(account)
    }

    /// Verify email and password and record the sign-in time.
    ///
    /// # Errors
    ///
    /// Returns `AdminAuthError::InvalidCredentials` for an unknown email or a
    /// wrong password.
    #[tracing::instrument(skip(self, email, password))]
    pub async fn login(&self, email: &str, password: &str) -> Result<AdminAccount, AdminAuthError> {
        let email = Email::parse(email)?;
        let Some(mut account) = self.find_by_email(&email).await? else {
            tracing::info!("Admin login for unknown email");
            return Err(AdminAuthError::InvalidCredentials);
        };

        if verify_password(password, &account.password_hash).is_err() {
            tracing::info!(admin_id = %account.id, "Admin login with wrong password");
            return Err(AdminAuthError::InvalidCredentials);
        }

        let now = Utc::now();
        self.store
            .update(
                collections::ADMIN,
                account.id.as_str(),
                Updates::new().set("lastLoginAt", json!(now)),
            )
            .await?;
        account.last_login_at = Some(now);

        tracing::info!(admin_id = %account.id, "Admin logged in");
        Ok(account)
    }

    /// Replace the password after checking the current one. Clears
    /// `mustChangePassword`.
    ///
    /// # Errors
    ///
    /// Returns `AdminAuthError::InvalidCredentials` if the current password is
    /// wrong or the account is gone, and `AdminAuthError::Password` if the new
    /// one is too short.
    #[tracing::instrument(skip(self, current, new_password), fields(admin_id = %id))]
    pub async fn change_password(
        &self,
        id: &AdminId,
        current: &str,
        new_password: &str,
    ) -> Result<AdminAccount, AdminAuthError> {
        let account = self
            .get(id)
            .await?
            .ok_or(AdminAuthError::InvalidCredentials)?;
        verify_password(current, &account.password_hash)
            .map_err(|_| AdminAuthError::InvalidCredentials)?;
        validate_password(new_password)?;

        let document = self
            .store
            .update(
                collections::ADMIN,
                id.as_str(),
                Updates::new()
                    .set("passwordHash", json!(hash_password(new_password)?))
                    .set("mustChangePassword", json!(false)),
            )
            .await?;

        tracing::info!("Admin password changed");
        Ok(document.decode()?)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use rentacam_core::password::PasswordError;
    use rentacam_core::store::MemoryStore;

    fn new_admin(email: &str) -> NewAdmin {
        NewAdmin {
            email: email.to_string(),
            name: "Dana".to_string(),
            role: AdminRole::Admin,
            password: "temporary-pass".to_string(),
            employee_id: Some("EMP-7".to_string()),
            invited_by: None,
            must_change_password: true,
        }
    }

    #[tokio::test]
    async fn test_create_and_login() {
        let store: SharedStore = Arc::new(MemoryStore::new());
        let auth = AdminAuthService::new(&store);

        let created = auth.create_admin(new_admin("Dana@Example.com")).await.unwrap();
        assert_eq!(created.email.as_str(), "dana@example.com");
        assert!(created.must_change_password);
        assert!(created.password_hash.starts_with("$argon2id$"));

        let account = auth.login("DANA@example.com", "temporary-pass").await.unwrap();
        assert_eq!(account.id, created.id);
        assert!(account.last_login_at.is_some());

        let stored = auth.get(&created.id).await.unwrap().unwrap();
        assert!(stored.last_login_at.is_some());
    }

    #[tokio::test]
    async fn test_login_rejects_wrong_password_and_unknown_email() {
        let store: SharedStore = Arc::new(MemoryStore::new());
        let auth = AdminAuthService::new(&store);
        auth.create_admin(new_admin("dana@example.com")).await.unwrap();

        assert!(matches!(
            auth.login("dana@example.com", "wrong-password").await,
            Err(AdminAuthError::InvalidCredentials)
        ));
        assert!(matches!(
            auth.login("nobody@example.com", "temporary-pass").await,
            Err(AdminAuthError::InvalidCredentials)
        ));
    }

    #[tokio::test]
    async fn test_duplicate_email_conflicts() {
        let store: SharedStore = Arc::new(MemoryStore::new());
        let auth = AdminAuthService::new(&store);
        auth.create_admin(new_admin("dana@example.com")).await.unwrap();

        let err = auth
            .create_admin(new_admin("DANA@example.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, AdminAuthError::AdminAlreadyExists));
        assert_eq!(err.status(), axum::http::StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_change_password_clears_flag() {
        let store: SharedStore = Arc::new(MemoryStore::new());
        let auth = AdminAuthService::new(&store);
        let created = auth.create_admin(new_admin("dana@example.com")).await.unwrap();

        assert!(matches!(
            auth.change_password(&created.id, "temporary-pass", "short").await,
            Err(AdminAuthError::Password(PasswordError::TooShort))
        ));
        assert!(matches!(
            auth.change_password(&created.id, "not-the-pass", "a-much-better-pass").await,
            Err(AdminAuthError::InvalidCredentials)
        ));

        let updated = auth
            .change_password(&created.id, "temporary-pass", "a-much-better-pass")
            .await
            .unwrap();
        assert!(!updated.must_change_password);
        assert!(auth.login("dana@example.com", "a-much-better-pass").await.is_ok());
    }
}
