//! Staff invitations: create the account, then email the credentials.

use rand::Rng;
use rand::distr::Alphanumeric;
use serde::Deserialize;

use rentacam_core::AdminRole;
use rentacam_core::models::{AdminAccount, collections};
use rentacam_core::store::SharedStore;

use super::auth::{AdminAuthService, NewAdmin};
use super::email::{EmailError, InviteEmailRequest, Mailer, send_invite_email};
use crate::error::{AppError, Result};
use crate::models::CurrentAdmin;

/// Length of generated temporary passwords.
pub const TEMPORARY_PASSWORD_LENGTH: usize = 14;

/// Body of `POST /api/admins/invite`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StaffInvite {
    pub email: String,
    #[serde(default)]
    pub name: String,
    pub employee_id: String,
    pub role: AdminRole,
}

/// A random alphanumeric temporary password.
#[must_use]
pub fn generate_temporary_password() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(TEMPORARY_PASSWORD_LENGTH)
        .map(char::from)
        .collect()
}

pub struct InviteService<'a> {
    store: &'a SharedStore,
    mailer: &'a dyn Mailer,
    login_url: &'a str,
}

impl<'a> InviteService<'a> {
    #[must_use]
    pub const fn new(store: &'a SharedStore, mailer: &'a dyn Mailer, login_url: &'a str) -> Self {
        Self {
            store,
            mailer,
            login_url,
        }
    }

    /// Create a staff account with a temporary password and email it.
    ///
    /// If the email cannot be sent the account is removed again, since
    /// nobody would know its password.
    ///
    /// # Errors
    ///
    /// Returns an auth error for a bad or taken email, a validation error
    /// for a blank employee id and `AppError::Email` when delivery fails.
    #[tracing::instrument(skip(self, invite, inviter), fields(email = %invite.email, role = ?invite.role))]
    pub async fn invite(&self, invite: StaffInvite, inviter: &CurrentAdmin) -> Result<AdminAccount> {
        if invite.employee_id.trim().is_empty() {
            return Err(AppError::validation("employeeId", "Employee ID is required"));
        }

        let temporary_password = generate_temporary_password();
        let inviter_name = if inviter.name.trim().is_empty() {
            inviter.email.to_string()
        } else {
            inviter.name.clone()
        };

        let account = AdminAuthService::new(self.store)
            .create_admin(NewAdmin {
                email: invite.email,
                name: invite.name,
                role: invite.role,
                password: temporary_password.clone(),
                employee_id: Some(invite.employee_id.trim().to_string()),
                invited_by: Some(inviter_name.clone()),
                must_change_password: true,
            })
            .await?;

        let request = InviteEmailRequest {
            email: account.email.to_string(),
            employee_id: invite.employee_id.trim().to_string(),
            role_name: account.role.to_string(),
            invited_by: inviter_name,
            temporary_password,
        };
        let response = send_invite_email(self.mailer, &request, self.login_url).await;

        if !response.body.success {
            self.store
                .delete(collections::ADMIN, account.id.as_str())
                .await?;
            tracing::warn!(admin_id = %account.id, "Invite email failed, account removed");
            return Err(AppError::Email(EmailError::Rejected(
                response.body.error.unwrap_or_default(),
            )));
        }

        tracing::info!(admin_id = %account.id, "Staff member invited");
        Ok(account)
    }
}
