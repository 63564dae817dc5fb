//! Staff invitations.

use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

use rentacam_core::models::AdminAccount;
use rentacam_core::{AdminId, AdminRole, Email};

use crate::error::Result;
use crate::middleware::RequireSuperAdmin;
use crate::services::email::{InviteEmailRequest, send_invite_email as send_invite};
use crate::services::invites::{InviteService, StaffInvite};
use crate::state::AppState;

/// An admin account without its password hash.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminSummary {
    pub id: AdminId,
    pub email: Email,
    pub name: String,
    pub role: AdminRole,
    pub employee_id: Option<String>,
    pub must_change_password: bool,
}

impl From<AdminAccount> for AdminSummary {
    fn from(account: AdminAccount) -> Self {
        Self {
            id: account.id,
            email: account.email,
            name: account.name,
            role: account.role,
            employee_id: account.employee_id,
            must_change_password: account.must_change_password,
        }
    }
}

/// Create a staff account and email its temporary password.
///
/// POST /api/admins/invite
#[tracing::instrument(skip(state, admin, body), fields(invited_by = %admin.id))]
pub async fn invite(
    State(state): State<AppState>,
    RequireSuperAdmin(admin): RequireSuperAdmin,
    Json(body): Json<StaffInvite>,
) -> Result<(StatusCode, Json<AdminSummary>)> {
    let login_url = state.login_url();
    let account = InviteService::new(state.store(), state.mailer(), &login_url)
        .invite(body, &admin)
        .await?;
    Ok((StatusCode::CREATED, Json(account.into())))
}

/// Send an invitation email for credentials created elsewhere.
///
/// POST /api/send-invite-email
///
/// Always answers `{statusCode, body}`; the HTTP status matches `statusCode`.
pub async fn send_invite_email(
    State(state): State<AppState>,
    RequireSuperAdmin(_admin): RequireSuperAdmin,
    Json(body): Json<InviteEmailRequest>,
) -> Response {
    let response = send_invite(state.mailer(), &body, &state.login_url()).await;
    let status =
        StatusCode::from_u16(response.status_code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(response)).into_response()
}
