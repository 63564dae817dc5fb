//! Email delivery for staff invitations.
//!
//! Messages are rendered from Askama templates and handed to a [`Mailer`].
//! Production uses SMTP via lettre; without SMTP configuration the service
//! falls back to [`LogMailer`], which only logs what would have been sent.

use std::sync::{Mutex, PoisonError};

use askama::Template;
use async_trait::async_trait;
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{MultiPart, SinglePart, header::ContentType},
    transport::smtp::{Error as SmtpError, authentication::Credentials},
};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use rentacam_core::Email;

use crate::config::EmailConfig;

/// HTML template for the staff invitation email.
#[derive(Template)]
#[template(path = "email/staff_invite.html")]
struct StaffInviteHtml<'a> {
    email: &'a str,
    employee_id: &'a str,
    role_name: &'a str,
    invited_by: &'a str,
    temporary_password: &'a str,
    login_url: &'a str,
}

/// Plain text template for the staff invitation email.
#[derive(Template)]
#[template(path = "email/staff_invite.txt")]
struct StaffInviteText<'a> {
    email: &'a str,
    employee_id: &'a str,
    role_name: &'a str,
    invited_by: &'a str,
    temporary_password: &'a str,
    login_url: &'a str,
}

/// Errors that can occur when sending email.
#[derive(Debug, Error)]
pub enum EmailError {
    /// SMTP transport error.
    #[error("SMTP error: {0}")]
    Smtp(#[from] SmtpError),

    /// Failed to build email message.
    #[error("Failed to build message: {0}")]
    MessageBuild(#[from] lettre::error::Error),

    /// Invalid email address.
    #[error("Invalid email address: {0}")]
    InvalidAddress(String),

    /// Template rendering error.
    #[error("Template error: {0}")]
    Template(#[from] askama::Error),

    /// The mailer refused the message (test double).
    #[error("Delivery rejected: {0}")]
    Rejected(String),
}

/// A rendered email ready for delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub text_body: String,
    pub html_body: String,
}

/// Something that can deliver an [`EmailMessage`].
#[async_trait]
pub trait Mailer: Send + Sync {
    /// Deliver a message.
    ///
    /// # Errors
    ///
    /// Returns an error if the message could not be delivered.
    async fn send(&self, message: &EmailMessage) -> Result<(), EmailError>;
}

/// SMTP delivery through a STARTTLS relay.
#[derive(Clone)]
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from_address: String,
}

impl SmtpMailer {
    /// Create a mailer from configuration.
    ///
    /// # Errors
    ///
    /// Returns error if the relay address is invalid.
    pub fn new(config: &EmailConfig) -> Result<Self, SmtpError> {
        let credentials = Credentials::new(
            config.smtp_username.clone(),
            config.smtp_password.expose_secret().to_string(),
        );

        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)?
            .port(config.smtp_port)
            .credentials(credentials)
            .build();

        Ok(Self {
            transport,
            from_address: config.from_address.clone(),
        })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, message: &EmailMessage) -> Result<(), EmailError> {
        let email = Message::builder()
            .from(
                self.from_address
                    .parse()
                    .map_err(|_| EmailError::InvalidAddress(self.from_address.clone()))?,
            )
            .to(message
                .to
                .parse()
                .map_err(|_| EmailError::InvalidAddress(message.to.clone()))?)
            .subject(&message.subject)
            .multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_PLAIN)
                            .body(message.text_body.clone()),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_HTML)
                            .body(message.html_body.clone()),
                    ),
            )?;

        self.transport.send(email).await?;

        tracing::info!(to = %message.to, subject = %message.subject, "Email sent successfully");
        Ok(())
    }
}

/// Development mailer that logs instead of sending.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, message: &EmailMessage) -> Result<(), EmailError> {
        tracing::info!(
            to = %message.to,
            subject = %message.subject,
            "SMTP not configured, email logged instead of sent"
        );
        tracing::debug!(body = %message.text_body, "Email body");
        Ok(())
    }
}

/// Mailer that keeps every message in memory. Used by tests.
#[derive(Debug, Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<EmailMessage>>,
    reject: bool,
}

impl RecordingMailer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A mailer that fails every delivery.
    #[must_use]
    pub fn rejecting() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            reject: true,
        }
    }

    /// Messages delivered so far.
    #[must_use]
    pub fn sent(&self) -> Vec<EmailMessage> {
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, message: &EmailMessage) -> Result<(), EmailError> {
        if self.reject {
            return Err(EmailError::Rejected(message.to.clone()));
        }
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(message.clone());
        Ok(())
    }
}

/// Body of `POST /api/send-invite-email`.
///
/// Fields default to empty so a missing field is reported by validation
/// rather than as a deserialization failure.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct InviteEmailRequest {
    pub email: String,
    pub employee_id: String,
    pub role_name: String,
    pub invited_by: String,
    pub temporary_password: String,
}

impl InviteEmailRequest {
    /// Name of the first missing field, if any.
    fn missing_field(&self) -> Option<&'static str> {
        [
            ("email", &self.email),
            ("employeeId", &self.employee_id),
            ("roleName", &self.role_name),
            ("invitedBy", &self.invited_by),
            ("temporaryPassword", &self.temporary_password),
        ]
        .into_iter()
        .find(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| name)
    }
}

/// Outcome of the invite email function.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InviteEmailResponse {
    pub status_code: u16,
    pub body: InviteEmailBody,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InviteEmailBody {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl InviteEmailResponse {
    fn success(message: impl Into<String>) -> Self {
        Self {
            status_code: 200,
            body: InviteEmailBody {
                success: true,
                message: Some(message.into()),
                error: None,
            },
        }
    }

    fn failure(status_code: u16, error: impl Into<String>) -> Self {
        Self {
            status_code,
            body: InviteEmailBody {
                success: false,
                message: None,
                error: Some(error.into()),
            },
        }
    }
}

/// Render the invitation email for a request.
///
/// # Errors
///
/// Returns `EmailError::Template` if rendering fails.
pub fn render_invite(
    request: &InviteEmailRequest,
    login_url: &str,
) -> Result<EmailMessage, EmailError> {
    let html = StaffInviteHtml {
        email: &request.email,
        employee_id: &request.employee_id,
        role_name: &request.role_name,
        invited_by: &request.invited_by,
        temporary_password: &request.temporary_password,
        login_url,
    }
    .render()?;
    let text = StaffInviteText {
        email: &request.email,
        employee_id: &request.employee_id,
        role_name: &request.role_name,
        invited_by: &request.invited_by,
        temporary_password: &request.temporary_password,
        login_url,
    }
    .render()?;

    Ok(EmailMessage {
        to: request.email.trim().to_string(),
        subject: "You're invited to the RentACam admin".to_string(),
        text_body: text,
        html_body: html,
    })
}

/// Validate, render and send a staff invitation email.
///
/// Never fails: validation problems become a 400 response and delivery
/// problems a 500 response, each with `success: false`.
#[tracing::instrument(skip(mailer, request), fields(to = %request.email, role = %request.role_name))]
pub async fn send_invite_email(
    mailer: &dyn Mailer,
    request: &InviteEmailRequest,
    login_url: &str,
) -> InviteEmailResponse {
    if let Some(field) = request.missing_field() {
        return InviteEmailResponse::failure(400, format!("Missing required field: {field}"));
    }
    if Email::parse(&request.email).is_err() {
        return InviteEmailResponse::failure(
            400,
            format!("Invalid email address: {}", request.email.trim()),
        );
    }

    let message = match render_invite(request, login_url) {
        Ok(message) => message,
        Err(e) => {
            tracing::error!(error = %e, "Failed to render invite email");
            return InviteEmailResponse::failure(500, "Failed to send invitation email");
        }
    };

    match mailer.send(&message).await {
        Ok(()) => InviteEmailResponse::success(format!("Invitation sent to {}", message.to)),
        Err(e) => {
            let event_id = sentry::capture_error(&e);
            tracing::error!(error = %e, sentry_event_id = %event_id, "Failed to send invite email");
            InviteEmailResponse::failure(500, "Failed to send invitation email")
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    const LOGIN_URL: &str = "http://localhost:3001/login";

    fn request() -> InviteEmailRequest {
        InviteEmailRequest {
            email: "maria@rentacam.example".to_string(),
            employee_id: "EMP-042".to_string(),
            role_name: "admin".to_string(),
            invited_by: "Owner".to_string(),
            temporary_password: "Tmp-pass-9981".to_string(),
        }
    }

    #[test]
    fn test_render_invite_includes_credentials() {
        let message = render_invite(&request(), LOGIN_URL).unwrap();
        assert_eq!(message.to, "maria@rentacam.example");
        assert!(message.text_body.contains("EMP-042"));
        assert!(message.text_body.contains("Tmp-pass-9981"));
        assert!(message.text_body.contains(LOGIN_URL));
        assert!(message.html_body.contains("EMP-042"));
    }

    #[tokio::test]
    async fn test_send_invite_email_success() {
        let mailer = RecordingMailer::new();
        let response = send_invite_email(&mailer, &request(), LOGIN_URL).await;

        assert_eq!(response.status_code, 200);
        assert!(response.body.success);
        assert_eq!(mailer.sent().len(), 1);
        assert_eq!(mailer.sent()[0].to, "maria@rentacam.example");
    }

    #[tokio::test]
    async fn test_send_invite_email_missing_field() {
        let mailer = RecordingMailer::new();
        let mut req = request();
        req.temporary_password = "  ".to_string();

        let response = send_invite_email(&mailer, &req, LOGIN_URL).await;
        assert_eq!(response.status_code, 400);
        assert!(!response.body.success);
        assert_eq!(
            response.body.error.as_deref(),
            Some("Missing required field: temporaryPassword")
        );
        assert!(mailer.sent().is_empty());
    }

    #[tokio::test]
    async fn test_send_invite_email_invalid_address() {
        let mailer = RecordingMailer::new();
        let mut req = request();
        req.email = "not-an-email".to_string();

        let response = send_invite_email(&mailer, &req, LOGIN_URL).await;
        assert_eq!(response.status_code, 400);
        assert!(mailer.sent().is_empty());
    }

    #[tokio::test]
    async fn test_send_invite_email_delivery_failure() {
        let mailer = RecordingMailer::rejecting();
        let response = send_invite_email(&mailer, &request(), LOGIN_URL).await;
        assert_eq!(response.status_code, 500);
        assert_eq!(
            response.body.error.as_deref(),
            Some("Failed to send invitation email")
        );
    }

    #[test]
    fn test_response_wire_format() {
        let value = serde_json::to_value(InviteEmailResponse::success("ok")).unwrap();
        assert_eq!(value["statusCode"], 200);
        assert_eq!(value["body"]["success"], true);
        assert!(value["body"].get("error").is_none());
    }
}
