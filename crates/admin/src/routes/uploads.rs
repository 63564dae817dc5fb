//! File uploads.
//!
//! The declared content type is checked before the body is read, and the
//! size is checked as chunks arrive, so a rejected file is never buffered
//! in full or written.

use axum::{
    Json,
    extract::{Multipart, State, multipart::Field},
    http::StatusCode,
};

use crate::error::Result;
use crate::middleware::RequireWriter;
use crate::services::UploadService;
use crate::services::uploads::{MAX_UPLOAD_BYTES, StoredUpload, UploadError, UploadKind};
use crate::state::AppState;

/// Request body limit for the upload route: the file plus form overhead.
pub const UPLOAD_BODY_LIMIT: usize = MAX_UPLOAD_BYTES + 1024 * 1024;

/// POST /api/uploads
///
/// Multipart fields: optional `kind` (`product_image`, `id_document`,
/// `inventory_image`) before a required `file`.
#[tracing::instrument(skip(state, multipart))]
pub async fn upload(
    State(state): State<AppState>,
    RequireWriter(_admin): RequireWriter,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<StoredUpload>)> {
    let mut kind = UploadKind::default();

    while let Some(field) = multipart.next_field().await.map_err(malformed)? {
        match field.name() {
            Some("kind") => {
                let text = field.text().await.map_err(malformed)?;
                kind = serde_json::from_value(serde_json::Value::String(text.trim().to_string()))
                    .map_err(|_| UploadError::Malformed(format!("unknown upload kind: {text}")))?;
            }
            Some("file") => {
                let content_type = field.content_type().unwrap_or_default().to_string();
                crate::services::uploads::validate(&content_type, 0)?;
                let bytes = read_limited(field).await?;

                let stored = UploadService::new(&state.config().upload_dir)
                    .store(kind, &content_type, &bytes)
                    .await?;
                return Ok((StatusCode::CREATED, Json(stored)));
            }
            _ => {}
        }
    }

    Err(UploadError::MissingFile.into())
}

async fn read_limited(mut field: Field<'_>) -> std::result::Result<Vec<u8>, UploadError> {
    let mut bytes = Vec::new();
    while let Some(chunk) = field.chunk().await.map_err(malformed)? {
        if bytes.len() + chunk.len() > MAX_UPLOAD_BYTES {
            return Err(UploadError::TooLarge {
                size: bytes.len() + chunk.len(),
            });
        }
        bytes.extend_from_slice(&chunk);
    }
    Ok(bytes)
}

fn malformed(err: axum::extract::multipart::MultipartError) -> UploadError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        UploadError::TooLarge {
            size: UPLOAD_BODY_LIMIT,
        }
    } else {
        UploadError::Malformed(err.body_text())
    }
}
