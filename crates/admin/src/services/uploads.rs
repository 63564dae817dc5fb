//! Local object storage for product images and ID documents.
//!
//! Files are validated (content type and size) before anything touches the
//! disk, then written under `UPLOAD_DIR/<folder>/<uuid>.<ext>` and served
//! back under `/uploads`.

use std::path::{Path, PathBuf};

use axum::http::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Largest accepted upload.
pub const MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;

/// URL prefix the upload directory is served under.
pub const UPLOADS_URL_PREFIX: &str = "/uploads";

/// Accepted content types and the extension each one is stored with.
const ALLOWED_TYPES: [(&str, &str); 4] = [
    ("image/jpeg", "jpg"),
    ("image/png", "png"),
    ("image/webp", "webp"),
    ("application/pdf", "pdf"),
];

/// Errors that can occur while storing an upload.
#[derive(Debug, Error)]
pub enum UploadError {
    #[error("No file was provided")]
    MissingFile,

    #[error("File is empty")]
    Empty,

    #[error("Unsupported file type: {0}. Allowed: JPEG, PNG, WebP, PDF")]
    UnsupportedType(String),

    #[error("File is too large ({size} bytes). Maximum is 5 MB")]
    TooLarge { size: usize },

    #[error("Malformed upload: {0}")]
    Malformed(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl UploadError {
    /// HTTP status for this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::TooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            Self::UnsupportedType(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            Self::MissingFile | Self::Empty | Self::Malformed(_) => StatusCode::BAD_REQUEST,
            Self::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Form field the error belongs to.
    #[must_use]
    pub const fn field(&self) -> Option<&'static str> {
        match self {
            Self::Io(_) => None,
            _ => Some("file"),
        }
    }
}

/// What an upload is for; decides the storage folder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum UploadKind {
    #[default]
    ProductImage,
    IdDocument,
    InventoryImage,
}

impl UploadKind {
    const fn folder(self) -> &'static str {
        match self {
            Self::ProductImage => "products",
            Self::IdDocument => "id-documents",
            Self::InventoryImage => "inventory",
        }
    }
}

/// A file that was written to storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredUpload {
    /// Public URL of the file.
    pub url: String,
    pub content_type: String,
    pub size: usize,
}

/// Extension for an accepted content type.
///
/// Parameters such as `; charset=binary` are ignored.
#[must_use]
pub fn extension_for(content_type: &str) -> Option<&'static str> {
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    ALLOWED_TYPES
        .iter()
        .find(|(mime, _)| *mime == essence)
        .map(|(_, ext)| *ext)
}

/// Check a declared content type and size before reading any further.
///
/// # Errors
///
/// Returns `UnsupportedType` or `TooLarge`.
pub fn validate(content_type: &str, size: usize) -> Result<&'static str, UploadError> {
    let ext = extension_for(content_type)
        .ok_or_else(|| UploadError::UnsupportedType(content_type.to_string()))?;
    if size > MAX_UPLOAD_BYTES {
        return Err(UploadError::TooLarge { size });
    }
    Ok(ext)
}

/// Upload storage rooted at a directory.
pub struct UploadService<'a> {
    root: &'a Path,
}

impl<'a> UploadService<'a> {
    #[must_use]
    pub const fn new(root: &'a Path) -> Self {
        Self { root }
    }

    /// Validate and write a file.
    ///
    /// # Errors
    ///
    /// Returns a validation error without writing, or `Io` if the write fails.
    #[tracing::instrument(skip(self, bytes), fields(size = bytes.len()))]
    pub async fn store(
        &self,
        kind: UploadKind,
        content_type: &str,
        bytes: &[u8],
    ) -> Result<StoredUpload, UploadError> {
        if bytes.is_empty() {
            return Err(UploadError::Empty);
        }
        let ext = validate(content_type, bytes.len())?;

        let folder = kind.folder();
        let file_name = format!("{}.{ext}", Uuid::new_v4().simple());
        let dir: PathBuf = self.root.join(folder);
        tokio::fs::create_dir_all(&dir).await?;
        tokio::fs::write(dir.join(&file_name), bytes).await?;

        tracing::info!(folder, file = %file_name, "Upload stored");

        Ok(StoredUpload {
            url: format!("{UPLOADS_URL_PREFIX}/{folder}/{file_name}"),
            content_type: content_type.to_string(),
            size: bytes.len(),
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_extension_for_allowed_types() {
        assert_eq!(extension_for("image/jpeg"), Some("jpg"));
        assert_eq!(extension_for("IMAGE/PNG"), Some("png"));
        assert_eq!(extension_for("application/pdf; charset=binary"), Some("pdf"));
        assert_eq!(extension_for("image/gif"), None);
        assert_eq!(extension_for("text/html"), None);
    }

    #[test]
    fn test_validate_rejects_oversized() {
        let err = validate("image/png", MAX_UPLOAD_BYTES + 1).unwrap_err();
        assert!(matches!(err, UploadError::TooLarge { .. }));
        assert_eq!(err.status(), StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(err.field(), Some("file"));
        assert!(validate("image/png", MAX_UPLOAD_BYTES).is_ok());
    }

    #[tokio::test]
    async fn test_store_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let service = UploadService::new(dir.path());

        let stored = service
            .store(UploadKind::IdDocument, "application/pdf", b"%PDF-1.7")
            .await
            .unwrap();

        assert!(stored.url.starts_with("/uploads/id-documents/"));
        assert!(stored.url.ends_with(".pdf"));
        let relative = stored.url.trim_start_matches("/uploads/");
        let written = std::fs::read(dir.path().join(relative)).unwrap();
        assert_eq!(written, b"%PDF-1.7");
    }

    #[tokio::test]
    async fn test_store_rejects_before_writing() {
        let dir = tempfile::tempdir().unwrap();
        let service = UploadService::new(dir.path());

        let err = service
            .store(UploadKind::ProductImage, "image/gif", b"GIF89a")
            .await
            .unwrap_err();
        assert!(matches!(err, UploadError::UnsupportedType(_)));
        assert!(!dir.path().join("products").exists());

        let err = service
            .store(UploadKind::ProductImage, "image/png", b"")
            .await
            .unwrap_err();
        assert!(matches!(err, UploadError::Empty));
    }
}
