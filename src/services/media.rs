//! Media uploads and best-effort cleanup of stored blobs

use chrono::Utc;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use crate::{
    error::{AppError, AppResult, FieldViolation},
    models::upload::{IncomingFile, UploadResponse, ALLOWED_MIME_TYPES, MAX_UPLOAD_BYTES},
    services::blob::BlobStore,
    validation::sanitize_filename,
};

#[derive(Clone)]
pub struct MediaService {
    blobs: Arc<dyn BlobStore>,
    last_stamp: Arc<AtomicI64>,
}

/// Every violated upload constraint, empty when the file is acceptable
pub fn upload_violations(file: Option<&IncomingFile>) -> Vec<FieldViolation> {
    let Some(file) = file else {
        return vec![FieldViolation::new("file", "No file provided")];
    };
    let mut violations = Vec::new();
    if file.bytes.is_empty() {
        violations.push(FieldViolation::new("file", "File is empty"));
    }
    if file.bytes.len() > MAX_UPLOAD_BYTES {
        violations.push(FieldViolation::new(
            "size",
            format!("File size must be less than {}MB", MAX_UPLOAD_BYTES / (1024 * 1024)),
        ));
    }
    if !ALLOWED_MIME_TYPES.contains(&file.content_type.as_str()) {
        violations.push(FieldViolation::new(
            "type",
            "File must be an image (JPEG, PNG, GIF, WebP) or video (MP4, WebM, MOV)",
        ));
    }
    violations
}

impl MediaService {
    pub fn new(blobs: Arc<dyn BlobStore>) -> Self {
        Self {
            blobs,
            last_stamp: Arc::new(AtomicI64::new(0)),
        }
    }

    /// Millisecond timestamp, strictly increasing across calls
    fn next_stamp(&self) -> i64 {
        let now = Utc::now().timestamp_millis();
        let previous = self
            .last_stamp
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| Some(now.max(last + 1)))
            .unwrap_or(now);
        now.max(previous + 1)
    }

    /// Validate and store an upload under `{timestamp}-{sanitized name}`
    pub async fn upload(&self, file: Option<IncomingFile>) -> AppResult<UploadResponse> {
        let violations = upload_violations(file.as_ref());
        if !violations.is_empty() {
            return Err(AppError::Validation(violations));
        }
        let Some(file) = file else {
            return Err(AppError::invalid("file", "No file provided"));
        };

        let filename = format!("{}-{}", self.next_stamp(), sanitize_filename(&file.filename));
        let size = file.bytes.len();
        let url = self.blobs.put(&filename, file.bytes, &file.content_type).await?;

        tracing::info!(filename = %filename, size, mime_type = %file.content_type, "Stored upload");
        Ok(UploadResponse {
            url,
            filename,
            size,
            mime_type: file.content_type,
        })
    }

    /// Delete every managed blob among `urls`. Failures are logged only.
    pub async fn cleanup<'a>(&self, urls: impl IntoIterator<Item = &'a str>) {
        for url in urls {
            if url.is_empty() || !self.blobs.is_managed(url) {
                continue;
            }
            if let Err(e) = self.blobs.delete(url).await {
                tracing::warn!(url, error = %e, "Failed to delete blob");
            }
        }
    }
}
