//! Media upload endpoint

use axum::{extract::State, http::StatusCode, Json};
use axum_extra::extract::Multipart;

use crate::{
    error::{AppError, AppResult},
    models::upload::{IncomingFile, UploadResponse},
    AppState,
};

use super::AdminPin;

/// Upload a single image or video to blob storage
#[utoipa::path(
    post,
    path = "/upload",
    tag = "upload",
    security(("admin_pin" = [])),
    request_body(content = crate::models::upload::UploadForm, content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "File stored", body = UploadResponse),
        (status = 400, description = "Missing, oversized or unsupported file"),
        (status = 503, description = "Blob storage unavailable")
    )
)]
pub async fn upload_file(
    State(state): State<AppState>,
    _admin: AdminPin,
    mut multipart: Multipart,
) -> AppResult<(StatusCode, Json<UploadResponse>)> {
    let mut file = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Invalid multipart body: {}", e)))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let filename = field.file_name().unwrap_or("file").to_string();
        let content_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(format!("Failed to read upload: {}", e)))?;
        file = Some(IncomingFile {
            filename,
            content_type,
            bytes,
        });
        break;
    }

    let stored = state.services.media.upload(file).await?;
    Ok((StatusCode::CREATED, Json(stored)))
}
