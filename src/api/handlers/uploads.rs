use axum::{
    extract::{Extension, Multipart, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;

use crate::{
    api::{middleware::auth::CurrentUser, state::AppState},
    error::{AppError, Result},
    uploads::{UploadKind, UploadStore},
};

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub url: String,
}

/// Accepts a multipart `file` plus an optional `type` (image, document, audio).
pub async fn upload(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<UploadResponse>)> {
    let mut kind = UploadKind::Image;
    let mut file: Option<(String, Vec<u8>)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Invalid multipart body: {}", e)))?
    {
        let name = field.name().unwrap_or("").to_string();

        match name.as_str() {
            "type" => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| AppError::BadRequest(format!("Failed to read upload type: {}", e)))?;
                kind = UploadKind::parse(&value)
                    .ok_or_else(|| AppError::Validation(format!("Unknown upload type: {}", value)))?;
            }
            "file" => {
                let filename = field.file_name().unwrap_or("").to_string();
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::BadRequest(format!("Failed to read upload: {}", e)))?;
                file = Some((filename, data.to_vec()));
            }
            _ => {
                field
                    .bytes()
                    .await
                    .map_err(|e| AppError::BadRequest(format!("Failed to read field {}: {}", name, e)))?;
            }
        }
    }

    let (filename, data) = file
        .ok_or_else(|| AppError::Validation("No file provided".to_string()))?;

    let url = state.service_context.upload_store
        .save(kind, &filename, &data)
        .await?;

    tracing::info!(user_id = %current.user.id, kind = ?kind, %url, "file uploaded");

    Ok((StatusCode::CREATED, Json(UploadResponse { url })))
}
