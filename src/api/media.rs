//! Media upload and download endpoints.

use axum::{
    extract::{Path, State},
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;

use super::{error, notify, success, ApiResult};
use crate::errors::AppError;
use crate::models::UploadMediaRequest;
use crate::store::SavedMedia;
use crate::AppState;

/// Decode a base64 payload, accepting `data:<mime>;base64,` URLs.
fn decode_payload(field: &str, payload: &str) -> Result<Vec<u8>, AppError> {
    let encoded = match payload.split_once(',') {
        Some((header, data)) if header.starts_with("data:") => data,
        _ => payload,
    };
    BASE64
        .decode(encoded.trim())
        .map_err(|e| AppError::Validation(format!("{} is not valid base64: {}", field, e)))
}

/// POST /api/templates/:id/media - Store an image and its thumbnail.
pub async fn upload_media(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<UploadMediaRequest>,
) -> ApiResult<SavedMedia> {
    let image = match decode_payload("image", &request.image) {
        Ok(bytes) => bytes,
        Err(e) => return error(e),
    };
    let thumbnail = match decode_payload("thumbnail", &request.thumbnail) {
        Ok(bytes) => bytes,
        Err(e) => return error(e),
    };

    match state
        .media
        .save(&id, &request.file_name, &image, &thumbnail)
        .await
    {
        Ok(saved) => {
            notify(&state, &id, "mediaUploaded");
            success(saved)
        }
        Err(e) => error(e),
    }
}

/// GET /api/templates/:id/media/*path
pub async fn get_media(
    State(state): State<AppState>,
    Path((id, path)): Path<(String, String)>,
) -> Result<Response, AppError> {
    let (resolved, bytes) = state.media.read(&id, &path).await?;
    let mime = mime_guess::from_path(&resolved).first_or_octet_stream();

    Ok(([(header::CONTENT_TYPE, mime.to_string())], bytes).into_response())
}
