//! Media upload payloads.

use serde::Deserialize;

/// Request body for uploading an image with its thumbnail.
///
/// Both payloads are base64, optionally as `data:` URLs.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadMediaRequest {
    pub file_name: String,
    pub image: String,
    pub thumbnail: String,
}
