//! Requests sent by the preview iframe.

use serde::Deserialize;

/// Body of a click relayed from the preview.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectElementRequest {
    pub element_id: String,
}
