//! Shared color presets and custom fonts.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A named set of color tokens shared across templates.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ColorPreset {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub colors: BTreeMap<String, String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Request body for creating a color preset.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePresetRequest {
    pub name: String,
    #[serde(default)]
    pub colors: BTreeMap<String, String>,
}

/// Request body for updating a color preset.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePresetRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub colors: Option<BTreeMap<String, String>>,
}

/// A user-registered web font.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CustomFont {
    pub id: String,
    pub name: String,
    pub font_family: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Request body for registering a font.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateFontRequest {
    pub name: String,
    pub font_family: String,
    #[serde(default)]
    pub url: Option<String>,
}

/// Request body for updating a font.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateFontRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub font_family: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}
