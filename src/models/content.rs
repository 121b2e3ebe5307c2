//! Rich content records edited per element.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A content record: an arbitrary JSON object describing one element.
pub type ContentRecord = Map<String, Value>;

/// The per-template content document persisted by the content store.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ContentDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
    #[serde(default)]
    pub texts: BTreeMap<String, ContentRecord>,
    #[serde(default)]
    pub media: BTreeMap<String, ContentRecord>,
}

impl ContentDocument {
    pub fn section_mut(&mut self, section: Section) -> &mut BTreeMap<String, ContentRecord> {
        match section {
            Section::Texts => &mut self.texts,
            Section::Media => &mut self.media,
        }
    }
}

/// Top-level section of a content document.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Section {
    Texts,
    Media,
}

/// A partial record merged into `section.key`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentUpdate {
    pub section: Section,
    pub key: String,
    pub value: Value,
}

/// Request body for batch updates.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchContentRequest {
    pub updates: Vec<ContentUpdate>,
}

/// Request body for replacing the content document.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WriteContentRequest {
    pub document: ContentDocument,
    #[serde(default)]
    pub create_version: bool,
}

/// A stored full snapshot of the content document.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ContentSnapshotInfo {
    pub name: String,
    pub timestamp: i64,
}
