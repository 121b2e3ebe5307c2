//! Design documents kept in a template's working directory.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Named design document stored as `working/<file name>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Colors,
    Styles,
    StyleTokens,
    ComponentMappings,
}

impl DocumentKind {
    pub fn file_name(&self) -> &'static str {
        match self {
            DocumentKind::Colors => "colors.json",
            DocumentKind::Styles => "styles.json",
            DocumentKind::StyleTokens => "style-tokens.json",
            DocumentKind::ComponentMappings => "component-mappings.json",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "colors" => Some(DocumentKind::Colors),
            "styles" => Some(DocumentKind::Styles),
            "style-tokens" => Some(DocumentKind::StyleTokens),
            "component-mappings" => Some(DocumentKind::ComponentMappings),
            _ => None,
        }
    }
}

/// One entry of the design change log.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DesignHistoryEntry {
    pub timestamp: String,
    #[serde(default)]
    pub description: String,
    pub design: Value,
}

/// Request body for saving the edited design.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveDesignRequest {
    #[serde(default)]
    pub description: String,
    pub design: Value,
}

/// Response to saving the edited design.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DesignSaved {
    pub history_length: usize,
}
