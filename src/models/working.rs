//! Working data and original baseline models.

use std::collections::BTreeMap;

use chrono::Utc;
use serde::{Deserialize, Serialize};

/// The mutable "current edit" state of a template.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct WorkingData {
    pub template_id: String,
    pub last_modified: String,
    #[serde(default)]
    pub texts: BTreeMap<String, String>,
    #[serde(default)]
    pub images: BTreeMap<String, String>,
    #[serde(default)]
    pub is_dirty: bool,
}

impl WorkingData {
    /// Empty, clean working data stamped with the current time.
    pub fn empty(template_id: &str) -> Self {
        Self {
            template_id: template_id.to_string(),
            last_modified: Utc::now().to_rfc3339(),
            texts: BTreeMap::new(),
            images: BTreeMap::new(),
            is_dirty: false,
        }
    }
}

/// Immutable pristine state of a template, used as the reset and diff baseline.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct OriginalData {
    pub template_id: String,
    pub created_at: String,
    #[serde(default)]
    pub texts: BTreeMap<String, String>,
    #[serde(default)]
    pub images: BTreeMap<String, String>,
}

impl OriginalData {
    pub fn empty(template_id: &str) -> Self {
        Self {
            template_id: template_id.to_string(),
            created_at: Utc::now().to_rfc3339(),
            texts: BTreeMap::new(),
            images: BTreeMap::new(),
        }
    }

    /// Baseline holding the values written in the template itself.
    pub fn from_template(
        template_id: &str,
        texts: BTreeMap<String, String>,
        images: BTreeMap<String, String>,
    ) -> Self {
        Self {
            template_id: template_id.to_string(),
            created_at: Utc::now().to_rfc3339(),
            texts,
            images,
        }
    }
}

/// Request body for merging edits into the working data.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplyEditsRequest {
    #[serde(default)]
    pub texts: BTreeMap<String, String>,
    #[serde(default)]
    pub images: BTreeMap<String, String>,
}

/// Request body for replacing the working data wholesale.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveWorkingRequest {
    #[serde(default)]
    pub texts: BTreeMap<String, String>,
    #[serde(default)]
    pub images: BTreeMap<String, String>,
}

/// Form body for marking the dirty flag.
#[derive(Debug, Clone, Deserialize)]
pub struct MarkDirtyForm {
    pub dirty: bool,
}

/// Dirty state report.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DirtyState {
    pub is_dirty: bool,
    pub has_working_data: bool,
}

/// Outcome of resetting a template to its original data.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetResult {
    pub was_reset: bool,
    /// Name of the directory the previous working state was moved to
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recovery_dir: Option<String>,
}
