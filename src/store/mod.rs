//! File-backed persistence for editor state.
//!
//! Every document is a pretty-printed JSON file under the data directory. The
//! previous contents of a file are copied to `<name>.backup` before it is
//! overwritten.

mod content;
mod media;
mod presets;
mod versions;

pub use content::*;
pub use media::*;
pub use presets::*;
pub use versions::*;

use std::collections::HashMap;
use std::ffi::OsString;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::io::AsyncWriteExt;
use tokio::sync::OwnedMutexGuard;

use crate::errors::AppError;
use crate::models::DocumentKind;

/// Longest accepted template or record identifier.
const MAX_ID_LEN: usize = 128;

/// Check that an identifier is safe to use as a single path component.
pub fn validate_id(kind: &str, id: &str) -> Result<(), AppError> {
    if id.trim().is_empty() {
        return Err(AppError::Validation(format!("{} is required", kind)));
    }
    let valid = id.len() <= MAX_ID_LEN
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if !valid {
        return Err(AppError::Validation(format!("Invalid {}: {}", kind, id)));
    }
    Ok(())
}

/// Current time in milliseconds since the epoch.
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Typed handle to a single JSON file.
#[derive(Debug, Clone)]
pub struct JsonFile {
    path: PathBuf,
}

impl JsonFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Path the previous contents are copied to before each write.
    pub fn backup_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(OsString::from)
            .unwrap_or_default();
        name.push(".backup");
        self.path.with_file_name(name)
    }

    /// Read and parse the file. A missing file is `None`; a corrupt one is an error.
    pub async fn read_optional<T: DeserializeOwned>(&self) -> Result<Option<T>, AppError> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn read_or_default<T: DeserializeOwned + Default>(&self) -> Result<T, AppError> {
        Ok(self.read_optional().await?.unwrap_or_default())
    }

    /// Overwrite the file, keeping a best-effort backup of the previous contents.
    pub async fn write<T: Serialize>(&self, value: &T) -> Result<(), AppError> {
        let bytes = serde_json::to_vec_pretty(value)?;
        self.ensure_parent().await?;

        if tokio::fs::try_exists(&self.path).await.unwrap_or(false) {
            if let Err(e) = tokio::fs::copy(&self.path, self.backup_path()).await {
                tracing::warn!("Failed to back up {}: {}", self.path.display(), e);
            }
        }

        tokio::fs::write(&self.path, bytes).await?;
        Ok(())
    }

    /// Write the file only if it does not exist yet. Returns whether it was created.
    pub async fn create_new<T: Serialize>(&self, value: &T) -> Result<bool, AppError> {
        let bytes = serde_json::to_vec_pretty(value)?;
        self.ensure_parent().await?;

        let file = tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&self.path)
            .await;
        let mut file = match file {
            Ok(f) => f,
            Err(e) if e.kind() == ErrorKind::AlreadyExists => return Ok(false),
            Err(e) => return Err(e.into()),
        };
        file.write_all(&bytes).await?;
        file.flush().await?;
        Ok(true)
    }

    async fn ensure_parent(&self) -> Result<(), AppError> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        Ok(())
    }
}

/// Layout of one template's directory under `<data>/templates/<id>/`.
#[derive(Debug, Clone)]
pub struct TemplatePaths {
    root: PathBuf,
}

impl TemplatePaths {
    pub fn new(data_dir: &Path, template_id: &str) -> Result<Self, AppError> {
        validate_id("template id", template_id)?;
        Ok(Self {
            root: data_dir.join("templates").join(template_id),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn working_dir(&self) -> PathBuf {
        self.root.join("working")
    }

    pub fn working_data(&self) -> JsonFile {
        JsonFile::new(self.working_dir().join("working-data.json"))
    }

    pub fn document(&self, kind: DocumentKind) -> JsonFile {
        JsonFile::new(self.working_dir().join(kind.file_name()))
    }

    pub fn edited_design(&self) -> JsonFile {
        JsonFile::new(self.working_dir().join("edited-design.json"))
    }

    pub fn design_history(&self) -> JsonFile {
        JsonFile::new(self.working_dir().join("design-history.json"))
    }

    pub fn original(&self) -> JsonFile {
        JsonFile::new(self.root.join("original.json"))
    }

    pub fn content(&self) -> JsonFile {
        JsonFile::new(self.root.join("content.json"))
    }

    pub fn versions_dir(&self) -> PathBuf {
        self.root.join("versions")
    }

    pub fn media_dir(&self) -> PathBuf {
        self.root.join("media")
    }
}

/// File names in `dir` that start with `prefix` and end in `.json`.
pub(crate) async fn list_json_files(dir: &Path, prefix: &str) -> Result<Vec<String>, AppError> {
    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };

    let mut names = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        if let Some(name) = entry.file_name().to_str() {
            if name.starts_with(prefix) && name.ends_with(".json") {
                names.push(name.to_string());
            }
        }
    }
    Ok(names)
}

/// Per-template async locks serializing read-modify-write cycles.
#[derive(Debug, Default)]
pub struct TemplateLocks {
    locks: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

impl TemplateLocks {
    pub async fn lock(&self, key: &str) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
            locks.entry(key.to_string()).or_default().clone()
        };
        lock.lock_owned().await
    }
}
