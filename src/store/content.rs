//! Per-element content records with backup-on-write and optional snapshots.

use std::path::PathBuf;

use chrono::Utc;
use serde_json::Value;

use super::{list_json_files, now_millis, JsonFile, TemplateLocks, TemplatePaths};
use crate::errors::AppError;
use crate::models::{ContentDocument, ContentSnapshotInfo, ContentUpdate, Section};

const SNAPSHOT_PREFIX: &str = "content-";

/// Options for [`ContentStore::write`].
#[derive(Debug, Clone, Copy, Default)]
pub struct WriteOptions {
    /// Also store a full timestamped snapshot in `versions/`.
    pub create_version: bool,
}

/// Read-modify-write store over each template's `content.json`.
#[derive(Debug)]
pub struct ContentStore {
    data_dir: PathBuf,
    locks: TemplateLocks,
}

impl ContentStore {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            locks: TemplateLocks::default(),
        }
    }

    fn paths(&self, template_id: &str) -> Result<TemplatePaths, AppError> {
        TemplatePaths::new(&self.data_dir, template_id)
    }

    /// The content document; empty when the template has no edits yet.
    pub async fn read(&self, template_id: &str) -> Result<ContentDocument, AppError> {
        self.paths(template_id)?.content().read_or_default().await
    }

    pub async fn write(
        &self,
        template_id: &str,
        document: ContentDocument,
        options: WriteOptions,
    ) -> Result<ContentDocument, AppError> {
        let paths = self.paths(template_id)?;
        let _guard = self.locks.lock(template_id).await;
        write_document(&paths, document, options).await
    }

    /// Shallow-merge `partial` into the record at `section.key`.
    pub async fn update(
        &self,
        template_id: &str,
        section: Section,
        key: &str,
        partial: Value,
    ) -> Result<ContentDocument, AppError> {
        self.update_batch(
            template_id,
            vec![ContentUpdate {
                section,
                key: key.to_string(),
                value: partial,
            }],
        )
        .await
    }

    /// Apply several partial updates in a single read-modify-write.
    pub async fn update_batch(
        &self,
        template_id: &str,
        updates: Vec<ContentUpdate>,
    ) -> Result<ContentDocument, AppError> {
        for update in &updates {
            if update.key.trim().is_empty() {
                return Err(AppError::Validation("Content key is required".to_string()));
            }
            if !update.value.is_object() {
                return Err(AppError::Validation(format!(
                    "Value for {} must be a JSON object",
                    update.key
                )));
            }
        }

        let paths = self.paths(template_id)?;
        let _guard = self.locks.lock(template_id).await;

        let mut document: ContentDocument = paths.content().read_or_default().await?;
        for update in updates {
            let record = document
                .section_mut(update.section)
                .entry(update.key)
                .or_default();
            if let Value::Object(fields) = update.value {
                for (field, value) in fields {
                    record.insert(field, value);
                }
            }
        }

        write_document(&paths, document, WriteOptions::default()).await
    }

    /// Stored content snapshots, newest first.
    pub async fn list_snapshots(&self, template_id: &str) -> Result<Vec<ContentSnapshotInfo>, AppError> {
        let paths = self.paths(template_id)?;
        let mut snapshots: Vec<ContentSnapshotInfo> =
            list_json_files(&paths.versions_dir(), SNAPSHOT_PREFIX)
                .await?
                .into_iter()
                .filter_map(|name| {
                    let timestamp: i64 = name
                        .strip_prefix(SNAPSHOT_PREFIX)?
                        .strip_suffix(".json")?
                        .parse()
                        .ok()?;
                    Some(ContentSnapshotInfo { name, timestamp })
                })
                .collect();
        snapshots.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        Ok(snapshots)
    }
}

async fn write_document(
    paths: &TemplatePaths,
    mut document: ContentDocument,
    options: WriteOptions,
) -> Result<ContentDocument, AppError> {
    document.updated_at = Some(Utc::now().to_rfc3339());

    if options.create_version {
        let snapshot = JsonFile::new(
            paths
                .versions_dir()
                .join(format!("{}{}.json", SNAPSHOT_PREFIX, now_millis())),
        );
        snapshot.write(&document).await?;
        tracing::info!("Stored content snapshot {}", snapshot.path().display());
    }

    paths.content().write(&document).await?;
    Ok(document)
}
