//! Working data and version history of each template.
//!
//! State per template moves between "no working data", "clean" and "dirty".
//! Saving edits makes it dirty, creating or restoring a version makes it clean,
//! and a reset moves the working directory aside so the original baseline
//! applies again. The baseline holds the values written in the template's
//! `index.html`, captured before the first edit is stored.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::Utc;
use serde_json::{json, Value};

use super::{list_json_files, now_millis, validate_id, JsonFile, TemplateLocks, TemplatePaths};
use crate::errors::AppError;
use crate::models::{
    DesignHistoryEntry, DirtyState, DocumentKind, FieldDiff, OriginalData, VersionDiff,
    VersionEntry, VersionSnapshot, WorkingData,
};
use crate::render::editable_values;

/// Maximum number of entries kept in the design change log.
pub const DESIGN_HISTORY_LIMIT: usize = 50;

const VERSION_PREFIX: &str = "version-";

/// Reference to the current working data in a comparison.
pub const WORKING_REF: &str = "working";
/// Reference to the original baseline in a comparison.
pub const ORIGINAL_REF: &str = "original";

/// Manages working data, the original baseline and named versions.
#[derive(Debug)]
pub struct VersionManager {
    data_dir: PathBuf,
    templates_dir: PathBuf,
    locks: TemplateLocks,
}

impl VersionManager {
    pub fn new(data_dir: impl Into<PathBuf>, templates_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            templates_dir: templates_dir.into(),
            locks: TemplateLocks::default(),
        }
    }

    fn paths(&self, template_id: &str) -> Result<TemplatePaths, AppError> {
        TemplatePaths::new(&self.data_dir, template_id)
    }

    // ==================== WORKING DATA ====================

    /// Current working data, or `None` if the template was never edited.
    pub async fn load_working_data(&self, template_id: &str) -> Result<Option<WorkingData>, AppError> {
        self.paths(template_id)?.working_data().read_optional().await
    }

    /// Replace the working data and mark it dirty.
    pub async fn save_working_data(&self, mut data: WorkingData) -> Result<WorkingData, AppError> {
        let paths = self.paths(&data.template_id)?;
        let _guard = self.locks.lock(&data.template_id).await;
        data.is_dirty = true;
        self.write_working(&paths, &data).await?;
        Ok(data)
    }

    /// Merge edits into the working data, creating it lazily, and mark it dirty.
    pub async fn apply_edits(
        &self,
        template_id: &str,
        texts: BTreeMap<String, String>,
        images: BTreeMap<String, String>,
    ) -> Result<WorkingData, AppError> {
        let paths = self.paths(template_id)?;
        let _guard = self.locks.lock(template_id).await;

        let mut data = paths
            .working_data()
            .read_optional::<WorkingData>()
            .await?
            .unwrap_or_else(|| WorkingData::empty(template_id));
        data.texts.extend(texts);
        data.images.extend(images);
        data.last_modified = Utc::now().to_rfc3339();
        data.is_dirty = true;

        self.write_working(&paths, &data).await?;
        Ok(data)
    }

    pub async fn dirty_state(&self, template_id: &str) -> Result<DirtyState, AppError> {
        let working = self.load_working_data(template_id).await?;
        Ok(DirtyState {
            is_dirty: working.as_ref().map(|w| w.is_dirty).unwrap_or(false),
            has_working_data: working.is_some(),
        })
    }

    /// Set the dirty flag explicitly, creating empty working data if needed.
    pub async fn mark_dirty(&self, template_id: &str, dirty: bool) -> Result<WorkingData, AppError> {
        let paths = self.paths(template_id)?;
        let _guard = self.locks.lock(template_id).await;

        let mut data = paths
            .working_data()
            .read_optional::<WorkingData>()
            .await?
            .unwrap_or_else(|| WorkingData::empty(template_id));
        data.is_dirty = dirty;

        self.write_working(&paths, &data).await?;
        Ok(data)
    }

    /// The immutable baseline. Before the first edit it is read straight from
    /// the template, and it is empty when the template has no `index.html`.
    pub async fn load_original(&self, template_id: &str) -> Result<OriginalData, AppError> {
        match self.paths(template_id)?.original().read_optional().await? {
            Some(original) => Ok(original),
            None => self.capture_original(template_id).await,
        }
    }

    async fn capture_original(&self, template_id: &str) -> Result<OriginalData, AppError> {
        let index = self.templates_dir.join(template_id).join("index.html");
        match tokio::fs::read_to_string(&index).await {
            Ok(html) => {
                let (texts, images) = editable_values(&html);
                Ok(OriginalData::from_template(template_id, texts, images))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Ok(OriginalData::empty(template_id))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Write working data, freezing the original baseline on the very first save.
    async fn write_working(&self, paths: &TemplatePaths, data: &WorkingData) -> Result<(), AppError> {
        let original = paths.original();
        if !tokio::fs::try_exists(original.path()).await? {
            let baseline = self.capture_original(&data.template_id).await?;
            if original.create_new(&baseline).await? {
                tracing::debug!("Captured original baseline for {}", data.template_id);
            }
        }
        paths.working_data().write(data).await
    }

    /// Move the working directory aside so the original baseline applies again.
    ///
    /// Returns the recovery directory, or `None` if there was nothing to reset.
    pub async fn reset_to_original(&self, template_id: &str) -> Result<Option<PathBuf>, AppError> {
        let paths = self.paths(template_id)?;
        let _guard = self.locks.lock(template_id).await;

        let working_dir = paths.working_dir();
        if !tokio::fs::try_exists(&working_dir).await? {
            return Ok(None);
        }

        let recovery = paths
            .root()
            .join(format!("working.reset-{}", now_millis()));
        tokio::fs::rename(&working_dir, &recovery).await?;

        tracing::info!(
            "Reset template {} to original (previous state kept at {})",
            template_id,
            recovery.display()
        );
        Ok(Some(recovery))
    }

    // ==================== VERSIONS ====================

    /// Snapshot the working data into a new version and clear the dirty flag.
    pub async fn create_version(
        &self,
        template_id: &str,
        description: &str,
    ) -> Result<VersionEntry, AppError> {
        let description = description.trim();
        if description.is_empty() {
            return Err(AppError::Validation("Description is required".to_string()));
        }

        let paths = self.paths(template_id)?;
        let _guard = self.locks.lock(template_id).await;

        let mut data: WorkingData = paths.working_data().read_optional().await?.ok_or_else(|| {
            AppError::Validation(format!("Template {} has no working data to version", template_id))
        })?;
        data.is_dirty = false;

        let existing = read_snapshots(&paths.versions_dir()).await?;
        let last_millis = existing
            .iter()
            .filter_map(|s| version_millis(&s.entry.id))
            .max()
            .unwrap_or(0);
        let number = existing.iter().map(|s| s.entry.number).max().unwrap_or(0) + 1;
        let millis = now_millis().max(last_millis + 1);

        let entry = VersionEntry {
            id: format!("{}{}", VERSION_PREFIX, millis),
            number,
            description: description.to_string(),
            created_at: Utc::now().to_rfc3339(),
            text_count: data.texts.len(),
            image_count: data.images.len(),
        };
        let snapshot = VersionSnapshot {
            entry: entry.clone(),
            data: data.clone(),
        };

        let file = version_file(&paths, &entry.id);
        if !file.create_new(&snapshot).await? {
            return Err(AppError::Internal(format!(
                "Version file {} already exists",
                file.path().display()
            )));
        }
        self.write_working(&paths, &data).await?;

        tracing::info!(
            "Created version {} (#{}) for template {}",
            entry.id,
            entry.number,
            template_id
        );
        Ok(entry)
    }

    /// All versions of a template, newest first.
    pub async fn list_versions(&self, template_id: &str) -> Result<Vec<VersionEntry>, AppError> {
        let paths = self.paths(template_id)?;
        let mut entries: Vec<VersionEntry> = read_snapshots(&paths.versions_dir())
            .await?
            .into_iter()
            .map(|s| s.entry)
            .collect();
        entries.sort_by(|a, b| b.number.cmp(&a.number).then_with(|| b.id.cmp(&a.id)));
        Ok(entries)
    }

    /// Replace the working data with a stored snapshot.
    pub async fn restore_version(
        &self,
        template_id: &str,
        version_id: &str,
    ) -> Result<WorkingData, AppError> {
        let paths = self.paths(template_id)?;
        let _guard = self.locks.lock(template_id).await;

        let snapshot = load_snapshot(&paths, version_id).await?;
        let mut data = snapshot.data;
        data.template_id = template_id.to_string();
        data.is_dirty = false;

        self.write_working(&paths, &data).await?;

        tracing::info!("Restored template {} to {}", template_id, version_id);
        Ok(data)
    }

    /// Remove a version. Working data is left untouched.
    pub async fn delete_version(&self, template_id: &str, version_id: &str) -> Result<(), AppError> {
        let paths = self.paths(template_id)?;
        let _guard = self.locks.lock(template_id).await;

        check_version_id(version_id)?;
        let file = version_file(&paths, version_id);
        match tokio::fs::remove_file(file.path()).await {
            Ok(()) => {
                tracing::info!("Deleted version {} of template {}", version_id, template_id);
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(version_not_found(version_id)),
            Err(e) => Err(e.into()),
        }
    }

    /// Field-level diff from snapshot `a` to snapshot `b`.
    ///
    /// Besides version ids, `working` and `original` name the current working
    /// data and the baseline.
    pub async fn compare_versions(
        &self,
        template_id: &str,
        a: &str,
        b: &str,
    ) -> Result<VersionDiff, AppError> {
        let paths = self.paths(template_id)?;
        let (a_texts, a_images) = self.resolve_ref(&paths, template_id, a).await?;
        let (b_texts, b_images) = self.resolve_ref(&paths, template_id, b).await?;

        let texts = FieldDiff::between(&a_texts, &b_texts);
        let images = FieldDiff::between(&a_images, &b_images);
        let identical = texts.is_empty() && images.is_empty();

        Ok(VersionDiff {
            from: a.to_string(),
            to: b.to_string(),
            texts,
            images,
            identical,
        })
    }

    async fn resolve_ref(
        &self,
        paths: &TemplatePaths,
        template_id: &str,
        reference: &str,
    ) -> Result<(BTreeMap<String, String>, BTreeMap<String, String>), AppError> {
        match reference {
            WORKING_REF => match paths.working_data().read_optional::<WorkingData>().await? {
                Some(data) => Ok((data.texts, data.images)),
                None => {
                    let original = self.load_original(template_id).await?;
                    Ok((original.texts, original.images))
                }
            },
            ORIGINAL_REF => {
                let original = self.load_original(template_id).await?;
                Ok((original.texts, original.images))
            }
            version_id => {
                let snapshot = load_snapshot(paths, version_id).await?;
                Ok((snapshot.data.texts, snapshot.data.images))
            }
        }
    }

    // ==================== DESIGN DOCUMENTS ====================

    /// A design document, `{}` when never written.
    pub async fn load_document(&self, template_id: &str, kind: DocumentKind) -> Result<Value, AppError> {
        Ok(self
            .paths(template_id)?
            .document(kind)
            .read_optional()
            .await?
            .unwrap_or_else(|| json!({})))
    }

    pub async fn save_document(
        &self,
        template_id: &str,
        kind: DocumentKind,
        value: &Value,
    ) -> Result<(), AppError> {
        if !value.is_object() {
            return Err(AppError::Validation(format!(
                "{} must be a JSON object",
                kind.file_name()
            )));
        }
        let paths = self.paths(template_id)?;
        let _guard = self.locks.lock(template_id).await;
        paths.document(kind).write(value).await
    }

    pub async fn load_design(&self, template_id: &str) -> Result<Option<Value>, AppError> {
        self.paths(template_id)?.edited_design().read_optional().await
    }

    /// Save the edited design and append it to the capped change log.
    ///
    /// Returns the number of history entries after the append.
    pub async fn save_design(
        &self,
        template_id: &str,
        description: &str,
        design: Value,
    ) -> Result<usize, AppError> {
        let paths = self.paths(template_id)?;
        let _guard = self.locks.lock(template_id).await;

        paths.edited_design().write(&design).await?;

        let history_file = paths.design_history();
        let mut history: Vec<DesignHistoryEntry> = history_file.read_or_default().await?;
        history.push(DesignHistoryEntry {
            timestamp: Utc::now().to_rfc3339(),
            description: description.to_string(),
            design,
        });
        if history.len() > DESIGN_HISTORY_LIMIT {
            let excess = history.len() - DESIGN_HISTORY_LIMIT;
            history.drain(..excess);
        }
        history_file.write(&history).await?;

        Ok(history.len())
    }

    pub async fn design_history(&self, template_id: &str) -> Result<Vec<DesignHistoryEntry>, AppError> {
        self.paths(template_id)?.design_history().read_or_default().await
    }
}

fn version_file(paths: &TemplatePaths, version_id: &str) -> JsonFile {
    JsonFile::new(paths.versions_dir().join(format!("{}.json", version_id)))
}

fn version_millis(version_id: &str) -> Option<i64> {
    version_id.strip_prefix(VERSION_PREFIX)?.parse().ok()
}

fn version_not_found(version_id: &str) -> AppError {
    AppError::NotFound(format!("Version {} not found", version_id))
}

/// Version ids are `version-<millis>`; anything else cannot exist.
fn check_version_id(version_id: &str) -> Result<(), AppError> {
    validate_id("version id", version_id)?;
    if version_millis(version_id).is_none() {
        return Err(version_not_found(version_id));
    }
    Ok(())
}

async fn load_snapshot(paths: &TemplatePaths, version_id: &str) -> Result<VersionSnapshot, AppError> {
    check_version_id(version_id)?;
    version_file(paths, version_id)
        .read_optional()
        .await?
        .ok_or_else(|| version_not_found(version_id))
}

async fn read_snapshots(dir: &Path) -> Result<Vec<VersionSnapshot>, AppError> {
    let mut snapshots = Vec::new();
    for name in list_json_files(dir, VERSION_PREFIX).await? {
        match JsonFile::new(dir.join(&name))
            .read_optional::<VersionSnapshot>()
            .await
        {
            Ok(Some(snapshot)) => snapshots.push(snapshot),
            Ok(None) => {}
            Err(e) => tracing::warn!("Skipping unreadable version file {}: {}", name, e),
        }
    }
    Ok(snapshots)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn texts(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn manager() -> (TempDir, VersionManager) {
        let dir = TempDir::new().unwrap();
        let manager = VersionManager::new(dir.path(), dir.path().join("site"));
        (dir, manager)
    }

    fn write_template(dir: &TempDir, template_id: &str, html: &str) {
        let template_dir = dir.path().join("site").join(template_id);
        std::fs::create_dir_all(&template_dir).unwrap();
        std::fs::write(template_dir.join("index.html"), html).unwrap();
    }

    #[tokio::test]
    async fn test_unedited_template_has_no_working_data() {
        let (_dir, manager) = manager();
        assert!(manager.load_working_data("fresh").await.unwrap().is_none());
        let state = manager.dirty_state("fresh").await.unwrap();
        assert!(!state.is_dirty);
        assert!(!state.has_working_data);
    }

    #[tokio::test]
    async fn test_save_then_load_round_trips() {
        let (_dir, manager) = manager();
        let mut data = WorkingData::empty("demo");
        data.texts = texts(&[("hero_title", "Hello")]);
        data.images = texts(&[("hero_image", "/media/a.png")]);
        data.is_dirty = true;

        manager.save_working_data(data.clone()).await.unwrap();

        assert_eq!(manager.load_working_data("demo").await.unwrap(), Some(data));
    }

    #[tokio::test]
    async fn test_original_comes_from_template_not_edits() {
        let (dir, manager) = manager();
        write_template(
            &dir,
            "demo",
            "<h1 data-element-id=\"title\">Pristine</h1><img data-element-id=\"logo\" src=\"/logo.png\">",
        );

        manager
            .apply_edits("demo", texts(&[("title", "First")]), BTreeMap::new())
            .await
            .unwrap();
        write_template(&dir, "demo", "<h1 data-element-id=\"title\">Changed later</h1>");
        manager
            .apply_edits("demo", texts(&[("title", "Second")]), BTreeMap::new())
            .await
            .unwrap();

        let original = manager.load_original("demo").await.unwrap();
        assert_eq!(original.texts, texts(&[("title", "Pristine")]));
        assert_eq!(original.images, texts(&[("logo", "/logo.png")]));
    }

    #[tokio::test]
    async fn test_original_without_template_is_empty() {
        let (_dir, manager) = manager();
        manager
            .apply_edits("demo", texts(&[("title", "First")]), BTreeMap::new())
            .await
            .unwrap();

        let original = manager.load_original("demo").await.unwrap();
        assert!(original.texts.is_empty());
        assert!(original.images.is_empty());
    }

    #[tokio::test]
    async fn test_reset_returns_to_template_values() {
        let (dir, manager) = manager();
        write_template(&dir, "demo", "<h1 data-element-id=\"title\">Welcome</h1>");
        manager
            .apply_edits("demo", texts(&[("title", "User edit")]), BTreeMap::new())
            .await
            .unwrap();

        manager.reset_to_original("demo").await.unwrap();

        let diff = manager
            .compare_versions("demo", ORIGINAL_REF, WORKING_REF)
            .await
            .unwrap();
        assert!(diff.identical);
        assert_eq!(
            manager.load_original("demo").await.unwrap().texts["title"],
            "Welcome"
        );
    }

    #[tokio::test]
    async fn test_save_after_version_marks_dirty() {
        let (_dir, manager) = manager();
        let mut data = WorkingData::empty("demo");
        data.texts = texts(&[("hero_title", "Hello")]);
        manager.save_working_data(data).await.unwrap();
        manager.create_version("demo", "v1").await.unwrap();
        assert!(!manager.dirty_state("demo").await.unwrap().is_dirty);

        let mut data = manager.load_working_data("demo").await.unwrap().unwrap();
        data.texts.insert("hero_title".to_string(), "Changed".to_string());
        let saved = manager.save_working_data(data).await.unwrap();

        assert!(saved.is_dirty);
        assert!(manager.load_working_data("demo").await.unwrap().unwrap().is_dirty);
    }

    #[tokio::test]
    async fn test_version_lifecycle_scenario() {
        let (_dir, manager) = manager();
        let mut data = WorkingData::empty("demo");
        data.texts = texts(&[("hero_title", "Hello")]);
        data.is_dirty = true;
        manager.save_working_data(data).await.unwrap();

        let v1 = manager.create_version("demo", "v1").await.unwrap();
        assert_eq!(v1.number, 1);
        assert_eq!(v1.text_count, 1);
        assert_eq!(manager.list_versions("demo").await.unwrap().len(), 1);
        assert!(!manager.load_working_data("demo").await.unwrap().unwrap().is_dirty);

        let edited = manager
            .apply_edits("demo", texts(&[("hero_title", "Changed")]), BTreeMap::new())
            .await
            .unwrap();
        assert!(edited.is_dirty);

        let v2 = manager.create_version("demo", "v2").await.unwrap();
        assert_eq!(v2.number, 2);
        assert!(version_millis(&v2.id) > version_millis(&v1.id));

        let listed = manager.list_versions("demo").await.unwrap();
        assert_eq!(listed[0].id, v2.id);
        assert_eq!(listed[1].id, v1.id);

        let restored = manager.restore_version("demo", &v1.id).await.unwrap();
        assert_eq!(restored.texts["hero_title"], "Hello");

        let working = manager.load_working_data("demo").await.unwrap().unwrap();
        assert_eq!(working.texts["hero_title"], "Hello");
        assert!(!working.is_dirty);
    }

    #[tokio::test]
    async fn test_restore_matches_snapshot_exactly() {
        let (dir, manager) = manager();
        manager
            .apply_edits("demo", texts(&[("a", "1")]), texts(&[("logo", "x.png")]))
            .await
            .unwrap();
        let version = manager.create_version("demo", "snapshot").await.unwrap();
        manager
            .apply_edits("demo", texts(&[("a", "2"), ("b", "3")]), BTreeMap::new())
            .await
            .unwrap();

        manager.restore_version("demo", &version.id).await.unwrap();

        let stored: VersionSnapshot = JsonFile::new(
            dir.path()
                .join("templates/demo/versions")
                .join(format!("{}.json", version.id)),
        )
        .read_optional()
        .await
        .unwrap()
        .unwrap();
        let working = manager.load_working_data("demo").await.unwrap().unwrap();
        assert_eq!(working, stored.data);
        assert!(!working.is_dirty);
    }

    #[tokio::test]
    async fn test_create_version_requires_description_and_data() {
        let (_dir, manager) = manager();
        assert!(matches!(
            manager.create_version("demo", "   ").await,
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            manager.create_version("demo", "v1").await,
            Err(AppError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_restore_unknown_version_is_not_found() {
        let (_dir, manager) = manager();
        assert!(matches!(
            manager.restore_version("demo", "version-42").await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            manager.restore_version("demo", "bogus").await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_delete_unknown_version_leaves_list_unchanged() {
        let (_dir, manager) = manager();
        manager
            .apply_edits("demo", texts(&[("a", "1")]), BTreeMap::new())
            .await
            .unwrap();
        manager.create_version("demo", "keep").await.unwrap();

        let result = manager.delete_version("demo", "version-1").await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
        assert_eq!(manager.list_versions("demo").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_delete_version_keeps_working_data() {
        let (_dir, manager) = manager();
        manager
            .apply_edits("demo", texts(&[("a", "1")]), BTreeMap::new())
            .await
            .unwrap();
        let version = manager.create_version("demo", "v1").await.unwrap();
        let before = manager.load_working_data("demo").await.unwrap();

        manager.delete_version("demo", &version.id).await.unwrap();

        assert!(manager.list_versions("demo").await.unwrap().is_empty());
        assert_eq!(manager.load_working_data("demo").await.unwrap(), before);
    }

    #[tokio::test]
    async fn test_compare_is_antisymmetric() {
        let (_dir, manager) = manager();
        manager
            .apply_edits("demo", texts(&[("title", "A"), ("old", "gone")]), BTreeMap::new())
            .await
            .unwrap();
        let v1 = manager.create_version("demo", "v1").await.unwrap();

        let mut data = manager.load_working_data("demo").await.unwrap().unwrap();
        data.texts = texts(&[("title", "B"), ("new", "here")]);
        manager.save_working_data(data).await.unwrap();
        let v2 = manager.create_version("demo", "v2").await.unwrap();

        let forward = manager.compare_versions("demo", &v1.id, &v2.id).await.unwrap();
        let backward = manager.compare_versions("demo", &v2.id, &v1.id).await.unwrap();

        assert_eq!(forward.texts.added, texts(&[("new", "here")]));
        assert_eq!(forward.texts.removed, texts(&[("old", "gone")]));
        assert_eq!(forward.texts.added, backward.texts.removed);
        assert_eq!(forward.texts.removed, backward.texts.added);
        assert_eq!(forward.texts.changed["title"].to, "B");
        assert_eq!(backward.texts.changed["title"].to, "A");
        assert!(!forward.identical);
    }

    #[tokio::test]
    async fn test_compare_against_working_and_original() {
        let (dir, manager) = manager();
        write_template(&dir, "demo", "<h1 data-element-id=\"title\">Start</h1>");
        manager
            .apply_edits("demo", texts(&[("title", "First")]), BTreeMap::new())
            .await
            .unwrap();
        manager
            .apply_edits("demo", texts(&[("title", "Now")]), BTreeMap::new())
            .await
            .unwrap();

        let diff = manager
            .compare_versions("demo", ORIGINAL_REF, WORKING_REF)
            .await
            .unwrap();
        assert_eq!(diff.texts.changed["title"].from, "Start");
        assert_eq!(diff.texts.changed["title"].to, "Now");
    }

    #[tokio::test]
    async fn test_reset_moves_working_aside() {
        let (_dir, manager) = manager();
        manager
            .apply_edits("demo", texts(&[("title", "Edited")]), BTreeMap::new())
            .await
            .unwrap();

        let recovery = manager.reset_to_original("demo").await.unwrap().unwrap();

        assert!(manager.load_working_data("demo").await.unwrap().is_none());
        assert!(recovery.join("working-data.json").exists());
        assert!(manager.reset_to_original("demo").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_mark_dirty_creates_working_data() {
        let (_dir, manager) = manager();
        let data = manager.mark_dirty("demo", true).await.unwrap();
        assert!(data.is_dirty);
        assert!(manager.dirty_state("demo").await.unwrap().has_working_data);
    }

    #[tokio::test]
    async fn test_concurrent_edits_are_not_lost() {
        let (_dir, manager) = manager();
        let manager = std::sync::Arc::new(manager);

        let mut handles = Vec::new();
        for i in 0..10 {
            let manager = manager.clone();
            handles.push(tokio::spawn(async move {
                manager
                    .apply_edits(
                        "demo",
                        texts(&[(format!("key{}", i).as_str(), "v")]),
                        BTreeMap::new(),
                    )
                    .await
                    .unwrap();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let working = manager.load_working_data("demo").await.unwrap().unwrap();
        assert_eq!(working.texts.len(), 10);
    }

    #[tokio::test]
    async fn test_design_history_is_capped() {
        let (_dir, manager) = manager();
        let mut len = 0;
        for i in 0..(DESIGN_HISTORY_LIMIT + 5) {
            len = manager
                .save_design("demo", &format!("change {}", i), json!({"step": i}))
                .await
                .unwrap();
        }

        assert_eq!(len, DESIGN_HISTORY_LIMIT);
        let history = manager.design_history("demo").await.unwrap();
        assert_eq!(history.len(), DESIGN_HISTORY_LIMIT);
        assert_eq!(history[0].description, "change 5");
        assert_eq!(
            manager.load_design("demo").await.unwrap().unwrap()["step"],
            DESIGN_HISTORY_LIMIT + 4
        );
    }

    #[tokio::test]
    async fn test_documents_must_be_objects() {
        let (_dir, manager) = manager();
        assert_eq!(
            manager.load_document("demo", DocumentKind::Colors).await.unwrap(),
            json!({})
        );
        assert!(manager
            .save_document("demo", DocumentKind::Colors, &json!([1, 2]))
            .await
            .is_err());

        let colors = json!({"primary": "#ff0000"});
        manager
            .save_document("demo", DocumentKind::Colors, &colors)
            .await
            .unwrap();
        assert_eq!(
            manager.load_document("demo", DocumentKind::Colors).await.unwrap(),
            colors
        );
    }
}
