//! Uploaded images and thumbnails stored under each template's `media/` directory.

use std::path::{Component, Path, PathBuf};

use serde::Serialize;

use super::{now_millis, TemplatePaths};
use crate::errors::AppError;

const THUMBNAIL_DIR: &str = "thumbnails";

/// Paths of a stored image pair, relative to the template's media directory.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SavedMedia {
    pub path: String,
    pub thumbnail_path: String,
}

/// File access confined to `<data>/templates/<id>/media`.
#[derive(Debug)]
pub struct MediaStore {
    data_dir: PathBuf,
}

impl MediaStore {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    fn media_dir(&self, template_id: &str) -> Result<PathBuf, AppError> {
        Ok(TemplatePaths::new(&self.data_dir, template_id)?.media_dir())
    }

    /// Write an image and its thumbnail under a timestamped, sanitized name.
    pub async fn save(
        &self,
        template_id: &str,
        file_name: &str,
        image: &[u8],
        thumbnail: &[u8],
    ) -> Result<SavedMedia, AppError> {
        let media_dir = self.media_dir(template_id)?;
        let name = format!("{}-{}", now_millis(), sanitize_file_name(file_name)?);

        let thumbnails = media_dir.join(THUMBNAIL_DIR);
        tokio::fs::create_dir_all(&thumbnails).await?;
        tokio::fs::write(media_dir.join(&name), image).await?;
        tokio::fs::write(thumbnails.join(&name), thumbnail).await?;

        tracing::info!("Stored media {} for template {}", name, template_id);
        Ok(SavedMedia {
            thumbnail_path: format!("{}/{}", THUMBNAIL_DIR, name),
            path: name,
        })
    }

    /// Resolve a requested media path, refusing anything outside the media directory.
    pub async fn resolve(&self, template_id: &str, requested: &str) -> Result<PathBuf, AppError> {
        let media_dir = self.media_dir(template_id)?;
        let relative = Path::new(requested);

        let plain = relative
            .components()
            .all(|c| matches!(c, Component::Normal(_)));
        if requested.is_empty() || !plain {
            tracing::warn!("Rejected media path {:?} for template {}", requested, template_id);
            return Err(AppError::Forbidden("Access denied".to_string()));
        }

        let not_found = || AppError::NotFound(format!("Media {} not found", requested));
        let base = tokio::fs::canonicalize(&media_dir)
            .await
            .map_err(|_| not_found())?;
        let resolved = tokio::fs::canonicalize(media_dir.join(relative))
            .await
            .map_err(|_| not_found())?;

        if !resolved.starts_with(&base) {
            tracing::warn!("Media path {:?} escapes {}", requested, base.display());
            return Err(AppError::Forbidden("Access denied".to_string()));
        }
        if !resolved.is_file() {
            return Err(not_found());
        }
        Ok(resolved)
    }

    pub async fn read(&self, template_id: &str, requested: &str) -> Result<(PathBuf, Vec<u8>), AppError> {
        let path = self.resolve(template_id, requested).await?;
        let bytes = tokio::fs::read(&path).await?;
        Ok((path, bytes))
    }
}

/// Keep the final path component and replace unusual characters.
fn sanitize_file_name(file_name: &str) -> Result<String, AppError> {
    let base = file_name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default();
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();

    if cleaned.trim_matches('.').is_empty() {
        return Err(AppError::Validation("A valid file name is required".to_string()));
    }
    Ok(cleaned)
}
