//! Cross-template shared resources: color presets and custom fonts.

use std::path::PathBuf;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use super::{list_json_files, validate_id, JsonFile};
use crate::errors::AppError;
use crate::models::{
    ColorPreset, CreateFontRequest, CreatePresetRequest, CustomFont, UpdateFontRequest,
    UpdatePresetRequest,
};

/// On-disk shape of `custom-fonts.json`.
#[derive(Debug, Default, Serialize, Deserialize)]
struct FontCollection {
    #[serde(default)]
    fonts: Vec<CustomFont>,
}

/// Store for `color-presets/*.json` and `custom-fonts.json`.
#[derive(Debug)]
pub struct PresetStore {
    data_dir: PathBuf,
    write_lock: Mutex<()>,
}

impl PresetStore {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            write_lock: Mutex::new(()),
        }
    }

    fn presets_dir(&self) -> PathBuf {
        self.data_dir.join("color-presets")
    }

    fn preset_file(&self, id: &str) -> Result<JsonFile, AppError> {
        validate_id("preset id", id)?;
        Ok(JsonFile::new(self.presets_dir().join(format!("{}.json", id))))
    }

    fn fonts_file(&self) -> JsonFile {
        JsonFile::new(self.data_dir.join("custom-fonts.json"))
    }

    // ==================== COLOR PRESETS ====================

    /// List all presets, most recently updated first.
    pub async fn list_presets(&self) -> Result<Vec<ColorPreset>, AppError> {
        let dir = self.presets_dir();
        let mut presets = Vec::new();
        for name in list_json_files(&dir, "").await? {
            match JsonFile::new(dir.join(&name)).read_optional::<ColorPreset>().await {
                Ok(Some(preset)) => presets.push(preset),
                Ok(None) => {}
                Err(e) => tracing::warn!("Skipping unreadable preset {}: {}", name, e),
            }
        }
        presets.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(presets)
    }

    pub async fn get_preset(&self, id: &str) -> Result<Option<ColorPreset>, AppError> {
        self.preset_file(id)?.read_optional().await
    }

    pub async fn create_preset(&self, request: &CreatePresetRequest) -> Result<ColorPreset, AppError> {
        if request.name.trim().is_empty() {
            return Err(AppError::Validation("Preset name is required".to_string()));
        }

        let now = Utc::now().to_rfc3339();
        let preset = ColorPreset {
            id: uuid::Uuid::new_v4().to_string(),
            name: request.name.trim().to_string(),
            colors: request.colors.clone(),
            created_at: now.clone(),
            updated_at: now,
        };

        self.preset_file(&preset.id)?.write(&preset).await?;
        Ok(preset)
    }

    pub async fn update_preset(
        &self,
        id: &str,
        request: &UpdatePresetRequest,
    ) -> Result<ColorPreset, AppError> {
        let file = self.preset_file(id)?;
        let _guard = self.write_lock.lock().await;

        let mut preset: ColorPreset = file
            .read_optional()
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Preset {} not found", id)))?;

        if let Some(name) = &request.name {
            if name.trim().is_empty() {
                return Err(AppError::Validation("Preset name is required".to_string()));
            }
            preset.name = name.trim().to_string();
        }
        if let Some(colors) = &request.colors {
            preset.colors = colors.clone();
        }
        preset.updated_at = Utc::now().to_rfc3339();

        file.write(&preset).await?;
        Ok(preset)
    }

    pub async fn delete_preset(&self, id: &str) -> Result<(), AppError> {
        let file = self.preset_file(id)?;
        match tokio::fs::remove_file(file.path()).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(AppError::NotFound(format!("Preset {} not found", id)))
            }
            Err(e) => Err(e.into()),
        }
    }

    // ==================== FONTS ====================

    pub async fn list_fonts(&self) -> Result<Vec<CustomFont>, AppError> {
        let collection: FontCollection = self.fonts_file().read_or_default().await?;
        Ok(collection.fonts)
    }

    pub async fn create_font(&self, request: &CreateFontRequest) -> Result<CustomFont, AppError> {
        if request.name.trim().is_empty() {
            return Err(AppError::Validation("Font name is required".to_string()));
        }
        if request.font_family.trim().is_empty() {
            return Err(AppError::Validation("Font family is required".to_string()));
        }

        let _guard = self.write_lock.lock().await;
        let file = self.fonts_file();
        let mut collection: FontCollection = file.read_or_default().await?;

        let now = Utc::now().to_rfc3339();
        let font = CustomFont {
            id: uuid::Uuid::new_v4().to_string(),
            name: request.name.trim().to_string(),
            font_family: request.font_family.trim().to_string(),
            url: request.url.clone(),
            created_at: now.clone(),
            updated_at: now,
        };
        collection.fonts.push(font.clone());

        file.write(&collection).await?;
        Ok(font)
    }

    pub async fn update_font(&self, id: &str, request: &UpdateFontRequest) -> Result<CustomFont, AppError> {
        let _guard = self.write_lock.lock().await;
        let file = self.fonts_file();
        let mut collection: FontCollection = file.read_or_default().await?;

        let font = collection
            .fonts
            .iter_mut()
            .find(|f| f.id == id)
            .ok_or_else(|| AppError::NotFound(format!("Font {} not found", id)))?;

        if let Some(name) = &request.name {
            font.name = name.trim().to_string();
        }
        if let Some(family) = &request.font_family {
            font.font_family = family.trim().to_string();
        }
        if request.url.is_some() {
            font.url = request.url.clone();
        }
        font.updated_at = Utc::now().to_rfc3339();
        let updated = font.clone();

        file.write(&collection).await?;
        Ok(updated)
    }

    pub async fn delete_font(&self, id: &str) -> Result<(), AppError> {
        let _guard = self.write_lock.lock().await;
        let file = self.fonts_file();
        let mut collection: FontCollection = file.read_or_default().await?;

        let before = collection.fonts.len();
        collection.fonts.retain(|f| f.id != id);
        if collection.fonts.len() == before {
            return Err(AppError::NotFound(format!("Font {} not found", id)));
        }

        file.write(&collection).await?;
        Ok(())
    }
}
