//! Color preset and custom font endpoints.

use axum::{
    extract::{Path, State},
    Json,
};

use super::{error, success, ApiResult};
use crate::errors::AppError;
use crate::models::{
    ColorPreset, CreateFontRequest, CreatePresetRequest, CustomFont, UpdateFontRequest,
    UpdatePresetRequest,
};
use crate::AppState;

/// GET /api/presets/colors - Most recently updated first.
pub async fn list_presets(State(state): State<AppState>) -> ApiResult<Vec<ColorPreset>> {
    match state.presets.list_presets().await {
        Ok(presets) => success(presets),
        Err(e) => error(e),
    }
}

/// GET /api/presets/colors/:id
pub async fn get_preset(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<ColorPreset> {
    match state.presets.get_preset(&id).await {
        Ok(Some(preset)) => success(preset),
        Ok(None) => error(AppError::NotFound(format!("Preset {} not found", id))),
        Err(e) => error(e),
    }
}

/// POST /api/presets/colors
pub async fn create_preset(
    State(state): State<AppState>,
    Json(request): Json<CreatePresetRequest>,
) -> ApiResult<ColorPreset> {
    match state.presets.create_preset(&request).await {
        Ok(preset) => success(preset),
        Err(e) => error(e),
    }
}

/// PUT /api/presets/colors/:id
pub async fn update_preset(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<UpdatePresetRequest>,
) -> ApiResult<ColorPreset> {
    match state.presets.update_preset(&id, &request).await {
        Ok(preset) => success(preset),
        Err(e) => error(e),
    }
}

/// DELETE /api/presets/colors/:id
pub async fn delete_preset(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<()> {
    match state.presets.delete_preset(&id).await {
        Ok(()) => success(()),
        Err(e) => error(e),
    }
}

/// GET /api/fonts
pub async fn list_fonts(State(state): State<AppState>) -> ApiResult<Vec<CustomFont>> {
    match state.presets.list_fonts().await {
        Ok(fonts) => success(fonts),
        Err(e) => error(e),
    }
}

/// POST /api/fonts
pub async fn create_font(
    State(state): State<AppState>,
    Json(request): Json<CreateFontRequest>,
) -> ApiResult<CustomFont> {
    match state.presets.create_font(&request).await {
        Ok(font) => success(font),
        Err(e) => error(e),
    }
}

/// PUT /api/fonts/:id
pub async fn update_font(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<UpdateFontRequest>,
) -> ApiResult<CustomFont> {
    match state.presets.update_font(&id, &request).await {
        Ok(font) => success(font),
        Err(e) => error(e),
    }
}

/// DELETE /api/fonts/:id
pub async fn delete_font(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<()> {
    match state.presets.delete_font(&id).await {
        Ok(()) => success(()),
        Err(e) => error(e),
    }
}
