//! Rendered template HTML and live-preview endpoints.

use std::collections::BTreeMap;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Html,
    Json,
};

use super::{error, success, ApiResponse, ApiResult};
use crate::errors::AppError;
use crate::models::{DocumentKind, SelectElementRequest};
use crate::preview::{EditorMessage, PreviewContent, PreviewMessage, PreviewState};
use crate::render::{overrides_from_keys, render_with, RenderOptions};
use crate::store::validate_id;
use crate::AppState;

type Values = BTreeMap<String, String>;

/// Texts and images of the working data, or of the original when never edited.
async fn current_values(state: &AppState, id: &str) -> Result<(Values, Values), AppError> {
    match state.versions.load_working_data(id).await? {
        Some(working) => Ok((working.texts, working.images)),
        None => {
            let original = state.versions.load_original(id).await?;
            Ok((original.texts, original.images))
        }
    }
}

/// GET /api/templates/:id/render - Template HTML with the current edits applied.
pub async fn render_template(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Html<String>, AppError> {
    validate_id("template", &id)?;

    let index = state.config.templates_dir.join(&id).join("index.html");
    let html = match tokio::fs::read_to_string(&index).await {
        Ok(html) => html,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(AppError::NotFound(format!("Template {} not found", id)));
        }
        Err(e) => return Err(e.into()),
    };

    let (texts, images) = current_values(&state, &id).await?;
    let prefix = format!("{}/{}", state.config.preview_prefix, id);
    let options = RenderOptions {
        base_href: Some(format!("{}/", prefix)),
        asset_prefix: Some(prefix),
        image_overrides: overrides_from_keys(&images),
    };

    tracing::debug!("Rendering template {} with {} text overrides", id, texts.len());
    let rendered = render_with(&html, &overrides_from_keys(&texts), &options);
    state.preview.attach(&id, &rendered);
    Ok(Html(rendered))
}

/// GET /api/templates/:id/preview/init - INIT_PREVIEW message for the preview iframe.
pub async fn preview_init(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<EditorMessage> {
    let (texts, images) = match current_values(&state, &id).await {
        Ok(values) => values,
        Err(e) => return error(e),
    };
    let colors = match state.versions.load_document(&id, DocumentKind::Colors).await {
        Ok(document) => serde_json::from_value(document).unwrap_or_default(),
        Err(e) => return error(e),
    };

    let message = EditorMessage::InitPreview {
        data: PreviewContent {
            texts,
            images,
            colors,
        },
        selected_element_id: None,
    };
    state.preview.init(&id, message.clone());
    success(message)
}

/// POST /api/templates/:id/preview/update - Queue an UPDATE_CONTENT for subscribers.
///
/// `data` is false when the update changes nothing in the rendered preview.
pub async fn preview_update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(message): Json<EditorMessage>,
) -> Result<(StatusCode, ApiResponse<bool>), AppError> {
    validate_id("template", &id)?;

    match message {
        EditorMessage::UpdateContent { data, .. } => {
            let queued = state.preview.push(&id, data);
            Ok((StatusCode::ACCEPTED, ApiResponse::new(queued)))
        }
        _ => Err(AppError::BadRequest(
            "Expected an UPDATE_CONTENT message".to_string(),
        )),
    }
}

/// POST /api/templates/:id/preview/select - Relay a click from the preview.
pub async fn preview_select(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<SelectElementRequest>,
) -> ApiResult<PreviewMessage> {
    match state.preview.select(&id, &request.element_id) {
        Some(message) => success(message),
        None => error(AppError::NotFound(format!(
            "Element {} is not in the rendered template {}",
            request.element_id, id
        ))),
    }
}

/// GET /api/templates/:id/preview/state
pub async fn preview_state(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<PreviewState> {
    match state.preview.state(&id) {
        Some(preview) => success(preview),
        None => error(AppError::NotFound(format!(
            "Template {} has not been rendered",
            id
        ))),
    }
}
