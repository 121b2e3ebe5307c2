//! Design document and edited design endpoints.

use axum::{
    extract::{Path, State},
    Json,
};
use serde_json::Value;

use super::{error, notify, success, ApiResult};
use crate::errors::AppError;
use crate::models::{DesignHistoryEntry, DesignSaved, DocumentKind, SaveDesignRequest};
use crate::AppState;

fn document_kind(kind: &str) -> Result<DocumentKind, AppError> {
    DocumentKind::from_str(kind)
        .ok_or_else(|| AppError::NotFound(format!("Unknown document {}", kind)))
}

/// GET /api/templates/:id/documents/:kind
pub async fn get_document(
    State(state): State<AppState>,
    Path((id, kind)): Path<(String, String)>,
) -> ApiResult<Value> {
    let kind = document_kind(&kind)?;
    match state.versions.load_document(&id, kind).await {
        Ok(document) => success(document),
        Err(e) => error(e),
    }
}

/// PUT /api/templates/:id/documents/:kind
pub async fn save_document(
    State(state): State<AppState>,
    Path((id, kind)): Path<(String, String)>,
    Json(document): Json<Value>,
) -> ApiResult<Value> {
    let kind = document_kind(&kind)?;
    match state.versions.save_document(&id, kind, &document).await {
        Ok(()) => {
            notify(&state, &id, "documentSaved");
            success(document)
        }
        Err(e) => error(e),
    }
}

/// GET /api/templates/:id/design - Edited design, `null` if never saved.
pub async fn get_design(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Option<Value>> {
    match state.versions.load_design(&id).await {
        Ok(design) => success(design),
        Err(e) => error(e),
    }
}

/// PUT /api/templates/:id/design
pub async fn save_design(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<SaveDesignRequest>,
) -> ApiResult<DesignSaved> {
    match state
        .versions
        .save_design(&id, &request.description, request.design)
        .await
    {
        Ok(history_length) => {
            notify(&state, &id, "designSaved");
            success(DesignSaved { history_length })
        }
        Err(e) => error(e),
    }
}

/// GET /api/templates/:id/design/history - Oldest first.
pub async fn get_design_history(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Vec<DesignHistoryEntry>> {
    match state.versions.design_history(&id).await {
        Ok(history) => success(history),
        Err(e) => error(e),
    }
}
