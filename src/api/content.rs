//! Content document endpoints.

use axum::{
    extract::{Path, State},
    Json,
};

use super::{error, notify, success, ApiResult};
use crate::models::{
    BatchContentRequest, ContentDocument, ContentSnapshotInfo, ContentUpdate, WriteContentRequest,
};
use crate::store::WriteOptions;
use crate::AppState;

/// GET /api/templates/:id/content
pub async fn get_content(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<ContentDocument> {
    match state.content.read(&id).await {
        Ok(document) => success(document),
        Err(e) => error(e),
    }
}

/// PUT /api/templates/:id/content - Replace the document, optionally snapshotting it.
pub async fn write_content(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<WriteContentRequest>,
) -> ApiResult<ContentDocument> {
    let options = WriteOptions {
        create_version: request.create_version,
    };
    match state.content.write(&id, request.document, options).await {
        Ok(document) => {
            notify(&state, &id, "contentWritten");
            success(document)
        }
        Err(e) => error(e),
    }
}

/// PATCH /api/templates/:id/content - Merge one partial record.
pub async fn update_content(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(update): Json<ContentUpdate>,
) -> ApiResult<ContentDocument> {
    match state
        .content
        .update(&id, update.section, &update.key, update.value)
        .await
    {
        Ok(document) => {
            notify(&state, &id, "contentUpdated");
            success(document)
        }
        Err(e) => error(e),
    }
}

/// PATCH /api/templates/:id/content/batch
pub async fn update_content_batch(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<BatchContentRequest>,
) -> ApiResult<ContentDocument> {
    match state.content.update_batch(&id, request.updates).await {
        Ok(document) => {
            notify(&state, &id, "contentUpdated");
            success(document)
        }
        Err(e) => error(e),
    }
}

/// GET /api/templates/:id/content/snapshots
pub async fn list_content_snapshots(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Vec<ContentSnapshotInfo>> {
    match state.content.list_snapshots(&id).await {
        Ok(snapshots) => success(snapshots),
        Err(e) => error(e),
    }
}
