//! Working data endpoints.

use axum::{
    extract::{Path, State},
    Form, Json,
};
use chrono::Utc;

use super::{error, notify, success, ApiResult};
use crate::models::{
    ApplyEditsRequest, DirtyState, MarkDirtyForm, OriginalData, ResetResult, SaveWorkingRequest,
    WorkingData,
};
use crate::AppState;

/// GET /api/templates/:id/working - Current working data, `null` if never edited.
pub async fn get_working(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Option<WorkingData>> {
    match state.versions.load_working_data(&id).await {
        Ok(data) => success(data),
        Err(e) => error(e),
    }
}

/// POST /api/templates/:id/working - Merge edits and mark dirty.
pub async fn apply_edits(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<ApplyEditsRequest>,
) -> ApiResult<WorkingData> {
    match state
        .versions
        .apply_edits(&id, request.texts, request.images)
        .await
    {
        Ok(data) => {
            notify(&state, &id, "workingUpdated");
            success(data)
        }
        Err(e) => error(e),
    }
}

/// PUT /api/templates/:id/working - Replace the working data and mark it dirty.
pub async fn save_working(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<SaveWorkingRequest>,
) -> ApiResult<WorkingData> {
    let data = WorkingData {
        template_id: id.clone(),
        last_modified: Utc::now().to_rfc3339(),
        texts: request.texts,
        images: request.images,
        is_dirty: true,
    };

    match state.versions.save_working_data(data).await {
        Ok(saved) => {
            notify(&state, &id, "workingSaved");
            success(saved)
        }
        Err(e) => error(e),
    }
}

/// DELETE /api/templates/:id/working - Reset to the original data.
pub async fn reset_working(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<ResetResult> {
    match state.versions.reset_to_original(&id).await {
        Ok(recovery) => {
            if recovery.is_some() {
                notify(&state, &id, "workingReset");
            }
            success(ResetResult {
                was_reset: recovery.is_some(),
                recovery_dir: recovery
                    .as_deref()
                    .and_then(|p| p.file_name())
                    .map(|name| name.to_string_lossy().into_owned()),
            })
        }
        Err(e) => error(e),
    }
}

/// GET /api/templates/:id/original
pub async fn get_original(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<OriginalData> {
    match state.versions.load_original(&id).await {
        Ok(data) => success(data),
        Err(e) => error(e),
    }
}

/// GET /api/templates/:id/dirty
pub async fn get_dirty(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<DirtyState> {
    match state.versions.dirty_state(&id).await {
        Ok(dirty) => success(dirty),
        Err(e) => error(e),
    }
}

/// POST /api/templates/:id/dirty - Set the dirty flag (form field `dirty`).
pub async fn mark_dirty(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Form(form): Form<MarkDirtyForm>,
) -> ApiResult<DirtyState> {
    match state.versions.mark_dirty(&id, form.dirty).await {
        Ok(data) => {
            notify(&state, &id, "dirtyChanged");
            success(DirtyState {
                is_dirty: data.is_dirty,
                has_working_data: true,
            })
        }
        Err(e) => error(e),
    }
}
