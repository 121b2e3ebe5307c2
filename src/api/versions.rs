//! Version history endpoints.

use axum::{
    extract::{Path, Query, State},
    Form,
};

use super::{error, notify, success, ApiResult};
use crate::models::{
    CompareQuery, CreateVersionForm, RestoreVersionForm, VersionDiff, VersionEntry, WorkingData,
};
use crate::AppState;

/// GET /api/templates/:id/versions - Newest first.
pub async fn list_versions(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Vec<VersionEntry>> {
    match state.versions.list_versions(&id).await {
        Ok(versions) => success(versions),
        Err(e) => error(e),
    }
}

/// POST /api/templates/:id/versions - Snapshot the working data.
pub async fn create_version(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Form(form): Form<CreateVersionForm>,
) -> ApiResult<VersionEntry> {
    match state.versions.create_version(&id, &form.description).await {
        Ok(entry) => {
            notify(&state, &id, "versionCreated");
            success(entry)
        }
        Err(e) => error(e),
    }
}

/// POST /api/templates/:id/versions/restore
pub async fn restore_version(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Form(form): Form<RestoreVersionForm>,
) -> ApiResult<WorkingData> {
    match state.versions.restore_version(&id, &form.version_id).await {
        Ok(data) => {
            notify(&state, &id, "versionRestored");
            success(data)
        }
        Err(e) => error(e),
    }
}

/// DELETE /api/templates/:id/versions/:version_id
pub async fn delete_version(
    State(state): State<AppState>,
    Path((id, version_id)): Path<(String, String)>,
) -> ApiResult<()> {
    match state.versions.delete_version(&id, &version_id).await {
        Ok(()) => {
            notify(&state, &id, "versionDeleted");
            success(())
        }
        Err(e) => error(e),
    }
}

/// GET /api/templates/:id/versions/compare?a=&b=
pub async fn compare_versions(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<CompareQuery>,
) -> ApiResult<VersionDiff> {
    match state.versions.compare_versions(&id, &query.a, &query.b).await {
        Ok(diff) => success(diff),
        Err(e) => error(e),
    }
}
