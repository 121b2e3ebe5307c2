//! REST API module.
//!
//! Contains all API routes and handlers of the editor backend.

mod content;
mod design;
mod events;
mod media;
mod presets;
mod render;
mod versions;
mod working;

pub use content::*;
pub use design::*;
pub use events::*;
pub use media::*;
pub use presets::*;
pub use render::*;
pub use versions::*;
pub use working::*;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::errors::AppError;
use crate::events::ServerEvent;
use crate::AppState;

/// Success response envelope.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn new(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}

/// Response type that can be either success or error.
pub type ApiResult<T> = Result<ApiResponse<T>, AppError>;

/// Create a successful API response.
pub fn success<T: Serialize>(data: T) -> ApiResult<T> {
    Ok(ApiResponse::new(data))
}

/// Create an error API response.
pub fn error<T: Serialize>(err: AppError) -> ApiResult<T> {
    Err(err)
}

/// Tell SSE subscribers that a template changed.
fn notify(state: &AppState, template_id: &str, change: &str) {
    state
        .events
        .broadcast(ServerEvent::template_change(template_id, change));
}
