//! Zoom and viewport routes

use axum::{
    extract::State,
    http::StatusCode,
    routing::post,
    Json, Router,
};
use serde::Deserialize;

use crate::error::{AppError, Result};
use crate::render::Container;
use crate::state::AppState;
use crate::viewer::{GoToOutcome, ZoomAction};

#[derive(Debug, Deserialize)]
pub struct ResizeRequest {
    pub width: f32,
    pub height: f32,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/zoom", post(zoom))
        .route("/resize", post(resize))
}

async fn zoom(State(state): State<AppState>, Json(action): Json<ZoomAction>) -> Result<Json<GoToOutcome>> {
    if let ZoomAction::Custom(scale) = action {
        if !scale.is_finite() || scale <= 0.0 {
            return Err(AppError::BadRequest(format!("Invalid scale: {}", scale)));
        }
    }
    Ok(Json(state.viewer().navigation().zoom(action).await))
}

/// Accepted immediately; the re-render happens once resizing settles
async fn resize(State(state): State<AppState>, Json(request): Json<ResizeRequest>) -> Result<StatusCode> {
    if !(request.width > 0.0 && request.height > 0.0) {
        return Err(AppError::BadRequest("Container size must be positive".to_string()));
    }
    state
        .viewer()
        .resize(Container::new(request.width, request.height));
    Ok(StatusCode::ACCEPTED)
}
