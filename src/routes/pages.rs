//! Current page routes
//!
//! - GET /api/v1/pages/current/text-layer - Positioned runs and overlays
//! - GET /api/v1/pages/current/text - Page text for copying
//! - GET /api/v1/pages/current/share - Share title and text
//! - GET /api/v1/pages/current/image - Rendered page as PNG
//! - POST /api/v1/pages/current/strokes - Add a highlighter stroke
//! - DELETE /api/v1/pages/current/strokes - Clear highlighter strokes
//! - POST /api/v1/pages/current/paragraph - Capture the paragraph at a point
//! - GET /api/v1/pages/:page/thumbnail - Thumbnail PNG

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;

use crate::error::{AppError, Result};
use crate::messages;
use crate::render::{Point, Stroke};
use crate::state::AppState;
use crate::viewer::{ShareDescriptor, TextLayer};

#[derive(Serialize)]
pub struct PageTextResponse {
    pub text: String,
    pub message: &'static str,
}

#[derive(Serialize)]
pub struct ParagraphResponse {
    pub text: String,
    pub message: &'static str,
}

#[derive(Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/current/text-layer", get(text_layer))
        .route("/current/text", get(page_text))
        .route("/current/share", get(share))
        .route("/current/image", get(image))
        .route("/current/strokes", post(add_stroke).delete(clear_strokes))
        .route("/current/paragraph", post(paragraph))
        .route("/:page/thumbnail", get(thumbnail))
}

async fn text_layer(State(state): State<AppState>) -> Result<Json<TextLayer>> {
    state
        .viewer()
        .text_layer()
        .map(Json)
        .ok_or_else(|| AppError::NotFound(messages::PAGE_INFO_ERROR.to_string()))
}

async fn page_text(State(state): State<AppState>) -> Result<Json<PageTextResponse>> {
    let text = state.viewer().current_page_text().await?;
    Ok(Json(PageTextResponse {
        text,
        message: messages::TEXT_COPIED,
    }))
}

async fn share(State(state): State<AppState>) -> Result<Json<ShareDescriptor>> {
    Ok(Json(state.viewer().share()?))
}

async fn image(State(state): State<AppState>) -> Result<Response> {
    let png = state.viewer().current_page_png()?;
    Ok(([(header::CONTENT_TYPE, "image/png")], png).into_response())
}

async fn add_stroke(State(state): State<AppState>, Json(stroke): Json<Stroke>) -> Result<StatusCode> {
    if state.viewer().add_stroke(stroke) {
        Ok(StatusCode::CREATED)
    } else {
        Err(AppError::BadRequest("Stroke needs a displayed page and two points".to_string()))
    }
}

async fn clear_strokes(State(state): State<AppState>) -> Json<MessageResponse> {
    Json(MessageResponse {
        message: state.viewer().clear_strokes(),
    })
}

async fn paragraph(State(state): State<AppState>, Json(point): Json<Point>) -> Result<Json<ParagraphResponse>> {
    let text = state
        .viewer()
        .select_paragraph(point.x, point.y)
        .ok_or_else(|| AppError::NotFound("No text at this point".to_string()))?;
    Ok(Json(ParagraphResponse {
        text,
        message: messages::PARAGRAPH_COPIED,
    }))
}

async fn thumbnail(State(state): State<AppState>, Path(page): Path<usize>) -> Result<Response> {
    let png = state.viewer().thumbnail(page).await?;
    Ok(([(header::CONTENT_TYPE, "image/png")], png.as_ref().clone()).into_response())
}
