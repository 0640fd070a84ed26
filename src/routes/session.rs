//! Session routes
//!
//! - POST /api/v1/session/files - Replace the document set (multipart)
//! - POST /api/v1/session/restore - Reload the saved document set
//! - GET /api/v1/session - Current view snapshot

use axum::{
    extract::{DefaultBodyLimit, Multipart, State},
    routing::{get, post},
    Json, Router,
};

use crate::error::{AppError, Result};
use crate::state::AppState;
use crate::store::FileBlob;
use crate::viewer::{LoadReport, ViewSnapshot};

/// Upper bound for one multipart upload
const MAX_UPLOAD_BYTES: usize = 512 * 1024 * 1024;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(snapshot))
        .route(
            "/files",
            post(load_files).layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)),
        )
        .route("/restore", post(restore))
}

async fn snapshot(State(state): State<AppState>) -> Json<ViewSnapshot> {
    Json(state.viewer().snapshot())
}

/// Every part carrying a file name is one input file
async fn load_files(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<LoadReport>> {
    let mut files = Vec::new();
    while let Some(field) = multipart.next_field().await? {
        let Some(name) = field.file_name().map(str::to_string) else {
            continue;
        };
        let bytes = field.bytes().await?;
        tracing::debug!(file = %name, size = bytes.len(), "Received upload part");
        files.push(FileBlob::new(name, bytes.to_vec()));
    }

    if files.is_empty() {
        return Err(AppError::BadRequest(crate::messages::NO_VALID_PDFS.to_string()));
    }

    let report = state.viewer().load_files(files).await?;
    Ok(Json(report))
}

async fn restore(State(state): State<AppState>) -> Result<Json<LoadReport>> {
    let report = state.viewer().restore_session().await?;
    Ok(Json(report))
}
