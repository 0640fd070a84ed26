//! Notes routes
//!
//! - GET /api/v1/notes - Notes on the displayed page
//! - POST /api/v1/notes - Pin a note on the displayed page
//! - PATCH /api/v1/notes/:id - Edit note content
//! - DELETE /api/v1/notes/:id - Delete a note
//! - DELETE /api/v1/notes/file/:file_id - Delete every note of a file
//! - GET /api/v1/notes/export - All notes as JSON
//! - POST /api/v1/notes/import - Import notes under fresh ids

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, patch, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::state::AppState;
use crate::store::{NewNote, Note};

#[derive(Debug, Deserialize)]
pub struct CreateNoteRequest {
    pub x: f64,
    pub y: f64,
    pub content: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateNoteRequest {
    pub content: String,
}

#[derive(Serialize)]
pub struct CreatedResponse {
    pub id: i64,
}

#[derive(Serialize)]
pub struct CountResponse {
    pub count: u64,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_current).post(create))
        .route("/:id", patch(update).delete(remove))
        .route("/file/:file_id", delete(clear_file))
        .route("/export", get(export))
        .route("/import", post(import))
}

async fn list_current(State(state): State<AppState>) -> Result<Json<Vec<Note>>> {
    Ok(Json(state.viewer().current_page_notes().await?))
}

async fn create(
    State(state): State<AppState>,
    Json(request): Json<CreateNoteRequest>,
) -> Result<(StatusCode, Json<CreatedResponse>)> {
    let id = state
        .viewer()
        .add_note(request.x, request.y, &request.content)
        .await?;
    Ok((StatusCode::CREATED, Json(CreatedResponse { id })))
}

async fn update(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(request): Json<UpdateNoteRequest>,
) -> Result<Json<Note>> {
    let note = state.viewer().notes()?.update_note(id, &request.content).await?;
    Ok(Json(note))
}

async fn remove(State(state): State<AppState>, Path(id): Path<i64>) -> Result<StatusCode> {
    state.viewer().notes()?.delete_note(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn clear_file(State(state): State<AppState>, Path(file_id): Path<String>) -> Result<Json<CountResponse>> {
    let count = state.viewer().notes()?.clear_notes_for_file(&file_id).await?;
    Ok(Json(CountResponse { count }))
}

async fn export(State(state): State<AppState>) -> Result<Json<Vec<Note>>> {
    Ok(Json(state.viewer().notes()?.export_all_notes().await?))
}

async fn import(State(state): State<AppState>, Json(notes): Json<Vec<NewNote>>) -> Result<Json<CountResponse>> {
    let notes = notes.into_iter().map(NewNote::normalized).collect();
    let count = state.viewer().notes()?.import_all_notes(notes).await?;
    Ok(Json(CountResponse { count: count as u64 }))
}
