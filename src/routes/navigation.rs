//! Navigation routes

use axum::{
    extract::State,
    routing::post,
    Json, Router,
};
use serde::Deserialize;

use crate::state::AppState;
use crate::viewer::{GoToOutcome, StepOutcome};

#[derive(Debug, Deserialize)]
pub struct GoToRequest {
    pub page: i64,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/goto", post(go_to))
        .route("/next", post(next))
        .route("/previous", post(previous))
        .route("/first", post(first))
        .route("/last", post(last))
}

async fn go_to(State(state): State<AppState>, Json(request): Json<GoToRequest>) -> Json<GoToOutcome> {
    Json(state.viewer().navigation().go_to(request.page, None).await)
}

async fn next(State(state): State<AppState>) -> Json<StepOutcome> {
    Json(state.viewer().navigation().next().await)
}

async fn previous(State(state): State<AppState>) -> Json<StepOutcome> {
    Json(state.viewer().navigation().previous().await)
}

async fn first(State(state): State<AppState>) -> Json<GoToOutcome> {
    Json(state.viewer().navigation().go_to(1, None).await)
}

async fn last(State(state): State<AppState>) -> Json<GoToOutcome> {
    Json(state.viewer().navigation().go_to(i64::MAX, None).await)
}
