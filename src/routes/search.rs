//! Search routes
//!
//! - POST /api/v1/search - Run a search over every loaded page
//! - GET /api/v1/search/results?file=NAME - Results, optionally for one file

use axum::{
    extract::{Query, State},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::search::FileFilter;
use crate::state::AppState;
use crate::viewer::{SearchOutcome, SearchSnapshot};

#[derive(Debug, Deserialize)]
pub struct SearchRequest {
    pub query: String,
}

#[derive(Debug, Deserialize)]
pub struct ResultsQuery {
    pub file: Option<String>,
}

#[derive(Serialize)]
pub struct SearchResponse {
    #[serde(flatten)]
    pub outcome: SearchOutcome,
    pub snapshot: SearchSnapshot,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(search))
        .route("/results", get(results))
}

async fn search(State(state): State<AppState>, Json(request): Json<SearchRequest>) -> Json<SearchResponse> {
    let outcome = state.viewer().search(&request.query).await;
    Json(SearchResponse {
        outcome,
        snapshot: state.viewer().search_snapshot(),
    })
}

/// Selecting a file also changes which results next/previous step through
async fn results(State(state): State<AppState>, Query(query): Query<ResultsQuery>) -> Json<SearchSnapshot> {
    let filter = FileFilter::from_param(query.file.as_deref());
    Json(state.viewer().set_filter(filter))
}
