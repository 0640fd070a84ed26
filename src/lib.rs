//! Folio Viewer Library
//!
//! Multi-document PDF viewer core. Several PDFs are flattened into one
//! global page space that can be navigated, rendered and searched as a
//! single document.
//!
//! # Modules
//!
//! - `engine`: PDF engine contract and the MuPDF implementation
//! - `index`: Global page index over an ordered document set
//! - `render`: Display-scale computation, rasterization and text layout
//! - `search`: Pattern compilation and concurrent cross-document search
//! - `viewer`: Session state, navigation and file loading
//! - `store`: Persisted file set and notes

pub mod config;
pub mod engine;
pub mod error;
pub mod index;
pub mod messages;
pub mod render;
pub mod routes;
pub mod search;
pub mod state;
pub mod store;
pub mod viewer;

use axum::{routing::get, Router};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use state::AppState;

/// Build the HTTP application
pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(routes::health::health_check))
        .route("/api/v1/health", get(routes::health::health_check))
        .nest("/api/v1", routes::api_router())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use axum_test::TestServer;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::config::Config;
    use crate::engine::testing::ScriptedEngine;
    use crate::engine::PdfEngine;
    use crate::store::{FileBlob, Persistence, SqliteStore};

    fn engine() -> Arc<dyn PdfEngine> {
        Arc::new(
            ScriptedEngine::new()
                .with_text_document("a.pdf", &[&["intro"], &["the keyword"], &["outro"]])
                .with_text_document("b.pdf", &[&["keyword again"], &["end"]]),
        )
    }

    fn config() -> Config {
        let mut config = Config::default();
        config.viewer.container_width = 300.0;
        config.viewer.container_height = 400.0;
        config
    }

    async fn loaded_state() -> AppState {
        let state = AppState::new(config(), engine(), None);
        state
            .viewer()
            .load_files(vec![
                FileBlob::new("a.pdf", b"%PDF".to_vec()),
                FileBlob::new("b.pdf", b"%PDF".to_vec()),
            ])
            .await
            .unwrap();
        state
    }

    #[tokio::test]
    async fn test_health() {
        let app = app(AppState::new(config(), engine(), None));
        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_navigation_endpoints() {
        let server = TestServer::new(app(loaded_state().await)).unwrap();

        let body: Value = server
            .post("/api/v1/navigation/goto")
            .json(&json!({ "page": 4 }))
            .await
            .json();
        assert_eq!(body, json!({ "outcome": "rendered", "page": 4 }));

        let snapshot: Value = server.get("/api/v1/session").await.json();
        assert_eq!(snapshot["indicator"], "Page 4 / 5 (File: b.pdf)");
        assert_eq!(snapshot["documents"][1]["startPage"], 4);

        let body: Value = server.post("/api/v1/navigation/last").await.json();
        assert_eq!(body["page"], 5);
        let body: Value = server.post("/api/v1/navigation/next").await.json();
        assert_eq!(body["step"], "atBoundary");

        let share: Value = server.get("/api/v1/pages/current/share").await.json();
        assert_eq!(share["title"], "PDF Global Page 5");
        assert_eq!(share["text"], "From page 2 of b.pdf (PDF Tool)");
    }

    #[tokio::test]
    async fn test_search_endpoints() {
        let server = TestServer::new(app(loaded_state().await)).unwrap();

        let body: Value = server
            .post("/api/v1/search")
            .json(&json!({ "query": "keyword" }))
            .await
            .json();
        assert_eq!(body["outcome"], "matches");
        assert_eq!(body["count"], 2);
        assert_eq!(body["snapshot"]["documents"], json!(["a.pdf", "b.pdf"]));

        let filtered: Value = server
            .get("/api/v1/search/results")
            .add_query_param("file", "b.pdf")
            .await
            .json();
        assert_eq!(filtered["results"].as_array().unwrap().len(), 1);
        assert_eq!(filtered["results"][0]["globalPage"], 4);

        let invalid: Value = server
            .post("/api/v1/search")
            .json(&json!({ "query": "/(unterminated/" }))
            .await
            .json();
        assert_eq!(invalid["outcome"], "invalidPattern");
        assert_eq!(invalid["snapshot"]["results"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_page_text_without_documents() {
        let server = TestServer::new(app(AppState::new(config(), engine(), None))).unwrap();
        let response = server.get("/api/v1/pages/current/text").await;
        response.assert_status(StatusCode::BAD_REQUEST);
        let body: Value = response.json();
        assert_eq!(body["message"], "Please load a PDF file first.");
    }

    #[tokio::test]
    async fn test_notes_endpoints() {
        let dir = tempfile::TempDir::new().unwrap();
        let store = SqliteStore::open(&dir.path().join("folio.db")).await.unwrap();
        store.initialize().await.unwrap();
        let state = AppState::new(config(), engine(), Some(Arc::new(store)));
        state
            .viewer()
            .load_files(vec![FileBlob::new("a.pdf", b"%PDF".to_vec())])
            .await
            .unwrap();
        let server = TestServer::new(app(state)).unwrap();

        let created = server
            .post("/api/v1/notes")
            .json(&json!({ "x": 0.1, "y": 0.2, "content": "remember" }))
            .await;
        created.assert_status(StatusCode::CREATED);
        let id = created.json::<Value>()["id"].as_i64().unwrap();

        let updated: Value = server
            .patch(&format!("/api/v1/notes/{}", id))
            .json(&json!({ "content": "edited" }))
            .await
            .json();
        assert_eq!(updated["content"], "edited");
        assert_eq!(updated["fileId"], "a.pdf");

        let exported: Value = server.get("/api/v1/notes/export").await.json();
        let imported: Value = server
            .post("/api/v1/notes/import")
            .json(&exported)
            .await
            .json();
        assert_eq!(imported["count"], 1);

        let listed: Value = server.get("/api/v1/notes").await.json();
        assert_eq!(listed.as_array().unwrap().len(), 2);

        let cleared: Value = server.delete("/api/v1/notes/file/a.pdf").await.json();
        assert_eq!(cleared["count"], 2);
        server
            .delete(&format!("/api/v1/notes/{}", id))
            .await
            .assert_status(StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_notes_without_store() {
        let server = TestServer::new(app(loaded_state().await)).unwrap();
        server
            .get("/api/v1/notes")
            .await
            .assert_status(StatusCode::SERVICE_UNAVAILABLE);
    }
}
