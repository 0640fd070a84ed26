//! Error types for the Folio viewer

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::engine::EngineError;
use crate::index::IndexError;
use crate::messages;
use crate::search::SearchError;
use crate::store::StoreError;

/// HTTP-facing result type
pub type Result<T> = std::result::Result<T, AppError>;

/// Session-level viewer errors
#[derive(Error, Debug)]
pub enum ViewerError {
    #[error("{}", messages::NO_VALID_PDFS)]
    NoValidDocuments,

    #[error("{}", messages::LOAD_PDF_FIRST)]
    NoDocumentsLoaded,

    #[error("Document set changed while loading")]
    Superseded,

    #[error("{}", messages::STORE_UNAVAILABLE)]
    StoreUnavailable,

    #[error("Capability disabled: {0}")]
    CapabilityDisabled(&'static str),

    #[error("Page not found: {0}")]
    PageNotFound(usize),

    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error(transparent)]
    Index(#[from] IndexError),

    #[error(transparent)]
    Search(#[from] SearchError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Image encoding error: {0}")]
    Image(#[from] image::ImageError),
}

/// Application error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error(transparent)]
    Viewer(#[from] ViewerError),

    #[error("Multipart error: {0}")]
    Multipart(#[from] axum::extract::multipart::MultipartError),
}

/// Error response body
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        AppError::Viewer(ViewerError::Store(err))
    }
}

impl AppError {
    fn parts(&self) -> (StatusCode, &'static str, String) {
        match self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg.clone()),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg.clone()),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, "conflict", msg.clone()),
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "An internal error occurred".to_string(),
                )
            }
            AppError::Multipart(e) => (StatusCode::BAD_REQUEST, "bad_request", e.to_string()),
            AppError::Viewer(e) => match e {
                ViewerError::NoValidDocuments | ViewerError::NoDocumentsLoaded => {
                    (StatusCode::BAD_REQUEST, "bad_request", e.to_string())
                }
                ViewerError::Search(_) => (StatusCode::BAD_REQUEST, "invalid_pattern", e.to_string()),
                ViewerError::Superseded => (StatusCode::CONFLICT, "superseded", e.to_string()),
                ViewerError::PageNotFound(_) | ViewerError::Engine(EngineError::PageNotFound(_)) => {
                    (StatusCode::NOT_FOUND, "not_found", e.to_string())
                }
                ViewerError::Store(StoreError::NotFound(what)) => {
                    (StatusCode::NOT_FOUND, "not_found", format!("Not found: {}", what))
                }
                ViewerError::StoreUnavailable
                | ViewerError::CapabilityDisabled(_)
                | ViewerError::Store(StoreError::NotInitialized) => (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "capability_unavailable",
                    e.to_string(),
                ),
                ViewerError::Store(err) => {
                    tracing::error!("Store error: {}", err);
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "database_error",
                        "Database error".to_string(),
                    )
                }
                ViewerError::Engine(err) => {
                    tracing::error!("Engine error: {}", err);
                    (
                        StatusCode::UNPROCESSABLE_ENTITY,
                        "engine_error",
                        err.to_string(),
                    )
                }
                ViewerError::Index(err) => (StatusCode::BAD_REQUEST, "bad_request", err.to_string()),
                ViewerError::Image(err) => {
                    tracing::error!("Image error: {}", err);
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "encoding_error",
                        "Failed to encode image".to_string(),
                    )
                }
            },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_type, message) = self.parts();

        let body = Json(ErrorResponse {
            error: error_type.to_string(),
            message,
            details: if cfg!(debug_assertions) {
                Some(self.to_string())
            } else {
                None
            },
        });

        (status, body).into_response()
    }
}
