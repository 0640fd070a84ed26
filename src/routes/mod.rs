//! Route modules for the Folio viewer

pub mod health;
pub mod navigation;
pub mod notes;
pub mod pages;
pub mod search;
pub mod session;
pub mod view;

use axum::Router;

use crate::state::AppState;

/// Every `/api/v1` route
pub fn api_router() -> Router<AppState> {
    Router::new()
        .nest("/session", session::router())
        .nest("/navigation", navigation::router())
        .nest("/view", view::router())
        .nest("/pages", pages::router())
        .nest("/search", search::router())
        .nest("/notes", notes::router())
}
