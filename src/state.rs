//! Application state management

use std::sync::Arc;

use crate::config::Config;
use crate::engine::PdfEngine;
use crate::store::Persistence;
use crate::viewer::Viewer;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: Config,
    viewer: Arc<Viewer>,
}

impl AppState {
    /// Create the application state around one viewer session
    ///
    /// `store` is `None` when local storage could not be opened; file
    /// persistence and notes are then unavailable.
    pub fn new(
        config: Config,
        engine: Arc<dyn PdfEngine>,
        store: Option<Arc<dyn Persistence>>,
    ) -> Self {
        let viewer = Arc::new(Viewer::new(engine, store, config.viewer.clone()));
        Self {
            inner: Arc::new(AppStateInner { config, viewer }),
        }
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    /// Get the viewer
    pub fn viewer(&self) -> &Arc<Viewer> {
        &self.inner.viewer
    }
}
