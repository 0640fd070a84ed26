//! Page navigation
//!
//! Owns the session and serializes page changes against render
//! completions. While a render is in flight every navigation request is
//! dropped and reported as [`GoToOutcome::Busy`]; nothing is queued.

use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use super::state::{RenderGuard, RenderState, Session, SessionId, ViewState};
use crate::index::GlobalPageIndex;
use crate::messages;
use crate::render::{Container, PageRenderer, RenderOutcome, ZoomPolicy};
use crate::search::SearchPattern;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "camelCase")]
pub enum GoToOutcome {
    Rendered { page: usize },
    /// No documents are loaded
    NoDocuments,
    /// Dropped because another render is in flight
    #[serde(rename_all = "camelCase")]
    Busy {
        requested: usize,
        rendering: usize,
        message: String,
    },
    Unresolved { page: usize },
    /// Engine failure; the previous frame stays on screen
    Failed { page: usize, reason: String },
    /// The document set changed while rendering
    Superseded,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "step", rename_all = "camelCase")]
pub enum StepOutcome {
    Navigated(GoToOutcome),
    /// First or last page already shown
    AtBoundary,
    ReachedLastResult { message: String },
    ReachedFirstResult { message: String },
    NoDocuments,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", content = "scale", rename_all = "kebab-case")]
pub enum ZoomAction {
    FitWidth,
    FitHeight,
    In,
    Out,
    Reset,
    Custom(f32),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Forward,
    Backward,
}

pub struct NavigationController {
    session: Mutex<Session>,
    renderer: PageRenderer,
}

impl NavigationController {
    pub fn new(renderer: PageRenderer, container: Container) -> Self {
        Self {
            session: Mutex::new(Session::new(container)),
            renderer,
        }
    }

    pub fn renderer(&self) -> &PageRenderer {
        &self.renderer
    }

    pub(crate) fn with_session<R>(&self, f: impl FnOnce(&mut Session) -> R) -> R {
        f(&mut self.session.lock())
    }

    pub fn session_id(&self) -> SessionId {
        self.session.lock().id
    }

    pub fn index(&self) -> Arc<GlobalPageIndex> {
        Arc::clone(&self.session.lock().index)
    }

    pub fn view(&self) -> ViewState {
        self.session.lock().view
    }

    pub fn is_rendering(&self) -> bool {
        self.session.lock().view.render.is_rendering()
    }

    /// Synchronously drop the current document set and start a new session
    pub(crate) fn begin_session(&self) -> SessionId {
        self.session.lock().reset()
    }

    /// Install the index built for session `id`; false when `id` is stale
    pub(crate) fn install(&self, id: SessionId, index: GlobalPageIndex) -> bool {
        let mut session = self.session.lock();
        if session.id != id {
            return false;
        }
        session.index = Arc::new(index);
        true
    }

    /// Navigate to `target`, clamped into the loaded page range
    ///
    /// Without an explicit `pattern` the live search pattern is highlighted.
    pub async fn go_to(&self, target: i64, pattern: Option<SearchPattern>) -> GoToOutcome {
        let (guard, index, page, previous, zoom, container, pattern) = {
            let mut session = self.session.lock();
            let Some(page) = session.index.clamp(target) else {
                return GoToOutcome::NoDocuments;
            };
            let Some(guard) = RenderGuard::acquire(&self.session, &mut session, page) else {
                let rendering = match session.view.render {
                    RenderState::Rendering { target } => target,
                    RenderState::Idle => page,
                };
                tracing::debug!(requested = page, rendering, "Navigation dropped while rendering");
                return GoToOutcome::Busy {
                    requested: page,
                    rendering,
                    message: messages::PAGE_RENDERING.to_string(),
                };
            };

            let previous = session.view.current_page;
            session.view.current_page = page;
            let pattern = pattern.or_else(|| session.search.pattern.clone());
            (
                guard,
                Arc::clone(&session.index),
                page,
                previous,
                session.view.zoom,
                session.view.container,
                pattern,
            )
        };

        let outcome = self
            .renderer
            .render(&index, page, &zoom, container, pattern.as_ref())
            .await;

        let mut session = self.session.lock();
        if session.id != guard.session_id() {
            guard.finish(&mut session);
            return GoToOutcome::Superseded;
        }
        guard.finish(&mut session);

        match outcome {
            RenderOutcome::Rendered(frame) => {
                session.view.scale = frame.display_scale;
                session.overlays.clear();
                session.frame = Some(frame);
                GoToOutcome::Rendered { page }
            }
            RenderOutcome::Unresolved => {
                session.restore_shown_page(previous);
                GoToOutcome::Unresolved { page }
            }
            RenderOutcome::Failed { error, .. } => {
                session.restore_shown_page(previous);
                GoToOutcome::Failed {
                    page,
                    reason: error.to_string(),
                }
            }
        }
    }

    /// Re-render the current page with the current zoom and container
    pub async fn refresh(&self) -> GoToOutcome {
        let current = self.session.lock().view.current_page;
        self.go_to(current as i64, None).await
    }

    pub async fn next(&self) -> StepOutcome {
        self.step(Direction::Forward).await
    }

    pub async fn previous(&self) -> StepOutcome {
        self.step(Direction::Backward).await
    }

    /// Move one page, or one result page while visible results exist
    async fn step(&self, direction: Direction) -> StepOutcome {
        let target = {
            let session = self.session.lock();
            let total = session.index.total_pages();
            if total == 0 {
                return StepOutcome::NoDocuments;
            }
            let current = session.view.current_page;
            let results = session.search.visible();

            if !results.is_empty() {
                let next = match direction {
                    Direction::Forward => results.iter().find(|r| r.global_page > current),
                    Direction::Backward => results.iter().rev().find(|r| r.global_page < current),
                };
                match (next, direction) {
                    (Some(result), _) => result.global_page,
                    (None, Direction::Forward) => {
                        return StepOutcome::ReachedLastResult {
                            message: messages::LAST_RESULT.to_string(),
                        }
                    }
                    (None, Direction::Backward) => {
                        return StepOutcome::ReachedFirstResult {
                            message: messages::FIRST_RESULT.to_string(),
                        }
                    }
                }
            } else {
                match direction {
                    Direction::Forward if current < total => current + 1,
                    Direction::Backward if current > 1 => current - 1,
                    _ => return StepOutcome::AtBoundary,
                }
            }
        };

        StepOutcome::Navigated(self.go_to(target as i64, None).await)
    }

    /// Apply a zoom action and re-render the current page
    pub async fn zoom(&self, action: ZoomAction) -> GoToOutcome {
        {
            let mut session = self.session.lock();
            let current = session.view.scale;
            let zoom = &mut session.view.zoom;
            match action {
                ZoomAction::FitWidth => *zoom = ZoomPolicy::fit_width(),
                ZoomAction::FitHeight => *zoom = ZoomPolicy::fit_height(),
                ZoomAction::In => zoom.zoom_in(current),
                ZoomAction::Out => zoom.zoom_out(current),
                ZoomAction::Reset => zoom.reset(),
                ZoomAction::Custom(scale) => *zoom = ZoomPolicy::custom(scale),
            }
        }
        self.refresh().await
    }

    pub fn set_container(&self, container: Container) {
        self.session.lock().view.container = container;
    }
}
