//! Session state shared by navigation, loading and search

use std::sync::Arc;

use parking_lot::Mutex;
use serde::Serialize;

use crate::index::GlobalPageIndex;
use crate::render::{Container, Overlays, RenderedPage, ZoomPolicy, DEFAULT_SCALE};
use crate::search::{filter_results, FileFilter, SearchPattern, SearchResult};

/// Generation counter of the loaded document set
///
/// Async work captures the id when it starts and drops its result when the
/// live id has moved on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct SessionId(u64);

impl SessionId {
    pub fn next(self) -> Self {
        Self(self.0.wrapping_add(1))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum RenderState {
    #[default]
    Idle,
    Rendering { target: usize },
}

impl RenderState {
    pub fn is_rendering(&self) -> bool {
        matches!(self, Self::Rendering { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewState {
    /// 0 while no documents are loaded
    pub current_page: usize,
    pub zoom: ZoomPolicy,
    /// Display scale of the last rendered frame
    pub scale: f32,
    pub render: RenderState,
    pub container: Container,
}

impl ViewState {
    pub fn new(container: Container) -> Self {
        Self {
            current_page: 0,
            zoom: ZoomPolicy::default(),
            scale: DEFAULT_SCALE,
            render: RenderState::Idle,
            container,
        }
    }
}

/// Search state of a session
#[derive(Debug, Default)]
pub(crate) struct SearchState {
    pub query: String,
    pub pattern: Option<SearchPattern>,
    pub results: Vec<SearchResult>,
    pub filter: FileFilter,
    /// Bumped by every accepted query; a running search whose generation
    /// is no longer current discards its results
    pub generation: u64,
}

impl SearchState {
    /// Start a new query and return its generation
    pub fn begin(&mut self) -> u64 {
        self.generation = self.generation.wrapping_add(1);
        self.generation
    }

    /// Drop query, results and filter; a running search becomes stale
    pub fn clear(&mut self) {
        let generation = self.generation.wrapping_add(1);
        *self = Self {
            generation,
            ..Self::default()
        };
    }

    pub fn visible(&self) -> Vec<SearchResult> {
        filter_results(&self.results, &self.filter)
    }
}

/// Everything tied to one loaded document set
pub(crate) struct Session {
    pub id: SessionId,
    pub index: Arc<GlobalPageIndex>,
    pub view: ViewState,
    pub frame: Option<RenderedPage>,
    pub overlays: Overlays,
    pub search: SearchState,
}

impl Session {
    pub fn new(container: Container) -> Self {
        Self {
            id: SessionId::default(),
            index: Arc::new(GlobalPageIndex::empty()),
            view: ViewState::new(container),
            frame: None,
            overlays: Overlays::default(),
            search: SearchState::default(),
        }
    }

    /// Point the view back at the displayed frame after a failed render
    ///
    /// Falls back to `previous` when nothing has been displayed yet.
    pub fn restore_shown_page(&mut self, previous: usize) {
        self.view.current_page = self
            .frame
            .as_ref()
            .map(|frame| frame.entry.global_page)
            .unwrap_or(previous);
    }

    /// Start a new session with an empty index; zoom and container carry over
    pub fn reset(&mut self) -> SessionId {
        self.id = self.id.next();
        self.index = Arc::new(GlobalPageIndex::empty());
        self.view = ViewState {
            zoom: self.view.zoom,
            ..ViewState::new(self.view.container)
        };
        self.frame = None;
        self.overlays.clear();
        self.search.clear();
        self.id
    }
}

/// Holds the render flag for one in-flight render
///
/// Dropping an unfinished guard returns the flag to idle, so an abandoned
/// render never leaves the session busy.
pub(crate) struct RenderGuard<'a> {
    session: &'a Mutex<Session>,
    id: SessionId,
    target: usize,
    armed: bool,
}

impl<'a> RenderGuard<'a> {
    /// Mark `session` as rendering `target`; `None` when a render is already running
    pub fn acquire(session: &'a Mutex<Session>, state: &mut Session, target: usize) -> Option<Self> {
        if state.view.render.is_rendering() {
            return None;
        }
        state.view.render = RenderState::Rendering { target };
        Some(Self {
            session,
            id: state.id,
            target,
            armed: true,
        })
    }

    pub fn session_id(&self) -> SessionId {
        self.id
    }

    /// Clear the flag while already holding the session lock
    pub fn finish(mut self, state: &mut Session) {
        self.release(state);
        self.armed = false;
    }

    fn release(&self, state: &mut Session) {
        if state.id == self.id && state.view.render == (RenderState::Rendering { target: self.target }) {
            state.view.render = RenderState::Idle;
        }
    }
}

impl Drop for RenderGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            let mut state = self.session.lock();
            self.release(&mut state);
        }
    }
}
