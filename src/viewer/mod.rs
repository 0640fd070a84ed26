//! Viewer session facade
//!
//! Ties the engine, index, renderer, search engine and store together
//! behind one object owned by the application. All mutable session state
//! lives in the [`NavigationController`]; async work captures the
//! [`SessionId`] it started under and discards its result when the document
//! set has been replaced in the meantime.

mod loader;
mod navigation;
mod resize;
mod state;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use serde::Serialize;

use crate::config::{Capabilities, ViewerConfig};
use crate::engine::{PdfEngine, Viewport};
use crate::error::ViewerError;
use crate::index::{DocumentSlot, GlobalPageIndex};
use crate::messages;
use crate::render::{Container, Overlays, PageRenderer, Stroke, TextRun};
use crate::search::{compile_pattern, document_names, FileFilter, SearchEngine, SearchResult};
use crate::store::{FileBlob, NewNote, Note, Persistence};

pub use loader::{decode_all, partition_candidates, LoadReport};
pub use navigation::{GoToOutcome, NavigationController, StepOutcome, ZoomAction};
pub use resize::{Debouncer, DEFAULT_RESIZE_DEBOUNCE_MS};
pub use state::{RenderState, SessionId, ViewState};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "camelCase")]
pub enum SearchOutcome {
    /// Empty query; results cleared
    Cleared,
    InvalidPattern { message: String },
    NoDocuments { message: String },
    NoMatches { message: String },
    Matches { count: usize, message: String },
    /// The document set changed while searching; results discarded
    Superseded,
}

/// Current results as shown in the results panel
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchSnapshot {
    pub query: String,
    pub filter: FileFilter,
    pub results: Vec<SearchResult>,
    /// Filter choices: distinct document names of the full result set
    pub documents: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewSnapshot {
    pub session: SessionId,
    pub view: ViewState,
    pub total_pages: usize,
    pub indicator: String,
    /// Per-file jump list; empty when file switching is disabled
    pub documents: Vec<DocumentSlot>,
    pub capabilities: Capabilities,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TextLayer {
    pub global_page: usize,
    pub viewport: Viewport,
    pub runs: Vec<TextRun>,
    pub overlays: Overlays,
}

/// Metadata for sharing the current page
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShareDescriptor {
    pub title: String,
    pub text: String,
}

pub struct Viewer {
    engine: Arc<dyn PdfEngine>,
    store: Option<Arc<dyn Persistence>>,
    nav: NavigationController,
    search: SearchEngine,
    resize: Debouncer,
    thumbnails: Mutex<HashMap<(SessionId, usize), Arc<Vec<u8>>>>,
    /// Serializes file-set writes so the newest load is written last
    persist_lock: tokio::sync::Mutex<()>,
    config: ViewerConfig,
}

impl Viewer {
    pub fn new(
        engine: Arc<dyn PdfEngine>,
        store: Option<Arc<dyn Persistence>>,
        config: ViewerConfig,
    ) -> Self {
        Self {
            engine,
            store,
            nav: NavigationController::new(
                PageRenderer::new(config.render_settings()),
                config.container(),
            ),
            search: SearchEngine::default(),
            resize: Debouncer::new(Duration::from_millis(config.resize_debounce_ms)),
            thumbnails: Mutex::new(HashMap::new()),
            persist_lock: tokio::sync::Mutex::new(()),
            config,
        }
    }

    pub fn navigation(&self) -> &NavigationController {
        &self.nav
    }

    pub fn capabilities(&self) -> Capabilities {
        self.config.capabilities
    }

    // Loading

    /// Replace the document set with `files`
    pub async fn load_files(&self, files: Vec<FileBlob>) -> Result<LoadReport, ViewerError> {
        self.load(files, self.config.persist_files).await
    }

    /// Reload the file set saved by the last successful load
    pub async fn restore_session(&self) -> Result<LoadReport, ViewerError> {
        let store = self.store.as_ref().ok_or(ViewerError::StoreUnavailable)?;
        let files = store.get_files().await?;
        if files.is_empty() {
            return Err(ViewerError::NoValidDocuments);
        }
        tracing::info!(files = files.len(), "Restoring saved session");
        self.load(files, false).await
    }

    async fn load(&self, files: Vec<FileBlob>, persist: bool) -> Result<LoadReport, ViewerError> {
        let (candidates, mut skipped) = partition_candidates(files);
        if candidates.is_empty() {
            return Err(ViewerError::NoValidDocuments);
        }

        let id = self.nav.begin_session();
        self.search.retain_session(id);
        self.thumbnails.lock().clear();

        let (documents, failed) = decode_all(self.engine.as_ref(), &candidates).await;
        if self.nav.session_id() != id {
            tracing::debug!("Discarding superseded load");
            return Err(ViewerError::Superseded);
        }
        if documents.is_empty() {
            return Err(ViewerError::NoValidDocuments);
        }

        let index = GlobalPageIndex::build(documents)?;
        let slots = index.slots().to_vec();
        let total_pages = index.total_pages();
        if !self.nav.install(id, index) {
            return Err(ViewerError::Superseded);
        }

        if persist {
            let decoded: Vec<FileBlob> = candidates
                .into_iter()
                .filter(|file| !failed.contains(&file.name))
                .collect();
            self.persist_files(id, &decoded).await;
        }
        skipped.extend(failed);

        if self.nav.session_id() != id {
            tracing::debug!("Discarding superseded load");
            return Err(ViewerError::Superseded);
        }
        let first = self.nav.go_to(1, None).await;
        tracing::info!(
            documents = slots.len(),
            pages = total_pages,
            skipped = skipped.len(),
            first_page = ?first,
            "Loaded document set"
        );

        if !self.config.capabilities.thumbnails_lazy {
            self.prerender_thumbnails(id, total_pages).await;
        }

        Ok(LoadReport::new(slots, total_pages, skipped))
    }

    async fn persist_files(&self, id: SessionId, files: &[FileBlob]) {
        let Some(store) = &self.store else {
            return;
        };
        let _serial = self.persist_lock.lock().await;
        if self.nav.session_id() != id {
            tracing::debug!("Skipping file-set write of superseded load");
            return;
        }
        if let Err(e) = store.save_files(files).await {
            tracing::warn!(error = %e, "{}", messages::STORE_UNAVAILABLE);
        }
    }

    // Search

    /// Run a search for `input` over every loaded page
    ///
    /// A pattern that fails to compile leaves the previous results in place.
    pub async fn search(&self, input: &str) -> SearchOutcome {
        let pattern = match compile_pattern(input) {
            Ok(Some(pattern)) => pattern,
            Ok(None) => {
                self.nav.with_session(|s| s.search.clear());
                return SearchOutcome::Cleared;
            }
            Err(e) => {
                tracing::debug!(query = input, error = %e, "Rejected search pattern");
                return SearchOutcome::InvalidPattern {
                    message: e.to_string(),
                };
            }
        };

        let (id, generation, index) = self
            .nav
            .with_session(|s| (s.id, s.search.begin(), Arc::clone(&s.index)));
        if index.is_empty() {
            return SearchOutcome::NoDocuments {
                message: messages::LOAD_PDF_FIRST.to_string(),
            };
        }

        let results = self.search.search(&pattern, &index, id).await;

        let first_visible = self.nav.with_session(|s| {
            if s.id != id || s.search.generation != generation {
                return None;
            }
            let names = document_names(&results);
            if let FileFilter::Document(name) = &s.search.filter {
                if !names.contains(name) {
                    s.search.filter = FileFilter::All;
                }
            }
            s.search.query = input.trim().to_string();
            s.search.pattern = Some(pattern);
            s.search.results = results;
            let count = s.search.results.len();
            Some((s.search.visible().first().map(|r| r.global_page), count))
        });

        let Some((first_visible, count)) = first_visible else {
            tracing::debug!(query = input, "Discarding superseded search");
            return SearchOutcome::Superseded;
        };

        match first_visible {
            Some(page) => {
                self.nav.go_to(page as i64, None).await;
                SearchOutcome::Matches {
                    count,
                    message: messages::matches_found(count),
                }
            }
            None => {
                self.nav.refresh().await;
                SearchOutcome::NoMatches {
                    message: messages::NO_MATCHES.to_string(),
                }
            }
        }
    }

    /// Restrict visible results to one document, or all
    pub fn set_filter(&self, filter: FileFilter) -> SearchSnapshot {
        self.nav.with_session(|s| s.search.filter = filter);
        self.search_snapshot()
    }

    pub fn search_snapshot(&self) -> SearchSnapshot {
        self.nav.with_session(|s| {
            let results = s.search.visible();
            let message = match (&s.search.filter, results.is_empty(), s.search.query.is_empty()) {
                (_, false, _) | (_, _, true) => None,
                (FileFilter::Document(_), true, false) => Some(messages::NO_RESULTS_IN_FILE.to_string()),
                (FileFilter::All, true, false) => Some(messages::KEYWORD_NOT_FOUND.to_string()),
            };
            SearchSnapshot {
                query: s.search.query.clone(),
                filter: s.search.filter.clone(),
                documents: document_names(&s.search.results),
                results,
                message,
            }
        })
    }

    // Page information

    pub fn snapshot(&self) -> ViewSnapshot {
        let indicator = self.indicator();
        self.nav.with_session(|s| ViewSnapshot {
            session: s.id,
            view: s.view,
            total_pages: s.index.total_pages(),
            indicator,
            documents: if self.config.capabilities.file_switch {
                s.index.slots().to_vec()
            } else {
                Vec::new()
            },
            capabilities: self.config.capabilities,
        })
    }

    /// "Page X / Y", naming the file when more than one is loaded
    pub fn indicator(&self) -> String {
        self.nav.with_session(|s| {
            let total = s.index.total_pages();
            let entry = s.index.resolve(s.view.current_page as i64);
            let document = entry
                .filter(|_| s.index.document_count() > 1)
                .map(|e| e.document_name.as_str());
            messages::page_indicator(s.view.current_page, total, document)
        })
    }

    /// Concatenated text of `global_page`
    pub async fn page_text(&self, global_page: usize) -> Result<String, ViewerError> {
        let (id, index) = self.nav.with_session(|s| (s.id, Arc::clone(&s.index)));
        if index.is_empty() {
            return Err(ViewerError::NoDocumentsLoaded);
        }
        let entry = index
            .resolve(global_page as i64)
            .ok_or(ViewerError::PageNotFound(global_page))?;
        let text = self.search.page_text(&index, entry, id).await?;
        Ok(text.as_str().to_string())
    }

    pub async fn current_page_text(&self) -> Result<String, ViewerError> {
        let current = self.nav.view().current_page;
        self.page_text(current).await
    }

    /// Text layer of the displayed page
    pub fn text_layer(&self) -> Option<TextLayer> {
        self.nav.with_session(|s| {
            s.frame.as_ref().map(|frame| TextLayer {
                global_page: frame.entry.global_page,
                viewport: frame.viewport,
                runs: frame.runs.clone(),
                overlays: s.overlays.clone(),
            })
        })
    }

    /// PNG of the displayed page's raster
    pub fn current_page_png(&self) -> Result<Vec<u8>, ViewerError> {
        let raster = self
            .nav
            .with_session(|s| s.frame.as_ref().map(|f| f.raster.clone()))
            .ok_or(ViewerError::NoDocumentsLoaded)?;
        Ok(raster.to_png()?)
    }

    pub fn share(&self) -> Result<ShareDescriptor, ViewerError> {
        self.nav.with_session(|s| {
            if s.index.is_empty() {
                return Err(ViewerError::NoDocumentsLoaded);
            }
            let entry = s
                .index
                .resolve(s.view.current_page as i64)
                .ok_or(ViewerError::PageNotFound(s.view.current_page))?;
            Ok(ShareDescriptor {
                title: messages::share_title(entry.global_page),
                text: messages::share_text(entry.local_page, &entry.document_name),
            })
        })
    }

    /// PNG thumbnail of `global_page`, cached per session
    pub async fn thumbnail(&self, global_page: usize) -> Result<Arc<Vec<u8>>, ViewerError> {
        let (id, index) = self.nav.with_session(|s| (s.id, Arc::clone(&s.index)));
        if index.is_empty() {
            return Err(ViewerError::NoDocumentsLoaded);
        }
        if let Some(png) = self.thumbnails.lock().get(&(id, global_page)) {
            return Ok(Arc::clone(png));
        }

        let pixmap = self.nav.renderer().render_thumbnail(&index, global_page).await?;
        let png = Arc::new(pixmap.to_png()?);
        if self.nav.session_id() == id {
            self.thumbnails.lock().insert((id, global_page), Arc::clone(&png));
        }
        Ok(png)
    }

    async fn prerender_thumbnails(&self, id: SessionId, total_pages: usize) {
        for page in 1..=total_pages {
            if self.nav.session_id() != id {
                return;
            }
            if let Err(e) = self.thumbnail(page).await {
                tracing::warn!(page, error = %e, "Thumbnail render failed");
            }
        }
    }

    // View

    /// Record the new container size and re-render once resizing settles
    pub fn resize(self: &Arc<Self>, container: Container) {
        self.nav.set_container(container);
        let viewer = Arc::clone(self);
        self.resize.schedule(move || async move {
            let outcome = viewer.nav.refresh().await;
            tracing::debug!(?outcome, "Re-rendered after resize");
        });
    }

    // Overlays

    pub fn add_stroke(&self, stroke: Stroke) -> bool {
        self.nav.with_session(|s| s.frame.is_some() && s.overlays.add_stroke(stroke))
    }

    pub fn clear_strokes(&self) -> &'static str {
        self.nav.with_session(|s| s.overlays.clear_strokes());
        messages::HIGHLIGHTER_CLEARED
    }

    /// Text of the run under a display-space point on the current page
    pub fn select_paragraph(&self, x: f32, y: f32) -> Option<String> {
        self.nav.with_session(|s| {
            let frame = s.frame.as_ref()?;
            s.overlays
                .select_paragraph(&frame.runs, x, y)
                .map(|selection| selection.text.clone())
        })
    }

    // Notes

    fn notes_store(&self) -> Result<&Arc<dyn Persistence>, ViewerError> {
        if !self.config.capabilities.notes {
            return Err(ViewerError::CapabilityDisabled("notes"));
        }
        self.store.as_ref().ok_or(ViewerError::StoreUnavailable)
    }

    /// Notes anchored to the displayed page
    pub async fn current_page_notes(&self) -> Result<Vec<Note>, ViewerError> {
        let store = self.notes_store()?;
        let (file_id, page_num) = self.current_anchor()?;
        Ok(store.get_notes(&file_id, page_num).await?)
    }

    /// Pin a note at normalized `(x, y)` on the displayed page
    pub async fn add_note(&self, x: f64, y: f64, content: &str) -> Result<i64, ViewerError> {
        let store = self.notes_store()?;
        let (file_id, page_num) = self.current_anchor()?;
        let note = NewNote {
            file_id,
            page_num,
            x,
            y,
            content: content.to_string(),
        }
        .normalized();
        Ok(store.save_note(note).await?)
    }

    /// Note storage, when notes are enabled and a store is attached
    pub fn notes(&self) -> Result<Arc<dyn Persistence>, ViewerError> {
        self.notes_store().map(Arc::clone)
    }

    fn current_anchor(&self) -> Result<(String, i64), ViewerError> {
        self.nav.with_session(|s| {
            if s.index.is_empty() {
                return Err(ViewerError::NoDocumentsLoaded);
            }
            s.index
                .resolve(s.view.current_page as i64)
                .map(|e| (e.document_name.clone(), e.local_page as i64))
                .ok_or(ViewerError::PageNotFound(s.view.current_page))
        })
    }
}
