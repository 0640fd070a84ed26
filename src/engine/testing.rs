//! Scripted in-memory engine for tests
//!
//! Documents are registered by name with per-page text. Pages can fail,
//! delay their text extraction, or wait on a gate so tests control exactly
//! when an in-flight render or text fetch completes.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::Semaphore;

use super::{
    DocumentHandle, EngineError, EngineResult, PageHandle, PdfEngine, Pixmap, TextItem, Viewport,
};

#[derive(Debug, Clone)]
pub(crate) struct ScriptedPage {
    pub runs: Vec<String>,
    pub width: f32,
    pub height: f32,
    pub fail_render: bool,
    pub fail_text: bool,
    pub delay_yields: usize,
}

impl ScriptedPage {
    pub fn text(runs: &[&str]) -> Self {
        Self {
            runs: runs.iter().map(|r| r.to_string()).collect(),
            width: 600.0,
            height: 800.0,
            fail_render: false,
            fail_text: false,
            delay_yields: 0,
        }
    }

    pub fn failing_render(mut self) -> Self {
        self.fail_render = true;
        self
    }

    pub fn failing_text(mut self) -> Self {
        self.fail_text = true;
        self
    }

    pub fn delayed(mut self, yields: usize) -> Self {
        self.delay_yields = yields;
        self
    }
}

#[derive(Default)]
struct Shared {
    render_gate: Option<Arc<Semaphore>>,
    text_gate: Option<Arc<Semaphore>>,
    renders: Mutex<Vec<(String, usize)>>,
    text_calls: AtomicUsize,
}

#[derive(Default)]
pub(crate) struct ScriptedEngine {
    documents: HashMap<String, Vec<ScriptedPage>>,
    shared: Arc<Shared>,
}

impl ScriptedEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_document(mut self, name: &str, pages: Vec<ScriptedPage>) -> Self {
        self.documents.insert(name.to_string(), pages);
        self
    }

    /// Register a document with one page per entry of `pages`
    pub fn with_text_document(self, name: &str, pages: &[&[&str]]) -> Self {
        let pages = pages.iter().map(|runs| ScriptedPage::text(runs)).collect();
        self.with_document(name, pages)
    }

    /// Register a document of `count` pages whose text is `"<name> page <n>"`
    pub fn with_blank_document(self, name: &str, count: usize) -> Self {
        let pages = (1..=count)
            .map(|n| ScriptedPage::text(&[&format!("{} page {}", name, n)]))
            .collect();
        self.with_document(name, pages)
    }

    /// Renders wait for a permit on the returned semaphore
    pub fn gate_renders(&mut self) -> Arc<Semaphore> {
        let gate = Arc::new(Semaphore::new(0));
        self.shared_mut().render_gate = Some(Arc::clone(&gate));
        gate
    }

    /// Text fetches wait for a permit on the returned semaphore
    pub fn gate_text(&mut self) -> Arc<Semaphore> {
        let gate = Arc::new(Semaphore::new(0));
        self.shared_mut().text_gate = Some(Arc::clone(&gate));
        gate
    }

    /// Completed renders as `(document, local page)`
    pub fn rendered(&self) -> Vec<(String, usize)> {
        self.shared.renders.lock().clone()
    }

    pub fn text_calls(&self) -> usize {
        self.shared.text_calls.load(Ordering::SeqCst)
    }

    fn shared_mut(&mut self) -> &mut Shared {
        Arc::get_mut(&mut self.shared).expect("gates are configured before the engine is shared")
    }
}

#[async_trait]
impl PdfEngine for ScriptedEngine {
    async fn open(&self, name: &str, _bytes: Arc<Vec<u8>>) -> EngineResult<Arc<dyn DocumentHandle>> {
        let pages = self
            .documents
            .get(name)
            .cloned()
            .ok_or_else(|| EngineError::Decode(format!("{} is not a scripted document", name)))?;

        Ok(Arc::new(ScriptedDocument {
            name: name.to_string(),
            pages,
            shared: Arc::clone(&self.shared),
        }))
    }
}

struct ScriptedDocument {
    name: String,
    pages: Vec<ScriptedPage>,
    shared: Arc<Shared>,
}

#[async_trait]
impl DocumentHandle for ScriptedDocument {
    fn name(&self) -> &str {
        &self.name
    }

    fn page_count(&self) -> usize {
        self.pages.len()
    }

    async fn get_page(&self, page: usize) -> EngineResult<Arc<dyn PageHandle>> {
        let script = page
            .checked_sub(1)
            .and_then(|index| self.pages.get(index))
            .cloned()
            .ok_or(EngineError::PageNotFound(page))?;

        Ok(Arc::new(ScriptedPageHandle {
            document: self.name.clone(),
            page,
            script,
            shared: Arc::clone(&self.shared),
        }))
    }
}

struct ScriptedPageHandle {
    document: String,
    page: usize,
    script: ScriptedPage,
    shared: Arc<Shared>,
}

#[async_trait]
impl PageHandle for ScriptedPageHandle {
    fn page_number(&self) -> usize {
        self.page
    }

    fn viewport(&self, scale: f32) -> Viewport {
        Viewport::new(self.script.width, self.script.height, scale)
    }

    async fn render(&self, target: &mut Pixmap, viewport: &Viewport) -> EngineResult<()> {
        if let Some(gate) = &self.shared.render_gate {
            gate.acquire().await.expect("render gate closed").forget();
        }
        if self.script.fail_render {
            return Err(EngineError::Render(format!(
                "{} page {} refuses to render",
                self.document, self.page
            )));
        }

        let expected = viewport.pixel_size();
        let actual = (target.width(), target.height());
        if expected != actual {
            return Err(EngineError::TargetMismatch { expected, actual });
        }

        let shade = (self.page % 200) as u8;
        for px in target.rgba_mut().chunks_exact_mut(4) {
            px.copy_from_slice(&[shade, shade, shade, 255]);
        }

        self.shared
            .renders
            .lock()
            .push((self.document.clone(), self.page));
        Ok(())
    }

    async fn text_content(&self) -> EngineResult<Vec<TextItem>> {
        self.shared.text_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.shared.text_gate {
            gate.acquire().await.expect("text gate closed").forget();
        }
        for _ in 0..self.script.delay_yields {
            tokio::task::yield_now().await;
        }
        if self.script.fail_text {
            return Err(EngineError::TextContent(format!(
                "{} page {} has no readable text",
                self.document, self.page
            )));
        }

        Ok(self
            .script
            .runs
            .iter()
            .enumerate()
            .map(|(i, run)| {
                TextItem::at(
                    run.clone(),
                    72.0,
                    100.0 + i as f32 * 20.0,
                    12.0,
                    run.chars().count() as f32 * 6.0,
                )
            })
            .collect())
    }
}
