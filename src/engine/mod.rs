//! PDF engine contract
//!
//! The viewer core never decodes PDFs itself. It talks to an engine through
//! three object-safe traits:
//!
//! ```text
//! PdfEngine::open(bytes) ──► DocumentHandle ──get_page(n)──► PageHandle
//!                                                              │
//!                       viewport(scale) / render(target) / text_content()
//! ```
//!
//! [`MupdfEngine`] is the production implementation.

mod error;
mod mupdf_engine;
#[cfg(test)]
pub(crate) mod testing;
mod types;

use std::sync::Arc;

use async_trait::async_trait;

pub use error::{EngineError, EngineResult};
pub use mupdf_engine::MupdfEngine;
pub use types::{compose, Pixmap, TextItem, Transform, Viewport};

/// Opens raw bytes into document handles
#[async_trait]
pub trait PdfEngine: Send + Sync {
    /// Decode `bytes`; `name` becomes the handle's document name
    async fn open(&self, name: &str, bytes: Arc<Vec<u8>>) -> EngineResult<Arc<dyn DocumentHandle>>;
}

/// A decoded PDF
#[async_trait]
pub trait DocumentHandle: Send + Sync {
    /// Source file name
    fn name(&self) -> &str;

    /// Number of pages
    fn page_count(&self) -> usize;

    /// Fetch a page (1-indexed)
    async fn get_page(&self, page: usize) -> EngineResult<Arc<dyn PageHandle>>;
}

/// One page of a decoded PDF
#[async_trait]
pub trait PageHandle: Send + Sync {
    /// Page number within its document (1-indexed)
    fn page_number(&self) -> usize;

    /// Geometry at `scale`
    fn viewport(&self, scale: f32) -> Viewport;

    /// Rasterize into `target`, which must be sized for `viewport`
    async fn render(&self, target: &mut Pixmap, viewport: &Viewport) -> EngineResult<()>;

    /// Positioned text runs in page space
    async fn text_content(&self) -> EngineResult<Vec<TextItem>>;
}

/// Whether an input looks like a PDF, by magic bytes or extension
pub fn is_pdf_candidate(name: &str, bytes: &[u8]) -> bool {
    if bytes.starts_with(b"%PDF") {
        return true;
    }

    std::path::Path::new(name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("pdf"))
        .unwrap_or(false)
}
