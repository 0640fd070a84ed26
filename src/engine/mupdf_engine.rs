//! MuPDF-backed engine
//!
//! MuPDF documents are not thread-safe. Each document keeps its source bytes
//! and opens a fresh `mupdf::Document` per operation, serialized by a mutex,
//! on tokio's blocking pool.

use std::sync::Arc;

use async_trait::async_trait;
use mupdf::{Colorspace, Document, Matrix, TextPageOptions};
use parking_lot::Mutex;
use tokio::time::{timeout, Duration};

use super::{
    DocumentHandle, EngineError, EngineResult, PageHandle, PdfEngine, Pixmap, TextItem, Viewport,
};

/// Timeout for decoding a document
const OPEN_TIMEOUT_SECS: u64 = 30;
/// Timeout for rasterizing one page
const RENDER_TIMEOUT_SECS: u64 = 30;
/// Timeout for extracting one page's text
const TEXT_TIMEOUT_SECS: u64 = 15;

const PDF_MIME: &str = "application/pdf";

/// Source bytes plus the lock serializing MuPDF access
struct Source {
    bytes: Arc<Vec<u8>>,
    lock: Mutex<()>,
}

impl Source {
    fn with_doc<F, R>(&self, f: F) -> EngineResult<R>
    where
        F: FnOnce(&Document) -> EngineResult<R>,
    {
        let _guard = self.lock.lock();
        let doc = Document::from_bytes(&self.bytes, PDF_MIME)?;
        f(&doc)
    }
}

/// Production engine over the `mupdf` crate
#[derive(Debug, Default, Clone, Copy)]
pub struct MupdfEngine;

impl MupdfEngine {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl PdfEngine for MupdfEngine {
    async fn open(&self, name: &str, bytes: Arc<Vec<u8>>) -> EngineResult<Arc<dyn DocumentHandle>> {
        let source = Arc::new(Source {
            bytes,
            lock: Mutex::new(()),
        });

        let blocking_source = Arc::clone(&source);
        let page_sizes = timeout(
            Duration::from_secs(OPEN_TIMEOUT_SECS),
            tokio::task::spawn_blocking(move || {
                blocking_source.with_doc(|doc| {
                    let count = doc.page_count()?;
                    let mut sizes = Vec::with_capacity(count.max(0) as usize);
                    for index in 0..count {
                        let bounds = doc.load_page(index)?.bounds()?;
                        sizes.push((bounds.x1 - bounds.x0, bounds.y1 - bounds.y0));
                    }
                    Ok(sizes)
                })
            }),
        )
        .await
        .map_err(|_| EngineError::Timeout(OPEN_TIMEOUT_SECS))?
        .map_err(|e| EngineError::Decode(format!("Task join error: {}", e)))??;

        tracing::debug!(document = %name, pages = page_sizes.len(), "Decoded PDF");

        Ok(Arc::new(MupdfDocument {
            name: name.to_string(),
            source,
            page_sizes,
        }))
    }
}

struct MupdfDocument {
    name: String,
    source: Arc<Source>,
    /// Natural page sizes in points, captured at decode time
    page_sizes: Vec<(f32, f32)>,
}

#[async_trait]
impl DocumentHandle for MupdfDocument {
    fn name(&self) -> &str {
        &self.name
    }

    fn page_count(&self) -> usize {
        self.page_sizes.len()
    }

    async fn get_page(&self, page: usize) -> EngineResult<Arc<dyn PageHandle>> {
        let size = page
            .checked_sub(1)
            .and_then(|index| self.page_sizes.get(index))
            .copied()
            .ok_or(EngineError::PageNotFound(page))?;

        Ok(Arc::new(MupdfPage {
            source: Arc::clone(&self.source),
            page,
            size,
        }))
    }
}

struct MupdfPage {
    source: Arc<Source>,
    page: usize,
    size: (f32, f32),
}

#[async_trait]
impl PageHandle for MupdfPage {
    fn page_number(&self) -> usize {
        self.page
    }

    fn viewport(&self, scale: f32) -> Viewport {
        Viewport::new(self.size.0, self.size.1, scale)
    }

    async fn render(&self, target: &mut Pixmap, viewport: &Viewport) -> EngineResult<()> {
        let expected = viewport.pixel_size();
        let actual = (target.width(), target.height());
        if expected != actual {
            return Err(EngineError::TargetMismatch { expected, actual });
        }

        let source = Arc::clone(&self.source);
        let index = (self.page - 1) as i32;
        let scale = viewport.scale;

        let (rgba, width, height) = timeout(
            Duration::from_secs(RENDER_TIMEOUT_SECS),
            tokio::task::spawn_blocking(move || {
                source.with_doc(|doc| {
                    let page = doc
                        .load_page(index)
                        .map_err(|e| EngineError::Render(e.to_string()))?;
                    let matrix = Matrix::new_scale(scale, scale);
                    let pixmap = page
                        .to_pixmap(&matrix, &Colorspace::device_rgb(), true, true)
                        .map_err(|e| EngineError::Render(e.to_string()))?;
                    Ok(pixmap_to_rgba(&pixmap))
                })
            }),
        )
        .await
        .map_err(|_| EngineError::Timeout(RENDER_TIMEOUT_SECS))?
        .map_err(|e| EngineError::Render(format!("Task join error: {}", e)))??;

        blit(target, &rgba, width, height);
        Ok(())
    }

    async fn text_content(&self) -> EngineResult<Vec<TextItem>> {
        let source = Arc::clone(&self.source);
        let index = (self.page - 1) as i32;

        timeout(
            Duration::from_secs(TEXT_TIMEOUT_SECS),
            tokio::task::spawn_blocking(move || {
                source.with_doc(|doc| {
                    let page = doc
                        .load_page(index)
                        .map_err(|e| EngineError::TextContent(e.to_string()))?;
                    let text_page = page
                        .to_text_page(TextPageOptions::empty())
                        .map_err(|e| EngineError::TextContent(e.to_string()))?;

                    let mut items = Vec::new();
                    for block in text_page.blocks() {
                        for line in block.lines() {
                            let mut text = String::new();
                            let mut size = 0.0_f32;
                            for ch in line.chars() {
                                if let Some(c) = ch.char() {
                                    if size == 0.0 {
                                        size = ch.size();
                                    }
                                    text.push(c);
                                }
                            }
                            if text.is_empty() {
                                continue;
                            }

                            let bounds = line.bounds();
                            let height = bounds.y1 - bounds.y0;
                            let size = if size > 0.0 { size } else { height };
                            items.push(TextItem {
                                text,
                                transform: [size, 0.0, 0.0, size, bounds.x0, bounds.y1],
                                width: bounds.x1 - bounds.x0,
                                height,
                                font_name: None,
                            });
                        }
                    }
                    Ok(items)
                })
            }),
        )
        .await
        .map_err(|_| EngineError::Timeout(TEXT_TIMEOUT_SECS))?
        .map_err(|e| EngineError::TextContent(format!("Task join error: {}", e)))?
    }
}

/// Expand MuPDF samples (RGB or RGBA) into an RGBA buffer
fn pixmap_to_rgba(pixmap: &mupdf::Pixmap) -> (Vec<u8>, u32, u32) {
    let width = pixmap.width() as u32;
    let height = pixmap.height() as u32;
    let samples = pixmap.samples();
    let n = pixmap.n() as usize;

    let mut rgba = Vec::with_capacity((width * height * 4) as usize);
    for y in 0..height as usize {
        for x in 0..width as usize {
            let offset = (y * width as usize + x) * n;
            let r = samples.get(offset).copied().unwrap_or(0);
            let g = samples.get(offset + 1).copied().unwrap_or(0);
            let b = samples.get(offset + 2).copied().unwrap_or(0);
            let a = if n >= 4 {
                samples.get(offset + 3).copied().unwrap_or(255)
            } else {
                255
            };
            rgba.extend_from_slice(&[r, g, b, a]);
        }
    }

    (rgba, width, height)
}

/// Copy a source buffer into the target, clipped to the smaller extent
fn blit(target: &mut Pixmap, rgba: &[u8], width: u32, height: u32) {
    let copy_width = width.min(target.width()) as usize;
    let copy_height = height.min(target.height()) as usize;
    let target_stride = target.width() as usize * 4;
    let source_stride = width as usize * 4;

    let dest = target.rgba_mut();
    for row in 0..copy_height {
        let src = &rgba[row * source_stride..row * source_stride + copy_width * 4];
        dest[row * target_stride..row * target_stride + copy_width * 4].copy_from_slice(src);
    }
}
