//! Page rendering
//!
//! Resolves a global page, picks the display scale from the zoom policy,
//! rasterizes at a sharper backing scale and lays out the text runs at the
//! display scale so they sit exactly over the raster once it is shown at
//! display size.

mod overlay;
mod scale;
mod text_layer;

use serde::{Deserialize, Serialize};

use crate::engine::{EngineError, EngineResult, Pixmap, Viewport};
use crate::index::{GlobalPageEntry, GlobalPageIndex};
use crate::search::SearchPattern;

pub use overlay::{Overlays, ParagraphSelection, Point, Stroke};
pub use scale::{Container, ZoomMode, ZoomPolicy, DEFAULT_SCALE, MIN_SCALE, ZOOM_STEP};
pub use text_layer::{layout_runs, run_at, Bounds, TextRun};

/// Fixed scale for thumbnails
pub const THUMBNAIL_SCALE: f32 = 0.2;

/// Rasterization settings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderSettings {
    pub device_pixel_ratio: f32,
    /// Extra oversampling on top of the device pixel ratio
    pub quality_multiplier: f32,
    /// Vertical space reserved around the page in fit-height mode
    pub fit_height_margin: f32,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            device_pixel_ratio: 1.0,
            quality_multiplier: 1.5,
            fit_height_margin: 20.0,
        }
    }
}

impl RenderSettings {
    pub fn raster_scale(&self, display_scale: f32) -> f32 {
        display_scale * self.device_pixel_ratio.max(MIN_SCALE) * self.quality_multiplier.max(MIN_SCALE)
    }
}

/// A fully rendered page
#[derive(Debug, Clone)]
pub struct RenderedPage {
    pub entry: GlobalPageEntry,
    pub display_scale: f32,
    /// Layout viewport; the raster is shown at this size
    pub viewport: Viewport,
    pub raster: Pixmap,
    pub runs: Vec<TextRun>,
}

#[derive(Debug)]
pub enum RenderOutcome {
    /// Page does not exist in the index
    Unresolved,
    Rendered(RenderedPage),
    Failed {
        entry: GlobalPageEntry,
        error: EngineError,
    },
}

/// Renders pages of a [`GlobalPageIndex`]
#[derive(Debug, Clone, Default)]
pub struct PageRenderer {
    settings: RenderSettings,
}

impl PageRenderer {
    pub fn new(settings: RenderSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &RenderSettings {
        &self.settings
    }

    /// Render `global_page`
    ///
    /// A text extraction failure leaves the raster intact with an empty text
    /// layer.
    pub async fn render(
        &self,
        index: &GlobalPageIndex,
        global_page: usize,
        zoom: &ZoomPolicy,
        container: Container,
        highlight: Option<&SearchPattern>,
    ) -> RenderOutcome {
        let Some(entry) = index.resolve(global_page as i64).cloned() else {
            tracing::debug!(page = global_page, "Render target does not resolve");
            return RenderOutcome::Unresolved;
        };

        match self.render_entry(index, &entry, zoom, container, highlight).await {
            Ok(page) => RenderOutcome::Rendered(page),
            Err(error) => {
                tracing::error!(
                    page = global_page,
                    document = %entry.document_name,
                    local_page = entry.local_page,
                    error = %error,
                    "Page render failed"
                );
                RenderOutcome::Failed { entry, error }
            }
        }
    }

    async fn render_entry(
        &self,
        index: &GlobalPageIndex,
        entry: &GlobalPageEntry,
        zoom: &ZoomPolicy,
        container: Container,
        highlight: Option<&SearchPattern>,
    ) -> EngineResult<RenderedPage> {
        let document = index
            .document(entry.document_index)
            .ok_or(EngineError::PageNotFound(entry.local_page))?;
        let page = document.get_page(entry.local_page).await?;

        let natural = page.viewport(1.0);
        let display_scale = zoom.display_scale(
            container,
            natural.width,
            natural.height,
            self.settings.fit_height_margin,
        );
        let viewport = page.viewport(display_scale);
        let raster_viewport = page.viewport(self.settings.raster_scale(display_scale));

        let mut raster = Pixmap::for_viewport(&raster_viewport);
        page.render(&mut raster, &raster_viewport).await?;

        let runs = match page.text_content().await {
            Ok(items) => layout_runs(&items, &viewport, highlight),
            Err(e) => {
                tracing::warn!(
                    document = %entry.document_name,
                    page = entry.local_page,
                    error = %e,
                    "Text layer unavailable"
                );
                Vec::new()
            }
        };

        tracing::debug!(
            page = entry.global_page,
            scale = display_scale,
            width = raster.width(),
            height = raster.height(),
            runs = runs.len(),
            "Rendered page"
        );

        Ok(RenderedPage {
            entry: entry.clone(),
            display_scale,
            viewport,
            raster,
            runs,
        })
    }

    /// Small raster of `global_page` for the thumbnail strip
    pub async fn render_thumbnail(
        &self,
        index: &GlobalPageIndex,
        global_page: usize,
    ) -> EngineResult<Pixmap> {
        let entry = index
            .resolve(global_page as i64)
            .ok_or(EngineError::PageNotFound(global_page))?;
        let document = index
            .document(entry.document_index)
            .ok_or(EngineError::PageNotFound(entry.local_page))?;
        let page = document.get_page(entry.local_page).await?;

        let viewport = page.viewport(THUMBNAIL_SCALE);
        let mut pixmap = Pixmap::for_viewport(&viewport);
        page.render(&mut pixmap, &viewport).await?;
        Ok(pixmap)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::testing::{ScriptedEngine, ScriptedPage};
    use crate::engine::PdfEngine;
    use crate::search::compile_pattern;
    use std::sync::Arc;

    async fn index_for(engine: &ScriptedEngine, names: &[&str]) -> GlobalPageIndex {
        let mut documents = Vec::new();
        for name in names {
            documents.push(engine.open(name, Arc::new(Vec::new())).await.unwrap());
        }
        GlobalPageIndex::build(documents).unwrap()
    }

    fn small_container() -> Container {
        Container::new(300.0, 400.0)
    }

    #[tokio::test]
    async fn test_raster_is_oversampled_and_layout_is_not() {
        let engine = ScriptedEngine::new().with_text_document("a.pdf", &[&["hello"]]);
        let index = index_for(&engine, &["a.pdf"]).await;
        let renderer = PageRenderer::new(RenderSettings {
            device_pixel_ratio: 2.0,
            quality_multiplier: 1.5,
            fit_height_margin: 20.0,
        });

        let outcome = renderer
            .render(&index, 1, &ZoomPolicy::fit_width(), small_container(), None)
            .await;

        let RenderOutcome::Rendered(page) = outcome else {
            panic!("expected a rendered page");
        };
        assert_eq!(page.display_scale, 0.5);
        assert_eq!(page.viewport.width, 300.0);
        assert_eq!((page.raster.width(), page.raster.height()), (900, 1200));
        assert_eq!(page.runs[0].bounds.left, 36.0);
        assert_eq!(engine.rendered(), vec![("a.pdf".to_string(), 1)]);
    }

    #[tokio::test]
    async fn test_second_document_page_renders_its_local_page() {
        let engine = ScriptedEngine::new()
            .with_blank_document("a.pdf", 3)
            .with_blank_document("b.pdf", 2);
        let index = index_for(&engine, &["a.pdf", "b.pdf"]).await;

        let outcome = PageRenderer::default()
            .render(&index, 5, &ZoomPolicy::custom(0.25), small_container(), None)
            .await;

        let RenderOutcome::Rendered(page) = outcome else {
            panic!("expected a rendered page");
        };
        assert_eq!(page.entry.document_name, "b.pdf");
        assert_eq!(page.entry.local_page, 2);
        assert_eq!(page.runs[0].text, "b.pdf page 2");
    }

    #[tokio::test]
    async fn test_unresolved_page_is_a_no_op() {
        let engine = ScriptedEngine::new().with_blank_document("a.pdf", 2);
        let index = index_for(&engine, &["a.pdf"]).await;

        let outcome = PageRenderer::default()
            .render(&index, 3, &ZoomPolicy::fit_width(), small_container(), None)
            .await;

        assert!(matches!(outcome, RenderOutcome::Unresolved));
        assert!(engine.rendered().is_empty());
    }

    #[tokio::test]
    async fn test_engine_failure_is_reported() {
        let engine = ScriptedEngine::new()
            .with_document("bad.pdf", vec![ScriptedPage::text(&["x"]).failing_render()]);
        let index = index_for(&engine, &["bad.pdf"]).await;

        let outcome = PageRenderer::default()
            .render(&index, 1, &ZoomPolicy::fit_width(), small_container(), None)
            .await;

        assert!(matches!(
            outcome,
            RenderOutcome::Failed {
                error: EngineError::Render(_),
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_text_failure_keeps_raster() {
        let engine = ScriptedEngine::new()
            .with_document("a.pdf", vec![ScriptedPage::text(&["x"]).failing_text()]);
        let index = index_for(&engine, &["a.pdf"]).await;

        let outcome = PageRenderer::default()
            .render(&index, 1, &ZoomPolicy::fit_width(), small_container(), None)
            .await;

        let RenderOutcome::Rendered(page) = outcome else {
            panic!("expected a rendered page");
        };
        assert!(page.runs.is_empty());
    }

    #[tokio::test]
    async fn test_highlight_flags_matching_runs() {
        let engine =
            ScriptedEngine::new().with_text_document("a.pdf", &[&["Chapter 12", "plain text"]]);
        let index = index_for(&engine, &["a.pdf"]).await;
        let pattern = compile_pattern("/^Chapter \\d+/i").unwrap().unwrap();

        let outcome = PageRenderer::default()
            .render(
                &index,
                1,
                &ZoomPolicy::fit_width(),
                small_container(),
                Some(&pattern),
            )
            .await;

        let RenderOutcome::Rendered(page) = outcome else {
            panic!("expected a rendered page");
        };
        let flags: Vec<bool> = page.runs.iter().map(|r| r.highlighted).collect();
        assert_eq!(flags, vec![true, false]);
    }

    #[tokio::test]
    async fn test_thumbnail_uses_fixed_scale() {
        let engine = ScriptedEngine::new().with_blank_document("a.pdf", 1);
        let index = index_for(&engine, &["a.pdf"]).await;

        let thumb = PageRenderer::default().render_thumbnail(&index, 1).await.unwrap();
        assert_eq!((thumb.width(), thumb.height()), (120, 160));

        let missing = PageRenderer::default().render_thumbnail(&index, 2).await;
        assert!(matches!(missing, Err(EngineError::PageNotFound(2))));
    }
}
