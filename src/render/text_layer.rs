//! Text layer layout
//!
//! Positions the engine's text items in the display viewport so an overlay
//! can line up with the rasterized page, and flags runs that match the
//! active highlight pattern.

use serde::Serialize;

use crate::engine::{compose, TextItem, Transform, Viewport};
use crate::search::SearchPattern;

/// Axis-aligned box in display coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Bounds {
    pub left: f32,
    pub top: f32,
    pub width: f32,
    pub height: f32,
}

impl Bounds {
    pub fn contains(&self, x: f32, y: f32) -> bool {
        x >= self.left && x <= self.left + self.width && y >= self.top && y <= self.top + self.height
    }
}

/// One positioned text run on the displayed page
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TextRun {
    pub text: String,
    /// Page-space run transform composed with the viewport transform
    pub transform: Transform,
    /// Width in page units
    pub width: f32,
    /// Height in page units
    pub height: f32,
    /// Box in display coordinates
    pub bounds: Bounds,
    pub font_height: f32,
    /// Run matches the active highlight pattern
    pub highlighted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_name: Option<String>,
}

/// Lay out `items` in `viewport`
pub fn layout_runs(
    items: &[TextItem],
    viewport: &Viewport,
    highlight: Option<&SearchPattern>,
) -> Vec<TextRun> {
    items
        .iter()
        .map(|item| {
            let tx = compose(&viewport.transform, &item.transform);
            let font_height = tx[2].hypot(tx[3]);

            TextRun {
                text: item.text.clone(),
                transform: tx,
                width: item.width,
                height: item.height,
                bounds: Bounds {
                    left: tx[4],
                    top: tx[5] - font_height,
                    width: item.width * viewport.scale,
                    height: font_height,
                },
                font_height,
                highlighted: highlight.map(|p| p.is_match(&item.text)).unwrap_or(false),
                font_name: item.font_name.clone(),
            }
        })
        .collect()
}

/// Run under a display-space point
pub fn run_at(runs: &[TextRun], x: f32, y: f32) -> Option<&TextRun> {
    runs.iter().find(|run| run.bounds.contains(x, y))
}
