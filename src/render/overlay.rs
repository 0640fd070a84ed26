//! Annotation overlays drawn over the displayed page

use serde::{Deserialize, Serialize};

use super::text_layer::{run_at, Bounds, TextRun};

/// Point in display coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

/// One freehand highlighter stroke
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stroke {
    pub points: Vec<Point>,
    #[serde(default = "default_color")]
    pub color: String,
    #[serde(default = "default_width")]
    pub width: f32,
}

fn default_color() -> String {
    "rgba(255, 255, 0, 0.4)".to_string()
}

fn default_width() -> f32 {
    15.0
}

/// Paragraph picked with the capture tool
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParagraphSelection {
    pub text: String,
    pub bounds: Bounds,
}

/// Overlays bound to the current page viewport
///
/// A new render always starts from empty overlays.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Overlays {
    pub strokes: Vec<Stroke>,
    pub paragraph_selection: Option<ParagraphSelection>,
}

impl Overlays {
    /// Strokes with fewer than two points draw nothing and are ignored
    pub fn add_stroke(&mut self, stroke: Stroke) -> bool {
        if stroke.points.len() < 2 {
            return false;
        }
        self.strokes.push(stroke);
        true
    }

    pub fn clear_strokes(&mut self) {
        self.strokes.clear();
    }

    /// Capture the run under `(x, y)`; clears any previous selection on a miss
    pub fn select_paragraph(&mut self, runs: &[TextRun], x: f32, y: f32) -> Option<&ParagraphSelection> {
        self.paragraph_selection = run_at(runs, x, y)
            .filter(|run| !run.text.trim().is_empty())
            .map(|run| ParagraphSelection {
                text: run.text.clone(),
                bounds: run.bounds,
            });
        self.paragraph_selection.as_ref()
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn is_empty(&self) -> bool {
        self.strokes.is_empty() && self.paragraph_selection.is_none()
    }
}
