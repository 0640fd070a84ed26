//! Zoom policy and display-scale computation

use serde::{Deserialize, Serialize};

/// Custom-zoom increment
pub const ZOOM_STEP: f32 = 0.2;
/// Smallest display scale ever produced
pub const MIN_SCALE: f32 = 0.1;
/// Scale restored when custom zoom is first entered without a prior scale
pub const DEFAULT_SCALE: f32 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ZoomMode {
    #[default]
    FitWidth,
    FitHeight,
    Custom,
}

/// Display container size in CSS-like pixels
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Container {
    pub width: f32,
    pub height: f32,
}

impl Container {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

/// How the display scale is derived for a page
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ZoomPolicy {
    pub mode: ZoomMode,
    /// Scale used in [`ZoomMode::Custom`]
    pub custom_scale: f32,
}

impl Default for ZoomPolicy {
    fn default() -> Self {
        Self {
            mode: ZoomMode::FitWidth,
            custom_scale: DEFAULT_SCALE,
        }
    }
}

impl ZoomPolicy {
    pub fn fit_width() -> Self {
        Self::default()
    }

    pub fn fit_height() -> Self {
        Self {
            mode: ZoomMode::FitHeight,
            ..Self::default()
        }
    }

    pub fn custom(scale: f32) -> Self {
        Self {
            mode: ZoomMode::Custom,
            custom_scale: scale.max(MIN_SCALE),
        }
    }

    /// Scale for a page of natural size `page_width` x `page_height`
    ///
    /// Falls back to the custom scale when the page or container has no
    /// usable extent.
    pub fn display_scale(
        &self,
        container: Container,
        page_width: f32,
        page_height: f32,
        fit_height_margin: f32,
    ) -> f32 {
        let scale = match self.mode {
            ZoomMode::FitWidth if page_width > 0.0 && container.width > 0.0 => {
                container.width / page_width
            }
            ZoomMode::FitHeight if page_height > 0.0 => {
                let available = container.height - fit_height_margin;
                if available > 0.0 {
                    available / page_height
                } else {
                    self.custom_scale
                }
            }
            _ => self.custom_scale,
        };

        if scale.is_finite() {
            scale.max(MIN_SCALE)
        } else {
            MIN_SCALE
        }
    }

    /// Switch to custom zoom one step above `current`
    pub fn zoom_in(&mut self, current: f32) {
        self.mode = ZoomMode::Custom;
        self.custom_scale = (current + ZOOM_STEP).max(MIN_SCALE);
    }

    /// Switch to custom zoom one step below `current`, never under the floor
    pub fn zoom_out(&mut self, current: f32) {
        self.mode = ZoomMode::Custom;
        self.custom_scale = (current - ZOOM_STEP).max(MIN_SCALE);
    }

    /// Back to fit-width
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
