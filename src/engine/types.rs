//! Engine data types
//!
//! Viewports, positioned text items and the pixel surface pages are
//! rasterized into.

use std::io::Cursor;

use image::{DynamicImage, RgbaImage};
use serde::{Deserialize, Serialize};

/// Affine transform `[a, b, c, d, e, f]` mapping `(x, y)` to
/// `(a*x + c*y + e, b*x + d*y + f)`
pub type Transform = [f32; 6];

/// Compose two transforms; the result applies `inner` first, then `outer`
pub fn compose(outer: &Transform, inner: &Transform) -> Transform {
    [
        outer[0] * inner[0] + outer[2] * inner[1],
        outer[1] * inner[0] + outer[3] * inner[1],
        outer[0] * inner[2] + outer[2] * inner[3],
        outer[1] * inner[2] + outer[3] * inner[3],
        outer[0] * inner[4] + outer[2] * inner[5] + outer[4],
        outer[1] * inner[4] + outer[3] * inner[5] + outer[5],
    ]
}

/// Page geometry at a given scale
///
/// Page space has its origin at the top-left corner, y growing downwards.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Viewport {
    /// Width in device units at `scale`
    pub width: f32,
    /// Height in device units at `scale`
    pub height: f32,
    /// Scale relative to the page's natural size (1.0 = 72 DPI)
    pub scale: f32,
    /// Page space to device space
    pub transform: Transform,
}

impl Viewport {
    /// Viewport for a page of natural size `page_width` x `page_height`
    pub fn new(page_width: f32, page_height: f32, scale: f32) -> Self {
        Self {
            width: page_width * scale,
            height: page_height * scale,
            scale,
            transform: [scale, 0.0, 0.0, scale, 0.0, 0.0],
        }
    }

    /// Whole-pixel size of a surface covering this viewport
    pub fn pixel_size(&self) -> (u32, u32) {
        (
            self.width.max(1.0).ceil() as u32,
            self.height.max(1.0).ceil() as u32,
        )
    }
}

/// One positioned run of text as reported by the engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextItem {
    /// Run content
    pub text: String,
    /// Run placement in page space; `[size, 0, 0, size, x, baseline]` for
    /// unrotated text
    pub transform: Transform,
    /// Run width in page units
    pub width: f32,
    /// Run height in page units
    pub height: f32,
    /// Font name, when the engine reports one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_name: Option<String>,
}

impl TextItem {
    /// Unrotated run at `(x, baseline)` with the given font size
    pub fn at(text: impl Into<String>, x: f32, baseline: f32, size: f32, width: f32) -> Self {
        Self {
            text: text.into(),
            transform: [size, 0.0, 0.0, size, x, baseline],
            width,
            height: size,
            font_name: None,
        }
    }
}

/// RGBA pixel surface a page is rasterized into
#[derive(Clone, PartialEq, Eq)]
pub struct Pixmap {
    width: u32,
    height: u32,
    rgba: Vec<u8>,
}

impl std::fmt::Debug for Pixmap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pixmap")
            .field("width", &self.width)
            .field("height", &self.height)
            .finish()
    }
}

impl Pixmap {
    /// Opaque white surface
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            rgba: vec![255; (width as usize) * (height as usize) * 4],
        }
    }

    /// Surface sized for a viewport
    pub fn for_viewport(viewport: &Viewport) -> Self {
        let (width, height) = viewport.pixel_size();
        Self::new(width, height)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn rgba(&self) -> &[u8] {
        &self.rgba
    }

    pub fn rgba_mut(&mut self) -> &mut [u8] {
        &mut self.rgba
    }

    /// Encode the surface as PNG
    pub fn to_png(&self) -> Result<Vec<u8>, image::ImageError> {
        let img = RgbaImage::from_raw(self.width, self.height, self.rgba.clone()).ok_or_else(|| {
            image::ImageError::Parameter(image::error::ParameterError::from_kind(
                image::error::ParameterErrorKind::DimensionMismatch,
            ))
        })?;

        let mut output = Vec::new();
        DynamicImage::ImageRgba8(img)
            .write_to(&mut Cursor::new(&mut output), image::ImageFormat::Png)?;
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_viewport_scales_page() {
        let viewport = Viewport::new(600.0, 800.0, 1.5);
        assert_eq!(viewport.width, 900.0);
        assert_eq!(viewport.height, 1200.0);
        assert_eq!(viewport.pixel_size(), (900, 1200));
    }

    #[test]
    fn test_compose_scales_then_translates() {
        let viewport = Viewport::new(600.0, 800.0, 2.0);
        let item = TextItem::at("hello", 10.0, 50.0, 12.0, 30.0);
        let tx = compose(&viewport.transform, &item.transform);

        assert_eq!(tx[0], 24.0);
        assert_eq!(tx[3], 24.0);
        assert_eq!(tx[4], 20.0);
        assert_eq!(tx[5], 100.0);
    }

    #[test]
    fn test_compose_with_identity() {
        let identity = [1.0, 0.0, 0.0, 1.0, 0.0, 0.0];
        let t = [2.0, 0.0, 0.0, 3.0, 4.0, 5.0];
        assert_eq!(compose(&identity, &t), t);
        assert_eq!(compose(&t, &identity), t);
    }

    #[test]
    fn test_pixmap_png_encoding() {
        let pixmap = Pixmap::new(4, 3);
        assert_eq!(pixmap.rgba().len(), 48);

        let png = pixmap.to_png().unwrap();
        assert!(png.starts_with(&[0x89, b'P', b'N', b'G']));
    }
}
