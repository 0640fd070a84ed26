//! PDF engine error types

use thiserror::Error;

/// Errors raised by a [`PdfEngine`](super::PdfEngine) or its handles
#[derive(Debug, Error)]
pub enum EngineError {
    /// Bytes could not be decoded as a PDF
    #[error("Decode error: {0}")]
    Decode(String),

    /// Requested local page does not exist (1-indexed)
    #[error("Page not found: {0}")]
    PageNotFound(usize),

    /// Rasterization failed
    #[error("Render error: {0}")]
    Render(String),

    /// Text content extraction failed
    #[error("Text content error: {0}")]
    TextContent(String),

    /// Render target does not match the viewport it is drawn with
    #[error("Render target is {actual:?}, viewport needs {expected:?}")]
    TargetMismatch {
        expected: (u32, u32),
        actual: (u32, u32),
    },

    /// Engine operation exceeded its time budget
    #[error("Operation timed out after {0} seconds")]
    Timeout(u64),
}

/// Result type alias for engine operations
pub type EngineResult<T> = std::result::Result<T, EngineError>;

impl From<mupdf::Error> for EngineError {
    fn from(err: mupdf::Error) -> Self {
        EngineError::Decode(err.to_string())
    }
}
