//! Error kinds reported by OCR engines and page renderers.

use thiserror::Error;

/// Closed set of failures an engine can report. The coordinator treats all
/// of them the same way: log, then fall back or return empty text.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OcrError {
    /// The engine's executable or model could not be found.
    #[error("OCR engine not found: {0}")]
    EngineNotFound(String),

    /// The engine ran but failed while recognizing.
    #[error("Recognition failed: {0}")]
    Recognition(String),

    /// The image could not be handed to the engine.
    #[error("Invalid image: {0}")]
    InvalidImage(String),
}

impl From<OcrError> for star_core::Error {
    fn from(err: OcrError) -> Self {
        star_core::Error::OcrEngine(err.to_string())
    }
}
