//! Image preprocessing and OCR for scanned or photographed report sources.
//!
//! Images are normalized by a [`Preprocessor`] (contrast, binarization,
//! denoise, deskew, upscale) and then recognized by an [`OcrCoordinator`]
//! that tries a primary engine and falls back to a second one when the
//! first yields nothing.

pub mod contrast;
pub mod coordinator;
pub mod deskew;
pub mod engine;
pub mod error;
pub mod preprocess;
pub mod render;

pub use coordinator::{CoordinatorOptions, OcrCoordinator};
pub use engine::{OcrEngine, TesseractEngine, TesseractMode};
pub use error::OcrError;
pub use preprocess::{
    Binarization, DirectorySink, NoopSink, PreprocessConfig, PreprocessedImage, Preprocessor,
    Stage, StageSink,
};
pub use render::{PageRenderer, PdftoppmRenderer};
