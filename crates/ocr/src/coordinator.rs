//! Primary/fallback OCR orchestration.
//!
//! The coordinator never fails: decode errors and engine errors are logged
//! and degrade to an empty [`ExtractedText`]. Callers decide how to present
//! "no text recognized".

use crate::engine::OcrEngine;
use crate::preprocess::Preprocessor;
use crate::render::PageRenderer;
use image::{DynamicImage, GrayImage};
use star_core::{EngineId, Error, ExtractedText, Result};

/// Which engines run, and how PDFs are rasterized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoordinatorOptions {
    /// Run the layout-aware primary engine.
    pub use_primary: bool,
    /// Run the line-based fallback engine when the primary gives nothing.
    pub use_fallback: bool,
    /// Resolution for rendering the first PDF page.
    pub pdf_dpi: u32,
}

impl Default for CoordinatorOptions {
    fn default() -> Self {
        Self {
            use_primary: true,
            use_fallback: false,
            pdf_dpi: 200,
        }
    }
}

/// Runs borrowed OCR engines over preprocessed pages.
pub struct OcrCoordinator<'a> {
    primary: &'a dyn OcrEngine,
    fallback: &'a dyn OcrEngine,
    renderer: Option<&'a dyn PageRenderer>,
    preprocessor: Preprocessor,
    options: CoordinatorOptions,
}

impl<'a> OcrCoordinator<'a> {
    /// Create a coordinator over two engines with default options and
    /// preprocessing. PDFs are not accepted until a renderer is set.
    pub fn new(primary: &'a dyn OcrEngine, fallback: &'a dyn OcrEngine) -> Self {
        Self {
            primary,
            fallback,
            renderer: None,
            preprocessor: Preprocessor::default(),
            options: CoordinatorOptions::default(),
        }
    }

    /// Render PDFs through `renderer`.
    pub fn with_renderer(mut self, renderer: &'a dyn PageRenderer) -> Self {
        self.renderer = Some(renderer);
        self
    }

    pub fn with_preprocessor(mut self, preprocessor: Preprocessor) -> Self {
        self.preprocessor = preprocessor;
        self
    }

    pub fn with_options(mut self, options: CoordinatorOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> &CoordinatorOptions {
        &self.options
    }

    /// Extract text from image or PDF bytes.
    ///
    /// Bytes are decoded as a still image first; if that fails, the first
    /// PDF page is rendered. Anything undecodable yields empty text.
    pub fn extract(&self, bytes: &[u8]) -> ExtractedText {
        match self.try_extract(bytes) {
            Ok(text) => text,
            Err(Error::EmptyExtraction) => ExtractedText::empty(),
            Err(e) => {
                log::warn!("{}", e);
                ExtractedText::empty()
            }
        }
    }

    /// Like [`extract`](Self::extract), but reports undecodable input as
    /// [`Error::DecodeFailure`] and blank results as
    /// [`Error::EmptyExtraction`].
    pub fn try_extract(&self, bytes: &[u8]) -> Result<ExtractedText> {
        let image = self.decode(bytes).map_err(Error::DecodeFailure)?;
        let text = self.extract_image(&image);
        if text.is_empty() {
            return Err(Error::EmptyExtraction);
        }
        Ok(text)
    }

    /// Preprocess an already decoded image and recognize it.
    pub fn extract_image(&self, image: &DynamicImage) -> ExtractedText {
        let page = self.preprocessor.preprocess(image);
        self.recognize(&page)
    }

    /// Run the engines on a preprocessed page in primary, fallback order.
    ///
    /// A non-empty primary result is final. The fallback runs only when the
    /// primary is disabled, errors, or returns nothing.
    pub fn recognize(&self, page: &GrayImage) -> ExtractedText {
        if self.options.use_primary {
            if let Some(lines) = run_engine(self.primary, page) {
                return ExtractedText::from_engine(EngineId::Primary, lines);
            }
        }

        if self.options.use_fallback {
            if let Some(lines) = run_engine(self.fallback, page) {
                return ExtractedText::from_engine(EngineId::Fallback, lines);
            }
        }

        log::warn!("No text recognized by any enabled OCR engine");
        ExtractedText::empty()
    }

    fn decode(&self, bytes: &[u8]) -> std::result::Result<DynamicImage, String> {
        let image_err = match image::load_from_memory(bytes) {
            Ok(image) => return Ok(image),
            Err(e) => e,
        };

        let Some(renderer) = self.renderer else {
            return Err(format!("not a supported image: {}", image_err));
        };

        match renderer.render_first_page(bytes, self.options.pdf_dpi) {
            Ok(Some(page)) => Ok(page),
            Ok(None) => Err("PDF has no pages".to_string()),
            Err(e) => Err(format!(
                "not an image ({}) or a renderable PDF ({})",
                image_err, e
            )),
        }
    }
}

/// Run one engine, turning errors and blank output into None.
fn run_engine(engine: &dyn OcrEngine, page: &GrayImage) -> Option<Vec<String>> {
    match engine.recognize(page) {
        Ok(lines) => {
            let lines: Vec<String> = lines
                .into_iter()
                .map(|l| l.trim().to_string())
                .filter(|l| !l.is_empty())
                .collect();
            log::debug!("{} recognized {} lines", engine.name(), lines.len());
            (!lines.is_empty()).then_some(lines)
        }
        Err(e) => {
            log::warn!("{} failed: {}", engine.name(), e);
            None
        }
    }
}
