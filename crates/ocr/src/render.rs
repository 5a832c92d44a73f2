//! Rasterization of PDF pages for OCR.

use crate::error::OcrError;
use image::DynamicImage;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::process::Command;

/// Turns the first page of a PDF into an image.
pub trait PageRenderer {
    /// Render page one at `dpi`. `Ok(None)` means the document has no pages.
    fn render_first_page(&self, pdf: &[u8], dpi: u32) -> Result<Option<DynamicImage>, OcrError>;
}

/// Renderer backed by poppler's `pdftoppm`.
#[derive(Debug, Clone)]
pub struct PdftoppmRenderer {
    program: PathBuf,
}

impl Default for PdftoppmRenderer {
    fn default() -> Self {
        Self {
            program: PathBuf::from("pdftoppm"),
        }
    }
}

impl PdftoppmRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a specific `pdftoppm` executable.
    pub fn with_program(mut self, program: impl Into<PathBuf>) -> Self {
        self.program = program.into();
        self
    }
}

impl PageRenderer for PdftoppmRenderer {
    fn render_first_page(&self, pdf: &[u8], dpi: u32) -> Result<Option<DynamicImage>, OcrError> {
        let scratch = tempfile::tempdir()
            .map_err(|e| OcrError::Recognition(format!("temp dir: {}", e)))?;
        let input = scratch.path().join("in.pdf");
        std::fs::write(&input, pdf).map_err(|e| OcrError::Recognition(e.to_string()))?;
        let stem = scratch.path().join("page");

        let output = Command::new(&self.program)
            .args(["-png", "-r", &dpi.to_string(), "-f", "1", "-l", "1", "-singlefile"])
            .arg(&input)
            .arg(&stem)
            .output()
            .map_err(|e| match e.kind() {
                ErrorKind::NotFound => {
                    OcrError::EngineNotFound(self.program.display().to_string())
                }
                _ => OcrError::Recognition(e.to_string()),
            })?;

        let page = stem.with_extension("png");
        if !page.exists() {
            if output.status.success() {
                log::debug!("PDF rendered no pages");
                return Ok(None);
            }
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(OcrError::InvalidImage(format!(
                "pdftoppm failed: {}",
                stderr.trim()
            )));
        }

        image::open(&page)
            .map(Some)
            .map_err(|e| OcrError::InvalidImage(e.to_string()))
    }
}
