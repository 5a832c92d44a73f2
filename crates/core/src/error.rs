//! Error types for the report pipeline.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while turning documents into report slides.
#[derive(Error, Debug)]
pub enum Error {
    /// Failed to open or read an input file.
    #[error("Failed to read file: {0}")]
    IoError(#[from] std::io::Error),

    /// The artifact kind is not one the loader knows how to handle.
    #[error("Unsupported or unrecognized file format: {0}")]
    UnsupportedFormat(String),

    /// Image or PDF bytes could not be decoded into pixels.
    #[error("Failed to decode document: {0}")]
    DecodeFailure(String),

    /// An OCR engine failed internally.
    #[error("OCR engine error: {0}")]
    OcrEngine(String),

    /// Neither the primary nor the fallback engine recognized any text.
    #[error("No text recognized")]
    EmptyExtraction,

    /// A batch produced no usable text at all.
    #[error("No input produced any text")]
    EmptyBatch,

    /// The report text contained no acceptable report blocks.
    #[error("No valid reports found in the generated text")]
    NoValidReports,

    /// The output presentation could not be written because it is locked
    /// or open in another program.
    #[error("Cannot write '{}': the file is open or locked by another program", .0.display())]
    OutputLocked(PathBuf),

    /// The presentation package is structurally unusable.
    #[error("Presentation error: {0}")]
    PresentationError(String),

    /// ZIP archive error (for PPTX).
    #[error("ZIP error: {0}")]
    ZipError(String),

    /// XML parsing error (for PPTX).
    #[error("XML parsing error: {0}")]
    XmlError(String),

    /// OLE/CFB container error (for Outlook messages).
    #[error("OLE/CFB error: {0}")]
    CfbError(String),

    /// Domain dictionary JSON could not be parsed.
    #[error("Invalid domain dictionary: {0}")]
    JsonError(#[from] serde_json::Error),
}

impl Error {
    /// Whether this error means the output file is held open elsewhere.
    pub fn is_output_locked(&self) -> bool {
        matches!(self, Error::OutputLocked(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unsupported_format_names_extension() {
        let err = Error::UnsupportedFormat(".docx".to_string());
        assert!(err.to_string().contains(".docx"));
    }

    #[test]
    fn test_output_locked_is_distinct() {
        let err = Error::OutputLocked(PathBuf::from("Weekly Report.pptx"));
        assert!(err.is_output_locked());
        assert!(err.to_string().contains("Weekly Report.pptx"));
        assert!(!Error::NoValidReports.is_output_locked());
    }
}
