//! Artifact dispatch.

use crate::batch::{batch_separator, BatchItem, BatchResult, ItemOutcome};
use crate::decode::decode_text;
use image::DynamicImage;
use star_core::{ArtifactKind, Error, RawArtifact, Result, TextNormalizer};
use star_msg::MsgParser;
use star_ocr::OcrCoordinator;
use std::path::Path;

/// Loads raw artifacts into text.
pub struct DocumentLoader<'a> {
    ocr: OcrCoordinator<'a>,
    msg: MsgParser,
    normalizer: TextNormalizer,
}

impl<'a> DocumentLoader<'a> {
    /// Create a loader that sends images and PDFs through `ocr`.
    pub fn new(ocr: OcrCoordinator<'a>) -> Self {
        Self {
            ocr,
            msg: MsgParser::new(),
            normalizer: TextNormalizer::new(),
        }
    }

    /// Decide how an artifact is handled.
    ///
    /// A declared kind wins. Otherwise magic bytes are checked before the
    /// extension, except for `.txt` files: text has no signature and may
    /// start with bytes that look like one.
    pub fn resolve_kind(artifact: &RawArtifact) -> Result<ArtifactKind> {
        if let Some(kind) = artifact.kind {
            return Ok(kind);
        }

        let extension = artifact.extension();
        let by_extension = ArtifactKind::from_extension(&extension);
        if by_extension == Some(ArtifactKind::PlainText) {
            return Ok(ArtifactKind::PlainText);
        }

        ArtifactKind::from_magic(&artifact.bytes)
            .or(by_extension)
            .ok_or_else(|| {
                Error::UnsupportedFormat(if extension.is_empty() {
                    artifact.name.clone()
                } else {
                    extension
                })
            })
    }

    /// Extract raw text from one artifact.
    ///
    /// An image or PDF with no recognizable text yields an empty string and
    /// a warning, not an error.
    pub fn load(&self, artifact: &RawArtifact) -> Result<String> {
        let kind = Self::resolve_kind(artifact)?;
        log::debug!("Loading {} as {}", artifact.name, kind);

        match kind {
            ArtifactKind::Image | ArtifactKind::Pdf => {
                let extracted = self.ocr.extract(&artifact.bytes);
                if extracted.is_empty() {
                    log::warn!("No text recognized in {}", artifact.name);
                }
                Ok(extracted.text())
            }
            ArtifactKind::PlainText => Ok(decode_text(&artifact.bytes)),
            ArtifactKind::Email => Ok(self.msg.parse_bytes(&artifact.bytes)?.to_text()),
        }
    }

    /// Recognize text in an already decoded image, such as a pasted
    /// screenshot.
    pub fn load_image(&self, image: &DynamicImage) -> String {
        let extracted = self.ocr.extract_image(image);
        if extracted.is_empty() {
            log::warn!("No text recognized in image");
        }
        extracted.text()
    }

    /// Read a file and extract its raw text.
    pub fn load_path(&self, path: impl AsRef<Path>) -> Result<String> {
        self.load(&artifact_from_path(path)?)
    }

    /// Load artifacts one at a time, in order, and merge their text.
    ///
    /// A failing artifact is recorded and skipped. Fails only when nothing
    /// produced any text.
    pub fn load_batch(&self, artifacts: &[RawArtifact]) -> Result<BatchResult> {
        self.merge(
            artifacts
                .iter()
                .map(|artifact| (artifact.name.clone(), self.load(artifact))),
        )
    }

    /// Like [`load_batch`](Self::load_batch) for files on disk. Unreadable
    /// files are skipped like any other failure.
    pub fn load_paths<P: AsRef<Path>>(&self, paths: &[P]) -> Result<BatchResult> {
        self.merge(paths.iter().map(|path| {
            let path = path.as_ref();
            (path.display().to_string(), self.load_path(path))
        }))
    }

    fn merge(&self, results: impl Iterator<Item = (String, Result<String>)>) -> Result<BatchResult> {
        let mut merged = String::new();
        let mut items = Vec::new();

        for (idx, (name, result)) in results.enumerate() {
            if idx > 0 {
                merged.push_str(&format!("\n\n{}\n\n", batch_separator(idx + 1)));
            }

            let outcome = match result {
                Ok(text) if text.trim().is_empty() => ItemOutcome::Empty,
                Ok(text) => {
                    merged.push_str(&text);
                    ItemOutcome::Loaded {
                        chars: text.chars().count(),
                    }
                }
                Err(e) => {
                    log::warn!("Skipping {}: {}", name, e);
                    ItemOutcome::Skipped {
                        reason: e.to_string(),
                    }
                }
            };
            items.push(BatchItem { name, outcome });
        }

        if !items.iter().any(|item| item.outcome.is_loaded()) {
            return Err(Error::EmptyBatch);
        }

        Ok(BatchResult {
            items,
            text: self.normalizer.normalize(&merged),
        })
    }
}

/// Build an artifact from a file, naming it after the file and declaring
/// the kind its extension implies.
pub fn artifact_from_path(path: impl AsRef<Path>) -> Result<RawArtifact> {
    let path = path.as_ref();
    let bytes = std::fs::read(path)?;
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("unknown")
        .to_string();
    let kind = path
        .extension()
        .and_then(|e| e.to_str())
        .and_then(ArtifactKind::from_extension);

    Ok(RawArtifact { name, kind, bytes })
}
