//! Text normalization for OCR output and loaded documents.
//!
//! Unifies line endings, collapses blank-line runs and horizontal whitespace
//! runs, and trims the result.

use regex::Regex;
use std::sync::LazyLock;

/// Regex to collapse runs of newlines into one.
static NEWLINE_RUN_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n{2,}").unwrap());

/// Regex to collapse runs of horizontal whitespace into one space.
static WHITESPACE_COLLAPSE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[ \t]{2,}").unwrap());

/// Text normalizer producing the canonical form consumed by the classifier
/// and shown to users for review.
#[derive(Debug, Clone, Default)]
pub struct TextNormalizer;

impl TextNormalizer {
    /// Create a new text normalizer.
    pub fn new() -> Self {
        Self
    }

    /// Normalize a block of text.
    ///
    /// - Converts `\r\n` and `\r` to `\n`
    /// - Collapses consecutive newlines into one
    /// - Collapses runs of spaces/tabs into a single space
    /// - Trims leading/trailing whitespace
    ///
    /// Normalizing already-normalized text returns it unchanged.
    pub fn normalize(&self, text: &str) -> String {
        let unified = text.replace("\r\n", "\n").replace('\r', "\n");
        let collapsed = NEWLINE_RUN_REGEX.replace_all(&unified, "\n");
        let collapsed = WHITESPACE_COLLAPSE_REGEX.replace_all(&collapsed, " ");
        collapsed.trim().to_string()
    }

    /// Normalize text and split it into sentences: trimmed, non-empty lines.
    pub fn to_sentences(&self, text: &str) -> Vec<String> {
        self.normalize(text)
            .lines()
            .map(|l| l.trim().to_string())
            .filter(|l| !l.is_empty())
            .collect()
    }
}
