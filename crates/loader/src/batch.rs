//! Batch results.

use serde::Serialize;

/// Separator line placed before the `index`-th (1-based) artifact of a
/// batch.
pub fn batch_separator(index: usize) -> String {
    format!("{} 檔案 {} {}", "=".repeat(20), index, "=".repeat(20))
}

/// What happened to one artifact of a batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ItemOutcome {
    /// Text was extracted.
    Loaded { chars: usize },
    /// The artifact was readable but produced no text.
    Empty,
    /// The artifact was skipped.
    Skipped { reason: String },
}

impl ItemOutcome {
    pub fn is_loaded(&self) -> bool {
        matches!(self, ItemOutcome::Loaded { .. })
    }
}

/// One artifact and its outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchItem {
    pub name: String,
    pub outcome: ItemOutcome,
}

/// Outcomes of a batch plus the merged, normalized text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchResult {
    pub items: Vec<BatchItem>,
    pub text: String,
}

impl BatchResult {
    /// Number of artifacts that produced text.
    pub fn loaded_count(&self) -> usize {
        self.items.iter().filter(|i| i.outcome.is_loaded()).count()
    }

    /// Artifacts that were skipped, with reasons.
    pub fn skipped(&self) -> impl Iterator<Item = (&str, &str)> {
        self.items.iter().filter_map(|item| match &item.outcome {
            ItemOutcome::Skipped { reason } => Some((item.name.as_str(), reason.as_str())),
            _ => None,
        })
    }
}
