//! Keyword-driven STAR classification and key-sentence extraction.
//!
//! This is a deterministic heuristic: sentences are scored by domain
//! keyword/product-code hits and bucketed by small curated trigger lists.

use crate::types::{StarBucket, StarSection};
use crate::DomainDict;

/// Points per domain keyword found in a sentence.
const KEYWORD_SCORE: u32 = 2;

/// Points per product code found in a sentence.
const PRODUCT_CODE_SCORE: u32 = 3;

/// Triggers for failures and abnormal conditions.
const SITUATION_TRIGGERS: &[&str] = &["fail", "error", "異常", "fail rate", "good rate", "良率"];

/// Triggers for requirements and goals.
const TASK_TRIGGERS: &[&str] = &["需要", "需", "目標", "目標是", "要求"];

/// Triggers for completed actions.
const ACTION_TRIGGERS: &[&str] = &["已", "已經", "調整", "更改", "修正", "採取"];

/// Triggers for outcomes.
const RESULT_TRIGGERS: &[&str] = &["回升", "改善", "改善為", "結果", "暫時"];

/// Trigger lists in the order they are checked.
const PRIORITY: [(StarSection, &[&str]); 4] = [
    (StarSection::Situation, SITUATION_TRIGGERS),
    (StarSection::Task, TASK_TRIGGERS),
    (StarSection::Action, ACTION_TRIGGERS),
    (StarSection::Result, RESULT_TRIGGERS),
];

/// Score a sentence against a domain dictionary.
///
/// Every keyword contained in the sentence adds 2, every product code adds 3.
pub fn score_sentence(sentence: &str, dict: &DomainDict) -> u32 {
    let keyword_hits = dict
        .keywords
        .iter()
        .filter(|kw| !kw.is_empty() && sentence.contains(kw.as_str()))
        .count() as u32;
    let code_hits = dict
        .product_codes
        .iter()
        .filter(|code| !code.is_empty() && sentence.contains(code.as_str()))
        .count() as u32;

    keyword_hits * KEYWORD_SCORE + code_hits * PRODUCT_CODE_SCORE
}

/// Rank the non-empty lines of `text` by score and return the top `top_n`.
///
/// Ties keep their original order.
pub fn extract_key_sentences(text: &str, dict: &DomainDict, top_n: usize) -> Vec<String> {
    let mut scored: Vec<(u32, &str)> = text
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(|l| (score_sentence(l, dict), l))
        .collect();

    // sort_by is stable, so equal scores stay in source order
    scored.sort_by(|a, b| b.0.cmp(&a.0));

    scored
        .into_iter()
        .take(top_n)
        .map(|(_, l)| l.to_string())
        .collect()
}

/// Assigns sentences to STAR sections.
#[derive(Debug, Clone, Default)]
pub struct StarClassifier {
    dict: DomainDict,
}

impl StarClassifier {
    /// Create a classifier over a domain dictionary.
    pub fn new(dict: DomainDict) -> Self {
        Self { dict }
    }

    /// The dictionary used for scoring.
    pub fn dict(&self) -> &DomainDict {
        &self.dict
    }

    /// Pick the section for a single sentence.
    ///
    /// Trigger lists are checked in Situation, Task, Action, Result order;
    /// a sentence matching none lands in Action.
    pub fn section_for(&self, sentence: &str) -> StarSection {
        let lower = sentence.to_lowercase();
        PRIORITY
            .iter()
            .find(|(_, triggers)| triggers.iter().any(|t| lower.contains(t)))
            .map(|(section, _)| *section)
            .unwrap_or(StarSection::Action)
    }

    /// Bucket sentences. Each input sentence lands in exactly one section,
    /// so the bucket's total length always equals `sentences.len()`.
    pub fn classify<S: AsRef<str>>(&self, sentences: &[S]) -> StarBucket {
        let mut bucket = StarBucket::new();
        for sentence in sentences {
            let sentence = sentence.as_ref().trim();
            let section = self.section_for(sentence);
            log::debug!(
                "{:?} (score {}): {}",
                section,
                score_sentence(sentence, &self.dict),
                sentence
            );
            bucket.push(section, sentence);
        }
        bucket
    }

    /// Shortlist the highest-scoring lines of `text`, then classify them.
    pub fn draft(&self, text: &str, top_n: usize) -> (Vec<String>, StarBucket) {
        let key_sentences = extract_key_sentences(text, &self.dict, top_n);
        let bucket = self.classify(&key_sentences);
        (key_sentences, bucket)
    }
}
