//! Core domain types, text normalization, STAR classification and report
//! block parsing for the document-to-slides pipeline.

pub mod classify;
pub mod domain;
pub mod error;
pub mod normalize;
pub mod report;
pub mod slides;
pub mod types;

pub use classify::{extract_key_sentences, StarClassifier};
pub use domain::DomainDict;
pub use error::{Error, Result};
pub use normalize::TextNormalizer;
pub use report::{ParseOutcome, ParseStrategy, ReportParser};
pub use slides::{compose_title, SlidePlanner};
pub use types::{
    ArtifactKind, EngineId, Emphasis, ExtractedText, RawArtifact, ReportBlock, ReportLine,
    Section, SlideParagraph, SlideSpec, StarBucket, StarSection,
};
