//! Document loading: turns raw input files into text.
//!
//! Images and PDFs go through preprocessing and OCR, plain text is decoded
//! directly, and Outlook messages are flattened into a sender/subject/body
//! layout. Batches are processed one file at a time, in order.

pub mod batch;
pub mod decode;
pub mod loader;

pub use batch::{BatchItem, BatchResult, ItemOutcome, batch_separator};
pub use decode::decode_text;
pub use loader::{artifact_from_path, DocumentLoader};
