//! PPTX (Office Open XML) writer for report slides.
//!
//! Opens an existing .pptx (a ZIP archive of XML parts) or starts from a
//! built-in template, and appends one title-and-content slide per report
//! block without touching existing slides.

pub mod deck;
pub mod package;
pub mod slide;
pub mod template;

pub use deck::{append_report_text, SlideDeck};
pub use package::Package;
