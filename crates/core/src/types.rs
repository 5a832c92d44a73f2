//! Domain types flowing through the pipeline, from raw input artifacts to
//! slide specifications.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The kind of an input artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ArtifactKind {
    /// A still raster image (PNG, JPEG, ...).
    Image,
    /// A PDF document; only the first page is used.
    Pdf,
    /// Plain text, UTF-8 or legacy Chinese encoding.
    PlainText,
    /// A structured email export (Outlook .msg).
    Email,
}

impl ArtifactKind {
    /// Detect kind from file extension.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.trim_start_matches('.').to_lowercase().as_str() {
            "png" | "jpg" | "jpeg" | "bmp" | "gif" | "tif" | "tiff" | "webp" => Some(Self::Image),
            "pdf" => Some(Self::Pdf),
            "txt" => Some(Self::PlainText),
            "msg" => Some(Self::Email),
            _ => None,
        }
    }

    /// Detect kind from file magic bytes.
    ///
    /// Plain text has no signature and is never returned here.
    pub fn from_magic(bytes: &[u8]) -> Option<Self> {
        if bytes.len() < 4 {
            return None;
        }

        if bytes.starts_with(b"%PDF") {
            return Some(Self::Pdf);
        }

        // Outlook .msg is an OLE/CFB file (D0 CF 11 E0 A1 B1 1A E1)
        if bytes.len() >= 8
            && bytes.starts_with(&[0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1])
        {
            return Some(Self::Email);
        }

        let is_image = bytes.starts_with(&[0x89, b'P', b'N', b'G'])
            || bytes.starts_with(&[0xFF, 0xD8, 0xFF])
            || bytes.starts_with(b"GIF8")
            || bytes.starts_with(b"BM")
            || bytes.starts_with(b"II*\0")
            || bytes.starts_with(b"MM\0*")
            || (bytes.len() >= 12 && bytes.starts_with(b"RIFF") && &bytes[8..12] == b"WEBP");

        if is_image {
            Some(Self::Image)
        } else {
            None
        }
    }

    /// Whether this kind goes through preprocessing and OCR.
    pub fn needs_ocr(&self) -> bool {
        matches!(self, Self::Image | Self::Pdf)
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Image => "image",
            Self::Pdf => "PDF",
            Self::PlainText => "plain text",
            Self::Email => "email",
        };
        f.write_str(name)
    }
}

/// An input payload as handed to the loader.
#[derive(Debug, Clone)]
pub struct RawArtifact {
    /// Source name, usually the file name. Used for extension sniffing.
    pub name: String,

    /// Declared kind, if the caller knows it.
    pub kind: Option<ArtifactKind>,

    /// Raw bytes.
    pub bytes: Vec<u8>,
}

impl RawArtifact {
    /// Create an artifact whose kind will be sniffed by the loader.
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            kind: None,
            bytes,
        }
    }

    /// Create an artifact with a declared kind.
    pub fn with_kind(name: impl Into<String>, kind: ArtifactKind, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            kind: Some(kind),
            bytes,
        }
    }

    /// Lowercased extension of the source name, with a leading dot, or an
    /// empty string if there is none.
    pub fn extension(&self) -> String {
        self.name
            .rsplit_once('.')
            .map(|(_, ext)| format!(".{}", ext.to_lowercase()))
            .unwrap_or_default()
    }
}

/// Which OCR engine produced a piece of text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EngineId {
    /// The layout-aware, multi-language engine.
    Primary,
    /// The classical line-based engine.
    Fallback,
}

/// Text recognized from one image or PDF page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedText {
    /// Recognized lines, in reading order.
    pub lines: Vec<String>,

    /// The engine that produced the lines. None when nothing was recognized.
    pub engine: Option<EngineId>,
}

impl ExtractedText {
    /// An empty result.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Create a result from an engine's lines.
    pub fn from_engine(engine: EngineId, lines: Vec<String>) -> Self {
        Self {
            lines,
            engine: Some(engine),
        }
    }

    /// True if no line carries any visible text.
    pub fn is_empty(&self) -> bool {
        self.lines.iter().all(|l| l.trim().is_empty())
    }

    /// All lines joined with newlines.
    pub fn text(&self) -> String {
        self.lines.join("\n")
    }
}

/// One of the four STAR sections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StarSection {
    Situation,
    Task,
    Action,
    Result,
}

impl StarSection {
    /// All sections in report order.
    pub const ALL: [StarSection; 4] = [
        StarSection::Situation,
        StarSection::Task,
        StarSection::Action,
        StarSection::Result,
    ];

    /// Heading label in the working language, with the English name.
    pub fn label(&self) -> &'static str {
        match self {
            StarSection::Situation => "情境 (Situation)",
            StarSection::Task => "任務 (Task)",
            StarSection::Action => "行動 (Action)",
            StarSection::Result => "結果 (Result)",
        }
    }
}

/// Sentences sorted into the four STAR sections.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StarBucket {
    pub situation: Vec<String>,
    pub task: Vec<String>,
    pub action: Vec<String>,
    pub result: Vec<String>,
}

impl StarBucket {
    /// Create an empty bucket.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a sentence to a section.
    pub fn push(&mut self, section: StarSection, sentence: impl Into<String>) {
        self.section_mut(section).push(sentence.into());
    }

    /// Sentences in a section.
    pub fn section(&self, section: StarSection) -> &[String] {
        match section {
            StarSection::Situation => &self.situation,
            StarSection::Task => &self.task,
            StarSection::Action => &self.action,
            StarSection::Result => &self.result,
        }
    }

    fn section_mut(&mut self, section: StarSection) -> &mut Vec<String> {
        match section {
            StarSection::Situation => &mut self.situation,
            StarSection::Task => &mut self.task,
            StarSection::Action => &mut self.action,
            StarSection::Result => &mut self.result,
        }
    }

    /// Total number of sentences across all sections.
    pub fn len(&self) -> usize {
        StarSection::ALL
            .iter()
            .map(|s| self.section(*s).len())
            .sum()
    }

    /// True if no section holds a sentence.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Render as an editable STAR outline: one heading per non-empty section
    /// followed by indented bullets.
    pub fn to_outline(&self) -> String {
        let mut out = Vec::new();
        for section in StarSection::ALL {
            let sentences = self.section(section);
            if sentences.is_empty() {
                continue;
            }
            out.push(format!("- {}", section.label()));
            for s in sentences {
                out.push(format!("  - {}", s));
            }
        }
        out.join("\n")
    }
}

/// A single cleaned line of a report block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportLine {
    /// Cleaned text, bullets and emphasis markers removed.
    pub text: String,

    /// Indent level: 0 for headings, 1 for body bullets.
    pub level: u8,
}

impl ReportLine {
    /// Create a line at the given level.
    pub fn new(text: impl Into<String>, level: u8) -> Self {
        Self {
            text: text.into(),
            level: level.min(1),
        }
    }
}

/// A heading and the body lines beneath it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    /// Heading text. Empty for body lines that precede any heading.
    pub heading: String,

    /// Body lines under the heading.
    pub lines: Vec<ReportLine>,
}

/// One delimited, titled report parsed from generated text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportBlock {
    /// Report title taken from the block marker.
    pub title: String,

    /// Sections in source order.
    pub sections: Vec<Section>,
}

impl ReportBlock {
    /// Create an empty block with the given title.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            sections: Vec::new(),
        }
    }

    /// Start a new section under a heading.
    pub fn push_heading(&mut self, heading: impl Into<String>) {
        self.sections.push(Section {
            heading: heading.into(),
            lines: Vec::new(),
        });
    }

    /// Append a body line to the current section, opening an untitled
    /// section if none exists yet.
    pub fn push_line(&mut self, line: ReportLine) {
        if self.sections.is_empty() {
            self.sections.push(Section::default());
        }
        if let Some(section) = self.sections.last_mut() {
            section.lines.push(line);
        }
    }

    /// All lines flattened in source order, headings at level 0.
    pub fn lines(&self) -> Vec<ReportLine> {
        let mut out = Vec::new();
        for section in &self.sections {
            if !section.heading.is_empty() {
                out.push(ReportLine::new(section.heading.clone(), 0));
            }
            out.extend(section.lines.iter().cloned());
        }
        out
    }

    /// Number of lines, headings included.
    pub fn line_count(&self) -> usize {
        self.sections
            .iter()
            .map(|s| s.lines.len() + usize::from(!s.heading.is_empty()))
            .sum()
    }

    /// A block is acceptable when it has a title and at least one line.
    pub fn is_valid(&self) -> bool {
        !self.title.trim().is_empty() && self.line_count() > 0
    }
}

/// Visual weight of a slide paragraph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Emphasis {
    /// Bold, larger font.
    Heading,
    /// Regular, smaller font.
    Body,
}

impl Emphasis {
    /// Whether text is bold.
    pub fn is_bold(&self) -> bool {
        matches!(self, Emphasis::Heading)
    }

    /// Font size in points.
    pub fn font_size_pt(&self) -> u32 {
        match self {
            Emphasis::Heading => 18,
            Emphasis::Body => 16,
        }
    }
}

/// A paragraph in a slide body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlideParagraph {
    pub text: String,
    pub level: u8,
    pub emphasis: Emphasis,
}

/// Title and body paragraphs for one slide.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlideSpec {
    pub title: String,
    pub paragraphs: Vec<SlideParagraph>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_from_extension() {
        assert_eq!(ArtifactKind::from_extension("PNG"), Some(ArtifactKind::Image));
        assert_eq!(ArtifactKind::from_extension(".jpeg"), Some(ArtifactKind::Image));
        assert_eq!(ArtifactKind::from_extension("pdf"), Some(ArtifactKind::Pdf));
        assert_eq!(ArtifactKind::from_extension("txt"), Some(ArtifactKind::PlainText));
        assert_eq!(ArtifactKind::from_extension("msg"), Some(ArtifactKind::Email));
        assert_eq!(ArtifactKind::from_extension("docx"), None);
    }

    #[test]
    fn test_kind_from_magic() {
        assert_eq!(
            ArtifactKind::from_magic(b"%PDF-1.7\n"),
            Some(ArtifactKind::Pdf)
        );
        assert_eq!(
            ArtifactKind::from_magic(&[0x89, b'P', b'N', b'G', 0x0D, 0x0A]),
            Some(ArtifactKind::Image)
        );
        assert_eq!(
            ArtifactKind::from_magic(&[0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1]),
            Some(ArtifactKind::Email)
        );
        assert_eq!(ArtifactKind::from_magic(b"hello world"), None);
        assert_eq!(ArtifactKind::from_magic(b"ab"), None);
    }

    #[test]
    fn test_artifact_extension() {
        assert_eq!(RawArtifact::new("scan.JPG", vec![]).extension(), ".jpg");
        assert_eq!(RawArtifact::new("README", vec![]).extension(), "");
    }

    #[test]
    fn test_extracted_text_empty_flag() {
        assert!(ExtractedText::empty().is_empty());
        let blank = ExtractedText::from_engine(EngineId::Primary, vec!["  ".to_string()]);
        assert!(blank.is_empty());
        let text = ExtractedText::from_engine(EngineId::Fallback, vec!["a".into(), "b".into()]);
        assert!(!text.is_empty());
        assert_eq!(text.text(), "a\nb");
    }

    #[test]
    fn test_bucket_len_and_outline() {
        let mut bucket = StarBucket::new();
        bucket.push(StarSection::Situation, "良率下降");
        bucket.push(StarSection::Action, "已調整參數");
        bucket.push(StarSection::Action, "更換治具");
        assert_eq!(bucket.len(), 3);

        let outline = bucket.to_outline();
        assert_eq!(
            outline,
            "- 情境 (Situation)\n  - 良率下降\n- 行動 (Action)\n  - 已調整參數\n  - 更換治具"
        );
    }

    #[test]
    fn test_report_block_lines_and_validity() {
        let mut block = ReportBlock::new("A");
        assert!(!block.is_valid());

        block.push_line(ReportLine::new("orphan", 1));
        block.push_heading("情境 (Situation)");
        block.push_line(ReportLine::new("detail", 1));

        assert!(block.is_valid());
        assert_eq!(block.line_count(), 3);
        let lines = block.lines();
        assert_eq!(lines[0], ReportLine::new("orphan", 1));
        assert_eq!(lines[1], ReportLine::new("情境 (Situation)", 0));
        assert_eq!(lines[2], ReportLine::new("detail", 1));
    }

    #[test]
    fn test_report_line_level_clamped() {
        assert_eq!(ReportLine::new("x", 5).level, 1);
    }

    #[test]
    fn test_emphasis_fonts() {
        assert!(Emphasis::Heading.is_bold());
        assert_eq!(Emphasis::Heading.font_size_pt(), 18);
        assert!(!Emphasis::Body.is_bold());
        assert_eq!(Emphasis::Body.font_size_pt(), 16);
    }
}
