//! OCR engines.
//!
//! Both shipped engines drive the `tesseract` command-line tool in different
//! page segmentation modes. The [`OcrEngine`] trait is the seam the
//! coordinator works against, so tests and other backends can stand in.

use crate::error::OcrError;
use image::{GrayImage, ImageFormat};
use std::io::ErrorKind;
use std::path::PathBuf;
use std::process::Command;

/// Default recognition languages: traditional Chinese, simplified Chinese,
/// English.
pub const DEFAULT_LANGUAGES: &str = "chi_tra+chi_sim+eng";

/// A text recognizer for preprocessed single-channel images.
pub trait OcrEngine {
    /// Short identifier used in logs.
    fn name(&self) -> &str;

    /// Recognize text lines, top to bottom. May return an empty list.
    fn recognize(&self, image: &GrayImage) -> Result<Vec<String>, OcrError>;
}

/// How tesseract segments the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TesseractMode {
    /// Full layout analysis with orientation detection, word-level TSV output.
    Layout,
    /// Single uniform block of text, plain output.
    Lines,
}

impl TesseractMode {
    fn psm(&self) -> &'static str {
        match self {
            TesseractMode::Layout => "1",
            TesseractMode::Lines => "6",
        }
    }
}

/// Engine backed by the `tesseract` executable.
#[derive(Debug, Clone)]
pub struct TesseractEngine {
    program: PathBuf,
    languages: String,
    mode: TesseractMode,
}

impl TesseractEngine {
    /// Layout-analysis engine, used as the primary recognizer.
    pub fn layout() -> Self {
        Self::with_mode(TesseractMode::Layout)
    }

    /// Plain line engine, used as the fallback recognizer.
    pub fn lines() -> Self {
        Self::with_mode(TesseractMode::Lines)
    }

    fn with_mode(mode: TesseractMode) -> Self {
        Self {
            program: PathBuf::from("tesseract"),
            languages: DEFAULT_LANGUAGES.to_string(),
            mode,
        }
    }

    /// Use a specific tesseract executable.
    pub fn with_program(mut self, program: impl Into<PathBuf>) -> Self {
        self.program = program.into();
        self
    }

    /// Set the `-l` language list, e.g. `chi_tra+eng`.
    pub fn with_languages(mut self, languages: impl Into<String>) -> Self {
        self.languages = languages.into();
        self
    }

    /// Segmentation mode.
    pub fn mode(&self) -> TesseractMode {
        self.mode
    }

    fn run(&self, image: &GrayImage) -> Result<String, OcrError> {
        let input = tempfile::Builder::new()
            .prefix("star-ocr-")
            .suffix(".png")
            .tempfile()
            .map_err(|e| OcrError::Recognition(format!("temp file: {}", e)))?;
        image
            .save_with_format(input.path(), ImageFormat::Png)
            .map_err(|e| OcrError::InvalidImage(e.to_string()))?;

        let mut command = Command::new(&self.program);
        command
            .arg(input.path())
            .arg("stdout")
            .args(["-l", &self.languages])
            .args(["--psm", self.mode.psm()]);
        if self.mode == TesseractMode::Layout {
            command.arg("tsv");
        }

        log::debug!("Running {:?}", command);
        let output = command.output().map_err(|e| match e.kind() {
            ErrorKind::NotFound => OcrError::EngineNotFound(self.program.display().to_string()),
            _ => OcrError::Recognition(e.to_string()),
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(OcrError::Recognition(format!(
                "{} exited with {}: {}",
                self.program.display(),
                output.status,
                stderr.trim()
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

impl OcrEngine for TesseractEngine {
    fn name(&self) -> &str {
        match self.mode {
            TesseractMode::Layout => "tesseract-layout",
            TesseractMode::Lines => "tesseract-lines",
        }
    }

    fn recognize(&self, image: &GrayImage) -> Result<Vec<String>, OcrError> {
        if image.width() == 0 || image.height() == 0 {
            return Err(OcrError::InvalidImage("image has no pixels".to_string()));
        }
        let stdout = self.run(image)?;
        Ok(match self.mode {
            TesseractMode::Layout => lines_from_tsv(&stdout),
            TesseractMode::Lines => lines_from_plain(&stdout),
        })
    }
}

/// Group word rows of tesseract TSV output into text lines.
///
/// Rows are keyed by page, block, paragraph and line number; lines come out
/// in order of first appearance.
pub fn lines_from_tsv(tsv: &str) -> Vec<String> {
    let mut keys: Vec<(u32, u32, u32, u32)> = Vec::new();
    let mut lines: Vec<String> = Vec::new();

    for row in tsv.lines() {
        let cols: Vec<&str> = row.split('\t').collect();
        if cols.len() < 12 || cols[0] != "5" {
            continue;
        }
        let text = cols[11..].join("\t");
        let text = text.trim();
        if text.is_empty() {
            continue;
        }
        let parse = |s: &str| s.trim().parse::<u32>().ok();
        let (Some(page), Some(block), Some(par), Some(line)) =
            (parse(cols[1]), parse(cols[2]), parse(cols[3]), parse(cols[4]))
        else {
            continue;
        };

        let key = (page, block, par, line);
        match keys.iter().position(|k| *k == key) {
            Some(idx) => append_word(&mut lines[idx], text),
            None => {
                keys.push(key);
                lines.push(text.to_string());
            }
        }
    }

    lines
}

/// Append a word, separating with a space unless both sides are non-ASCII.
fn append_word(line: &mut String, word: &str) {
    let prev_wide = line.chars().last().is_some_and(|c| !c.is_ascii());
    let next_wide = word.chars().next().is_some_and(|c| !c.is_ascii());
    if !(prev_wide && next_wide) {
        line.push(' ');
    }
    line.push_str(word);
}

/// Split plain tesseract output into non-empty trimmed lines.
pub fn lines_from_plain(text: &str) -> Vec<String> {
    text.lines()
        .map(|l| l.trim_end_matches('\u{c}').trim())
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    const HEADER: &str =
        "level\tpage_num\tblock_num\tpar_num\tline_num\tword_num\tleft\ttop\twidth\theight\tconf\ttext";

    fn word(page: u32, block: u32, par: u32, line: u32, n: u32, text: &str) -> String {
        format!("5\t{page}\t{block}\t{par}\t{line}\t{n}\t0\t0\t10\t10\t95.0\t{text}")
    }

    #[test]
    fn test_tsv_groups_words_into_lines() {
        let tsv = [
            HEADER.to_string(),
            "1\t1\t0\t0\t0\t0\t0\t0\t100\t100\t-1\t".to_string(),
            word(1, 1, 1, 1, 1, "Yield"),
            word(1, 1, 1, 1, 2, "82%"),
            word(1, 1, 1, 2, 1, "良率"),
            word(1, 1, 1, 2, 2, "下降"),
            word(1, 1, 1, 2, 3, "PN-100"),
            word(1, 2, 1, 1, 1, "   "),
        ]
        .join("\n");

        assert_eq!(lines_from_tsv(&tsv), vec!["Yield 82%", "良率下降 PN-100"]);
    }

    #[test]
    fn test_tsv_first_appearance_order() {
        let tsv = [
            word(1, 2, 1, 1, 1, "second"),
            word(1, 1, 1, 1, 1, "first"),
            word(1, 2, 1, 1, 2, "again"),
        ]
        .join("\n");
        assert_eq!(lines_from_tsv(&tsv), vec!["second again", "first"]);
    }

    #[test]
    fn test_tsv_ignores_garbage() {
        assert!(lines_from_tsv("").is_empty());
        assert!(lines_from_tsv("5\tx\t1\t1\t1\t1\t0\t0\t1\t1\t90\tword").is_empty());
        assert!(lines_from_tsv(HEADER).is_empty());
    }

    #[test]
    fn test_plain_lines() {
        let text = "  第一行 \n\n second line\n\u{c}";
        assert_eq!(lines_from_plain(text), vec!["第一行", "second line"]);
    }

    #[test]
    fn test_missing_program_is_engine_not_found() {
        let engine = TesseractEngine::lines().with_program("/nonexistent/star-tesseract");
        let image = GrayImage::from_pixel(4, 4, Luma([255]));
        match engine.recognize(&image) {
            Err(OcrError::EngineNotFound(p)) => assert!(p.contains("star-tesseract")),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_empty_image_rejected() {
        let engine = TesseractEngine::layout();
        assert!(matches!(
            engine.recognize(&GrayImage::new(0, 0)),
            Err(OcrError::InvalidImage(_))
        ));
    }

    #[test]
    fn test_engine_names_and_modes() {
        assert_eq!(TesseractEngine::layout().name(), "tesseract-layout");
        assert_eq!(TesseractEngine::lines().mode(), TesseractMode::Lines);
        assert_eq!(TesseractMode::Layout.psm(), "1");
    }
}
