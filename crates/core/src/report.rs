//! Parser for generated report text.
//!
//! The report writer emits one or more blocks, each introduced by a marker
//! line:
//!
//! ```text
//! --- 報告 1：Line 3 yield drop ---
//! - 情境 (Situation)
//!   - Yield fell to 82% on PN-100
//! - 行動 (Action)
//!   - Replaced the fixture
//! ```
//!
//! Both the full-width `：` and ASCII `:` are accepted after the number.
//! Body lines are turned into headings (level 0) and bullets (level 1) by a
//! [`ParseStrategy`] chosen when the parser is built.

use crate::types::{ReportBlock, ReportLine};
use regex::Regex;
use std::sync::LazyLock;

/// Block-start marker: `--- 報告 <N>[:：] <title> ---` on its own line.
static MARKER_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^[ \t]*---[ \t]*報告[ \t]*(\d+)[ \t]*[:：][ \t]*(.*?)[ \t]*---[ \t]*$").unwrap()
});

/// Leading bullet markers: hyphen, asterisk, bullet glyph, backtick, whitespace.
static LEADING_BULLET_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[\s\-*•`]+").unwrap());

/// A single `-` or `*` bullet followed by whitespace.
static SIMPLE_BULLET_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*[-*]\s+").unwrap());

/// Section labels that mark a heading line, working language and English.
pub const STAR_LABELS: &[&str] = &[
    "情境", "任務", "行動", "結果", "Situation", "Task", "Action", "Result",
];

/// How body lines are split into headings and bullets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParseStrategy {
    /// A cleaned line starting with a STAR label is a heading; everything
    /// else is a bullet.
    #[default]
    HeadingKeyword,
    /// A raw line starting with two or more spaces is a bullet; everything
    /// else is a heading.
    IndentWhitespace,
}

/// Blocks accepted by a parse, plus how many marker segments were rejected.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParseOutcome {
    pub blocks: Vec<ReportBlock>,
    pub dropped: usize,
}

/// Parser for delimited report text.
#[derive(Debug, Clone, Default)]
pub struct ReportParser {
    strategy: ParseStrategy,
}

impl ReportParser {
    /// Create a parser with the given line strategy.
    pub fn new(strategy: ParseStrategy) -> Self {
        Self { strategy }
    }

    /// The line strategy in use.
    pub fn strategy(&self) -> ParseStrategy {
        self.strategy
    }

    /// Parse report text into accepted blocks.
    pub fn parse(&self, text: &str) -> Vec<ReportBlock> {
        self.parse_with_stats(text).blocks
    }

    /// Parse report text, also counting rejected segments.
    ///
    /// Text before the first marker is ignored. A segment with an empty
    /// title or an empty body is dropped, not reported as an error.
    pub fn parse_with_stats(&self, text: &str) -> ParseOutcome {
        let text = text.replace("\r\n", "\n");
        let markers: Vec<_> = MARKER_REGEX.captures_iter(&text).collect();
        let mut outcome = ParseOutcome::default();

        for (idx, caps) in markers.iter().enumerate() {
            let (Some(whole), Some(title)) = (caps.get(0), caps.get(2)) else {
                continue;
            };
            let body_end = markers
                .get(idx + 1)
                .and_then(|next| next.get(0))
                .map(|m| m.start())
                .unwrap_or(text.len());
            let body = &text[whole.end()..body_end];

            match self.parse_block(title.as_str(), body) {
                Some(block) => outcome.blocks.push(block),
                None => {
                    log::debug!(
                        "Dropping report {} ('{}'): empty title or body",
                        caps.get(1).map(|m| m.as_str()).unwrap_or("?"),
                        title.as_str()
                    );
                    outcome.dropped += 1;
                }
            }
        }

        outcome
    }

    /// Build one block from a title and body, or None if it is unusable.
    fn parse_block(&self, title: &str, body: &str) -> Option<ReportBlock> {
        let title = title.trim();
        if title.is_empty() || body.trim().is_empty() {
            return None;
        }

        let mut block = ReportBlock::new(title);
        for raw in body.lines() {
            if raw.trim().is_empty() {
                continue;
            }
            match self.classify_line(raw) {
                Some((text, true)) => block.push_heading(text),
                Some((text, false)) => block.push_line(ReportLine::new(text, 1)),
                None => {}
            }
        }

        block.is_valid().then_some(block)
    }

    /// Clean a raw body line and decide whether it is a heading.
    fn classify_line(&self, raw: &str) -> Option<(String, bool)> {
        match self.strategy {
            ParseStrategy::HeadingKeyword => {
                let cleaned = clean_bullet_line(raw);
                if cleaned.is_empty() {
                    return None;
                }
                let heading = is_star_heading(&cleaned);
                Some((cleaned, heading))
            }
            ParseStrategy::IndentWhitespace => {
                let indented = raw.starts_with("  ");
                let cleaned = SIMPLE_BULLET_REGEX.replace(raw, "").trim().to_string();
                if cleaned.is_empty() {
                    return None;
                }
                Some((cleaned, !indented))
            }
        }
    }
}

/// Strip leading bullet markers and surrounding `*` emphasis from a line.
pub fn clean_bullet_line(line: &str) -> String {
    let stripped = LEADING_BULLET_REGEX.replace(line.trim(), "");
    stripped.trim().trim_matches('*').trim().to_string()
}

/// Whether a cleaned line starts with one of the STAR section labels.
pub fn is_star_heading(cleaned: &str) -> bool {
    let lower = cleaned.to_lowercase();
    STAR_LABELS
        .iter()
        .any(|label| lower.starts_with(&label.to_lowercase()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_two_blocks_indent_strategy() {
        let parser = ReportParser::new(ParseStrategy::IndentWhitespace);
        let text = "--- 報告 1：A ---\nline1\nline2\n--- 報告 2：B ---\n  sub-line";

        let blocks = parser.parse(text);
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].title, "A");
        assert_eq!(blocks[1].title, "B");

        let first = blocks[0].lines();
        assert_eq!(first[0], ReportLine::new("line1", 0));
        assert_eq!(first[1], ReportLine::new("line2", 0));
        assert_eq!(blocks[1].lines(), vec![ReportLine::new("sub-line", 1)]);
    }

    #[test]
    fn test_two_blocks_heading_strategy() {
        let parser = ReportParser::default();
        let text = "--- 報告 1：A ---\nline1\nline2\n--- 報告 2：B ---\n  sub-line";

        let blocks = parser.parse(text);
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].title, "A");
        assert_eq!(blocks[1].title, "B");
        // No STAR labels, so every line is a bullet
        assert!(blocks[0].lines().iter().all(|l| l.level == 1));
        assert_eq!(blocks[1].lines(), vec![ReportLine::new("sub-line", 1)]);
    }

    #[test]
    fn test_empty_body_dropped() {
        let parser = ReportParser::default();
        let text = "--- 報告 1：A ---\n--- 報告 2：B ---\ncontent";

        let outcome = parser.parse_with_stats(text);
        assert_eq!(outcome.blocks.len(), 1);
        assert_eq!(outcome.blocks[0].title, "B");
        assert_eq!(outcome.dropped, 1);
    }

    #[test]
    fn test_trailing_empty_marker_dropped() {
        let parser = ReportParser::default();
        let text = "--- 報告 1：A ---\ncontent\n\n--- 報告 2：B ---\n   \n";

        let outcome = parser.parse_with_stats(text);
        assert_eq!(outcome.blocks.len(), 1);
        assert_eq!(outcome.dropped, 1);
    }

    #[test]
    fn test_both_colon_glyphs() {
        let parser = ReportParser::default();
        let text = "--- 報告 1: Ascii colon ---\nx\n--- 報告 2：Wide colon   ---\ny";

        let blocks = parser.parse(text);
        let titles: Vec<_> = blocks.iter().map(|b| b.title.as_str()).collect();
        assert_eq!(titles, vec!["Ascii colon", "Wide colon"]);
    }

    #[test]
    fn test_preamble_ignored_and_no_markers() {
        let parser = ReportParser::default();
        assert!(parser.parse("Here are your reports:\n- nothing").is_empty());

        let blocks = parser.parse("Sure!\n--- 報告 1：T ---\nbody");
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].lines(), vec![ReportLine::new("body", 1)]);
    }

    #[test]
    fn test_empty_title_dropped() {
        let parser = ReportParser::default();
        let outcome = parser.parse_with_stats("--- 報告 1： ---\nbody");
        assert!(outcome.blocks.is_empty());
        assert_eq!(outcome.dropped, 1);
    }

    #[test]
    fn test_heading_detection_and_sections() {
        let parser = ReportParser::default();
        let text = "--- 報告 1：PN-100 良率下降 ---\n\
                    - **情境 (Situation)**\n\
                    \x20 - 良率由 98% 降至 82%\n\
                    * **Task:** recover yield\n\
                    \x20 * 三天內恢復\n\
                    - 行動 (Action)\n\
                    \x20 - `已更換治具`\n\
                    • result: 良率回升\n";

        let blocks = parser.parse(text);
        assert_eq!(blocks.len(), 1);
        let block = &blocks[0];
        assert_eq!(block.title, "PN-100 良率下降");
        assert_eq!(block.sections.len(), 4);
        assert_eq!(block.sections[0].heading, "情境 (Situation)");
        assert_eq!(block.sections[0].lines, vec![ReportLine::new("良率由 98% 降至 82%", 1)]);
        assert_eq!(block.sections[1].heading, "Task:** recover yield");
        assert_eq!(block.sections[2].lines, vec![ReportLine::new("已更換治具`", 1)]);
        assert_eq!(block.sections[3].heading, "result: 良率回升");
        assert!(block.sections[3].lines.is_empty());
    }

    #[test]
    fn test_crlf_input() {
        let parser = ReportParser::new(ParseStrategy::IndentWhitespace);
        let blocks = parser.parse("--- 報告 1：A ---\r\nHead\r\n  - item\r\n");
        assert_eq!(
            blocks[0].lines(),
            vec![ReportLine::new("Head", 0), ReportLine::new("item", 1)]
        );
    }

    #[test]
    fn test_clean_bullet_line() {
        assert_eq!(clean_bullet_line("  - * • `text`"), "text`");
        assert_eq!(clean_bullet_line("**Bold**"), "Bold");
        assert_eq!(clean_bullet_line("- "), "");
        assert_eq!(clean_bullet_line("plain"), "plain");
    }

    #[test]
    fn test_is_star_heading() {
        assert!(is_star_heading("情境 (Situation)"));
        assert!(is_star_heading("SITUATION"));
        assert!(is_star_heading("action taken"));
        assert!(!is_star_heading("The task was"));
    }
}
