//! Mapping of parsed report blocks onto slide specifications.

use crate::types::{Emphasis, ReportBlock, SlideParagraph, SlideSpec};

/// Compose a slide title from an optional project name and a block title.
pub fn compose_title(project_name: Option<&str>, block_title: &str) -> String {
    match project_name.map(str::trim).filter(|p| !p.is_empty()) {
        Some(project) => format!("{} - {}", project, block_title),
        None => block_title.to_string(),
    }
}

/// Turns report blocks into slide specs, one per block.
#[derive(Debug, Clone, Default)]
pub struct SlidePlanner {
    project_name: Option<String>,
}

impl SlidePlanner {
    /// Create a planner without a project name.
    pub fn new() -> Self {
        Self::default()
    }

    /// Prefix every slide title with a project name.
    pub fn with_project_name(mut self, project_name: Option<impl Into<String>>) -> Self {
        self.project_name = project_name.map(Into::into);
        self
    }

    /// Build the slide for one block. Level-0 lines become headings,
    /// level-1 lines body bullets.
    pub fn plan_block(&self, block: &ReportBlock) -> SlideSpec {
        let paragraphs = block
            .lines()
            .into_iter()
            .map(|line| SlideParagraph {
                emphasis: if line.level == 0 {
                    Emphasis::Heading
                } else {
                    Emphasis::Body
                },
                level: line.level,
                text: line.text,
            })
            .collect();

        SlideSpec {
            title: compose_title(self.project_name.as_deref(), &block.title),
            paragraphs,
        }
    }

    /// Build slides for all blocks, in order.
    pub fn plan(&self, blocks: &[ReportBlock]) -> Vec<SlideSpec> {
        blocks.iter().map(|b| self.plan_block(b)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ReportLine;

    fn sample_block() -> ReportBlock {
        let mut block = ReportBlock::new("良率下降");
        block.push_heading("情境 (Situation)");
        block.push_line(ReportLine::new("PN-100 良率 82%", 1));
        block
    }

    #[test]
    fn test_compose_title() {
        assert_eq!(compose_title(Some("Apollo"), "良率下降"), "Apollo - 良率下降");
        assert_eq!(compose_title(None, "良率下降"), "良率下降");
        assert_eq!(compose_title(Some("   "), "良率下降"), "良率下降");
    }

    #[test]
    fn test_plan_block_paragraphs() {
        let planner = SlidePlanner::new().with_project_name(Some("Apollo"));
        let slide = planner.plan_block(&sample_block());

        assert_eq!(slide.title, "Apollo - 良率下降");
        assert_eq!(slide.paragraphs.len(), 2);
        assert_eq!(slide.paragraphs[0].level, 0);
        assert_eq!(slide.paragraphs[0].emphasis, Emphasis::Heading);
        assert_eq!(slide.paragraphs[1].text, "PN-100 良率 82%");
        assert_eq!(slide.paragraphs[1].level, 1);
        assert_eq!(slide.paragraphs[1].emphasis, Emphasis::Body);
    }

    #[test]
    fn test_plan_keeps_order() {
        let mut second = sample_block();
        second.title = "第二份".to_string();
        let slides = SlidePlanner::new().plan(&[sample_block(), second]);
        let titles: Vec<_> = slides.iter().map(|s| s.title.as_str()).collect();
        assert_eq!(titles, vec!["良率下降", "第二份"]);
    }
}
