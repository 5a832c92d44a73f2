//! Presentation documents that report slides are appended to.

use crate::package::{
    extract_number, local_name, relative_target, rels_part_for, resolve_target, Package,
    CONTENT_TYPES_PART,
};
use crate::slide::{read_body, read_title, render_slide};
use crate::template::{blank_package, CT_SLIDE, NS_R, REL_SLIDE, REL_SLIDE_LAYOUT};
use quick_xml::events::{BytesStart, Event};
use quick_xml::{Reader, Writer};
use star_core::{
    Error, ParseStrategy, ReportBlock, ReportParser, Result, SlidePlanner, SlideSpec,
};
use std::io::{Cursor, ErrorKind};
use std::path::Path;

/// Relationship type of the package's main document.
const REL_OFFICE_DOCUMENT: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument";

/// Slide ids below this value are reserved.
const MIN_SLIDE_ID: u32 = 256;

/// `presentation.xml` children that must come before the slide id list.
const SLIDE_LIST_PREDECESSORS: &[&[u8]] = &[
    b"sldMasterIdLst",
    b"notesMasterIdLst",
    b"handoutMasterIdLst",
    b"sldIdLst",
];

/// An editable `.pptx` presentation.
#[derive(Debug, Clone)]
pub struct SlideDeck {
    package: Package,
}

impl Default for SlideDeck {
    fn default() -> Self {
        Self::new()
    }
}

impl SlideDeck {
    /// A new, empty presentation built from the built-in template.
    pub fn new() -> Self {
        Self {
            package: blank_package(),
        }
    }

    /// Load a presentation from `.pptx` bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let package = Package::from_reader(Cursor::new(bytes))?;
        let deck = Self { package };
        let main = deck.presentation_part()?;
        if !deck.package.contains(&main) {
            return Err(Error::PresentationError(format!(
                "Missing main presentation part '{}'",
                main
            )));
        }
        Ok(deck)
    }

    /// Load a presentation file.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let bytes = std::fs::read(path.as_ref())?;
        Self::from_bytes(&bytes)
    }

    /// Load a presentation file, or start a new one if it does not exist.
    pub fn open_or_create(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            log::debug!("Appending to existing presentation {}", path.display());
            Self::open(path)
        } else {
            log::debug!("Creating new presentation {}", path.display());
            Ok(Self::new())
        }
    }

    /// Number of slides.
    pub fn slide_count(&self) -> Result<usize> {
        Ok(self.slide_parts()?.len())
    }

    /// Slide titles in presentation order. Slides without a title
    /// placeholder yield an empty string.
    pub fn slide_titles(&self) -> Result<Vec<String>> {
        self.slide_parts()?
            .iter()
            .map(|part| -> Result<String> {
                Ok(read_title(&self.package.read_string(part)?)?.unwrap_or_default())
            })
            .collect()
    }

    /// Body paragraphs (text, level) of the slide at `index`.
    pub fn slide_body(&self, index: usize) -> Result<Vec<(String, u8)>> {
        let parts = self.slide_parts()?;
        let part = parts.get(index).ok_or_else(|| {
            Error::PresentationError(format!("No slide at index {}", index))
        })?;
        read_body(&self.package.read_string(part)?)
    }

    /// Plan and append one slide per block.
    ///
    /// Returns the number of slides added. No blocks is an error, since
    /// nothing in the report text was usable.
    pub fn append_blocks(
        &mut self,
        blocks: &[ReportBlock],
        project_name: Option<&str>,
    ) -> Result<usize> {
        if blocks.is_empty() {
            return Err(Error::NoValidReports);
        }
        let slides = SlidePlanner::new()
            .with_project_name(project_name)
            .plan(blocks);
        self.append(&slides)
    }

    /// Append slides after the existing ones, in order.
    pub fn append(&mut self, slides: &[SlideSpec]) -> Result<usize> {
        if slides.is_empty() {
            return Ok(0);
        }

        let main = self.presentation_part()?;
        let main_rels = rels_part_for(&main);
        let layout = self.find_layout()?;

        let mut next_rel = self
            .package
            .relationships(&main_rels)?
            .iter()
            .filter_map(|rel| extract_number(&rel.id))
            .max()
            .unwrap_or(0)
            + 1;
        let mut next_slide_id = slide_ids(&self.package.read_string(&main)?)?
            .into_iter()
            .max()
            .map(|id| id + 1)
            .unwrap_or(MIN_SLIDE_ID)
            .max(MIN_SLIDE_ID);
        let mut next_file = self
            .package
            .part_names()
            .filter(|name| is_slide_part(name))
            .filter_map(extract_number)
            .max()
            .unwrap_or(0)
            + 1;

        let slides_dir = match main.rsplit_once('/') {
            Some((dir, _)) => format!("{}/slides", dir),
            None => "slides".to_string(),
        };

        let mut relationships = Vec::new();
        let mut overrides = Vec::new();
        let mut ids = Vec::new();

        for spec in slides {
            let part = format!("{}/slide{}.xml", slides_dir, next_file);
            let rel_id = format!("rId{}", next_rel);

            self.package.put(part.clone(), render_slide(spec));
            self.package.put(
                rels_part_for(&part),
                single_relationship(REL_SLIDE_LAYOUT, &relative_target(&part, &layout)),
            );

            let mut rel = BytesStart::new("Relationship");
            rel.push_attribute(("Id", rel_id.as_str()));
            rel.push_attribute(("Type", REL_SLIDE));
            rel.push_attribute(("Target", relative_target(&main, &part).as_str()));
            relationships.push(rel);

            let mut over = BytesStart::new("Override");
            over.push_attribute(("PartName", format!("/{}", part).as_str()));
            over.push_attribute(("ContentType", CT_SLIDE));
            overrides.push(over);

            ids.push((next_slide_id, rel_id));
            log::debug!("Added {} '{}'", part, spec.title);

            next_rel += 1;
            next_slide_id += 1;
            next_file += 1;
        }

        let rels_xml = self.package.read_string(&main_rels)?;
        self.package
            .put(main_rels, append_children(&rels_xml, b"Relationships", &relationships)?);

        let types_xml = self.package.read_string(CONTENT_TYPES_PART)?;
        self.package
            .put(CONTENT_TYPES_PART, append_children(&types_xml, b"Types", &overrides)?);

        let main_xml = self.package.read_string(&main)?;
        self.package.put(main.clone(), add_slide_ids(&main_xml, &ids)?);

        Ok(slides.len())
    }

    /// Serialize as `.pptx` bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        self.package.to_bytes()
    }

    /// Write the presentation to `path`.
    ///
    /// A permission failure is reported as [`Error::OutputLocked`], which
    /// usually means the file is open in another program.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let bytes = self.to_bytes()?;
        std::fs::write(path, bytes).map_err(|e| write_error(e, path))?;
        log::debug!("Saved presentation {}", path.display());
        Ok(())
    }

    /// Main presentation part, found through the package relationships.
    fn presentation_part(&self) -> Result<String> {
        let main = self
            .package
            .relationships("_rels/.rels")?
            .into_iter()
            .find(|rel| rel.rel_type == REL_OFFICE_DOCUMENT)
            .map(|rel| rel.target.trim_start_matches('/').to_string())
            .unwrap_or_else(|| "ppt/presentation.xml".to_string());
        Ok(main)
    }

    /// Slide parts in presentation order.
    fn slide_parts(&self) -> Result<Vec<String>> {
        let main = self.presentation_part()?;
        let rels = self.package.relationships(&rels_part_for(&main))?;
        let order = slide_rel_ids(&self.package.read_string(&main)?)?;

        let mut parts = Vec::with_capacity(order.len());
        for rel_id in order {
            match rels.iter().find(|rel| rel.id == rel_id) {
                Some(rel) => parts.push(resolve_target(&main, &rel.target)),
                None => log::warn!("Slide relationship {} not found", rel_id),
            }
        }
        Ok(parts)
    }

    /// The layout new slides use: the first "Title and Content" (`obj`)
    /// layout, else the first layout.
    fn find_layout(&self) -> Result<String> {
        let mut layouts: Vec<&str> = self
            .package
            .part_names()
            .filter(|name| {
                name.contains("/slideLayouts/") && !name.contains("/_rels/") && name.ends_with(".xml")
            })
            .collect();
        layouts.sort_by_key(|name| extract_number(name).unwrap_or(usize::MAX));

        for layout in &layouts {
            if root_attribute(&self.package.read_string(layout)?, b"type")?.as_deref()
                == Some("obj")
            {
                return Ok(layout.to_string());
            }
        }

        match layouts.first() {
            Some(layout) => {
                log::warn!("No title-and-content layout; using {}", layout);
                Ok(layout.to_string())
            }
            None => Err(Error::PresentationError(
                "Presentation has no slide layouts".to_string(),
            )),
        }
    }
}

/// Parse report text and append its blocks to the deck at `path`, creating
/// the file if needed. Returns the number of slides added.
pub fn append_report_text(
    path: impl AsRef<Path>,
    text: &str,
    project_name: Option<&str>,
    strategy: ParseStrategy,
) -> Result<usize> {
    let path = path.as_ref();
    let outcome = ReportParser::new(strategy).parse_with_stats(text);
    if outcome.dropped > 0 {
        log::warn!("Skipped {} report blocks with no title or content", outcome.dropped);
    }
    if outcome.blocks.is_empty() {
        return Err(Error::NoValidReports);
    }

    let mut deck = SlideDeck::open_or_create(path)?;
    let added = deck.append_blocks(&outcome.blocks, project_name)?;
    deck.save(path)?;
    Ok(added)
}

fn write_error(err: std::io::Error, path: &Path) -> Error {
    if is_lock_error(&err) {
        Error::OutputLocked(path.to_path_buf())
    } else {
        Error::IoError(err)
    }
}

#[cfg(windows)]
fn is_lock_error(err: &std::io::Error) -> bool {
    // ERROR_SHARING_VIOLATION, ERROR_LOCK_VIOLATION
    err.kind() == ErrorKind::PermissionDenied || matches!(err.raw_os_error(), Some(32) | Some(33))
}

#[cfg(not(windows))]
fn is_lock_error(err: &std::io::Error) -> bool {
    err.kind() == ErrorKind::PermissionDenied
}

fn is_slide_part(name: &str) -> bool {
    name.rsplit_once('/').is_some_and(|(dir, file)| {
        dir.ends_with("/slides") && file.starts_with("slide") && file.ends_with(".xml")
    })
}

fn single_relationship(rel_type: &str, target: &str) -> String {
    format!(
        concat!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
            "\n",
            r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
            r#"<Relationship Id="rId1" Type="{}" Target="{}"/></Relationships>"#
        ),
        rel_type, target
    )
}

fn xml_error(context: &str, err: impl std::fmt::Display) -> Error {
    Error::XmlError(format!("{}: {}", context, err))
}

/// Value of an attribute on the root element.
fn root_attribute(xml: &str, key: &[u8]) -> Result<Option<String>> {
    let mut reader = Reader::from_str(xml);
    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) | Ok(Event::Empty(ref e)) => {
                return Ok(e
                    .attributes()
                    .flatten()
                    .find(|attr| attr.key.as_ref() == key)
                    .map(|attr| String::from_utf8_lossy(&attr.value).to_string()));
            }
            Ok(Event::Eof) => return Ok(None),
            Err(e) => return Err(xml_error("Error parsing part", e)),
            _ => {}
        }
    }
}

/// Numeric `id` and relationship id of every `sldId`, in document order.
fn slide_id_entries(xml: &str) -> Result<Vec<(Option<u32>, Option<String>)>> {
    let mut reader = Reader::from_str(xml);
    let mut entries = Vec::new();
    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) | Ok(Event::Empty(ref e))
                if local_name(e.name().as_ref()) == b"sldId" =>
            {
                let mut id = None;
                let mut rel = None;
                for attr in e.attributes().flatten() {
                    let value = String::from_utf8_lossy(&attr.value).to_string();
                    let key = attr.key.as_ref();
                    if key == b"id" {
                        id = value.parse().ok();
                    } else if local_name(key) == b"id" {
                        rel = Some(value);
                    }
                }
                entries.push((id, rel));
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(xml_error("Error parsing presentation", e)),
            _ => {}
        }
    }
    Ok(entries)
}

fn slide_ids(xml: &str) -> Result<Vec<u32>> {
    Ok(slide_id_entries(xml)?.into_iter().filter_map(|(id, _)| id).collect())
}

fn slide_rel_ids(xml: &str) -> Result<Vec<String>> {
    Ok(slide_id_entries(xml)?.into_iter().filter_map(|(_, rel)| rel).collect())
}

/// Namespace prefixes (with trailing colon, or empty) of the root element
/// and of the relationships namespace.
fn prefixes(xml: &str) -> Result<(String, String)> {
    let mut reader = Reader::from_str(xml);
    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) | Ok(Event::Empty(ref e)) => {
                let name = e.name();
                let root = match name.as_ref().iter().position(|&b| b == b':') {
                    Some(pos) => format!("{}:", String::from_utf8_lossy(&name.as_ref()[..pos])),
                    None => String::new(),
                };
                let rel = e
                    .attributes()
                    .flatten()
                    .find(|attr| attr.value.as_ref() == NS_R.as_bytes())
                    .and_then(|attr| {
                        attr.key
                            .as_ref()
                            .strip_prefix(b"xmlns:")
                            .map(|p| format!("{}:", String::from_utf8_lossy(p)))
                    })
                    .unwrap_or_else(|| "r:".to_string());
                return Ok((root, rel));
            }
            Ok(Event::Eof) => {
                return Err(Error::PresentationError("Empty presentation part".to_string()))
            }
            Err(e) => return Err(xml_error("Error parsing presentation", e)),
            _ => {}
        }
    }
}

/// Add `sldId` entries to the slide id list, creating the list in its
/// schema position when the presentation has no slides yet.
fn add_slide_ids(xml: &str, ids: &[(u32, String)]) -> Result<String> {
    let (p, r) = prefixes(xml)?;
    let children: Vec<BytesStart> = ids
        .iter()
        .map(|(id, rel_id)| {
            let mut entry = BytesStart::new(format!("{}sldId", p));
            entry.push_attribute(("id", id.to_string().as_str()));
            entry.push_attribute((format!("{}id", r).as_str(), rel_id.as_str()));
            entry
        })
        .collect();

    if has_element(xml, b"sldIdLst")? {
        return append_children(xml, b"sldIdLst", &children);
    }

    let list = BytesStart::new(format!("{}sldIdLst", p));
    let mut reader = Reader::from_str(xml);
    let mut writer = Writer::new(Vec::new());
    let mut depth = 0usize;
    let mut inserted = false;

    loop {
        let event = reader
            .read_event()
            .map_err(|e| xml_error("Error parsing presentation", e))?;

        let before_sibling = match &event {
            Event::Start(e) | Event::Empty(e) => {
                depth == 1 && !SLIDE_LIST_PREDECESSORS.contains(&local_name(e.name().as_ref()))
            }
            Event::End(_) => depth == 1,
            _ => false,
        };
        if before_sibling && !inserted {
            write_list(&mut writer, &list, &children)?;
            inserted = true;
        }

        match event {
            Event::Eof => break,
            Event::Start(_) => depth += 1,
            Event::End(_) => depth = depth.saturating_sub(1),
            _ => {}
        }
        writer
            .write_event(event)
            .map_err(|e| xml_error("Error writing presentation", e))?;
    }

    into_string(writer)
}

fn write_list(
    writer: &mut Writer<Vec<u8>>,
    list: &BytesStart,
    children: &[BytesStart],
) -> Result<()> {
    let write_err = |e| xml_error("Error writing presentation", e);
    writer.write_event(Event::Start(list.borrow())).map_err(write_err)?;
    for child in children {
        writer.write_event(Event::Empty(child.borrow())).map_err(write_err)?;
    }
    writer.write_event(Event::End(list.to_end())).map_err(write_err)?;
    Ok(())
}

fn has_element(xml: &str, local: &[u8]) -> Result<bool> {
    let mut reader = Reader::from_str(xml);
    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) | Ok(Event::Empty(ref e))
                if local_name(e.name().as_ref()) == local =>
            {
                return Ok(true)
            }
            Ok(Event::Eof) => return Ok(false),
            Err(e) => return Err(xml_error("Error parsing part", e)),
            _ => {}
        }
    }
}

/// Append empty child elements at the end of the first element named
/// `parent`, expanding it if it is self-closing.
fn append_children(xml: &str, parent: &[u8], children: &[BytesStart]) -> Result<String> {
    let mut reader = Reader::from_str(xml);
    let mut writer = Writer::new(Vec::new());
    let write_err = |e| xml_error("Error writing part", e);
    let mut done = false;

    loop {
        let event = reader
            .read_event()
            .map_err(|e| xml_error("Error parsing part", e))?;
        match event {
            Event::Eof => break,
            Event::End(e) if !done && local_name(e.name().as_ref()) == parent => {
                for child in children {
                    writer.write_event(Event::Empty(child.borrow())).map_err(write_err)?;
                }
                writer.write_event(Event::End(e)).map_err(write_err)?;
                done = true;
            }
            Event::Empty(e) if !done && local_name(e.name().as_ref()) == parent => {
                write_list(&mut writer, &e, children)?;
                done = true;
            }
            other => writer.write_event(other).map_err(write_err)?,
        }
    }

    if !done {
        return Err(Error::PresentationError(format!(
            "Element '{}' not found",
            String::from_utf8_lossy(parent)
        )));
    }
    into_string(writer)
}

fn into_string(writer: Writer<Vec<u8>>) -> Result<String> {
    String::from_utf8(writer.into_inner())
        .map_err(|e| Error::XmlError(format!("Invalid UTF-8 in written XML: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use star_core::{Emphasis, ReportLine, SlideParagraph};
    use std::collections::HashSet;

    fn spec(title: &str) -> SlideSpec {
        SlideSpec {
            title: title.to_string(),
            paragraphs: vec![SlideParagraph {
                text: format!("{} body", title),
                level: 1,
                emphasis: Emphasis::Body,
            }],
        }
    }

    fn block(title: &str) -> ReportBlock {
        let mut block = ReportBlock::new(title);
        block.push_heading("情境 (Situation)");
        block.push_line(ReportLine::new("良率 82%", 1));
        block
    }

    fn deck_with(titles: &[&str]) -> SlideDeck {
        let mut deck = SlideDeck::new();
        let specs: Vec<_> = titles.iter().map(|t| spec(t)).collect();
        deck.append(&specs).unwrap();
        SlideDeck::from_bytes(&deck.to_bytes().unwrap()).unwrap()
    }

    #[test]
    fn test_new_deck_is_empty() {
        let deck = SlideDeck::new();
        assert_eq!(deck.slide_count().unwrap(), 0);
        let reloaded = SlideDeck::from_bytes(&deck.to_bytes().unwrap()).unwrap();
        assert!(reloaded.slide_titles().unwrap().is_empty());
    }

    #[test]
    fn test_append_to_new_deck_round_trips() {
        let deck = deck_with(&["First", "第二"]);
        assert_eq!(deck.slide_titles().unwrap(), vec!["First", "第二"]);
        assert_eq!(deck.slide_body(1).unwrap(), vec![("第二 body".to_string(), 1)]);
        assert!(deck.slide_body(2).is_err());
    }

    #[test]
    fn test_append_blocks_after_existing_slides() {
        let mut deck = deck_with(&["Old 1", "Old 2"]);
        let added = deck
            .append_blocks(&[block("A"), block("B"), block("C")], Some("Apollo"))
            .unwrap();
        assert_eq!(added, 3);

        let deck = SlideDeck::from_bytes(&deck.to_bytes().unwrap()).unwrap();
        let titles = deck.slide_titles().unwrap();
        assert_eq!(titles.len(), 5);
        assert_eq!(&titles[..2], &["Old 1", "Old 2"]);
        assert_eq!(titles[2], "Apollo - A");
        assert_eq!(titles[4], "Apollo - C");
        assert_eq!(
            deck.slide_body(2).unwrap(),
            vec![
                ("情境 (Situation)".to_string(), 0),
                ("良率 82%".to_string(), 1)
            ]
        );
    }

    #[test]
    fn test_ids_and_parts_are_unique() {
        let mut deck = deck_with(&["One"]);
        deck.append(&[spec("Two"), spec("Three")]).unwrap();

        let main = deck.package.read_string("ppt/presentation.xml").unwrap();
        let ids = slide_ids(&main).unwrap();
        assert_eq!(ids, vec![256, 257, 258]);

        let rels = deck
            .package
            .relationships("ppt/_rels/presentation.xml.rels")
            .unwrap();
        let rel_ids: HashSet<_> = rels.iter().map(|r| r.id.clone()).collect();
        assert_eq!(rel_ids.len(), rels.len());

        let types = deck.package.read_string(CONTENT_TYPES_PART).unwrap();
        for n in 1..=3 {
            assert!(deck.package.contains(&format!("ppt/slides/slide{}.xml", n)));
            assert!(types.contains(&format!("/ppt/slides/slide{}.xml", n)));
        }
    }

    #[test]
    fn test_existing_slides_untouched() {
        let deck = deck_with(&["Keep"]);
        let before = deck.package.read_string("ppt/slides/slide1.xml").unwrap();

        let mut deck = deck;
        deck.append(&[spec("New")]).unwrap();
        assert_eq!(deck.package.read_string("ppt/slides/slide1.xml").unwrap(), before);
    }

    #[test]
    fn test_empty_blocks_is_no_valid_reports() {
        let mut deck = SlideDeck::new();
        assert!(matches!(
            deck.append_blocks(&[], None),
            Err(Error::NoValidReports)
        ));
        assert_eq!(deck.append(&[]).unwrap(), 0);
    }

    #[test]
    fn test_prefers_title_and_content_layout() {
        let mut deck = SlideDeck::new();
        let layout = deck
            .package
            .read_string("ppt/slideLayouts/slideLayout1.xml")
            .unwrap();
        deck.package.put(
            "ppt/slideLayouts/slideLayout1.xml",
            layout.replace(r#"type="obj""#, r#"type="title""#),
        );
        deck.package.put("ppt/slideLayouts/slideLayout2.xml", layout);

        deck.append(&[spec("X")]).unwrap();
        let rels = deck
            .package
            .relationships("ppt/slides/_rels/slide1.xml.rels")
            .unwrap();
        assert_eq!(rels[0].target, "../slideLayouts/slideLayout2.xml");
        assert_eq!(rels[0].rel_type, REL_SLIDE_LAYOUT);
    }

    #[test]
    fn test_add_slide_ids_into_self_closing_list() {
        let xml = r#"<p:presentation xmlns:p="P" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><p:sldMasterIdLst/><p:sldIdLst/><p:sldSz cx="1" cy="1"/></p:presentation>"#;
        let out = add_slide_ids(xml, &[(256, "rId5".to_string())]).unwrap();
        assert!(out.contains(r#"<p:sldIdLst><p:sldId id="256" r:id="rId5"/></p:sldIdLst>"#));
    }

    #[test]
    fn test_add_slide_ids_creates_list_before_size() {
        let xml = r#"<p:presentation xmlns:p="P" xmlns:rel="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><p:sldMasterIdLst><p:sldMasterId id="1"/></p:sldMasterIdLst><p:sldSz cx="1" cy="1"/></p:presentation>"#;
        let out = add_slide_ids(xml, &[(300, "rId2".to_string())]).unwrap();
        assert!(out.contains(
            r#"</p:sldMasterIdLst><p:sldIdLst><p:sldId id="300" rel:id="rId2"/></p:sldIdLst><p:sldSz"#
        ));
        assert_eq!(slide_rel_ids(&out).unwrap(), vec!["rId2"]);
    }

    #[test]
    fn test_append_report_text_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("master.pptx");
        let text = "--- 報告 1：A ---\n- 行動\n  - 已更換\n--- 報告 2：B ---\n內容";

        assert_eq!(
            append_report_text(&path, text, None, ParseStrategy::HeadingKeyword).unwrap(),
            2
        );
        assert_eq!(
            append_report_text(&path, text, Some("P"), ParseStrategy::HeadingKeyword).unwrap(),
            2
        );

        let titles = SlideDeck::open(&path).unwrap().slide_titles().unwrap();
        assert_eq!(titles, vec!["A", "B", "P - A", "P - B"]);
    }

    #[test]
    fn test_append_report_text_without_blocks() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("none.pptx");
        let err = append_report_text(&path, "no markers here", None, ParseStrategy::default())
            .unwrap_err();
        assert!(matches!(err, Error::NoValidReports));
        assert!(!path.exists());
    }

    #[test]
    fn test_permission_denied_is_output_locked() {
        let err = write_error(
            std::io::Error::from(ErrorKind::PermissionDenied),
            Path::new("deck.pptx"),
        );
        assert!(err.is_output_locked());

        let err = write_error(std::io::Error::from(ErrorKind::NotFound), Path::new("deck.pptx"));
        assert!(matches!(err, Error::IoError(_)));
    }

    #[test]
    fn test_not_a_presentation() {
        assert!(matches!(
            SlideDeck::from_bytes(b"not a zip"),
            Err(Error::ZipError(_))
        ));
    }
}
