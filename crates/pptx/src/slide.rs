//! Slide part XML: rendering a [`SlideSpec`] and reading titles back.

use crate::package::local_name;
use crate::template::{NS_A, NS_P, NS_R};
use quick_xml::escape::escape;
use quick_xml::events::Event;
use quick_xml::Reader;
use star_core::{Error, Result, SlideParagraph, SlideSpec};

/// Language tag written on every run.
const RUN_LANG: &str = "zh-TW";

/// Render a slide with a title placeholder and a body placeholder.
pub fn render_slide(spec: &SlideSpec) -> String {
    let mut body = String::new();
    if spec.paragraphs.is_empty() {
        body.push_str(&format!("<a:p><a:endParaRPr lang=\"{}\"/></a:p>", RUN_LANG));
    }
    for paragraph in &spec.paragraphs {
        body.push_str(&render_paragraph(paragraph));
    }

    format!(
        concat!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
            "\n",
            r#"<p:sld xmlns:a="{a}" xmlns:r="{r}" xmlns:p="{p}">"#,
            r#"<p:cSld><p:spTree>"#,
            r#"<p:nvGrpSpPr><p:cNvPr id="1" name=""/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr>"#,
            r#"<p:grpSpPr><a:xfrm><a:off x="0" y="0"/><a:ext cx="0" cy="0"/><a:chOff x="0" y="0"/><a:chExt cx="0" cy="0"/></a:xfrm></p:grpSpPr>"#,
            r#"<p:sp><p:nvSpPr><p:cNvPr id="2" name="Title 1"/><p:cNvSpPr><a:spLocks noGrp="1"/></p:cNvSpPr><p:nvPr><p:ph type="title"/></p:nvPr></p:nvSpPr>"#,
            r#"<p:spPr/><p:txBody><a:bodyPr/><a:lstStyle/><a:p><a:r><a:rPr lang="{lang}" dirty="0"/><a:t>{title}</a:t></a:r></a:p></p:txBody></p:sp>"#,
            r#"<p:sp><p:nvSpPr><p:cNvPr id="3" name="Content Placeholder 2"/><p:cNvSpPr><a:spLocks noGrp="1"/></p:cNvSpPr><p:nvPr><p:ph idx="1"/></p:nvPr></p:nvSpPr>"#,
            r#"<p:spPr/><p:txBody><a:bodyPr><a:normAutofit/></a:bodyPr><a:lstStyle/>{body}</p:txBody></p:sp>"#,
            r#"</p:spTree></p:cSld><p:clrMapOvr><a:masterClrMapping/></p:clrMapOvr></p:sld>"#
        ),
        a = NS_A,
        r = NS_R,
        p = NS_P,
        lang = RUN_LANG,
        title = escape(spec.title.as_str()),
        body = body,
    )
}

/// One body paragraph: outline level, bold flag and point size.
fn render_paragraph(paragraph: &SlideParagraph) -> String {
    let emphasis = paragraph.emphasis;
    format!(
        r#"<a:p><a:pPr lvl="{lvl}"/><a:r><a:rPr lang="{lang}" sz="{sz}" b="{b}" dirty="0"/><a:t>{text}</a:t></a:r></a:p>"#,
        lvl = paragraph.level,
        lang = RUN_LANG,
        sz = emphasis.font_size_pt() * 100,
        b = if emphasis.is_bold() { 1 } else { 0 },
        text = escape(paragraph.text.as_str()),
    )
}

/// Text of the title placeholder of a slide, if it has one.
pub fn read_title(xml: &str) -> Result<Option<String>> {
    let mut reader = Reader::from_str(xml);

    let mut shape_is_title = false;
    let mut in_text = false;
    let mut title: Option<String> = None;
    let mut current = String::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => match local_name(e.name().as_ref()) {
                b"sp" => {
                    shape_is_title = false;
                    current.clear();
                }
                b"t" => in_text = true,
                _ => {}
            },
            Ok(Event::Empty(ref e)) if local_name(e.name().as_ref()) == b"ph" => {
                shape_is_title = e.attributes().flatten().any(|attr| {
                    attr.key.as_ref() == b"type"
                        && matches!(attr.value.as_ref(), b"title" | b"ctrTitle")
                });
            }
            Ok(Event::Text(ref e)) if in_text => {
                current.push_str(&e.unescape().unwrap_or_default());
            }
            Ok(Event::End(ref e)) => match local_name(e.name().as_ref()) {
                b"t" => in_text = false,
                b"sp" if shape_is_title && title.is_none() => {
                    title = Some(current.clone());
                }
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(Error::XmlError(format!("Error parsing slide: {}", e)));
            }
            _ => {}
        }
    }

    Ok(title)
}

/// Paragraph texts and levels of the body placeholder. Used to inspect
/// written slides.
pub fn read_body(xml: &str) -> Result<Vec<(String, u8)>> {
    let mut reader = Reader::from_str(xml);

    let mut shape_is_body = false;
    let mut in_shape = false;
    let mut in_text = false;
    let mut paragraphs = Vec::new();
    let mut level = 0u8;
    let mut current = String::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => match local_name(e.name().as_ref()) {
                b"sp" => {
                    in_shape = true;
                    shape_is_body = false;
                }
                b"p" if in_shape => {
                    level = 0;
                    current.clear();
                }
                b"t" => in_text = true,
                _ => {}
            },
            Ok(Event::Empty(ref e)) => match local_name(e.name().as_ref()) {
                b"ph" => {
                    shape_is_body = e
                        .attributes()
                        .flatten()
                        .any(|attr| attr.key.as_ref() == b"idx" && attr.value.as_ref() == b"1");
                }
                b"pPr" => {
                    level = e
                        .attributes()
                        .flatten()
                        .find(|attr| attr.key.as_ref() == b"lvl")
                        .and_then(|attr| String::from_utf8_lossy(&attr.value).parse().ok())
                        .unwrap_or(0);
                }
                _ => {}
            },
            Ok(Event::Text(ref e)) if in_text => {
                current.push_str(&e.unescape().unwrap_or_default());
            }
            Ok(Event::End(ref e)) => match local_name(e.name().as_ref()) {
                b"t" => in_text = false,
                b"p" if in_shape && shape_is_body && !current.is_empty() => {
                    paragraphs.push((current.clone(), level));
                }
                b"sp" => in_shape = false,
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(Error::XmlError(format!("Error parsing slide: {}", e)));
            }
            _ => {}
        }
    }

    Ok(paragraphs)
}
