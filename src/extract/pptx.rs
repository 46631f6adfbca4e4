//! PowerPoint decks: one text unit per slide plus every embedded media file.

use super::{archive, blocking};
use crate::{error::ExtractionError, util::natural_cmp};
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

const MEDIA_PREFIX: &str = "ppt/media/";

static SLIDE_ENTRY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^ppt/slides/slide(\d+)\.xml$").expect("slide entry pattern is valid")
});

const SHAPE_PATH: &[&[u8]] = &[b"p:sld", b"p:cSld", b"p:spTree", b"p:sp"];
const PARAGRAPH_PATH: &[&[u8]] = &[
    b"p:sld", b"p:cSld", b"p:spTree", b"p:sp", b"p:txBody", b"a:p",
];
const RUN_TEXT_PATH: &[&[u8]] = &[
    b"p:sld", b"p:cSld", b"p:spTree", b"p:sp", b"p:txBody", b"a:p", b"a:r", b"a:t",
];

pub async fn extract_text(input: &Path) -> Result<Vec<String>, ExtractionError> {
    let input = input.to_path_buf();
    blocking(move || {
        let mut zip = archive::open(&input)?;
        let entries = slide_entries(zip.file_names());
        let mut texts = Vec::with_capacity(entries.len());
        for entry in entries {
            let xml = archive::read_required(&mut zip, &input, &entry)?;
            let text = slide_text(&xml)
                .map_err(|e| ExtractionError::archive(input.display(), format!("{entry}: {e}")))?;
            texts.push(text);
        }
        Ok(texts)
    })
    .await
}

pub async fn extract_images(input: &Path, out_dir: &Path) -> Result<Vec<PathBuf>, ExtractionError> {
    let input = input.to_path_buf();
    let out_dir = out_dir.to_path_buf();
    blocking(move || {
        let mut images = archive::extract_media(&input, MEDIA_PREFIX, &out_dir, "slide")?;
        images.sort_by(|a, b| natural_cmp(&a.to_string_lossy(), &b.to_string_lossy()));
        Ok(images)
    })
    .await
}

/// Slide XML entry names in slide-number order (`slide2` before `slide10`).
pub fn slide_entries<'a>(names: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut slides: Vec<(u64, String)> = names
        .filter_map(|name| {
            let caps = SLIDE_ENTRY.captures(name)?;
            let n = caps[1].parse::<u64>().ok()?;
            Some((n, name.to_string()))
        })
        .collect();
    slides.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.cmp(&b.1)));
    slides.into_iter().map(|(_, name)| name).collect()
}

/// Text of one slide: runs concatenated per paragraph, paragraphs joined by
/// newline per shape, shapes joined by newline, trimmed.
pub fn slide_text(xml: &[u8]) -> Result<String, quick_xml::Error> {
    let mut reader = Reader::from_reader(xml);
    let mut buf = Vec::new();
    let mut stack: Vec<Vec<u8>> = Vec::new();
    let mut shapes: Vec<Vec<String>> = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => open_element(&mut stack, &mut shapes, &e),
            Event::Empty(e) => {
                open_element(&mut stack, &mut shapes, &e);
                stack.pop();
            }
            Event::End(_) => {
                stack.pop();
            }
            Event::Text(t) if at(&stack, RUN_TEXT_PATH) => {
                let text = t.unescape()?;
                if let Some(para) = shapes.last_mut().and_then(|s| s.last_mut()) {
                    para.push_str(&text);
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    let joined = shapes
        .iter()
        .map(|paras| paras.join("\n"))
        .collect::<Vec<_>>()
        .join("\n");
    Ok(joined.trim().to_string())
}

fn open_element(stack: &mut Vec<Vec<u8>>, shapes: &mut Vec<Vec<String>>, e: &BytesStart<'_>) {
    stack.push(e.name().as_ref().to_vec());
    if at(stack, SHAPE_PATH) {
        shapes.push(Vec::new());
    } else if at(stack, PARAGRAPH_PATH) {
        if let Some(shape) = shapes.last_mut() {
            shape.push(String::new());
        }
    }
}

fn at(stack: &[Vec<u8>], path: &[&[u8]]) -> bool {
    stack.len() == path.len() && stack.iter().zip(path).all(|(a, b)| a.as_slice() == *b)
}
