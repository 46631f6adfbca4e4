//! Word documents: one text unit for the whole body plus every embedded media file.

use super::{archive, blocking};
use crate::error::ExtractionError;
use quick_xml::Reader;
use quick_xml::events::Event;
use std::path::{Path, PathBuf};

const BODY_ENTRY: &str = "word/document.xml";
const MEDIA_PREFIX: &str = "word/media/";

pub async fn extract_text(input: &Path) -> Result<String, ExtractionError> {
    let input = input.to_path_buf();
    blocking(move || {
        let mut zip = archive::open(&input)?;
        let xml = archive::read_required(&mut zip, &input, BODY_ENTRY)?;
        body_text(&xml)
            .map_err(|e| ExtractionError::archive(input.display(), format!("{BODY_ENTRY}: {e}")))
    })
    .await
}

pub async fn extract_images(input: &Path, out_dir: &Path) -> Result<Vec<PathBuf>, ExtractionError> {
    let input = input.to_path_buf();
    let out_dir = out_dir.to_path_buf();
    blocking(move || archive::extract_media(&input, MEDIA_PREFIX, &out_dir, "doc-img")).await
}

/// Raw text of a `word/document.xml` body. Paragraphs end with a blank line;
/// tabs and breaks inside runs are kept; the result is trimmed.
pub fn body_text(xml: &[u8]) -> Result<String, quick_xml::Error> {
    let mut reader = Reader::from_reader(xml);
    let mut buf = Vec::new();
    let mut out = String::new();
    let mut run_depth = 0usize;
    let mut in_text = false;

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => match e.name().as_ref() {
                b"w:r" => run_depth += 1,
                b"w:t" if run_depth > 0 => in_text = true,
                other => push_run_control(&mut out, other, run_depth),
            },
            Event::Empty(e) => match e.name().as_ref() {
                b"w:p" => out.push_str("\n\n"),
                other => push_run_control(&mut out, other, run_depth),
            },
            Event::End(e) => match e.name().as_ref() {
                b"w:r" => run_depth = run_depth.saturating_sub(1),
                b"w:t" => in_text = false,
                b"w:p" => out.push_str("\n\n"),
                _ => {}
            },
            Event::Text(t) if in_text => out.push_str(&t.unescape()?),
            Event::CData(t) if in_text => out.push_str(&String::from_utf8_lossy(&t)),
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(out.trim().to_string())
}

// `w:tab` outside a run is a tab-stop definition, not a character.
fn push_run_control(out: &mut String, name: &[u8], run_depth: usize) {
    if run_depth == 0 {
        return;
    }
    match name {
        b"w:tab" => out.push('\t'),
        b"w:br" | b"w:cr" => out.push('\n'),
        _ => {}
    }
}
