//! PDFs: one text unit and one rendered page image per page, via the external
//! text-layout renderer and rasterizer.

use crate::{engine::PdfEngine, error::ExtractionError};
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use tracing::debug;

pub const RAW_TEXT_FILE: &str = "raw_text.txt";
pub const PAGE_PREFIX: &str = "page";

static PAGE_IMAGE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^page-(\d+)\.png$").expect("page image pattern is valid"));

pub async fn extract_text(
    engine: &dyn PdfEngine,
    input: &Path,
    out_dir: &Path,
) -> Result<Vec<String>, ExtractionError> {
    let dest = out_dir.join(RAW_TEXT_FILE);
    engine.render_text(input, &dest).await?;
    let raw = tokio::fs::read(&dest).await?;
    let pages = split_pages(&String::from_utf8_lossy(&raw));
    debug!("{} text pages from {}", pages.len(), input.display());
    Ok(pages)
}

pub async fn extract_images(
    engine: &dyn PdfEngine,
    input: &Path,
    out_dir: &Path,
) -> Result<Vec<PathBuf>, ExtractionError> {
    engine.rasterize(input, &out_dir.join(PAGE_PREFIX)).await?;
    let images = list_page_images(out_dir).await?;
    debug!("{} page images from {}", images.len(), input.display());
    Ok(images)
}

/// Splits a form-feed delimited text stream into trimmed pages. The renderer
/// terminates every page, including the last, so a trailing empty segment
/// is not a page.
pub fn split_pages(raw: &str) -> Vec<String> {
    let mut pages: Vec<String> = raw.split('\u{c}').map(|p| p.trim().to_string()).collect();
    if pages.len() > 1 && pages.last().is_some_and(|p| p.is_empty()) {
        pages.pop();
    }
    pages
}

/// Rasterized pages in page-number order. The rasterizer zero-pads the
/// index to the width of the page count, so string order is not reliable.
pub async fn list_page_images(dir: &Path) -> Result<Vec<PathBuf>, ExtractionError> {
    let mut pages: Vec<(u64, PathBuf)> = Vec::new();
    let mut entries = tokio::fs::read_dir(dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        let name = entry.file_name();
        let Some(name) = name.to_str() else { continue };
        let Some(caps) = PAGE_IMAGE.captures(name) else { continue };
        if let Ok(n) = caps[1].parse::<u64>() {
            pages.push((n, entry.path()));
        }
    }
    pages.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(pages.into_iter().map(|(_, p)| p).collect())
}
