#![allow(dead_code)]

use async_trait::async_trait;
use pagepair::{ExtractionError, engine::PdfEngine, engine::ToolDiag};
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use zip::write::SimpleFileOptions;

pub fn write_zip(path: &Path, entries: &[(&str, &[u8])]) {
    let file = std::fs::File::create(path).unwrap();
    let mut zip = zip::ZipWriter::new(file);
    for (name, bytes) in entries {
        zip.start_file(*name, SimpleFileOptions::default()).unwrap();
        zip.write_all(bytes).unwrap();
    }
    zip.finish().unwrap();
}

pub fn docx_body(paragraphs: &[&str]) -> Vec<u8> {
    let mut xml = String::from(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>"#,
    );
    for p in paragraphs {
        xml.push_str(&format!("<w:p><w:r><w:t>{p}</w:t></w:r></w:p>"));
    }
    xml.push_str("</w:body></w:document>");
    xml.into_bytes()
}

pub fn slide_xml(shapes: &[&[&str]]) -> Vec<u8> {
    let mut xml = String::from(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><p:sld xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main"><p:cSld><p:spTree>"#,
    );
    for paragraphs in shapes {
        xml.push_str("<p:sp><p:txBody><a:bodyPr/>");
        for p in paragraphs.iter() {
            xml.push_str(&format!("<a:p><a:r><a:t>{p}</a:t></a:r></a:p>"));
        }
        xml.push_str("</p:txBody></p:sp>");
    }
    xml.push_str("</p:spTree></p:cSld></p:sld>");
    xml.into_bytes()
}

/// Writes a deck with one single-line slide per entry of `slide_texts`,
/// named `slide1.xml`.., plus the given media entries.
pub fn write_pptx(path: &Path, slide_texts: &[&str], media: &[(&str, &[u8])]) {
    let slides: Vec<(String, Vec<u8>)> = slide_texts
        .iter()
        .enumerate()
        .map(|(i, t)| {
            let body = if t.is_empty() {
                slide_xml(&[])
            } else {
                let shape: &[&str] = &[*t];
                slide_xml(&[shape])
            };
            (format!("ppt/slides/slide{}.xml", i + 1), body)
        })
        .collect();
    let mut entries: Vec<(&str, &[u8])> = vec![("ppt/presentation.xml", &b"<p:presentation/>"[..])];
    // Deliberately out of numeric order in the archive.
    for (name, body) in slides.iter().rev() {
        entries.push((name.as_str(), body.as_slice()));
    }
    entries.extend_from_slice(media);
    write_zip(path, &entries);
}

/// Stands in for poppler: emits `pages` form-feed terminated pages and one
/// zero-padded PNG per page, the way pdftotext/pdftoppm name them.
pub struct FakePdfEngine {
    pub pages: usize,
    pub fail_raster: bool,
}

impl FakePdfEngine {
    pub fn with_pages(pages: usize) -> Arc<dyn PdfEngine> {
        Arc::new(Self {
            pages,
            fail_raster: false,
        })
    }

    pub fn failing() -> Arc<dyn PdfEngine> {
        Arc::new(Self {
            pages: 1,
            fail_raster: true,
        })
    }
}

#[async_trait]
impl PdfEngine for FakePdfEngine {
    async fn doctor(&self) -> Vec<ToolDiag> {
        Vec::new()
    }

    async fn render_text(&self, _input: &Path, dest: &Path) -> Result<(), ExtractionError> {
        let mut raw = String::new();
        for n in 1..=self.pages {
            raw.push_str(&format!("  Page {n} text\n\u{c}"));
        }
        tokio::fs::write(dest, raw).await?;
        Ok(())
    }

    async fn rasterize(&self, _input: &Path, prefix: &Path) -> Result<(), ExtractionError> {
        if self.fail_raster {
            return Err(ExtractionError::ExternalTool {
                tool: "pdftoppm".into(),
                reason: "exit status: 1: Syntax Error: Couldn't read xref table".into(),
            });
        }
        let width = self.pages.to_string().len();
        for n in 1..=self.pages {
            let name = format!("{}-{:0width$}.png", prefix.display(), n, width = width);
            tokio::fs::write(name, format!("png {n}")).await?;
        }
        Ok(())
    }
}

fn crc32(bytes: &[u8]) -> u32 {
    let mut crc = !0u32;
    for &b in bytes {
        crc ^= b as u32;
        for _ in 0..8 {
            crc = if crc & 1 == 1 { (crc >> 1) ^ 0xEDB8_8320 } else { crc >> 1 };
        }
    }
    !crc
}

/// Single stored entry whose central directory claims `declared` uncompressed
/// bytes through a zip64 extra field, whatever `data` really holds.
pub fn write_zip_with_declared_size(path: &Path, name: &str, data: &[u8], declared: u64) {
    let crc = crc32(data);
    let len = data.len() as u32;
    let mut out = Vec::new();

    out.extend_from_slice(&0x0403_4b50u32.to_le_bytes());
    out.extend_from_slice(&45u16.to_le_bytes());
    out.extend_from_slice(&0u16.to_le_bytes()); // flags
    out.extend_from_slice(&0u16.to_le_bytes()); // stored
    out.extend_from_slice(&0u16.to_le_bytes()); // time
    out.extend_from_slice(&0x21u16.to_le_bytes()); // 1980-01-01
    out.extend_from_slice(&crc.to_le_bytes());
    out.extend_from_slice(&len.to_le_bytes());
    out.extend_from_slice(&len.to_le_bytes());
    out.extend_from_slice(&(name.len() as u16).to_le_bytes());
    out.extend_from_slice(&0u16.to_le_bytes());
    out.extend_from_slice(name.as_bytes());
    out.extend_from_slice(data);

    let cd_offset = out.len() as u32;
    out.extend_from_slice(&0x0201_4b50u32.to_le_bytes());
    out.extend_from_slice(&45u16.to_le_bytes()); // made by
    out.extend_from_slice(&45u16.to_le_bytes()); // needed
    out.extend_from_slice(&0u16.to_le_bytes());
    out.extend_from_slice(&0u16.to_le_bytes());
    out.extend_from_slice(&0u16.to_le_bytes());
    out.extend_from_slice(&0x21u16.to_le_bytes());
    out.extend_from_slice(&crc.to_le_bytes());
    out.extend_from_slice(&len.to_le_bytes());
    out.extend_from_slice(&u32::MAX.to_le_bytes()); // size lives in zip64 extra
    out.extend_from_slice(&(name.len() as u16).to_le_bytes());
    out.extend_from_slice(&12u16.to_le_bytes()); // extra len
    out.extend_from_slice(&0u16.to_le_bytes()); // comment len
    out.extend_from_slice(&0u16.to_le_bytes()); // disk
    out.extend_from_slice(&0u16.to_le_bytes()); // internal attrs
    out.extend_from_slice(&0u32.to_le_bytes()); // external attrs
    out.extend_from_slice(&0u32.to_le_bytes()); // local header offset
    out.extend_from_slice(name.as_bytes());
    out.extend_from_slice(&0x0001u16.to_le_bytes());
    out.extend_from_slice(&8u16.to_le_bytes());
    out.extend_from_slice(&declared.to_le_bytes());
    let cd_size = out.len() as u32 - cd_offset;

    out.extend_from_slice(&0x0605_4b50u32.to_le_bytes());
    out.extend_from_slice(&0u16.to_le_bytes());
    out.extend_from_slice(&0u16.to_le_bytes());
    out.extend_from_slice(&1u16.to_le_bytes());
    out.extend_from_slice(&1u16.to_le_bytes());
    out.extend_from_slice(&cd_size.to_le_bytes());
    out.extend_from_slice(&cd_offset.to_le_bytes());
    out.extend_from_slice(&0u16.to_le_bytes());

    std::fs::write(path, out).unwrap();
}
