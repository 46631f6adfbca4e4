use crate::{
    extract::{Pairing, RawExtraction},
    report::ExtractionRecord,
};
use std::path::PathBuf;

pub fn normalize(raw: &RawExtraction) -> Vec<ExtractionRecord> {
    match raw.pairing {
        Pairing::Indexed => pair_indexed(&raw.text_units, &raw.images),
        Pairing::Replicated => {
            let text = raw.text_units.first().map(String::as_str).unwrap_or("");
            pair_replicated(text, &raw.images)
        }
    }
}

/// `max(N, M)` records; whichever list runs out first is padded with "".
pub fn pair_indexed(texts: &[String], images: &[PathBuf]) -> Vec<ExtractionRecord> {
    let len = texts.len().max(images.len());
    (0..len)
        .map(|i| ExtractionRecord {
            text: texts.get(i).cloned().unwrap_or_default(),
            image: images.get(i).map(|p| path_string(p)).unwrap_or_default(),
        })
        .collect()
}

/// One record per image, each with the full text; a lone text-only record
/// when there are no images.
pub fn pair_replicated(text: &str, images: &[PathBuf]) -> Vec<ExtractionRecord> {
    if images.is_empty() {
        return vec![ExtractionRecord {
            text: text.to_string(),
            image: String::new(),
        }];
    }
    images
        .iter()
        .map(|p| ExtractionRecord {
            text: text.to_string(),
            image: path_string(p),
        })
        .collect()
}

fn path_string(p: &std::path::Path) -> String {
    p.to_string_lossy().into_owned()
}
