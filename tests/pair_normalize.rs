use pagepair::{
    ExtractionRecord,
    extract::{Pairing, RawExtraction},
    normalize::{normalize, pair_indexed, pair_replicated},
};
use std::path::PathBuf;

fn texts(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn images(items: &[&str]) -> Vec<PathBuf> {
    items.iter().map(PathBuf::from).collect()
}

fn rec(text: &str, image: &str) -> ExtractionRecord {
    ExtractionRecord {
        text: text.into(),
        image: image.into(),
    }
}

#[test]
fn both_empty_yields_nothing() {
    assert!(pair_indexed(&[], &[]).is_empty());
}

#[test]
fn more_text_than_images() {
    let out = pair_indexed(&texts(&["a", "b", "c"]), &images(&["1.png"]));
    assert_eq!(out, vec![rec("a", "1.png"), rec("b", ""), rec("c", "")]);
}

#[test]
fn more_images_than_text() {
    let out = pair_indexed(&texts(&["a"]), &images(&["1.png", "2.png"]));
    assert_eq!(out, vec![rec("a", "1.png"), rec("", "2.png")]);
}

#[test]
fn length_is_max_of_inputs() {
    for (n, m) in [(0, 4), (4, 0), (3, 3), (2, 7), (7, 2)] {
        let t: Vec<String> = (0..n).map(|i| format!("t{i}")).collect();
        let i: Vec<PathBuf> = (0..m).map(|i| PathBuf::from(format!("{i}.png"))).collect();
        assert_eq!(pair_indexed(&t, &i).len(), n.max(m), "n={n} m={m}");
    }
}

#[test]
fn replicated_without_images_is_single_record() {
    assert_eq!(pair_replicated("whole doc", &[]), vec![rec("whole doc", "")]);
}

#[test]
fn replicated_repeats_full_text_per_image() {
    let out = pair_replicated("whole doc", &images(&["a.png", "b.jpeg", "c.gif"]));
    assert_eq!(out.len(), 3);
    assert!(out.iter().all(|r| r.text == "whole doc"));
    assert_eq!(out[1].image, "b.jpeg");
}

#[test]
fn normalize_follows_pairing() {
    let raw = RawExtraction {
        text_units: texts(&["body"]),
        images: images(&["x.png", "y.png"]),
        pairing: Pairing::Replicated,
    };
    assert_eq!(normalize(&raw), vec![rec("body", "x.png"), rec("body", "y.png")]);

    let raw = RawExtraction {
        pairing: Pairing::Indexed,
        ..raw
    };
    assert_eq!(normalize(&raw), vec![rec("body", "x.png"), rec("", "y.png")]);
}
