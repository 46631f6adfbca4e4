mod common;

use common::{slide_xml, write_pptx, write_zip};
use pagepair::{Format, normalize::normalize};

#[tokio::test]
async fn slides_past_nine_stay_in_slide_order() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("deck.pptx");
    let texts: Vec<String> = (1..=12).map(|n| format!("Slide {n}")).collect();
    let text_refs: Vec<&str> = texts.iter().map(String::as_str).collect();
    write_pptx(&input, &text_refs, &[]);

    let units = Format::Pptx
        .extract_text(&input, dir.path(), common::FakePdfEngine::with_pages(0).as_ref())
        .await
        .unwrap();
    assert_eq!(units, texts);
}

#[tokio::test]
async fn empty_slide_keeps_its_place() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("deck.pptx");
    write_pptx(&input, &["Intro", "", "Outro"], &[]);

    let units = Format::Pptx
        .extract_text(&input, dir.path(), common::FakePdfEngine::with_pages(0).as_ref())
        .await
        .unwrap();
    assert_eq!(units, vec!["Intro", "", "Outro"]);
}

#[tokio::test]
async fn shapes_and_paragraphs_join_with_newlines() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("deck.pptx");
    let title: &[&str] = &["Roadmap"];
    let bullets: &[&str] = &["Q1 ship", "Q2 scale"];
    let slide = slide_xml(&[title, bullets]);
    write_zip(&input, &[("ppt/slides/slide1.xml", slide.as_slice())]);

    let units = Format::Pptx
        .extract_text(&input, dir.path(), common::FakePdfEngine::with_pages(0).as_ref())
        .await
        .unwrap();
    assert_eq!(units, vec!["Roadmap\nQ1 ship\nQ2 scale"]);
}

#[tokio::test]
async fn more_media_than_slides_pads_text() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("deck.pptx");
    write_pptx(
        &input,
        &["Only slide"],
        &[
            ("ppt/media/image1.png", &b"a"[..]),
            ("ppt/media/image2.emf", &b"b"[..]),
            ("ppt/media/image3.jpg", &b"c"[..]),
        ],
    );

    let out = dir.path().join("out");
    std::fs::create_dir_all(&out).unwrap();
    let engine = common::FakePdfEngine::with_pages(0);
    let raw = Format::Pptx
        .extract(&input, &out, engine.as_ref())
        .await
        .unwrap();
    let records = normalize(&raw);

    assert_eq!(records.len(), 3);
    assert_eq!(records[0].text, "Only slide");
    assert_eq!(records[1].text, "");
    assert_eq!(records[2].text, "");
    assert_eq!(records[0].image, out.join("slide-1.png").to_string_lossy());
    assert_eq!(records[1].image, out.join("slide-2.emf").to_string_lossy());
    assert_eq!(records[2].image, out.join("slide-3.jpg").to_string_lossy());
}

#[tokio::test]
async fn media_order_is_numeric_past_nine() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("deck.pptx");
    let names: Vec<String> = (1..=11).map(|n| format!("ppt/media/image{n}.png")).collect();
    let media: Vec<(&str, &[u8])> = names.iter().map(|n| (n.as_str(), &b"img"[..])).collect();
    write_pptx(&input, &["a"], &media);

    let images = Format::Pptx
        .extract_images(&input, dir.path(), common::FakePdfEngine::with_pages(0).as_ref())
        .await
        .unwrap();
    let file_names: Vec<String> = images
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    let expected: Vec<String> = (1..=11).map(|n| format!("slide-{n}.png")).collect();
    assert_eq!(file_names, expected);
}
