//! Integration tests for imgpdf-core
//!
//! These tests verify the end-to-end workflow:
//! - Image sequences edited and snapshotted
//! - Documents generated, written and parsed back with lopdf
//! - Page order, orientation and image placement
//! - Failure handling for undecodable inputs

#![allow(clippy::unwrap_used, clippy::float_cmp, clippy::panic)]

use std::io::Cursor;

use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use imgpdf_core::{
    AppConfig, AssemblyOptions, DocumentAssembler, Error, GenerationState, ImageRecord, ImageSequence,
    Orientation, SheetFormat,
};
use lopdf::{Document, Object, ObjectId};

// =============================================================================
// Test Fixtures
// =============================================================================

fn encode(width: u32, height: u32, format: ImageFormat) -> Vec<u8> {
    let img = RgbImage::from_pixel(width, height, Rgb([120, 80, 200]));
    let mut out = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(img).write_to(&mut out, format).unwrap();
    out.into_inner()
}

fn png(width: u32, height: u32) -> ImageRecord {
    ImageRecord::new(format!("{width}x{height}.png"), encode(width, height, ImageFormat::Png))
        .unwrap()
}

fn jpeg(width: u32, height: u32) -> ImageRecord {
    ImageRecord::new(format!("{width}x{height}.jpg"), encode(width, height, ImageFormat::Jpeg))
        .unwrap()
}

/// PNG signature followed by bytes no decoder accepts
fn broken() -> ImageRecord {
    let mut bytes = vec![0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
    bytes.extend_from_slice(&[0xFF; 32]);
    ImageRecord::new("broken.png", bytes).unwrap()
}

fn number(obj: &Object) -> f32 {
    match obj {
        #[allow(clippy::cast_precision_loss)]
        Object::Integer(i) => *i as f32,
        Object::Real(r) => *r,
        other => panic!("not a number: {other:?}"),
    }
}

/// Pages of a parsed PDF in document order
fn pages(doc: &Document) -> Vec<ObjectId> {
    doc.get_pages().into_values().collect()
}

fn media_box(doc: &Document, page_id: ObjectId) -> (f32, f32) {
    let page = doc.get_dictionary(page_id).unwrap();
    let mb = page.get(b"MediaBox").unwrap().as_array().unwrap();
    (number(&mb[2]) - number(&mb[0]), number(&mb[3]) - number(&mb[1]))
}

/// Pixel size of the single image drawn on a page
fn page_image_size(doc: &Document, page_id: ObjectId) -> (i64, i64) {
    let page = doc.get_dictionary(page_id).unwrap();
    let resources = page.get(b"Resources").unwrap().as_dict().unwrap();
    let xobjects = resources.get(b"XObject").unwrap().as_dict().unwrap();
    assert_eq!(xobjects.len(), 1, "one image per page");

    let (_, reference) = xobjects.iter().next().unwrap();
    let stream = doc
        .get_object(reference.as_reference().unwrap())
        .unwrap()
        .as_stream()
        .unwrap();
    (
        stream.dict.get(b"Width").unwrap().as_i64().unwrap(),
        stream.dict.get(b"Height").unwrap().as_i64().unwrap(),
    )
}

/// Operands of the `cm` operator drawing the page image
fn image_transform(doc: &Document, page_id: ObjectId) -> Vec<f32> {
    let content = doc.get_and_decode_page_content(page_id).unwrap();
    let cm = content
        .operations
        .iter()
        .find(|op| op.operator == "cm")
        .unwrap();
    cm.operands.iter().map(number).collect()
}

// =============================================================================
// Generation Tests
// =============================================================================

#[test]
fn test_one_page_per_image_in_order() {
    let images = vec![png(10, 20), jpeg(30, 20), png(5, 5), jpeg(7, 9)];
    let generated = DocumentAssembler::default()
        .generate(&images)
        .unwrap()
        .unwrap();
    assert_eq!(generated.page_count(), 4);
    assert!(generated.bytes.starts_with(b"%PDF-1.5"));

    let doc = Document::load_mem(&generated.bytes).unwrap();
    let page_ids = pages(&doc);
    assert_eq!(page_ids.len(), 4);

    let sizes: Vec<(i64, i64)> = page_ids
        .iter()
        .map(|&id| page_image_size(&doc, id))
        .collect();
    assert_eq!(sizes, [(10, 20), (30, 20), (5, 5), (7, 9)]);
}

#[test]
fn test_mixed_orientations_get_matching_media_boxes() {
    let images = vec![jpeg(400, 600), jpeg(1200, 800)];
    let generated = DocumentAssembler::default()
        .generate(&images)
        .unwrap()
        .unwrap();

    let doc = Document::load_mem(&generated.bytes).unwrap();
    let page_ids = pages(&doc);

    let (w0, h0) = media_box(&doc, page_ids[0]);
    assert!((w0 - 595.28).abs() < 0.01);
    assert!((h0 - 841.89).abs() < 0.01);

    let (w1, h1) = media_box(&doc, page_ids[1]);
    assert!((w1 - 841.89).abs() < 0.01);
    assert!((h1 - 595.28).abs() < 0.01);
}

#[test]
fn test_landscape_image_is_centered_horizontally() {
    let generated = DocumentAssembler::default()
        .generate(&[png(800, 600)])
        .unwrap()
        .unwrap();

    let layout = generated.pages[0];
    assert_eq!(layout.orientation, Orientation::Landscape);
    assert!((layout.placement.height - 595.28).abs() < 0.01);
    assert!((layout.placement.width - 793.71).abs() < 0.01);
    assert!((layout.placement.x - 24.09).abs() < 0.01);
    assert!(layout.placement.y.abs() < 0.01);

    // cm [w 0 0 h x y] in PDF space
    let doc = Document::load_mem(&generated.bytes).unwrap();
    let cm = image_transform(&doc, pages(&doc)[0]);
    assert_eq!(cm.len(), 6);
    assert!((cm[0] - layout.placement.width).abs() < 0.01);
    assert!((cm[3] - layout.placement.height).abs() < 0.01);
    assert!((cm[4] - layout.placement.x).abs() < 0.01);
    assert!(cm[5].abs() < 0.01);
}

#[test]
fn test_portrait_image_on_portrait_page_fills_height() {
    let generated = DocumentAssembler::default()
        .generate(&[png(100, 200)])
        .unwrap()
        .unwrap();

    let layout = generated.pages[0];
    assert_eq!(layout.orientation, Orientation::Portrait);
    // 100/200 = 0.5 < 595.28/841.89, so the height is the limit
    assert!((layout.placement.height - 841.89).abs() < 0.01);
    assert!((layout.placement.width - 420.945).abs() < 0.01);
    let doc = Document::load_mem(&generated.bytes).unwrap();
    let cm = image_transform(&doc, pages(&doc)[0]);
    assert!(cm[5].abs() < 0.01);
}

#[test]
fn test_decode_failure_produces_no_document() {
    let assembler = DocumentAssembler::default();
    let images = vec![png(10, 10), broken(), png(20, 10)];

    let err = assembler.generate(&images).unwrap_err();
    assert!(err.is_input_error());
    match err {
        Error::Decode { position, name, .. } => {
            assert_eq!(position, 1);
            assert_eq!(name, "broken.png");
        }
        other => panic!("expected decode error, got {other:?}"),
    }
    assert_eq!(assembler.state(), GenerationState::Failed);
}

#[test]
fn test_empty_input_is_a_no_op() {
    let assembler = DocumentAssembler::default();
    assert!(assembler.generate(&[]).unwrap().is_none());
    assert_eq!(assembler.state(), GenerationState::Idle);
}

#[test]
fn test_config_controls_sheet_title_and_filename() {
    let config = AppConfig::from_toml(
        r#"
        sheet = "a5"
        title = "Holiday"
        output_filename = "holiday.pdf"
        "#,
    )
    .unwrap();
    let generated = DocumentAssembler::from_config(&config)
        .generate(&[jpeg(60, 40)])
        .unwrap()
        .unwrap();
    assert_eq!(generated.filename, "holiday.pdf");

    let doc = Document::load_mem(&generated.bytes).unwrap();
    let (w, h) = media_box(&doc, pages(&doc)[0]);
    let expected = SheetFormat::A5.page_size(Orientation::Landscape);
    assert!((w - expected.width).abs() < 0.01);
    assert!((h - expected.height).abs() < 0.01);

    let info_ref = doc.trailer.get(b"Info").unwrap().as_reference().unwrap();
    let info = doc.get_dictionary(info_ref).unwrap();
    let title = info.get(b"Title").unwrap();
    assert_eq!(title.as_str().unwrap(), b"Holiday");
    assert_eq!(lopdf::decode_text_string(title).unwrap(), "Holiday");
}

#[test]
fn test_non_ascii_title_is_utf16_text_string() {
    let options = AssemblyOptions {
        title: Some("Férias 2024 ☀".to_string()),
        ..AssemblyOptions::default()
    };
    let generated = DocumentAssembler::new(options)
        .generate(&[png(20, 10)])
        .unwrap()
        .unwrap();

    let doc = Document::load_mem(&generated.bytes).unwrap();
    let info_ref = doc.trailer.get(b"Info").unwrap().as_reference().unwrap();
    let info = doc.get_dictionary(info_ref).unwrap();
    let title = info.get(b"Title").unwrap();
    assert!(title.as_str().unwrap().starts_with(&[0xFE, 0xFF]));
    assert_eq!(lopdf::decode_text_string(title).unwrap(), "Férias 2024 ☀");
}

// =============================================================================
// Sequence Tests
// =============================================================================

#[test]
fn test_generation_uses_sequence_snapshot_order() {
    let mut sequence = ImageSequence::new();
    let a = sequence.push(png(11, 10));
    let _b = sequence.push(png(12, 10));
    let c = sequence.push(png(13, 10));

    sequence.move_to(c, 0).unwrap();
    sequence.move_down(a).unwrap();
    let snapshot = sequence.snapshot();

    // Edits after the snapshot do not reach the document
    sequence.clear();

    let generated = DocumentAssembler::default()
        .generate(&snapshot)
        .unwrap()
        .unwrap();
    let doc = Document::load_mem(&generated.bytes).unwrap();
    let widths: Vec<i64> = pages(&doc)
        .iter()
        .map(|&id| page_image_size(&doc, id).0)
        .collect();
    assert_eq!(widths, [13, 12, 11]);
}

// =============================================================================
// Async And Output Tests
// =============================================================================

#[tokio::test]
async fn test_async_generation_matches_sync_layout() {
    let images = vec![jpeg(300, 100), png(100, 300), png(64, 64)];
    let sync = DocumentAssembler::default()
        .generate(&images)
        .unwrap()
        .unwrap();
    let async_doc = DocumentAssembler::default()
        .generate_async(images, None)
        .await
        .unwrap()
        .unwrap();

    assert_eq!(sync.pages, async_doc.pages);
}

#[tokio::test]
async fn test_async_decode_failure() {
    let assembler = DocumentAssembler::default();
    let err = assembler
        .generate_async(vec![broken()], None)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Decode { position: 0, .. }));
}

#[test]
fn test_write_to_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out.pdf");

    let generated = DocumentAssembler::default()
        .generate(&[png(3, 4), jpeg(4, 3)])
        .unwrap()
        .unwrap();
    generated.write_to(&path).unwrap();

    let doc = Document::load(&path).unwrap();
    assert_eq!(doc.get_pages().len(), 2);
}

#[test]
fn test_images_from_files() {
    let dir = tempfile::tempdir().unwrap();
    let first = dir.path().join("a.png");
    let second = dir.path().join("b.jpg");
    std::fs::write(&first, encode(9, 3, ImageFormat::Png)).unwrap();
    std::fs::write(&second, encode(3, 9, ImageFormat::Jpeg)).unwrap();

    let generated = imgpdf_core::images_to_pdf(&[&first, &second])
        .unwrap()
        .unwrap();
    let orientations: Vec<Orientation> = generated.pages.iter().map(|p| p.orientation).collect();
    assert_eq!(orientations, [Orientation::Landscape, Orientation::Portrait]);
}
