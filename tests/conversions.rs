//! End-to-end conversions through [`quickconvert::convert`].
//!
//! pdfium and LibreOffice are runtime dependencies. Tests that need them
//! print a SKIP line and return when the library or binary is missing.

use image::{GenericImageView, Rgb, RgbImage};
use quickconvert::pipeline::{docx, engine, office};
use quickconvert::{convert, convert_paths, ConversionKind, OfficeFormat, ServiceConfig, UploadedFile};
use std::path::Path;

fn config(root: &Path) -> ServiceConfig {
    ServiceConfig::builder()
        .upload_dir(root.join("uploads"))
        .output_dir(root.join("outputs"))
        .build()
        .unwrap()
}

fn pdfium_or_skip(config: &ServiceConfig, test: &str) -> bool {
    if engine::is_available(config) {
        return true;
    }
    println!("SKIP {test}: pdfium library not found");
    false
}

fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let mut bytes = Vec::new();
    RgbImage::from_fn(width, height, |x, _| {
        if x < width / 2 {
            Rgb([20, 120, 220])
        } else {
            Rgb([240, 200, 40])
        }
    })
    .write_to(&mut std::io::Cursor::new(&mut bytes), image::ImageFormat::Png)
    .unwrap();
    bytes
}

// ── No native dependencies ───────────────────────────────────────────────

#[tokio::test]
async fn docx_to_text_keeps_paragraphs() {
    let tmp = tempfile::tempdir().unwrap();
    let cfg = config(tmp.path());
    let source = tmp.path().join("notes.docx");
    docx::write_docx(
        &["Agenda\n\tbudget & hiring".to_string(), "Next steps".to_string()],
        &source,
    )
    .unwrap();

    let out = convert_paths(ConversionKind::WordToText, &[source], None, &cfg)
        .await
        .unwrap();

    assert!(out.file_name.ends_with("_notes.txt"), "{}", out.file_name);
    assert!(out.content_type.starts_with("text/plain"));
    let text = std::fs::read_to_string(&out.path).unwrap();
    assert!(text.contains("Agenda"));
    assert!(text.contains("\tbudget & hiring"));
    assert!(text.contains("Next steps"));
}

#[tokio::test]
async fn zip_keeps_duplicate_names_apart() {
    let tmp = tempfile::tempdir().unwrap();
    let cfg = config(tmp.path());
    let files = [
        UploadedFile::new("report.txt", "first"),
        UploadedFile::new("report.txt", "second"),
        UploadedFile::new("../../etc/passwd", "not a path"),
    ];

    let out = convert(ConversionKind::Zip, &files, None, &cfg).await.unwrap();

    let mut archive = zip::ZipArchive::new(std::fs::File::open(&out.path).unwrap()).unwrap();
    let mut names: Vec<String> = archive.file_names().map(str::to_string).collect();
    names.sort();
    assert_eq!(names.len(), 3);
    assert!(names.iter().all(|n| !n.contains('/') && !n.contains("..")));
    assert!(names.contains(&"report.txt".to_string()));
    assert!(names.contains(&"report_1.txt".to_string()));

    let mut second = String::new();
    std::io::Read::read_to_string(&mut archive.by_name("report_1.txt").unwrap(), &mut second)
        .unwrap();
    assert_eq!(second, "second");
}

// ── pdfium ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn text_pdf_renders_and_extracts() {
    let tmp = tempfile::tempdir().unwrap();
    let cfg = config(tmp.path());
    if !pdfium_or_skip(&cfg, "text_pdf_renders_and_extracts") {
        return;
    }

    let body: String = (1..=60).map(|i| format!("line {i} of the minutes\n")).collect();
    let pdf = convert(
        ConversionKind::TextToPdf,
        &[UploadedFile::new("minutes.txt", body)],
        None,
        &cfg,
    )
    .await
    .unwrap();
    let pdf_bytes = std::fs::read(&pdf.path).unwrap();
    assert!(pdf_bytes.starts_with(b"%PDF"));

    let jpg = convert_paths(ConversionKind::PdfToImage, &[pdf.path.clone()], None, &cfg)
        .await
        .unwrap();
    let page = image::open(&jpg.path).unwrap();
    assert!(page.width() > 0 && page.height() > page.width());

    let word = convert_paths(ConversionKind::PdfToWord, &[pdf.path.clone()], None, &cfg)
        .await
        .unwrap();
    let text = docx::read_docx(&word.path).unwrap();
    assert!(text.contains("line 1 of the minutes"), "{text}");
    assert!(text.contains("line 60 of the minutes"), "{text}");
}

#[tokio::test]
async fn image_pdf_keeps_aspect_ratio() {
    let tmp = tempfile::tempdir().unwrap();
    let cfg = config(tmp.path());
    if !pdfium_or_skip(&cfg, "image_pdf_keeps_aspect_ratio") {
        return;
    }

    let pdf = convert(
        ConversionKind::ImageToPdf,
        &[UploadedFile::new("banner.png", png_bytes(400, 200))],
        None,
        &cfg,
    )
    .await
    .unwrap();
    assert!(pdf.file_name.ends_with("_banner.pdf"));

    let jpg = convert_paths(ConversionKind::PdfToImage, &[pdf.path], None, &cfg)
        .await
        .unwrap();
    let (w, h) = image::open(&jpg.path).unwrap().dimensions();
    let ratio = w as f64 / h as f64;
    assert!((ratio - 2.0).abs() < 0.05, "rendered {w}x{h}");
}

#[tokio::test]
async fn non_pdf_input_is_rejected() {
    let tmp = tempfile::tempdir().unwrap();
    let cfg = config(tmp.path());
    if !pdfium_or_skip(&cfg, "non_pdf_input_is_rejected") {
        return;
    }

    let err = convert(
        ConversionKind::PdfToImage,
        &[UploadedFile::new("fake.pdf", "definitely not a pdf")],
        None,
        &cfg,
    )
    .await
    .unwrap_err();

    assert!(!err.to_string().is_empty());
    let leftovers = std::fs::read_dir(&cfg.output_dir).unwrap().count();
    assert_eq!(leftovers, 0);
}

// ── LibreOffice ──────────────────────────────────────────────────────────

#[tokio::test]
async fn word_to_pdf_through_office_suite() {
    let tmp = tempfile::tempdir().unwrap();
    let cfg = config(tmp.path());
    if !office::is_available(&cfg) {
        println!("SKIP word_to_pdf_through_office_suite: {} not found", cfg.office_binary);
        return;
    }

    let source = tmp.path().join("letter.docx");
    docx::write_docx(&["Dear reader,\nthis is a letter.".to_string()], &source).unwrap();

    let out = convert_paths(
        ConversionKind::OfficeToPdf(OfficeFormat::Word),
        &[source],
        None,
        &cfg,
    )
    .await
    .unwrap();

    assert!(out.file_name.ends_with("_letter.pdf"));
    assert!(std::fs::read(&out.path).unwrap().starts_with(b"%PDF"));
    assert_eq!(std::fs::read_dir(&cfg.upload_dir).unwrap().count(), 0);
}
