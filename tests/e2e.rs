//! End-to-end integration tests for edgequake-rasterize.
//!
//! Fixture PDFs are generated in-process, so no test files need to be
//! downloaded. Tests that render need a PDFium library; they run when one is
//! already cached (or `PDFIUM_LIB_PATH` is set) and print `SKIP` otherwise.
//! Set `E2E_ENABLED=1` to allow the first run to download PDFium.
//!
//! Run with:
//!   cargo test --test e2e -- --nocapture

use edgequake_rasterize::{
    convert, convert_to_file, inspect, ConversionProgressCallback, DegradeSettings, PageReport,
    RasterizeConfig, RasterizeError, Stage,
};
use pdfium_render::prelude::*;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

// ── Test helpers ─────────────────────────────────────────────────────────────

/// PDFium is process-global; keep the rendering tests from interleaving.
static PDFIUM_LOCK: Mutex<()> = Mutex::new(());

const LETTER: (f32, f32) = (612.0, 792.0);
const A5: (f32, f32) = (420.0, 595.0);
const LETTER_LANDSCAPE: (f32, f32) = (792.0, 612.0);

/// Skip this test unless a PDFium library can be bound without a surprise
/// download. Evaluates to the held lock guard.
macro_rules! e2e_skip_unless_pdfium {
    () => {{
        let guard = PDFIUM_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        if pdfium_auto::cached_pdfium_path().is_none() && std::env::var("E2E_ENABLED").is_err() {
            println!("SKIP — no cached PDFium; set E2E_ENABLED=1 to download it");
            return;
        }
        guard
    }};
}

/// Build a minimal PDF with one Helvetica text line per page.
///
/// Offsets in the xref table are computed while writing, so the file opens
/// without pdfium's repair path.
fn build_pdf(page_sizes: &[(f32, f32)]) -> Vec<u8> {
    let n = page_sizes.len();
    // 1: catalog, 2: pages, 3: font, then (page, contents) pairs.
    let page_id = |i: usize| 4 + 2 * i;
    let mut objects: Vec<String> = Vec::new();

    objects.push("<< /Type /Catalog /Pages 2 0 R >>".to_string());
    let kids = (0..n)
        .map(|i| format!("{} 0 R", page_id(i)))
        .collect::<Vec<_>>()
        .join(" ");
    objects.push(format!("<< /Type /Pages /Kids [{kids}] /Count {n} >>"));
    objects.push("<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica >>".to_string());

    for (i, &(w, h)) in page_sizes.iter().enumerate() {
        objects.push(format!(
            "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 {w} {h}] \
             /Resources << /Font << /F1 3 0 R >> >> /Contents {} 0 R >>",
            page_id(i) + 1
        ));
        let stream = format!(
            "BT /F1 24 Tf 72 {} Td (Rasterize fixture page {}) Tj ET",
            h - 100.0,
            i + 1
        );
        objects.push(format!(
            "<< /Length {} >>\nstream\n{}\nendstream",
            stream.len(),
            stream
        ));
    }

    let mut out = b"%PDF-1.4\n%\xE2\xE3\xCF\xD3\n".to_vec();
    let mut offsets = Vec::with_capacity(objects.len());
    for (i, body) in objects.iter().enumerate() {
        offsets.push(out.len());
        out.extend_from_slice(format!("{} 0 obj\n{}\nendobj\n", i + 1, body).as_bytes());
    }

    let xref_at = out.len();
    out.extend_from_slice(format!("xref\n0 {}\n", objects.len() + 1).as_bytes());
    out.extend_from_slice(b"0000000000 65535 f \n");
    for off in offsets {
        out.extend_from_slice(format!("{off:010} 00000 n \n").as_bytes());
    }
    out.extend_from_slice(
        format!(
            "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{}\n%%EOF\n",
            objects.len() + 1,
            xref_at
        )
        .as_bytes(),
    );
    out
}

fn write_fixture(dir: &Path, name: &str, page_sizes: &[(f32, f32)]) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, build_pdf(page_sizes)).unwrap();
    path
}

fn fast_config() -> RasterizeConfig {
    RasterizeConfig::builder().dpi(72).build().unwrap()
}

fn bind() -> Pdfium {
    pdfium_auto::bind_pdfium_silent().expect("PDFium should bind")
}

fn assert_close(actual: f32, expected: f32, context: &str) {
    assert!(
        (actual - expected).abs() < 0.5,
        "[{context}] expected {expected}, got {actual}"
    );
}

/// Render page `index` of `path` at 72 DPI to RGB.
fn render_output_page(pdfium: &Pdfium, path: &Path, index: u16) -> image::RgbImage {
    let doc = pdfium.load_pdf_from_file(path, None).unwrap();
    let page = doc.pages().get(index).unwrap();
    let cfg = PdfRenderConfig::new()
        .set_target_width(page.width().value.round() as i32)
        .set_target_height(page.height().value.round() as i32);
    let image = page.render_with_config(&cfg).unwrap().as_image().to_rgb8();
    image
}

// ── Input validation (no PDFium needed) ──────────────────────────────────────

#[test]
fn test_missing_input_fails_in_open_stage() {
    let dir = TempDir::new().unwrap();
    let out = dir.path().join("out.pdf");

    let err = convert_to_file("/definitely/not/a/real/file.pdf", &out, &fast_config()).unwrap_err();
    assert!(matches!(err, RasterizeError::FileNotFound { .. }), "got {err:?}");
    assert_eq!(err.stage(), Stage::Open);
    assert!(!out.exists(), "no output may be written on failure");
}

#[test]
fn test_non_pdf_input_is_rejected() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("notes.pdf");
    std::fs::write(&input, b"just some text, not a PDF").unwrap();
    let out = dir.path().join("out.pdf");

    let err = convert_to_file(&input, &out, &fast_config()).unwrap_err();
    assert!(matches!(err, RasterizeError::NotAPdf { .. }), "got {err:?}");
    assert!(!out.exists());
}

#[test]
fn test_output_may_not_overwrite_input() {
    let dir = TempDir::new().unwrap();
    let input = write_fixture(dir.path(), "doc.pdf", &[LETTER]);
    let before = std::fs::read(&input).unwrap();

    let err = convert_to_file(&input, &input, &fast_config()).unwrap_err();
    assert!(matches!(err, RasterizeError::InvalidConfig(_)), "got {err:?}");
    assert_eq!(std::fs::read(&input).unwrap(), before, "input must be untouched");
}

#[test]
fn test_inspect_nonexistent() {
    let result = inspect("/definitely/not/a/real/file.pdf", None);
    assert!(
        matches!(result, Err(RasterizeError::FileNotFound { .. })),
        "inspect() should return FileNotFound"
    );
}

// ── Inspect ──────────────────────────────────────────────────────────────────

#[test]
fn test_inspect_reports_page_sizes_in_order() {
    let _guard = e2e_skip_unless_pdfium!();
    let dir = TempDir::new().unwrap();
    let input = write_fixture(dir.path(), "mixed.pdf", &[LETTER, A5, LETTER_LANDSCAPE]);

    let meta = inspect(&input, None).expect("inspect() should succeed");

    assert_eq!(meta.page_count, 3);
    assert_eq!(meta.page_sizes_pt.len(), 3);
    for (i, (&(w, h), &(ew, eh))) in meta
        .page_sizes_pt
        .iter()
        .zip([LETTER, A5, LETTER_LANDSCAPE].iter())
        .enumerate()
    {
        assert_close(w, ew, &format!("page {} width", i + 1));
        assert_close(h, eh, &format!("page {} height", i + 1));
    }
    println!("Metadata: {:?}", meta);
}

// ── Conversion ───────────────────────────────────────────────────────────────

/// Output has the same page count and page sizes, in order, and every page
/// is a single image with no text layer.
#[test]
fn test_convert_preserves_pages_and_strips_text() {
    let _guard = e2e_skip_unless_pdfium!();
    let dir = TempDir::new().unwrap();
    let sizes = [LETTER, A5, LETTER_LANDSCAPE];
    let input = write_fixture(dir.path(), "mixed.pdf", &sizes);
    let out = dir.path().join("mixed-out.pdf");

    let result = convert_to_file(&input, &out, &fast_config()).expect("conversion should succeed");

    assert_eq!(result.output_path, out);
    assert_eq!(result.pages.len(), 3);
    assert_eq!(result.stats.total_pages, 3);
    assert!(result.stats.total_encoded_bytes > 0);
    for (i, report) in result.pages.iter().enumerate() {
        assert_eq!(report.page_num, i + 1, "reports must be in page order");
    }

    let pdfium = bind();
    let doc = pdfium.load_pdf_from_file(&out, None).unwrap();
    assert_eq!(doc.pages().len(), 3);

    // The source really does carry text, so an empty result below means
    // the conversion removed it.
    let src = pdfium.load_pdf_from_file(&input, None).unwrap();
    assert!(src.pages().get(0).unwrap().text().unwrap().all().contains("fixture"));

    for (i, page) in doc.pages().iter().enumerate() {
        let ctx = format!("page {}", i + 1);
        assert_close(page.width().value, sizes[i].0, &ctx);
        assert_close(page.height().value, sizes[i].1, &ctx);

        assert!(
            page.text().unwrap().all().trim().is_empty(),
            "[{ctx}] output page must have no extractable text"
        );

        let kinds: Vec<_> = page.objects().iter().map(|o| o.object_type()).collect();
        assert_eq!(kinds, vec![PdfPageObjectType::Image], "[{ctx}] one image only");
    }

    assert!(
        !out.with_extension("pdf.tmp").exists(),
        "temporary file must be renamed away"
    );
}

/// Rendered pixel size follows page inches × DPI for every page.
#[test]
fn test_render_size_follows_dpi() {
    let _guard = e2e_skip_unless_pdfium!();
    let dir = TempDir::new().unwrap();
    let sizes = [LETTER, A5, LETTER_LANDSCAPE];
    let input = write_fixture(dir.path(), "three.pdf", &sizes);
    let out = dir.path().join("three-150.pdf");
    let config = RasterizeConfig::builder().dpi(150).build().unwrap();

    let result = convert_to_file(&input, &out, &config).expect("conversion should succeed");

    assert_eq!(result.dpi, 150);
    assert_eq!(result.pages.len(), 3);
    for (report, &(w_pt, h_pt)) in result.pages.iter().zip(sizes.iter()) {
        let ctx = format!("page {}", report.page_num);
        let expected_w = w_pt / 72.0 * 150.0;
        let expected_h = h_pt / 72.0 * 150.0;
        assert!(
            (report.rendered_width_px as f32 - expected_w).abs() <= 1.0,
            "[{ctx}] width {} vs {expected_w}",
            report.rendered_width_px
        );
        assert!(
            (report.rendered_height_px as f32 - expected_h).abs() <= 1.0,
            "[{ctx}] height {} vs {expected_h}",
            report.rendered_height_px
        );
        // No rotation, so the degraded image keeps the rendered size.
        assert_eq!(
            (report.output_width_px, report.output_height_px),
            (report.rendered_width_px, report.rendered_height_px),
            "[{ctx}]"
        );
    }

    let pdfium = bind();
    let doc = pdfium.load_pdf_from_file(&out, None).unwrap();
    assert_eq!(doc.pages().len(), 3);
}

#[test]
fn test_convert_uses_default_output_name() {
    let _guard = e2e_skip_unless_pdfium!();
    let dir = TempDir::new().unwrap();
    let input = write_fixture(dir.path(), "report.pdf", &[LETTER]);

    let result = convert(&input, &fast_config()).expect("conversion should succeed");

    assert_eq!(result.output_path, dir.path().join("report-rasterized.pdf"));
    assert!(result.output_path.exists());
}

#[test]
fn test_convert_creates_missing_output_directory() {
    let _guard = e2e_skip_unless_pdfium!();
    let dir = TempDir::new().unwrap();
    let input = write_fixture(dir.path(), "doc.pdf", &[A5]);
    let out = dir.path().join("nested/deeper/doc.pdf");

    convert_to_file(&input, &out, &fast_config()).expect("conversion should succeed");
    assert!(out.exists());
}

#[test]
fn test_empty_document_writes_nothing() {
    let _guard = e2e_skip_unless_pdfium!();
    let dir = TempDir::new().unwrap();
    let input = write_fixture(dir.path(), "empty.pdf", &[]);
    let out = dir.path().join("empty-out.pdf");

    let err = convert_to_file(&input, &out, &fast_config()).unwrap_err();
    assert!(matches!(err, RasterizeError::EmptyDocument { .. }), "got {err:?}");
    assert_eq!(err.stage(), Stage::Open);
    assert!(!out.exists());
}

#[test]
fn test_truncated_pdf_is_corrupt() {
    let _guard = e2e_skip_unless_pdfium!();
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("broken.pdf");
    std::fs::write(&input, b"%PDF-1.4\n1 0 obj\n<< /Type /Cat").unwrap();
    let out = dir.path().join("broken-out.pdf");

    let err = convert_to_file(&input, &out, &fast_config()).unwrap_err();
    assert_eq!(err.stage(), Stage::Open, "got {err:?}");
    assert!(!out.exists());
}

/// Same input and settings give identical output pixels, noise included.
#[test]
fn test_conversion_is_deterministic() {
    let _guard = e2e_skip_unless_pdfium!();
    let dir = TempDir::new().unwrap();
    let input = write_fixture(dir.path(), "doc.pdf", &[LETTER, A5]);
    let config = RasterizeConfig::builder()
        .dpi(72)
        .noise(0.2)
        .rotate_degrees(1.5)
        .build()
        .unwrap();

    let a = convert_to_file(&input, dir.path().join("a.pdf"), &config).unwrap();
    let b = convert_to_file(&input, dir.path().join("b.pdf"), &config).unwrap();

    let sizes = |o: &edgequake_rasterize::RasterizeOutput| {
        o.pages.iter().map(|p| p.encoded_bytes).collect::<Vec<_>>()
    };
    assert_eq!(sizes(&a), sizes(&b));

    let pdfium = bind();
    for index in 0..2 {
        assert_eq!(
            render_output_page(&pdfium, &a.output_path, index),
            render_output_page(&pdfium, &b.output_path, index),
            "page {} differs between runs",
            index + 1
        );
    }
}

/// Rotation enlarges the bitmap, and the page grows with it so the image
/// keeps its resolution.
#[test]
fn test_rotation_expands_page() {
    let _guard = e2e_skip_unless_pdfium!();
    let dir = TempDir::new().unwrap();
    let input = write_fixture(dir.path(), "doc.pdf", &[LETTER]);
    let config = RasterizeConfig::builder()
        .dpi(72)
        .rotate_degrees(5.0)
        .build()
        .unwrap();

    let out = convert_to_file(&input, dir.path().join("rot.pdf"), &config).unwrap();
    let page = &out.pages[0];

    assert!(page.output_width_px > page.rendered_width_px);
    assert!(page.output_height_px > page.rendered_height_px);
    assert!(page.page_width_pt > LETTER.0);
    assert!(page.page_height_pt > LETTER.1);
}

#[test]
fn test_higher_quality_settings_produce_larger_output() {
    let _guard = e2e_skip_unless_pdfium!();
    let dir = TempDir::new().unwrap();
    let input = write_fixture(dir.path(), "doc.pdf", &[LETTER]);

    let clean = RasterizeConfig::builder()
        .dpi(150)
        .degrade(DegradeSettings {
            jpeg_quality: 95,
            ..DegradeSettings::none()
        })
        .build()
        .unwrap();
    let rough = RasterizeConfig::builder()
        .dpi(150)
        .jpeg_quality(10)
        .build()
        .unwrap();

    let clean_out = convert_to_file(&input, dir.path().join("clean.pdf"), &clean).unwrap();
    let rough_out = convert_to_file(&input, dir.path().join("rough.pdf"), &rough).unwrap();

    assert!(
        clean_out.stats.total_encoded_bytes > rough_out.stats.total_encoded_bytes,
        "clean {} vs rough {}",
        clean_out.stats.total_encoded_bytes,
        rough_out.stats.total_encoded_bytes
    );
}

// ── Progress events ──────────────────────────────────────────────────────────

#[derive(Default)]
struct RecordingCallback {
    events: Mutex<Vec<String>>,
}

impl ConversionProgressCallback for RecordingCallback {
    fn on_conversion_start(&self, total_pages: usize) {
        self.events.lock().unwrap().push(format!("start {total_pages}"));
    }
    fn on_page_start(&self, page_num: usize, total_pages: usize) {
        self.events
            .lock()
            .unwrap()
            .push(format!("page {page_num}/{total_pages}"));
    }
    fn on_page_complete(&self, page_num: usize, _total_pages: usize, report: &PageReport) {
        assert_eq!(report.page_num, page_num);
        self.events.lock().unwrap().push(format!("done {page_num}"));
    }
    fn on_conversion_complete(&self, total_pages: usize) {
        self.events.lock().unwrap().push(format!("complete {total_pages}"));
    }
}

#[test]
fn test_progress_events_arrive_in_page_order() {
    let _guard = e2e_skip_unless_pdfium!();
    let dir = TempDir::new().unwrap();
    let input = write_fixture(dir.path(), "doc.pdf", &[LETTER, A5]);
    let recorder = Arc::new(RecordingCallback::default());

    let config = RasterizeConfig::builder()
        .dpi(72)
        .progress_callback(recorder.clone())
        .build()
        .unwrap();
    convert_to_file(&input, dir.path().join("out.pdf"), &config).unwrap();

    let events = recorder.events.lock().unwrap().clone();
    assert_eq!(
        events,
        vec![
            "start 2",
            "page 1/2",
            "done 1",
            "page 2/2",
            "done 2",
            "complete 2"
        ]
    );
}
