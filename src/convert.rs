//! Conversion entry points.
//!
//! A run is one linear pass: validate the input, open it, then for each page
//! in order render → degrade → encode → append, and finally save the output
//! atomically. Only one page bitmap is alive at any time; the encoded JPEGs
//! accumulate in the output document until it is written. Any error aborts
//! the run and leaves nothing at the output path.

use crate::config::{default_output_path, RasterizeConfig};
use crate::error::RasterizeError;
use crate::output::{ConversionStats, DocumentMetadata, PageReport, RasterizeOutput};
use crate::pipeline::assemble::OutputDocument;
use crate::pipeline::{degrade, encode, input, render};
use std::path::Path;
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Rasterise a PDF to `<input stem>-rasterized.pdf` next to the input.
///
/// # Errors
/// See [`convert_to_file`].
pub fn convert(
    input_path: impl AsRef<Path>,
    config: &RasterizeConfig,
) -> Result<RasterizeOutput, RasterizeError> {
    let input_path = input_path.as_ref();
    let output_path = default_output_path(input_path);
    convert_to_file(input_path, output_path, config)
}

/// Rasterise a PDF into an image-only PDF at `output_path`.
///
/// # Errors
/// - open stage: missing, non-file, unreadable, non-PDF, corrupt, encrypted,
///   or zero-page input
/// - render stage: a page could not be rasterised
/// - degrade stage: a page could not be JPEG-encoded
/// - write stage: the output could not be built, written or renamed
pub fn convert_to_file(
    input_path: impl AsRef<Path>,
    output_path: impl AsRef<Path>,
    config: &RasterizeConfig,
) -> Result<RasterizeOutput, RasterizeError> {
    let total_start = Instant::now();
    let output_path = output_path.as_ref();

    // ── Step 1: Validate input ───────────────────────────────────────────
    let pdf_path = input::resolve_input(input_path)?;
    input::check_distinct_output(&pdf_path, output_path)?;
    info!(
        "Rasterising {} → {}",
        pdf_path.display(),
        output_path.display()
    );

    // ── Step 2: Open document ────────────────────────────────────────────
    let pdfium = render::bind_pdfium()?;
    let document = render::open_document(&pdfium, &pdf_path, config.password.as_deref())?;

    let total_pages = document.pages().len() as usize;
    if total_pages == 0 {
        return Err(RasterizeError::EmptyDocument { path: pdf_path });
    }

    if let Some(ref cb) = config.progress_callback {
        cb.on_conversion_start(total_pages);
    }

    // ── Step 3: Per-page render → degrade → encode → append ─────────────
    let mut output = OutputDocument::new(&pdfium, output_path)?;
    let mut pages = Vec::with_capacity(total_pages);
    let mut render_time = Duration::ZERO;
    let mut degrade_time = Duration::ZERO;

    for index in 0..total_pages {
        let page_num = index + 1;
        if let Some(ref cb) = config.progress_callback {
            cb.on_page_start(page_num, total_pages);
        }

        let t = Instant::now();
        let rendered =
            render::render_page(&document, index, config.dpi, config.max_rendered_pixels)?;
        render_time += t.elapsed();

        let (pt_per_px_x, pt_per_px_y) = rendered.points_per_pixel();
        let (rendered_w, rendered_h) = rendered.image.dimensions();

        let t = Instant::now();
        let degraded = degrade::degrade_page(rendered.image, &config.degrade, index);
        let jpeg = encode::encode_jpeg(&degraded, config.degrade.jpeg_quality).map_err(|e| {
            RasterizeError::DegradeFailed {
                page: page_num,
                detail: format!("JPEG encoding failed: {}", e),
            }
        })?;
        degrade_time += t.elapsed();

        let (out_w, out_h) = degraded.dimensions();
        drop(degraded);

        // Without rotation this is exactly the source page size.
        let (page_w_pt, page_h_pt) = if (out_w, out_h) == (rendered_w, rendered_h) {
            (rendered.width_pt, rendered.height_pt)
        } else {
            (out_w as f32 * pt_per_px_x, out_h as f32 * pt_per_px_y)
        };

        output.append_jpeg_page(&jpeg, page_w_pt, page_h_pt)?;

        let report = PageReport {
            page_num,
            rendered_width_px: rendered_w,
            rendered_height_px: rendered_h,
            output_width_px: out_w,
            output_height_px: out_h,
            page_width_pt: page_w_pt,
            page_height_pt: page_h_pt,
            encoded_bytes: jpeg.len(),
        };
        debug!("Page {}/{} done: {:?}", page_num, total_pages, report);

        if let Some(ref cb) = config.progress_callback {
            cb.on_page_complete(page_num, total_pages, &report);
        }
        pages.push(report);
    }

    debug_assert_eq!(output.page_count(), total_pages);

    // ── Step 4: Save ─────────────────────────────────────────────────────
    let written = output.save()?;

    let stats = ConversionStats {
        total_pages,
        total_encoded_bytes: pages.iter().map(|p| p.encoded_bytes as u64).sum(),
        render_duration_ms: render_time.as_millis() as u64,
        degrade_duration_ms: degrade_time.as_millis() as u64,
        total_duration_ms: total_start.elapsed().as_millis() as u64,
    };

    info!(
        "Rasterisation complete: {} pages, {}ms total",
        total_pages, stats.total_duration_ms
    );

    if let Some(ref cb) = config.progress_callback {
        cb.on_conversion_complete(total_pages);
    }

    Ok(RasterizeOutput {
        input_path: pdf_path,
        output_path: written,
        dpi: config.dpi,
        degrade: config.degrade.clone(),
        pages,
        stats,
    })
}

/// Read PDF metadata and page sizes without rasterising anything.
pub fn inspect(
    input_path: impl AsRef<Path>,
    password: Option<&str>,
) -> Result<DocumentMetadata, RasterizeError> {
    let pdf_path = input::resolve_input(input_path)?;
    let pdfium = render::bind_pdfium()?;
    let document = render::open_document(&pdfium, &pdf_path, password)?;
    Ok(render::extract_metadata(&document))
}
