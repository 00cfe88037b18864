//! PDF rasterisation: open a document with pdfium and render pages to RGB.
//!
//! ## Sizing
//!
//! PDF geometry is expressed in points (1/72 inch), so a page rendered at
//! `dpi` is `points × dpi / 72` pixels on each side. `max_rendered_pixels`
//! caps the longest edge regardless of physical size, keeping memory bounded
//! for posters and drawings; the other edge is scaled proportionally so the
//! aspect ratio is preserved.

use crate::error::RasterizeError;
use crate::output::DocumentMetadata;
use image::RgbImage;
use pdfium_render::prelude::*;
use std::path::Path;
use tracing::{debug, info};

/// A page rendered to an RGB bitmap, together with its source geometry.
pub struct RenderedPage {
    pub image: RgbImage,
    pub width_pt: f32,
    pub height_pt: f32,
}

impl RenderedPage {
    /// PDF points covered by one rendered pixel, horizontally and vertically.
    pub fn points_per_pixel(&self) -> (f32, f32) {
        (
            self.width_pt / self.image.width().max(1) as f32,
            self.height_pt / self.image.height().max(1) as f32,
        )
    }
}

/// Bind to the pdfium library, downloading it on first use.
pub fn bind_pdfium() -> Result<Pdfium, RasterizeError> {
    pdfium_auto::bind_pdfium_silent()
        .map_err(|e| RasterizeError::PdfiumBindingFailed(e.to_string()))
}

/// Open `pdf_path` and map pdfium's load failures onto open-stage errors.
pub fn open_document<'a>(
    pdfium: &'a Pdfium,
    pdf_path: &Path,
    password: Option<&'a str>,
) -> Result<PdfDocument<'a>, RasterizeError> {
    let document = pdfium.load_pdf_from_file(pdf_path, password).map_err(|e| {
        let err_str = format!("{:?}", e);
        if err_str.contains("Password") || err_str.contains("password") {
            if password.is_some() {
                RasterizeError::WrongPassword {
                    path: pdf_path.to_path_buf(),
                }
            } else {
                RasterizeError::PasswordRequired {
                    path: pdf_path.to_path_buf(),
                }
            }
        } else {
            RasterizeError::CorruptPdf {
                path: pdf_path.to_path_buf(),
                detail: err_str,
            }
        }
    })?;

    info!(
        "PDF loaded: {} pages ({})",
        document.pages().len(),
        pdf_path.display()
    );
    Ok(document)
}

/// Pixel size of a `width_pt × height_pt` page rendered at `dpi`, with the
/// longest edge capped at `max_pixels`. Never returns a zero dimension.
pub fn target_pixels(width_pt: f32, height_pt: f32, dpi: u32, max_pixels: u32) -> (u32, u32) {
    let zoom = dpi as f32 / 72.0;
    let mut w = (width_pt * zoom).round().max(1.0);
    let mut h = (height_pt * zoom).round().max(1.0);

    let longest = w.max(h);
    let cap = max_pixels.max(1) as f32;
    if longest > cap {
        let k = cap / longest;
        w = (w * k).round().max(1.0);
        h = (h * k).round().max(1.0);
    }

    (w as u32, h as u32)
}

/// Render the page at 0-based `index` to an RGB bitmap.
pub fn render_page(
    document: &PdfDocument,
    index: usize,
    dpi: u32,
    max_pixels: u32,
) -> Result<RenderedPage, RasterizeError> {
    let page = document
        .pages()
        .get(index as u16)
        .map_err(|e| RasterizeError::RenderFailed {
            page: index + 1,
            detail: format!("{:?}", e),
        })?;

    let width_pt = page.width().value;
    let height_pt = page.height().value;
    let (target_w, target_h) = target_pixels(width_pt, height_pt, dpi, max_pixels);

    let render_config = PdfRenderConfig::new()
        .set_target_width(target_w as i32)
        .set_target_height(target_h as i32);

    let bitmap = page
        .render_with_config(&render_config)
        .map_err(|e| RasterizeError::RenderFailed {
            page: index + 1,
            detail: format!("{:?}", e),
        })?;

    let image = bitmap.as_image().to_rgb8();
    debug!(
        "Rendered page {}: {:.1}x{:.1} pt → {}x{} px at {} DPI",
        index + 1,
        width_pt,
        height_pt,
        image.width(),
        image.height(),
        dpi
    );

    Ok(RenderedPage {
        image,
        width_pt,
        height_pt,
    })
}

/// Read document metadata and page sizes without rendering anything.
pub fn extract_metadata(document: &PdfDocument) -> DocumentMetadata {
    let metadata = document.metadata();
    let pages = document.pages();

    let get_meta = |tag: PdfDocumentMetadataTagType| -> Option<String> {
        metadata.get(tag).and_then(|t| {
            let v = t.value().to_string();
            if v.is_empty() {
                None
            } else {
                Some(v)
            }
        })
    };

    let page_sizes_pt = pages
        .iter()
        .map(|p| (p.width().value, p.height().value))
        .collect::<Vec<_>>();

    DocumentMetadata {
        title: get_meta(PdfDocumentMetadataTagType::Title),
        author: get_meta(PdfDocumentMetadataTagType::Author),
        subject: get_meta(PdfDocumentMetadataTagType::Subject),
        creator: get_meta(PdfDocumentMetadataTagType::Creator),
        producer: get_meta(PdfDocumentMetadataTagType::Producer),
        creation_date: get_meta(PdfDocumentMetadataTagType::CreationDate),
        modification_date: get_meta(PdfDocumentMetadataTagType::ModificationDate),
        page_count: pages.len() as usize,
        pdf_version: format!("{:?}", document.version()),
        page_sizes_pt,
    }
}
