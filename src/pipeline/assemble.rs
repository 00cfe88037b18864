//! Output assembly: one full-page JPEG image object per output page.
//!
//! pdfium embeds a JPEG file as-is (DCTDecode), so the bytes written by the
//! encode stage are exactly what ends up in the PDF. Page JPEGs are staged in
//! a scratch [`TempDir`] that lives as long as the document under
//! construction and is removed on drop, success or not.
//!
//! Saving is atomic: the document is serialised to memory, written to
//! `<output>.tmp` and renamed into place, so a failed run never leaves a
//! half-written PDF at the output path.

use crate::error::RasterizeError;
use pdfium_render::prelude::*;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::{debug, info};

/// A new image-only PDF being built page by page.
pub struct OutputDocument<'a> {
    document: PdfDocument<'a>,
    scratch: TempDir,
    path: PathBuf,
    page_count: usize,
}

impl<'a> OutputDocument<'a> {
    /// Start an empty document destined for `output_path`.
    ///
    /// The parent directory is created up front so an unwritable destination
    /// fails before any page is rendered.
    pub fn new(pdfium: &'a Pdfium, output_path: &Path) -> Result<Self, RasterizeError> {
        if let Some(parent) = output_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    RasterizeError::OutputWriteFailed {
                        path: output_path.to_path_buf(),
                        source: e,
                    }
                })?;
            }
        }

        let scratch = TempDir::new().map_err(|e| RasterizeError::OutputWriteFailed {
            path: output_path.to_path_buf(),
            source: e,
        })?;

        let document = pdfium
            .create_new_pdf()
            .map_err(|e| RasterizeError::OutputBuildFailed {
                path: output_path.to_path_buf(),
                detail: format!("{:?}", e),
            })?;

        Ok(Self {
            document,
            scratch,
            path: output_path.to_path_buf(),
            page_count: 0,
        })
    }

    /// Number of pages appended so far.
    pub fn page_count(&self) -> usize {
        self.page_count
    }

    /// Append a `width_pt × height_pt` page whose only content is `jpeg`,
    /// stretched to cover the whole page.
    pub fn append_jpeg_page(
        &mut self,
        jpeg: &[u8],
        width_pt: f32,
        height_pt: f32,
    ) -> Result<(), RasterizeError> {
        let page_num = self.page_count + 1;
        let jpeg_path = self.scratch.path().join(format!("page-{page_num:05}.jpg"));
        std::fs::write(&jpeg_path, jpeg).map_err(|e| RasterizeError::OutputWriteFailed {
            path: jpeg_path.clone(),
            source: e,
        })?;

        let build_err = |e: PdfiumError| RasterizeError::OutputBuildFailed {
            path: self.path.clone(),
            detail: format!("page {page_num}: {e:?}"),
        };

        let width = PdfPoints::new(width_pt);
        let height = PdfPoints::new(height_pt);

        let mut page = self
            .document
            .pages_mut()
            .create_page_at_end(PdfPagePaperSize::Custom(width, height))
            .map_err(build_err)?;

        let mut image_obj =
            PdfPageImageObject::new_from_jpeg_file(&self.document, &jpeg_path).map_err(build_err)?;

        // Image objects start as a 1×1 pt unit square at the origin.
        image_obj
            .scale(width.value, height.value)
            .map_err(build_err)?;

        page.objects_mut()
            .add_image_object(image_obj)
            .map_err(build_err)?;

        self.page_count = page_num;
        debug!(
            "Appended output page {}: {:.1}x{:.1} pt, {} bytes JPEG",
            page_num,
            width_pt,
            height_pt,
            jpeg.len()
        );
        Ok(())
    }

    /// Serialise the document and move it atomically into place.
    pub fn save(self) -> Result<PathBuf, RasterizeError> {
        let bytes = self
            .document
            .save_to_bytes()
            .map_err(|e| RasterizeError::OutputBuildFailed {
                path: self.path.clone(),
                detail: format!("{:?}", e),
            })?;

        let tmp_path = tmp_path_for(&self.path);
        let write_err = |e: std::io::Error| RasterizeError::OutputWriteFailed {
            path: self.path.clone(),
            source: e,
        };

        if let Err(e) = std::fs::write(&tmp_path, &bytes) {
            let _ = std::fs::remove_file(&tmp_path);
            return Err(write_err(e));
        }
        if let Err(e) = std::fs::rename(&tmp_path, &self.path) {
            let _ = std::fs::remove_file(&tmp_path);
            return Err(write_err(e));
        }

        info!(
            "Wrote {} pages ({} bytes) to {}",
            self.page_count,
            bytes.len(),
            self.path.display()
        );
        Ok(self.path)
    }
}

/// Sibling path used for the atomic write: `<output>.tmp`.
pub fn tmp_path_for(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(".tmp");
    PathBuf::from(name)
}
