//! Result types returned by the conversion entry points.

use crate::config::DegradeSettings;
use serde::Serialize;
use std::path::PathBuf;

/// What happened to a single page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageReport {
    /// 1-indexed page number (same in input and output).
    pub page_num: usize,
    /// Bitmap size straight out of pdfium.
    pub rendered_width_px: u32,
    pub rendered_height_px: u32,
    /// Bitmap size after degradation (differs only when rotated).
    pub output_width_px: u32,
    pub output_height_px: u32,
    /// Size of the output page in PDF points.
    pub page_width_pt: f32,
    pub page_height_pt: f32,
    /// Size of the embedded JPEG stream.
    pub encoded_bytes: usize,
}

/// Aggregate timings and sizes for a run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ConversionStats {
    pub total_pages: usize,
    pub total_encoded_bytes: u64,
    pub render_duration_ms: u64,
    pub degrade_duration_ms: u64,
    pub total_duration_ms: u64,
}

/// Output of a successful conversion.
#[derive(Debug, Clone, Serialize)]
pub struct RasterizeOutput {
    pub input_path: PathBuf,
    pub output_path: PathBuf,
    pub dpi: u32,
    pub degrade: DegradeSettings,
    pub pages: Vec<PageReport>,
    pub stats: ConversionStats,
}

/// Document metadata and page geometry, read without rendering.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DocumentMetadata {
    pub title: Option<String>,
    pub author: Option<String>,
    pub subject: Option<String>,
    pub creator: Option<String>,
    pub producer: Option<String>,
    pub creation_date: Option<String>,
    pub modification_date: Option<String>,
    pub page_count: usize,
    pub pdf_version: String,
    /// `(width, height)` of each page in PDF points.
    pub page_sizes_pt: Vec<(f32, f32)>,
}
