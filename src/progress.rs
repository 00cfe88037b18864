//! Progress-callback trait for per-page rasterisation events.
//!
//! Inject an [`Arc<dyn ConversionProgressCallback>`] via
//! [`crate::config::RasterizeConfigBuilder::progress_callback`] to receive
//! events as the pipeline processes each page. Pages are processed strictly
//! in order on the calling thread, so events arrive in page order too.
//!
//! # Example
//!
//! ```rust
//! use edgequake_rasterize::{ConversionProgressCallback, PageReport, RasterizeConfig};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     completed: AtomicUsize,
//! }
//!
//! impl ConversionProgressCallback for CountingCallback {
//!     fn on_page_complete(&self, page_num: usize, total_pages: usize, report: &PageReport) {
//!         self.completed.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("Page {}/{} → {} bytes", page_num, total_pages, report.encoded_bytes);
//!     }
//! }
//!
//! let config = RasterizeConfig::builder()
//!     .progress_callback(Arc::new(CountingCallback { completed: AtomicUsize::new(0) }))
//!     .build()
//!     .unwrap();
//! ```

use crate::output::PageReport;
use std::sync::Arc;

/// Called by the pipeline as it processes each page.
///
/// All methods have default no-op implementations so callers only override
/// what they care about. The `Send + Sync` bound lets one callback be shared
/// by configs handed to different threads.
pub trait ConversionProgressCallback: Send + Sync {
    /// Called once after the document is opened, before the first page.
    fn on_conversion_start(&self, total_pages: usize) {
        let _ = total_pages;
    }

    /// Called just before a page is rendered.
    ///
    /// # Arguments
    /// * `page_num`    — 1-indexed page number
    /// * `total_pages` — total pages in the document
    fn on_page_start(&self, page_num: usize, total_pages: usize) {
        let _ = (page_num, total_pages);
    }

    /// Called once a page has been rendered, degraded and appended.
    fn on_page_complete(&self, page_num: usize, total_pages: usize, report: &PageReport) {
        let _ = (page_num, total_pages, report);
    }

    /// Called once after the output file has been written.
    fn on_conversion_complete(&self, total_pages: usize) {
        let _ = total_pages;
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl ConversionProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::RasterizeConfig`].
pub type ProgressCallback = Arc<dyn ConversionProgressCallback>;
