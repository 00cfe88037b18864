//! # edgequake-rasterize
//!
//! Turn a text PDF into an image-only PDF, optionally degraded to look like a
//! poor scan, to produce test input for OCR pipelines.
//!
//! Every page is rendered to a bitmap, roughed up (resize roundtrip, skew,
//! blur, grayscale, noise), JPEG-encoded and placed as the sole content of a
//! new page of the same size. The result looks like the original but has no
//! text layer, so anything that wants the words has to OCR them.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDF
//!  │
//!  ├─ 1. Input     validate path, file type and %PDF magic
//!  ├─ 2. Render    rasterise each page via pdfium at the configured DPI
//!  ├─ 3. Degrade   scale roundtrip → rotate → blur → grayscale → noise
//!  ├─ 4. Encode    JPEG at the configured quality
//!  └─ 5. Assemble  one full-page image per page, atomic save
//! ```
//!
//! Pages are processed one at a time, in order, on the calling thread.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use edgequake_rasterize::{convert, RasterizeConfig};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = RasterizeConfig::builder()
//!         .dpi(150)
//!         .blur_radius(1.5)
//!         .noise(0.05)
//!         .build()?;
//!     let output = convert("document.pdf", &config)?;
//!     println!("Wrote {} ({} pages)", output.output_path.display(), output.pages.len());
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `pdf-rasterize` binary (clap + anyhow + tracing-subscriber + indicatif) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod convert;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod progress;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{default_output_path, DegradeSettings, RasterizeConfig, RasterizeConfigBuilder};
pub use convert::{convert, convert_to_file, inspect};
pub use error::{RasterizeError, Stage};
pub use output::{ConversionStats, DocumentMetadata, PageReport, RasterizeOutput};
pub use pipeline::input::resolve_input;
pub use progress::{ConversionProgressCallback, NoopProgressCallback, ProgressCallback};
