//! Error types for the edgequake-rasterize library.
//!
//! Every failure is fatal: the tool is single-shot, so there is no partial
//! output and no page-level recovery. What callers do need is to know *where*
//! the run stopped, so each [`RasterizeError`] variant maps to a [`Stage`]
//! via [`RasterizeError::stage`]:
//!
//! | Stage     | Variants |
//! |-----------|----------|
//! | `open`    | missing / unreadable / non-PDF / corrupt / encrypted input, zero pages |
//! | `render`  | a page could not be loaded or rasterised |
//! | `degrade` | a filter or the JPEG encoder failed |
//! | `write`   | the output document could not be built or saved |
//! | `setup`   | invalid configuration, pdfium binding |

use serde::Serialize;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Pipeline stage in which a [`RasterizeError`] occurred.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Setup,
    Open,
    Render,
    Degrade,
    Write,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Stage::Setup => "setup",
            Stage::Open => "open",
            Stage::Render => "render",
            Stage::Degrade => "degrade",
            Stage::Write => "write",
        };
        f.write_str(s)
    }
}

/// All errors returned by the edgequake-rasterize library.
#[derive(Debug, Error)]
pub enum RasterizeError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("PDF file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Input path exists but is a directory (or another non-file entry).
    #[error("'{path}' is not a file\nPass the path of a single PDF document.")]
    NotAFile { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The file exists and was read, but is not a PDF.
    #[error("File is not a valid PDF: '{path}'\nFirst bytes: {magic:?}")]
    NotAPdf { path: PathBuf, magic: [u8; 4] },

    // ── PDF errors ────────────────────────────────────────────────────────
    /// PDF header/trailer/xref is corrupt and cannot be parsed.
    #[error("PDF '{path}' is corrupt: {detail}\nTry repairing with: qpdf input.pdf output.pdf")]
    CorruptPdf { path: PathBuf, detail: String },

    /// PDF requires a password but none was provided.
    #[error("PDF '{path}' is encrypted and requires a password.\nProvide it with --password <PASSWORD>.")]
    PasswordRequired { path: PathBuf },

    /// A password was provided but it is wrong.
    #[error("Wrong password for PDF '{path}'")]
    WrongPassword { path: PathBuf },

    /// The document opened fine but has no pages to rasterise.
    #[error("PDF '{path}' has no pages; nothing to rasterise")]
    EmptyDocument { path: PathBuf },

    /// pdfium-render returned an error for a specific page.
    #[error("Rasterisation failed for page {page}: {detail}")]
    RenderFailed { page: usize, detail: String },

    // ── Image errors ──────────────────────────────────────────────────────
    /// A degradation filter or the JPEG encoder failed for a page.
    #[error("Degradation failed for page {page}: {detail}")]
    DegradeFailed { page: usize, detail: String },

    // ── Output errors ─────────────────────────────────────────────────────
    /// Could not create or write the output PDF file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// pdfium refused to build or save the output document.
    #[error("Failed to build output PDF '{path}': {detail}")]
    OutputBuildFailed { path: PathBuf, detail: String },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Pdfium binding errors ─────────────────────────────────────────────
    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\n\
PDFium is normally downloaded automatically on first run.\n\
If the auto-download failed, you can:\n\
  • Check your internet connection and try again.\n\
  • Set PDFIUM_LIB_PATH=/path/to/libpdfium to use an existing copy.\n"
    )]
    PdfiumBindingFailed(String),
}

impl RasterizeError {
    /// The pipeline stage this error belongs to.
    pub fn stage(&self) -> Stage {
        match self {
            RasterizeError::FileNotFound { .. }
            | RasterizeError::NotAFile { .. }
            | RasterizeError::PermissionDenied { .. }
            | RasterizeError::NotAPdf { .. }
            | RasterizeError::CorruptPdf { .. }
            | RasterizeError::PasswordRequired { .. }
            | RasterizeError::WrongPassword { .. }
            | RasterizeError::EmptyDocument { .. } => Stage::Open,
            RasterizeError::RenderFailed { .. } => Stage::Render,
            RasterizeError::DegradeFailed { .. } => Stage::Degrade,
            RasterizeError::OutputWriteFailed { .. } | RasterizeError::OutputBuildFailed { .. } => {
                Stage::Write
            }
            RasterizeError::InvalidConfig(_) | RasterizeError::PdfiumBindingFailed(_) => {
                Stage::Setup
            }
        }
    }
}
