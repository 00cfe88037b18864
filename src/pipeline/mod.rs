//! Pipeline stages for PDF rasterisation.
//!
//! Each submodule implements exactly one transformation step, so each can be
//! tested on its own and the pdfium-bound stages stay separate from the pure
//! image code.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ render ──▶ degrade ──▶ encode ──▶ assemble
//! (path)   (pdfium)   (filters)    (JPEG)    (pdfium, atomic save)
//! ```
//!
//! 1. [`input`]    — validate the user-supplied path before pdfium sees it
//! 2. [`render`]   — open the document and rasterise one page at a time
//! 3. [`degrade`]  — scale roundtrip, skew, blur, grayscale, seeded noise
//! 4. [`encode`]   — JPEG-encode the degraded page
//! 5. [`assemble`] — add one full-page image per page and save atomically

pub mod assemble;
pub mod degrade;
pub mod encode;
pub mod input;
pub mod render;
