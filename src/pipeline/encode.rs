//! Image encoding: degraded `RgbImage` → baseline JPEG bytes.
//!
//! JPEG is deliberate here. Its block artefacts around glyph edges are one
//! more thing an OCR engine has to cope with, and the embedded streams keep
//! the output file close to the size of a real scanned document.

use image::codecs::jpeg::JpegEncoder;
use image::RgbImage;
use tracing::debug;

/// Encode a page image as JPEG at `quality` (1–100).
pub fn encode_jpeg(img: &RgbImage, quality: u8) -> Result<Vec<u8>, image::ImageError> {
    let mut buf = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut buf, quality);
    img.write_with_encoder(encoder)?;

    debug!(
        "Encoded {}x{} px → {} bytes JPEG (q={})",
        img.width(),
        img.height(),
        buf.len(),
        quality
    );
    Ok(buf)
}
