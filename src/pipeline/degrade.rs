//! Image degradation: make a clean render look like a mediocre scan.
//!
//! Filters run in a fixed order, each skipped at its neutral value:
//!
//! 1. **Scale roundtrip** — bilinear shrink to `scale_factor`, then stretch
//!    back. Glyph edges lose detail but the pixel size is unchanged.
//! 2. **Rotation** — bicubic skew about the centre; the canvas grows so no
//!    content is clipped, new corners are white.
//! 3. **Blur** — Gaussian, `blur_radius` is the sigma in pixels.
//! 4. **Grayscale** — luma only, kept as RGB so the encoder path is uniform.
//! 5. **Noise** — uniform per-channel jitter of up to `noise × 255`.
//!
//! Noise is seeded from the page index, so two runs with the same settings
//! produce identical pixels.

use crate::config::DegradeSettings;
use image::imageops::{self, FilterType};
use image::{DynamicImage, Rgb, RgbImage};
use imageproc::geometric_transformations::{rotate_about_center, Interpolation};
use tracing::debug;

const WHITE: Rgb<u8> = Rgb([255, 255, 255]);

/// Base seed for the per-page noise generator.
const NOISE_SEED: u64 = 1337;

/// Apply every enabled filter in `settings` to a rendered page.
///
/// `page_index` is 0-based and only seeds the noise generator.
pub fn degrade_page(image: RgbImage, settings: &DegradeSettings, page_index: usize) -> RgbImage {
    let mut img = image;

    if settings.scale_factor < 1.0 {
        img = scale_roundtrip(&img, settings.scale_factor);
    }
    if settings.rotate_degrees != 0.0 {
        img = rotate_expand(&img, settings.rotate_degrees);
    }
    if settings.blur_radius > 0.0 {
        img = imageops::blur(&img, settings.blur_radius);
    }
    if settings.grayscale {
        img = DynamicImage::ImageLuma8(imageops::grayscale(&img)).to_rgb8();
    }
    if settings.noise > 0.0 {
        add_noise(&mut img, settings.noise, NOISE_SEED + page_index as u64);
    }

    debug!(
        "Degraded page {} → {}x{} px",
        page_index + 1,
        img.width(),
        img.height()
    );
    img
}

/// Shrink by `factor` and stretch back to the original size.
pub fn scale_roundtrip(img: &RgbImage, factor: f32) -> RgbImage {
    let (w, h) = img.dimensions();
    let small_w = ((w as f32 * factor) as u32).max(1);
    let small_h = ((h as f32 * factor) as u32).max(1);

    let small = imageops::resize(img, small_w, small_h, FilterType::Triangle);
    imageops::resize(&small, w, h, FilterType::Triangle)
}

/// Rotate counter-clockwise by `degrees`, expanding the canvas to fit.
pub fn rotate_expand(img: &RgbImage, degrees: f32) -> RgbImage {
    let (w, h) = img.dimensions();
    let theta = degrees.to_radians();
    let (sin, cos) = (theta.sin().abs(), theta.cos().abs());

    let new_w = (w as f32 * cos + h as f32 * sin).ceil().max(1.0) as u32;
    let new_h = (w as f32 * sin + h as f32 * cos).ceil().max(1.0) as u32;

    let mut canvas = RgbImage::from_pixel(new_w, new_h, WHITE);
    let x = (new_w.saturating_sub(w) / 2) as i64;
    let y = (new_h.saturating_sub(h) / 2) as i64;
    imageops::overlay(&mut canvas, img, x, y);

    // imageproc rotates clockwise for positive angles.
    rotate_about_center(&canvas, -theta, Interpolation::Bicubic, WHITE)
}

/// Add uniform noise in `[-amp, amp]` to every channel, `amp = noise × 255`.
pub fn add_noise(img: &mut RgbImage, noise: f32, seed: u64) {
    let amp = (255.0 * noise) as i32;
    if amp <= 0 {
        return;
    }

    let mut rng = SplitMix64::new(seed);
    let span = (2 * amp + 1) as u64;
    for pixel in img.pixels_mut() {
        for channel in pixel.0.iter_mut() {
            let delta = rng.below(span) as i32 - amp;
            *channel = (*channel as i32 + delta).clamp(0, 255) as u8;
        }
    }
}

/// SplitMix64: tiny, fast, and stable across releases, which a seeded
/// test-data generator needs more than statistical strength.
struct SplitMix64 {
    state: u64,
}

impl SplitMix64 {
    fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    fn next_u64(&mut self) -> u64 {
        self.state = self.state.wrapping_add(0x9E37_79B9_7F4A_7C15);
        let mut z = self.state;
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
        z ^ (z >> 31)
    }

    /// Uniform value in `0..n` (multiply-shift range reduction).
    fn below(&mut self, n: u64) -> u64 {
        ((self.next_u64() as u128 * n as u128) >> 64) as u64
    }
}
