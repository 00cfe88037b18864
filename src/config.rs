//! Configuration types for PDF rasterisation.
//!
//! All conversion behaviour is controlled through [`RasterizeConfig`], built
//! via its [`RasterizeConfigBuilder`]. The degradation knobs live in their own
//! [`DegradeSettings`] struct so the degrade stage only sees what it needs and
//! the exact settings of a run can be serialised next to its output.
//!
//! Setters clamp values into their supported ranges instead of failing, so a
//! CLI user asking for `--dpi 2000` gets 600 DPI rather than an error.
//! [`RasterizeConfigBuilder::build`] only rejects what clamping cannot fix
//! (non-finite floats).

use crate::error::RasterizeError;
use crate::progress::ProgressCallback;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Supported DPI range.
pub const DPI_RANGE: (u32, u32) = (72, 600);
/// Supported scale-factor range.
pub const SCALE_FACTOR_RANGE: (f32, f32) = (0.1, 1.0);
/// Supported blur sigma range.
pub const BLUR_RANGE: (f32, f32) = (0.0, 10.0);
/// Supported JPEG quality range.
pub const JPEG_QUALITY_RANGE: (u8, u8) = (1, 95);
/// Supported rotation range in degrees.
pub const ROTATE_RANGE: (f32, f32) = (-10.0, 10.0);
/// Supported noise amplitude range (fraction of 255).
pub const NOISE_RANGE: (f32, f32) = (0.0, 0.5);

/// Suffix appended to the input stem when no output path is given.
pub const OUTPUT_SUFFIX: &str = "-rasterized";

/// Per-page image degradation applied after rendering.
///
/// Filters run in a fixed order: scale roundtrip, rotation, blur, grayscale,
/// noise. Each one is a no-op at its neutral value (`scale_factor = 1.0`,
/// `rotate_degrees = 0.0`, `blur_radius = 0.0`, `grayscale = false`,
/// `noise = 0.0`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DegradeSettings {
    /// Downscale factor for the down-then-up resize roundtrip. Default: 0.5.
    ///
    /// The page is shrunk to `scale_factor` of its rendered size with bilinear
    /// filtering and stretched back, which smears glyph edges the way a cheap
    /// scanner does while keeping the final pixel size unchanged.
    pub scale_factor: f32,

    /// Gaussian blur sigma in pixels. Default: 2.0.
    pub blur_radius: f32,

    /// JPEG quality of the embedded page image. Default: 70.
    ///
    /// Lower values add blocking and ringing artefacts around text.
    pub jpeg_quality: u8,

    /// Counter-clockwise skew in degrees. Default: 0.0.
    pub rotate_degrees: f32,

    /// Per-channel uniform noise amplitude as a fraction of 255. Default: 0.0.
    pub noise: f32,

    /// Drop colour information. Default: false.
    pub grayscale: bool,
}

impl Default for DegradeSettings {
    fn default() -> Self {
        Self {
            scale_factor: 0.5,
            blur_radius: 2.0,
            jpeg_quality: 70,
            rotate_degrees: 0.0,
            noise: 0.0,
            grayscale: false,
        }
    }
}

impl DegradeSettings {
    /// Settings that leave the rendered page untouched apart from JPEG encoding.
    pub fn none() -> Self {
        Self {
            scale_factor: 1.0,
            blur_radius: 0.0,
            jpeg_quality: JPEG_QUALITY_RANGE.1,
            rotate_degrees: 0.0,
            noise: 0.0,
            grayscale: false,
        }
    }
}

/// Configuration for a rasterisation run.
///
/// Built via [`RasterizeConfig::builder()`] or using
/// [`RasterizeConfig::default()`].
///
/// # Example
/// ```rust
/// use edgequake_rasterize::RasterizeConfig;
///
/// let config = RasterizeConfig::builder()
///     .dpi(150)
///     .blur_radius(1.0)
///     .noise(0.05)
///     .build()
///     .unwrap();
/// assert_eq!(config.dpi, 150);
/// ```
#[derive(Clone)]
pub struct RasterizeConfig {
    /// Rendering DPI. Range: 72–600. Default: 200.
    pub dpi: u32,

    /// Maximum rendered image dimension (width or height) in pixels. Default: 10 000.
    ///
    /// A safety cap independent of DPI: a 600-DPI render of an A0 poster would
    /// otherwise allocate a ~20 000 × 28 000 px bitmap. The other dimension is
    /// scaled proportionally.
    pub max_rendered_pixels: u32,

    /// Degradation applied to every page.
    pub degrade: DegradeSettings,

    /// PDF user password for encrypted documents.
    pub password: Option<String>,

    /// Optional per-page progress events.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for RasterizeConfig {
    fn default() -> Self {
        Self {
            dpi: 200,
            max_rendered_pixels: 10_000,
            degrade: DegradeSettings::default(),
            password: None,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for RasterizeConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RasterizeConfig")
            .field("dpi", &self.dpi)
            .field("max_rendered_pixels", &self.max_rendered_pixels)
            .field("degrade", &self.degrade)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field(
                "progress_callback",
                &self
                    .progress_callback
                    .as_ref()
                    .map(|_| "<dyn ConversionProgressCallback>"),
            )
            .finish()
    }
}

impl RasterizeConfig {
    /// Create a new builder for `RasterizeConfig`.
    pub fn builder() -> RasterizeConfigBuilder {
        RasterizeConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`RasterizeConfig`].
#[derive(Debug)]
pub struct RasterizeConfigBuilder {
    config: RasterizeConfig,
}

impl RasterizeConfigBuilder {
    pub fn dpi(mut self, dpi: u32) -> Self {
        self.config.dpi = dpi.clamp(DPI_RANGE.0, DPI_RANGE.1);
        self
    }

    pub fn max_rendered_pixels(mut self, px: u32) -> Self {
        self.config.max_rendered_pixels = px.max(100);
        self
    }

    pub fn scale_factor(mut self, s: f32) -> Self {
        self.config.degrade.scale_factor = clamp_f32(s, SCALE_FACTOR_RANGE);
        self
    }

    pub fn blur_radius(mut self, r: f32) -> Self {
        self.config.degrade.blur_radius = clamp_f32(r, BLUR_RANGE);
        self
    }

    pub fn jpeg_quality(mut self, q: u8) -> Self {
        self.config.degrade.jpeg_quality = q.clamp(JPEG_QUALITY_RANGE.0, JPEG_QUALITY_RANGE.1);
        self
    }

    pub fn rotate_degrees(mut self, deg: f32) -> Self {
        self.config.degrade.rotate_degrees = clamp_f32(deg, ROTATE_RANGE);
        self
    }

    pub fn noise(mut self, n: f32) -> Self {
        self.config.degrade.noise = clamp_f32(n, NOISE_RANGE);
        self
    }

    pub fn grayscale(mut self, v: bool) -> Self {
        self.config.degrade.grayscale = v;
        self
    }

    /// Replace all degradation settings at once (values are clamped).
    pub fn degrade(self, settings: DegradeSettings) -> Self {
        self.scale_factor(settings.scale_factor)
            .blur_radius(settings.blur_radius)
            .jpeg_quality(settings.jpeg_quality)
            .rotate_degrees(settings.rotate_degrees)
            .noise(settings.noise)
            .grayscale(settings.grayscale)
    }

    pub fn password(mut self, pwd: impl Into<String>) -> Self {
        self.config.password = Some(pwd.into());
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<RasterizeConfig, RasterizeError> {
        let d = &self.config.degrade;
        for (name, value) in [
            ("scale_factor", d.scale_factor),
            ("blur_radius", d.blur_radius),
            ("rotate_degrees", d.rotate_degrees),
            ("noise", d.noise),
        ] {
            if !value.is_finite() {
                return Err(RasterizeError::InvalidConfig(format!(
                    "{name} must be a finite number, got {value}"
                )));
            }
        }
        Ok(self.config)
    }
}

/// Clamp a float into `range`, passing NaN through so `build()` can reject it.
fn clamp_f32(v: f32, range: (f32, f32)) -> f32 {
    if v.is_nan() {
        v
    } else {
        v.clamp(range.0, range.1)
    }
}

/// Derive the default output path: `<dir>/<stem>-rasterized.pdf`.
pub fn default_output_path(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());
    let name = format!("{stem}{OUTPUT_SUFFIX}.pdf");
    match input.parent() {
        Some(parent) => parent.join(name),
        None => PathBuf::from(name),
    }
}
