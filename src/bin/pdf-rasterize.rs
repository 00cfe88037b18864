//! CLI binary for edgequake-rasterize.
//!
//! A thin shim over the library crate that maps CLI flags
//! to `RasterizeConfig` and prints results.

use anyhow::{Context, Result};
use clap::Parser;
use edgequake_rasterize::{
    convert_to_file, default_output_path, inspect, resolve_input, ConversionProgressCallback,
    PageReport, ProgressCallback, RasterizeConfig, RasterizeError, Stage,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

const TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"];

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: a single bar that fills one step per page,
/// with a dim per-page line above it.
struct CliProgressCallback {
    bar: ProgressBar,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new(0); // length set in on_conversion_start
        let spinner_style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(TICKS);
        bar.set_style(spinner_style);
        bar.set_prefix("Preparing");
        bar.set_message("Opening PDF…");
        bar.enable_steady_tick(Duration::from_millis(80));
        Arc::new(Self { bar })
    }
}

impl ConversionProgressCallback for CliProgressCallback {
    fn on_conversion_start(&self, total_pages: usize) {
        let style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>3}/{len} pages  \
             ⏱ {elapsed_precise}  ETA {eta_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(TICKS);

        self.bar.set_length(total_pages as u64);
        self.bar.set_style(style);
        self.bar.set_prefix("Rasterising");
        self.bar.reset_eta();
    }

    fn on_page_start(&self, page_num: usize, _total: usize) {
        self.bar.set_message(format!("page {page_num}"));
    }

    fn on_page_complete(&self, page_num: usize, total: usize, report: &PageReport) {
        self.bar.println(format!(
            "  {} Page {:>3}/{:<3}  {}  {}",
            green("✓"),
            page_num,
            total,
            dim(&format!(
                "{}x{} px",
                report.output_width_px, report.output_height_px
            )),
            dim(&format!("{:>7} KiB", report.encoded_bytes / 1024)),
        ));
        self.bar.inc(1);
    }

    fn on_conversion_complete(&self, _total_pages: usize) {
        self.bar.finish_and_clear();
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Default degradation (200 DPI, 0.5 scale roundtrip, blur 2.0, JPEG q70)
  pdf-rasterize report.pdf

  # Clean image-only copy: no degradation, high JPEG quality
  pdf-rasterize --scale-factor 1 --blur 0 --jpeg-quality 95 report.pdf

  # Nasty scan: skewed, grey, noisy
  pdf-rasterize --rotate 2.5 --grayscale --noise 0.08 --jpeg-quality 30 report.pdf -o bad.pdf

  # Inspect page count and sizes only
  pdf-rasterize --inspect-only report.pdf

ENVIRONMENT VARIABLES:
  PDFIUM_LIB_PATH         Path to an existing libpdfium (skips auto-download)
  PDFIUM_AUTO_CACHE_DIR   Override the default pdfium cache directory
  RUST_LOG                Log filter (e.g. edgequake_rasterize=debug)
"#;

/// Convert a text PDF into a degraded, image-only PDF.
#[derive(Parser, Debug)]
#[command(
    name = "pdf-rasterize",
    version,
    about = "Convert a text PDF into a degraded, image-only PDF for OCR testing",
    long_about = "Render every page of a PDF to an image, optionally degrade it (resize \
roundtrip, skew, blur, grayscale, noise), and reassemble the images into a new PDF with \
no extractable text layer.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Input PDF file.
    input: PathBuf,

    /// Output PDF path (default: <input>-rasterized.pdf).
    #[arg(short, long = "out", env = "RASTERIZE_OUT")]
    out: Option<PathBuf>,

    /// Render DPI (72–600).
    #[arg(long, env = "RASTERIZE_DPI", default_value_t = 200,
          value_parser = clap::value_parser!(u32).range(72..=600))]
    dpi: u32,

    /// Downscale-then-upscale factor (0.1–1.0). 1 disables.
    #[arg(long, env = "RASTERIZE_SCALE_FACTOR", default_value_t = 0.5)]
    scale_factor: f32,

    /// Gaussian blur sigma in pixels (0–10). 0 disables.
    #[arg(long, env = "RASTERIZE_BLUR", default_value_t = 2.0)]
    blur: f32,

    /// JPEG quality (1–95). Lower = more artefacts.
    #[arg(long, env = "RASTERIZE_JPEG_QUALITY", default_value_t = 70,
          value_parser = clap::value_parser!(u8).range(1..=95))]
    jpeg_quality: u8,

    /// Counter-clockwise rotation in degrees (-10 to 10).
    #[arg(long, env = "RASTERIZE_ROTATE", default_value_t = 0.0, allow_negative_numbers = true)]
    rotate: f32,

    /// Per-channel noise amplitude as a fraction of 255 (0–0.5).
    #[arg(long, env = "RASTERIZE_NOISE", default_value_t = 0.0)]
    noise: f32,

    /// Convert pages to grayscale (still stored as RGB JPEG).
    #[arg(long, env = "RASTERIZE_GRAYSCALE")]
    grayscale: bool,

    /// Cap on the longest rendered edge in pixels.
    #[arg(long, env = "RASTERIZE_MAX_PIXELS", default_value_t = 10_000)]
    max_pixels: u32,

    /// PDF user password for encrypted documents.
    #[arg(long, env = "RASTERIZE_PASSWORD")]
    password: Option<String>,

    /// Print PDF metadata only, no conversion.
    #[arg(long)]
    inspect_only: bool,

    /// Print results as JSON.
    #[arg(long, env = "RASTERIZE_JSON")]
    json: bool,

    /// Disable progress bar.
    #[arg(long, env = "RASTERIZE_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "RASTERIZE_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "RASTERIZE_QUIET")]
    quiet: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(&cli);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let stage = failed_stage(&err);
            eprintln!("{} {} failed: {:#}", red("✘"), bold(&stage.to_string()), err);
            ExitCode::FAILURE
        }
    }
}

/// Stage of the first [`RasterizeError`] in the chain; anything else is setup.
fn failed_stage(err: &anyhow::Error) -> Stage {
    err.chain()
        .find_map(|e| e.downcast_ref::<RasterizeError>())
        .map(RasterizeError::stage)
        .unwrap_or(Stage::Setup)
}

fn show_progress(cli: &Cli) -> bool {
    !cli.quiet && !cli.no_progress && !cli.json && !cli.inspect_only
}

fn init_logging(cli: &Cli) {
    // The progress bar provides all the feedback that matters, so INFO logs
    // are silenced while it is shown.
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress(cli) {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();
}

fn run(cli: &Cli) -> Result<()> {
    // Reject bad paths before PDFium is provisioned.
    resolve_input(&cli.input)?;
    ensure_pdfium(cli.quiet)?;

    // ── Inspect-only mode ────────────────────────────────────────────────
    if cli.inspect_only {
        let meta = inspect(&cli.input, cli.password.as_deref()).context("Failed to inspect PDF")?;

        if cli.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&meta).context("Failed to serialize metadata")?
            );
        } else {
            println!("File:         {}", cli.input.display());
            if let Some(ref t) = meta.title {
                println!("Title:        {}", t);
            }
            if let Some(ref a) = meta.author {
                println!("Author:       {}", a);
            }
            println!("Pages:        {}", meta.page_count);
            println!("PDF Version:  {}", meta.pdf_version);
            if let Some(ref p) = meta.producer {
                println!("Producer:     {}", p);
            }
            for (i, (w, h)) in meta.page_sizes_pt.iter().enumerate() {
                println!(
                    "  page {:>3}:   {:.1} x {:.1} pt ({:.2} x {:.2} in)",
                    i + 1,
                    w,
                    h,
                    w / 72.0,
                    h / 72.0
                );
            }
        }
        return Ok(());
    }

    // ── Build config ─────────────────────────────────────────────────────
    let progress_cb: Option<ProgressCallback> = if show_progress(cli) {
        Some(CliProgressCallback::new() as Arc<dyn ConversionProgressCallback>)
    } else {
        None
    };
    let config = build_config(cli, progress_cb)?;

    // ── Run conversion ───────────────────────────────────────────────────
    let out_path = cli
        .out
        .clone()
        .unwrap_or_else(|| default_output_path(&cli.input));

    let output = convert_to_file(&cli.input, &out_path, &config).context("Conversion failed")?;

    if cli.json {
        let json = serde_json::to_string_pretty(&output).context("Failed to serialise output")?;
        println!("{json}");
    } else {
        println!("Wrote: {}", output.output_path.display());
        if !cli.quiet {
            eprintln!(
                "{}  {} pages  {}ms  {}",
                green("✔"),
                output.stats.total_pages,
                output.stats.total_duration_ms,
                dim(&format!(
                    "{} KiB of page images",
                    output.stats.total_encoded_bytes / 1024
                )),
            );
        }
    }

    Ok(())
}

/// Make sure a pdfium library is available, downloading it on first run.
fn ensure_pdfium(quiet: bool) -> Result<()> {
    if pdfium_auto::is_pdfium_cached() || pdfium_auto::is_system_pdfium_available() {
        return Ok(());
    }

    if quiet {
        pdfium_auto::ensure_pdfium_library(None).context("Failed to download PDFium engine")?;
        return Ok(());
    }

    let dl_bar = ProgressBar::new(0);
    dl_bar.set_style(
        ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {bytes}/{total_bytes}  ETA {eta_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(TICKS),
    );
    dl_bar.set_prefix("PDF engine");
    dl_bar.enable_steady_tick(Duration::from_millis(80));

    let bar = dl_bar.clone();
    pdfium_auto::ensure_pdfium_library(Some(&|downloaded, total| {
        if let Some(t) = total {
            if bar.length().unwrap_or(0) != t {
                bar.set_length(t);
            }
        }
        bar.set_position(downloaded);
    }))
    .context("Failed to download PDFium engine")?;

    dl_bar.finish_with_message("ready ✓");
    Ok(())
}

/// Map CLI args to `RasterizeConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<RasterizeConfig> {
    let mut builder = RasterizeConfig::builder()
        .dpi(cli.dpi)
        .max_rendered_pixels(cli.max_pixels)
        .scale_factor(cli.scale_factor)
        .blur_radius(cli.blur)
        .jpeg_quality(cli.jpeg_quality)
        .rotate_degrees(cli.rotate)
        .noise(cli.noise)
        .grayscale(cli.grayscale);

    if let Some(ref pwd) = cli.password {
        builder = builder.password(pwd.clone());
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}
