//! # pdfium-auto
//!
//! Find a usable [PDFium](https://pdfium.googlesource.com/pdfium/) shared
//! library for `pdfium-render`, downloading and caching one when none is
//! installed.
//!
//! ## Resolution order
//!
//! [`ensure_pdfium_library`] returns the first match of:
//!
//! 1. `PDFIUM_LIB_PATH`, if it points to an existing file.
//! 2. The per-version cache, `<cache dir>/edgequake-rasterize/pdfium-{VERSION}/`.
//! 3. A fresh download of the platform archive from
//!    [bblanchon/pdfium-binaries](https://github.com/bblanchon/pdfium-binaries),
//!    extracted into the cache.
//!
//! [`bind_pdfium_silent`] additionally tries the system library (e.g. a
//! distro-packaged `libpdfium.so` on the loader path) before downloading.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use pdfium_auto::{bind_pdfium_from_path, ensure_pdfium_library};
//!
//! let path = ensure_pdfium_library(Some(&|downloaded, total| {
//!     if let Some(t) = total {
//!         eprint!("\rDownloading PDFium: {}/{} bytes", downloaded, t);
//!     }
//! })).expect("download failed");
//! let pdfium = bind_pdfium_from_path(&path).expect("bind failed");
//! ```
//!
//! ## Environment variable overrides
//!
//! - `PDFIUM_LIB_PATH`: path to an existing pdfium library; skips download.
//! - `PDFIUM_AUTO_CACHE_DIR`: override the default cache directory.

use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use pdfium_render::prelude::Pdfium;
use thiserror::Error;
use tracing::{debug, info, warn};

// ── Public constants ─────────────────────────────────────────────────────────

/// The pdfium-binaries release tag used for downloads.
pub const PDFIUM_VERSION: &str = "7690";

/// Directory name under the platform cache dir.
pub const CACHE_NAMESPACE: &str = "edgequake-rasterize";

const BASE_URL: &str = "https://github.com/bblanchon/pdfium-binaries/releases/download";

/// Size of one read while streaming the archive.
const CHUNK_SIZE: usize = 64 * 1024;

// ── Error type ───────────────────────────────────────────────────────────────

/// Errors returned by pdfium-auto operations.
#[derive(Error, Debug)]
pub enum PdfiumAutoError {
    /// The current OS/architecture combination has no prebuilt archive.
    #[error("Unsupported platform: {os}/{arch}")]
    UnsupportedPlatform { os: String, arch: String },

    /// Could not create or navigate the local cache directory.
    #[error("Cache directory error: {0}")]
    CacheDir(#[source] std::io::Error),

    /// Network download failed.
    #[error("Download failed: {0}")]
    Download(String),

    /// gzip/tar extraction failed.
    #[error("Archive extraction failed: {0}")]
    Extract(String),

    /// `pdfium-render` could not load the library.
    #[error("Failed to bind PDFium from '{path}': {reason}")]
    Bind { path: PathBuf, reason: String },
}

// ── Platform metadata ────────────────────────────────────────────────────────

/// Where to find the library for one OS/arch pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlatformAsset {
    /// Asset filename in the GitHub release, e.g. `pdfium-linux-x64.tgz`.
    pub archive_name: &'static str,
    /// Path of the library inside the archive.
    pub path_in_archive: &'static str,
    /// Filename written to the cache.
    pub lib_name: &'static str,
}

const MAC_LIB: (&str, &str) = ("lib/libpdfium.dylib", "libpdfium.dylib");
const LINUX_LIB: (&str, &str) = ("lib/libpdfium.so", "libpdfium.so");
const WIN_LIB: (&str, &str) = ("bin/pdfium.dll", "pdfium.dll");

/// Look up the release asset for `os`/`arch` as named by `std::env::consts`.
pub fn platform_asset(os: &str, arch: &str) -> Result<PlatformAsset, PdfiumAutoError> {
    let (archive_name, (path_in_archive, lib_name)) = match (os, arch) {
        ("macos", "aarch64") => ("pdfium-mac-arm64.tgz", MAC_LIB),
        ("macos", "x86_64") => ("pdfium-mac-x64.tgz", MAC_LIB),
        ("linux", "x86_64") => ("pdfium-linux-x64.tgz", LINUX_LIB),
        ("linux", "aarch64") => ("pdfium-linux-arm64.tgz", LINUX_LIB),
        ("windows", "x86_64") => ("pdfium-win-x64.tgz", WIN_LIB),
        ("windows", "aarch64") => ("pdfium-win-arm64.tgz", WIN_LIB),
        ("windows", "x86") => ("pdfium-win-x86.tgz", WIN_LIB),
        (os, arch) => {
            return Err(PdfiumAutoError::UnsupportedPlatform {
                os: os.to_string(),
                arch: arch.to_string(),
            })
        }
    };
    Ok(PlatformAsset {
        archive_name,
        path_in_archive,
        lib_name,
    })
}

fn current_platform() -> Result<PlatformAsset, PdfiumAutoError> {
    platform_asset(std::env::consts::OS, std::env::consts::ARCH)
}

// ── Cache directory resolution ───────────────────────────────────────────────

/// Per-version cache directory for the PDFium library.
///
/// `PDFIUM_AUTO_CACHE_DIR` replaces the platform cache dir (and namespace).
pub fn pdfium_cache_dir() -> PathBuf {
    let version_dir = format!("pdfium-{PDFIUM_VERSION}");
    if let Ok(override_dir) = std::env::var("PDFIUM_AUTO_CACHE_DIR") {
        return PathBuf::from(override_dir).join(version_dir);
    }

    dirs::cache_dir()
        .or_else(|| dirs::home_dir().map(|h| h.join(".cache")))
        .unwrap_or_else(std::env::temp_dir)
        .join(CACHE_NAMESPACE)
        .join(version_dir)
}

static RESOLVED_PATH: OnceLock<PathBuf> = OnceLock::new();

// ── Public API ───────────────────────────────────────────────────────────────

/// Path of an already-available library (env override or cache), if any.
///
/// Never touches the network.
pub fn cached_pdfium_path() -> Option<PathBuf> {
    if let Some(p) = env_override() {
        return Some(p);
    }
    let asset = current_platform().ok()?;
    let p = pdfium_cache_dir().join(asset.lib_name);
    p.exists().then_some(p)
}

/// `true` when [`ensure_pdfium_library`] would not need the network.
pub fn is_pdfium_cached() -> bool {
    cached_pdfium_path().is_some()
}

/// `true` when a PDFium library can be loaded from the system loader path.
pub fn is_system_pdfium_available() -> bool {
    Pdfium::bind_to_system_library().is_ok()
}

/// Return a path to the PDFium library, downloading it if necessary.
///
/// `on_progress` receives `(bytes_downloaded, total_bytes)` during a download.
/// The resolved path is memoised for the rest of the process.
pub fn ensure_pdfium_library(
    on_progress: Option<&dyn Fn(u64, Option<u64>)>,
) -> Result<PathBuf, PdfiumAutoError> {
    if let Some(path) = RESOLVED_PATH.get() {
        return Ok(path.clone());
    }

    let path = match cached_pdfium_path() {
        Some(p) => p,
        None => download_to_cache(on_progress)?,
    };
    debug!("Using PDFium library at {}", path.display());

    // A concurrent caller may have won the race; both paths are equivalent.
    let _ = RESOLVED_PATH.set(path.clone());
    Ok(path)
}

/// Bind to PDFium without progress output.
///
/// Order: env override / cache, then the system library, then download.
pub fn bind_pdfium_silent() -> Result<Pdfium, PdfiumAutoError> {
    if let Some(path) = RESOLVED_PATH.get().cloned().or_else(cached_pdfium_path) {
        return bind_pdfium_from_path(&path);
    }

    if let Ok(bindings) = Pdfium::bind_to_system_library() {
        debug!("Bound to system PDFium library");
        return Ok(Pdfium::new(bindings));
    }

    let path = ensure_pdfium_library(None)?;
    bind_pdfium_from_path(&path)
}

/// Bind to a PDFium library at an explicit `path`.
pub fn bind_pdfium_from_path(path: &Path) -> Result<Pdfium, PdfiumAutoError> {
    Pdfium::bind_to_library(path)
        .map(Pdfium::new)
        .map_err(|e| PdfiumAutoError::Bind {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
}

// ── Internal helpers ─────────────────────────────────────────────────────────

fn env_override() -> Option<PathBuf> {
    let raw = std::env::var("PDFIUM_LIB_PATH").ok()?;
    let p = PathBuf::from(raw);
    if p.exists() {
        Some(p)
    } else {
        warn!(
            "PDFIUM_LIB_PATH '{}' does not exist; ignoring it",
            p.display()
        );
        None
    }
}

/// Release URL of the archive for `asset`.
pub fn download_url(asset: &PlatformAsset) -> String {
    format!(
        "{}/chromium%2F{}/{}",
        BASE_URL, PDFIUM_VERSION, asset.archive_name
    )
}

fn download_to_cache(
    on_progress: Option<&dyn Fn(u64, Option<u64>)>,
) -> Result<PathBuf, PdfiumAutoError> {
    let asset = current_platform()?;
    let cache_dir = pdfium_cache_dir();
    let lib_path = cache_dir.join(asset.lib_name);

    std::fs::create_dir_all(&cache_dir).map_err(PdfiumAutoError::CacheDir)?;

    let url = download_url(&asset);
    info!("Downloading PDFium {} from {}", PDFIUM_VERSION, url);
    let archive = download_bytes(&url, on_progress)?;

    // Extract next to the final name and rename, so an interrupted run never
    // leaves a truncated library that later looks "cached".
    let partial = cache_dir.join(format!("{}.partial", asset.lib_name));
    extract_file(&archive, asset.path_in_archive, &partial)?;
    std::fs::rename(&partial, &lib_path).map_err(PdfiumAutoError::CacheDir)?;

    info!("PDFium cached at {}", lib_path.display());
    Ok(lib_path)
}

/// Stream a URL into memory, reporting progress after every chunk.
fn download_bytes(
    url: &str,
    on_progress: Option<&dyn Fn(u64, Option<u64>)>,
) -> Result<Vec<u8>, PdfiumAutoError> {
    let client = reqwest::blocking::Client::builder()
        .user_agent(concat!("pdfium-auto/", env!("CARGO_PKG_VERSION")))
        .redirect(reqwest::redirect::Policy::limited(5))
        .build()
        .map_err(|e| PdfiumAutoError::Download(e.to_string()))?;

    let mut response = client
        .get(url)
        .send()
        .map_err(|e| PdfiumAutoError::Download(format!("GET {url}: {e}")))?;

    if !response.status().is_success() {
        return Err(PdfiumAutoError::Download(format!(
            "HTTP {} for {url}",
            response.status()
        )));
    }

    let total = response.content_length();
    let mut buf = Vec::with_capacity(total.unwrap_or(0) as usize);
    let mut chunk = vec![0u8; CHUNK_SIZE];

    loop {
        match response.read(&mut chunk) {
            Ok(0) => break,
            Ok(n) => {
                buf.extend_from_slice(&chunk[..n]);
                if let Some(cb) = on_progress {
                    cb(buf.len() as u64, total);
                }
            }
            Err(ref e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(PdfiumAutoError::Download(format!("Read error: {e}"))),
        }
    }

    Ok(buf)
}

/// Extract the single entry `name` from a `.tgz` archive into `dest`.
fn extract_file(archive_bytes: &[u8], name: &str, dest: &Path) -> Result<(), PdfiumAutoError> {
    use flate2::read::GzDecoder;
    use tar::Archive;

    let extract_err = |e: std::io::Error| PdfiumAutoError::Extract(e.to_string());
    let mut archive = Archive::new(GzDecoder::new(archive_bytes));

    for entry in archive.entries().map_err(extract_err)? {
        let mut entry = entry.map_err(extract_err)?;
        let matches = entry.path().map_err(extract_err)?.to_string_lossy() == name;
        if matches {
            entry
                .unpack(dest)
                .map_err(|e| PdfiumAutoError::Extract(format!("Unpack failed: {e}")))?;
            return Ok(());
        }
    }

    Err(PdfiumAutoError::Extract(format!(
        "'{name}' not found in archive"
    )))
}

// ── Tests ─────────────────────────────────────────────────────────────────────
