//! Input validation: turn a user-supplied path into a readable PDF file path.
//!
//! pdfium reports every open failure as a generic "format error", which tells
//! the user nothing about a typo or a directory passed by mistake. Checking
//! existence, file type, permissions and the `%PDF` magic bytes up front gives
//! each case its own [`RasterizeError`] before pdfium is even bound.

use crate::error::RasterizeError;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Validate a local input path and return it as an owned `PathBuf`.
pub fn resolve_input(input: impl AsRef<Path>) -> Result<PathBuf, RasterizeError> {
    let path = input.as_ref().to_path_buf();

    let meta = match std::fs::metadata(&path) {
        Ok(m) => m,
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            return Err(RasterizeError::PermissionDenied { path });
        }
        Err(_) => return Err(RasterizeError::FileNotFound { path }),
    };

    if !meta.is_file() {
        return Err(RasterizeError::NotAFile { path });
    }

    match std::fs::File::open(&path) {
        Ok(mut f) => {
            let mut magic = [0u8; 4];
            if f.read_exact(&mut magic).is_ok() && &magic != b"%PDF" {
                return Err(RasterizeError::NotAPdf { path, magic });
            }
        }
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            return Err(RasterizeError::PermissionDenied { path });
        }
        Err(_) => {
            return Err(RasterizeError::FileNotFound { path });
        }
    }

    debug!("Resolved local PDF: {}", path.display());
    Ok(path)
}

/// Reject an output path that would overwrite the input document.
pub fn check_distinct_output(input: &Path, output: &Path) -> Result<(), RasterizeError> {
    let same = match (input.canonicalize(), output.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => input == output,
    };
    if same {
        return Err(RasterizeError::InvalidConfig(format!(
            "output path '{}' is the input file",
            output.display()
        )));
    }
    Ok(())
}
