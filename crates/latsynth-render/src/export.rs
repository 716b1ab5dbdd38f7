//! Atomic image export.
//!
//! Images are encoded into a temporary file in the destination directory
//! and renamed into place only once encoding succeeded, so a failed write
//! never leaves a partial image behind.

use std::path::{Path, PathBuf};

use image::{ImageFormat, RgbImage};
use tempfile::NamedTempFile;

use crate::RenderError;

/// Image format implied by a path's extension.
pub fn format_for(path: &Path) -> Result<ImageFormat, RenderError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .ok_or_else(|| RenderError::UnsupportedFormat(format!("no extension on {}", path.display())))?;
    match ImageFormat::from_extension(ext) {
        Some(format) if format.writing_enabled() => Ok(format),
        _ => Err(RenderError::UnsupportedFormat(ext.to_string())),
    }
}

/// Create `dir` and its parents if absent.
pub fn ensure_dir(dir: &Path) -> Result<(), RenderError> {
    std::fs::create_dir_all(dir).map_err(|source| RenderError::Io {
        path: dir.to_path_buf(),
        source,
    })
}

/// Temporary file in `dir` whose mode, once persisted, matches a file
/// created directly (0o666 minus the process umask).
fn temp_file_in(dir: &Path) -> std::io::Result<NamedTempFile> {
    #[cfg_attr(not(unix), allow(unused_mut))]
    let mut builder = tempfile::Builder::new();
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        builder.permissions(std::fs::Permissions::from_mode(0o666));
    }
    builder.tempfile_in(dir)
}

/// Encode `img` to `path`, creating parent directories on demand.
pub fn save_image(img: &RgbImage, path: &Path) -> Result<(), RenderError> {
    let format = format_for(path)?;
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    ensure_dir(&dir)?;

    let io_err = |source: std::io::Error| RenderError::Io {
        path: path.to_path_buf(),
        source,
    };
    let mut tmp = temp_file_in(&dir).map_err(io_err)?;
    img.write_to(tmp.as_file_mut(), format)?;
    tmp.persist(path).map_err(|e| io_err(e.error))?;

    log::debug!("Wrote {}", path.display());
    Ok(())
}
