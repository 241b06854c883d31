//! Helpers for OCR engines that run as command-line processes.

use {
    anyhow::{Context, Result},
    std::path::PathBuf,
    tempfile::NamedTempFile,
};

/// Find a binary at an explicit path or in PATH.
///
/// If `config_path` is Some, it's checked first. If None or not found,
/// searches the system PATH.
pub fn find_binary(name: &str, config_path: Option<&str>) -> Option<PathBuf> {
    if let Some(path_str) = config_path {
        let path = expand_tilde(path_str);
        if path.is_file() {
            return Some(path);
        }
    }

    which::which(name).ok()
}

/// Expand `~` to the user's home directory.
pub fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/")
        && let Some(home) = dirs::home_dir()
    {
        return home.join(stripped);
    }
    PathBuf::from(path)
}

/// Write image data to a uniquely named temporary file.
///
/// The file is removed when the returned handle is dropped, so concurrent
/// messages never share a path.
pub fn write_temp_image(image: &[u8]) -> Result<NamedTempFile> {
    let ext = sweeney_media::image_ops::guess_extension(image);
    let temp_file = NamedTempFile::with_suffix(format!(".{ext}"))
        .context("failed to create temp image file")?;

    std::fs::write(temp_file.path(), image).context("failed to write image to temp file")?;

    Ok(temp_file)
}
