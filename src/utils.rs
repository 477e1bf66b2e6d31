//! Utility functions for file naming and writing

use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Name used when sanitizing leaves nothing behind
const FALLBACK_NAME: &str = "column";

/// Turn an arbitrary name into a filesystem-safe file or directory name
///
/// Non-ASCII characters are dropped, path separators and whitespace runs
/// become a single `_`, anything outside `[A-Za-z0-9_.-]` is removed, and
/// leading/trailing `.` and `_` are stripped. An empty result becomes
/// `"column"`.
///
/// # Examples
///
/// ```
/// use sheet_image_dl::utils::sanitize_filename;
///
/// assert_eq!(sanitize_filename("Head shot (main)"), "Head_shot_main");
/// assert_eq!(sanitize_filename("../../etc/passwd"), "etc_passwd");
/// ```
pub fn sanitize_filename(name: &str) -> String {
    let spaced: String = name
        .chars()
        .filter(char::is_ascii)
        .map(|c| if c == '/' || c == '\\' { ' ' } else { c })
        .collect();

    let joined = spaced.split_whitespace().collect::<Vec<_>>().join("_");

    let kept: String = joined
        .chars()
        .filter(|&c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
        .collect();

    let trimmed = kept.trim_matches(|c| c == '.' || c == '_');
    if trimmed.is_empty() {
        FALLBACK_NAME.to_string()
    } else {
        trimmed.to_string()
    }
}

/// Build the delivered filename for the `sequence`-th file of a column
pub fn sequence_filename(column: &str, sequence: usize, extension: &str) -> String {
    format!("{}_{sequence:03}.{extension}", sanitize_filename(column))
}

/// Write `bytes` to `path` atomically
///
/// The data goes to a temporary file in the destination directory first and is
/// renamed into place once fully written, so readers never observe a partial
/// file. An existing file at `path` is replaced.
///
/// # Errors
///
/// Returns the underlying I/O error if the parent directory is missing, the
/// temporary file cannot be written, or the final rename fails.
pub fn write_file_atomic(path: &Path, bytes: &[u8]) -> std::io::Result<PathBuf> {
    let parent = path.parent().ok_or_else(|| {
        std::io::Error::other(format!(
            "cannot determine parent directory for {}",
            path.display()
        ))
    })?;

    let mut temp = NamedTempFile::new_in(parent)?;
    temp.write_all(bytes)?;
    temp.flush()?;
    temp.persist(path).map_err(|e| e.error)?;

    Ok(path.to_path_buf())
}
