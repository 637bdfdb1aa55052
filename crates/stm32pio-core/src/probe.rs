//! # Project Probes
//!
//! Read-only questions the predicate set asks about a project directory.
//!
//! Every fallible probe returns a `Result`; deciding what an error means for a
//! stage is left to [`crate::state`], which folds errors into `false`.

use crate::Stm32pioError;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Read-only view of a project used to evaluate stage conditions.
///
/// Paths passed as `relative` are relative to the project root.
/// Implementations must not mutate anything.
pub trait ProjectProbe {
    /// Whether the resolved `.ioc` descriptor is a regular file.
    fn ioc_is_file(&self) -> bool;

    /// Whether the persisted stm32pio config is a regular file.
    fn config_is_file(&self) -> bool;

    /// Whether `relative` resolves to a directory.
    fn is_dir(&self, relative: &str) -> bool;

    /// Entries of the directory at `relative`.
    fn list_dir(&self, relative: &str) -> Result<Vec<PathBuf>, Stm32pioError>;

    /// `platformio.ini` exists, parses and has at least one section.
    fn platformio_initialized(&self) -> Result<bool, Stm32pioError>;

    /// Every key of the configured patch is present in `platformio.ini` with an equal value.
    fn platformio_patched(&self) -> Result<bool, Stm32pioError>;

    /// Whether any file below `relative` (recursively) has `marker` in its name.
    fn tree_has_file_named(&self, relative: &str, marker: &str) -> Result<bool, Stm32pioError>;
}

// =============================================================================
// FILESYSTEM HELPERS
// =============================================================================

/// List the entries of `dir`, sorted for determinism.
pub fn list_entries(dir: &Path) -> Result<Vec<PathBuf>, Stm32pioError> {
    let reader = std::fs::read_dir(dir).map_err(|e| io_error(dir, &e))?;
    let mut entries = Vec::new();
    for entry in reader {
        let entry = entry.map_err(|e| io_error(dir, &e))?;
        entries.push(entry.path());
    }
    entries.sort();
    Ok(entries)
}

/// Walk `root` recursively looking for a file whose name contains `marker`.
///
/// A missing `root` is not an error: it simply contains nothing.
pub fn tree_has_file_named(root: &Path, marker: &str) -> Result<bool, Stm32pioError> {
    if !root.is_dir() {
        return Ok(false);
    }
    for entry in WalkDir::new(root).follow_links(false) {
        let entry = entry.map_err(|e| Stm32pioError::IoError(format!("{:?}: {}", root, e)))?;
        if entry.file_type().is_file() && entry.file_name().to_string_lossy().contains(marker) {
            return Ok(true);
        }
    }
    Ok(false)
}

/// Convert an I/O error into a path-qualified [`Stm32pioError::IoError`].
pub(crate) fn io_error(path: &Path, err: &std::io::Error) -> Stm32pioError {
    match err.kind() {
        ErrorKind::NotFound => Stm32pioError::IoError(format!("{:?} not found", path)),
        _ => Stm32pioError::IoError(format!("{:?}: {}", path, err)),
    }
}
