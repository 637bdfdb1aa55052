//! # STM32CubeMX Inputs
//!
//! Locating and inspecting the `.ioc` hardware descriptor, and rendering the
//! script CubeMX runs in headless mode.

use crate::Stm32pioError;
use crate::primitives::{
    IOC_EXTENSION, IOC_PATH_PLACEHOLDER, PROJECT_PATH_PLACEHOLDER, REQUIRED_TOOLCHAIN,
};
use crate::probe::list_entries;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

// =============================================================================
// LOCATING
// =============================================================================

/// Result of searching a project directory for its `.ioc` file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IocLocation {
    /// The chosen descriptor.
    pub path: PathBuf,
    /// How many `.ioc` candidates were seen (more than one deserves a warning).
    pub candidates: usize,
}

/// Whether `path` carries the `.ioc` extension (any case).
#[must_use]
pub fn has_ioc_extension(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.to_string_lossy().eq_ignore_ascii_case(IOC_EXTENSION))
}

/// Find the descriptor of the project in `project_dir`.
///
/// `configured` (relative or absolute) wins if it names an existing file;
/// otherwise the directory is scanned and the first `.ioc` in sorted order is taken.
pub fn locate_ioc(project_dir: &Path, configured: &str) -> Result<IocLocation, Stm32pioError> {
    if !configured.trim().is_empty() {
        let path = project_dir.join(configured.trim());
        if path.is_file() {
            return Ok(IocLocation {
                path,
                candidates: 1,
            });
        }
    }

    let candidates: Vec<PathBuf> = list_entries(project_dir)?
        .into_iter()
        .filter(|path| path.is_file() && has_ioc_extension(path))
        .collect();

    match candidates.first() {
        Some(first) => Ok(IocLocation {
            path: first.clone(),
            candidates: candidates.len(),
        }),
        None => Err(Stm32pioError::IocNotFound(project_dir.to_path_buf())),
    }
}

// =============================================================================
// INSPECTION
// =============================================================================

/// Parsed `.ioc` descriptor (Java-properties style `key=value` lines).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IocFile {
    properties: BTreeMap<String, String>,
}

impl IocFile {
    /// Parse descriptor text. Comments (`#`) and lines without `=` are skipped.
    #[must_use]
    pub fn parse(text: &str) -> Self {
        let properties = text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .filter_map(|line| line.split_once('='))
            .map(|(key, value)| (key.trim().to_string(), unescape(value.trim())))
            .collect();
        Self { properties }
    }

    /// Read and parse the descriptor at `path`.
    pub fn read(path: &Path) -> Result<Self, Stm32pioError> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| Stm32pioError::IoError(format!("Read {:?}: {}", path, e)))?;
        Ok(Self::parse(&text))
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.properties.get(key).map(String::as_str)
    }

    /// MCU part name, e.g. `STM32F031K6Tx`.
    #[must_use]
    pub fn mcu(&self) -> Option<&str> {
        self.get("Mcu.UserName")
    }

    /// Problems that would make the generated code unusable for PlatformIO.
    #[must_use]
    pub fn inspect(&self) -> Vec<String> {
        let mut warnings = Vec::new();
        match self.get("ProjectManager.TargetToolchain") {
            Some(REQUIRED_TOOLCHAIN) => {}
            Some(other) => warnings.push(format!(
                "Toolchain is '{}', PlatformIO needs '{}'",
                other, REQUIRED_TOOLCHAIN
            )),
            None => warnings.push(format!(
                "No toolchain set, PlatformIO needs '{}'",
                REQUIRED_TOOLCHAIN
            )),
        }
        if self.mcu().is_none() {
            warnings.push("No MCU name (Mcu.UserName) in the .ioc file".to_string());
        }
        warnings
    }
}

/// `.ioc` files escape `:` and `=` the Java-properties way.
fn unescape(value: &str) -> String {
    value.replace("\\:", ":").replace("\\=", "=")
}

// =============================================================================
// SCRIPT
// =============================================================================

/// Substitute the descriptor and project paths into a CubeMX script template.
#[must_use]
pub fn render_script(template: &str, ioc_path: &Path, project_dir: &Path) -> String {
    template
        .replace(IOC_PATH_PLACEHOLDER, &ioc_path.to_string_lossy())
        .replace(PROJECT_PATH_PLACEHOLDER, &project_dir.to_string_lossy())
}
