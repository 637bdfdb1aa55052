//! # platformio.ini
//!
//! Reader and patcher for the PlatformIO project configuration.
//!
//! The patch is itself INI text; a file is "patched" when every key of every
//! patch section is present in the file with an equal (trimmed) value.
//!
//! Values are taken verbatim: no quote stripping, no backslash escapes, and
//! indented continuation lines belong to the key above them. Writing keeps
//! that shape so `build_flags` and multi-line `lib_deps` survive a patch.

use crate::Stm32pioError;
use crate::primitives::PLATFORMIO_INI;
use ini::{Ini, ParseOption};
use std::path::{Path, PathBuf};

/// `platformio.ini` of one project together with the patch it should carry.
#[derive(Debug, Clone)]
pub struct PlatformioIni {
    path: PathBuf,
    patch: String,
}

impl PlatformioIni {
    /// Locate `platformio.ini` inside `project_dir`.
    #[must_use]
    pub fn new(project_dir: &Path, patch: impl Into<String>) -> Self {
        Self {
            path: project_dir.join(PLATFORMIO_INI),
            patch: patch.into(),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether the file exists at all.
    #[must_use]
    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Present, parseable and with at least one named section.
    ///
    /// A missing file is `Ok(false)`; a malformed one is an error.
    pub fn is_initialized(&self) -> Result<bool, Stm32pioError> {
        if !self.exists() {
            return Ok(false);
        }
        Ok(named_section_count(&self.load()?) > 0)
    }

    /// Every patch key is present with an equal value.
    ///
    /// Errors if the file is missing or malformed, or if the patch itself does not parse.
    pub fn is_patched(&self) -> Result<bool, Stm32pioError> {
        let current = self.load()?;
        let patch = self.parsed_patch()?;
        for (section, properties) in patch.iter() {
            let Some(section) = section else {
                continue;
            };
            let Some(existing) = current.section(Some(section)) else {
                return Ok(false);
            };
            for (key, value) in properties.iter() {
                if existing.get(key).map(str::trim) != Some(value.trim()) {
                    return Ok(false);
                }
            }
        }
        Ok(true)
    }

    /// Merge the patch into the file and write it back.
    pub fn apply_patch(&self) -> Result<(), Stm32pioError> {
        let mut current = self.load()?;
        let patch = self.parsed_patch()?;
        for (section, properties) in patch.iter() {
            let Some(section) = section else {
                continue;
            };
            for (key, value) in properties.iter() {
                current.with_section(Some(section)).set(key, value);
            }
        }
        std::fs::write(&self.path, render(&current))
            .map_err(|e| Stm32pioError::PlatformioIni(format!("Write {:?}: {}", self.path, e)))
    }

    fn load(&self) -> Result<Ini, Stm32pioError> {
        if !self.exists() {
            return Err(Stm32pioError::PlatformioIni(format!(
                "{:?} does not exist",
                self.path
            )));
        }
        Ini::load_from_file_opt(&self.path, verbatim())
            .map_err(|e| Stm32pioError::PlatformioIni(format!("{:?}: {}", self.path, e)))
    }

    fn parsed_patch(&self) -> Result<Ini, Stm32pioError> {
        let patch = Ini::load_from_str_opt(&self.patch, verbatim())
            .map_err(|e| Stm32pioError::PlatformioIni(format!("Invalid patch: {}", e)))?;
        if named_section_count(&patch) == 0 {
            return Err(Stm32pioError::PlatformioIni(
                "Patch has no sections".to_string(),
            ));
        }
        Ok(patch)
    }
}

fn named_section_count(ini: &Ini) -> usize {
    ini.sections().filter(Option::is_some).count()
}

fn verbatim() -> ParseOption {
    ParseOption {
        enabled_quote: false,
        enabled_escape: false,
        enabled_indented_mutiline_value: true,
        ..ParseOption::default()
    }
}

/// Serialize in PlatformIO's own layout.
///
/// Multi-line values are written as `key =` followed by indented lines.
fn render(ini: &Ini) -> String {
    let mut out = String::new();
    for (section, properties) in ini.iter() {
        if section.is_none() && properties.is_empty() {
            continue;
        }
        if !out.is_empty() {
            out.push('\n');
        }
        if let Some(name) = section {
            out.push_str(&format!("[{}]\n", name));
        }
        for (key, value) in properties.iter() {
            if value.contains('\n') {
                out.push_str(&format!("{} =\n", key));
                for line in value.lines() {
                    out.push_str(&format!("    {}\n", line));
                }
            } else {
                out.push_str(&format!("{} = {}\n", key, value));
            }
        }
    }
    out
}
