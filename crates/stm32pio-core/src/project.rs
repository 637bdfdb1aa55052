//! # Project Facade
//!
//! Owns the project directory and its merged configuration.
//!
//! [`Project::state`] probes the directory afresh on every call; nothing is
//! cached between calls. Actions that only touch the filesystem (persisting
//! the config, patching, file-based cleanup) live here too. Actions that need
//! external tools are driven by the application crate, and their effects show
//! up in the next [`Project::state`] call.

use crate::config::{Config, ConfigOverrides};
use crate::cubemx::{IocFile, has_ioc_extension, locate_ioc, render_script};
use crate::platformio::PlatformioIni;
use crate::primitives::{CASE_PROBE_DIR, SCAFFOLD_INCLUDE_DIR, SCAFFOLD_SRC_DIR};
use crate::probe::{ProjectProbe, io_error, list_entries};
use crate::state::{ProjectState, Verdict};
use crate::{Stage, Stm32pioError};
use std::path::{Path, PathBuf};

/// An STM32CubeMX + PlatformIO project on disk.
#[derive(Debug, Clone)]
pub struct Project {
    path: PathBuf,
    config: Config,
    ioc_path: PathBuf,
    ioc_candidates: usize,
}

/// What [`Project::patch`] did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PatchReport {
    /// `platformio.ini` already carried the patch and was left untouched.
    pub already_patched: bool,
    /// Scaffold directories that were removed.
    pub removed: Vec<PathBuf>,
}

impl Project {
    /// Open the project at `path` (its directory or its `.ioc` file).
    pub fn open(path: &Path, overrides: &ConfigOverrides) -> Result<Self, Stm32pioError> {
        let resolved = path
            .canonicalize()
            .map_err(|_| Stm32pioError::ProjectNotFound(path.to_path_buf()))?;

        let mut overrides = overrides.clone();
        let dir = if resolved.is_file() && has_ioc_extension(&resolved) {
            overrides.ioc_file = resolved
                .file_name()
                .map(|name| name.to_string_lossy().into_owned());
            resolved
                .parent()
                .map(Path::to_path_buf)
                .ok_or_else(|| Stm32pioError::ProjectNotFound(path.to_path_buf()))?
        } else if resolved.is_dir() {
            resolved
        } else {
            return Err(Stm32pioError::ProjectNotFound(path.to_path_buf()));
        };

        let mut config = Config::load(&dir, &overrides)?;
        let location = locate_ioc(&dir, &config.project.ioc_file)?;

        let ioc_path = match (location.path.parent(), location.path.file_name()) {
            (Some(parent), Some(name)) if parent == dir.as_path() => {
                config.project.ioc_file = name.to_string_lossy().into_owned();
                dir.join(name)
            }
            _ => {
                config.project.ioc_file = location.path.to_string_lossy().into_owned();
                location.path.clone()
            }
        };

        Ok(Self {
            path: dir,
            config,
            ioc_path,
            ioc_candidates: location.candidates,
        })
    }

    /// Canonical project directory.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut Config {
        &mut self.config
    }

    #[must_use]
    pub fn ioc_path(&self) -> &Path {
        &self.ioc_path
    }

    /// Number of `.ioc` files seen when the descriptor was located.
    #[must_use]
    pub fn ioc_candidates(&self) -> usize {
        self.ioc_candidates
    }

    #[must_use]
    pub fn config_path(&self) -> PathBuf {
        Config::path_in(&self.path)
    }

    #[must_use]
    pub fn platformio_ini(&self) -> PlatformioIni {
        PlatformioIni::new(&self.path, self.config.project.platformio_ini_patch_content.clone())
    }

    // =========================================================================
    // STATE
    // =========================================================================

    /// Fresh snapshot of the project's stages.
    #[must_use]
    pub fn state(&self) -> ProjectState {
        ProjectState::probe(self)
    }

    /// Current stage and consistency, both from one fresh snapshot.
    #[must_use]
    pub fn verdict(&self) -> Verdict {
        self.state().verdict()
    }

    /// Current stage, from a fresh snapshot.
    ///
    /// Takes its own snapshot; pair with [`Project::verdict`] instead of
    /// calling [`Project::is_consistent`] next to it.
    #[must_use]
    pub fn current_stage(&self) -> Stage {
        self.verdict().current_stage
    }

    /// Consistency, from a fresh snapshot of its own.
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        self.verdict().is_consistent
    }

    // =========================================================================
    // FILESYSTEM ACTIONS
    // =========================================================================

    /// Persist the merged config (reaches INITIALIZED).
    pub fn save_config(&self) -> Result<PathBuf, Stm32pioError> {
        self.config.save(&self.path)
    }

    /// Store `error` (or clear it) as `last_error`, if the config is persisted.
    ///
    /// Returns whether the config file was written.
    pub fn record_last_error(&mut self, error: Option<&str>) -> Result<bool, Stm32pioError> {
        if !self.config_is_file() {
            return Ok(false);
        }
        self.config.project.last_error = error.unwrap_or_default().to_string();
        self.save_config()?;
        Ok(true)
    }

    /// Parse the `.ioc` descriptor.
    pub fn ioc(&self) -> Result<IocFile, Stm32pioError> {
        IocFile::read(&self.ioc_path)
    }

    /// CubeMX script with both paths substituted.
    #[must_use]
    pub fn cubemx_script(&self) -> String {
        render_script(
            &self.config.project.cubemx_script_content,
            &self.ioc_path,
            &self.path,
        )
    }

    /// Merge the patch into `platformio.ini` and drop the PlatformIO scaffold.
    pub fn patch(&self) -> Result<PatchReport, Stm32pioError> {
        let ini = self.platformio_ini();
        if !ini.is_initialized()? {
            return Err(Stm32pioError::Precondition(
                "platformio.ini is missing or empty, initialize the PlatformIO project first"
                    .to_string(),
            ));
        }

        let already_patched = ini.is_patched()?;
        if !already_patched {
            ini.apply_patch()?;
        }

        let mut removed = Vec::new();
        self.remove_scaffold(SCAFFOLD_INCLUDE_DIR, &mut removed)?;
        // On a case-insensitive filesystem `src` is the generated `Src`
        if !self.is_dir(CASE_PROBE_DIR) {
            self.remove_scaffold(SCAFFOLD_SRC_DIR, &mut removed)?;
        }

        Ok(PatchReport {
            already_patched,
            removed,
        })
    }

    /// Paths `clean` must never remove.
    #[must_use]
    pub fn preserved_paths(&self) -> Vec<PathBuf> {
        let mut keep = vec![self.ioc_path.clone(), self.config_path()];
        keep.extend(
            self.config
                .project
                .cleanup_ignore
                .iter()
                .map(|entry| entry.trim())
                .filter(|entry| !entry.is_empty())
                .map(|entry| self.path.join(entry)),
        );
        keep
    }

    /// Remove everything but the preserved paths. Returns what was removed.
    pub fn clean_files(&self) -> Result<Vec<PathBuf>, Stm32pioError> {
        let keep = self.preserved_paths();
        let mut removed = Vec::new();
        clean_dir(&self.path, &keep, &mut removed)?;
        Ok(removed)
    }

    fn remove_scaffold(&self, name: &str, removed: &mut Vec<PathBuf>) -> Result<(), Stm32pioError> {
        let dir = self.path.join(name);
        if dir.is_dir() {
            std::fs::remove_dir_all(&dir).map_err(|e| io_error(&dir, &e))?;
            removed.push(dir);
        }
        Ok(())
    }
}

/// Remove entries of `dir` not in `keep`, descending into directories that
/// contain a kept path.
fn clean_dir(dir: &Path, keep: &[PathBuf], removed: &mut Vec<PathBuf>) -> Result<(), Stm32pioError> {
    for entry in list_entries(dir)? {
        if keep.contains(&entry) {
            continue;
        }
        let metadata = std::fs::symlink_metadata(&entry).map_err(|e| io_error(&entry, &e))?;
        if metadata.is_dir() {
            if keep.iter().any(|kept| kept.starts_with(&entry)) {
                clean_dir(&entry, keep, removed)?;
                continue;
            }
            std::fs::remove_dir_all(&entry).map_err(|e| io_error(&entry, &e))?;
        } else {
            std::fs::remove_file(&entry).map_err(|e| io_error(&entry, &e))?;
        }
        removed.push(entry);
    }
    Ok(())
}

// =============================================================================
// PROBES
// =============================================================================

impl ProjectProbe for Project {
    fn ioc_is_file(&self) -> bool {
        self.ioc_path.is_file()
    }

    fn config_is_file(&self) -> bool {
        self.config_path().is_file()
    }

    fn is_dir(&self, relative: &str) -> bool {
        self.path.join(relative).is_dir()
    }

    fn list_dir(&self, relative: &str) -> Result<Vec<PathBuf>, Stm32pioError> {
        list_entries(&self.path.join(relative))
    }

    fn platformio_initialized(&self) -> Result<bool, Stm32pioError> {
        self.platformio_ini().is_initialized()
    }

    fn platformio_patched(&self) -> Result<bool, Stm32pioError> {
        self.platformio_ini().is_patched()
    }

    fn tree_has_file_named(&self, relative: &str, marker: &str) -> Result<bool, Stm32pioError> {
        crate::probe::tree_has_file_named(&self.path.join(relative), marker)
    }
}
