//! # Project Configuration
//!
//! Layered key-value configuration persisted as `stm32pio.toml`.
//!
//! ## Layers (lowest to highest priority)
//!
//! 1. Built-in defaults ([`Config::default`])
//! 2. The persisted file in the project directory (missing keys fall back to 1)
//! 3. Runtime overrides ([`ConfigOverrides`], usually CLI flags)

use crate::Stm32pioError;
use crate::primitives::{CONFIG_FILE_NAME, IOC_PATH_PLACEHOLDER, PROJECT_PATH_PLACEHOLDER};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

// =============================================================================
// DEFAULTS
// =============================================================================

/// Default PlatformIO CLI command.
pub const DEFAULT_PLATFORMIO_CMD: &str = "platformio";

/// Default patch merged into `platformio.ini` so PlatformIO uses CubeMX folders.
pub const DEFAULT_PLATFORMIO_INI_PATCH: &str = "[platformio]\ninclude_dir = Inc\nsrc_dir = Src\n";

/// Default STM32CubeMX install location for the current OS.
#[must_use]
pub fn default_cubemx_cmd() -> String {
    if cfg!(target_os = "windows") {
        "C:/Program Files/STMicroelectronics/STM32Cube/STM32CubeMX/STM32CubeMX.exe".to_string()
    } else if cfg!(target_os = "macos") {
        "/Applications/STMicroelectronics/STM32CubeMX.app/Contents/MacOs/STM32CubeMX".to_string()
    } else {
        std::env::var_os("HOME")
            .map(PathBuf::from)
            .unwrap_or_default()
            .join("STM32CubeMX")
            .join("STM32CubeMX")
            .to_string_lossy()
            .into_owned()
    }
}

/// Default CubeMX script: load the descriptor, generate code, quit.
#[must_use]
pub fn default_cubemx_script() -> String {
    format!(
        "config load {}\ngenerate code {}\nexit\n",
        IOC_PATH_PLACEHOLDER, PROJECT_PATH_PLACEHOLDER
    )
}

// =============================================================================
// CONFIG SECTIONS
// =============================================================================

/// Tool locations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSection {
    pub platformio_cmd: String,
    pub cubemx_cmd: String,
    /// When set, CubeMX is launched as `java -jar <cubemx_cmd>`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub java_cmd: Option<String>,
}

impl Default for AppSection {
    fn default() -> Self {
        Self {
            platformio_cmd: DEFAULT_PLATFORMIO_CMD.to_string(),
            cubemx_cmd: default_cubemx_cmd(),
            java_cmd: None,
        }
    }
}

/// Per-project settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectSection {
    pub cubemx_script_content: String,
    pub platformio_ini_patch_content: String,
    pub board: String,
    /// File name of the `.ioc` descriptor, relative to the project directory.
    pub ioc_file: String,
    /// Extra paths (relative to the project) that `clean` must keep.
    pub cleanup_ignore: Vec<String>,
    pub cleanup_use_git: bool,
    pub inspect_ioc: bool,
    pub last_error: String,
}

impl Default for ProjectSection {
    fn default() -> Self {
        Self {
            cubemx_script_content: default_cubemx_script(),
            platformio_ini_patch_content: DEFAULT_PLATFORMIO_INI_PATCH.to_string(),
            board: String::new(),
            ioc_file: String::new(),
            cleanup_ignore: Vec::new(),
            cleanup_use_git: false,
            inspect_ioc: true,
            last_error: String::new(),
        }
    }
}

/// Complete, merged configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub app: AppSection,
    pub project: ProjectSection,
}

// =============================================================================
// RUNTIME OVERRIDES
// =============================================================================

/// Values supplied at runtime that win over both defaults and the file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigOverrides {
    pub board: Option<String>,
    pub ioc_file: Option<String>,
    pub platformio_cmd: Option<String>,
    pub cubemx_cmd: Option<String>,
    pub java_cmd: Option<String>,
}

impl ConfigOverrides {
    /// Override only the board.
    #[must_use]
    pub fn with_board(board: Option<String>) -> Self {
        Self {
            board,
            ..Self::default()
        }
    }
}

// =============================================================================
// LOAD / SAVE
// =============================================================================

impl Config {
    /// Path of the config file inside `project_dir`.
    #[must_use]
    pub fn path_in(project_dir: &Path) -> PathBuf {
        project_dir.join(CONFIG_FILE_NAME)
    }

    /// Parse a config from TOML text; absent keys take default values.
    pub fn from_toml(text: &str) -> Result<Self, Stm32pioError> {
        toml::from_str(text).map_err(|e| Stm32pioError::Config(e.to_string()))
    }

    /// Render the config as TOML.
    pub fn to_toml(&self) -> Result<String, Stm32pioError> {
        toml::to_string_pretty(self).map_err(|e| Stm32pioError::Config(e.to_string()))
    }

    /// Defaults merged with the file in `project_dir` (if any) and `overrides`.
    pub fn load(project_dir: &Path, overrides: &ConfigOverrides) -> Result<Self, Stm32pioError> {
        let path = Self::path_in(project_dir);
        let mut config = if path.is_file() {
            let text = std::fs::read_to_string(&path)
                .map_err(|e| Stm32pioError::Config(format!("Read {:?}: {}", path, e)))?;
            Self::from_toml(&text)?
        } else {
            Self::default()
        };
        config.apply(overrides);
        Ok(config)
    }

    /// Apply runtime overrides on top of the current values.
    pub fn apply(&mut self, overrides: &ConfigOverrides) {
        if let Some(board) = &overrides.board {
            self.project.board.clone_from(board);
        }
        if let Some(ioc_file) = &overrides.ioc_file {
            self.project.ioc_file.clone_from(ioc_file);
        }
        if let Some(cmd) = &overrides.platformio_cmd {
            self.app.platformio_cmd.clone_from(cmd);
        }
        if let Some(cmd) = &overrides.cubemx_cmd {
            self.app.cubemx_cmd.clone_from(cmd);
        }
        if let Some(cmd) = &overrides.java_cmd {
            self.app.java_cmd = Some(cmd.clone());
        }
    }

    /// Write the config into `project_dir`, returning the file path.
    pub fn save(&self, project_dir: &Path) -> Result<PathBuf, Stm32pioError> {
        let path = Self::path_in(project_dir);
        let text = self.to_toml()?;
        std::fs::write(&path, text)
            .map_err(|e| Stm32pioError::Config(format!("Write {:?}: {}", path, e)))?;
        Ok(path)
    }
}
