//! # Fixed Project Layout
//!
//! Hardcoded file and directory names that the state probes look for.
//!
//! These names are dictated by the external tools (STM32CubeMX and PlatformIO)
//! and are compiled into the binary; they are not configurable at runtime.
//!
//! ## Layout
//!
//! ```text
//! project/
//! ├── board.ioc          descriptor (EMPTY)
//! ├── stm32pio.toml      our config (INITIALIZED)
//! ├── Inc/  Src/         CubeMX output (GENERATED)
//! ├── platformio.ini     PlatformIO config (PIO_INITIALIZED, PATCHED)
//! ├── include/  src/     PlatformIO scaffold, removed by patch (PATCHED)
//! └── .pio/              PlatformIO build tree (BUILT)
//! ```

/// File name of the persisted stm32pio configuration.
pub const CONFIG_FILE_NAME: &str = "stm32pio.toml";

/// Extension of the STM32CubeMX hardware descriptor.
pub const IOC_EXTENSION: &str = "ioc";

/// PlatformIO project configuration file.
pub const PLATFORMIO_INI: &str = "platformio.ini";

/// Directories produced by CubeMX code generation. Both must be non-empty.
pub const GENERATED_DIRS: [&str; 2] = ["Inc", "Src"];

/// Scaffold directory left by `platformio project init` that never collides
/// with a generated directory, even on a case-insensitive filesystem.
pub const SCAFFOLD_INCLUDE_DIR: &str = "include";

/// Scaffold source directory left by `platformio project init`.
///
/// On a case-insensitive filesystem this is the same directory as `Src`.
pub const SCAFFOLD_SRC_DIR: &str = "src";

/// Upper-case spelling used to detect a case-insensitive filesystem: if it
/// resolves to a directory, `src` and `Src` are one and the same.
pub const CASE_PROBE_DIR: &str = "SRC";

/// PlatformIO service directory holding build artifacts.
pub const PIO_BUILD_DIR: &str = ".pio";

/// Substring identifying a build artifact inside [`PIO_BUILD_DIR`].
pub const FIRMWARE_MARKER: &str = "firmware";

/// Placeholder substituted with the absolute `.ioc` path in CubeMX scripts.
pub const IOC_PATH_PLACEHOLDER: &str = "${ioc_file_absolute_path}";

/// Placeholder substituted with the absolute project path in CubeMX scripts.
pub const PROJECT_PATH_PLACEHOLDER: &str = "${project_dir_absolute_path}";

/// Toolchain CubeMX must be configured with so that PlatformIO can consume its output.
pub const REQUIRED_TOOLCHAIN: &str = "Other Toolchains (GPDSC)";
