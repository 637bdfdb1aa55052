//! # Stage Catalog
//!
//! The fixed, totally ordered set of project life-cycle stages.
//!
//! ## Stage Definitions
//!
//! | Ordinal | Stage | Fulfilled when |
//! |---------|-------|----------------|
//! | 1 | UNDEFINED | always (sentinel, never real progress) |
//! | 2 | EMPTY | `.ioc` descriptor is a file |
//! | 3 | INITIALIZED | `stm32pio.toml` is a file |
//! | 4 | GENERATED | `Inc/` and `Src/` exist and are non-empty |
//! | 5 | PIO_INITIALIZED | `platformio.ini` parses and has a section |
//! | 6 | PATCHED | patch applied and scaffold directories gone |
//! | 7 | BUILT | `.pio/` contains a `*firmware*` file |
//!
//! Ordinals are written out explicitly in [`Stage::ordinal`]; nothing relies on
//! declaration order matching them.

use serde::{Deserialize, Serialize};

// =============================================================================
// STAGE ENUM
// =============================================================================

/// Project life-cycle stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Stage {
    /// Sentinel: "nothing done yet" or "messed up".
    Undefined,
    /// The `.ioc` file is present.
    Empty,
    /// The stm32pio config has been written.
    Initialized,
    /// CubeMX code has been generated.
    Generated,
    /// PlatformIO project has been initialized.
    PioInitialized,
    /// `platformio.ini` patched and scaffold removed.
    Patched,
    /// Firmware has been built.
    Built,
}

impl Stage {
    /// Number of stages, the sentinel included.
    pub const COUNT: usize = 7;

    /// All stages in ordinal order.
    pub const ALL: [Stage; Stage::COUNT] = [
        Stage::Undefined,
        Stage::Empty,
        Stage::Initialized,
        Stage::Generated,
        Stage::PioInitialized,
        Stage::Patched,
        Stage::Built,
    ];

    /// Explicit ordinal, starting at 1.
    #[must_use]
    pub const fn ordinal(self) -> u8 {
        match self {
            Stage::Undefined => 1,
            Stage::Empty => 2,
            Stage::Initialized => 3,
            Stage::Generated => 4,
            Stage::PioInitialized => 5,
            Stage::Patched => 6,
            Stage::Built => 7,
        }
    }

    /// Position of this stage in [`Stage::ALL`] and in snapshot arrays.
    #[must_use]
    pub const fn index(self) -> usize {
        (self.ordinal() - 1) as usize
    }

    /// Get the human-readable label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Stage::Undefined => "The project is messed up",
            Stage::Empty => ".ioc file is present",
            Stage::Initialized => "stm32pio initialized",
            Stage::Generated => "CubeMX code generated",
            Stage::PioInitialized => "PlatformIO project initialized",
            Stage::Patched => "PlatformIO project patched",
            Stage::Built => "PlatformIO project built",
        }
    }

    /// Whether this is a genuine stage (anything but the sentinel).
    #[must_use]
    pub const fn is_real(self) -> bool {
        !matches!(self, Stage::Undefined)
    }

    /// Real stages only, in order.
    pub fn real() -> impl Iterator<Item = Stage> {
        Stage::ALL.into_iter().filter(|stage| stage.is_real())
    }
}

impl PartialOrd for Stage {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Stage {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.ordinal().cmp(&other.ordinal())
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

// =============================================================================
// TESTS
// =============================================================================
