//! # stm32pio-core
//!
//! Project state inference for STM32CubeMX + PlatformIO projects - THE LOGIC.
//!
//! Given only a project directory and its persisted configuration, this crate
//! computes which life-cycle stages have been completed, whether they form an
//! unbroken sequence, and which stage the project is currently in.
//!
//! ## Architectural Constraints
//!
//! - No async, no subprocesses, no network (pure Rust)
//! - State queries are read-only and never fail: probe errors mean "not reached"
//! - Stage order lives in fixed arrays; no hash-map iteration order anywhere
//! - External tools (CubeMX, PlatformIO, git) are driven by the app crate

// =============================================================================
// MODULES
// =============================================================================

pub mod config;
pub mod cubemx;
pub mod platformio;
pub mod primitives;
pub mod probe;
pub mod project;
pub mod state;
pub mod system;
pub mod types;

// =============================================================================
// RE-EXPORTS
// =============================================================================

pub use config::{AppSection, Config, ConfigOverrides, ProjectSection};
pub use cubemx::{IocFile, IocLocation, locate_ioc, render_script};
pub use platformio::PlatformioIni;
pub use probe::ProjectProbe;
pub use project::{PatchReport, Project};
pub use state::{PredicateSet, ProbeFailure, ProjectState, Verdict, resolve};
pub use system::Stage;
pub use types::Stm32pioError;
