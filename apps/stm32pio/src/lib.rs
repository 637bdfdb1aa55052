//! # stm32pio
//!
//! Command-line driver for STM32CubeMX + PlatformIO projects.
//!
//! The state of a project is never stored: every query goes to
//! [`stm32pio_core::Project::state`]. This crate adds what the core leaves
//! out on purpose: running external tools, queueing actions and the CLI.

pub mod cli;
pub mod tools;
pub mod worker;
