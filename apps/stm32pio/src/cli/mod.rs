//! # stm32pio CLI Module
//!
//! This module implements the CLI interface for stm32pio.
//!
//! ## Available Commands
//!
//! - `init` - Write the stm32pio config next to the `.ioc` file
//! - `new` - init, generate, pio-init and patch in one go
//! - `generate` - Run STM32CubeMX code generation
//! - `pio-init` - Create the PlatformIO project
//! - `patch` - Point `platformio.ini` at the CubeMX folders
//! - `build` - Build the firmware with PlatformIO
//! - `clean` - Remove everything but the `.ioc` and config
//! - `status` - Show the project stages
//! - `validate` - Check that the external tools can be run

mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use stm32pio_core::Stm32pioError;

pub use commands::*;

// =============================================================================
// CLI STRUCTURE
// =============================================================================

/// stm32pio - STM32CubeMX + PlatformIO project automation
///
/// Generates code from a CubeMX `.ioc` file, wraps it into a PlatformIO
/// project and builds it. The project stage is always read from the disk.
#[derive(Parser, Debug)]
#[command(name = "stm32pio")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Show tool output and debug logs
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output in JSON format (for programmatic access)
    #[arg(long, global = true)]
    pub json_mode: bool,

    /// Project directory (or its .ioc file)
    #[arg(short = 'd', long = "directory", global = true, default_value = ".")]
    pub directory: PathBuf,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available CLI commands.
#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Commands {
    /// Create the stm32pio config for the project
    Init {
        /// PlatformIO board id
        #[arg(short, long)]
        board: Option<String>,

        /// Open the project in this editor afterwards
        #[arg(short, long)]
        editor: Option<String>,
    },

    /// Initialize, generate, create and patch the PlatformIO project
    New {
        /// PlatformIO board id
        #[arg(short, long)]
        board: Option<String>,

        /// Open the project in this editor afterwards
        #[arg(short, long)]
        editor: Option<String>,

        /// Build the firmware at the end
        #[arg(long)]
        with_build: bool,
    },

    /// Generate code with STM32CubeMX
    Generate {
        /// Open the project in this editor afterwards
        #[arg(short, long)]
        editor: Option<String>,

        /// Build the firmware afterwards
        #[arg(long)]
        with_build: bool,
    },

    /// Create the PlatformIO project
    PioInit {
        /// PlatformIO board id
        #[arg(short, long)]
        board: Option<String>,
    },

    /// Patch platformio.ini and remove the PlatformIO scaffold
    Patch,

    /// Build the firmware
    Build,

    /// Remove all generated and build artifacts
    Clean {
        /// Do not ask for confirmation
        #[arg(short, long)]
        yes: bool,
    },

    /// Show the project stages
    Status,

    /// Check that PlatformIO, STM32CubeMX and Java can be run
    Validate,
}

// =============================================================================
// COMMAND EXECUTION
// =============================================================================

/// Execute the CLI with parsed arguments.
pub async fn execute(cli: Cli) -> Result<(), Stm32pioError> {
    let ctx = Context {
        directory: cli.directory,
        verbose: cli.verbose,
        json_mode: cli.json_mode,
    };

    match cli.command {
        Some(Commands::Init { board, editor }) => cmd_init(&ctx, board, editor).await,
        Some(Commands::New {
            board,
            editor,
            with_build,
        }) => cmd_new(&ctx, board, editor, with_build).await,
        Some(Commands::Generate { editor, with_build }) => {
            cmd_generate(&ctx, editor, with_build).await
        }
        Some(Commands::PioInit { board }) => cmd_pio_init(&ctx, board).await,
        Some(Commands::Patch) => cmd_patch(&ctx).await,
        Some(Commands::Build) => cmd_build(&ctx).await,
        Some(Commands::Clean { yes }) => cmd_clean(&ctx, yes).await,
        Some(Commands::Validate) => cmd_validate(&ctx).await,
        Some(Commands::Status) | None => {
            // No subcommand - show status by default
            cmd_status(&ctx)
        }
    }
}
