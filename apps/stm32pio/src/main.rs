//! # stm32pio
//!
//! Drive an STM32CubeMX project through code generation, PlatformIO set-up
//! and build, and report which stage it is in.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                  apps/stm32pio (THE BINARY)                 │
//! │                                                             │
//! │  ┌─────────────┐    ┌──────────────┐    ┌───────────────┐  │
//! │  │    CLI      │───►│ Action queue │───►│ Tool runner   │  │
//! │  │   (clap)    │    │ (tokio task) │    │ (subprocess)  │  │
//! │  └─────────────┘    └──────┬───────┘    └───────────────┘  │
//! │                            ▼                                │
//! │                    ┌───────────────┐                        │
//! │                    │ stm32pio-core │                        │
//! │                    │  (THE LOGIC)  │                        │
//! │                    └───────────────┘                        │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```bash
//! stm32pio new -d ./blink -b nucleo_f031k6 --with-build
//! stm32pio status -d ./blink
//! stm32pio --json-mode status
//! ```

use clap::Parser;
use stm32pio::cli;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// =============================================================================
// APPLICATION ENTRY POINT
// =============================================================================

#[tokio::main]
async fn main() {
    let cli = cli::Cli::parse();

    // STM32PIO_LOG_FORMAT=json enables machine-parseable output.
    let log_format = std::env::var("STM32PIO_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

    let default_filter = if cli.verbose {
        "stm32pio=debug"
    } else {
        "stm32pio=info"
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_filter.into());

    match log_format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_target(cli.verbose)
                        .with_writer(std::io::stderr),
                )
                .init();
        }
    }

    if let Err(e) = cli::execute(cli).await {
        tracing::error!("Error: {}", e);
        std::process::exit(1);
    }
}
