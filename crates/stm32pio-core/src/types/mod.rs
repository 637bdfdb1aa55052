//! # Core Type Definitions
//!
//! Error types shared by every stm32pio module.
//!
//! ## Error Policy
//!
//! - No silent failures in actions: use `Result<T, Stm32pioError>`
//! - State probing is the one exception: probe errors are folded into `false`
//!   by the predicate set and recorded as [`crate::state::ProbeFailure`]
//! - The CORE should never panic; all errors must be recoverable

use std::path::PathBuf;
use thiserror::Error;

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Errors that can occur while working with an stm32pio project.
#[derive(Debug, Error)]
pub enum Stm32pioError {
    /// The project path does not exist or cannot be resolved.
    #[error("Project path not found: {0:?}")]
    ProjectNotFound(PathBuf),

    /// No CubeMX `.ioc` descriptor could be located.
    #[error("No .ioc file found in {0:?}")]
    IocNotFound(PathBuf),

    /// The stm32pio configuration could not be read, parsed or written.
    #[error("Config error: {0}")]
    Config(String),

    /// `platformio.ini` (or the patch applied to it) is missing or malformed.
    #[error("platformio.ini error: {0}")]
    PlatformioIni(String),

    /// The project is not in a stage that allows the requested action.
    #[error("Precondition failed: {0}")]
    Precondition(String),

    /// An external tool could not be started or reported a failure.
    #[error("{tool} failed: {reason}")]
    Tool {
        /// Human-readable tool name.
        tool: String,
        /// What went wrong.
        reason: String,
    },

    /// A queued action failed; `reason` is the rendered underlying error.
    #[error("Action '{action}' failed: {reason}")]
    Action {
        action: String,
        reason: String,
    },

    /// The action was not run (queue closed, user declined, earlier failure).
    #[error("Cancelled: {0}")]
    Cancelled(String),

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    IoError(String),
}

impl Stm32pioError {
    /// Build a [`Stm32pioError::Tool`] error.
    pub fn tool(tool: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Tool {
            tool: tool.into(),
            reason: reason.into(),
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tool_error_display() {
        let err = Stm32pioError::tool("PlatformIO", "exit status 1");
        assert_eq!(err.to_string(), "PlatformIO failed: exit status 1");
    }

    #[test]
    fn ioc_not_found_mentions_path() {
        let err = Stm32pioError::IocNotFound(PathBuf::from("/tmp/project"));
        assert!(err.to_string().contains("/tmp/project"));
    }
}
