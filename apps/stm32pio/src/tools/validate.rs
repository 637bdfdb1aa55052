//! Check that every configured external tool can actually be run.

use super::{Invocation, platformio, run_tool};
use serde::Serialize;
use std::path::Path;
use stm32pio_core::AppSection;

/// Result of checking one tool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ToolCheck {
    pub tool: String,
    pub command: String,
    pub ok: bool,
    pub detail: String,
}

impl ToolCheck {
    fn passed(tool: &str, command: &str, detail: impl Into<String>) -> Self {
        Self {
            tool: tool.to_string(),
            command: command.to_string(),
            ok: true,
            detail: detail.into(),
        }
    }

    fn failed(tool: &str, command: &str, detail: impl Into<String>) -> Self {
        Self {
            tool: tool.to_string(),
            command: command.to_string(),
            ok: false,
            detail: detail.into(),
        }
    }
}

/// A command is resolvable if it names an existing file or is found on `PATH`.
#[must_use]
pub fn is_resolvable(command: &str) -> bool {
    !command.is_empty() && (Path::new(command).is_file() || which::which(command).is_ok())
}

/// Check PlatformIO, STM32CubeMX and (when configured) Java.
pub async fn validate(app: &AppSection) -> Vec<ToolCheck> {
    let mut checks = Vec::new();

    checks.push(match platformio::version(&app.platformio_cmd).await {
        Ok(version) => ToolCheck::passed("PlatformIO", &app.platformio_cmd, version),
        Err(e) => ToolCheck::failed("PlatformIO", &app.platformio_cmd, e.to_string()),
    });

    checks.push(if is_resolvable(&app.cubemx_cmd) {
        ToolCheck::passed("STM32CubeMX", &app.cubemx_cmd, "found")
    } else {
        ToolCheck::failed(
            "STM32CubeMX",
            &app.cubemx_cmd,
            "not a file and not found on PATH",
        )
    });

    if let Some(java) = &app.java_cmd {
        // `java -version` reports on stderr
        let invocation = Invocation::new("Java", java).arg("-version");
        let check = match run_tool(&invocation, false).await {
            Ok(output) if output.success() => ToolCheck::passed(
                "Java",
                java,
                output.lines().next().unwrap_or_default().trim().to_string(),
            ),
            Ok(output) => ToolCheck::failed(
                "Java",
                java,
                format!("exited with status {:?}", output.code()),
            ),
            Err(e) => ToolCheck::failed("Java", java, e.to_string()),
        };
        checks.push(check);
    }

    checks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_command_is_not_resolvable() {
        assert!(!is_resolvable(""));
    }

    #[test]
    fn existing_file_is_resolvable() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("STM32CubeMX");
        std::fs::write(&path, "").expect("write");
        assert!(is_resolvable(&path.to_string_lossy()));
    }

    #[tokio::test]
    async fn missing_tools_fail_their_checks() {
        let app = AppSection {
            platformio_cmd: "stm32pio-missing-platformio".to_string(),
            cubemx_cmd: "/nonexistent/STM32CubeMX".to_string(),
            java_cmd: Some("stm32pio-missing-java".to_string()),
        };
        let checks = validate(&app).await;
        assert_eq!(checks.len(), 3);
        assert!(checks.iter().all(|check| !check.ok));
        assert_eq!(checks[1].tool, "STM32CubeMX");
    }
}
