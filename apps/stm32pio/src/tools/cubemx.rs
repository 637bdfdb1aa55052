//! STM32CubeMX code generation (reaches GENERATED).

use super::{Invocation, run_tool};
use std::io::Write;
use std::path::Path;
use stm32pio_core::{AppSection, Project, Stm32pioError};

const TOOL: &str = "STM32CubeMX";

/// CubeMX reports most failures on its output with this tag and still exits 0.
const ERROR_TAG: &str = "[ERROR]";

/// Headless CubeMX command line running `script`.
///
/// With `java_cmd` configured, `cubemx_cmd` is treated as a jar.
#[must_use]
pub fn invocation(app: &AppSection, script: &Path) -> Invocation {
    let base = match &app.java_cmd {
        Some(java) => Invocation::new(TOOL, java).arg("-jar").arg(&app.cubemx_cmd),
        None => Invocation::new(TOOL, &app.cubemx_cmd),
    };
    base.arg("-q").arg(script)
}

/// Log `.ioc` problems that would break the PlatformIO side later.
pub fn inspect(project: &Project) {
    let ioc = match project.ioc() {
        Ok(ioc) => ioc,
        Err(e) => {
            tracing::warn!("Cannot inspect the .ioc file: {}", e);
            return;
        }
    };
    for warning in ioc.inspect() {
        tracing::warn!("{}", warning);
    }
    if project.config().project.board.is_empty() {
        if let Some(mcu) = ioc.mcu() {
            tracing::info!(
                "No PlatformIO board set. The .ioc targets {}, pick a matching board (`platformio boards`)",
                mcu
            );
        }
    }
}

/// Run CubeMX against the project's `.ioc` to generate `Inc/` and `Src/`.
pub async fn generate(project: &Project, verbose: bool) -> Result<(), Stm32pioError> {
    if project.config().project.inspect_ioc {
        inspect(project);
    }

    let mut script = tempfile::Builder::new()
        .prefix("stm32pio-cubemx-")
        .suffix(".txt")
        .tempfile()
        .map_err(|e| Stm32pioError::IoError(format!("Cannot create CubeMX script: {}", e)))?;
    script
        .write_all(project.cubemx_script().as_bytes())
        .and_then(|()| script.flush())
        .map_err(|e| Stm32pioError::IoError(format!("Cannot write CubeMX script: {}", e)))?;

    tracing::info!("Starting code generation");
    let invocation = invocation(&project.config().app, script.path());
    let output = run_tool(&invocation, verbose).await?.ensure_success(verbose)?;

    if let Some(line) = output.lines().find(|line| line.contains(ERROR_TAG)) {
        return Err(Stm32pioError::tool(TOOL, line.trim().to_string()));
    }

    tracing::info!("Code generated");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::OsString;

    #[test]
    fn native_invocation() {
        let app = AppSection {
            platformio_cmd: "platformio".to_string(),
            cubemx_cmd: "/opt/cubemx/STM32CubeMX".to_string(),
            java_cmd: None,
        };
        let inv = invocation(&app, Path::new("/tmp/script.txt"));
        assert_eq!(inv.program(), &OsString::from("/opt/cubemx/STM32CubeMX"));
        assert_eq!(inv.command_line(), "/opt/cubemx/STM32CubeMX -q /tmp/script.txt");
    }

    #[test]
    fn java_invocation_runs_jar() {
        let app = AppSection {
            platformio_cmd: "platformio".to_string(),
            cubemx_cmd: "/opt/cubemx/STM32CubeMX.jar".to_string(),
            java_cmd: Some("java".to_string()),
        };
        let inv = invocation(&app, Path::new("/tmp/script.txt"));
        assert_eq!(
            inv.command_line(),
            "java -jar /opt/cubemx/STM32CubeMX.jar -q /tmp/script.txt"
        );
    }
}
