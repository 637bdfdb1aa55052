//! PlatformIO CLI wrapper: board lookup, project init (PIO_INITIALIZED) and build (BUILT).

use super::{Invocation, run_tool};
use serde::Deserialize;
use stm32pio_core::{Project, Stm32pioError};

const TOOL: &str = "PlatformIO";

/// Framework the generated project is initialized with.
pub const FRAMEWORK: &str = "stm32cube";

/// One entry of `platformio boards --json-output`. Other keys are ignored.
#[derive(Debug, Deserialize)]
struct BoardEntry {
    id: String,
}

/// Board identifiers out of `platformio boards --json-output`.
pub fn parse_board_ids(json: &str) -> Result<Vec<String>, Stm32pioError> {
    let boards: Vec<BoardEntry> = serde_json::from_str(json)
        .map_err(|e| Stm32pioError::tool(TOOL, format!("Unexpected boards list: {}", e)))?;
    Ok(boards.into_iter().map(|board| board.id).collect())
}

/// Every board id PlatformIO knows about.
pub async fn supported_boards(platformio_cmd: &str, verbose: bool) -> Result<Vec<String>, Stm32pioError> {
    // The list is one huge line; keep it out of verbose output
    let invocation = Invocation::new(TOOL, platformio_cmd).args(["boards", "--json-output"]);
    let output = run_tool(&invocation, false).await?.ensure_success(verbose)?;
    parse_board_ids(&output.stdout().join("\n"))
}

/// `platformio --version`, first line.
pub async fn version(platformio_cmd: &str) -> Result<String, Stm32pioError> {
    let invocation = Invocation::new(TOOL, platformio_cmd).arg("--version");
    let output = run_tool(&invocation, false).await?.ensure_success(true)?;
    Ok(output.lines().next().unwrap_or_default().trim().to_string())
}

/// Command line creating a PlatformIO project over the generated code.
#[must_use]
pub fn init_invocation(project: &Project, verbose: bool) -> Invocation {
    Invocation::new(TOOL, &project.config().app.platformio_cmd)
        .args(["project", "init", "-d"])
        .arg(project.path())
        .arg("-b")
        .arg(&project.config().project.board)
        .arg("-O")
        .arg(format!("framework={}", FRAMEWORK))
        .arg_if(!verbose, "--silent")
}

/// Command line building the project.
#[must_use]
pub fn build_invocation(project: &Project, verbose: bool) -> Invocation {
    Invocation::new(TOOL, &project.config().app.platformio_cmd)
        .args(["run", "-d"])
        .arg(project.path())
        .arg_if(!verbose, "--silent")
}

/// Initialize the PlatformIO project for the configured board.
pub async fn init(project: &Project, verbose: bool) -> Result<(), Stm32pioError> {
    let board = project.config().project.board.as_str();
    if board.is_empty() {
        return Err(Stm32pioError::Precondition(
            "No PlatformIO board set, pass one with --board".to_string(),
        ));
    }

    let boards = supported_boards(&project.config().app.platformio_cmd, verbose).await?;
    if !boards.iter().any(|id| id == board) {
        return Err(Stm32pioError::Precondition(format!(
            "'{}' is not a PlatformIO board id",
            board
        )));
    }

    if project.platformio_ini().exists() {
        tracing::warn!("platformio.ini already exists, PlatformIO will update it");
    }

    tracing::info!("Starting PlatformIO project initialization");
    run_tool(&init_invocation(project, verbose), verbose)
        .await?
        .ensure_success(verbose)?;
    tracing::info!("PlatformIO project initialized");
    Ok(())
}

/// Build the firmware.
pub async fn build(project: &Project, verbose: bool) -> Result<(), Stm32pioError> {
    tracing::info!("Starting build");
    run_tool(&build_invocation(project, verbose), verbose)
        .await?
        .ensure_success(verbose)?;
    tracing::info!("Build finished");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use stm32pio_core::ConfigOverrides;

    #[test]
    fn board_ids_from_json() {
        let json = r#"[
            {"id": "nucleo_f031k6", "name": "ST Nucleo F031K6", "mcu": "STM32F031K6T6"},
            {"id": "bluepill_f103c8", "name": "BluePill F103C8"}
        ]"#;
        let ids = parse_board_ids(json).expect("parse");
        assert_eq!(ids, vec!["nucleo_f031k6", "bluepill_f103c8"]);
    }

    #[test]
    fn garbage_board_list_is_error() {
        assert!(matches!(
            parse_board_ids("Error: not json"),
            Err(Stm32pioError::Tool { .. })
        ));
    }

    #[test]
    fn invocations_follow_verbosity() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(dir.path().join("blink.ioc"), "").expect("write");
        let overrides = ConfigOverrides::with_board(Some("nucleo_f031k6".to_string()));
        let project = Project::open(dir.path(), &overrides).expect("open");

        let quiet = init_invocation(&project, false).command_line();
        assert!(quiet.contains("project init -d"));
        assert!(quiet.contains("-b nucleo_f031k6 -O framework=stm32cube"));
        assert!(quiet.ends_with("--silent"));

        let loud = build_invocation(&project, true).command_line();
        assert!(loud.starts_with("platformio run -d"));
        assert!(!loud.contains("--silent"));
    }
}
