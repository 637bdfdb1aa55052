//! Git-based cleanup: drop every untracked file and directory.

use super::{Invocation, run_tool};
use std::path::Path;
use stm32pio_core::Stm32pioError;

const TOOL: &str = "git";

#[must_use]
pub fn clean_invocation(project_dir: &Path) -> Invocation {
    Invocation::new(TOOL, TOOL)
        .args(["clean", "-d", "--force"])
        .current_dir(project_dir)
}

/// `git clean -d --force` inside the project.
pub async fn clean(project_dir: &Path, verbose: bool) -> Result<(), Stm32pioError> {
    run_tool(&clean_invocation(project_dir), verbose)
        .await?
        .ensure_success(verbose)?;
    tracing::info!("Project cleaned with git");
    Ok(())
}
