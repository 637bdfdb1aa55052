//! Open the project in an editor.

use super::{Invocation, run_tool};
use std::path::Path;
use stm32pio_core::Stm32pioError;

/// `<editor> <project dir>`.
#[must_use]
pub fn invocation(editor: &str, project_dir: &Path) -> Invocation {
    Invocation::new(editor, editor).arg(project_dir)
}

/// Start the editor and wait for it to exit.
pub async fn start(editor: &str, project_dir: &Path, verbose: bool) -> Result<(), Stm32pioError> {
    tracing::info!("Starting {} in {:?}", editor, project_dir);
    run_tool(&invocation(editor, project_dir), verbose)
        .await?
        .ensure_success(verbose)?;
    Ok(())
}
