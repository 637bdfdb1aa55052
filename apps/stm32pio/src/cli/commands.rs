//! # CLI Command Implementations
//!
//! Action commands open the project, queue a chain of actions on an
//! [`ActionQueue`] and report the outcome. `status` and `validate` only read.

use crate::tools::validate::{ToolCheck, validate};
use crate::worker::{Action, ActionOutcome, ActionQueue, first_failure};
use std::io::{BufRead, Write};
use std::path::PathBuf;
use stm32pio_core::{Config, ConfigOverrides, Project, ProjectState, Stm32pioError};

/// Global options every command sees.
#[derive(Debug, Clone)]
pub struct Context {
    pub directory: PathBuf,
    pub verbose: bool,
    pub json_mode: bool,
}

// =============================================================================
// ACTION CHAINS
// =============================================================================

fn with_editor(mut chain: Vec<Action>, editor: Option<String>) -> Vec<Action> {
    if let Some(editor) = editor.filter(|name| !name.trim().is_empty()) {
        chain.push(Action::StartEditor(editor));
    }
    chain
}

/// Actions behind `init`.
#[must_use]
pub fn init_chain(editor: Option<String>) -> Vec<Action> {
    with_editor(vec![Action::Init], editor)
}

/// Actions behind `new`.
#[must_use]
pub fn new_chain(editor: Option<String>, with_build: bool) -> Vec<Action> {
    let mut chain = vec![Action::Init, Action::Generate, Action::PioInit, Action::Patch];
    if with_build {
        chain.push(Action::Build);
    }
    with_editor(chain, editor)
}

/// Actions behind `generate`.
#[must_use]
pub fn generate_chain(editor: Option<String>, with_build: bool) -> Vec<Action> {
    let mut chain = vec![Action::Generate];
    if with_build {
        chain.push(Action::Build);
    }
    with_editor(chain, editor)
}

// =============================================================================
// SHARED PLUMBING
// =============================================================================

fn open_project(ctx: &Context, overrides: &ConfigOverrides) -> Result<Project, Stm32pioError> {
    let project = Project::open(&ctx.directory, overrides)?;
    if project.ioc_candidates() > 1 {
        tracing::warn!(
            "{} .ioc files found, using {:?}",
            project.ioc_candidates(),
            project.ioc_path()
        );
    }
    tracing::debug!("Project at {:?}", project.path());
    Ok(project)
}

/// Run `actions` on a fresh queue, print the outcome, fail on the first failure.
async fn run_actions(
    ctx: &Context,
    overrides: &ConfigOverrides,
    actions: Vec<Action>,
) -> Result<(), Stm32pioError> {
    let project = open_project(ctx, overrides)?;
    let queue = ActionQueue::spawn(project, ctx.verbose);

    let outcomes = queue.run(actions.clone()).await?;
    let state = queue.state().await?;
    queue.shutdown().await?;

    if ctx.json_mode {
        print_json(&actions_json(&actions, &outcomes, &state));
    }
    first_failure(&actions, &outcomes)
}

fn outcome_json(outcome: &ActionOutcome) -> serde_json::Value {
    match outcome {
        ActionOutcome::Completed => serde_json::json!({ "outcome": "completed" }),
        ActionOutcome::Failed(reason) => {
            serde_json::json!({ "outcome": "failed", "reason": reason })
        }
        ActionOutcome::Skipped => serde_json::json!({ "outcome": "skipped" }),
    }
}

fn actions_json(actions: &[Action], outcomes: &[ActionOutcome], state: &ProjectState) -> serde_json::Value {
    let results: Vec<serde_json::Value> = actions
        .iter()
        .zip(outcomes)
        .map(|(action, outcome)| {
            let mut entry = outcome_json(outcome);
            if let Some(object) = entry.as_object_mut() {
                object.insert("action".to_string(), action.to_string().into());
            }
            entry
        })
        .collect();
    let verdict = state.verdict();
    serde_json::json!({
        "actions": results,
        "current_stage": verdict.current_stage,
        "is_consistent": verdict.is_consistent,
    })
}

fn print_json(value: &serde_json::Value) {
    println!("{}", serde_json::to_string_pretty(value).unwrap_or_default());
}

// =============================================================================
// ACTION COMMANDS
// =============================================================================

/// Write the config (and open the editor).
pub async fn cmd_init(
    ctx: &Context,
    board: Option<String>,
    editor: Option<String>,
) -> Result<(), Stm32pioError> {
    run_actions(ctx, &ConfigOverrides::with_board(board), init_chain(editor)).await
}

/// Full set-up from a bare `.ioc` file.
pub async fn cmd_new(
    ctx: &Context,
    board: Option<String>,
    editor: Option<String>,
    with_build: bool,
) -> Result<(), Stm32pioError> {
    run_actions(
        ctx,
        &ConfigOverrides::with_board(board),
        new_chain(editor, with_build),
    )
    .await
}

/// Regenerate the CubeMX code.
pub async fn cmd_generate(
    ctx: &Context,
    editor: Option<String>,
    with_build: bool,
) -> Result<(), Stm32pioError> {
    run_actions(
        ctx,
        &ConfigOverrides::default(),
        generate_chain(editor, with_build),
    )
    .await
}

/// Create the PlatformIO project.
pub async fn cmd_pio_init(ctx: &Context, board: Option<String>) -> Result<(), Stm32pioError> {
    run_actions(ctx, &ConfigOverrides::with_board(board), vec![Action::PioInit]).await
}

pub async fn cmd_patch(ctx: &Context) -> Result<(), Stm32pioError> {
    run_actions(ctx, &ConfigOverrides::default(), vec![Action::Patch]).await
}

pub async fn cmd_build(ctx: &Context) -> Result<(), Stm32pioError> {
    run_actions(ctx, &ConfigOverrides::default(), vec![Action::Build]).await
}

/// Remove everything but the preserved files, after confirmation.
pub async fn cmd_clean(ctx: &Context, yes: bool) -> Result<(), Stm32pioError> {
    if !yes {
        let project = open_project(ctx, &ConfigOverrides::default())?;
        let question = if project.config().project.cleanup_use_git {
            format!("Run `git clean -d --force` in {:?}?", project.path())
        } else {
            format!(
                "Remove everything in {:?} except {:?}?",
                project.path(),
                project.preserved_paths()
            )
        };
        if !confirm(&question, std::io::stdin().lock())? {
            return Err(Stm32pioError::Cancelled("Clean declined".to_string()));
        }
    }
    run_actions(ctx, &ConfigOverrides::default(), vec![Action::Clean]).await
}

/// Ask a yes/no question on stdout and read the answer from `input`.
pub fn confirm(question: &str, mut input: impl BufRead) -> Result<bool, Stm32pioError> {
    print!("{} [y/N] ", question);
    std::io::stdout()
        .flush()
        .map_err(|e| Stm32pioError::IoError(e.to_string()))?;
    let mut answer = String::new();
    input
        .read_line(&mut answer)
        .map_err(|e| Stm32pioError::IoError(e.to_string()))?;
    Ok(matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"))
}

// =============================================================================
// STATUS COMMAND
// =============================================================================

/// Show every stage and the current one.
pub fn cmd_status(ctx: &Context) -> Result<(), Stm32pioError> {
    let project = open_project(ctx, &ConfigOverrides::default())?;
    let state = project.state();

    for failure in state.failures() {
        tracing::debug!("Probe for {:?} failed: {}", failure.stage, failure.reason);
    }
    let last_error = &project.config().project.last_error;
    if !last_error.is_empty() {
        tracing::info!("Last action failed with: {}", last_error);
    }

    if ctx.json_mode {
        print_json(&status_json(&state));
        return Ok(());
    }

    println!("{}", status_text(&state));
    Ok(())
}

/// Checkbox list followed by the current stage.
#[must_use]
pub fn status_text(state: &ProjectState) -> String {
    format!("{}\n\nCurrent stage: {}", state, state.current_stage())
}

#[must_use]
pub fn status_json(state: &ProjectState) -> serde_json::Value {
    let stages: Vec<serde_json::Value> = state
        .iter()
        .filter(|(stage, _)| stage.is_real())
        .map(|(stage, fulfilled)| {
            serde_json::json!({
                "stage": stage,
                "label": stage.label(),
                "fulfilled": fulfilled,
            })
        })
        .collect();
    let verdict = state.verdict();
    serde_json::json!({
        "stages": stages,
        "current_stage": verdict.current_stage,
        "is_consistent": verdict.is_consistent,
        "probe_failures": state.failures(),
    })
}

// =============================================================================
// VALIDATE COMMAND
// =============================================================================

/// Report which external tools can be run.
pub async fn cmd_validate(ctx: &Context) -> Result<(), Stm32pioError> {
    let config = if ctx.directory.is_dir() {
        Config::load(&ctx.directory, &ConfigOverrides::default())?
    } else {
        Config::default()
    };
    let checks = validate(&config.app).await;

    if ctx.json_mode {
        print_json(&serde_json::json!({ "tools": checks }));
    } else {
        for check in &checks {
            println!("{}", check_line(check));
        }
    }

    let failed: Vec<&str> = checks
        .iter()
        .filter(|check| !check.ok)
        .map(|check| check.tool.as_str())
        .collect();
    if failed.is_empty() {
        Ok(())
    } else {
        Err(Stm32pioError::tool(failed.join(", "), "cannot be run"))
    }
}

fn check_line(check: &ToolCheck) -> String {
    let mark = if check.ok { "[ok]  " } else { "[FAIL]" };
    format!("{} {} ({}): {}", mark, check.tool, check.command, check.detail)
}

#[cfg(test)]
mod tests {
    use super::*;
    use stm32pio_core::Stage;

    #[test]
    fn new_chain_order() {
        assert_eq!(
            new_chain(Some("code".to_string()), true),
            vec![
                Action::Init,
                Action::Generate,
                Action::PioInit,
                Action::Patch,
                Action::Build,
                Action::StartEditor("code".to_string()),
            ]
        );
    }

    #[test]
    fn blank_editor_is_ignored() {
        assert_eq!(init_chain(Some("  ".to_string())), vec![Action::Init]);
        assert_eq!(generate_chain(None, false), vec![Action::Generate]);
    }

    #[test]
    fn confirm_accepts_yes_only() {
        assert!(confirm("Sure?", "y\n".as_bytes()).expect("confirm"));
        assert!(confirm("Sure?", "YES\n".as_bytes()).expect("confirm"));
        assert!(!confirm("Sure?", "\n".as_bytes()).expect("confirm"));
        assert!(!confirm("Sure?", "nope\n".as_bytes()).expect("confirm"));
    }

    #[test]
    fn status_text_ends_with_current_stage() {
        let state = ProjectState::from_flags([true, true, false, false, false, false]);
        let text = status_text(&state);
        assert!(text.starts_with("[*]  .ioc file is present"));
        assert!(text.ends_with("Current stage: stm32pio initialized"));
    }

    #[test]
    fn status_json_shape() {
        let state = ProjectState::from_flags([true, false, true, false, false, false]);
        let json = status_json(&state);
        assert_eq!(json["current_stage"], "UNDEFINED");
        assert_eq!(json["is_consistent"], false);
        let stages = json["stages"].as_array().expect("stages");
        assert_eq!(stages.len(), Stage::COUNT - 1);
        assert_eq!(stages[0]["stage"], "EMPTY");
        assert_eq!(stages[2]["fulfilled"], true);
    }
}
