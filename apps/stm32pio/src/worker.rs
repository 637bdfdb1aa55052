//! # Action Queue
//!
//! One tokio task owns a [`Project`] and processes jobs from a channel one at
//! a time. A state query is just another job, so it can never observe a
//! half-finished action and always sees every action queued before it.
//!
//! Distinct projects get distinct queues; nothing is shared between them.

use std::fmt;
use stm32pio_core::{Project, ProjectState, Stm32pioError};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use crate::tools::{cubemx, editor, git, platformio};

/// Pending jobs allowed before `run`/`state` callers wait for room.
const QUEUE_DEPTH: usize = 16;

// =============================================================================
// ACTIONS
// =============================================================================

/// Something that moves a project to a later stage (or back, for `Clean`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Persist the config (INITIALIZED).
    Init,
    /// Run CubeMX (GENERATED).
    Generate,
    /// `platformio project init` (PIO_INITIALIZED).
    PioInit,
    /// Patch `platformio.ini`, drop the scaffold (PATCHED).
    Patch,
    /// `platformio run` (BUILT).
    Build,
    /// Remove everything but the preserved files.
    Clean,
    /// Open the project in the given editor.
    StartEditor(String),
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Init => f.write_str("init"),
            Action::Generate => f.write_str("generate"),
            Action::PioInit => f.write_str("pio_init"),
            Action::Patch => f.write_str("patch"),
            Action::Build => f.write_str("build"),
            Action::Clean => f.write_str("clean"),
            Action::StartEditor(editor) => write!(f, "start_editor({})", editor),
        }
    }
}

/// How one action of a chain ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionOutcome {
    Completed,
    Failed(String),
    /// Not run because an earlier action of the chain failed.
    Skipped,
}

impl ActionOutcome {
    #[must_use]
    pub fn is_completed(&self) -> bool {
        matches!(self, ActionOutcome::Completed)
    }
}

/// Turn the outcomes of a chain into the first failure, if any.
pub fn first_failure(actions: &[Action], outcomes: &[ActionOutcome]) -> Result<(), Stm32pioError> {
    for (action, outcome) in actions.iter().zip(outcomes) {
        if let ActionOutcome::Failed(reason) = outcome {
            return Err(Stm32pioError::Action {
                action: action.to_string(),
                reason: reason.clone(),
            });
        }
    }
    Ok(())
}

// =============================================================================
// QUEUE
// =============================================================================

enum Job {
    Run {
        actions: Vec<Action>,
        reply: oneshot::Sender<Vec<ActionOutcome>>,
    },
    State {
        reply: oneshot::Sender<ProjectState>,
    },
}

/// Single-slot sequential executor bound to one project.
pub struct ActionQueue {
    sender: mpsc::Sender<Job>,
    worker: JoinHandle<Project>,
}

impl ActionQueue {
    /// Move `project` into a new worker task.
    pub fn spawn(project: Project, verbose: bool) -> Self {
        let (sender, receiver) = mpsc::channel(QUEUE_DEPTH);
        let worker = tokio::spawn(work(project, receiver, verbose));
        Self { sender, worker }
    }

    /// Run `actions` in order, stopping at the first failure.
    ///
    /// Returns one outcome per action.
    pub async fn run(&self, actions: Vec<Action>) -> Result<Vec<ActionOutcome>, Stm32pioError> {
        let (reply, answer) = oneshot::channel();
        self.sender
            .send(Job::Run { actions, reply })
            .await
            .map_err(|_| worker_gone())?;
        answer.await.map_err(|_| worker_gone())
    }

    /// Fresh snapshot, taken after every previously queued job.
    pub async fn state(&self) -> Result<ProjectState, Stm32pioError> {
        let (reply, answer) = oneshot::channel();
        self.sender
            .send(Job::State { reply })
            .await
            .map_err(|_| worker_gone())?;
        answer.await.map_err(|_| worker_gone())
    }

    /// Let the worker finish queued jobs, then hand the project back.
    pub async fn shutdown(self) -> Result<Project, Stm32pioError> {
        drop(self.sender);
        self.worker
            .await
            .map_err(|e| Stm32pioError::Cancelled(format!("Worker task failed: {}", e)))
    }
}

fn worker_gone() -> Stm32pioError {
    Stm32pioError::Cancelled("Action queue is closed".to_string())
}

// =============================================================================
// WORKER
// =============================================================================

async fn work(mut project: Project, mut receiver: mpsc::Receiver<Job>, verbose: bool) -> Project {
    while let Some(job) = receiver.recv().await {
        match job {
            Job::Run { actions, reply } => {
                let outcomes = run_chain(&mut project, &actions, verbose).await;
                // Nobody waiting is fine; the effects are on disk either way
                let _ = reply.send(outcomes);
            }
            Job::State { reply } => {
                let _ = reply.send(project.state());
            }
        }
    }
    project
}

async fn run_chain(project: &mut Project, actions: &[Action], verbose: bool) -> Vec<ActionOutcome> {
    let mut outcomes = Vec::with_capacity(actions.len());
    let mut failure = None;

    for action in actions {
        if failure.is_some() {
            tracing::debug!("Skipping {}", action);
            outcomes.push(ActionOutcome::Skipped);
            continue;
        }
        tracing::debug!("Running {}", action);
        match perform(project, action, verbose).await {
            Ok(()) => outcomes.push(ActionOutcome::Completed),
            Err(e) => {
                let reason = e.to_string();
                outcomes.push(ActionOutcome::Failed(reason.clone()));
                failure = Some(reason);
            }
        }
    }

    remember_outcome(project, failure.as_deref());
    outcomes
}

/// Persist the failure into `last_error`, or clear a stale one.
fn remember_outcome(project: &mut Project, failure: Option<&str>) {
    if failure.is_none() && project.config().project.last_error.is_empty() {
        return;
    }
    match project.record_last_error(failure) {
        Ok(true) => tracing::debug!("last_error updated"),
        Ok(false) => {}
        Err(e) => tracing::warn!("Cannot record last error: {}", e),
    }
}

async fn perform(project: &Project, action: &Action, verbose: bool) -> Result<(), Stm32pioError> {
    match action {
        Action::Init => {
            let path = project.save_config()?;
            if project.config().project.board.is_empty() {
                tracing::warn!("No PlatformIO board set, pass one with --board before pio-init");
            }
            tracing::info!("Project initialized, config written to {:?}", path);
            Ok(())
        }
        Action::Generate => cubemx::generate(project, verbose).await,
        Action::PioInit => platformio::init(project, verbose).await,
        Action::Patch => {
            let report = project.patch()?;
            if report.already_patched {
                tracing::info!("platformio.ini is already patched");
            } else {
                tracing::info!("platformio.ini patched");
            }
            for dir in &report.removed {
                tracing::debug!("Removed {:?}", dir);
            }
            Ok(())
        }
        Action::Build => platformio::build(project, verbose).await,
        Action::Clean => {
            if project.config().project.cleanup_use_git {
                git::clean(project.path(), verbose).await
            } else {
                let removed = project.clean_files()?;
                for path in &removed {
                    tracing::debug!("Removed {:?}", path);
                }
                tracing::info!("Project cleaned, {} entries removed", removed.len());
                Ok(())
            }
        }
        Action::StartEditor(name) => editor::start(name, project.path(), verbose).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_failure_names_the_action() {
        let actions = [Action::Init, Action::Patch, Action::Build];
        let outcomes = [
            ActionOutcome::Completed,
            ActionOutcome::Failed("no platformio.ini".to_string()),
            ActionOutcome::Skipped,
        ];
        let err = first_failure(&actions, &outcomes).expect_err("failure");
        assert!(matches!(err, Stm32pioError::Action { ref action, .. } if action == "patch"));
    }

    #[test]
    fn all_completed_is_ok() {
        let actions = [Action::Init];
        assert!(first_failure(&actions, &[ActionOutcome::Completed]).is_ok());
    }

    #[test]
    fn action_names() {
        assert_eq!(Action::PioInit.to_string(), "pio_init");
        assert_eq!(Action::StartEditor("code".to_string()).to_string(), "start_editor(code)");
    }
}
