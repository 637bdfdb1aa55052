//! # Project State Inference
//!
//! Derives which life-cycle stages a project has completed from nothing but
//! the contents of its directory.
//!
//! ## Pipeline
//!
//! ```text
//! ProjectProbe ──► PredicateSet ──► ProjectState ──► resolve()
//!  (fs reads)      (AND of bools,    (Stage → bool,    (current stage,
//!                   errors → false)   ordinal order)    consistency)
//! ```
//!
//! Evaluation is total: a probe error degrades its condition to `false` and is
//! recorded as a [`ProbeFailure`], but never escapes [`ProjectState::probe`].

use crate::primitives::{
    CASE_PROBE_DIR, FIRMWARE_MARKER, GENERATED_DIRS, PIO_BUILD_DIR, SCAFFOLD_INCLUDE_DIR,
    SCAFFOLD_SRC_DIR,
};
use crate::probe::ProjectProbe;
use crate::{Stage, Stm32pioError};
use serde::{Deserialize, Serialize};

// =============================================================================
// PROBE FAILURES
// =============================================================================

/// A probe that errored while evaluating a stage and was counted as `false`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeFailure {
    /// Stage whose condition was degraded.
    pub stage: Stage,
    /// Error text of the failed probe.
    pub reason: String,
}

// =============================================================================
// PREDICATE SET
// =============================================================================

/// Per-stage conditions evaluated against a [`ProjectProbe`].
///
/// A stage is fulfilled iff every one of its conditions holds.
pub struct PredicateSet<'a, P: ProjectProbe + ?Sized> {
    probe: &'a P,
    failures: Vec<ProbeFailure>,
    pio_initialized: Option<bool>,
}

impl<'a, P: ProjectProbe + ?Sized> PredicateSet<'a, P> {
    /// Create a predicate set over `probe`.
    pub fn new(probe: &'a P) -> Self {
        Self {
            probe,
            failures: Vec::new(),
            pio_initialized: None,
        }
    }

    /// Evaluate the conditions of `stage`, in order. Never empty.
    pub fn conditions(&mut self, stage: Stage) -> Vec<bool> {
        match stage {
            Stage::Undefined => vec![true],
            Stage::Empty => vec![self.probe.ioc_is_file()],
            Stage::Initialized => vec![self.probe.config_is_file()],
            Stage::Generated => GENERATED_DIRS
                .iter()
                .map(|dir| self.dir_is_non_empty(stage, dir))
                .collect(),
            Stage::PioInitialized => vec![self.pio_initialized()],
            Stage::Patched => {
                // The patch is only meaningful on top of an initialized platformio.ini
                let patched = if self.pio_initialized() {
                    let result = self.probe.platformio_patched();
                    self.fold(stage, result)
                } else {
                    false
                };
                vec![
                    patched,
                    !self.probe.is_dir(SCAFFOLD_INCLUDE_DIR),
                    self.src_scaffold_removed(),
                ]
            }
            Stage::Built => {
                let result = self
                    .probe
                    .tree_has_file_named(PIO_BUILD_DIR, FIRMWARE_MARKER);
                vec![self.probe.is_dir(PIO_BUILD_DIR) && self.fold(stage, result)]
            }
        }
    }

    /// Whether every condition of `stage` holds.
    pub fn is_fulfilled(&mut self, stage: Stage) -> bool {
        self.conditions(stage).into_iter().all(|condition| condition)
    }

    /// Probe errors collected so far.
    pub fn into_failures(self) -> Vec<ProbeFailure> {
        self.failures
    }

    fn pio_initialized(&mut self) -> bool {
        if let Some(cached) = self.pio_initialized {
            return cached;
        }
        let result = self.probe.platformio_initialized();
        let initialized = self.fold(Stage::PioInitialized, result);
        self.pio_initialized = Some(initialized);
        initialized
    }

    fn dir_is_non_empty(&mut self, stage: Stage, dir: &str) -> bool {
        if !self.probe.is_dir(dir) {
            return false;
        }
        let result = self.probe.list_dir(dir).map(|entries| !entries.is_empty());
        self.fold(stage, result)
    }

    /// `src` can only be told apart from `Src` on a case-sensitive filesystem.
    /// If `SRC` resolves, the filesystem conflates them and there is no
    /// separate scaffold to look for.
    fn src_scaffold_removed(&self) -> bool {
        self.probe.is_dir(CASE_PROBE_DIR) || !self.probe.is_dir(SCAFFOLD_SRC_DIR)
    }

    fn fold(&mut self, stage: Stage, result: Result<bool, Stm32pioError>) -> bool {
        match result {
            Ok(value) => value,
            Err(e) => {
                self.failures.push(ProbeFailure {
                    stage,
                    reason: e.to_string(),
                });
                false
            }
        }
    }
}

// =============================================================================
// CONSISTENCY RESOLVER
// =============================================================================

/// Fold stage flags (in ordinal order) into the current stage.
///
/// The current stage is the last fulfilled stage of the contiguous fulfilled
/// prefix. A fulfilled stage after an unfulfilled one means the directory was
/// tampered with, and the answer becomes [`Stage::Undefined`].
pub fn resolve<I>(flags: I) -> Stage
where
    I: IntoIterator<Item = (Stage, bool)>,
{
    let mut current = Stage::Undefined;
    let mut gap_found = false;
    for (stage, fulfilled) in flags {
        if fulfilled {
            if gap_found {
                return Stage::Undefined;
            }
            current = stage;
        } else {
            gap_found = true;
        }
    }
    current
}

/// Current stage plus consistency flag, derived from one snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verdict {
    /// Highest stage of the contiguous fulfilled prefix, or UNDEFINED.
    pub current_stage: Stage,
    /// `true` exactly when `current_stage` is a real stage.
    pub is_consistent: bool,
}

impl Verdict {
    fn from_stage(current_stage: Stage) -> Self {
        Self {
            current_stage,
            is_consistent: current_stage.is_real(),
        }
    }
}

// =============================================================================
// STATE SNAPSHOT
// =============================================================================

/// Ordered Stage → fulfilled mapping taken at one instant.
///
/// Stale as soon as it is returned if anything else touches the directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectState {
    fulfilled: [bool; Stage::COUNT],
    failures: Vec<ProbeFailure>,
}

impl ProjectState {
    /// Evaluate every stage once, in ordinal order.
    pub fn probe<P: ProjectProbe + ?Sized>(probe: &P) -> Self {
        let mut predicates = PredicateSet::new(probe);
        let mut fulfilled = [false; Stage::COUNT];
        for stage in Stage::ALL {
            fulfilled[stage.index()] = predicates.is_fulfilled(stage);
        }
        Self {
            fulfilled,
            failures: predicates.into_failures(),
        }
    }

    /// Build a snapshot from flags for the real stages (EMPTY..BUILT).
    /// The sentinel is always fulfilled.
    #[must_use]
    pub fn from_flags(real: [bool; Stage::COUNT - 1]) -> Self {
        let mut fulfilled = [true; Stage::COUNT];
        fulfilled[1..].copy_from_slice(&real);
        Self {
            fulfilled,
            failures: Vec::new(),
        }
    }

    /// Whether `stage` is fulfilled in this snapshot.
    #[must_use]
    pub fn get(&self, stage: Stage) -> bool {
        self.fulfilled[stage.index()]
    }

    /// `(stage, fulfilled)` pairs in ordinal order, sentinel first.
    pub fn iter(&self) -> impl Iterator<Item = (Stage, bool)> + '_ {
        Stage::ALL.into_iter().map(|stage| (stage, self.get(stage)))
    }

    /// Probe errors that were degraded to `false`.
    #[must_use]
    pub fn failures(&self) -> &[ProbeFailure] {
        &self.failures
    }

    /// Resolve current stage and consistency from this snapshot.
    #[must_use]
    pub fn verdict(&self) -> Verdict {
        Verdict::from_stage(resolve(self.iter()))
    }

    #[must_use]
    pub fn current_stage(&self) -> Stage {
        self.verdict().current_stage
    }

    #[must_use]
    pub fn is_consistent(&self) -> bool {
        self.verdict().is_consistent
    }
}

impl std::fmt::Display for ProjectState {
    /// One checkbox line per real stage.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut first = true;
        for (stage, fulfilled) in self.iter().filter(|(stage, _)| stage.is_real()) {
            if !first {
                writeln!(f)?;
            }
            first = false;
            let mark = if fulfilled { "[*]" } else { "[ ]" };
            write!(f, "{}  {}", mark, stage.label())?;
        }
        Ok(())
    }
}

// =============================================================================
// TESTS
// =============================================================================
