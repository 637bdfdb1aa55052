//! # Property-Based Tests
//!
//! Resolver invariants over arbitrary stage flag patterns.

use proptest::prelude::*;
use stm32pio_core::{ProjectState, Stage, resolve};

const REAL: usize = Stage::COUNT - 1;

fn flags_with_prefix(len: usize) -> [bool; REAL] {
    let mut flags = [false; REAL];
    for flag in flags.iter_mut().take(len) {
        *flag = true;
    }
    flags
}

// =============================================================================
// PROPERTY TESTS
// =============================================================================

proptest! {
    /// A contiguous prefix of fulfilled stages resolves to its last stage.
    #[test]
    fn contiguous_prefix_is_consistent(len in 1usize..=REAL) {
        let state = ProjectState::from_flags(flags_with_prefix(len));

        prop_assert_eq!(state.current_stage(), Stage::ALL[len]);
        prop_assert!(state.is_consistent());
    }

    /// Any fulfilled stage after an unfulfilled one invalidates everything.
    #[test]
    fn gap_is_inconsistent(
        flags in proptest::array::uniform6(any::<bool>()),
        gap in 0usize..REAL - 1,
        offset in 1usize..REAL,
    ) {
        let mut flags = flags;
        let later = (gap + offset).min(REAL - 1);
        prop_assume!(later > gap);
        flags[gap] = false;
        flags[later] = true;

        let state = ProjectState::from_flags(flags);
        prop_assert_eq!(state.current_stage(), Stage::Undefined);
        prop_assert!(!state.is_consistent());
    }

    /// The verdict never depends on anything but the ordered flags.
    #[test]
    fn verdict_matches_free_resolver(flags in proptest::array::uniform6(any::<bool>())) {
        let state = ProjectState::from_flags(flags);
        let verdict = state.verdict();

        prop_assert_eq!(verdict.current_stage, resolve(state.iter()));
        prop_assert_eq!(verdict.is_consistent, verdict.current_stage != Stage::Undefined);
        prop_assert!(state.get(Stage::Undefined));
    }

    /// A consistent verdict always names a fulfilled stage whose predecessors are all fulfilled.
    #[test]
    fn consistent_stage_has_fulfilled_prefix(flags in proptest::array::uniform6(any::<bool>())) {
        let state = ProjectState::from_flags(flags);
        let current = state.current_stage();
        if state.is_consistent() {
            prop_assert!(state.get(current));
            for stage in Stage::real().filter(|stage| *stage <= current) {
                prop_assert!(state.get(stage));
            }
            for stage in Stage::real().filter(|stage| *stage > current) {
                prop_assert!(!state.get(stage));
            }
        }
    }
}

// =============================================================================
// VACUOUS CASE
// =============================================================================

#[test]
fn nothing_fulfilled_is_undefined_and_inconsistent() {
    let state = ProjectState::from_flags([false; REAL]);
    assert_eq!(state.current_stage(), Stage::Undefined);
    assert!(!state.is_consistent());
}
