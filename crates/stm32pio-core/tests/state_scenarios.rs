//! # Project State Scenarios
//!
//! On-disk fixtures walked through the life cycle, plus fail-closed probing.
//!
//! ## Groups
//! - Layout scenarios: descriptor only, config, generated code, scaffold leftovers
//! - Tampering: a finished project with generated code deleted by hand
//! - Fail-closed probes: a probe that errors only degrades its own stage

use std::path::{Path, PathBuf};
use stm32pio_core::config::DEFAULT_PLATFORMIO_INI_PATCH;
use stm32pio_core::primitives::{CONFIG_FILE_NAME, PLATFORMIO_INI};
use stm32pio_core::{
    ConfigOverrides, Project, ProjectProbe, ProjectState, Stage, Stm32pioError, Verdict,
};
use tempfile::TempDir;

// =============================================================================
// FIXTURES
// =============================================================================

const IOC: &str = "Mcu.UserName=STM32F031K6Tx\nProjectManager.TargetToolchain=Other Toolchains (GPDSC)\n";
const FRESH_INI: &str = "[env:nucleo_f031k6]\nplatform = ststm32\nboard = nucleo_f031k6\nframework = stm32cube\n";

fn write(root: &Path, relative: &str, content: &str) {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).expect("mkdir");
    }
    std::fs::write(path, content).expect("write");
}

fn empty_project() -> TempDir {
    let dir = tempfile::tempdir().expect("tempdir");
    write(dir.path(), "blink.ioc", IOC);
    dir
}

fn add_config(dir: &TempDir) {
    write(dir.path(), CONFIG_FILE_NAME, "[project]\nboard = \"nucleo_f031k6\"\n");
}

fn add_generated(dir: &TempDir) {
    write(dir.path(), "Inc/main.h", "");
    write(dir.path(), "Src/main.c", "");
}

fn add_patched_ini(dir: &TempDir) {
    write(
        dir.path(),
        PLATFORMIO_INI,
        &format!("{}\n{}", FRESH_INI, DEFAULT_PLATFORMIO_INI_PATCH),
    );
}

fn add_firmware(dir: &TempDir) {
    write(dir.path(), ".pio/build/nucleo_f031k6/firmware.bin", "");
}

fn built_project() -> TempDir {
    let dir = empty_project();
    add_config(&dir);
    add_generated(&dir);
    add_patched_ini(&dir);
    add_firmware(&dir);
    dir
}

fn open(dir: &TempDir) -> Project {
    Project::open(dir.path(), &ConfigOverrides::default()).expect("open")
}

fn real_flags(state: &ProjectState) -> Vec<bool> {
    Stage::real().map(|stage| state.get(stage)).collect()
}

// =============================================================================
// LAYOUT SCENARIOS
// =============================================================================

mod layouts {
    use super::*;

    #[test]
    fn descriptor_only_is_empty_stage() {
        let dir = empty_project();
        let state = open(&dir).state();

        assert_eq!(
            real_flags(&state),
            vec![true, false, false, false, false, false]
        );
        assert_eq!(state.current_stage(), Stage::Empty);
        assert!(state.is_consistent());
    }

    #[test]
    fn config_file_is_initialized_stage() {
        let dir = empty_project();
        add_config(&dir);
        let state = open(&dir).state();

        assert!(state.get(Stage::Initialized));
        assert_eq!(state.current_stage(), Stage::Initialized);
        assert!(state.is_consistent());
    }

    #[test]
    fn one_empty_generated_dir_is_not_generated() {
        let dir = empty_project();
        add_config(&dir);
        write(dir.path(), "Inc/main.h", "");
        std::fs::create_dir_all(dir.path().join("Src")).expect("mkdir");

        let state = open(&dir).state();
        assert!(!state.get(Stage::Generated));
        assert_eq!(state.current_stage(), Stage::Initialized);
    }

    #[test]
    fn fresh_platformio_project_is_pio_initialized() {
        let dir = empty_project();
        add_config(&dir);
        add_generated(&dir);
        write(dir.path(), PLATFORMIO_INI, FRESH_INI);
        std::fs::create_dir_all(dir.path().join("include")).expect("mkdir");

        let state = open(&dir).state();
        assert!(state.get(Stage::PioInitialized));
        assert!(!state.get(Stage::Patched));
        assert_eq!(state.current_stage(), Stage::PioInitialized);
    }

    #[test]
    fn scaffold_leftover_blocks_patched() {
        let dir = empty_project();
        add_config(&dir);
        add_generated(&dir);
        add_patched_ini(&dir);
        std::fs::create_dir_all(dir.path().join("include")).expect("mkdir");

        let project = open(&dir);
        assert!(project.platformio_patched().expect("probe"));

        let state = project.state();
        assert!(!state.get(Stage::Patched));
        assert_eq!(state.current_stage(), Stage::PioInitialized);
    }

    #[test]
    fn src_scaffold_blocks_patched_on_case_sensitive_fs() {
        let dir = empty_project();
        add_config(&dir);
        add_generated(&dir);
        add_patched_ini(&dir);
        if dir.path().join("SRC").is_dir() {
            // Case-insensitive filesystem: `src` is `Src`, nothing to check
            return;
        }
        std::fs::create_dir_all(dir.path().join("src")).expect("mkdir");

        assert!(!open(&dir).state().get(Stage::Patched));
    }

    #[test]
    fn full_sequence_is_built() {
        let dir = built_project();
        let state = open(&dir).state();

        assert_eq!(real_flags(&state), vec![true; 6]);
        assert_eq!(state.current_stage(), Stage::Built);
        assert!(state.is_consistent());
        assert!(state.failures().is_empty());
    }

    #[test]
    fn pio_dir_without_firmware_is_not_built() {
        let dir = built_project();
        std::fs::remove_file(dir.path().join(".pio/build/nucleo_f031k6/firmware.bin"))
            .expect("rm");
        write(dir.path(), ".pio/build/nucleo_f031k6/main.o", "");

        let state = open(&dir).state();
        assert!(!state.get(Stage::Built));
        assert_eq!(state.current_stage(), Stage::Patched);
    }
}

// =============================================================================
// TAMPERING
// =============================================================================

mod tampering {
    use super::*;

    #[test]
    fn deleted_generated_code_is_messed_up() {
        let dir = built_project();
        std::fs::remove_dir_all(dir.path().join("Inc")).expect("rm");
        std::fs::remove_dir_all(dir.path().join("Src")).expect("rm");

        let state = open(&dir).state();
        assert!(!state.get(Stage::Generated));
        assert!(state.get(Stage::PioInitialized));
        assert!(state.get(Stage::Patched));
        assert!(state.get(Stage::Built));
        assert_eq!(state.current_stage(), Stage::Undefined);
        assert!(!state.is_consistent());
    }

    #[test]
    fn deleted_descriptor_after_open_is_messed_up() {
        let dir = empty_project();
        add_config(&dir);
        let project = open(&dir);
        std::fs::remove_file(dir.path().join("blink.ioc")).expect("rm");

        let state = project.state();
        assert!(!state.get(Stage::Empty));
        assert_eq!(state.current_stage(), Stage::Undefined);
    }

    #[test]
    fn repeated_queries_are_identical() {
        let dir = built_project();
        let project = open(&dir);
        assert_eq!(project.state(), project.state());
    }

    #[test]
    fn state_follows_filesystem_changes() {
        let dir = empty_project();
        let project = open(&dir);
        assert_eq!(project.verdict().current_stage, Stage::Empty);

        project.save_config().expect("save");
        assert_eq!(
            project.verdict(),
            Verdict {
                current_stage: Stage::Initialized,
                is_consistent: true,
            }
        );
    }

    #[test]
    fn verdict_of_broken_chain_is_inconsistent() {
        let dir = built_project();
        std::fs::remove_file(dir.path().join(CONFIG_FILE_NAME)).expect("remove config");
        let project = open(&dir);

        let verdict = project.verdict();
        assert_eq!(verdict.current_stage, Stage::Undefined);
        assert!(!verdict.is_consistent);
        assert_eq!(verdict, project.state().verdict());
    }
}

// =============================================================================
// FAIL-CLOSED PROBES
// =============================================================================

mod fail_closed {
    use super::*;

    /// Reports a finished project, except that chosen probes error.
    struct FlakyProbe {
        broken_patch: bool,
        broken_listing: bool,
    }

    impl ProjectProbe for FlakyProbe {
        fn ioc_is_file(&self) -> bool {
            true
        }

        fn config_is_file(&self) -> bool {
            true
        }

        fn is_dir(&self, relative: &str) -> bool {
            matches!(relative, "Inc" | "Src" | ".pio")
        }

        fn list_dir(&self, relative: &str) -> Result<Vec<PathBuf>, Stm32pioError> {
            if self.broken_listing {
                return Err(Stm32pioError::IoError("permission denied".to_string()));
            }
            Ok(vec![PathBuf::from(relative).join("main.c")])
        }

        fn platformio_initialized(&self) -> Result<bool, Stm32pioError> {
            Ok(true)
        }

        fn platformio_patched(&self) -> Result<bool, Stm32pioError> {
            if self.broken_patch {
                return Err(Stm32pioError::PlatformioIni("corrupt".to_string()));
            }
            Ok(true)
        }

        fn tree_has_file_named(&self, _relative: &str, _marker: &str) -> Result<bool, Stm32pioError> {
            Ok(true)
        }
    }

    #[test]
    fn healthy_fake_is_built() {
        let probe = FlakyProbe {
            broken_patch: false,
            broken_listing: false,
        };
        let state = ProjectState::probe(&probe);
        assert_eq!(state.current_stage(), Stage::Built);
    }

    #[test]
    fn failing_patch_probe_only_degrades_patched() {
        let probe = FlakyProbe {
            broken_patch: true,
            broken_listing: false,
        };
        let state = ProjectState::probe(&probe);

        assert!(state.get(Stage::PioInitialized));
        assert!(!state.get(Stage::Patched));
        assert!(state.get(Stage::Built));
        assert_eq!(state.current_stage(), Stage::Undefined);

        assert_eq!(state.failures().len(), 1);
        assert_eq!(state.failures()[0].stage, Stage::Patched);
        assert!(state.failures()[0].reason.contains("corrupt"));
    }

    #[test]
    fn failing_listing_degrades_generated() {
        let probe = FlakyProbe {
            broken_patch: false,
            broken_listing: true,
        };
        let state = ProjectState::probe(&probe);

        assert!(!state.get(Stage::Generated));
        assert!(
            state
                .failures()
                .iter()
                .all(|failure| failure.stage == Stage::Generated)
        );
        assert_eq!(state.failures().len(), 2);
    }

    #[test]
    fn corrupt_platformio_ini_on_disk_is_not_initialized() {
        let dir = empty_project();
        add_config(&dir);
        add_generated(&dir);
        write(dir.path(), PLATFORMIO_INI, "[platformio\ninclude_dir = Inc\n");

        let state = open(&dir).state();
        assert!(!state.get(Stage::PioInitialized));
        assert!(!state.get(Stage::Patched));
        assert_eq!(state.current_stage(), Stage::Generated);
        assert!(!state.failures().is_empty());
    }
}
