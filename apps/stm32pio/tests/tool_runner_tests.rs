//! Subprocess runner tests against the POSIX shell.

// Allow unwrap and panic in tests - these are standard for test code
#![allow(clippy::unwrap_used, clippy::panic)]
#![cfg(unix)]

use stm32pio::tools::{Invocation, run_tool};
use stm32pio_core::Stm32pioError;

fn shell(script: &str) -> Invocation {
    Invocation::new("shell", "sh").arg("-c").arg(script)
}

#[tokio::test]
async fn captures_both_streams_line_by_line() {
    let output = run_tool(&shell("echo one; echo two; echo oops >&2"), false)
        .await
        .unwrap();

    assert!(output.success());
    assert_eq!(output.stdout(), &["one".to_string(), "two".to_string()]);
    assert_eq!(output.stderr(), &["oops".to_string()]);
    assert_eq!(output.lines().collect::<Vec<_>>(), vec!["one", "two", "oops"]);
}

#[tokio::test]
async fn non_zero_exit_is_reported_by_ensure_success() {
    let output = run_tool(&shell("echo failing; exit 3"), false).await.unwrap();
    assert_eq!(output.code(), Some(3));

    let err = output.ensure_success(false).unwrap_err();
    match err {
        Stm32pioError::Tool { tool, reason } => {
            assert_eq!(tool, "shell");
            assert!(reason.contains('3'));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn runs_in_requested_directory() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("marker.txt"), "").unwrap();

    let output = run_tool(&shell("ls").current_dir(dir.path()), true)
        .await
        .unwrap()
        .ensure_success(true)
        .unwrap();
    assert!(output.stdout().iter().any(|line| line == "marker.txt"));
}

#[tokio::test]
async fn stdin_is_closed() {
    // `cat` would block forever on an inherited terminal
    let output = run_tool(&Invocation::new("cat", "cat"), false).await.unwrap();
    assert!(output.success());
    assert!(output.stdout().is_empty());
}

#[tokio::test]
async fn invalid_utf8_line_does_not_end_capture() {
    let script = r"printf 'caf\351\n'; i=0; while [ $i -lt 200 ]; do echo line $i; i=$((i+1)); done; echo '[ERROR] generation failed'";
    let output = run_tool(&shell(script), false).await.unwrap();

    assert!(output.success());
    assert_eq!(output.stdout().len(), 202);
    assert!(output.stdout()[0].contains('\u{FFFD}'));
    assert!(output.stdout()[201].contains("[ERROR]"));
    assert!(output.lines().any(|line| line.contains("[ERROR]")));
}
