//! Session control tests for the calis binary.
//!
//! These tests drive a running session through stdin:
//! - 'q' stops the session without saving
//! - 'f' finishes early and saves, reading the memo from the next line
//! - 'p' pauses and resumes

use assert_cmd::Command;
use predicates::prelude::*;
use std::path::Path;
use tempfile::TempDir;

/// Helper to get the CLI binary, isolated from the user's real config
fn cli(data_dir: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("calis"));
    cmd.env("XDG_CONFIG_HOME", data_dir.join("config"))
        .arg("--data-dir")
        .arg(data_dir);
    cmd
}

fn setup_member_with_routine(work: &str) -> TempDir {
    let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
    let data_dir = temp_dir.path();

    cli(data_dir)
        .args(["signup", "--email", "a@example.com", "--password", "pw"])
        .assert()
        .success();
    cli(data_dir)
        .args(["routine", "add", "--name", "Burpee", "--work", work, "--rest", "0"])
        .assert()
        .success();

    temp_dir
}

fn start(data_dir: &Path, stdin: &str) -> assert_cmd::assert::Assert {
    cli(data_dir)
        .args(["start", "--silent", "--tick-millis", "1000"])
        .write_stdin(stdin)
        .timeout(std::time::Duration::from_secs(20))
        .assert()
}

fn history(data_dir: &Path) -> assert_cmd::assert::Assert {
    cli(data_dir)
        .args(["history", "list"])
        .assert()
}

#[test]
fn test_stop_discards_session_and_routine() {
    let temp_dir = setup_member_with_routine("600");
    let data_dir = temp_dir.path();

    start(data_dir, "q\n")
        .success()
        .stdout(predicate::str::contains("Session stopped"))
        .stdout(predicate::str::contains("Workout complete").not());

    history(data_dir)
        .success()
        .stdout(predicate::str::contains("No completed workouts yet"));

    cli(data_dir)
        .args(["routine", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Routine is empty"));
}

#[test]
fn test_finish_early_saves_with_memo_from_stdin() {
    let temp_dir = setup_member_with_routine("600");
    let data_dir = temp_dir.path();

    start(data_dir, "f\nshort on time\n")
        .success()
        .stdout(predicate::str::contains("Workout complete! 10m 0s"))
        .stdout(predicate::str::contains("Session saved"));

    history(data_dir)
        .success()
        .stdout(predicate::str::contains("Memo: short on time"));
}

#[test]
fn test_pause_then_stop() {
    let temp_dir = setup_member_with_routine("600");
    let data_dir = temp_dir.path();

    start(data_dir, "p\nq\n")
        .success()
        .stdout(predicate::str::contains("[paused]"))
        .stdout(predicate::str::contains("Session stopped"));
}

#[test]
fn test_closed_stdin_lets_session_run_out() {
    let temp_dir = setup_member_with_routine("1");
    let data_dir = temp_dir.path();

    start(data_dir, "")
        .success()
        .stdout(predicate::str::contains("Workout complete! 0m 1s"));

    history(data_dir)
        .success()
        .stdout(predicate::str::contains("0m 1s total"))
        .stdout(predicate::str::contains("Memo").not());
}
