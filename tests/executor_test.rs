//! Tests for the streaming command runner
//!
//! Driven through `sh -c`, which is as external as the real build and
//! cluster tools from the runner's point of view.

use std::io::ErrorKind;

use tempfile::TempDir;

use cdf_dev::executor::{CommandRunner, Invocation, StreamingRunner};

#[ctor::ctor]
fn init() {
    cdf_dev::util::testing::init_test_setup();
}

fn sh(script: &str) -> Invocation {
    Invocation::new(["sh", "-c", script]).quiet()
}

// ============================================================
// Capture correctness
// ============================================================

#[test]
fn given_stdout_lines_when_executed_then_captured_in_order() {
    let result = StreamingRunner
        .execute(&sh("echo first; echo second; echo third"))
        .unwrap();

    assert_eq!(result.exit_code, 0);
    assert!(result.success());
    assert_eq!(result.stdout, "first\nsecond\nthird\n");
    assert_eq!(result.stderr, "");
}

#[test]
fn given_both_streams_when_executed_then_captured_separately() {
    let result = StreamingRunner
        .execute(&sh("echo out; echo err1 >&2; echo err2 >&2"))
        .unwrap();

    assert_eq!(result.stdout, "out\n");
    assert_eq!(result.stderr, "err1\nerr2\n");
}

#[test]
fn given_print_output_enabled_when_executed_then_capture_unchanged() {
    // The echo goes to the test harness; capture must be identical either way.
    let result = StreamingRunner
        .execute(&Invocation::new(["sh", "-c", "echo visible; echo hidden >&2"]))
        .unwrap();

    assert_eq!(result.stdout, "visible\n");
    assert_eq!(result.stderr, "hidden\n");
}

#[test]
fn given_many_lines_when_executed_then_no_trailing_output_lost() {
    let result = StreamingRunner.execute(&sh("seq 1 200")).unwrap();

    let lines: Vec<&str> = result.stdout.lines().collect();
    assert_eq!(lines.len(), 200);
    assert_eq!(lines[0], "1");
    assert_eq!(lines[199], "200");
}

// ============================================================
// Exit codes
// ============================================================

#[test]
fn given_nonzero_exit_when_executed_then_reported_not_error() {
    let result = StreamingRunner.execute(&sh("exit 7")).unwrap();

    assert_eq!(result.exit_code, 7);
    assert!(!result.success());
}

#[test]
fn given_failing_command_when_executed_then_stderr_still_captured() {
    let result = StreamingRunner
        .execute(&sh("echo broken >&2; exit 3"))
        .unwrap();

    assert_eq!(result.exit_code, 3);
    assert_eq!(result.stderr, "broken\n");
}

// ============================================================
// Environment and working directory
// ============================================================

#[test]
fn given_env_overlay_when_executed_then_child_sees_variable() {
    let invocation =
        sh(r#"printf '%s\n' "$CDF_DEV_TEST_VALUE""#).env("CDF_DEV_TEST_VALUE", "overlay");
    let result = StreamingRunner.execute(&invocation).unwrap();

    assert_eq!(result.stdout, "overlay\n");
}

#[test]
fn given_no_overlay_when_executed_then_parent_env_inherited() {
    // PATH is always present in the parent; the child must see it too.
    let result = StreamingRunner
        .execute(&sh(r#"test -n "$PATH" && echo inherited"#))
        .unwrap();

    assert_eq!(result.stdout, "inherited\n");
}

#[test]
fn given_working_dir_when_executed_then_child_runs_there() {
    let temp = TempDir::new().unwrap();
    let invocation = Invocation::new(["sh", "-c", "pwd"])
        .quiet()
        .working_dir(temp.path());
    let result = StreamingRunner.execute(&invocation).unwrap();

    let expected = temp.path().canonicalize().unwrap();
    assert_eq!(result.stdout.trim_end(), expected.to_str().unwrap());
}

// ============================================================
// Start failures
// ============================================================

#[test]
fn given_missing_program_when_executed_then_start_error() {
    let err = StreamingRunner
        .execute(&Invocation::new(["cdf-dev-no-such-binary"]).quiet())
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[test]
fn given_empty_argv_when_executed_then_invalid_input() {
    let err = StreamingRunner
        .execute(&Invocation::new(Vec::<String>::new()))
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::InvalidInput);
}
