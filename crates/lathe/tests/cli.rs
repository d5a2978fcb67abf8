//! CLI integration tests for Lathe
//!
//! Each test writes a declaration into a scratch directory and runs the
//! binary against it, checking exit codes, output and side effects.

#![cfg(unix)]

use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

/// Get a command instance for the lathe binary, rooted in `dir`
fn lathe_cmd(dir: &Path) -> assert_cmd::Command {
    let mut cmd = assert_cmd::Command::new(assert_cmd::cargo::cargo_bin!("lathe"));
    cmd.current_dir(dir).env("HOME", dir).env_remove("RUST_LOG");
    cmd
}

/// Create a scratch directory holding a Makefile
fn project(declaration: &str) -> TempDir {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("Makefile"), declaration).unwrap();
    dir
}

// =============================================================================
// Running targets
// =============================================================================

#[test]
fn test_prerequisite_runs_first() {
    let dir = project("A:\n\t@echo A\n\nB: A\n\t@echo B\n");

    lathe_cmd(dir.path())
        .arg("B")
        .assert()
        .success()
        .stdout("A\nB\n");
}

#[test]
fn test_commands_are_echoed() {
    let dir = project("hello:\n\techo hi\n");

    lathe_cmd(dir.path())
        .assert()
        .success()
        .stdout("echo hi\nhi\n");
}

#[test]
fn test_quiet_suppresses_echo() {
    let dir = project("hello:\n\techo hi\n");

    lathe_cmd(dir.path())
        .arg("-q")
        .assert()
        .success()
        .stdout("hi\n");
}

#[test]
fn test_default_target_is_first_declared() {
    let dir = project(".PHONY: first second\nfirst:\n\t@echo first\nsecond:\n\t@echo second\n");

    lathe_cmd(dir.path())
        .assert()
        .success()
        .stdout("first\n");
}

#[test]
fn test_default_goal_marker() {
    let dir = project("install:\n\t@echo install\nhelp:\n\t@echo help\n.DEFAULT_GOAL: help\n");

    lathe_cmd(dir.path())
        .assert()
        .success()
        .stdout("help\n");
}

#[test]
fn test_shared_prerequisite_runs_once() {
    let dir = project("install:\n\t@echo install\ntest: install\n\t@echo test\nlint: install\n\t@echo lint\n");

    lathe_cmd(dir.path())
        .args(["test", "lint", "test"])
        .assert()
        .success()
        .stdout("install\ntest\nlint\n");
}

#[test]
fn test_variable_override() {
    let dir = project("PY = python3\nshow:\n\t@echo $(PY) $@\n");

    lathe_cmd(dir.path())
        .args(["show", "PY=pypy3"])
        .assert()
        .success()
        .stdout("pypy3 show\n");
}

#[test]
fn test_target_environment() {
    let dir = project("env:\n\t@echo \"$$LATHE_TARGET $$MODE\"\nenv: MODE = ci\n");

    lathe_cmd(dir.path())
        .assert()
        .success()
        .stdout("env ci\n");
}

#[test]
fn test_explicit_file_and_directory() {
    let dir = TempDir::new().unwrap();
    let sub = dir.path().join("sub");
    fs::create_dir(&sub).unwrap();
    fs::write(sub.join("build.mk"), "build:\n\t@pwd\n").unwrap();

    lathe_cmd(dir.path())
        .args(["-C", "sub", "-f", "build.mk"])
        .assert()
        .success()
        .stdout(predicate::str::ends_with("sub\n"));
}

#[test]
fn test_config_env_and_default_target() {
    let dir = project("one:\n\t@echo one\ntwo:\n\t@echo \"two $$GREETING $(WHO)\"\n");
    fs::write(
        dir.path().join("lathe.toml"),
        "[declaration]\ndefault_target = \"two\"\n\n[env]\nGREETING = \"hello\"\n\n[variables]\nWHO = \"world\"\n",
    )
    .unwrap();

    lathe_cmd(dir.path())
        .assert()
        .success()
        .stdout("two hello world\n");
}

// =============================================================================
// Failures
// =============================================================================

#[test]
fn test_fail_fast_propagates_exit_code() {
    let dir = project(
        "first:\n\ttouch first\nsecond: first\n\texit 7\n\ttouch second\nthird: second\n\ttouch third\n",
    );

    lathe_cmd(dir.path())
        .arg("third")
        .assert()
        .code(7)
        .stderr(predicate::str::contains("second"));

    assert!(dir.path().join("first").exists());
    assert!(!dir.path().join("second").exists());
    assert!(!dir.path().join("third").exists());
}

#[test]
fn test_fail_fast_skips_independent_target() {
    let dir = project("a:\n\ttouch a\nb:\n\texit 5\nc:\n\ttouch c\n");

    lathe_cmd(dir.path())
        .args(["a", "b", "c"])
        .assert()
        .code(5);

    assert!(dir.path().join("a").exists());
    assert!(!dir.path().join("c").exists());
}

#[test]
fn test_ignored_failure() {
    let dir = project("clean:\n\t-@exit 4\n\t@echo cleaned\n");

    lathe_cmd(dir.path())
        .assert()
        .success()
        .stdout("cleaned\n")
        .stderr(predicate::str::contains("ignored"));
}

#[test]
fn test_cycle_is_reported() {
    let dir = project("X: Y\n\ttouch x\nY: X\n\ttouch y\n");

    lathe_cmd(dir.path())
        .arg("X")
        .assert()
        .code(3)
        .stderr(predicate::str::contains("Cyclic dependency"))
        .stderr(predicate::str::contains("X -> Y"));

    assert!(!dir.path().join("x").exists());
    assert!(!dir.path().join("y").exists());
}

#[test]
fn test_unknown_target() {
    let dir = project("build:\n\ttouch built\n");

    lathe_cmd(dir.path())
        .args(["build", "Z"])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("Unknown target 'Z'"));

    assert!(!dir.path().join("built").exists());
}

#[test]
fn test_dangling_prerequisite_blocks_everything() {
    let dir = project("ok:\n\ttouch ok\nbroken: missing\n");

    lathe_cmd(dir.path())
        .arg("ok")
        .assert()
        .code(3)
        .stderr(predicate::str::contains("required by 'broken'"));

    assert!(!dir.path().join("ok").exists());
}

#[test]
fn test_parse_error() {
    let dir = project("build:\n\tmake\nbuild:\n\tmake again\n");

    lathe_cmd(dir.path())
        .assert()
        .code(2)
        .stderr(predicate::str::contains("line 3"))
        .stderr(predicate::str::contains("duplicate target 'build'"));
}

#[test]
fn test_missing_declaration() {
    let dir = TempDir::new().unwrap();

    lathe_cmd(dir.path())
        .assert()
        .code(2)
        .stderr(predicate::str::contains("No declaration file found"));
}

#[test]
fn test_invalid_config() {
    let dir = project("a:\n");
    fs::write(dir.path().join("lathe.toml"), "[shell]\nprogram = \"\"\n").unwrap();

    lathe_cmd(dir.path())
        .assert()
        .code(2)
        .stderr(predicate::str::contains("shell.program"));
}

// =============================================================================
// Modes
// =============================================================================

#[test]
fn test_dry_run_spawns_nothing() {
    let dir = project("build:\n\ttouch built\nship: build\n\t@touch shipped\n");

    lathe_cmd(dir.path())
        .args(["-n", "ship"])
        .assert()
        .success()
        .stdout(predicate::str::contains("touch built"))
        .stdout(predicate::str::contains("touch shipped"));

    assert!(!dir.path().join("built").exists());
    assert!(!dir.path().join("shipped").exists());
}

#[test]
fn test_dry_run_json_plan() {
    let dir = project("a:\nb: a\nc: a\n");

    let output = lathe_cmd(dir.path())
        .args(["-n", "--format", "json", "b", "c"])
        .output()
        .unwrap();

    assert!(output.status.success());
    let plan: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(plan["targets"], serde_json::json!(["a", "b", "c"]));
    assert_eq!(plan["waves"], serde_json::json!([["a"], ["b", "c"]]));
}

#[test]
fn test_list() {
    let dir = project(".PHONY: test\ninstall:\n\tpip install .\ntest: install\n\tpytest\n");

    lathe_cmd(dir.path())
        .arg("--list")
        .assert()
        .success()
        .stdout(predicate::str::contains("install"))
        .stdout(predicate::str::contains("(after: install)"))
        .stdout(predicate::str::contains("[phony]"));
}

#[test]
fn test_list_json() {
    let dir = project("install:\ntest: install\n");

    let output = lathe_cmd(dir.path())
        .args(["--list", "--format", "json"])
        .output()
        .unwrap();

    let listing: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(listing["default"], "install");
    assert_eq!(listing["targets"][1]["name"], "test");
    assert_eq!(listing["targets"][1]["prerequisites"], serde_json::json!(["install"]));
}

#[test]
fn test_check_ok() {
    let dir = project("a:\nb: a\n");

    lathe_cmd(dir.path())
        .arg("--check")
        .assert()
        .success()
        .stdout(predicate::str::contains("is valid (2 targets)"));
}

#[test]
fn test_check_rejects_unknown_placeholder() {
    let dir = project("home:\n\techo $HOME\n");

    lathe_cmd(dir.path())
        .arg("--check")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("$H"));
}

#[test]
fn test_run_summary_json() {
    let dir = project("ok:\n\t@true\nbad: ok\n\t@exit 2\n");

    let output = lathe_cmd(dir.path())
        .args(["--format", "json", "bad"])
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(2));
    let summary: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(summary["success"], false);
    assert_eq!(summary["targets"][0]["status"], "success");
    assert_eq!(summary["targets"][1]["status"], "failed");
}

#[test]
fn test_run_summary_json_ignores_command_output() {
    let dir = project("ok:\n\techo building\n");

    let output = lathe_cmd(dir.path())
        .args(["--format", "json", "ok"])
        .output()
        .unwrap();

    assert!(output.status.success());
    let summary: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(summary["success"], true);
    assert_eq!(summary["targets"][0]["name"], "ok");
    assert!(String::from_utf8_lossy(&output.stderr).contains("building"));
}

#[test]
fn test_init_writes_config_once() {
    let dir = TempDir::new().unwrap();

    lathe_cmd(dir.path())
        .arg("--init")
        .assert()
        .success()
        .stdout(predicate::str::contains("lathe.toml"));
    assert!(dir.path().join("lathe.toml").is_file());

    lathe_cmd(dir.path())
        .arg("--init")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("already exists"));
}

#[test]
fn test_completions() {
    let dir = TempDir::new().unwrap();

    lathe_cmd(dir.path())
        .args(["--completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("lathe"));
}
