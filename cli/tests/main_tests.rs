//! # Guichet CLI Main Integration Tests
//!
//! File: cli/tests/main_tests.rs
//!
//! ## Overview
//!
//! Subcommand help and argument errors of the `guichet` binary. The
//! top-level `--help`/`--version` checks live next to `main`.
//!
mod common;
use common::*;
use predicates::prelude::*;

#[test]
fn test_ask_help_lists_overrides() {
    Sandbox::new()
        .cmd()
        .args(["ask", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--url"))
        .stdout(predicate::str::contains("--top-k"))
        .stdout(predicate::str::contains("--format"))
        .stdout(predicate::str::contains("--no-sources"));
}

#[test]
fn test_ask_requires_a_question() {
    Sandbox::new()
        .cmd()
        .arg("ask")
        .assert()
        .failure()
        .stderr(predicate::str::contains("QUESTION"));
}

#[test]
fn test_unknown_format_is_rejected() {
    Sandbox::new()
        .cmd()
        .args(["ask", "Bonjour", "--format", "pdf"])
        .assert()
        .failure();
}
