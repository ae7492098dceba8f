//! Integration tests for the `hotwidget` binary.

#![cfg(test)]
#![allow(deprecated)]

use assert_cmd::Command;
use predicates::prelude::*;
use predicates::str::contains;
use std::fs;
use std::path::PathBuf;
use tempfile::tempdir;

fn fixture(name: &str) -> String {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
        .display()
        .to_string()
}

fn hotwidget() -> Command {
    let mut cmd = Command::cargo_bin("hotwidget").expect("hotwidget bin");
    cmd.env("NO_COLOR", "1").env_remove("RUST_LOG");
    cmd
}

#[test]
fn preview_prints_rendered_view_and_style() {
    hotwidget()
        .arg("preview")
        .arg("--esm")
        .arg(fixture("counter.rhai"))
        .arg("--css")
        .arg(fixture("counter.css"))
        .arg("--id")
        .arg("w1")
        .assert()
        .success()
        .stdout(contains("<div><span>A</span></div>"))
        .stdout(contains("inline div{color:red}"));
}

#[test]
fn preview_without_id_skips_styles() {
    hotwidget()
        .arg("preview")
        .arg("--esm")
        .arg(fixture("counter.rhai"))
        .arg("--css")
        .arg(fixture("counter.css"))
        .assert()
        .success()
        .stdout(contains("no --id given"))
        .stdout(contains("<div><span>A</span></div>"))
        .stdout(contains("style inline").not());
}

#[test]
fn preview_rejects_missing_file() {
    hotwidget()
        .arg("preview")
        .arg("--esm")
        .arg("/nonexistent/widget.rhai")
        .assert()
        .failure()
        .stderr(contains("neither a file nor an http(s) URL"));
}

#[test]
fn check_accepts_module_with_entry_point() {
    hotwidget()
        .arg("check")
        .arg(fixture("counter.rhai"))
        .assert()
        .success()
        .stdout(contains("defines `render`"));
}

#[test]
fn check_reports_missing_entry_point() {
    hotwidget()
        .arg("check")
        .arg(fixture("no_entry.rhai"))
        .assert()
        .failure()
        .stderr(contains("does not define entry point `render`"));
}

#[test]
fn check_honours_configured_entry_point() {
    let dir = tempdir().expect("tempdir");
    let config = dir.path().join("hotwidget.toml");
    fs::write(&config, "[script]\nentry_point = \"draw\"\n").expect("write config");

    hotwidget()
        .arg("--config")
        .arg(&config)
        .arg("check")
        .arg(fixture("no_entry.rhai"))
        .assert()
        .success()
        .stdout(contains("defines `draw`"));
}
