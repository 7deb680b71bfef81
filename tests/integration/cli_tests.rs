//! End-to-end CLI tests against a temporary project tree.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

fn project_with(files: &[(&str, &str)]) -> TempDir {
    let dir = TempDir::new().expect("temp dir");
    for (name, content) in files {
        let path = dir.path().join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create parent");
        }
        fs::write(path, content).expect("write fixture");
    }
    dir
}

fn phpsniff() -> Command {
    Command::cargo_bin("phpsniff").expect("binary builds")
}

#[test]
fn clean_project_exits_zero() {
    let dir = project_with(&[("app.php", "<?php function f($a) { return $a + 1; }\n")]);
    phpsniff()
        .arg(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("No code smells found"));
}

#[test]
fn findings_exit_nonzero_and_are_printed() {
    let dir = project_with(&[("app.php", "<?php $a = !!$b;\n")]);
    phpsniff()
        .arg(dir.path())
        .assert()
        .code(1)
        .stdout(predicate::str::contains("Can be replaced with (bool)$b"))
        .stdout(predicate::str::contains("PS001"));
}

#[test]
fn compact_format_prints_one_line_per_finding() {
    let dir = project_with(&[("app.php", "<?php $a = !!$b;\n")]);
    phpsniff()
        .arg(dir.path())
        .args(["--format", "compact"])
        .assert()
        .code(1)
        .stdout(predicate::str::contains("app.php:1:12: [PS001]"));
}

#[test]
fn json_format_is_machine_readable() {
    let dir = project_with(&[("app.php", "<?php $a = !!$b;\n")]);
    let output = phpsniff()
        .arg(dir.path())
        .args(["--format", "json"])
        .assert()
        .code(1)
        .get_output()
        .stdout
        .clone();

    let report: serde_json::Value = serde_json::from_slice(&output).expect("valid JSON");
    assert_eq!(report["files_analyzed"], 1);
    let findings = report["findings"].as_array().expect("findings array");
    assert_eq!(findings.len(), 1);
    assert_eq!(findings[0]["code"], "PS001");
    assert_eq!(findings[0]["fixable"], true);
}

#[test]
fn detect_flag_limits_the_registry() {
    let dir = project_with(&[(
        "app.php",
        "<?php $a = !!$b; call_user_func($fn, $x);\n",
    )]);
    phpsniff()
        .arg(dir.path())
        .args(["--detect", "indirect-call"])
        .assert()
        .code(1)
        .stdout(predicate::str::contains("PS007"))
        .stdout(predicate::str::contains("PS001").not());
}

#[test]
fn fix_with_yes_rewrites_the_file() {
    let dir = project_with(&[("app.php", "<?php $a = !!$b;\n")]);
    phpsniff()
        .arg(dir.path())
        .args(["--fix", "--yes"])
        .assert()
        .success();

    let rewritten = fs::read_to_string(dir.path().join("app.php")).unwrap();
    assert_eq!(rewritten, "<?php $a = (bool) $b;\n");
}

#[test]
fn dry_run_previews_without_writing() {
    let source = "<?php $a = !!$b;\n";
    let dir = project_with(&[("app.php", source)]);
    phpsniff()
        .arg(dir.path())
        .args(["--fix", "--dry-run"])
        .assert()
        .code(1)
        .stdout(predicate::str::contains("(bool) $b"));

    let untouched = fs::read_to_string(dir.path().join("app.php")).unwrap();
    assert_eq!(untouched, source);
}

#[test]
fn config_file_is_picked_up_from_project_root() {
    let dir = project_with(&[
        ("app.php", "<?php call_user_func($fn, $x);\n"),
        ("phpsniff.toml", "php-version = \"5.6\"\n"),
    ]);
    phpsniff().arg(dir.path()).assert().success();
}

#[test]
fn exclude_pattern_skips_directories() {
    let dir = project_with(&[
        ("app.php", "<?php function f($a) { return $a; }\n"),
        ("vendor/dep.php", "<?php $a = !!$b;\n"),
    ]);
    phpsniff()
        .arg(dir.path())
        .args(["--exclude", "vendor"])
        .assert()
        .success();
}

#[test]
fn nonexistent_detector_name_runs_nothing() {
    let dir = project_with(&[("app.php", "<?php $a = !!$b;\n")]);
    phpsniff()
        .arg(dir.path())
        .args(["--detect", "no-such-rule"])
        .assert()
        .success();
}
