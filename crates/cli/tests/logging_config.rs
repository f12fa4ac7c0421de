use assert_cmd::prelude::*;
use predicates::prelude::*;
use regex::Regex;
use std::fs;
use std::process::Command;
use tempfile::tempdir;

fn write_config(root: &std::path::Path, logging: &str) -> std::path::PathBuf {
    let config_path = root.join("crankgen.toml");
    fs::write(&config_path, format!("version = 1\n\n[logging]\n{logging}")).unwrap();
    config_path
}

fn write_source(root: &std::path::Path) -> std::path::PathBuf {
    let src = root.join("log.crankgen");
    fs::write(&src, "VAR n = 1, 2\nBEGIN_TEMPLATE\n$n\n").unwrap();
    src
}

#[test]
fn test_logging_to_file() {
    let dir = tempdir().unwrap();
    let root = dir.path();
    let log_file = root.join("crankgen.log");
    let logging = format!("level = \"warn\"\nfile = \"{}\"\n", log_file.display());
    let config_path = write_config(root, &logging);
    let src = write_source(root);

    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("crankgen"));
    cmd.env_remove("RUST_LOG");
    cmd.arg("--config").arg(&config_path).arg(&src).assert().success();

    assert!(log_file.exists(), "Log file should be created");
    let content = fs::read_to_string(&log_file).unwrap();
    let written = Regex::new(r"wrote generated file.*log_2_gen\.crank").unwrap();
    assert!(written.is_match(&content), "debug events should reach the file: {content}");
}

#[test]
fn test_info_level_on_stderr() {
    let dir = tempdir().unwrap();
    let root = dir.path();
    let config_path = write_config(root, "level = \"info\"\n");
    let src = write_source(root);

    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("crankgen"));
    cmd.env_remove("RUST_LOG");
    cmd.arg("--config")
        .arg(&config_path)
        .arg(&src)
        .assert()
        .success()
        .stderr(predicate::str::contains("generated"))
        .stderr(predicate::str::contains("wrote generated file").not());
}

#[test]
fn test_rust_log_overrides_config() {
    let dir = tempdir().unwrap();
    let root = dir.path();
    let config_path = write_config(root, "level = \"info\"\n");
    let src = write_source(root);

    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("crankgen"));
    cmd.env("RUST_LOG", "error");
    cmd.arg("--config")
        .arg(&config_path)
        .arg(&src)
        .assert()
        .success()
        .stderr(predicate::str::is_empty());
}
