//! End-to-end checks of the `vigil` binary that need no network.

use assert_cmd::Command;
use predicates::prelude::*;
use std::io::Write;
use tempfile::NamedTempFile;

/// Config pointing at a local port nobody listens on.
fn offline_config(extra: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(
        file,
        "[document]\nendpoint = \"http://127.0.0.1:9/gists\"\ntimeout_secs = 2\n{extra}"
    )
    .unwrap();
    file
}

fn vigil() -> Command {
    let mut cmd = Command::cargo_bin("vigil").unwrap();
    cmd.env_remove("VIGIL_TOKEN")
        .env_remove("VIGIL_DOCUMENT")
        .env_remove("RUST_LOG");
    cmd
}

#[test]
fn help_lists_commands() {
    vigil()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("watch"))
        .stdout(predicate::str::contains("remove"));
}

#[test]
fn missing_document_id_fails() {
    let config = offline_config("");
    vigil()
        .arg("--config")
        .arg(config.path())
        .arg("list")
        .assert()
        .failure()
        .stderr(predicate::str::contains("no document id configured"));
}

#[test]
fn unparseable_config_fails() {
    let mut config = NamedTempFile::new().unwrap();
    writeln!(config, "[document").unwrap();

    vigil()
        .arg("--config")
        .arg(config.path())
        .arg("list")
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to parse config file"));
}

#[test]
fn add_without_token_is_not_configured() {
    let config = offline_config("");
    vigil()
        .arg("--config")
        .arg(config.path())
        .args(["--document", "abc123", "add", "--x", "1", "--y", "2"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not configured"));
}

#[test]
fn list_degrades_when_remote_is_unreachable() {
    let config = offline_config("");
    vigil()
        .arg("--config")
        .arg(config.path())
        .args(["--document", "abc123", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("(no items)"))
        .stderr(predicate::str::contains("could not read the remote document"));
}

#[test]
fn failed_write_exits_non_zero() {
    let config = offline_config("[auth]\ntoken = \"ghp_test\"");
    vigil()
        .arg("--config")
        .arg(config.path())
        .args(["--document", "abc123", "rename", "1", "Ada"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("rename failed"));
}

#[test]
fn zero_watch_interval_is_rejected() {
    let config = offline_config("");
    vigil()
        .arg("--config")
        .arg(config.path())
        .args(["--document", "abc123", "watch", "--interval", "0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("at least 1 second"));
}
