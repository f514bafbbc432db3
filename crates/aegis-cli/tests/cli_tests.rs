use assert_cmd::Command;
use predicates::prelude::*;

#[test]
fn test_cli_help() {
    let mut cmd = Command::cargo_bin("aegis").unwrap();
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Autonomous ITSM incident triage pipeline"));
}

#[test]
fn test_cli_serve_help() {
    let mut cmd = Command::cargo_bin("aegis").unwrap();
    cmd.arg("serve").arg("--help").assert().success().stdout(predicate::str::contains("port"));
}

#[test]
fn test_cli_sync_help() {
    let mut cmd = Command::cargo_bin("aegis").unwrap();
    cmd.arg("sync").arg("--help").assert().success().stdout(predicate::str::contains("interval-hours"));
}
