use assert_cmd::Command;
use predicates::prelude::*;

#[test]
fn test_help_lists_subcommands() {
    let mut cmd = Command::cargo_bin("procguard").unwrap();
    cmd.arg("--help");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("lists"))
        .stdout(predicate::str::contains("blacklist"))
        .stdout(predicate::str::contains("whitelist"))
        .stdout(predicate::str::contains("monitor"))
        .stdout(predicate::str::contains("processes"))
        .stdout(predicate::str::contains("kill"))
        .stdout(predicate::str::contains("boost-whitelisted"))
        .stdout(predicate::str::contains("--lists"))
        .stdout(predicate::str::contains("--config"));
}

#[test]
fn test_monitor_help_describes_interval() {
    let mut cmd = Command::cargo_bin("procguard").unwrap();
    cmd.args(["monitor", "--help"]);

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("--interval"))
        .stdout(predicate::str::contains("--once"))
        .stdout(predicate::str::contains("--json"));
}

#[test]
fn test_version_flag() {
    let mut cmd = Command::cargo_bin("procguard").unwrap();
    cmd.arg("--version");

    cmd.assert()
        .success()
        .stdout(predicate::str::starts_with("procguard "));
}

#[test]
fn test_no_arguments_shows_usage() {
    let mut cmd = Command::cargo_bin("procguard").unwrap();

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Usage"));
}
