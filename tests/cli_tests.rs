use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn wb(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("wb").unwrap();
    cmd.arg("--data-dir").arg(dir.path());
    cmd.arg("--config").arg(dir.path().join("config.toml"));
    cmd.env_remove("RUST_LOG");
    cmd
}

fn onboard(dir: &TempDir) {
    wb(dir)
        .args(["onboard", "--name", "Ada Lovelace", "--email", "ada@example.com"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Welcome, Ada Lovelace"));
}

#[test]
fn onboarding_then_task_roundtrip() {
    let dir = TempDir::new().unwrap();
    onboard(&dir);

    wb(&dir)
        .args(["task", "add", "Draft landing copy", "--priority", "high", "--tag", "Copy,Web"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Added task"));

    wb(&dir)
        .args(["task", "list", "--search", "landing"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Draft landing copy").and(predicate::str::contains("[copy,web]")));

    wb(&dir)
        .args(["task", "complete", "draft landing copy"])
        .assert()
        .success();

    wb(&dir)
        .args(["task", "list", "--filter", "todo"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Draft landing copy").not());

    assert!(dir.path().join("tasks.json").exists());
}

#[test]
fn project_requires_current_user() {
    let dir = TempDir::new().unwrap();
    wb(&dir)
        .args(["project", "add", "Relaunch"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No current user"));
}

#[test]
fn invalid_email_is_rejected() {
    let dir = TempDir::new().unwrap();
    wb(&dir)
        .args(["onboard", "--name", "Ada", "--email", "not-an-email"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid email"));
}

#[test]
fn project_view_and_stats() {
    let dir = TempDir::new().unwrap();
    onboard(&dir);

    wb(&dir)
        .args(["project", "add", "Relaunch", "--budget", "1000", "--status", "active"])
        .assert()
        .success();
    wb(&dir)
        .args(["task", "add", "Ship", "--project", "relaunch"])
        .assert()
        .success();

    wb(&dir)
        .args(["project", "view", "relaunch"])
        .assert()
        .success()
        .stdout(predicate::str::contains("0/1 tasks"));

    wb(&dir)
        .args(["stats", "--json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"total_budget\": 1000.0"));

    wb(&dir)
        .args(["project", "delete", "relaunch"])
        .assert()
        .success()
        .stdout(predicate::str::contains("1 task(s)"));
}

#[test]
fn unknown_task_is_an_error() {
    let dir = TempDir::new().unwrap();
    onboard(&dir);
    wb(&dir)
        .args(["task", "view", "nothing-here"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No task found"));
}
