//! End-to-end tests for the `wl` binary against throwaway repositories.

use assert_cmd::Command;
use predicates::prelude::*;

fn wl(repo: &std::path::Path) -> Command {
    let mut cmd = Command::cargo_bin("wl").expect("binary built");
    cmd.arg("--repo").arg(repo);
    cmd
}

fn create_item(repo: &std::path::Path, title: &str) -> String {
    let output = wl(repo)
        .args(["--json", "create", "--title", title])
        .output()
        .expect("run create");
    assert!(output.status.success(), "create failed: {output:?}");
    let item: serde_json::Value = serde_json::from_slice(&output.stdout).expect("json item");
    item["id"].as_str().expect("id field").to_string()
}

#[test]
fn init_reports_the_repository_path() {
    let dir = tempfile::tempdir().expect("tempdir");
    wl(dir.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("worklog repository ready"));
    assert!(dir.path().join(".git").is_dir());
    assert!(dir.path().join("backlogs").is_dir());
}

#[test]
fn create_show_roundtrip() {
    let dir = tempfile::tempdir().expect("tempdir");
    let id = create_item(dir.path(), "Fix login timeout");

    wl(dir.path())
        .args(["show", &id])
        .assert()
        .success()
        .stdout(predicate::str::contains("Fix login timeout"))
        .stdout(predicate::str::contains("status: todo"));
}

#[test]
fn create_json_is_machine_readable() {
    let dir = tempfile::tempdir().expect("tempdir");
    let output = wl(dir.path())
        .args(["--json", "create", "--title", "Ship v2", "--priority", "1"])
        .output()
        .expect("run");
    assert!(output.status.success());

    let item: serde_json::Value = serde_json::from_slice(&output.stdout).expect("json");
    assert_eq!(item["title"], "Ship v2");
    assert_eq!(item["priority"], 1);
    assert_eq!(item["status"], "todo");
}

#[test]
fn list_filters_by_status() {
    let dir = tempfile::tempdir().expect("tempdir");
    let first = create_item(dir.path(), "task one");
    let _second = create_item(dir.path(), "task two");

    wl(dir.path())
        .args(["status", &first, "in_progress"])
        .assert()
        .success();

    wl(dir.path())
        .args(["list", "--status", "in_progress"])
        .assert()
        .success()
        .stdout(predicate::str::contains("task one"))
        .stdout(predicate::str::contains("1 of 1 items"));
}

#[test]
fn terminal_status_rejections_carry_the_error_code() {
    let dir = tempfile::tempdir().expect("tempdir");
    let id = create_item(dir.path(), "short lived");

    wl(dir.path())
        .args(["status", &id, "in_progress"])
        .assert()
        .success();
    wl(dir.path()).args(["status", &id, "done"]).assert().success();

    wl(dir.path())
        .args(["--json", "status", &id, "todo"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("E2003"));
}

#[test]
fn unknown_id_fails_with_not_found() {
    let dir = tempfile::tempdir().expect("tempdir");
    wl(dir.path()).arg("init").assert().success();

    wl(dir.path())
        .args(["show", "ffffffff"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not found"));
}

#[test]
fn delete_archives_by_default() {
    let dir = tempfile::tempdir().expect("tempdir");
    let id = create_item(dir.path(), "old task");

    wl(dir.path())
        .args(["delete", &id])
        .assert()
        .success()
        .stdout(predicate::str::contains("archived"));

    wl(dir.path())
        .args(["list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("0 of 0 items"));

    wl(dir.path())
        .args(["list", "--archived"])
        .assert()
        .success()
        .stdout(predicate::str::contains("old task"));
}

#[test]
fn meeting_new_and_list() {
    let dir = tempfile::tempdir().expect("tempdir");
    wl(dir.path())
        .args([
            "meeting",
            "new",
            "--title",
            "Sprint Planning",
            "--date",
            "2026-03-02",
            "--participant",
            "alice",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Sprint Planning"));

    wl(dir.path())
        .args(["meeting", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("2026-03-02"))
        .stdout(predicate::str::contains("1 meetings"));

    wl(dir.path())
        .args(["meeting", "show", "2026-03-02-sprint-planning"])
        .assert()
        .success()
        .stdout(predicate::str::contains("participants: alice"));
}

#[test]
fn overdue_and_stale_start_empty() {
    let dir = tempfile::tempdir().expect("tempdir");
    create_item(dir.path(), "fresh task");

    wl(dir.path())
        .arg("overdue")
        .assert()
        .success()
        .stdout(predicate::str::contains("0 overdue tasks"));

    wl(dir.path())
        .args(["stale", "--days", "14"])
        .assert()
        .success()
        .stdout(predicate::str::contains("0 stale tasks"));
}

#[test]
fn history_lists_one_commit_per_mutation() {
    let dir = tempfile::tempdir().expect("tempdir");
    let id = create_item(dir.path(), "audited task");

    wl(dir.path())
        .args(["update", &id, "--priority", "2"])
        .assert()
        .success();

    wl(dir.path())
        .args(["history", &id])
        .assert()
        .success()
        .stdout(predicate::str::contains(format!("create backlog {id}")))
        .stdout(predicate::str::contains(format!("update backlog {id}")))
        .stdout(predicate::str::contains("2 commits"));
}
