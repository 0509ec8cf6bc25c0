//! End-to-end tests for the `lu` binary

use std::fs;
use std::path::Path;
use std::process::Command;

use assert_cmd::prelude::*;
use predicates::prelude::*;
use tempfile::TempDir;

/// `lu` isolated in a temp home with its store and event log under `root`
fn lu(root: &Path) -> Command {
    let config = root.join("levelup.yml");
    if !config.exists() {
        fs::write(
            &config,
            format!(
                "storage:\n  path: {}\nevents:\n  log-dir: {}\n",
                root.join("store").display(),
                root.join("events").display()
            ),
        )
        .unwrap();
    }

    let mut cmd = Command::new(env!("CARGO_BIN_EXE_lu"));
    cmd.current_dir(root)
        .env("HOME", root)
        .env("XDG_DATA_HOME", root.join("data"))
        .env("XDG_CONFIG_HOME", root.join("config"))
        .arg("--config")
        .arg(&config);
    cmd
}

#[test]
fn test_xp_then_status_json() {
    let temp = TempDir::new().unwrap();

    lu(temp.path())
        .args(["xp", "acct-1", "75"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Level 1 (75/100 XP)"));

    lu(temp.path())
        .args(["xp", "acct-1", "30"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Level up!"));

    let output = lu(temp.path())
        .args(["status", "acct-1", "--format", "json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let snapshot: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(snapshot["level"], 2);
    assert_eq!(snapshot["xp"], 5);
    assert_eq!(snapshot["totalXP"], 105);
}

#[test]
fn test_negative_amount_is_rejected() {
    let temp = TempDir::new().unwrap();

    lu(temp.path())
        .args(["xp", "acct-1", "-5"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("non-negative"));
}

#[test]
fn test_overspend_reports_balance() {
    let temp = TempDir::new().unwrap();

    lu(temp.path()).args(["coins", "grant", "acct-1", "50"]).assert().success();
    lu(temp.path())
        .args(["coins", "spend", "acct-1", "100"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Insufficient coins: balance is 50"));
}

#[test]
fn test_achievement_and_event_history() {
    let temp = TempDir::new().unwrap();

    lu(temp.path())
        .args(["achieve", "acct-1", "first_application"])
        .assert()
        .success()
        .stdout(predicate::str::contains("First Step"));
    lu(temp.path())
        .args(["achieve", "acct-1", "first_application"])
        .assert()
        .success()
        .stdout(predicate::str::contains("already has"));

    lu(temp.path())
        .args(["events", "acct-1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("AchievementUnlocked").and(predicate::str::contains("LevelUp")));
}

#[test]
fn test_unknown_achievement_fails() {
    let temp = TempDir::new().unwrap();

    lu(temp.path())
        .args(["achieve", "acct-1", "moon_landing"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown achievement"));
}

#[test]
fn test_catalog_lists_levels() {
    let temp = TempDir::new().unwrap();

    lu(temp.path())
        .arg("catalog")
        .assert()
        .success()
        .stdout(predicate::str::contains("Career Legend").and(predicate::str::contains("legend_frame")));
}

#[test]
fn test_ephemeral_leaves_no_store() {
    let temp = TempDir::new().unwrap();

    lu(temp.path()).args(["--ephemeral", "xp", "acct-1", "10"]).assert().success();
    assert!(!temp.path().join("store").exists());
}

#[test]
fn test_sweep_and_accounts() {
    let temp = TempDir::new().unwrap();

    lu(temp.path()).args(["activity", "acct-1"]).assert().success();
    lu(temp.path())
        .arg("accounts")
        .assert()
        .success()
        .stdout(predicate::str::contains("acct-1"));
    lu(temp.path())
        .arg("sweep")
        .assert()
        .success()
        .stdout(predicate::str::contains("Swept 1 accounts"));
}
