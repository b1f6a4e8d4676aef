//! Integration tests for the taskdeck binary.

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

/// Helper to create a taskdeck Command isolated from the host environment
fn taskdeck() -> Command {
    let mut cmd = cargo_bin_cmd!("taskdeck");
    cmd.env_remove("TASKDECK_API_BASE")
        .env_remove("TASKDECK_TOKEN")
        .env_remove("RUST_LOG");
    cmd
}

/// An address nothing listens on, so requests fail fast.
const UNREACHABLE_API: &str = "http://127.0.0.1:9";

// =============================================================================
// Basic CLI Tests
// =============================================================================

mod cli_basics {
    use super::*;

    #[test]
    fn test_taskdeck_help() {
        taskdeck()
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("review"))
            .stdout(predicate::str::contains("set-status"));
    }

    #[test]
    fn test_taskdeck_version() {
        taskdeck()
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
    }

    #[test]
    fn test_review_requires_project_ids() {
        taskdeck().arg("review").assert().failure();
    }
}

// =============================================================================
// Config Tests
// =============================================================================

mod config {
    use super::*;

    #[test]
    fn test_config_init_creates_file() {
        let dir = TempDir::new().unwrap();

        taskdeck()
            .current_dir(dir.path())
            .args(["config", "init"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Created taskdeck.toml"));

        let content = fs::read_to_string(dir.path().join("taskdeck.toml")).unwrap();
        assert!(content.contains("[api]"));
        assert!(content.contains("ceiling = 92"));
    }

    #[test]
    fn test_config_init_does_not_overwrite() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("taskdeck.toml"), "[review]\nceiling = 50\n").unwrap();

        taskdeck()
            .current_dir(dir.path())
            .args(["config", "init"])
            .assert()
            .success()
            .stdout(predicate::str::contains("already exists"));

        let content = fs::read_to_string(dir.path().join("taskdeck.toml")).unwrap();
        assert!(content.contains("ceiling = 50"));
    }

    #[test]
    fn test_config_show_applies_cli_override() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("taskdeck.toml"),
            "[api]\nbase_url = \"http://from-file:8000\"\n",
        )
        .unwrap();

        taskdeck()
            .current_dir(dir.path())
            .args(["--api-base", "http://from-cli:9000/", "config", "show"])
            .assert()
            .success()
            .stdout(predicate::str::contains("base_url = \"http://from-file:8000\""))
            .stdout(predicate::str::contains("api_base = \"http://from-cli:9000\""));
    }

    #[test]
    fn test_config_show_applies_env_override() {
        let dir = TempDir::new().unwrap();

        taskdeck()
            .current_dir(dir.path())
            .env("TASKDECK_API_BASE", "http://from-env:7000")
            .args(["--project-dir", dir.path().to_str().unwrap(), "config", "show"])
            .assert()
            .success()
            .stdout(predicate::str::contains("api_base = \"http://from-env:7000\""));
    }

    #[test]
    fn test_config_validate_reports_warnings() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("taskdeck.toml"),
            "[review]\nceiling = 120\nmax_step = 0\n",
        )
        .unwrap();

        taskdeck()
            .current_dir(dir.path())
            .args(["config", "validate"])
            .assert()
            .success()
            .stdout(predicate::str::contains("review.ceiling"))
            .stdout(predicate::str::contains("review.max_step"));
    }

    #[test]
    fn test_config_invalid_toml_fails() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("taskdeck.toml"), "[api\n").unwrap();

        taskdeck()
            .current_dir(dir.path())
            .args(["config", "show"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Failed to parse taskdeck.toml"));
    }
}

// =============================================================================
// Remote Commands
// =============================================================================

mod remote {
    use super::*;

    #[test]
    fn test_set_status_rejects_unknown_status() {
        let dir = TempDir::new().unwrap();

        taskdeck()
            .current_dir(dir.path())
            .args(["--api-base", UNREACHABLE_API, "set-status", "5", "finished"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Invalid task status 'finished'"));
    }

    #[test]
    fn test_users_unreachable_api_fails() {
        let dir = TempDir::new().unwrap();

        taskdeck()
            .current_dir(dir.path())
            .args(["--api-base", UNREACHABLE_API, "users"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Failed to load users"));
    }

    #[test]
    fn test_review_unreachable_api_reports_failure() {
        let dir = TempDir::new().unwrap();

        taskdeck()
            .current_dir(dir.path())
            .args(["--api-base", UNREACHABLE_API, "review", "1", "2", "--ui", "minimal"])
            .timeout(std::time::Duration::from_secs(30))
            .assert()
            .failure()
            .stdout(predicate::str::contains("project 1: "))
            .stdout(predicate::str::contains("failed:"))
            .stderr(predicate::str::contains("2 of 2 reviews did not complete"));
    }
}
