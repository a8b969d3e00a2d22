//! Integration tests for the gauge CLI.
//!
//! These tests exercise the binary end to end: configuration bootstrap,
//! validation, the threshold table, and workload simulation.

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

/// Helper to create a gauge Command
fn gauge() -> Command {
    cargo_bin_cmd!("gauge")
}

/// Helper to create a temporary working directory
fn create_temp_dir() -> TempDir {
    TempDir::new().unwrap()
}

/// A workload of five half-importance additions of 120 tokens each.
fn write_warning_workload(dir: &TempDir) -> std::path::PathBuf {
    let path = dir.path().join("workload.json");
    let content = "x".repeat(480);
    let workload = format!(
        r#"[{{"content": "{}", "category": "agent-output", "importance": 0.5, "source": "phase-01", "repeat": 5}}]"#,
        content
    );
    fs::write(&path, workload).unwrap();
    path
}

// =============================================================================
// Basic CLI Tests
// =============================================================================

mod cli_basics {
    use super::*;

    #[test]
    fn test_gauge_help() {
        gauge().arg("--help").assert().success();
    }

    #[test]
    fn test_gauge_version() {
        gauge().arg("--version").assert().success();
    }

    #[test]
    fn test_unknown_subcommand_fails() {
        gauge().arg("definitely-not-a-command").assert().failure();
    }
}

// =============================================================================
// Init
// =============================================================================

mod init {
    use super::*;

    #[test]
    fn test_init_creates_config() {
        let dir = create_temp_dir();

        gauge()
            .current_dir(dir.path())
            .arg("init")
            .assert()
            .success()
            .stdout(predicate::str::contains("Initialized gauge configuration"));

        let config_path = dir.path().join("gauge.toml");
        assert!(config_path.exists());
        let content = fs::read_to_string(config_path).unwrap();
        assert!(content.contains("max_tokens"));
        assert!(content.contains("[[thresholds]]"));
    }

    #[test]
    fn test_init_refuses_to_overwrite() {
        let dir = create_temp_dir();

        gauge().current_dir(dir.path()).arg("init").assert().success();
        gauge()
            .current_dir(dir.path())
            .arg("init")
            .assert()
            .failure()
            .stderr(predicate::str::contains("--force"));
    }

    #[test]
    fn test_init_force_overwrites() {
        let dir = create_temp_dir();

        gauge().current_dir(dir.path()).arg("init").assert().success();
        gauge()
            .current_dir(dir.path())
            .args(["init", "--force"])
            .assert()
            .success();
    }
}

// =============================================================================
// Config
// =============================================================================

mod config {
    use super::*;

    #[test]
    fn test_config_show_without_file_prints_defaults() {
        let dir = create_temp_dir();

        gauge()
            .current_dir(dir.path())
            .args(["config", "show"])
            .assert()
            .success()
            .stdout(predicate::str::contains("max_tokens = 200000"));
    }

    #[test]
    fn test_config_validate_accepts_generated_config() {
        let dir = create_temp_dir();

        gauge().current_dir(dir.path()).arg("init").assert().success();
        gauge()
            .current_dir(dir.path())
            .args(["config", "validate"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Configuration is valid"));
    }

    #[test]
    fn test_config_validate_rejects_bad_config() {
        let dir = create_temp_dir();
        fs::write(
            dir.path().join("gauge.toml"),
            "[store]\nmax_tokens = 0\n",
        )
        .unwrap();

        gauge()
            .current_dir(dir.path())
            .args(["config", "validate"])
            .assert()
            .failure()
            .stdout(predicate::str::contains("max_tokens"));
    }

    #[test]
    fn test_config_flag_points_at_explicit_file() {
        let dir = create_temp_dir();
        let custom = dir.path().join("custom.toml");
        fs::write(&custom, "[store]\nmax_tokens = 12345\n").unwrap();

        gauge()
            .current_dir(dir.path())
            .args(["--config", custom.to_str().unwrap(), "config", "show"])
            .assert()
            .success()
            .stdout(predicate::str::contains("12345"));
    }
}

// =============================================================================
// Thresholds
// =============================================================================

mod thresholds {
    use super::*;

    #[test]
    fn test_thresholds_prints_default_table() {
        let dir = create_temp_dir();

        gauge()
            .current_dir(dir.path())
            .arg("thresholds")
            .assert()
            .success()
            .stdout(predicate::str::contains("warning"))
            .stdout(predicate::str::contains("critical"))
            .stdout(predicate::str::contains("emergency"))
            .stdout(predicate::str::contains("compress-aggressive"));
    }
}

// =============================================================================
// Simulate
// =============================================================================

mod simulate {
    use super::*;

    #[test]
    fn test_simulate_reports_warning_and_statistics() {
        let dir = create_temp_dir();
        let workload = write_warning_workload(&dir);

        gauge()
            .current_dir(dir.path())
            .args([
                "simulate",
                workload.to_str().unwrap(),
                "--max-tokens",
                "1000",
            ])
            .assert()
            .success()
            .stdout(predicate::str::contains("WARNING"))
            .stdout(predicate::str::contains("Monitoring Statistics"))
            .stdout(predicate::str::contains("Allocation Advice"));
    }

    #[test]
    fn test_simulate_verbose_prints_each_step() {
        let dir = create_temp_dir();
        let workload = write_warning_workload(&dir);

        gauge()
            .current_dir(dir.path())
            .args([
                "--verbose",
                "simulate",
                workload.to_str().unwrap(),
                "--max-tokens",
                "1000",
            ])
            .assert()
            .success()
            .stdout(predicate::str::contains("step   1"))
            .stdout(predicate::str::contains("step   5"));
    }

    #[test]
    fn test_simulate_missing_workload_fails() {
        let dir = create_temp_dir();

        gauge()
            .current_dir(dir.path())
            .args(["simulate", "no-such-file.json"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("no-such-file.json"));
    }

    #[test]
    fn test_simulate_rejects_invalid_config_override() {
        let dir = create_temp_dir();
        let workload = write_warning_workload(&dir);

        gauge()
            .current_dir(dir.path())
            .args([
                "simulate",
                workload.to_str().unwrap(),
                "--max-tokens",
                "0",
            ])
            .assert()
            .failure()
            .stderr(predicate::str::contains("max_tokens"));
    }
}
