//! End-to-end tests for the sysopt binary
//!
//! Every run uses --no-backend and --no-sampling so output does not depend on
//! the environment.

use predicates::prelude::*;
use std::io::Write;
use tempfile::NamedTempFile;

fn sysopt() -> assert_cmd::Command {
    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("sysopt");
    cmd.env_remove("RUST_LOG")
        .arg("--no-backend")
        .arg("--no-sampling");
    cmd
}

fn events_file() -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, r#"{{"name": "read", "execution_time": 0.2}}"#).unwrap();
    writeln!(file, r#"{{"name": "read", "execution_time": 0.2}}"#).unwrap();
    writeln!(file, r#"{{"name": "getpid", "execution_time": 0.0001}}"#).unwrap();
    writeln!(file, r#"{{"name": "futex", "execution_time": 0.07}}"#).unwrap();
    file.flush().unwrap();
    file
}

#[test]
fn test_empty_run_reports_nothing_recorded() {
    sysopt()
        .assert()
        .success()
        .stdout(predicate::str::contains("Optimization report #1"))
        .stdout(predicate::str::contains("backend: disabled"))
        .stdout(predicate::str::contains("No syscalls recorded."));
}

#[test]
fn test_replay_text_report() {
    let events = events_file();
    sysopt()
        .arg("--events")
        .arg(events.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("SEVERE_PERFORMANCE_ISSUE"))
        .stdout(predicate::str::contains("MODERATE_OPTIMIZATION"))
        .stdout(predicate::str::contains(
            "Implement buffered I/O for read to reduce system call frequency",
        ))
        .stdout(predicate::str::contains("2 of 3 syscalls need attention"));
}

#[test]
fn test_replay_json_report() {
    let events = events_file();
    let output = sysopt()
        .arg("--events")
        .arg(events.path())
        .arg("--format")
        .arg("json")
        .output()
        .unwrap();
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout).unwrap();
    let report: serde_json::Value = serde_json::from_str(stdout.trim()).unwrap();
    assert_eq!(report["round"], 1);
    assert_eq!(report["backend"], "disabled");
    assert_eq!(report["recommendations"].as_array().unwrap().len(), 2);
    assert_eq!(report["recommendations"][0]["syscall"], "futex");
    assert_eq!(report["performance_data"]["read"]["execution_count"], 2);
    assert_eq!(report["categories"]["Process"][0], "getpid");
}

#[test]
fn test_threshold_override() {
    let events = events_file();
    sysopt()
        .arg("--events")
        .arg(events.path())
        .arg("--threshold")
        .arg("0.5")
        .assert()
        .success()
        .stdout(predicate::str::contains("No syscalls need attention (3 tracked)."));
}

#[test]
fn test_config_file_is_applied() {
    let mut config = NamedTempFile::new().unwrap();
    writeln!(config, "performance_threshold = 0.0").unwrap();
    config.flush().unwrap();
    let events = events_file();

    sysopt()
        .arg("--config")
        .arg(config.path())
        .arg("--events")
        .arg(events.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("3 of 3 syscalls need attention"));
}

#[test]
fn test_burst_records_thirty_events() {
    let output = sysopt()
        .arg("--burst")
        .arg("--format")
        .arg("json")
        .output()
        .unwrap();
    assert!(output.status.success());

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let total: u64 = report["performance_data"]
        .as_object()
        .unwrap()
        .values()
        .map(|d| d["execution_count"].as_u64().unwrap())
        .sum();
    assert_eq!(total, 30);
}

#[test]
fn test_multiple_rounds_emit_one_line_each() {
    let output = sysopt()
        .arg("--simulate")
        .arg("--rounds")
        .arg("2")
        .arg("--refresh-interval")
        .arg("1")
        .arg("--format")
        .arg("json")
        .output()
        .unwrap();
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout).unwrap();
    let rounds: Vec<serde_json::Value> = stdout
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    assert_eq!(rounds.len(), 2);
    assert_eq!(rounds[1]["round"], 2);
    assert!(!rounds[0]["performance_data"].as_object().unwrap().is_empty());
}

#[test]
fn test_zero_rounds_rejected() {
    sysopt()
        .arg("--rounds")
        .arg("0")
        .assert()
        .failure()
        .stderr(predicate::str::contains("--rounds"));
}

#[test]
fn test_invalid_threshold_rejected() {
    sysopt()
        .arg("--threshold=-1")
        .assert()
        .failure()
        .stderr(predicate::str::contains("performance_threshold"));
}

#[test]
fn test_missing_events_file() {
    sysopt()
        .arg("--events")
        .arg("/nonexistent/events.jsonl")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to replay events"));
}

#[test]
fn test_help_lists_options() {
    assert_cmd::cargo::cargo_bin_cmd!("sysopt")
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--simulate"))
        .stdout(predicate::str::contains("--events"))
        .stdout(predicate::str::contains("--no-backend"));
}
