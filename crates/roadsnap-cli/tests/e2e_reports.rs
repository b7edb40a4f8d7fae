//! E2E tests for the offline commands: `rsnap list`, `rsnap chart`,
//! `rsnap report` and `rsnap completions`.
//!
//! Snapshots are seeded straight into the work directory, so nothing here
//! talks to Jira.

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::{Value, json};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

// ---------------------------------------------------------------------------
// Test harness helpers
// ---------------------------------------------------------------------------

const CONFIG: &str = r#"
[jira]
base_url = "https://acme.atlassian.net"

[projects]
names = ["Mobile App"]

[epic]
start_date_field = "customfield_10015"

[status_names]
done = ["Done", "Closed"]
progress = ["In Progress"]
todo = ["To Do", "Backlog"]
"#;

fn rsnap_cmd(dir: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("rsnap"));
    cmd.current_dir(dir);
    cmd.env("ROADSNAP_LOG", "error");
    cmd.env_remove("FORMAT");
    cmd
}

fn issue(key: &str, status: &str, due: Option<&str>) -> Value {
    json!({
        "key": key,
        "fields": {
            "summary": format!("{key} summary"),
            "status": {"name": status},
            "labels": ["mobile"],
            "duedate": due,
            "customfield_10015": "2024-01-02"
        }
    })
}

fn write_json(path: &Path, value: &Value) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, serde_json::to_string_pretty(value).unwrap()).unwrap();
}

fn seed_snapshot(dir: &Path, date: &str, epics: &[(&str, &str, &str, &[&str])]) {
    let raw = dir.join("MobileApp").join(date).join("raw_data");
    let list: Vec<Value> = epics
        .iter()
        .map(|(key, status, due, _)| issue(key, status, Some(due)))
        .collect();
    write_json(&raw.join("epics.json"), &Value::Array(list));

    for (key, _, _, children) in epics {
        let issues: Vec<Value> = children
            .iter()
            .enumerate()
            .map(|(i, status)| issue(&format!("{key}-{i}"), status, None))
            .collect();
        write_json(&raw.join(format!("issues_{key}.json")), &Value::Array(issues));
    }
}

fn seeded_workspace() -> TempDir {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("rsnap-config.toml"), CONFIG).unwrap();

    seed_snapshot(
        dir.path(),
        "2024-03-01",
        &[
            ("MOB-1", "In Progress", "2024-03-20", &["Done", "To Do"]),
            ("MOB-2", "Backlog", "2024-03-25", &["To Do"]),
        ],
    );
    seed_snapshot(
        dir.path(),
        "2024-03-28",
        &[
            ("MOB-1", "Done", "2024-03-20", &["Done", "Closed"]),
            ("MOB-2", "Backlog", "2024-04-15", &["To Do"]),
        ],
    );
    dir
}

// ---------------------------------------------------------------------------
// rsnap list
// ---------------------------------------------------------------------------

#[test]
fn list_writes_summary_for_latest_snapshot() {
    let dir = seeded_workspace();

    rsnap_cmd(dir.path()).args(["list"]).assert().success();

    let md = fs::read_to_string(dir.path().join("MobileApp/2024-03-28/MobileApp_roadsnap.md"))
        .expect("summary markdown written next to the latest snapshot");
    assert!(md.contains("MobileApp: March 28, 2024"));
    assert!(md.contains("Done (1/2)"));
    assert!(md.contains("[MOB-1](https://acme.atlassian.net/browse/MOB-1)"));
    assert!(md.contains("`mobile`"));
    assert!(md.contains("Planning: Postponed"), "MOB-2 moved from Mar 25 to Apr 15");
    assert!(!dir.path().join("MobileApp/2024-03-01/MobileApp_roadsnap.md").exists());
}

#[test]
fn list_json_reports_buckets() {
    let dir = seeded_workspace();

    let output = rsnap_cmd(dir.path())
        .args(["list", "--json"])
        .output()
        .expect("list should not crash");
    assert!(
        output.status.success(),
        "list --json failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let written: Value = serde_json::from_slice(&output.stdout).expect("valid JSON from list");
    let summary = &written[0]["summary"];
    assert_eq!(summary["project"], "MobileApp");
    assert_eq!(summary["date"], "2024-03-28");
    assert_eq!(summary["done"][0]["epic"]["key"], "MOB-1");
    assert_eq!(summary["outstanding"][0]["epic"]["key"], "MOB-2");
    assert_eq!(written[0]["planning"]["MOB-2"], "Postponed");
}

#[test]
fn list_without_snapshots_fails() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("rsnap-config.toml"), CONFIG).unwrap();

    rsnap_cmd(dir.path())
        .args(["list"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("rsnap cache"));
}

// ---------------------------------------------------------------------------
// rsnap chart
// ---------------------------------------------------------------------------

#[test]
fn chart_writes_svg_with_one_bar_per_snapshot() {
    let dir = seeded_workspace();

    rsnap_cmd(dir.path()).args(["chart"]).assert().success();

    let svg = fs::read_to_string(dir.path().join("MobileApp/roadmap-stats.svg")).unwrap();
    assert!(svg.starts_with("<svg"));
    assert!(svg.contains("Mar 01, 2024"));
    assert!(svg.contains("Mar 28, 2024"));
}

// ---------------------------------------------------------------------------
// rsnap report
// ---------------------------------------------------------------------------

#[test]
fn report_writes_yearly_markdown() {
    let dir = seeded_workspace();

    rsnap_cmd(dir.path())
        .args(["report", "--year", "2024"])
        .assert()
        .success();

    let md = fs::read_to_string(dir.path().join("MobileApp/MobileApp-2024.md")).unwrap();
    assert!(md.contains("Mobile App: Jan, 2024 - Dec, 2024"));
    assert!(md.contains("<a name=\"2024-03\"></a>Mar, 2024"));
    assert!(md.contains("Snapshot From: Mar 1, 2024"));
    assert!(md.contains("Snapshot To: Mar 28, 2024"));
    assert!(md.contains("| [MOB-1](https://acme.atlassian.net/browse/MOB-1) MOB-1 summary | InProgress -> Done | Ok |"));
    assert!(md.contains("Mar 25, 2024 -> Rescheduled"));
}

#[test]
fn report_json_lists_written_files() {
    let dir = seeded_workspace();

    let output = rsnap_cmd(dir.path())
        .args(["report", "--year", "2024", "--json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let written: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(written[0]["project"], "Mobile App");
    assert_eq!(written[0]["reports"].as_array().map(Vec::len), Some(12));
}

// ---------------------------------------------------------------------------
// errors and completions
// ---------------------------------------------------------------------------

#[test]
fn missing_config_reports_error_code() {
    let dir = TempDir::new().unwrap();

    rsnap_cmd(dir.path())
        .args(["list"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("E1001"));
}

#[test]
fn explicit_dir_and_config_are_honored() {
    let dir = seeded_workspace();
    let elsewhere = TempDir::new().unwrap();
    let config = dir.path().join("rsnap-config.toml");

    rsnap_cmd(elsewhere.path())
        .arg("--dir")
        .arg(dir.path())
        .arg("--config")
        .arg(&config)
        .arg("chart")
        .assert()
        .success();

    assert!(dir.path().join("MobileApp/roadmap-stats.svg").exists());
}

#[test]
fn completions_need_no_config() {
    let dir = TempDir::new().unwrap();

    rsnap_cmd(dir.path())
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("rsnap"));
}

#[test]
fn verbose_flag_accepted_after_subcommand() {
    let dir = seeded_workspace();

    rsnap_cmd(dir.path())
        .env_remove("ROADSNAP_LOG")
        .args(["list", "-v"])
        .assert()
        .success()
        .stderr(predicate::str::contains("DEBUG"));
}
