use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use assert_json_diff::assert_json_include;
use predicates::prelude::*;
use serde_json::{json, Value};
use tempfile::TempDir;

fn write(dir: &Path, name: &str, v: &Value) -> PathBuf {
    let p = dir.join(name);
    fs::write(&p, serde_json::to_vec(v).unwrap()).unwrap();
    p
}

fn snapshot(dir: &Path) -> PathBuf {
    let events: Vec<Value> = (0..119)
        .map(|i| json!({"unit_id": format!("U{i}"), "timestamp": "2026-07-10T09:00:00", "category": 39}))
        .collect();
    write(dir, "snapshot.json", &json!({"population": {"total": 570}, "events": events}))
}

fn pmq() -> Command {
    let mut cmd = Command::cargo_bin("pmq").unwrap();
    cmd.env_remove("RUST_LOG");
    cmd
}

fn stdout_json(cmd: &mut Command) -> Value {
    let out = cmd.assert().success().get_output().stdout.clone();
    serde_json::from_slice(&out).unwrap()
}

#[test]
fn report_goes_to_stdout_by_default() {
    let tmp = TempDir::new().unwrap();
    let snap = snapshot(tmp.path());
    let v = stdout_json(pmq().arg("--snapshot").arg(&snap).args(["--as-of", "2026-10-19"]));

    assert!(v["id"].as_str().unwrap().starts_with("RPT:"));
    assert_eq!(v["periods"].as_array().unwrap().len(), 6);
    assert_json_include!(
        actual: v.clone(),
        expected: json!({
            "horizon": {"start": "2026-07-01", "currentPeriod": 3},
            "totals": {"totalPopulation": 570, "basePlan": 95}
        })
    );
    assert_eq!(v["periods"][1]["adjustedPlan"], 90);
    assert_eq!(v["inputSha256"].as_str().unwrap().len(), 64);
}

#[test]
fn runs_are_byte_identical() {
    let tmp = TempDir::new().unwrap();
    let snap = snapshot(tmp.path());
    let run = || {
        pmq()
            .arg("--snapshot")
            .arg(&snap)
            .args(["--as-of", "2026-10-19"])
            .assert()
            .success()
            .get_output()
            .stdout
            .clone()
    };
    assert_eq!(run(), run());
}

#[test]
fn flag_overrides_config_file() {
    let tmp = TempDir::new().unwrap();
    let snap = snapshot(tmp.path());
    let cfg = write(tmp.path(), "config.json", &json!({"reconcile_policy": "spread_remaining"}));

    let v = stdout_json(
        pmq()
            .arg("--snapshot")
            .arg(&snap)
            .arg("--config")
            .arg(&cfg)
            .args(["--as-of", "2026-10-19", "--reconcile", "next_period"]),
    );
    assert_eq!(v["periods"][1]["adjustedPlan"], 71);
    assert_eq!(v["policies"]["reconcilePolicy"], "next_period");
}

#[test]
fn out_dir_gets_report_and_renders() {
    let tmp = TempDir::new().unwrap();
    let snap = snapshot(tmp.path());
    let out = tmp.path().join("out");

    pmq()
        .arg("--snapshot")
        .arg(&snap)
        .arg("--out")
        .arg(&out)
        .args(["--as-of", "2026-10-19", "--render", "json", "--render", "text"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("RPT:"));

    let report: Value = serde_json::from_slice(&fs::read(out.join("quota_report.json")).unwrap()).unwrap();
    let rendered: Value = serde_json::from_slice(&fs::read(out.join("report.json")).unwrap()).unwrap();
    assert_eq!(rendered["integrity"]["report_id"], report["id"]);

    let text = fs::read_to_string(out.join("report.txt")).unwrap();
    assert!(text.contains("Month to date: P4 (2026-10)"));
}

#[test]
fn validate_only_builds_nothing() {
    let tmp = TempDir::new().unwrap();
    let snap = snapshot(tmp.path());
    let out = tmp.path().join("out");
    pmq()
        .arg("--snapshot")
        .arg(&snap)
        .arg("--out")
        .arg(&out)
        .args(["--as-of", "2026-10-19", "--validate-only"])
        .assert()
        .success()
        .stderr(predicate::str::contains("validate-only: inputs OK (119 events, 0 malformed)"));
    assert!(!out.exists());
}

#[test]
fn invalid_cutoff_is_a_validation_error() {
    let tmp = TempDir::new().unwrap();
    let snap = snapshot(tmp.path());
    pmq()
        .arg("--snapshot")
        .arg(&snap)
        .args(["--as-of", "2026-10-19", "--cutoff", "2026-03-01"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("cutoff"));
}

#[test]
fn unknown_config_key_is_a_validation_error() {
    let tmp = TempDir::new().unwrap();
    let snap = snapshot(tmp.path());
    let cfg = write(tmp.path(), "config.json", &json!({"reconcile": "next_period"}));
    pmq()
        .arg("--snapshot")
        .arg(&snap)
        .arg("--config")
        .arg(&cfg)
        .assert()
        .code(2);
}

#[test]
fn both_units_and_population_is_a_validation_error() {
    let tmp = TempDir::new().unwrap();
    let snap = write(
        tmp.path(),
        "snapshot.json",
        &json!({"population": {"total": 3}, "units": []}),
    );
    pmq().arg("--snapshot").arg(&snap).assert().code(2);
}

#[test]
fn missing_snapshot_is_an_io_error() {
    let tmp = TempDir::new().unwrap();
    pmq()
        .arg("--snapshot")
        .arg(tmp.path().join("nope.json"))
        .assert()
        .code(4);
}

#[test]
fn url_snapshot_is_refused() {
    pmq()
        .args(["--snapshot", "https://example.org/snapshot.json"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("no scheme"));
}

#[test]
fn quiet_keeps_stderr_empty() {
    let tmp = TempDir::new().unwrap();
    let snap = write(
        tmp.path(),
        "snapshot.json",
        &json!({"population": {"total": 12}, "events": [{"timestamp": "2026-07-02"}]}),
    );
    pmq()
        .arg("--snapshot")
        .arg(&snap)
        .args(["--as-of", "2026-10-19", "--quiet"])
        .assert()
        .success()
        .stderr(predicate::str::is_empty());
}
