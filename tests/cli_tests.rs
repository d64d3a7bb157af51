//! CLI integration tests against a seeded database

use predicates::prelude::*;
use tempfile::TempDir;

use tendencia::record::{parse_timestamp, RunRecord};
use tendencia::store::RunStore;

/// Log with one cycle spanning `span` milliseconds.
fn span_log(span: f64) -> String {
    format!(r#"[{{"cycle":0,"time":0}},{{"cycle":0,"time":{}}}]"#, span)
}

/// Seed a database with a degrading sequence ending today.
fn seed_database(db_path: &std::path::Path) {
    let store = RunStore::open(db_path).unwrap();
    let now = chrono::Utc::now();

    for i in 0..8_i64 {
        let start_time = now - chrono::Duration::days(8 - i);
        store
            .insert_run(&RunRecord {
                id: i + 1,
                name: format!("run-{}", i + 1),
                sequence_name: "burn-in".to_string(),
                start_time,
                duration_secs: Some(20.0 + i as f64),
                cycles: Some(1),
                status: if i == 3 { "error".to_string() } else { "ok".to_string() },
                log: Some(span_log(100.0 + 12.0 * i as f64)),
            })
            .unwrap();
    }
}

#[test]
fn test_trends_text_output() {
    let tmp_dir = TempDir::new().unwrap();
    let db_path = tmp_dir.path().join("runs.db");
    seed_database(&db_path);

    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("tendencia");
    cmd.arg("--db").arg(&db_path).arg("trends").arg("--days").arg("30");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Long-term analysis"))
        .stdout(predicate::str::contains("Daily summary"));
}

#[test]
fn test_trends_json_output_has_status() {
    let tmp_dir = TempDir::new().unwrap();
    let db_path = tmp_dir.path().join("runs.db");
    seed_database(&db_path);

    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("tendencia");
    cmd.arg("--db").arg(&db_path).arg("--format").arg("json").arg("trends");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("\"status\": \"success\""))
        .stdout(predicate::str::contains("\"trends\""))
        .stdout(predicate::str::contains("\"degradation_alerts\""));
}

#[test]
fn test_trends_empty_database_reports_no_data() {
    let tmp_dir = TempDir::new().unwrap();
    let db_path = tmp_dir.path().join("runs.db");
    RunStore::open(&db_path).unwrap();

    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("tendencia");
    cmd.arg("--db").arg(&db_path).arg("--format").arg("json").arg("trends");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("\"status\": \"no_data\""));
}

#[test]
fn test_forecast_json_output() {
    let tmp_dir = TempDir::new().unwrap();
    let db_path = tmp_dir.path().join("runs.db");
    seed_database(&db_path);

    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("tendencia");
    cmd.arg("--db").arg(&db_path).arg("--format")
        .arg("json")
        .arg("forecast")
        .arg("burn-in")
        .arg("--days-ahead")
        .arg("7");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("\"predictions\""))
        .stdout(predicate::str::contains("\"model_quality\""));
}

#[test]
fn test_forecast_unknown_sequence_is_insufficient_data() {
    let tmp_dir = TempDir::new().unwrap();
    let db_path = tmp_dir.path().join("runs.db");
    seed_database(&db_path);

    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("tendencia");
    cmd.arg("--db").arg(&db_path).arg("--format").arg("json").arg("forecast").arg("nope");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("\"status\": \"insufficient_data\""));
}

#[test]
fn test_risk_json_output() {
    let tmp_dir = TempDir::new().unwrap();
    let db_path = tmp_dir.path().join("runs.db");
    seed_database(&db_path);

    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("tendencia");
    cmd.arg("--db").arg(&db_path).arg("--format").arg("json").arg("risk").arg("burn-in");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("\"risk_assessment\""))
        .stdout(predicate::str::contains("\"recommendations\""));
}

#[test]
fn test_compare_missing_run_id_fails() {
    let tmp_dir = TempDir::new().unwrap();
    let db_path = tmp_dir.path().join("runs.db");
    seed_database(&db_path);

    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("tendencia");
    cmd.arg("--db").arg(&db_path).arg("compare").arg("--runs").arg("1,999");

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("not all run ids found"));
}

#[test]
fn test_compare_reports_spread() {
    let tmp_dir = TempDir::new().unwrap();
    let db_path = tmp_dir.path().join("runs.db");
    seed_database(&db_path);

    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("tendencia");
    cmd.arg("--db").arg(&db_path).arg("compare").arg("--runs").arg("1,8");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Comparing 2 runs"))
        .stdout(predicate::str::contains("Best:"));
}

#[test]
fn test_maintenance_rejects_non_positive_threshold() {
    let tmp_dir = TempDir::new().unwrap();
    let db_path = tmp_dir.path().join("runs.db");
    seed_database(&db_path);

    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("tendencia");
    cmd.arg("--db").arg(&db_path).arg("maintenance").arg("--threshold").arg("0");

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("--threshold must be positive"));
}

#[test]
fn test_missing_db_argument_fails() {
    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("tendencia");
    cmd.arg("trends");
    cmd.assert().failure();
}
