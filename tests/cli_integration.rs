//! Integration tests for the radarmatch CLI.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

fn radarmatch() -> Command {
    Command::cargo_bin("radarmatch").expect("binary is built")
}

#[test]
fn test_version_command() {
    radarmatch()
        .arg("version")
        .assert()
        .success()
        .stdout(predicate::str::contains("radarmatch"));
}

#[test]
fn test_help_lists_commands() {
    radarmatch()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("init"))
        .stdout(predicate::str::contains("validate"))
        .stdout(predicate::str::contains("render"));
}

#[test]
fn test_invalid_command() {
    radarmatch()
        .arg("invalid-command-that-does-not-exist")
        .assert()
        .failure();
}

#[test]
fn test_init_creates_config() {
    let temp_dir = TempDir::new().unwrap();

    radarmatch()
        .arg("init")
        .arg("--path")
        .arg(temp_dir.path())
        .assert()
        .success();

    let content = fs::read_to_string(temp_dir.path().join("radarmatch.toml")).unwrap();
    assert!(content.contains("[scheduler]"));
    assert!(content.contains("[cache]"));
    assert!(temp_dir.path().join(".radarmatch").is_dir());
}

#[test]
fn test_validate_reports_clamping() {
    let temp_dir = TempDir::new().unwrap();
    let file = temp_dir.path().join("score.json");
    fs::write(
        &file,
        r#"{"businessSynergy": 150, "solutionMatch": -20, "businessTrends": 90,
            "growthPhaseMatch": 75, "urgencyAlignment": 60, "resourceComplement": 80}"#,
    )
    .unwrap();

    radarmatch()
        .arg("-q")
        .arg("validate")
        .arg(&file)
        .assert()
        .success()
        .stdout(predicate::str::contains("Issues (2)"))
        .stdout(predicate::str::contains("out_of_range"));
}

#[test]
fn test_validate_json_with_report() {
    let temp_dir = TempDir::new().unwrap();
    let legacy = temp_dir.path().join("legacy.json");
    let envelope = temp_dir.path().join("envelope.json");
    fs::write(&legacy, r#"{"commonTopics": 80, "profileMatch": 90}"#).unwrap();
    fs::write(&envelope, r#"{"score": 1, "breakdown": {"businessSynergy": 100}}"#).unwrap();

    let output = radarmatch()
        .arg("-q")
        .arg("validate")
        .arg("--json")
        .arg(&legacy)
        .arg(&envelope)
        .output()
        .unwrap();
    assert!(output.status.success());

    let parsed: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let results = parsed["results"].as_array().unwrap();
    assert_eq!(results.len(), 2);
    assert_eq!(results[0]["issues"][0]["type"], "format_conversion");
    assert_eq!(results[0]["breakdown"]["businessTrends"], 65);
    assert_eq!(parsed["report"]["total_validations"], 2);
}

#[test]
fn test_validate_stdin_garbage() {
    radarmatch()
        .arg("-q")
        .arg("validate")
        .arg("-")
        .write_stdin("this is not a score")
        .assert()
        .success()
        .stdout(predicate::str::contains("unknown_format"))
        .stdout(predicate::str::contains("Overall: 50"));
}

#[test]
fn test_render_writes_png() {
    let temp_dir = TempDir::new().unwrap();
    let file = temp_dir.path().join("match.json");
    let output = temp_dir.path().join("out").join("match.png");
    fs::write(&file, r#"{"score": 72, "breakdown": {"businessSynergy": 90, "solutionMatch": 80}}"#)
        .unwrap();

    radarmatch()
        .arg("-q")
        .arg("render")
        .arg(&file)
        .arg("--output")
        .arg(&output)
        .arg("--strategy")
        .arg("inline")
        .assert()
        .success()
        .stdout(predicate::str::contains("Chart written to"));

    let png = fs::read(&output).unwrap();
    assert_eq!(&png[..4], &[0x89, b'P', b'N', b'G']);
}

#[test]
fn test_render_rejects_unknown_strategy() {
    radarmatch()
        .arg("render")
        .arg("score.json")
        .arg("--output")
        .arg("out.png")
        .arg("--strategy")
        .arg("gpu")
        .assert()
        .failure();
}

#[cfg(feature = "sqlite")]
#[test]
fn test_repair_rewrites_stored_scores() {
    use radarmatch::storage::{KeyValueStore, SqliteStore};

    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("scores.db");
    {
        let mut store = SqliteStore::open(&db_path).unwrap();
        store
            .set("ai_score_legacy", r#"{"breakdown": {"commonTopics": 80}}"#)
            .unwrap();
        store.set("ai_score_corrupt", "{not json").unwrap();
        store
            .set(
                "ai_score_clean",
                r#"{"breakdown": {"businessSynergy": 70, "solutionMatch": 70, "businessTrends": 70, "growthPhaseMatch": 70, "urgencyAlignment": 70, "resourceComplement": 70}}"#,
            )
            .unwrap();
    }

    radarmatch()
        .current_dir(temp_dir.path())
        .arg("repair")
        .arg("--db")
        .arg(&db_path)
        .assert()
        .success()
        .stdout(predicate::str::contains("Repaired 2 entries"));

    let store = SqliteStore::open(&db_path).unwrap();
    assert!(store.get("ai_score_corrupt").unwrap().is_none());
    let legacy = store.get("ai_score_legacy").unwrap().unwrap();
    assert!(legacy.contains("businessTrends"));
    assert!(!legacy.contains("commonTopics"));
    assert_eq!(store.keys("ai_score_").unwrap().len(), 2);
}

#[cfg(feature = "sqlite")]
#[test]
fn test_repair_without_database() {
    let temp_dir = TempDir::new().unwrap();

    radarmatch()
        .current_dir(temp_dir.path())
        .arg("repair")
        .arg("--db")
        .arg(temp_dir.path().join("missing.db"))
        .assert()
        .success()
        .stdout(predicate::str::contains("No score database at"));

    assert!(!temp_dir.path().join("missing.db").exists());
}
