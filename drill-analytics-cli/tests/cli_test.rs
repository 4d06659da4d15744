use assert_cmd::Command;
use drill_analytics::models::{Landmark, LandmarkFrame, PoseLandmark, POSE_LANDMARK_COUNT};
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn athlete_frame(n: u32, hip_x: f64) -> LandmarkFrame {
    let mut landmarks = vec![Landmark::new(0.5, 0.5); POSE_LANDMARK_COUNT];
    landmarks[PoseLandmark::Nose.index()] = Landmark::new(-0.5, 0.0);
    landmarks[PoseLandmark::RightFootIndex.index()] = Landmark::new(10.0, 1.0);
    landmarks[PoseLandmark::CALIBRATION_EYE.index()] = Landmark::new(0.45, 0.05);
    landmarks[PoseLandmark::LeftHip.index()] = Landmark::new(hip_x, 0.5);
    landmarks[PoseLandmark::RightHip.index()] = Landmark::new(hip_x, 0.5);
    landmarks[PoseLandmark::LeftAnkle.index()] = Landmark::new(0.45, 0.95);
    landmarks[PoseLandmark::RightAnkle.index()] = Landmark::new(0.55, 0.95);
    let timestamp_ms = n as f64 * 100.0;
    LandmarkFrame::new(n, timestamp_ms, timestamp_ms / 1000.0, landmarks)
}

fn write_recording(dir: &Path) -> std::path::PathBuf {
    let mut lines = vec![r#"{"event":"cue","timestamp_ms":50.0}"#.to_string()];
    for n in 0..=12 {
        lines.push(serde_json::to_string(&athlete_frame(n, n as f64 * 0.15)).unwrap());
    }
    lines.push(r#"{"event":"end","timestamp_ms":1250.0}"#.to_string());

    let path = dir.join("sprint.jsonl");
    fs::write(&path, lines.join("\n")).unwrap();
    path
}

fn drill_analytics() -> Command {
    let mut cmd = Command::cargo_bin("drill-analytics").unwrap();
    cmd.env_remove("DRILL_ANALYTICS_CONFIG");
    cmd
}

#[test]
fn test_help_command() {
    drill_analytics()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Athletic drill analysis"))
        .stdout(predicate::str::contains("analyze"))
        .stdout(predicate::str::contains("config"));
}

#[test]
fn test_version_command() {
    drill_analytics()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("0.1.0"));
}

#[test]
fn test_completions_command() {
    drill_analytics()
        .arg("completions")
        .arg("bash")
        .assert()
        .success()
        .stdout(predicate::str::contains("_drill-analytics"));
}

#[test]
fn test_analyze_json_report() {
    let dir = TempDir::new().unwrap();
    let recording = write_recording(dir.path());

    drill_analytics()
        .arg("--config")
        .arg(dir.path().join("config.toml"))
        .arg("analyze")
        .arg("--landmarks")
        .arg(&recording)
        .args(["--height", "1.8", "--json", "--no-progress"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"total_distance\""))
        .stdout(predicate::str::contains("\"records\""))
        .stdout(predicate::str::contains("\"drill_time_secs\""));
}

#[test]
fn test_analyze_table_report() {
    let dir = TempDir::new().unwrap();
    let recording = write_recording(dir.path());

    drill_analytics()
        .arg("--config")
        .arg(dir.path().join("config.toml"))
        .arg("analyze")
        .arg("--landmarks")
        .arg(&recording)
        .args(["--height", "1.8", "--no-progress"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Session summary"))
        .stdout(predicate::str::contains("YD"));
}

#[test]
fn test_analyze_requires_height_source() {
    let dir = TempDir::new().unwrap();
    let recording = write_recording(dir.path());

    drill_analytics()
        .arg("analyze")
        .arg("--landmarks")
        .arg(&recording)
        .assert()
        .failure()
        .stderr(predicate::str::contains("--height"));
}

#[test]
fn test_analyze_rejects_invalid_height() {
    let dir = TempDir::new().unwrap();
    let recording = write_recording(dir.path());

    drill_analytics()
        .arg("--config")
        .arg(dir.path().join("config.toml"))
        .arg("analyze")
        .arg("--landmarks")
        .arg(&recording)
        .args(["--height", "0", "--no-progress"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Analysis failed"));
}

#[test]
fn test_config_init_and_show() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");

    drill_analytics()
        .arg("--config")
        .arg(&path)
        .args(["config", "init"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Configuration initialized"));

    assert!(path.exists());

    drill_analytics()
        .arg("--config")
        .arg(&path)
        .args(["config", "init"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--force"));

    drill_analytics()
        .arg("--config")
        .arg(&path)
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("[api]"))
        .stdout(predicate::str::contains("base_url"));
}
