//! CLI Integration Tests
//!
//! These tests run the built `senses` binary against snapshot files.
//!
//! ```
//! cargo test --package senses-cli --test cli_integration
//! ```

use std::fs;
use std::process::Command;

fn run_senses(args: &[&str]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_senses"))
        .args(args)
        .env_remove("SENSES_SERVICE_URL")
        .env("NO_COLOR", "1")
        .output()
        .expect("Failed to run senses binary")
}

const SNAPSHOT: &str = r#"{
    "persona_id": "p-1",
    "toggles": ["lightLevel"],
    "connections": [
        {"id": "p1", "sense_id": "fitness", "provider_id": "fitbit", "display_name": "Fitbit",
         "account_key": "a@x.com", "connected_at": "2024-05-01T12:00:00Z", "origin": "persisted"},
        {"id": "s1", "sense_id": "fitness", "provider_id": "strava", "display_name": "Strava",
         "account_key": "b@x.com", "connected_at": "2024-05-02T12:00:00Z", "origin": "session"}
    ],
    "local_locations": [
        {"id": "l1", "sense": "news", "kind": "global", "display_name": "Global",
         "added_at": "2024-05-01T12:00:00Z"}
    ]
}"#;

#[test]
fn test_help_command() {
    let output = run_senses(&["--help"]);
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    for cmd in ["normalize", "fingerprint", "summary", "push", "config"] {
        assert!(stdout.contains(cmd), "Help should list {cmd}");
    }
}

#[test]
fn test_normalize_command() {
    let output = run_senses(&["normalize", "lightLevel", "air_quality", "NoiseLevel"]);
    assert!(output.status.success());
    assert_eq!(
        String::from_utf8_lossy(&output.stdout),
        "light_level\nair_quality\nnoise_level\n"
    );
}

#[test]
fn test_fingerprint_json() {
    let output = run_senses(&[
        "fingerprint",
        "--user-agent",
        "Mozilla/5.0 (Windows NT 10.0) Firefox/128.0",
        "--platform",
        "Win32",
        "--screen",
        "2560x1440",
        "--format",
        "json",
    ]);
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["device"]["browser"], "Firefox");
    assert_eq!(json["device"]["os"], "Windows");
    assert_eq!(json["label"], "Firefox on Windows");
}

#[test]
fn test_summary_json() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("persona.json");
    fs::write(&path, SNAPSHOT).unwrap();

    let output = run_senses(&["summary", path.to_str().unwrap(), "--format", "json"]);
    assert!(output.status.success(), "{:?}", output);

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["persona_id"], "p-1");
    // time + date essential; light_level, fitness and news additional.
    assert_eq!(json["summary"]["essential_count"], 2);
    assert_eq!(json["summary"]["additional_count"], 3);
    assert_eq!(json["summary"]["connected_service_count"], 1);
    assert_eq!(json["summary"]["total_count"], 5);
}

#[test]
fn test_summary_missing_file_fails() {
    let output = run_senses(&["summary", "/definitely/not/here.json"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Failed to read snapshot"));
}

#[test]
fn test_push_dry_run_lists_calls() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("persona.json");
    fs::write(&path, SNAPSHOT).unwrap();

    let output = run_senses(&["push", path.to_str().unwrap(), "--dry-run"]);
    assert!(output.status.success(), "{:?}", output);

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("POST   /oauth-connections"));
    assert!(stdout.contains("strava"));
    assert!(!stdout.contains("fitbit"));
    assert!(stdout.contains("PUT    /personas/p-1"));
}
