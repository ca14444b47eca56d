//! CLI integration tests
//!
//! These run the built binary against temporary checkouts and check the
//! written files and exit codes.

mod support;

use serial_test::serial;
use std::fs;
use support::{ciscan, fastlane_repo};
use tempfile::TempDir;

#[test]
fn test_cli_help() {
    let output = ciscan().arg("--help").output().expect("Failed to execute ciscan");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("scan"));
    assert!(stdout.contains("config"));
}

#[test]
fn test_cli_version() {
    let output = ciscan().arg("--version").output().expect("Failed to execute ciscan");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains(env!("CARGO_PKG_VERSION")));
}

#[test]
#[serial]
fn test_scan_writes_yaml_result() {
    let repo = fastlane_repo();
    let out = TempDir::new().unwrap();

    let output = ciscan()
        .arg("scan")
        .arg(repo.path())
        .arg("--output-dir")
        .arg(out.path())
        .output()
        .expect("Failed to execute ciscan");
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let result = fs::read_to_string(out.path().join("result.yml")).unwrap();
    let value: serde_yaml::Value = serde_yaml::from_str(&result).unwrap();
    assert_eq!(
        value["options"]["fastlane"]["value_map"]["."]["value_map"]["build"]["config"],
        "fastlane-config"
    );
    assert!(value["configs"]["fastlane"]["fastlane-config"].is_string());
}

#[test]
#[serial]
fn test_scan_json_format() {
    let repo = fastlane_repo();
    let out = TempDir::new().unwrap();

    let output = ciscan()
        .args(["scan", "--format", "json", "--output-dir"])
        .arg(out.path())
        .arg(repo.path())
        .output()
        .expect("Failed to execute ciscan");
    assert!(output.status.success());

    let result = fs::read_to_string(out.path().join("result.json")).unwrap();
    let value: serde_json::Value = serde_json::from_str(&result).unwrap();
    assert!(value["warnings"]["fastlane"].as_array().unwrap().is_empty());
}

#[test]
#[serial]
fn test_scan_empty_checkout_fails() {
    let repo = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();

    let output = ciscan()
        .arg("scan")
        .arg(repo.path())
        .arg("--output-dir")
        .arg(out.path())
        .output()
        .expect("Failed to execute ciscan");
    assert_eq!(output.status.code(), Some(1));

    let result = fs::read_to_string(out.path().join("result.yml")).unwrap();
    assert_eq!(
        result.trim(),
        "errors:\n  general:\n  - No known platform detected"
    );
}

#[test]
#[serial]
fn test_config_android_without_gradlew_fails() {
    let repo = TempDir::new().unwrap();
    support::write_file(repo.path(), "build.gradle", support::ROOT_BUILD_GRADLE);
    let out = TempDir::new().unwrap();

    let output = ciscan()
        .args(["config", "--ci", "--output-dir"])
        .arg(out.path())
        .arg(repo.path())
        .output()
        .expect("Failed to execute ciscan");
    assert_eq!(output.status.code(), Some(1));
    assert!(!out.path().join("bitrise.yml").exists());

    let result = fs::read_to_string(out.path().join("result.yml")).unwrap();
    let value: serde_yaml::Value = serde_yaml::from_str(&result).unwrap();
    let keys: Vec<&str> = value
        .as_mapping()
        .unwrap()
        .keys()
        .filter_map(|k| k.as_str())
        .collect();
    assert_eq!(keys, vec!["warnings", "errors"]);

    let warnings = value["warnings"]["android"].as_sequence().unwrap();
    assert_eq!(warnings.len(), 1);
    assert!(warnings[0]
        .as_str()
        .unwrap()
        .contains("No Gradle Wrapper (gradlew) found"));
    assert_eq!(value["errors"]["general"][0], "No known platform detected");
}

#[test]
#[serial]
fn test_scan_missing_path_fails() {
    let out = TempDir::new().unwrap();
    let output = ciscan()
        .args(["scan", "/definitely/not/here", "--output-dir"])
        .arg(out.path())
        .output()
        .expect("Failed to execute ciscan");
    assert_eq!(output.status.code(), Some(1));
}

#[test]
#[serial]
fn test_config_ci_writes_pipeline() {
    let repo = fastlane_repo();
    let out = TempDir::new().unwrap();

    let output = ciscan()
        .args(["config", "--ci", "--output-dir"])
        .arg(out.path())
        .arg(repo.path())
        .output()
        .expect("Failed to execute ciscan");
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    assert!(out.path().join("result.yml").exists());
    let pipeline = fs::read_to_string(out.path().join("bitrise.yml")).unwrap();
    let value: serde_yaml::Value = serde_yaml::from_str(&pipeline).unwrap();
    assert_eq!(value["app"]["envs"][0]["FASTLANE_WORK_DIR"], ".");
    assert_eq!(value["app"]["envs"][1]["FASTLANE_LANE"], "build");
    assert_eq!(value["project_type"], "other");
}

#[test]
#[serial]
fn test_invalid_max_depth_rejected() {
    let repo = fastlane_repo();
    let output = ciscan()
        .args(["scan", "--max-depth", "0"])
        .arg(repo.path())
        .output()
        .expect("Failed to execute ciscan");
    assert_eq!(output.status.code(), Some(1));
}
