//! Shared helpers for integration tests

#![allow(dead_code)]

use ciscan::fs::RealFileSystem;
use ciscan::{CiscanConfig, ScanOrchestrator, ScanResult};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::Arc;
use tempfile::TempDir;

pub const FASTFILE: &str = r#"fastlane_version "2.0.0"

default_platform :ios

platform :ios do
  lane :build do
    gym
  end

  lane :deploy do
    pilot
  end
end
"#;

pub const ROOT_BUILD_GRADLE: &str = r#"buildscript {
    repositories {
        jcenter()
    }
    dependencies {
        classpath 'com.android.tools.build:gradle:2.1.0'
    }
}
"#;

pub const APP_BUILD_GRADLE: &str = "apply plugin: 'com.android.application'\n";

pub const SHARED_SCHEME: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<Scheme LastUpgradeVersion = "0800" version = "1.3">
   <TestAction buildConfiguration = "Debug">
      <Testables>
         <TestableReference skipped = "NO">
            <BuildableReference BlueprintName = "AppTests"/>
         </TestableReference>
      </Testables>
   </TestAction>
</Scheme>
"#;

/// Path to the ciscan binary built for this test run
pub fn ciscan_bin() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_ciscan"))
}

pub fn ciscan() -> Command {
    let mut command = Command::new(ciscan_bin());
    command.env_remove("RUST_LOG").env_remove("CISCAN_RESULT_FILE");
    command
}

/// Writes `content` to `root/relative`, creating parent directories
pub fn write_file(root: &Path, relative: &str, content: &str) {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("Failed to create fixture directory");
    }
    fs::write(&path, content).expect("Failed to write fixture file");
}

#[cfg(unix)]
pub fn write_executable(root: &Path, relative: &str, content: &str) {
    use std::os::unix::fs::PermissionsExt;

    write_file(root, relative, content);
    let path = root.join(relative);
    let mut permissions = fs::metadata(&path).expect("Failed to stat fixture").permissions();
    permissions.set_mode(0o755);
    fs::set_permissions(&path, permissions).expect("Failed to chmod fixture");
}

#[cfg(not(unix))]
pub fn write_executable(root: &Path, relative: &str, content: &str) {
    write_file(root, relative, content);
}

pub fn fastlane_repo() -> TempDir {
    let dir = TempDir::new().expect("Failed to create temp dir");
    write_file(dir.path(), "fastlane/Fastfile", FASTFILE);
    dir
}

pub fn android_repo() -> TempDir {
    let dir = TempDir::new().expect("Failed to create temp dir");
    write_file(dir.path(), "build.gradle", ROOT_BUILD_GRADLE);
    write_file(dir.path(), "app/build.gradle", APP_BUILD_GRADLE);
    write_executable(dir.path(), "gradlew", "#!/bin/sh\n");
    dir
}

pub fn ios_repo() -> TempDir {
    let dir = TempDir::new().expect("Failed to create temp dir");
    write_file(dir.path(), "App.xcodeproj/project.pbxproj", "// !$*UTF8*$!\n");
    write_file(
        dir.path(),
        "App.xcodeproj/xcshareddata/xcschemes/App.xcscheme",
        SHARED_SCHEME,
    );
    dir
}

pub fn scan(root: &Path) -> ScanResult {
    let config = CiscanConfig {
        log_level: "info".to_string(),
        max_depth: 12,
        step_lib_source: ciscan::pipeline::DEFAULT_STEP_LIB_SOURCE.to_string(),
        result_file: "result".to_string(),
    };
    let mut orchestrator = ScanOrchestrator::with_defaults(Arc::new(RealFileSystem::new()), &config);
    orchestrator.run(root).expect("Scan failed")
}
