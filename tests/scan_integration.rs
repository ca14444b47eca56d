//! Scans of real directory trees through the default detector set

mod support;

use ciscan::options::TreeResolver;
use ciscan::pipeline::steps;
use ciscan::scan::NO_PLATFORM_DETECTED;
use ciscan::PlatformId;
use support::{android_repo, fastlane_repo, ios_repo, scan, write_file, FASTFILE};
use tempfile::TempDir;
use yare::parameterized;

fn step_ids(definition: &str, workflow: &str) -> Vec<String> {
    let value: serde_yaml::Value = serde_yaml::from_str(definition).unwrap();
    value["workflows"][workflow]["steps"]
        .as_sequence()
        .unwrap()
        .iter()
        .map(|item| {
            let key = item.as_mapping().unwrap().keys().next().unwrap();
            let reference = key.as_str().unwrap();
            reference.split('@').next().unwrap().to_string()
        })
        .collect()
}

#[test]
fn test_fastlane_end_to_end() {
    let repo = fastlane_repo();
    let result = scan(repo.path());

    assert_eq!(result.platforms(), vec![PlatformId::Fastlane]);
    assert!(result.errors.is_empty());
    assert!(result.warnings_for(PlatformId::Fastlane).is_empty());

    let tree = result.options_for(PlatformId::Fastlane).unwrap();
    let work_dir = tree.question().unwrap();
    assert_eq!(work_dir.env_key, "FASTLANE_WORK_DIR");
    assert_eq!(work_dir.values.keys().collect::<Vec<_>>(), vec!["."]);

    let lanes = work_dir.values.get(".").unwrap().question().unwrap();
    assert_eq!(lanes.env_key, "FASTLANE_LANE");
    assert_eq!(lanes.values.keys().collect::<Vec<_>>(), vec!["build", "deploy"]);
    for lane in lanes.values.values() {
        assert_eq!(lane.config(), Some("fastlane-config"));
    }

    let definition = result
        .configs_for(PlatformId::Fastlane)
        .unwrap()
        .get("fastlane-config")
        .unwrap();
    assert_eq!(
        step_ids(definition, "primary"),
        vec![
            "activate-ssh-key",
            "git-clone",
            "cache-pull",
            "fastlane",
            "deploy-to-bitrise-io",
            "cache-push"
        ]
    );
    assert!(definition.contains("lane: $FASTLANE_LANE"));
    assert!(definition.contains("work_dir: $FASTLANE_WORK_DIR"));

    let yaml = serde_yaml::to_string(&result).unwrap();
    let value: serde_yaml::Value = serde_yaml::from_str(&yaml).unwrap();
    assert!(value["warnings"]["fastlane"].as_sequence().unwrap().is_empty());
    assert!(value.get("errors").is_none());
}

#[test]
fn test_empty_checkout_reports_single_error() {
    let repo = TempDir::new().unwrap();
    write_file(repo.path(), "README.md", "# nothing to build\n");

    let result = scan(repo.path());
    assert_eq!(result.errors, vec![NO_PLATFORM_DETECTED]);

    let value = serde_json::to_value(&result).unwrap();
    assert_eq!(
        value,
        serde_json::json!({"errors": {"general": ["No known platform detected"]}})
    );
}

#[test]
fn test_fastfile_without_lanes_falls_back_to_defaults() {
    let repo = TempDir::new().unwrap();
    write_file(repo.path(), "fastlane/Fastfile", "default_platform :ios\n");

    let result = scan(repo.path());
    let tree = result.options_for(PlatformId::Fastlane).unwrap();
    assert_eq!(tree.leaf_configs(), vec!["default-fastlane-config"]);
    assert!(result
        .configs_for(PlatformId::Fastlane)
        .unwrap()
        .contains_key("default-fastlane-config"));
    assert_eq!(
        result.warnings_for(PlatformId::Fastlane),
        &["no lanes found for Fastfile: fastlane/Fastfile".to_string()]
    );

    let resolution = TreeResolver::Deterministic.resolve(tree).unwrap();
    assert!(resolution.bindings.iter().all(|b| b.value == "_"));
}

#[test]
fn test_android_without_gradlew_is_not_a_platform() {
    let repo = TempDir::new().unwrap();
    write_file(repo.path(), "build.gradle", support::ROOT_BUILD_GRADLE);

    let result = scan(repo.path());
    assert!(result.platforms().is_empty());
    assert!(result.options_for(PlatformId::Android).is_none());
    assert!(result.configs_for(PlatformId::Android).is_none());

    let warnings = result.warnings_for(PlatformId::Android);
    assert_eq!(warnings.len(), 1);
    assert!(warnings[0].contains("No Gradle Wrapper (gradlew) found"));
    assert_eq!(result.errors, vec![NO_PLATFORM_DETECTED.to_string()]);
}

#[test]
fn test_android_without_gradlew_beside_fastlane() {
    let repo = fastlane_repo();
    write_file(repo.path(), "build.gradle", support::ROOT_BUILD_GRADLE);

    let result = scan(repo.path());
    assert_eq!(result.platforms(), vec![PlatformId::Fastlane]);
    assert_eq!(result.warnings_for(PlatformId::Android).len(), 1);
    assert!(!result.has_errors());
}

#[test]
fn test_android_project() {
    let repo = android_repo();
    let result = scan(repo.path());

    let resolution = TreeResolver::Deterministic
        .resolve(result.options_for(PlatformId::Android).unwrap())
        .unwrap();
    let values: Vec<&str> = resolution.bindings.iter().map(|b| b.value.as_str()).collect();
    assert_eq!(values, vec!["build.gradle", "./gradlew"]);
    assert_eq!(resolution.config, "android-config");

    let definition = result.pipeline_for(PlatformId::Android, &resolution).unwrap();
    assert!(definition.contains("gradle_task: assembleDebug"));
    assert!(definition.contains("gradle_task: assembleRelease"));
    assert!(definition.contains("GRADLE_BUILD_FILE_PATH: build.gradle"));
}

#[test]
fn test_ios_and_fastlane_detected_together() {
    let repo = ios_repo();
    write_file(repo.path(), "fastlane/Fastfile", FASTFILE);

    let result = scan(repo.path());
    assert_eq!(result.platforms(), vec![PlatformId::Ios, PlatformId::Fastlane]);

    let ios_configs = result.configs_for(PlatformId::Ios).unwrap();
    let definition = ios_configs.get("ios-test-config").unwrap();
    assert!(step_ids(definition, "primary").contains(&"xcode-test".to_string()));
    assert!(step_ids(definition, "deploy").contains(&"xcode-archive".to_string()));
    assert!(!definition.contains(&steps::RECREATE_USER_SCHEMES.reference()));
}

#[test]
fn test_excluded_directories_are_ignored() {
    let repo = TempDir::new().unwrap();
    write_file(repo.path(), "node_modules/some-lib/fastlane/Fastfile", FASTFILE);
    write_file(repo.path(), "Pods/Pods.xcodeproj/project.pbxproj", "");

    let result = scan(repo.path());
    assert_eq!(result.errors, vec![NO_PLATFORM_DETECTED]);
}

fn nested_fastlane_repo() -> TempDir {
    let dir = TempDir::new().unwrap();
    write_file(dir.path(), "fastlane/Fastfile", FASTFILE);
    write_file(dir.path(), "mobile/fastlane/Fastfile", "lane :beta do\nend\n");
    write_file(dir.path(), "empty/Fastfile", "");
    dir
}

fn mixed_repo() -> TempDir {
    let dir = android_repo();
    write_file(dir.path(), "ios/App.xcodeproj/project.pbxproj", "");
    write_file(dir.path(), "fastlane/Fastfile", FASTFILE);
    dir
}

#[parameterized(
    fastlane = { fastlane_repo },
    nested_fastlane = { nested_fastlane_repo },
    android = { android_repo },
    ios = { ios_repo },
    mixed = { mixed_repo },
)]
fn test_every_option_path_has_a_config(make_repo: fn() -> TempDir) {
    let repo = make_repo();
    let result = scan(repo.path());
    assert!(!result.platforms().is_empty());

    for platform in result.platforms() {
        let tree = result.options_for(platform).unwrap();
        let configs = result.configs_for(platform).unwrap();
        for path in tree.paths() {
            assert!(
                configs.contains_key(path.config.as_str()),
                "{} path {:?} has no config",
                platform,
                path.bindings
            );
        }
    }
}
