//! Android (Gradle) detector

use super::files::{depth, filter_by_file_name, parent_dir, path_str};
use super::{Detector, DetectorContext, DetectorOptions, PlatformId};
use crate::options::{OptionNode, OptionTreeBuilder};
use crate::pipeline::{steps, ConfigMap, EnvItem, StepListItem, DEPLOY_WORKFLOW, PRIMARY_WORKFLOW};
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

const BUILD_GRADLE_NAMES: &[&str] = &["build.gradle", "build.gradle.kts"];
const GRADLEW_NAME: &str = "gradlew";
const ANDROID_PLUGIN_MARKER: &str = "com.android";

const GRADLE_FILE_INPUT: &str = "gradle_file";
const GRADLE_FILE_TITLE: &str = "Path to the gradle file to use";
pub const GRADLE_FILE_ENV_KEY: &str = "GRADLE_BUILD_FILE_PATH";

const GRADLEW_INPUT: &str = "gradlew_path";
const GRADLEW_TITLE: &str = "Gradlew file path";
pub const GRADLEW_ENV_KEY: &str = "GRADLEW_PATH";

const GRADLE_TASK_INPUT: &str = "gradle_task";
const PRIMARY_GRADLE_TASK: &str = "assembleDebug";
const DEPLOY_GRADLE_TASK: &str = "assembleRelease";

const SCRIPT_TITLE: &str = "Do anything with Script step";

pub const CONFIG_NAME: &str = "android-config";
pub const DEFAULT_CONFIG_NAME: &str = "default-android-config";

const PROJECT_TYPE: &str = "android";

fn missing_gradlew_warning(gradle_file: &str) -> String {
    format!(
        "No Gradle Wrapper (gradlew) found next to {}. Using a Gradle Wrapper (gradlew) is required, \
         as the wrapper is what makes sure that the right Gradle version is installed and used for \
         the build. More info: https://docs.gradle.org/current/userguide/gradle_wrapper.html",
        gradle_file
    )
}

fn non_executable_gradlew_warning(gradlew: &str) -> String {
    format!(
        "Gradle Wrapper {} is not executable. Run `chmod +x {}` and commit the change.",
        gradlew, gradlew
    )
}

/// Option value for the wrapper next to a gradle file in `dir`
fn gradlew_value(dir: &Path) -> String {
    if dir.as_os_str().is_empty() {
        format!("./{}", GRADLEW_NAME)
    } else {
        format!("{}/{}", path_str(dir), GRADLEW_NAME)
    }
}

pub struct AndroidDetector {
    ctx: DetectorContext,
    search_dir: PathBuf,
    files: Vec<PathBuf>,
    root_gradle_files: Vec<PathBuf>,
}

impl AndroidDetector {
    pub fn new(ctx: DetectorContext) -> Self {
        Self {
            ctx,
            search_dir: PathBuf::new(),
            files: Vec::new(),
            root_gradle_files: Vec::new(),
        }
    }

    pub fn root_gradle_files(&self) -> &[PathBuf] {
        &self.root_gradle_files
    }

    fn tree_builder() -> OptionTreeBuilder {
        OptionTreeBuilder::new()
            .level(GRADLE_FILE_TITLE, GRADLE_FILE_ENV_KEY)
            .level(GRADLEW_TITLE, GRADLEW_ENV_KEY)
    }

    fn platform_steps(gradle_task: &str) -> Vec<StepListItem> {
        vec![
            steps::script(SCRIPT_TITLE),
            steps::INSTALL_MISSING_ANDROID_TOOLS.bare(),
            steps::GRADLE_RUNNER.with_inputs(vec![
                EnvItem::env_ref(GRADLE_FILE_INPUT, GRADLE_FILE_ENV_KEY),
                EnvItem::new(GRADLE_TASK_INPUT, gradle_task),
                EnvItem::env_ref(GRADLEW_INPUT, GRADLEW_ENV_KEY),
            ]),
        ]
    }

    fn render(&self, config_name: &str) -> Result<ConfigMap> {
        let assembler = &self.ctx.assembler;
        let definition = assembler.definition(
            PROJECT_TYPE,
            vec![
                (
                    PRIMARY_WORKFLOW,
                    assembler.workflow(Self::platform_steps(PRIMARY_GRADLE_TASK)),
                ),
                (
                    DEPLOY_WORKFLOW,
                    assembler.workflow(Self::platform_steps(DEPLOY_GRADLE_TASK)),
                ),
            ],
        );

        let mut configs = ConfigMap::new();
        assembler.add_config(&mut configs, config_name, &definition)?;
        Ok(configs)
    }

    fn mentions_android_plugin(&self, gradle_file: &Path) -> Result<bool> {
        let content = self
            .ctx
            .read(&self.search_dir, gradle_file)
            .with_context(|| format!("Failed to read {}", path_str(gradle_file)))?;
        Ok(content.contains(ANDROID_PLUGIN_MARKER))
    }
}

impl Detector for AndroidDetector {
    fn platform(&self) -> PlatformId {
        PlatformId::Android
    }

    fn configure(&mut self, search_dir: &Path) {
        self.search_dir = search_dir.to_path_buf();
        self.files.clear();
        self.root_gradle_files.clear();
    }

    fn detect_platform(&mut self) -> Result<bool> {
        self.files = self.ctx.list_files(&self.search_dir)?;

        info!("Searching for build.gradle files");
        let gradle_files = filter_by_file_name(&self.files, BUILD_GRADLE_NAMES);
        debug!(count = gradle_files.len(), files = ?gradle_files, "Gradle files found");

        let mut android = false;
        for gradle_file in &gradle_files {
            if self.mentions_android_plugin(gradle_file)? {
                android = true;
                break;
            }
        }

        if !android {
            debug!("platform not detected");
            return Ok(false);
        }

        let min_depth = gradle_files.iter().map(|f| depth(f)).min().unwrap_or(0);
        self.root_gradle_files = gradle_files
            .into_iter()
            .filter(|f| depth(f) == min_depth)
            .collect();

        info!(
            platform = self.name(),
            root_gradle_files = ?self.root_gradle_files,
            "platform detected"
        );
        Ok(true)
    }

    fn options(&mut self) -> Result<DetectorOptions> {
        let mut builder = Self::tree_builder();
        let mut warnings = Vec::new();

        for gradle_file in &self.root_gradle_files {
            let gradle_display = path_str(gradle_file);
            let dir = parent_dir(gradle_file);
            let gradlew = dir.join(GRADLEW_NAME);
            info!(gradle_file = %gradle_display, "Inspecting gradle file");

            if !self.files.contains(&gradlew) {
                warn!(gradle_file = %gradle_display, "No gradlew found");
                warnings.push(missing_gradlew_warning(&gradle_display));
                continue;
            }

            let gradlew_option = gradlew_value(&dir);
            if !self.ctx.is_executable(&self.search_dir, &gradlew)? {
                warn!(gradlew = %gradlew_option, "gradlew is not executable");
                warnings.push(non_executable_gradlew_warning(&gradlew_option));
            }

            builder.add_path(&[gradle_display.as_str(), gradlew_option.as_str()], CONFIG_NAME)?;
        }

        let tree = builder.build()?;
        if tree.is_none() {
            info!(platform = self.name(), "No buildable gradle project, platform rejected");
        }
        Ok(DetectorOptions {
            rejected: tree.is_none(),
            tree,
            warnings,
        })
    }

    fn default_options(&self) -> OptionNode {
        OptionNode::any_value_chain(
            &[
                (GRADLE_FILE_TITLE, GRADLE_FILE_ENV_KEY),
                (GRADLEW_TITLE, GRADLEW_ENV_KEY),
            ],
            DEFAULT_CONFIG_NAME,
        )
    }

    fn configs(&self) -> Result<ConfigMap> {
        self.render(CONFIG_NAME)
    }

    fn default_configs(&self) -> Result<ConfigMap> {
        self.render(DEFAULT_CONFIG_NAME)
    }
}
