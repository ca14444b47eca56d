//! fastlane detector
//!
//! Looks for `Fastfile`s, reads their lanes and offers one path per
//! (work dir, lane) pair.

use super::files::{filter_by_file_name, parent_dir, path_str, sort_by_components};
use super::{Detector, DetectorContext, DetectorOptions, PlatformId};
use crate::options::{OptionNode, OptionTreeBuilder, OrderedMap};
use crate::pipeline::{steps, ConfigMap, EnvItem, PRIMARY_WORKFLOW};
use anyhow::{Context, Result};
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing::{debug, info, warn};

const FASTFILE_NAME: &str = "Fastfile";

const LANE_INPUT: &str = "lane";
const LANE_TITLE: &str = "Fastlane lane";
pub const LANE_ENV_KEY: &str = "FASTLANE_LANE";

const WORK_DIR_INPUT: &str = "work_dir";
const WORK_DIR_TITLE: &str = "Working directory";
pub const WORK_DIR_ENV_KEY: &str = "FASTLANE_WORK_DIR";

pub const CONFIG_NAME: &str = "fastlane-config";
pub const DEFAULT_CONFIG_NAME: &str = "default-fastlane-config";

const PROJECT_TYPE: &str = "other";

/// Lane names declared in a Fastfile, in declaration order
pub fn inspect_fastfile_content(content: &str) -> Vec<String> {
    // lane :test_and_snapshot do
    static LANE_REGEX: OnceLock<Regex> = OnceLock::new();
    let lane_re =
        LANE_REGEX.get_or_init(|| Regex::new(r"^ *lane :(.+) do").expect("Invalid lane regex"));

    content
        .lines()
        .filter_map(|line| lane_re.captures(line))
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Directory fastlane should run in.
///
/// For `app/fastlane/Fastfile` this is `app`; a Fastfile outside of a
/// `fastlane` directory runs in its own directory.
pub fn fastlane_work_dir(fastfile: &Path) -> PathBuf {
    let dir = parent_dir(fastfile);
    if dir.file_name().and_then(|n| n.to_str()) == Some("fastlane") {
        parent_dir(&dir)
    } else {
        dir
    }
}

pub struct FastlaneDetector {
    ctx: DetectorContext,
    search_dir: PathBuf,
    fastfiles: Vec<PathBuf>,
}

impl FastlaneDetector {
    pub fn new(ctx: DetectorContext) -> Self {
        Self {
            ctx,
            search_dir: PathBuf::new(),
            fastfiles: Vec::new(),
        }
    }

    pub fn fastfiles(&self) -> &[PathBuf] {
        &self.fastfiles
    }

    fn tree_builder() -> OptionTreeBuilder {
        OptionTreeBuilder::new()
            .level(WORK_DIR_TITLE, WORK_DIR_ENV_KEY)
            .level(LANE_TITLE, LANE_ENV_KEY)
    }

    fn render(&self, config_name: &str) -> Result<ConfigMap> {
        let assembler = &self.ctx.assembler;
        let platform_steps = vec![steps::FASTLANE.with_inputs(vec![
            EnvItem::env_ref(LANE_INPUT, LANE_ENV_KEY),
            EnvItem::env_ref(WORK_DIR_INPUT, WORK_DIR_ENV_KEY),
        ])];

        let definition = assembler.definition(
            PROJECT_TYPE,
            vec![(PRIMARY_WORKFLOW, assembler.workflow(platform_steps))],
        );

        let mut configs = ConfigMap::new();
        assembler.add_config(&mut configs, config_name, &definition)?;
        Ok(configs)
    }
}

impl Detector for FastlaneDetector {
    fn platform(&self) -> PlatformId {
        PlatformId::Fastlane
    }

    fn configure(&mut self, search_dir: &Path) {
        self.search_dir = search_dir.to_path_buf();
        self.fastfiles.clear();
    }

    fn detect_platform(&mut self) -> Result<bool> {
        let files = self.ctx.list_files(&self.search_dir)?;

        info!("Searching for Fastfiles");
        let mut fastfiles = filter_by_file_name(&files, &[FASTFILE_NAME]);
        sort_by_components(&mut fastfiles);

        debug!(count = fastfiles.len(), files = ?fastfiles, "Fastfiles found");
        self.fastfiles = fastfiles;

        if self.fastfiles.is_empty() {
            debug!("platform not detected");
            return Ok(false);
        }

        info!(platform = self.name(), "platform detected");
        Ok(true)
    }

    fn options(&mut self) -> Result<DetectorOptions> {
        let mut warnings = Vec::new();
        // Fastfiles sharing a work dir replace each other's lanes, deepest last
        let mut lanes_by_work_dir: OrderedMap<String, Vec<String>> = OrderedMap::new();

        for fastfile in &self.fastfiles {
            let fastfile_path = path_str(fastfile);
            info!(fastfile = %fastfile_path, "Inspecting Fastfile");

            let content = self
                .ctx
                .read(&self.search_dir, fastfile)
                .with_context(|| format!("Failed to read Fastfile {}", fastfile_path))?;
            let lanes = inspect_fastfile_content(&content);

            if lanes.is_empty() {
                warn!(fastfile = %fastfile_path, "No lanes found");
                warnings.push(format!("no lanes found for Fastfile: {}", fastfile_path));
                continue;
            }

            let work_dir = path_str(&fastlane_work_dir(fastfile));
            info!(lanes = ?lanes, work_dir = %work_dir, "Found lanes");

            if lanes_by_work_dir.insert(work_dir.clone(), lanes).is_some() {
                debug!(
                    work_dir = %work_dir,
                    fastfile = %fastfile_path,
                    "Fastfile replaces lanes of an earlier one"
                );
            }
        }

        let mut builder = Self::tree_builder();
        for (work_dir, lanes) in lanes_by_work_dir.iter() {
            for lane in lanes {
                builder.add_path(&[work_dir.as_str(), lane.as_str()], CONFIG_NAME)?;
            }
        }

        Ok(DetectorOptions {
            tree: builder.build()?,
            warnings,
            ..Default::default()
        })
    }

    fn default_options(&self) -> OptionNode {
        OptionNode::any_value_chain(
            &[(WORK_DIR_TITLE, WORK_DIR_ENV_KEY), (LANE_TITLE, LANE_ENV_KEY)],
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
