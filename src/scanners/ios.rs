//! iOS (Xcode) detector
//!
//! Candidates are standalone `.xcworkspace` bundles and `.xcodeproj` bundles
//! that no workspace references. Every candidate offers its shared schemes;
//! a candidate without shared schemes falls back to the native targets of its
//! `project.pbxproj`, in which case the generated pipelines recreate the user
//! schemes before building.

use super::files::{depth, is_excluded, parent_dir, path_str, sort_by_components};
use super::{Detector, DetectorContext, DetectorOptions, PlatformId};
use crate::options::{OptionNode, OptionTreeBuilder};
use crate::pipeline::{
    steps, ConfigMap, EnvItem, StepListItem, DEPLOY_WORKFLOW, PRIMARY_WORKFLOW,
};
use anyhow::{Context, Result};
use regex::Regex;
use roxmltree::{Document, Node};
use std::collections::HashSet;
use std::path::{Component, Path, PathBuf};
use std::sync::OnceLock;
use tracing::{debug, info, warn};

const XCODEPROJ_EXT: &str = ".xcodeproj";
const XCWORKSPACE_EXT: &str = ".xcworkspace";
const XCSCHEME_EXT: &str = "xcscheme";
const SHARED_SCHEMES_DIR: &str = "xcshareddata/xcschemes";
const PBXPROJ_NAME: &str = "project.pbxproj";
const WORKSPACE_DATA_NAME: &str = "contents.xcworkspacedata";

const PROJECT_PATH_INPUT: &str = "project_path";
const PROJECT_PATH_TITLE: &str = "Project (or Workspace) path";
pub const PROJECT_PATH_ENV_KEY: &str = "BITRISE_PROJECT_PATH";

const SCHEME_INPUT: &str = "scheme";
const SCHEME_TITLE: &str = "Scheme name";
pub const SCHEME_ENV_KEY: &str = "BITRISE_SCHEME";

pub const CONFIG_NAME: &str = "ios-config";
pub const TEST_CONFIG_NAME: &str = "ios-test-config";
pub const MISSING_SCHEMES_CONFIG_NAME: &str = "ios-missing-shared-schemes-config";
pub const MISSING_SCHEMES_TEST_CONFIG_NAME: &str = "ios-missing-shared-schemes-test-config";
pub const DEFAULT_CONFIG_NAME: &str = "default-ios-config";

const PROJECT_TYPE: &str = "ios";

const TEST_PRODUCT_TYPES: &[&str] = &[
    "com.apple.product-type.bundle.unit-test",
    "com.apple.product-type.bundle.ui-testing",
];

fn missing_schemes_warning(project: &str) -> String {
    format!(
        "No shared schemes found for project: {}. Automatically generated schemes may differ \
         from the ones in your project. Make sure to share your schemes to get the expected \
         behaviour.",
        project
    )
}

fn no_schemes_or_targets_warning(project: &str) -> String {
    format!("No shared schemes or native targets found for project: {}", project)
}

/// Pipeline variant a scheme resolves to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConfigVariant {
    pub has_tests: bool,
    pub missing_shared_schemes: bool,
}

impl ConfigVariant {
    pub fn config_name(&self) -> &'static str {
        match (self.missing_shared_schemes, self.has_tests) {
            (false, false) => CONFIG_NAME,
            (false, true) => TEST_CONFIG_NAME,
            (true, false) => MISSING_SCHEMES_CONFIG_NAME,
            (true, true) => MISSING_SCHEMES_TEST_CONFIG_NAME,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scheme {
    pub name: String,
    pub has_tests: bool,
}

/// Collapses schemes sharing a name into one, first position kept.
///
/// A scheme shared by both a workspace and one of its projects is offered once
/// and has tests when either copy does.
pub fn merge_schemes(schemes: Vec<Scheme>) -> Vec<Scheme> {
    let mut merged: Vec<Scheme> = Vec::with_capacity(schemes.len());
    for scheme in schemes {
        match merged.iter_mut().find(|s| s.name == scheme.name) {
            Some(existing) => existing.has_tests |= scheme.has_tests,
            None => merged.push(scheme),
        }
    }
    merged
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NativeTarget {
    pub name: String,
    pub product_type: String,
}

impl NativeTarget {
    pub fn is_test(&self) -> bool {
        TEST_PRODUCT_TYPES.contains(&self.product_type.as_str())
    }
}

/// True when the scheme's TestAction runs at least one testable
pub fn scheme_has_tests(content: &str) -> Result<bool, roxmltree::Error> {
    let doc = Document::parse(content)?;
    Ok(doc
        .descendants()
        .filter(|node| node.has_tag_name("TestAction"))
        .flat_map(|action| action.descendants())
        .filter(|node| node.has_tag_name("TestableReference"))
        .any(|reference| reference.attribute("skipped") != Some("YES")))
}

/// Native targets declared in a `project.pbxproj`
pub fn parse_native_targets(pbxproj: &str) -> Vec<NativeTarget> {
    static NAME_REGEX: OnceLock<Regex> = OnceLock::new();
    static PRODUCT_TYPE_REGEX: OnceLock<Regex> = OnceLock::new();
    let name_re = NAME_REGEX
        .get_or_init(|| Regex::new(r#"^\s*name = "?([^";]+)"?;"#).expect("Invalid name regex"));
    let product_type_re = PRODUCT_TYPE_REGEX.get_or_init(|| {
        Regex::new(r#"^\s*productType = "?([^";]+)"?;"#).expect("Invalid productType regex")
    });

    let mut targets = Vec::new();
    let mut current: Option<(Option<String>, Option<String>)> = None;

    for line in pbxproj.lines() {
        let trimmed = line.trim();
        if trimmed.contains("isa = PBXNativeTarget;") {
            current = Some((None, None));
            continue;
        }

        let Some((name, product_type)) = current.as_mut() else {
            continue;
        };

        if trimmed == "};" {
            if let Some(name) = name.take() {
                targets.push(NativeTarget {
                    name,
                    product_type: product_type.take().unwrap_or_default(),
                });
            }
            current = None;
        } else if let Some(caps) = name_re.captures(line) {
            if name.is_none() {
                *name = Some(caps[1].to_string());
            }
        } else if let Some(caps) = product_type_re.captures(line) {
            *product_type = Some(caps[1].to_string());
        }
    }

    targets
}

/// Project paths a workspace references, relative to the workspace's directory
pub fn parse_workspace_projects(content: &str) -> Result<Vec<PathBuf>, roxmltree::Error> {
    let doc = Document::parse(content)?;
    let mut projects = Vec::new();
    collect_file_refs(doc.root_element(), &PathBuf::new(), &mut projects);
    Ok(projects)
}

fn collect_file_refs(node: Node, group: &Path, projects: &mut Vec<PathBuf>) {
    for child in node.children().filter(|c| c.is_element()) {
        let location = child.attribute("location").and_then(relative_location);
        if child.has_tag_name("Group") {
            let nested = match location {
                Some(location) => group.join(location),
                None => group.to_path_buf(),
            };
            collect_file_refs(child, &nested, projects);
        } else if child.has_tag_name("FileRef") {
            if let Some(location) = location.filter(|l| l.ends_with(XCODEPROJ_EXT)) {
                projects.push(group.join(location));
            }
        }
    }
}

fn relative_location(location: &str) -> Option<&str> {
    location
        .strip_prefix("group:")
        .or_else(|| location.strip_prefix("container:"))
}

/// Path up to and including the first component ending in `ext`
fn bundle_root(path: &Path, ext: &str) -> Option<PathBuf> {
    let mut root = PathBuf::new();
    for component in path.components() {
        root.push(component);
        if let Component::Normal(name) = component {
            if name.to_str().map(|n| n.ends_with(ext)).unwrap_or(false) {
                return Some(root);
            }
        }
    }
    None
}

/// Lexically resolves `..` so workspace references compare with listed paths
fn normalize(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::ParentDir => {
                normalized.pop();
            }
            Component::CurDir => {}
            other => normalized.push(other),
        }
    }
    normalized
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectCandidate {
    pub path: PathBuf,
    /// Projects whose schemes count for this candidate; the project itself for
    /// a standalone `.xcodeproj`
    pub projects: Vec<PathBuf>,
}

pub struct IosDetector {
    ctx: DetectorContext,
    search_dir: PathBuf,
    files: Vec<PathBuf>,
    candidates: Vec<ProjectCandidate>,
    variants: Vec<ConfigVariant>,
}

impl IosDetector {
    pub fn new(ctx: DetectorContext) -> Self {
        Self {
            ctx,
            search_dir: PathBuf::new(),
            files: Vec::new(),
            candidates: Vec::new(),
            variants: Vec::new(),
        }
    }

    pub fn candidates(&self) -> &[ProjectCandidate] {
        &self.candidates
    }

    fn tree_builder() -> OptionTreeBuilder {
        OptionTreeBuilder::new()
            .level(PROJECT_PATH_TITLE, PROJECT_PATH_ENV_KEY)
            .level(SCHEME_TITLE, SCHEME_ENV_KEY)
    }

    fn bundles(&self, ext: &str) -> Vec<PathBuf> {
        let mut seen = HashSet::new();
        let mut bundles = Vec::new();
        for file in &self.files {
            if let Some(bundle) = bundle_root(file, ext) {
                if seen.insert(bundle.clone()) {
                    bundles.push(bundle);
                }
            }
        }
        bundles
            .into_iter()
            .filter(|b| !is_excluded(b))
            .collect()
    }

    fn find_candidates(&self) -> Result<Vec<ProjectCandidate>> {
        let projects = self.bundles(XCODEPROJ_EXT);
        let workspaces: Vec<PathBuf> = self
            .bundles(XCWORKSPACE_EXT)
            .into_iter()
            .filter(|ws| {
                !parent_dir(ws)
                    .to_str()
                    .map(|p| p.ends_with(XCODEPROJ_EXT))
                    .unwrap_or(false)
            })
            .collect();

        let mut referenced = HashSet::new();
        let mut candidates = Vec::new();

        for workspace in workspaces {
            let data = workspace.join(WORKSPACE_DATA_NAME);
            let members: Vec<PathBuf> = if self.files.contains(&data) {
                let content = self
                    .ctx
                    .read(&self.search_dir, &data)
                    .with_context(|| format!("Failed to read {}", path_str(&data)))?;
                let base = parent_dir(&workspace);
                parse_workspace_projects(&content)
                    .with_context(|| format!("Failed to parse {}", path_str(&data)))?
                    .into_iter()
                    .map(|p| normalize(&base.join(p)))
                    .filter(|p| projects.contains(p))
                    .collect()
            } else {
                Vec::new()
            };

            referenced.extend(members.iter().cloned());
            candidates.push(ProjectCandidate {
                path: workspace,
                projects: members,
            });
        }

        for project in projects {
            if !referenced.contains(&project) {
                candidates.push(ProjectCandidate {
                    path: project.clone(),
                    projects: vec![project],
                });
            }
        }

        let mut paths: Vec<PathBuf> = candidates.iter().map(|c| c.path.clone()).collect();
        sort_by_components(&mut paths);
        let mut sorted = Vec::with_capacity(candidates.len());
        for path in paths {
            if let Some(pos) = candidates.iter().position(|c| c.path == path) {
                sorted.push(candidates.swap_remove(pos));
            }
        }
        Ok(sorted)
    }

    fn shared_schemes(&self, bundle: &Path) -> Result<Vec<Scheme>> {
        let schemes_dir = bundle.join(SHARED_SCHEMES_DIR);
        let mut schemes = Vec::new();

        for file in self.files.iter().filter(|f| parent_dir(f) == schemes_dir) {
            if file.extension().and_then(|e| e.to_str()) != Some(XCSCHEME_EXT) {
                continue;
            }
            let Some(name) = file.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };

            let content = self
                .ctx
                .read(&self.search_dir, file)
                .with_context(|| format!("Failed to read scheme {}", path_str(file)))?;
            let has_tests = scheme_has_tests(&content)
                .with_context(|| format!("Failed to parse scheme {}", path_str(file)))?;

            schemes.push(Scheme {
                name: name.to_string(),
                has_tests,
            });
        }

        Ok(schemes)
    }

    fn target_schemes(&self, project: &Path) -> Result<Vec<Scheme>> {
        let pbxproj = project.join(PBXPROJ_NAME);
        if !self.files.contains(&pbxproj) {
            return Ok(Vec::new());
        }

        let content = self
            .ctx
            .read(&self.search_dir, &pbxproj)
            .with_context(|| format!("Failed to read {}", path_str(&pbxproj)))?;
        let targets = parse_native_targets(&content);
        let has_tests = targets.iter().any(NativeTarget::is_test);

        Ok(targets
            .into_iter()
            .filter(|t| !t.is_test())
            .map(|t| Scheme {
                name: t.name,
                has_tests,
            })
            .collect())
    }

    /// Schemes of a candidate and whether they had to come from targets
    fn candidate_schemes(&self, candidate: &ProjectCandidate) -> Result<(Vec<Scheme>, bool)> {
        let mut schemes = Vec::new();
        if candidate.path.extension().and_then(|e| e.to_str()) == Some("xcworkspace") {
            schemes.extend(self.shared_schemes(&candidate.path)?);
        }
        for project in &candidate.projects {
            schemes.extend(self.shared_schemes(project)?);
        }
        if !schemes.is_empty() {
            return Ok((merge_schemes(schemes), false));
        }

        for project in &candidate.projects {
            schemes.extend(self.target_schemes(project)?);
        }
        Ok((merge_schemes(schemes), true))
    }

    fn platform_steps(variant: ConfigVariant, archive: bool) -> Vec<StepListItem> {
        let project_inputs = || {
            vec![
                EnvItem::env_ref(PROJECT_PATH_INPUT, PROJECT_PATH_ENV_KEY),
                EnvItem::env_ref(SCHEME_INPUT, SCHEME_ENV_KEY),
            ]
        };

        let mut items = vec![steps::CERTIFICATE_AND_PROFILE_INSTALLER.bare()];
        if variant.missing_shared_schemes {
            items.push(steps::RECREATE_USER_SCHEMES.with_inputs(vec![EnvItem::env_ref(
                PROJECT_PATH_INPUT,
                PROJECT_PATH_ENV_KEY,
            )]));
        }
        if variant.has_tests {
            items.push(steps::XCODE_TEST.with_inputs(project_inputs()));
        }
        if archive {
            items.push(steps::XCODE_ARCHIVE.with_inputs(project_inputs()));
        }
        items
    }

    fn render(&self, configs: &mut ConfigMap, name: &str, variant: ConfigVariant) -> Result<()> {
        let assembler = &self.ctx.assembler;
        let definition = assembler.definition(
            PROJECT_TYPE,
            vec![
                (
                    PRIMARY_WORKFLOW,
                    assembler.workflow(Self::platform_steps(variant, false)),
                ),
                (
                    DEPLOY_WORKFLOW,
                    assembler.workflow(Self::platform_steps(variant, true)),
                ),
            ],
        );
        assembler.add_config(configs, name, &definition)?;
        Ok(())
    }
}

impl Detector for IosDetector {
    fn platform(&self) -> PlatformId {
        PlatformId::Ios
    }

    fn configure(&mut self, search_dir: &Path) {
        self.search_dir = search_dir.to_path_buf();
        self.files.clear();
        self.candidates.clear();
        self.variants.clear();
    }

    fn detect_platform(&mut self) -> Result<bool> {
        self.files = self.ctx.list_files(&self.search_dir)?;

        info!("Searching for Xcode projects and workspaces");
        self.candidates = self.find_candidates()?;
        debug!(
            count = self.candidates.len(),
            candidates = ?self.candidates.iter().map(|c| &c.path).collect::<Vec<_>>(),
            "Xcode candidates found"
        );

        if self.candidates.is_empty() {
            debug!("platform not detected");
            return Ok(false);
        }

        info!(platform = self.name(), "platform detected");
        Ok(true)
    }

    fn options(&mut self) -> Result<DetectorOptions> {
        let mut builder = Self::tree_builder();
        let mut warnings = Vec::new();
        let mut variants = Vec::new();

        for candidate in &self.candidates {
            let project = path_str(&candidate.path);
            info!(project = %project, depth = depth(&candidate.path), "Inspecting project");

            let (schemes, missing_shared_schemes) = self.candidate_schemes(candidate)?;
            if schemes.is_empty() {
                warn!(project = %project, "No schemes or targets found");
                warnings.push(no_schemes_or_targets_warning(&project));
                continue;
            }
            if missing_shared_schemes {
                warn!(project = %project, "No shared schemes found, using targets");
                warnings.push(missing_schemes_warning(&project));
            }

            for scheme in schemes {
                let variant = ConfigVariant {
                    has_tests: scheme.has_tests,
                    missing_shared_schemes,
                };
                debug!(scheme = %scheme.name, config = variant.config_name(), "Scheme found");
                builder.add_path(
                    &[project.as_str(), scheme.name.as_str()],
                    variant.config_name(),
                )?;
                if !variants.contains(&variant) {
                    variants.push(variant);
                }
            }
        }

        self.variants = variants;
        Ok(DetectorOptions {
            tree: builder.build()?,
            warnings,
            ..Default::default()
        })
    }

    fn default_options(&self) -> OptionNode {
        OptionNode::any_value_chain(
            &[
                (PROJECT_PATH_TITLE, PROJECT_PATH_ENV_KEY),
                (SCHEME_TITLE, SCHEME_ENV_KEY),
            ],
            DEFAULT_CONFIG_NAME,
        )
    }

    fn configs(&self) -> Result<ConfigMap> {
        let mut configs = ConfigMap::new();
        for variant in &self.variants {
            self.render(&mut configs, variant.config_name(), *variant)?;
        }
        Ok(configs)
    }

    fn default_configs(&self) -> Result<ConfigMap> {
        let mut configs = ConfigMap::new();
        let variant = ConfigVariant {
            has_tests: true,
            missing_shared_schemes: false,
        };
        self.render(&mut configs, DEFAULT_CONFIG_NAME, variant)?;
        Ok(configs)
    }
}
