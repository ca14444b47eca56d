//! Platform detectors
//!
//! Every supported platform implements [`Detector`]. The scan orchestrator drives
//! detectors in registration order, see [`DetectorRegistry::with_defaults`] for
//! the priority list.
//!
//! The calling contract is: `configure`, then `detect_platform`, then `options`,
//! then `configs`. `options` records what it discovered so that `configs` can
//! produce exactly one pipeline definition per configuration name reachable in
//! the tree.

#[macro_use]
pub mod id_enum_macro;

pub mod android;
pub mod fastlane;
pub mod files;
pub mod ios;
pub mod platform_id;
pub mod registry;

pub use android::AndroidDetector;
pub use fastlane::FastlaneDetector;
pub use ios::IosDetector;
pub use platform_id::PlatformId;
pub use registry::DetectorRegistry;

use crate::fs::FileSystem;
use crate::options::OptionNode;
use crate::pipeline::{ConfigMap, PipelineAssembler};
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Options discovered by one detector
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DetectorOptions {
    /// `None` when the platform was detected but nothing usable was found
    pub tree: Option<OptionNode>,
    pub warnings: Vec<String>,
    /// Marker files exist but no candidate can be built. The platform then
    /// counts as not detected and only its warnings are reported.
    pub rejected: bool,
}

/// Capability set every platform detector provides
pub trait Detector: Send {
    fn platform(&self) -> PlatformId;

    fn name(&self) -> &'static str {
        self.platform().name()
    }

    /// Points the detector at a checkout and clears cached candidates
    fn configure(&mut self, search_dir: &Path);

    /// Searches the checkout and caches candidate files
    fn detect_platform(&mut self) -> Result<bool>;

    /// Builds the option tree from cached candidates
    fn options(&mut self) -> Result<DetectorOptions>;

    /// Single-path tree used when detection found nothing usable
    fn default_options(&self) -> OptionNode;

    /// One pipeline definition per configuration reachable in `options()`
    fn configs(&self) -> Result<ConfigMap>;

    /// Definitions matching `default_options()`
    fn default_configs(&self) -> Result<ConfigMap>;
}

/// Collaborators shared by all detectors of one scan
#[derive(Clone)]
pub struct DetectorContext {
    pub fs: Arc<dyn FileSystem>,
    pub max_depth: usize,
    pub assembler: PipelineAssembler,
}

impl DetectorContext {
    pub fn new(fs: Arc<dyn FileSystem>, max_depth: usize, assembler: PipelineAssembler) -> Self {
        Self {
            fs,
            max_depth,
            assembler,
        }
    }

    /// Root-relative file list of `search_dir`
    pub fn list_files(&self, search_dir: &Path) -> Result<Vec<PathBuf>> {
        self.fs
            .list_files(search_dir, self.max_depth)
            .with_context(|| format!("Failed to search for files in {}", search_dir.display()))
    }

    pub fn read(&self, search_dir: &Path, relative: &Path) -> Result<String> {
        self.fs.read_to_string(&search_dir.join(relative))
    }

    pub fn is_executable(&self, search_dir: &Path, relative: &Path) -> Result<bool> {
        self.fs.is_executable(&search_dir.join(relative))
    }
}

impl std::fmt::Debug for DetectorContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DetectorContext")
            .field("max_depth", &self.max_depth)
            .field("assembler", &self.assembler)
            .finish()
    }
}
