use super::result::{ScanResult, NO_PLATFORM_DETECTED};
use super::ScanError;
use crate::config::CiscanConfig;
use crate::fs::FileSystem;
use crate::options::OptionNode;
use crate::pipeline::{ConfigMap, PipelineAssembler};
use crate::scanners::{Detector, DetectorContext, DetectorRegistry, PlatformId};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Outcome of running one detector
#[derive(Debug, Clone, PartialEq)]
pub enum PlatformDetection {
    NotDetected,
    DetectedWithOptions {
        tree: OptionNode,
        warnings: Vec<String>,
    },
    /// The platform is present but no candidate survived inspection
    DetectedNoOptions { warnings: Vec<String> },
    /// Marker files were found but the detector refused every candidate
    Rejected { warnings: Vec<String> },
}

impl PlatformDetection {
    pub fn is_detected(&self) -> bool {
        !matches!(
            self,
            PlatformDetection::NotDetected | PlatformDetection::Rejected { .. }
        )
    }
}

pub struct ScanOrchestrator {
    fs: Arc<dyn FileSystem>,
    registry: DetectorRegistry,
}

impl ScanOrchestrator {
    pub fn new(fs: Arc<dyn FileSystem>, registry: DetectorRegistry) -> Self {
        Self { fs, registry }
    }

    /// Orchestrator with the default detector set
    pub fn with_defaults(fs: Arc<dyn FileSystem>, config: &CiscanConfig) -> Self {
        let ctx = DetectorContext::new(
            fs.clone(),
            config.max_depth,
            PipelineAssembler::new(config.step_lib_source.clone()),
        );
        Self::new(fs, DetectorRegistry::with_defaults(ctx))
    }

    pub fn registry(&self) -> &DetectorRegistry {
        &self.registry
    }

    /// Runs every detector against `root` in registration order.
    ///
    /// Detector failures abort the scan. A checkout no detector recognises is
    /// not an error at this level: the result then carries
    /// [`NO_PLATFORM_DETECTED`] plus the warnings of rejected platforms.
    pub fn run(&mut self, root: &Path) -> Result<ScanResult, ScanError> {
        let start = Instant::now();
        info!(root = %root.display(), "Starting scan");

        if !self.fs.exists(root) {
            return Err(ScanError::PathNotFound(root.to_path_buf()));
        }
        if !self.fs.is_dir(root) {
            return Err(ScanError::NotADirectory(root.to_path_buf()));
        }

        let mut result = ScanResult::default();

        for detector in self.registry.detectors_mut() {
            let detector = detector.as_mut();
            let platform = detector.platform();

            let (tree, configs, warnings) = match detect(detector, root)? {
                PlatformDetection::NotDetected => continue,
                PlatformDetection::Rejected { warnings } => {
                    if !warnings.is_empty() {
                        result.warnings.insert(platform, warnings);
                    }
                    continue;
                }
                PlatformDetection::DetectedWithOptions { tree, warnings } => {
                    let configs = detector
                        .configs()
                        .map_err(|source| ScanError::Detector { platform, source })?;
                    (tree, configs, warnings)
                }
                PlatformDetection::DetectedNoOptions { warnings } => {
                    info!(platform = %platform, "No usable options found, using defaults");
                    let configs = detector
                        .default_configs()
                        .map_err(|source| ScanError::Detector { platform, source })?;
                    (detector.default_options(), configs, warnings)
                }
            };

            check_pairing(platform, &tree, &configs)?;

            result.options.insert(platform, tree);
            result.configs.insert(platform, configs);
            result.warnings.insert(platform, warnings);
        }

        if result.options.is_empty() {
            warn!(root = %root.display(), "{}", NO_PLATFORM_DETECTED);
            return Ok(ScanResult {
                warnings: result.warnings,
                ..ScanResult::failed(NO_PLATFORM_DETECTED)
            });
        }

        info!(
            platforms = ?result.platforms(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Scan complete"
        );
        Ok(result)
    }
}

fn detect(detector: &mut dyn Detector, root: &Path) -> Result<PlatformDetection, ScanError> {
    let platform = detector.platform();
    debug!(platform = %platform, "Running detector");

    detector.configure(root);
    let detected = detector
        .detect_platform()
        .map_err(|source| ScanError::Detector { platform, source })?;
    if !detected {
        return Ok(PlatformDetection::NotDetected);
    }

    let options = detector
        .options()
        .map_err(|source| ScanError::Detector { platform, source })?;
    for warning in &options.warnings {
        warn!(platform = %platform, "{}", warning);
    }

    if options.rejected {
        return Ok(PlatformDetection::Rejected {
            warnings: options.warnings,
        });
    }

    Ok(match options.tree {
        Some(tree) => PlatformDetection::DetectedWithOptions {
            tree,
            warnings: options.warnings,
        },
        None => PlatformDetection::DetectedNoOptions {
            warnings: options.warnings,
        },
    })
}

/// Every configuration a tree leads to must have been generated
fn check_pairing(platform: PlatformId, tree: &OptionNode, configs: &ConfigMap) -> Result<(), ScanError> {
    for config in tree.leaf_configs() {
        if !configs.contains_key(config.as_str()) {
            return Err(ScanError::ConfigPairing { platform, config });
        }
    }
    Ok(())
}
