use super::ScanError;
use crate::options::{OptionNode, OrderedMap, Resolution};
use crate::pipeline::{inject_app_envs, ConfigMap};
use crate::scanners::PlatformId;
use serde::ser::{Serialize, SerializeMap, Serializer};

/// The single error reported when no detector recognised the checkout
pub const NO_PLATFORM_DETECTED: &str = "No known platform detected";

/// Key of the ungrouped error list in the serialised result
const GENERAL_ERRORS_KEY: &str = "general";

/// Aggregated findings of all detectors, keyed by platform in registration order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScanResult {
    pub options: OrderedMap<PlatformId, OptionNode>,
    pub configs: OrderedMap<PlatformId, ConfigMap>,
    /// Present, possibly empty, for every detected platform. Rejected
    /// platforms appear here only, and only when they left a warning.
    pub warnings: OrderedMap<PlatformId, Vec<String>>,
    pub errors: Vec<String>,
}

impl ScanResult {
    /// Result whose only content is a fatal error
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            errors: vec![error.into()],
            ..Self::default()
        }
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Detected platforms in registration order
    pub fn platforms(&self) -> Vec<PlatformId> {
        self.options.keys().copied().collect()
    }

    pub fn options_for(&self, platform: PlatformId) -> Option<&OptionNode> {
        self.options.get(&platform)
    }

    pub fn configs_for(&self, platform: PlatformId) -> Option<&ConfigMap> {
        self.configs.get(&platform)
    }

    pub fn warnings_for(&self, platform: PlatformId) -> &[String] {
        self.warnings
            .get(&platform)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Standalone pipeline definition for a resolved path of `platform`'s tree,
    /// with the path's bindings exposed as `app.envs`
    pub fn pipeline_for(
        &self,
        platform: PlatformId,
        resolution: &Resolution,
    ) -> Result<String, ScanError> {
        let definition = self
            .configs_for(platform)
            .and_then(|configs| configs.get(resolution.config.as_str()))
            .ok_or_else(|| ScanError::ConfigPairing {
                platform,
                config: resolution.config.clone(),
            })?;

        Ok(inject_app_envs(definition, &resolution.bindings)?)
    }
}

struct GeneralErrors<'a>(&'a [String]);

impl Serialize for GeneralErrors<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry(GENERAL_ERRORS_KEY, self.0)?;
        map.end()
    }
}

impl Serialize for ScanResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        if !self.options.is_empty() {
            map.serialize_entry("options", &self.options)?;
        }
        if !self.configs.is_empty() {
            map.serialize_entry("configs", &self.configs)?;
        }
        if !self.warnings.is_empty() {
            map.serialize_entry("warnings", &self.warnings)?;
        }
        if !self.errors.is_empty() {
            map.serialize_entry("errors", &GeneralErrors(&self.errors))?;
        }
        map.end()
    }
}
