//! Output formatting for scan results
//!
//! ```
//! use ciscan::output::{OutputFormat, OutputFormatter};
//! use ciscan::scan::{ScanResult, NO_PLATFORM_DETECTED};
//!
//! let result = ScanResult::failed(NO_PLATFORM_DETECTED);
//! let yaml = OutputFormatter::new(OutputFormat::Yaml).format(&result).unwrap();
//! assert!(yaml.contains("No known platform detected"));
//! ```

use crate::scan::ScanResult;
use anyhow::{Context, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Json,
    Yaml,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Yaml => "yml",
        }
    }
}

pub struct OutputFormatter {
    format: OutputFormat,
}

impl OutputFormatter {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    pub fn format(&self, result: &ScanResult) -> Result<String> {
        match self.format {
            OutputFormat::Json => serde_json::to_string_pretty(result)
                .context("Failed to serialize scan result to JSON"),
            OutputFormat::Yaml => {
                serde_yaml::to_string(result).context("Failed to serialize scan result to YAML")
            }
        }
    }

    /// `<stem>.<extension>` for this format
    pub fn file_name(&self, stem: &str) -> String {
        format!("{}.{}", stem, self.format.extension())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::OptionNode;
    use crate::scanners::PlatformId;

    fn result() -> ScanResult {
        let mut tree = OptionNode::branch("Working directory", "FASTLANE_WORK_DIR");
        tree.insert_value(".", OptionNode::leaf("fastlane-config"));

        let mut result = ScanResult::default();
        result.options.insert(PlatformId::Fastlane, tree);
        result.warnings.insert(PlatformId::Fastlane, Vec::new());
        result
    }

    #[test]
    fn test_yaml_format() {
        let yaml = OutputFormatter::new(OutputFormat::Yaml)
            .format(&result())
            .unwrap();
        let value: serde_yaml::Value = serde_yaml::from_str(&yaml).unwrap();

        assert_eq!(value["options"]["fastlane"]["env_key"], "FASTLANE_WORK_DIR");
        assert!(value["warnings"]["fastlane"].as_sequence().unwrap().is_empty());
        assert!(value.get("configs").is_none());
        assert!(value.get("errors").is_none());
    }

    #[test]
    fn test_json_format() {
        let json = OutputFormatter::new(OutputFormat::Json)
            .format(&result())
            .unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(
            value["options"]["fastlane"]["value_map"]["."]["config"],
            "fastlane-config"
        );
    }

    #[test]
    fn test_file_name() {
        assert_eq!(OutputFormatter::new(OutputFormat::Yaml).file_name("result"), "result.yml");
        assert_eq!(OutputFormatter::new(OutputFormat::Json).file_name("scan"), "scan.json");
    }
}
