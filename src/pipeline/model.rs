//! Pipeline definition document
//!
//! Mirrors the CI configuration format: a versioned document with a trigger map
//! and named workflows, each an ordered list of version-pinned steps.

use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;
use std::collections::BTreeMap;

pub const FORMAT_VERSION: &str = "1.3.1";
pub const DEFAULT_STEP_LIB_SOURCE: &str = "https://github.com/bitrise-io/bitrise-steplib.git";

pub const PRIMARY_WORKFLOW: &str = "primary";
pub const DEPLOY_WORKFLOW: &str = "deploy";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PipelineDefinition {
    pub format_version: String,
    pub default_step_lib_source: String,
    pub project_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub app: Option<AppEnvs>,
    pub trigger_map: Vec<TriggerItem>,
    pub workflows: BTreeMap<String, Workflow>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AppEnvs {
    pub envs: Vec<EnvItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TriggerItem {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub push_branch: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pull_request_source_branch: Option<String>,
    pub workflow: String,
}

impl TriggerItem {
    pub fn push(pattern: &str, workflow: &str) -> Self {
        Self {
            push_branch: Some(pattern.to_string()),
            pull_request_source_branch: None,
            workflow: workflow.to_string(),
        }
    }

    pub fn pull_request(pattern: &str, workflow: &str) -> Self {
        Self {
            push_branch: None,
            pull_request_source_branch: Some(pattern.to_string()),
            workflow: workflow.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Workflow {
    pub steps: Vec<StepListItem>,
}

impl Workflow {
    /// Step references (`id@version`) in execution order
    pub fn step_refs(&self) -> Vec<&str> {
        self.steps.iter().map(|s| s.reference.as_str()).collect()
    }
}

/// A step reference (`id@version`) with its configuration.
///
/// Serializes as a single-key map, `{ "git-clone@4.0.0": { ... } }`.
#[derive(Debug, Clone, PartialEq)]
pub struct StepListItem {
    pub reference: String,
    pub step: Step,
}

impl Serialize for StepListItem {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry(&self.reference, &self.step)?;
        map.end()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Step {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Template evaluated by the CI runner, not at generation time
    #[serde(skip_serializing_if = "Option::is_none")]
    pub run_if: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub inputs: Vec<EnvItem>,
}

/// A single `key: value` environment item
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvItem {
    pub key: String,
    pub value: String,
}

impl EnvItem {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }

    /// Input bound to an environment variable through `$ENV_KEY` indirection
    pub fn env_ref(key: impl Into<String>, env_key: &str) -> Self {
        Self::new(key, format!("${}", env_key))
    }
}

impl Serialize for EnvItem {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry(&self.key, &self.value)?;
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_list_item_shape() {
        let item = StepListItem {
            reference: "gradle-runner@1.5.2".to_string(),
            step: Step {
                inputs: vec![
                    EnvItem::env_ref("gradle_file", "GRADLE_BUILD_FILE_PATH"),
                    EnvItem::new("gradle_task", "assembleDebug"),
                ],
                ..Default::default()
            },
        };

        let value = serde_yaml::to_value(&item).unwrap();
        let inputs = &value["gradle-runner@1.5.2"]["inputs"];
        assert_eq!(inputs[0]["gradle_file"], "$GRADLE_BUILD_FILE_PATH");
        assert_eq!(inputs[1]["gradle_task"], "assembleDebug");
    }

    #[test]
    fn test_empty_step_serializes_as_empty_map() {
        let item = StepListItem {
            reference: "git-clone@4.0.0".to_string(),
            step: Step::default(),
        };
        let yaml = serde_yaml::to_string(&item).unwrap();
        assert_eq!(yaml.trim(), "git-clone@4.0.0: {}");
    }

    #[test]
    fn test_trigger_items_skip_unset_fields() {
        let value = serde_yaml::to_value(TriggerItem::push("*", PRIMARY_WORKFLOW)).unwrap();
        let map = value.as_mapping().unwrap();
        assert_eq!(map.len(), 2);
        assert_eq!(value["push_branch"], "*");
        assert_eq!(value["workflow"], "primary");
    }
}
