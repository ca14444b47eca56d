//! Builds pipeline definitions from the shared skeleton
//!
//! Every workflow runs the same frame: key activation, clone and cache restore
//! up front, artifact deployment and cache save at the end. Platform steps go
//! in between and reference resolved choices as `$ENV_KEY`, so one definition
//! serves every path of an option tree.

use super::model::{
    AppEnvs, EnvItem, PipelineDefinition, StepListItem, TriggerItem, Workflow, FORMAT_VERSION,
    PRIMARY_WORKFLOW,
};
use super::steps;
use crate::options::{Binding, OrderedMap};
use serde_yaml::{Mapping, Value};
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::debug;

/// Configuration name to serialized pipeline definition
pub type ConfigMap = OrderedMap<String, String>;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Failed to serialize pipeline definition: {0}")]
    Serialize(#[from] serde_yaml::Error),

    #[error("Pipeline definition for '{0}' has no workflows")]
    NoWorkflows(String),

    #[error("Pipeline definition is not a mapping")]
    NotAMapping,
}

#[derive(Debug, Clone)]
pub struct PipelineAssembler {
    step_lib_source: String,
}

impl Default for PipelineAssembler {
    fn default() -> Self {
        Self::new(super::model::DEFAULT_STEP_LIB_SOURCE)
    }
}

impl PipelineAssembler {
    pub fn new(step_lib_source: impl Into<String>) -> Self {
        Self {
            step_lib_source: step_lib_source.into(),
        }
    }

    pub fn step_lib_source(&self) -> &str {
        &self.step_lib_source
    }

    /// Wraps platform steps into the shared skeleton
    pub fn workflow(&self, platform_steps: Vec<StepListItem>) -> Workflow {
        let mut steps_list = vec![
            steps::activate_ssh_key(),
            steps::GIT_CLONE.bare(),
            steps::CACHE_PULL.bare(),
        ];
        steps_list.extend(platform_steps);
        steps_list.push(steps::DEPLOY_TO_BITRISE_IO.bare());
        steps_list.push(steps::CACHE_PUSH.bare());

        Workflow { steps: steps_list }
    }

    pub fn definition(
        &self,
        project_type: &str,
        workflows: Vec<(&str, Workflow)>,
    ) -> PipelineDefinition {
        PipelineDefinition {
            format_version: FORMAT_VERSION.to_string(),
            default_step_lib_source: self.step_lib_source.clone(),
            project_type: project_type.to_string(),
            app: None,
            trigger_map: vec![
                TriggerItem::push("*", PRIMARY_WORKFLOW),
                TriggerItem::pull_request("*", PRIMARY_WORKFLOW),
            ],
            workflows: workflows
                .into_iter()
                .map(|(name, wf)| (name.to_string(), wf))
                .collect::<BTreeMap<_, _>>(),
        }
    }

    /// Serializes a definition and stores it under `config_name`
    pub fn add_config(
        &self,
        configs: &mut ConfigMap,
        config_name: &str,
        definition: &PipelineDefinition,
    ) -> Result<(), PipelineError> {
        if definition.workflows.is_empty() {
            return Err(PipelineError::NoWorkflows(config_name.to_string()));
        }

        let rendered = quote_format_version(&serde_yaml::to_string(definition)?);
        debug!(
            config = config_name,
            workflows = definition.workflows.len(),
            "Assembled pipeline definition"
        );
        configs.insert(config_name.to_string(), rendered);
        Ok(())
    }
}

/// Injects resolved bindings as `app.envs` into a serialized definition.
///
/// The `app` section lands right before `trigger_map`, matching the field order
/// of [`PipelineDefinition`].
pub fn inject_app_envs(definition: &str, bindings: &[Binding]) -> Result<String, PipelineError> {
    let parsed: Value = serde_yaml::from_str(definition)?;
    let mapping = match parsed {
        Value::Mapping(m) => m,
        _ => return Err(PipelineError::NotAMapping),
    };

    let app = AppEnvs {
        envs: bindings
            .iter()
            .map(|b| EnvItem::new(b.env_key.clone(), b.value.clone()))
            .collect(),
    };
    let app_value = serde_yaml::to_value(&app)?;

    let mut out = Mapping::new();
    let mut inserted = false;
    for (key, value) in mapping {
        if key.as_str() == Some("app") {
            continue;
        }
        if key.as_str() == Some("trigger_map") && !inserted {
            out.insert(Value::from("app"), app_value.clone());
            inserted = true;
        }
        out.insert(key, value);
    }
    if !inserted {
        out.insert(Value::from("app"), app_value);
    }

    Ok(quote_format_version(&serde_yaml::to_string(&Value::Mapping(out))?))
}

/// Pipeline documents carry `format_version` as a quoted string, which
/// serde_yaml only emits for values that would otherwise parse as numbers.
fn quote_format_version(rendered: &str) -> String {
    let mut out = String::with_capacity(rendered.len() + 2);
    for line in rendered.split_inclusive('\n') {
        match line.strip_prefix("format_version: ") {
            Some(version) if !version.starts_with(&['"', '\''][..]) => {
                out.push_str("format_version: \"");
                out.push_str(version.trim_end());
                out.push_str("\"\n");
            }
            _ => out.push_str(line),
        }
    }
    out
}
