//! Pipeline definitions: model, step registry and assembly

pub mod assembler;
pub mod model;
pub mod steps;

pub use assembler::{inject_app_envs, ConfigMap, PipelineAssembler, PipelineError};
pub use model::{
    EnvItem, PipelineDefinition, Step, StepListItem, TriggerItem, Workflow,
    DEFAULT_STEP_LIB_SOURCE, DEPLOY_WORKFLOW, FORMAT_VERSION, PRIMARY_WORKFLOW,
};
