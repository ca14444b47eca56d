//! Walks an option tree down to a single configuration
//!
//! Two modes are supported. Deterministic resolution always takes the first
//! value of every question and never blocks. Interactive resolution hands every
//! question with more than one value to a [`Prompt`]; single-value questions are
//! answered automatically. There is no backtracking: an answer outside the
//! offered range fails the resolution immediately.

use super::{OptionNode, ANY_VALUE};
use dialoguer::{theme::ColorfulTheme, Input, Select};
use serde::Serialize;
use std::collections::VecDeque;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("Option tree is empty, nothing to resolve")]
    EmptyTree,

    #[error("Answer {answer} is out of range for '{title}' ({options} options)")]
    InvalidAnswer {
        title: String,
        answer: usize,
        options: usize,
    },

    #[error("No answer available for '{0}'")]
    NoAnswer(String),

    #[error("Prompt failed: {0}")]
    Prompt(#[from] dialoguer::Error),

    #[error("Resolution cancelled by user")]
    Cancelled,
}

/// Strategy used to pick one path through a tree
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionMode {
    Deterministic,
    Interactive,
}

/// An environment variable bound by answering a question
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Binding {
    pub env_key: String,
    pub value: String,
}

/// Outcome of a resolution: bindings from root to leaf plus the chosen config
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub bindings: Vec<Binding>,
    pub config: String,
}

/// Source of answers for interactive resolution
pub trait Prompt {
    /// Picks one of `items`, returning its index
    fn select(&mut self, title: &str, items: &[String]) -> Result<usize, ResolveError>;

    /// Asks for a free-form value
    fn input(&mut self, title: &str) -> Result<String, ResolveError>;
}

/// Terminal prompt backed by `dialoguer`
#[derive(Default)]
pub struct DialoguerPrompt {
    theme: ColorfulTheme,
}

impl DialoguerPrompt {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Prompt for DialoguerPrompt {
    fn select(&mut self, title: &str, items: &[String]) -> Result<usize, ResolveError> {
        Select::with_theme(&self.theme)
            .with_prompt(title)
            .items(items)
            .default(0)
            .interact_opt()?
            .ok_or(ResolveError::Cancelled)
    }

    fn input(&mut self, title: &str) -> Result<String, ResolveError> {
        let value: String = Input::with_theme(&self.theme)
            .with_prompt(title)
            .interact_text()?;
        Ok(value)
    }
}

/// Replays a fixed list of answers. Used by tests and non-terminal callers.
#[derive(Debug, Default, Clone)]
pub struct ScriptedPrompt {
    selections: VecDeque<usize>,
    inputs: VecDeque<String>,
    asked: Vec<String>,
}

impl ScriptedPrompt {
    pub fn new(selections: impl IntoIterator<Item = usize>) -> Self {
        Self {
            selections: selections.into_iter().collect(),
            ..Default::default()
        }
    }

    pub fn with_inputs(mut self, inputs: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.inputs = inputs.into_iter().map(Into::into).collect();
        self
    }

    /// Titles of the questions that were actually asked
    pub fn asked(&self) -> &[String] {
        &self.asked
    }
}

impl Prompt for ScriptedPrompt {
    fn select(&mut self, title: &str, _items: &[String]) -> Result<usize, ResolveError> {
        self.asked.push(title.to_string());
        self.selections
            .pop_front()
            .ok_or_else(|| ResolveError::NoAnswer(title.to_string()))
    }

    fn input(&mut self, title: &str) -> Result<String, ResolveError> {
        self.asked.push(title.to_string());
        self.inputs
            .pop_front()
            .ok_or_else(|| ResolveError::NoAnswer(title.to_string()))
    }
}

/// Resolves option trees in one of the two modes
pub enum TreeResolver<'a> {
    Deterministic,
    Interactive(&'a mut dyn Prompt),
}

impl<'a> TreeResolver<'a> {
    pub fn mode(&self) -> ResolutionMode {
        match self {
            TreeResolver::Deterministic => ResolutionMode::Deterministic,
            TreeResolver::Interactive(_) => ResolutionMode::Interactive,
        }
    }

    pub fn resolve(&mut self, root: &OptionNode) -> Result<Resolution, ResolveError> {
        let mut bindings = Vec::new();
        let mut node = root;

        loop {
            let question = match node {
                OptionNode::Leaf { config } => {
                    debug!(config = %config, bindings = bindings.len(), "Resolved option tree");
                    return Ok(Resolution {
                        bindings,
                        config: config.clone(),
                    });
                }
                OptionNode::Branch(q) => q,
            };

            let items: Vec<String> = question.values.keys().cloned().collect();
            let index = self.choose(&question.title, &items)?;
            let (value, child) = question
                .values
                .get_index(index)
                .ok_or_else(|| ResolveError::InvalidAnswer {
                    title: question.title.clone(),
                    answer: index,
                    options: question.values.len(),
                })?;

            let value = if value == ANY_VALUE {
                self.any_value(&question.title)?
            } else {
                value.clone()
            };

            bindings.push(Binding {
                env_key: question.env_key.clone(),
                value,
            });
            node = child;
        }
    }

    fn choose(&mut self, title: &str, items: &[String]) -> Result<usize, ResolveError> {
        if items.is_empty() {
            return Err(ResolveError::EmptyTree);
        }
        match self {
            TreeResolver::Deterministic => Ok(0),
            TreeResolver::Interactive(_) if items.len() == 1 => Ok(0),
            TreeResolver::Interactive(prompt) => {
                let answer = prompt.select(title, items)?;
                if answer >= items.len() {
                    return Err(ResolveError::InvalidAnswer {
                        title: title.to_string(),
                        answer,
                        options: items.len(),
                    });
                }
                Ok(answer)
            }
        }
    }

    fn any_value(&mut self, title: &str) -> Result<String, ResolveError> {
        match self {
            TreeResolver::Deterministic => Ok(ANY_VALUE.to_string()),
            TreeResolver::Interactive(prompt) => prompt.input(title),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::OptionTreeBuilder;

    fn sample_tree() -> OptionNode {
        let mut builder = OptionTreeBuilder::new()
            .level("Path to the gradle file to use", "GRADLE_BUILD_FILE_PATH")
            .level("Gradlew file path", "GRADLEW_PATH");
        builder.add_path(&["build.gradle", "./gradlew"], "android-config").unwrap();
        builder.add_path(&["app/build.gradle", "app/gradlew"], "android-config").unwrap();
        builder.add_path(&["app/build.gradle", "tools/gradlew"], "android-alt-config").unwrap();
        builder.build().unwrap().unwrap()
    }

    fn binding(env_key: &str, value: &str) -> Binding {
        Binding {
            env_key: env_key.to_string(),
            value: value.to_string(),
        }
    }

    #[test]
    fn test_deterministic_picks_first_values() {
        let resolution = TreeResolver::Deterministic.resolve(&sample_tree()).unwrap();

        assert_eq!(
            resolution.bindings,
            vec![
                binding("GRADLE_BUILD_FILE_PATH", "build.gradle"),
                binding("GRADLEW_PATH", "./gradlew"),
            ]
        );
        assert_eq!(resolution.config, "android-config");
    }

    #[test]
    fn test_deterministic_single_path() {
        let mut builder = OptionTreeBuilder::new()
            .level("Working directory", "FASTLANE_WORK_DIR")
            .level("Fastlane lane", "FASTLANE_LANE");
        builder.add_path(&["ios", "test"], "fastlane-config").unwrap();
        let tree = builder.build().unwrap().unwrap();

        let resolution = TreeResolver::Deterministic.resolve(&tree).unwrap();
        assert_eq!(
            resolution.bindings,
            vec![
                binding("FASTLANE_WORK_DIR", "ios"),
                binding("FASTLANE_LANE", "test")
            ]
        );
        assert_eq!(resolution.config, "fastlane-config");
    }

    #[test]
    fn test_empty_question_is_empty_tree() {
        let tree = OptionNode::branch("Nothing", "NOTHING");
        assert!(matches!(
            TreeResolver::Deterministic.resolve(&tree),
            Err(ResolveError::EmptyTree)
        ));
    }

    #[test]
    fn test_leaf_root_resolves_without_bindings() {
        let tree = OptionNode::leaf("only-config");
        let resolution = TreeResolver::Deterministic.resolve(&tree).unwrap();
        assert!(resolution.bindings.is_empty());
        assert_eq!(resolution.config, "only-config");
    }

    #[test]
    fn test_interactive_follows_answers() {
        let mut prompt = ScriptedPrompt::new([1, 1]);
        let resolution = TreeResolver::Interactive(&mut prompt)
            .resolve(&sample_tree())
            .unwrap();

        assert_eq!(
            resolution.bindings,
            vec![
                binding("GRADLE_BUILD_FILE_PATH", "app/build.gradle"),
                binding("GRADLEW_PATH", "tools/gradlew"),
            ]
        );
        assert_eq!(resolution.config, "android-alt-config");
        assert_eq!(prompt.asked().len(), 2);
    }

    #[test]
    fn test_interactive_skips_single_choice_questions() {
        // second level under build.gradle has one value only
        let mut prompt = ScriptedPrompt::new([0]);
        let resolution = TreeResolver::Interactive(&mut prompt)
            .resolve(&sample_tree())
            .unwrap();

        assert_eq!(resolution.config, "android-config");
        assert_eq!(prompt.asked(), &["Path to the gradle file to use".to_string()]);
    }

    #[test]
    fn test_interactive_out_of_range_answer_is_fatal() {
        let mut prompt = ScriptedPrompt::new([5]);
        let err = TreeResolver::Interactive(&mut prompt)
            .resolve(&sample_tree())
            .unwrap_err();

        match err {
            ResolveError::InvalidAnswer {
                answer, options, ..
            } => {
                assert_eq!(answer, 5);
                assert_eq!(options, 2);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_any_value_marker() {
        let tree = OptionNode::any_value_chain(&[("Fastlane lane", "FASTLANE_LANE")], "default-cfg");

        let resolution = TreeResolver::Deterministic.resolve(&tree).unwrap();
        assert_eq!(resolution.bindings, vec![binding("FASTLANE_LANE", ANY_VALUE)]);

        let mut prompt = ScriptedPrompt::default().with_inputs(["beta"]);
        let resolution = TreeResolver::Interactive(&mut prompt).resolve(&tree).unwrap();
        assert_eq!(resolution.bindings, vec![binding("FASTLANE_LANE", "beta")]);
    }

    #[test]
    fn test_mode() {
        let mut prompt = ScriptedPrompt::default();
        assert_eq!(TreeResolver::Deterministic.mode(), ResolutionMode::Deterministic);
        assert_eq!(
            TreeResolver::Interactive(&mut prompt).mode(),
            ResolutionMode::Interactive
        );
    }
}
