//! Decision trees describing the configuration choices of a platform
//!
//! A platform's options are a tree of questions. Every question binds the chosen
//! value to an environment variable, and every root-to-leaf path ends in the
//! name of a pipeline configuration produced alongside the tree.
//!
//! ```
//! use ciscan::options::OptionTreeBuilder;
//!
//! let mut builder = OptionTreeBuilder::new()
//!     .level("Working directory", "FASTLANE_WORK_DIR")
//!     .level("Fastlane lane", "FASTLANE_LANE");
//! builder.add_path(&["ios", "test"], "fastlane-config").unwrap();
//! builder.add_path(&["ios", "beta"], "fastlane-config").unwrap();
//!
//! let tree = builder.build().unwrap().unwrap();
//! assert_eq!(tree.leaf_configs(), vec!["fastlane-config".to_string()]);
//! ```

pub mod builder;
pub mod ordered;
pub mod resolver;

pub use builder::OptionTreeBuilder;
pub use ordered::OrderedMap;
pub use resolver::{
    Binding, DialoguerPrompt, Prompt, Resolution, ResolutionMode, ResolveError, ScriptedPrompt,
    TreeResolver,
};

use serde::ser::{Serialize, SerializeMap, Serializer};
use thiserror::Error;

/// Value key standing for "any value the user supplies"
pub const ANY_VALUE: &str = "_";

/// Errors raised while building or validating an option tree
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TreeError {
    #[error("Option tree has no levels")]
    NoLevels,

    #[error("Path has {actual} values but the tree has {expected} levels")]
    DepthMismatch { expected: usize, actual: usize },

    #[error("Value '{value}' already leads to config '{existing}', cannot also lead to '{requested}'")]
    ConflictingConfig {
        value: String,
        existing: String,
        requested: String,
    },

    #[error("Environment key '{0}' is bound more than once on a single path")]
    DuplicateEnvKey(String),

    #[error("Question '{0}' offers no values")]
    EmptyQuestion(String),
}

/// A question whose answers lead to further nodes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    pub title: String,
    pub env_key: String,
    pub values: OrderedMap<String, OptionNode>,
}

/// One node of an option tree: either a question or a terminal configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OptionNode {
    Branch(Question),
    Leaf { config: String },
}

/// One root-to-leaf walk through a tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionPath {
    pub bindings: Vec<(String, String)>,
    pub config: String,
}

impl OptionNode {
    pub fn branch(title: impl Into<String>, env_key: impl Into<String>) -> Self {
        OptionNode::Branch(Question {
            title: title.into(),
            env_key: env_key.into(),
            values: OrderedMap::new(),
        })
    }

    pub fn leaf(config: impl Into<String>) -> Self {
        OptionNode::Leaf {
            config: config.into(),
        }
    }

    /// Single-path tree where every level accepts [`ANY_VALUE`]
    pub fn any_value_chain(levels: &[(&str, &str)], config: &str) -> Self {
        levels
            .iter()
            .rev()
            .fold(OptionNode::leaf(config), |child, (title, env_key)| {
                let mut node = OptionNode::branch(*title, *env_key);
                node.insert_value(ANY_VALUE, child);
                node
            })
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self, OptionNode::Leaf { .. })
    }

    pub fn config(&self) -> Option<&str> {
        match self {
            OptionNode::Leaf { config } => Some(config),
            OptionNode::Branch(_) => None,
        }
    }

    pub fn question(&self) -> Option<&Question> {
        match self {
            OptionNode::Branch(q) => Some(q),
            OptionNode::Leaf { .. } => None,
        }
    }

    /// Adds (or replaces) a child under `value`. Ignored on leaves.
    pub fn insert_value(&mut self, value: impl Into<String>, child: OptionNode) {
        if let OptionNode::Branch(q) = self {
            q.values.insert(value.into(), child);
        }
    }

    /// Configuration names reachable from this node, first occurrence first
    pub fn leaf_configs(&self) -> Vec<String> {
        let mut configs = Vec::new();
        for path in self.paths() {
            if !configs.contains(&path.config) {
                configs.push(path.config);
            }
        }
        configs
    }

    /// Every root-to-leaf path in insertion order
    pub fn paths(&self) -> Vec<OptionPath> {
        let mut out = Vec::new();
        self.collect_paths(&mut Vec::new(), &mut out);
        out
    }

    fn collect_paths(&self, prefix: &mut Vec<(String, String)>, out: &mut Vec<OptionPath>) {
        match self {
            OptionNode::Leaf { config } => out.push(OptionPath {
                bindings: prefix.clone(),
                config: config.clone(),
            }),
            OptionNode::Branch(q) => {
                for (value, child) in q.values.iter() {
                    prefix.push((q.env_key.clone(), value.clone()));
                    child.collect_paths(prefix, out);
                    prefix.pop();
                }
            }
        }
    }

    /// Checks that no question is empty and no path binds a key twice.
    pub fn validate(&self) -> Result<(), TreeError> {
        self.validate_from(&mut Vec::new())
    }

    fn validate_from(&self, seen: &mut Vec<String>) -> Result<(), TreeError> {
        let q = match self {
            OptionNode::Leaf { .. } => return Ok(()),
            OptionNode::Branch(q) => q,
        };

        if q.values.is_empty() {
            return Err(TreeError::EmptyQuestion(q.title.clone()));
        }
        if seen.contains(&q.env_key) {
            return Err(TreeError::DuplicateEnvKey(q.env_key.clone()));
        }

        seen.push(q.env_key.clone());
        for child in q.values.values() {
            child.validate_from(seen)?;
        }
        seen.pop();
        Ok(())
    }
}

impl Serialize for OptionNode {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            OptionNode::Leaf { config } => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry("config", config)?;
                map.end()
            }
            OptionNode::Branch(q) => {
                let mut map = serializer.serialize_map(Some(3))?;
                map.serialize_entry("title", &q.title)?;
                map.serialize_entry("env_key", &q.env_key)?;
                map.serialize_entry("value_map", &q.values)?;
                map.end()
            }
        }
    }
}
