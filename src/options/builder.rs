//! Folds repeated discoveries into a single option tree
//!
//! Detectors report one path at a time (for example work dir, then lane, then
//! config). The builder owns the per-level question schema, so every path merged
//! into one tree shares titles and environment keys by construction. Values
//! already present at a level are reused instead of creating a sibling, and the
//! order in which values are first seen is the order they serialize in.

use super::{OptionNode, TreeError};
use tracing::trace;

#[derive(Debug, Default, Clone)]
pub struct OptionTreeBuilder {
    levels: Vec<(String, String)>,
    root: Option<OptionNode>,
    paths: usize,
}

impl OptionTreeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a question level (title, environment key)
    pub fn level(mut self, title: impl Into<String>, env_key: impl Into<String>) -> Self {
        self.levels.push((title.into(), env_key.into()));
        self
    }

    /// Number of paths added so far, duplicates included
    pub fn path_count(&self) -> usize {
        self.paths
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// Merges one discovered path ending in `config`.
    pub fn add_path(&mut self, values: &[&str], config: &str) -> Result<(), TreeError> {
        let (title, env_key) = self.levels.first().ok_or(TreeError::NoLevels)?;
        if values.len() != self.levels.len() {
            return Err(TreeError::DepthMismatch {
                expected: self.levels.len(),
                actual: values.len(),
            });
        }

        trace!(?values, config, "Merging option path");

        let root = self
            .root
            .get_or_insert_with(|| OptionNode::branch(title.clone(), env_key.clone()));
        insert_path(root, &self.levels[1..], values, config)?;
        self.paths += 1;
        Ok(())
    }

    /// Returns the merged tree, or `None` when no path was added.
    pub fn build(self) -> Result<Option<OptionNode>, TreeError> {
        match self.root {
            Some(root) => {
                root.validate()?;
                Ok(Some(root))
            }
            None => Ok(None),
        }
    }
}

fn insert_path(
    node: &mut OptionNode,
    remaining_levels: &[(String, String)],
    values: &[&str],
    config: &str,
) -> Result<(), TreeError> {
    let question = match node {
        OptionNode::Branch(q) => q,
        OptionNode::Leaf { .. } => {
            return Err(TreeError::DepthMismatch {
                expected: remaining_levels.len(),
                actual: values.len(),
            })
        }
    };
    let (value, rest) = match values.split_first() {
        Some(split) => split,
        None => return Ok(()),
    };

    match remaining_levels.split_first() {
        None => {
            if let Some(existing) = question.values.get(*value).and_then(OptionNode::config) {
                if existing != config {
                    return Err(TreeError::ConflictingConfig {
                        value: value.to_string(),
                        existing: existing.to_string(),
                        requested: config.to_string(),
                    });
                }
                return Ok(());
            }
            question
                .values
                .insert(value.to_string(), OptionNode::leaf(config));
            Ok(())
        }
        Some(((title, env_key), deeper)) => {
            let child = question.values.get_or_insert_with(value.to_string(), || {
                OptionNode::branch(title.clone(), env_key.clone())
            });
            insert_path(child, deeper, rest, config)
        }
    }
}
