//! Scan orchestration and its aggregate result
//!
//! [`ScanOrchestrator`] runs every registered detector against one checkout
//! and folds their findings into a [`ScanResult`], the document written by the
//! `scan` command.

pub mod orchestrator;
pub mod result;

pub use orchestrator::{PlatformDetection, ScanOrchestrator};
pub use result::{ScanResult, NO_PLATFORM_DETECTED};

use crate::options::{ResolveError, TreeError};
use crate::pipeline::PipelineError;
use crate::scanners::PlatformId;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that abort a scan or the generation of a pipeline from its result
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("Scan root not found: {0}")]
    PathNotFound(PathBuf),

    #[error("Scan root is not a directory: {0}")]
    NotADirectory(PathBuf),

    #[error("{platform} detector failed: {source:#}")]
    Detector {
        platform: PlatformId,
        #[source]
        source: anyhow::Error,
    },

    #[error("{platform} options lead to config '{config}' which was not generated")]
    ConfigPairing { platform: PlatformId, config: String },

    #[error("Platform {0} was not detected")]
    PlatformNotDetected(PlatformId),

    #[error(transparent)]
    Tree(#[from] TreeError),

    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error(transparent)]
    Pipeline(#[from] PipelineError),
}

impl ScanError {
    /// Returns a user-friendly error message with troubleshooting hints
    pub fn help_message(&self) -> String {
        match self {
            ScanError::PathNotFound(path) => format!(
                "Error: Scan root not found\nPath: {}\n\n\
                Help: The specified path does not exist. Please check:\n\
                - Is the path correct?\n\
                - Do you have permission to access it?",
                path.display()
            ),
            ScanError::NotADirectory(path) => format!(
                "Error: Scan root is not a directory\nPath: {}\n\n\
                Help: Please provide the path to the repository root directory.",
                path.display()
            ),
            ScanError::Detector { platform, source } => format!(
                "Error: Scanning for {} failed\n\n\
                Details: {:#}\n\n\
                Help: Check that the files mentioned above are readable.",
                platform.display_name(),
                source
            ),
            ScanError::ConfigPairing { .. } => format!(
                "Error: {}\n\n\
                This is a bug in ciscan, please report it together with the \
                layout of the scanned repository.",
                self
            ),
            ScanError::Resolve(ResolveError::Cancelled) => {
                "Cancelled, no configuration was written.".to_string()
            }
            _ => format!("Error: {}", self),
        }
    }
}
