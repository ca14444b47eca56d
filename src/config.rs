//! Configuration management for ciscan
//!
//! Settings are read from environment variables with sensible defaults;
//! command line flags override them afterwards.
//!
//! # Environment Variables
//!
//! - `CISCAN_LOG_LEVEL`: Logging level - default: "info"
//! - `CISCAN_MAX_DEPTH`: Directory depth searched for project files - default: "12"
//! - `CISCAN_STEP_LIB_SOURCE`: Step library referenced by generated pipelines -
//!   default: the public bitrise steplib
//! - `CISCAN_RESULT_FILE`: File name (without extension) of the scan result -
//!   default: "result"
//!
//! # Example
//!
//! ```no_run
//! use ciscan::CiscanConfig;
//!
//! let config = CiscanConfig::default();
//! config.validate().expect("Invalid configuration");
//! println!("{}", config);
//! ```

use crate::pipeline::DEFAULT_STEP_LIB_SOURCE;
use std::env;
use std::fmt;
use thiserror::Error;

const DEFAULT_LOG_LEVEL: &str = "info";
const DEFAULT_MAX_DEPTH: usize = 12;
const MAX_DEPTH_LIMIT: usize = 64;
const DEFAULT_RESULT_FILE: &str = "result";

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Configuration validation failed
    #[error("Configuration validation failed: {0}")]
    ValidationFailed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CiscanConfig {
    /// Logging level (trace, debug, info, warn, error)
    pub log_level: String,

    /// Depth limit of the directory walk
    pub max_depth: usize,

    /// `default_step_lib_source` of generated pipelines
    pub step_lib_source: String,

    /// Scan result file name without extension
    pub result_file: String,
}

impl Default for CiscanConfig {
    /// Loads from `CISCAN_*` environment variables, falling back to defaults
    fn default() -> Self {
        let log_level = env::var("CISCAN_LOG_LEVEL")
            .unwrap_or_else(|_| DEFAULT_LOG_LEVEL.to_string())
            .to_lowercase();

        let max_depth = env::var("CISCAN_MAX_DEPTH")
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap_or(DEFAULT_MAX_DEPTH);

        let step_lib_source = env::var("CISCAN_STEP_LIB_SOURCE")
            .unwrap_or_else(|_| DEFAULT_STEP_LIB_SOURCE.to_string());

        let result_file =
            env::var("CISCAN_RESULT_FILE").unwrap_or_else(|_| DEFAULT_RESULT_FILE.to_string());

        Self {
            log_level,
            max_depth,
            step_lib_source,
            result_file,
        }
    }
}

impl CiscanConfig {
    /// Validates the configuration
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if any value is out of range
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_depth == 0 || self.max_depth > MAX_DEPTH_LIMIT {
            return Err(ConfigError::ValidationFailed(format!(
                "Max depth must be between 1 and {}, got {}",
                MAX_DEPTH_LIMIT, self.max_depth
            )));
        }

        if self.step_lib_source.trim().is_empty() {
            return Err(ConfigError::ValidationFailed(
                "Step library source cannot be empty".to_string(),
            ));
        }

        if self.result_file.trim().is_empty() || self.result_file.contains(['/', '\\']) {
            return Err(ConfigError::ValidationFailed(format!(
                "Invalid result file name: '{}'",
                self.result_file
            )));
        }

        match self.log_level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => {
                return Err(ConfigError::ValidationFailed(format!(
                    "Invalid log level: {}. Valid options: trace, debug, info, warn, error",
                    self.log_level
                )))
            }
        }

        Ok(())
    }
}

impl fmt::Display for CiscanConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "ciscan configuration:")?;
        writeln!(f, "  Log Level: {}", self.log_level)?;
        writeln!(f, "  Max Depth: {}", self.max_depth)?;
        writeln!(f, "  Step Library: {}", self.step_lib_source)?;
        writeln!(f, "  Result File: {}", self.result_file)?;
        Ok(())
    }
}
