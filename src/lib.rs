//! ciscan - CI configuration scanner
//!
//! ciscan inspects a source checkout, works out which build platforms it
//! contains and describes, per platform, the choices needed to build it plus
//! one ready-to-run pipeline definition per configuration those choices can
//! lead to.
//!
//! # Core Concepts
//!
//! - **Detectors** ([`scanners`]): one per platform (Android, iOS, fastlane),
//!   each deciding whether its platform is present and building an option tree
//! - **Option trees** ([`options`]): questions whose answers bind environment
//!   variables, ending in a configuration name
//! - **Pipelines** ([`pipeline`]): the version-pinned step lists generated for
//!   every configuration name
//! - **Scan** ([`scan`]): runs all detectors and aggregates their results
//!
//! # Example Usage
//!
//! ```no_run
//! use ciscan::fs::RealFileSystem;
//! use ciscan::options::TreeResolver;
//! use ciscan::{CiscanConfig, ScanOrchestrator};
//! use std::path::Path;
//! use std::sync::Arc;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = CiscanConfig::default();
//! let mut orchestrator = ScanOrchestrator::with_defaults(Arc::new(RealFileSystem::new()), &config);
//! let result = orchestrator.run(Path::new("/path/to/repo"))?;
//!
//! for platform in result.platforms() {
//!     if let Some(tree) = result.options_for(platform) {
//!         let resolution = TreeResolver::Deterministic.resolve(tree)?;
//!         println!("{}: {}", platform, resolution.config);
//!     }
//! }
//! # Ok(())
//! # }
//! ```

pub mod cli;
pub mod config;
pub mod fs;
pub mod options;
pub mod output;
pub mod pipeline;
pub mod scan;
pub mod scanners;
pub mod util;

pub use config::{CiscanConfig, ConfigError};
pub use options::{OptionNode, OptionTreeBuilder, Resolution, TreeResolver};
pub use scan::{ScanError, ScanOrchestrator, ScanResult};
pub use scanners::{Detector, PlatformId};
pub use util::{init_from_env, init_logging, LoggingConfig};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
