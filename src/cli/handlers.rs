//! Command handlers; each returns the process exit code

use super::commands::{ConfigArgs, ScanArgs};
use crate::config::CiscanConfig;
use crate::fs::RealFileSystem;
use crate::options::{Prompt, Resolution, ResolveError, TreeResolver, DialoguerPrompt};
use crate::output::{OutputFormat, OutputFormatter};
use crate::scan::{ScanError, ScanOrchestrator, ScanResult};
use crate::scanners::PlatformId;
use anyhow::{Context, Result};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, error, info};

/// File name of the generated pipeline definition
pub const PIPELINE_FILE_NAME: &str = "bitrise.yml";

const PLATFORM_TITLE: &str = "Platform";

/// A pipeline definition chosen from a scan result
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedPipeline {
    pub platform: PlatformId,
    pub resolution: Resolution,
    pub definition: String,
}

pub fn handle_scan(args: &ScanArgs, quiet: bool) -> i32 {
    info!("Starting scan");

    let mut config = CiscanConfig::default();
    if let Some(depth) = args.max_depth {
        config.max_depth = depth;
    }
    if let Err(e) = config.validate() {
        error!("Configuration error: {}", e);
        eprintln!("\nPlease check your environment variables and command-line arguments.");
        return 1;
    }

    let (root, output_dir) = match resolve_dirs(args.path.as_deref(), args.output_dir.as_deref()) {
        Ok(dirs) => dirs,
        Err(e) => {
            error!("{:#}", e);
            return 1;
        }
    };

    let result = match scan(&root, &config) {
        Ok(result) => result,
        Err(e) => {
            eprintln!("{}", e.help_message());
            return 1;
        }
    };

    let formatter = OutputFormatter::new(args.format.into());
    let result_path = output_dir.join(formatter.file_name(&config.result_file));
    if let Err(e) = write_result(&formatter, &result, &result_path) {
        error!("{:#}", e);
        return 1;
    }
    if !quiet {
        println!("Scan result written to {}", result_path.display());
    }

    report_errors(&result)
}

pub fn handle_config(args: &ConfigArgs, quiet: bool) -> i32 {
    info!("Starting config generation");

    let mut config = CiscanConfig::default();
    if let Some(depth) = args.max_depth {
        config.max_depth = depth;
    }
    if let Err(e) = config.validate() {
        error!("Configuration error: {}", e);
        eprintln!("\nPlease check your environment variables and command-line arguments.");
        return 1;
    }

    let (root, output_dir) = match resolve_dirs(args.path.as_deref(), args.output_dir.as_deref()) {
        Ok(dirs) => dirs,
        Err(e) => {
            error!("{:#}", e);
            return 1;
        }
    };

    let result = match scan(&root, &config) {
        Ok(result) => result,
        Err(e) => {
            eprintln!("{}", e.help_message());
            return 1;
        }
    };

    let formatter = OutputFormatter::new(OutputFormat::Yaml);
    let result_path = output_dir.join(formatter.file_name(&config.result_file));
    if let Err(e) = write_result(&formatter, &result, &result_path) {
        error!("{:#}", e);
        return 1;
    }
    if result.has_errors() {
        return report_errors(&result);
    }

    let generated = if args.ci {
        generate_pipeline(&result, None)
    } else {
        let mut prompt = DialoguerPrompt::new();
        generate_pipeline(&result, Some(&mut prompt))
    };
    let generated = match generated {
        Ok(generated) => generated,
        Err(e) => {
            eprintln!("{}", e.help_message());
            return 1;
        }
    };

    let pipeline_path = output_dir.join(PIPELINE_FILE_NAME);
    if let Err(e) = fs::write(&pipeline_path, &generated.definition)
        .with_context(|| format!("Failed to write {}", pipeline_path.display()))
    {
        error!("{:#}", e);
        return 1;
    }

    if !quiet {
        println!(
            "Generated {} config '{}' written to {}",
            generated.platform.display_name(),
            generated.resolution.config,
            pipeline_path.display()
        );
    }
    0
}

/// Picks a platform and one path through its options.
///
/// Without a prompt the first detected platform and the first option of every
/// question are taken.
pub fn generate_pipeline(
    result: &ScanResult,
    prompt: Option<&mut dyn Prompt>,
) -> Result<GeneratedPipeline, ScanError> {
    let platforms = result.platforms();
    let first = *platforms.first().ok_or(ResolveError::EmptyTree)?;

    let (platform, mut resolver) = match prompt {
        None => (first, TreeResolver::Deterministic),
        Some(prompt) => {
            let platform = if platforms.len() == 1 {
                first
            } else {
                let names: Vec<String> = platforms
                    .iter()
                    .map(|p| p.display_name().to_string())
                    .collect();
                let index = prompt.select(PLATFORM_TITLE, &names)?;
                *platforms.get(index).ok_or_else(|| ResolveError::InvalidAnswer {
                    title: PLATFORM_TITLE.to_string(),
                    answer: index,
                    options: platforms.len(),
                })?
            };
            (platform, TreeResolver::Interactive(prompt))
        }
    };
    debug!(platform = %platform, mode = ?resolver.mode(), "Resolving options");

    let tree = result
        .options_for(platform)
        .ok_or(ScanError::PlatformNotDetected(platform))?;
    let resolution = resolver.resolve(tree)?;
    let definition = result.pipeline_for(platform, &resolution)?;

    Ok(GeneratedPipeline {
        platform,
        resolution,
        definition,
    })
}

fn scan(root: &Path, config: &CiscanConfig) -> Result<ScanResult, ScanError> {
    let mut orchestrator = ScanOrchestrator::with_defaults(Arc::new(RealFileSystem::new()), config);
    orchestrator.run(root)
}

fn resolve_dirs(path: Option<&Path>, output_dir: Option<&Path>) -> Result<(PathBuf, PathBuf)> {
    let cwd = env::current_dir().context("Failed to get current directory")?;

    let root = path.map(Path::to_path_buf).unwrap_or_else(|| cwd.clone());
    let root = root
        .canonicalize()
        .with_context(|| format!("Failed to resolve path {}", root.display()))?;
    debug!("Scan root: {}", root.display());

    let output_dir = output_dir.map(Path::to_path_buf).unwrap_or(cwd);
    fs::create_dir_all(&output_dir)
        .with_context(|| format!("Failed to create output directory {}", output_dir.display()))?;

    Ok((root, output_dir))
}

fn write_result(formatter: &OutputFormatter, result: &ScanResult, path: &Path) -> Result<()> {
    let content = formatter.format(result)?;
    fs::write(path, content).with_context(|| format!("Failed to write {}", path.display()))?;
    debug!("Scan result written to {}", path.display());
    Ok(())
}

fn report_errors(result: &ScanResult) -> i32 {
    if !result.has_errors() {
        return 0;
    }
    for message in &result.errors {
        error!("{}", message);
    }
    1
}
