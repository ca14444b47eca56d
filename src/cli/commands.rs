use crate::output::OutputFormat;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Detects build platforms in a checkout and generates CI pipeline configuration
#[derive(Parser, Debug)]
#[command(
    name = "ciscan",
    about = "Detects build platforms in a checkout and generates CI pipeline configuration",
    version,
    long_about = "ciscan inspects a source checkout for Android, iOS and fastlane projects, \
                  lists the configuration choices each platform offers and generates \
                  ready-to-run pipeline definitions for them."
)]
pub struct CliArgs {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(long, global = true, value_name = "LEVEL", help = "Set logging level")]
    pub log_level: Option<String>,

    #[arg(short = 'v', long, global = true, help = "Enable debug logging")]
    pub verbose: bool,

    #[arg(
        short = 'q',
        long,
        global = true,
        conflicts_with = "verbose",
        help = "Quiet mode - suppress non-error output"
    )]
    pub quiet: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    #[command(
        about = "Scan a checkout and write the options and configs found",
        long_about = "Runs every platform detector over the checkout and writes the scan \
                      result (options, configs, warnings, errors) to the output directory.\n\n\
                      Examples:\n  \
                      ciscan scan\n  \
                      ciscan scan /path/to/repo --output-dir out\n  \
                      ciscan scan --format json"
    )]
    Scan(ScanArgs),

    #[command(
        about = "Scan a checkout and generate one pipeline definition",
        long_about = "Scans the checkout, picks a platform and one path through its options, \
                      and writes the resulting bitrise.yml next to the scan result.\n\n\
                      Examples:\n  \
                      ciscan config\n  \
                      ciscan config /path/to/repo --ci"
    )]
    Config(ConfigArgs),
}

#[derive(Parser, Debug, Clone)]
pub struct ScanArgs {
    #[arg(
        value_name = "PATH",
        help = "Path to the checkout (defaults to current directory)"
    )]
    pub path: Option<PathBuf>,

    #[arg(
        short = 'o',
        long,
        value_name = "DIR",
        help = "Directory the result is written to (defaults to current directory)"
    )]
    pub output_dir: Option<PathBuf>,

    #[arg(
        short = 'f',
        long,
        value_enum,
        default_value = "yaml",
        help = "Output format"
    )]
    pub format: OutputFormatArg,

    #[arg(long, value_name = "DEPTH", help = "Directory depth searched for project files")]
    pub max_depth: Option<usize>,
}

#[derive(Parser, Debug, Clone)]
pub struct ConfigArgs {
    #[arg(
        value_name = "PATH",
        help = "Path to the checkout (defaults to current directory)"
    )]
    pub path: Option<PathBuf>,

    #[arg(
        short = 'o',
        long,
        value_name = "DIR",
        help = "Directory bitrise.yml is written to (defaults to current directory)"
    )]
    pub output_dir: Option<PathBuf>,

    #[arg(long, help = "Non-interactive: always pick the first option")]
    pub ci: bool,

    #[arg(long, value_name = "DEPTH", help = "Directory depth searched for project files")]
    pub max_depth: Option<usize>,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormatArg {
    Json,
    Yaml,
}

impl From<OutputFormatArg> for OutputFormat {
    fn from(arg: OutputFormatArg) -> Self {
        match arg {
            OutputFormatArg::Json => OutputFormat::Json,
            OutputFormatArg::Yaml => OutputFormat::Yaml,
        }
    }
}
