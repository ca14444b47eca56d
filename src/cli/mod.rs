pub mod commands;
pub mod handlers;

pub use commands::{CliArgs, Commands, ConfigArgs, OutputFormatArg, ScanArgs};
pub use handlers::{handle_config, handle_scan};
