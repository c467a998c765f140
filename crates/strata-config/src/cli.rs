//! Command-line overrides shared by every strata binary.

use std::path::PathBuf;

use clap::Args;

use crate::Config;

/// Global options, flattened into each binary's own parser.
///
/// Values given here win over `config.ron`.
#[derive(Args, Debug, Clone, Default, PartialEq)]
pub struct CliArgs {
    /// Log level (error, warn, info, debug, trace).
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// zlib level for newly written blobs (-1 = library default, 0-9).
    #[arg(long, global = true, allow_negative_numbers = true)]
    pub compression_level: Option<i32>,

    /// Path to config directory (overrides default location).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
}

impl Config {
    /// Apply CLI overrides to a loaded config.
    pub fn apply_cli_overrides(&mut self, args: &CliArgs) {
        if let Some(ref level) = args.log_level {
            self.debug.log_level = level.clone();
        }
        if let Some(level) = args.compression_level {
            self.compression.level = level;
        }
    }
}
