//! Configuration for the strata storage tools.
//!
//! Settings persist to disk as `config.ron`. Every section tolerates missing
//! and unknown fields so old files keep loading. CLI arguments override
//! whatever the file says.

mod cli;
mod config;
mod error;

pub use cli::CliArgs;
pub use config::{
    CompressionSettings, Config, DebugSettings, FormatSettings, PyramidSettings, default_config_dir,
};
pub use error::ConfigError;
