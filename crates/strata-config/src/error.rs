//! Configuration error types.

use std::path::PathBuf;

/// Errors from loading, saving, or validating `config.ron`.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The config file exists but could not be read.
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The config directory or file could not be written.
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file is not valid RON for [`Config`](crate::Config).
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: ron::error::SpannedError,
    },

    #[error("failed to serialize config: {0}")]
    Serialize(#[source] ron::Error),

    /// A setting parsed fine but has no meaning for the storage formats.
    #[error("invalid {field} in {path}: {reason}")]
    Invalid {
        path: PathBuf,
        /// Dotted name of the offending setting, like `format.value_config_flag`.
        field: &'static str,
        reason: String,
    },
}
