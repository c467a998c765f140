//! Configuration structs with sensible defaults and RON persistence.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

const CONFIG_FILE: &str = "config.ron";

const VALUE_FLAG_8_BIT: u32 = 0x01;
const VALUE_FLAG_16_BIT: u32 = 0x02;
/// Every defined material channel bit.
const MATERIAL_FLAG_MASK: u32 = 0x1F;

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// On-disk sample and material layouts for newly written data.
    pub format: FormatSettings,
    /// Blob compression settings.
    pub compression: CompressionSettings,
    /// Heightmap range pyramid shape.
    pub pyramid: PyramidSettings,
    /// Debug/development settings.
    pub debug: DebugSettings,
}

/// Raw layout flags. Resolved into typed flags by the voxel crate.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct FormatSettings {
    /// Value width bits: `0x01` = 8-bit samples, `0x02` = 16-bit samples.
    pub value_config_flag: u32,
    /// Material channel bits (index, colors, RGBA, actor id, grass id).
    pub material_config_flag: u32,
}

/// Compression configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CompressionSettings {
    /// zlib level, `-1` for the library default.
    pub level: i32,
}

/// Range pyramid configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PyramidSettings {
    /// Side length in samples of a level-0 tile.
    pub tile_size: u32,
    /// Number of levels to build, `None` = until a single root tile remains.
    pub max_depth: Option<u32>,
}

/// Debug/development configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DebugSettings {
    /// Log level override (e.g., "debug", "info", "warn").
    pub log_level: String,
}

// --- Default implementations ---

impl Default for FormatSettings {
    fn default() -> Self {
        Self {
            value_config_flag: VALUE_FLAG_16_BIT,
            // Colors, RGBA, spawned actors and grass: every channel stored.
            material_config_flag: 0x1E,
        }
    }
}

impl Default for CompressionSettings {
    fn default() -> Self {
        Self { level: -1 }
    }
}

impl Default for PyramidSettings {
    fn default() -> Self {
        Self {
            tile_size: 16,
            max_depth: None,
        }
    }
}

impl Default for DebugSettings {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

/// Platform config directory for strata, if the platform has one.
pub fn default_config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("strata"))
}

// --- Load / Save / Reload ---

impl Config {
    /// Load config from the given directory, or create a default config file.
    pub fn load_or_create(config_dir: &Path) -> Result<Self, ConfigError> {
        let config_path = config_dir.join(CONFIG_FILE);

        if config_path.exists() {
            let config = read_config(&config_path)?;
            log::info!("Loaded config from {}", config_path.display());
            Ok(config)
        } else {
            let config = Config::default();
            config.save(config_dir)?;
            log::info!("Created default config at {}", config_path.display());
            Ok(config)
        }
    }

    /// Save config to the given directory as `config.ron`.
    pub fn save(&self, config_dir: &Path) -> Result<(), ConfigError> {
        let config_path = config_dir.join(CONFIG_FILE);
        std::fs::create_dir_all(config_dir).map_err(|source| ConfigError::Write {
            path: config_dir.to_path_buf(),
            source,
        })?;

        let pretty = ron::ser::PrettyConfig::new()
            .depth_limit(2)
            .enumerate_arrays(false);

        let serialized =
            ron::ser::to_string_pretty(self, pretty).map_err(ConfigError::Serialize)?;

        std::fs::write(&config_path, serialized).map_err(|source| ConfigError::Write {
            path: config_path.clone(),
            source,
        })?;
        Ok(())
    }

    /// Re-read the file: `Some(new_config)` if it changed, `None` otherwise.
    pub fn reload(&self, config_dir: &Path) -> Result<Option<Self>, ConfigError> {
        let new_config = read_config(&config_dir.join(CONFIG_FILE))?;

        if &new_config != self {
            log::info!("Config reloaded with changes");
            Ok(Some(new_config))
        } else {
            Ok(None)
        }
    }

    /// Checks values that parse but cannot be used by the storage formats.
    ///
    /// `path` only labels the error.
    pub fn validate(&self, path: &Path) -> Result<(), ConfigError> {
        let invalid = |field, reason: String| {
            Err(ConfigError::Invalid {
                path: path.to_path_buf(),
                field,
                reason,
            })
        };

        let value_flag = self.format.value_config_flag;
        if value_flag != VALUE_FLAG_8_BIT && value_flag != VALUE_FLAG_16_BIT {
            return invalid(
                "format.value_config_flag",
                format!("{value_flag:#x} must select exactly one width (0x1 or 0x2)"),
            );
        }
        let material_flag = self.format.material_config_flag;
        if material_flag & !MATERIAL_FLAG_MASK != 0 {
            return invalid(
                "format.material_config_flag",
                format!("{material_flag:#x} has bits outside {MATERIAL_FLAG_MASK:#x}"),
            );
        }
        if !(-1..=9).contains(&self.compression.level) {
            return invalid(
                "compression.level",
                format!("{} is outside -1..=9", self.compression.level),
            );
        }
        if self.pyramid.tile_size == 0 {
            return invalid("pyramid.tile_size", "must be at least 1".to_string());
        }
        if self.pyramid.max_depth == Some(0) {
            return invalid("pyramid.max_depth", "must be at least 1".to_string());
        }
        Ok(())
    }
}

/// Reads, parses, and validates one config file.
fn read_config(path: &Path) -> Result<Config, ConfigError> {
    let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let config: Config = ron::from_str(&contents).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    config.validate(path)?;
    Ok(config)
}
