//! Layout flags every writer in a process uses.

use strata_config::FormatSettings;

use crate::{CodecError, MaterialConfigFlag, ValueConfigFlag, ValueWidth};

/// The on-disk layouts new data is written with, resolved once from config
/// and passed to every encode and decode call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FormatConfig {
    pub value_width: ValueWidth,
    pub material_flag: MaterialConfigFlag,
}

impl Default for FormatConfig {
    fn default() -> Self {
        Self {
            value_width: ValueWidth::Sixteen,
            material_flag: MaterialConfigFlag::CURRENT,
        }
    }
}

impl FormatConfig {
    /// Validates the raw flags from the `format` config section.
    pub fn from_settings(settings: &FormatSettings) -> Result<Self, CodecError> {
        let value_flag = ValueConfigFlag::from_bits(settings.value_config_flag)
            .ok_or(CodecError::InvalidValueConfigFlag(settings.value_config_flag))?;
        let value_width = value_flag.width()?;
        let material_flag = MaterialConfigFlag::from_bits(settings.material_config_flag).ok_or(
            CodecError::InvalidMaterialConfigFlag(settings.material_config_flag),
        )?;
        Ok(Self {
            value_width,
            material_flag,
        })
    }

    /// The flag stored beside data written with this config.
    pub fn value_flag(&self) -> ValueConfigFlag {
        self.value_width.into()
    }

    pub fn with_value_width(mut self, width: ValueWidth) -> Self {
        self.value_width = width;
        self
    }

    pub fn with_material_flag(mut self, flag: MaterialConfigFlag) -> Self {
        self.material_flag = flag;
        self
    }
}
