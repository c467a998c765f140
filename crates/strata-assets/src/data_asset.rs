//! Dense volume assets.
//!
//! ## Container Layout
//!
//! | Size | Field |
//! |------|-------|
//! | 4 | Magic `"SVOL"` |
//! | 4 | Data asset version (`i32`) |
//! | 4 | Value config flag (`u32`) |
//! | 4 | Material config flag (`u32`) |
//! | 8 + N | Compressed payload (`i64` length + bytes) |

use strata_archive::{ArchiveReader, ArchiveWriter, CountPrefix};
use strata_compress::ChunkedCompressor;
use strata_voxel::{
    CodecError, DataAssetVersion, DenseVolume, FormatConfig, MaterialConfigFlag, ValueConfigFlag,
};

use crate::{AssetError, PayloadError, read_magic};

/// A compressed [`DenseVolume`] with the version and flags it was saved under.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DataAsset {
    pub version: i32,
    pub value_config_flag: u32,
    pub material_config_flag: u32,
    pub compressed: Vec<u8>,
}

impl DataAsset {
    pub const MAGIC: [u8; 4] = *b"SVOL";

    /// Serializes and compresses `volume` under `format`.
    pub fn save(
        volume: &DenseVolume,
        format: &FormatConfig,
        compressor: &ChunkedCompressor,
    ) -> Result<Self, AssetError> {
        let mut writer = ArchiveWriter::with_capacity(volume.allocated_size() + 16);
        volume
            .save(&mut writer, format)
            .map_err(|e| AssetError::Encode(e.into()))?;
        let compressed = compressor
            .compress(writer.as_bytes())
            .map_err(AssetError::Compression)?;

        tracing::debug!(
            size = ?volume.size(),
            serialized = writer.position(),
            compressed = compressed.len(),
            "saved data asset"
        );
        Ok(Self {
            version: DataAssetVersion::LATEST.as_i32(),
            value_config_flag: format.value_flag().bits(),
            material_config_flag: format.material_flag.bits(),
            compressed,
        })
    }

    /// Whether nothing was ever saved into this asset.
    pub fn is_empty(&self) -> bool {
        self.compressed.is_empty()
    }

    /// Decompresses and decodes the stored volume.
    pub fn load(
        &self,
        format: &FormatConfig,
        compressor: &ChunkedCompressor,
    ) -> Result<DenseVolume, AssetError> {
        let version = DataAssetVersion::try_from(self.version)
            .map_err(|e| AssetError::Corrupted(e.into()))?;
        let value_flag = ValueConfigFlag::from_bits_retain(self.value_config_flag);
        let material_flag = MaterialConfigFlag::from_bits(self.material_config_flag)
            .ok_or_else(|| {
                AssetError::Corrupted(
                    CodecError::InvalidMaterialConfigFlag(self.material_config_flag).into(),
                )
            })?;

        let data = compressor.decompress(&self.compressed).map_err(|e| {
            tracing::warn!(error = %e, "data asset payload failed to decompress");
            AssetError::DecompressionFailed(e)
        })?;

        let mut reader = ArchiveReader::new(&data);
        let volume = DenseVolume::decode(&mut reader, version, value_flag, material_flag, format)
            .map_err(|e| {
                tracing::warn!(error = %e, ?version, "data asset payload failed to decode");
                AssetError::Corrupted(e.into())
            })?;
        if !reader.is_at_end() {
            tracing::warn!(trailing = reader.remaining(), "data asset payload has trailing bytes");
        }
        Ok(volume)
    }

    /// Loads into `volume`. An empty asset leaves it as is, and so does any
    /// error.
    pub fn load_into(
        &self,
        volume: &mut DenseVolume,
        format: &FormatConfig,
        compressor: &ChunkedCompressor,
    ) -> Result<(), AssetError> {
        if self.is_empty() {
            return Ok(());
        }
        *volume = self.load(format, compressor)?;
        Ok(())
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, AssetError> {
        let mut writer = ArchiveWriter::with_capacity(self.compressed.len() + 24);
        writer.write_bytes(&Self::MAGIC);
        writer.write_i32(self.version);
        writer.write_u32(self.value_config_flag);
        writer.write_u32(self.material_config_flag);
        writer
            .write_array(&self.compressed, CountPrefix::I64)
            .map_err(|e| AssetError::Encode(e.into()))?;
        Ok(writer.into_bytes())
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, AssetError> {
        let mut reader = ArchiveReader::new(bytes);
        read_magic(&mut reader, Self::MAGIC)?;
        let read = |reader: &mut ArchiveReader<'_>| -> Result<Self, PayloadError> {
            Ok(Self {
                version: reader.read_i32()?,
                value_config_flag: reader.read_u32()?,
                material_config_flag: reader.read_u32()?,
                compressed: reader.read_array(CountPrefix::I64)?,
            })
        };
        read(&mut reader).map_err(AssetError::Corrupted)
    }
}
