//! Heightmap assets.
//!
//! ## Container Layout
//!
//! | Size | Field |
//! |------|-------|
//! | 4 | Magic `"SHGT"` |
//! | 4 | Heightmap version (`i32`) |
//! | 4 | Material config flag (`u32`) |
//! | 8 + N | Compressed payload (`i64` length + bytes) |

use std::marker::PhantomData;

use strata_archive::{ArchiveReader, ArchiveWriter, CountPrefix};
use strata_compress::ChunkedCompressor;
use strata_heightmap::{HeightSample, HeightmapStore, HeightmapVersion, PyramidConfig};
use strata_voxel::{CodecError, FormatConfig, MaterialConfigFlag};

use crate::{AssetError, PayloadError, read_magic};

/// A compressed [`HeightmapStore`] with the version and material flag it was
/// saved under.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct HeightmapAsset<T> {
    pub version: i32,
    pub material_config_flag: u32,
    pub compressed: Vec<u8>,
    _sample: PhantomData<fn() -> T>,
}

impl<T: HeightSample> HeightmapAsset<T> {
    pub const MAGIC: [u8; 4] = *b"SHGT";

    pub fn new(version: i32, material_config_flag: u32, compressed: Vec<u8>) -> Self {
        Self {
            version,
            material_config_flag,
            compressed,
            _sample: PhantomData,
        }
    }

    pub fn save(
        store: &HeightmapStore<T>,
        format: &FormatConfig,
        compressor: &ChunkedCompressor,
    ) -> Result<Self, AssetError> {
        let mut writer = ArchiveWriter::with_capacity(store.allocated_size() + 64);
        store
            .save(&mut writer, format)
            .map_err(|e| AssetError::Encode(e.into()))?;
        let compressed = compressor
            .compress(writer.as_bytes())
            .map_err(AssetError::Compression)?;

        tracing::debug!(
            width = store.width(),
            height = store.height(),
            compressed = compressed.len(),
            "saved heightmap asset"
        );
        Ok(Self::new(
            HeightmapVersion::LATEST.as_i32(),
            format.material_flag.bits(),
            compressed,
        ))
    }

    pub fn is_empty(&self) -> bool {
        self.compressed.is_empty()
    }

    /// Decompresses and decodes the stored heightmap.
    ///
    /// The flag is true when the asset predates stored pyramids and should
    /// be saved again.
    pub fn load(
        &self,
        format: &FormatConfig,
        compressor: &ChunkedCompressor,
        pyramid_config: PyramidConfig,
    ) -> Result<(HeightmapStore<T>, bool), AssetError> {
        let (version, material_flag, data) = self.unpack(compressor)?;
        let mut reader = ArchiveReader::new(&data);
        let loaded =
            HeightmapStore::decode(&mut reader, version, material_flag, format, pyramid_config)
                .map_err(|e| {
                    tracing::warn!(error = %e, ?version, "heightmap payload failed to decode");
                    AssetError::Corrupted(e.into())
                })?;
        if loaded.1 {
            tracing::warn!(?version, "heightmap asset should be resaved");
        }
        Ok(loaded)
    }

    /// Loads into `store`, keeping its pyramid configuration. An empty asset
    /// leaves it as is, and so does any error.
    pub fn load_into(
        &self,
        store: &mut HeightmapStore<T>,
        format: &FormatConfig,
        compressor: &ChunkedCompressor,
    ) -> Result<bool, AssetError> {
        if self.is_empty() {
            return Ok(false);
        }
        let (loaded, needs_resave) = self.load(format, compressor, store.pyramid().config())?;
        *store = loaded;
        Ok(needs_resave)
    }

    fn unpack(
        &self,
        compressor: &ChunkedCompressor,
    ) -> Result<(HeightmapVersion, MaterialConfigFlag, Vec<u8>), AssetError> {
        let version = HeightmapVersion::try_from(self.version)
            .map_err(|e| AssetError::Corrupted(e.into()))?;
        let material_flag = MaterialConfigFlag::from_bits(self.material_config_flag)
            .ok_or_else(|| {
                AssetError::Corrupted(
                    CodecError::InvalidMaterialConfigFlag(self.material_config_flag).into(),
                )
            })?;
        let data = compressor.decompress(&self.compressed).map_err(|e| {
            tracing::warn!(error = %e, "heightmap payload failed to decompress");
            AssetError::DecompressionFailed(e)
        })?;
        Ok((version, material_flag, data))
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, AssetError> {
        let mut writer = ArchiveWriter::with_capacity(self.compressed.len() + 20);
        writer.write_bytes(&Self::MAGIC);
        writer.write_i32(self.version);
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
            let version = reader.read_i32()?;
            let flag = reader.read_u32()?;
            Ok(Self::new(version, flag, reader.read_array(CountPrefix::I64)?))
        };
        read(&mut reader).map_err(AssetError::Corrupted)
    }
}
