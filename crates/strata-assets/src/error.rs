use strata_archive::ArchiveError;
use strata_compress::CompressError;
use strata_heightmap::HeightmapError;
use strata_voxel::CodecError;

/// Why a payload could not be encoded or decoded.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PayloadError {
    #[error(transparent)]
    Archive(#[from] ArchiveError),
    #[error(transparent)]
    Volume(#[from] CodecError),
    #[error(transparent)]
    Heightmap(#[from] HeightmapError),
}

/// Errors from saving or loading an asset.
///
/// The two corruption variants carry the messages shown to users; the
/// underlying cause is the error source.
#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    /// The compressed payload could not be decompressed.
    #[error("Decompression failed, data is corrupted")]
    DecompressionFailed(#[source] CompressError),
    /// The decompressed payload could not be deserialized.
    #[error("Serialization failed, data is corrupted")]
    Corrupted(#[source] PayloadError),
    /// The store could not be serialized.
    #[error("failed to serialize asset payload")]
    Encode(#[source] PayloadError),
    /// The serialized store could not be compressed.
    #[error("failed to compress asset payload")]
    Compression(#[source] CompressError),
    /// A container that does not start with the expected magic.
    #[error("invalid asset magic: expected {expected:?}, found {found:?}")]
    InvalidMagic {
        expected: [u8; 4],
        found: [u8; 4],
    },
}
