//! Persisted asset containers.
//!
//! An asset is a format version, the flags its payload was written under,
//! and the payload itself: a serialized store run through the
//! [`ChunkedCompressor`](strata_compress::ChunkedCompressor). Saving always
//! writes the latest version; loading picks the decode path from whatever
//! version and flags were stored.

mod data_asset;
mod error;
mod heightmap_asset;

pub use data_asset::DataAsset;
pub use error::{AssetError, PayloadError};
pub use heightmap_asset::HeightmapAsset;

use strata_archive::ArchiveReader;

fn read_magic(reader: &mut ArchiveReader<'_>, expected: [u8; 4]) -> Result<(), AssetError> {
    let found = reader.read_bytes(4).map_err(|e| AssetError::Corrupted(e.into()))?;
    if found != expected {
        reader.set_error();
        let mut magic = [0; 4];
        magic.copy_from_slice(found);
        return Err(AssetError::InvalidMagic {
            expected,
            found: magic,
        });
    }
    Ok(())
}
