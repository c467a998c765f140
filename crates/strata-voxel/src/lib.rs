//! Voxel samples, material records, and the dense volume store.
//!
//! Values are stored as 16-bit densities in memory; on disk they may be 8 or
//! 16 bits wide depending on the [`FormatConfig`] that wrote them. Materials
//! are six byte channels whose on-disk subset is chosen by a
//! [`MaterialConfigFlag`]. Loading code picks the decode path from the
//! stored [`DataAssetVersion`].

mod dense_volume;
mod error;
mod format;
pub mod material;
pub mod material_codec;
pub mod value;
pub mod value_codec;
mod version;

pub use dense_volume::DenseVolume;
pub use error::CodecError;
pub use format::FormatConfig;
pub use material::{Material, MaterialConfigFlag};
pub use value::{Value, Value8, ValueConfigFlag, ValueWidth};
pub use version::{DataAssetVersion, MaterialLayout, ValueLayout};
