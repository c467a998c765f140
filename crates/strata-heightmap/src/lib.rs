//! 2D height grids with a min/max pyramid for fast range queries.
//!
//! [`HeightmapStore`] owns heights (`u16` or `f32`), optional materials, and
//! a [`RangeMipPyramid`] kept in sync on every edit. Range queries over any
//! rectangle cost roughly the rectangle's perimeter instead of its area.

mod error;
mod pyramid;
mod range;
mod sample;
mod store;
mod version;

pub use error::HeightmapError;
pub use pyramid::{Mip, PyramidConfig, RangeMipPyramid};
pub use range::HeightRange;
pub use sample::HeightSample;
pub use store::{HeightmapStore, MaterialKind, SamplerMode};
pub use version::HeightmapVersion;
