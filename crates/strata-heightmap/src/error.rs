//! Heightmap error types.

use strata_archive::ArchiveError;
use strata_voxel::CodecError;

/// Errors raised while configuring or (de)serializing a heightmap.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HeightmapError {
    #[error(transparent)]
    Archive(#[from] ArchiveError),
    #[error(transparent)]
    Codec(#[from] CodecError),
    /// Decoded arrays disagree with width × height.
    #[error("shape mismatch: {width}x{height} grid, {what} has {actual} elements")]
    ShapeMismatch {
        /// Which array disagreed.
        what: &'static str,
        width: i64,
        height: i64,
        /// Element count actually decoded.
        actual: u64,
    },
    /// A stored pyramid whose level dimensions do not fit the grid.
    #[error("pyramid mismatch at mip {mip}: expected {expected:?} tiles, found {actual:?}")]
    PyramidMismatch {
        mip: usize,
        expected: (usize, usize),
        actual: (usize, usize),
    },
    /// A stored pyramid with more levels than its grid produces.
    #[error("pyramid has {levels} levels, the grid produces at most {max}")]
    InvalidPyramid { levels: usize, max: usize },
    /// A width or height that is not positive or overflows.
    #[error("invalid heightmap size {width}x{height}")]
    InvalidSize { width: i64, height: i64 },
    /// A stored material kind byte with no meaning.
    #[error("unknown material kind: {0}")]
    UnknownMaterialKind(u8),
    #[error("tile size must be at least 1")]
    InvalidTileSize,
    #[error("pyramid depth must be at least 1")]
    InvalidDepth,
}
