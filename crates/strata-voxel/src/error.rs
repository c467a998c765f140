//! Codec error types.

use strata_archive::ArchiveError;

/// Errors raised while encoding or decoding voxel data.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CodecError {
    /// The underlying archive read or write failed.
    #[error(transparent)]
    Archive(#[from] ArchiveError),
    /// A value config flag with both or neither width bit set.
    #[error("invalid value config flag: 0x{0:X}")]
    InvalidValueConfigFlag(u32),
    /// A material config flag carrying unknown bits.
    #[error("invalid material config flag: 0x{0:X}")]
    InvalidMaterialConfigFlag(u32),
    /// Decoded arrays disagree with the declared grid size.
    #[error("shape mismatch: size implies {expected} elements, {what} has {actual}")]
    ShapeMismatch {
        /// Which array disagreed.
        what: &'static str,
        /// Element count implied by the grid size.
        expected: u64,
        /// Element count actually decoded.
        actual: u64,
    },
    /// A declared grid size that is negative or overflows.
    #[error("invalid volume size {0:?}")]
    InvalidSize([i32; 3]),
    /// A record count larger than the grid it belongs to.
    #[error("{count} records declared, the grid holds at most {max}")]
    TooManyRecords {
        /// Declared record count.
        count: u64,
        /// Largest count the caller accepts.
        max: u64,
    },
}
