//! Archive error types.

/// Errors raised while reading from an [`ArchiveReader`](crate::ArchiveReader)
/// or writing to an [`ArchiveWriter`](crate::ArchiveWriter).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ArchiveError {
    /// A read needed more bytes than remain in the archive.
    #[error("unexpected end of archive: needed {needed} bytes, {remaining} remaining")]
    UnexpectedEof {
        /// Bytes required by the read.
        needed: u64,
        /// Bytes left after the cursor.
        remaining: u64,
    },
    /// A stored element count was negative.
    #[error("negative element count: {0}")]
    NegativeCount(i64),
    /// An array is too long for the count prefix chosen by the format.
    #[error("array of {len} elements does not fit a {prefix} count")]
    CountOverflow {
        /// Number of elements in the array.
        len: usize,
        /// Name of the prefix width (`"i32"` or `"i64"`).
        prefix: &'static str,
    },
    /// A stored format version is newer than (or unknown to) this build.
    #[error("unknown {format} version: {version}")]
    UnknownVersion {
        /// Name of the versioned format.
        format: &'static str,
        /// The raw stored version number.
        version: i32,
    },
    /// The archive was already marked as errored by an earlier failure.
    #[error("archive is in an error state")]
    Errored,
}
