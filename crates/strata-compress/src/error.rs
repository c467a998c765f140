//! Compression error types.

/// Errors produced while compressing or decompressing a blob.
#[derive(Debug, thiserror::Error)]
pub enum CompressError {
    /// `decompress` was handed an empty blob.
    #[error("compressed blob is empty")]
    Empty,
    /// The blob ends before a structure it must contain.
    #[error("blob truncated: expected at least {expected} bytes, got {actual}")]
    Truncated {
        /// Minimum byte count required.
        expected: usize,
        /// Actual blob length.
        actual: usize,
    },
    /// The header magic is not [`MAGIC`](crate::MAGIC).
    #[error("invalid header magic: 0x{0:08X}")]
    InvalidMagic(u32),
    /// The header's compressed size disagrees with the payload length.
    #[error("compressed size mismatch: header declares {declared} bytes, payload has {actual}")]
    SizeMismatch {
        /// `ChunkHeader::compressed_size`.
        declared: i64,
        /// Bytes following the header (or consumed by the chunks).
        actual: i64,
    },
    /// The header declares more chunks than the format can hold.
    #[error("header declares {0} chunks, more than the chunk table holds")]
    TooManyChunks(u32),
    /// The declared uncompressed size is negative or beyond what the chunk
    /// table can describe.
    #[error("invalid uncompressed size: {0}")]
    InvalidUncompressedSize(i64),
    /// A chunk decompressed to a different length than its slot requires.
    #[error("chunk {index} decompressed to {actual} bytes, expected {expected}")]
    ChunkSizeMismatch {
        /// Position of the chunk in the table.
        index: usize,
        /// Bytes the chunk had to produce.
        expected: u64,
        /// Bytes it produced (or consumed, for trailing input).
        actual: u64,
    },
    /// The input is too large to fit in [`MAX_CHUNKS`](crate::MAX_CHUNKS) chunks.
    #[error("{len} bytes do not fit in {max_chunks} chunks of {max_chunk_size} bytes")]
    TooLarge {
        /// Input length.
        len: u64,
        /// Chunk table capacity.
        max_chunks: usize,
        /// Configured chunk size.
        max_chunk_size: usize,
    },
    /// The output buffer could not be allocated.
    #[error("failed to allocate {0} bytes for decompressed data")]
    AllocationFailed(u64),
    /// A compression level outside `-1..=9`.
    #[error("invalid compression level: {0}")]
    InvalidLevel(i32),
    /// The trailing flags byte of a legacy blob names no known codec.
    #[error("unknown legacy compression flags: 0x{0:02X}")]
    UnknownLegacyCodec(u8),
    /// The legacy codec is known but has no implementation available.
    #[error("legacy codec {0} is not available")]
    UnsupportedLegacyCodec(&'static str),
    /// The zlib/gzip backend reported a failure.
    #[error("compression library error: {0}")]
    Library(#[source] std::io::Error),
}
