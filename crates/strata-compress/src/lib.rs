//! Chunked zlib compression for large persisted voxel payloads.
//!
//! A single zlib call only addresses buffers up to `i32::MAX` bytes, so
//! payloads are split into at most [`MAX_CHUNKS`] independently compressed
//! chunks framed by a fixed [`ChunkHeader`]. Blobs written before the chunked
//! format existed carry no header and are still decoded by [`legacy`].

mod chunked;
mod error;
mod header;
pub mod legacy;
mod level;

pub use chunked::{BlobInfo, ChunkedCompressor, compress, decompress, inspect};
pub use error::CompressError;
pub use header::{
    ChunkHeader, HEADER_SIZE, LEGACY_FLAG_SENTINEL, MAGIC, MAX_CHUNK_SIZE, MAX_CHUNKS,
};
pub use level::CompressionLevel;
