//! Fixed-size header of the chunked blob format.
//!
//! ## Binary Layout
//!
//! | Offset | Size | Field |
//! |--------|------|-------|
//! | 0 | 4 | Legacy flag sentinel (`i32`, always `-1`) |
//! | 4 | 4 | Magic (`u32`, `0xDEADBEEF`) |
//! | 8 | 8 | Compressed size (`i64`, bytes after the header) |
//! | 16 | 8 | Uncompressed size (`i64`) |
//! | 24 | 4 | Flags (`u32`, compression level hint, ignored by readers) |
//! | 28 | 4 | Chunk count (`u32`) |
//! | 32 | 4×16 | Compressed size of each chunk (`u32`, first `count` meaningful) |
//!
//! All fields are little-endian. The concatenated chunks follow immediately.

use crate::CompressError;

/// Value of the first header field. Legacy blobs start with their `i32`
/// uncompressed size, which can never be negative, so `-1` tells the two
/// formats apart.
pub const LEGACY_FLAG_SENTINEL: i32 = -1;

pub const MAGIC: u32 = 0xDEAD_BEEF;

/// Capacity of the per-chunk size table. This is a hard format limit.
pub const MAX_CHUNKS: usize = 16;

/// Largest chunk handed to a single zlib call.
pub const MAX_CHUNK_SIZE: usize = i32::MAX as usize;

/// Encoded size of [`ChunkHeader`] in bytes.
pub const HEADER_SIZE: usize = 4 + 4 + 8 + 8 + 4 + 4 + 4 * MAX_CHUNKS;

/// Decoded chunked-format header.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChunkHeader {
    /// Total bytes of compressed chunk data after the header.
    pub compressed_size: i64,
    /// Length of the original buffer.
    pub uncompressed_size: i64,
    /// Writer-side hint, currently the compression level.
    pub flags: u32,
    /// Number of meaningful entries in `chunk_compressed_sizes`.
    pub num_chunks: u32,
    /// Compressed size of each chunk, in order.
    pub chunk_compressed_sizes: [u32; MAX_CHUNKS],
}

impl ChunkHeader {
    /// Compressed sizes of the chunks actually present.
    ///
    /// Clamped to the table capacity so a corrupted count never indexes
    /// past the array.
    pub fn chunk_sizes(&self) -> &[u32] {
        let count = (self.num_chunks as usize).min(MAX_CHUNKS);
        &self.chunk_compressed_sizes[..count]
    }

    /// Serializes the header into exactly [`HEADER_SIZE`] bytes.
    pub fn to_bytes(&self) -> [u8; HEADER_SIZE] {
        let mut out = [0u8; HEADER_SIZE];
        out[0..4].copy_from_slice(&LEGACY_FLAG_SENTINEL.to_le_bytes());
        out[4..8].copy_from_slice(&MAGIC.to_le_bytes());
        out[8..16].copy_from_slice(&self.compressed_size.to_le_bytes());
        out[16..24].copy_from_slice(&self.uncompressed_size.to_le_bytes());
        out[24..28].copy_from_slice(&self.flags.to_le_bytes());
        out[28..32].copy_from_slice(&self.num_chunks.to_le_bytes());
        for (i, size) in self.chunk_compressed_sizes.iter().enumerate() {
            let offset = 32 + i * 4;
            out[offset..offset + 4].copy_from_slice(&size.to_le_bytes());
        }
        out
    }

    /// Parses and validates the header at the start of `blob`.
    ///
    /// Checks the sentinel, the magic, the chunk count limit, and that the
    /// declared compressed size equals the bytes following the header.
    pub fn parse(blob: &[u8]) -> Result<Self, CompressError> {
        if blob.len() < HEADER_SIZE {
            return Err(CompressError::Truncated {
                expected: HEADER_SIZE,
                actual: blob.len(),
            });
        }

        let sentinel = i32::from_le_bytes(field(blob, 0));
        if sentinel != LEGACY_FLAG_SENTINEL {
            return Err(CompressError::InvalidMagic(sentinel as u32));
        }
        let magic = u32::from_le_bytes(field(blob, 4));
        if magic != MAGIC {
            return Err(CompressError::InvalidMagic(magic));
        }

        let compressed_size = i64::from_le_bytes(field(blob, 8));
        let uncompressed_size = i64::from_le_bytes(field(blob, 16));
        let flags = u32::from_le_bytes(field(blob, 24));
        let num_chunks = u32::from_le_bytes(field(blob, 28));

        if num_chunks as usize > MAX_CHUNKS {
            return Err(CompressError::TooManyChunks(num_chunks));
        }

        let payload = (blob.len() - HEADER_SIZE) as i64;
        if compressed_size != payload {
            return Err(CompressError::SizeMismatch {
                declared: compressed_size,
                actual: payload,
            });
        }

        let mut chunk_compressed_sizes = [0u32; MAX_CHUNKS];
        for (i, size) in chunk_compressed_sizes.iter_mut().enumerate() {
            *size = u32::from_le_bytes(field(blob, 32 + i * 4));
        }

        Ok(Self {
            compressed_size,
            uncompressed_size,
            flags,
            num_chunks,
            chunk_compressed_sizes,
        })
    }
}

fn field<const N: usize>(blob: &[u8], offset: usize) -> [u8; N] {
    let mut out = [0u8; N];
    out.copy_from_slice(&blob[offset..offset + N]);
    out
}
