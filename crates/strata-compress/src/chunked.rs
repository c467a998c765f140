//! Chunked compression and the format dispatch on decompression.

use std::io::{Read, Write};

use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use strata_config::CompressionSettings;

use crate::header::{ChunkHeader, HEADER_SIZE, LEGACY_FLAG_SENTINEL, MAX_CHUNK_SIZE, MAX_CHUNKS};
use crate::{CompressError, CompressionLevel, legacy};

/// Splits buffers into independently compressed zlib chunks.
///
/// Chunks are [`MAX_CHUNK_SIZE`] bytes, a format constant the blob does not
/// record. Unit tests shrink it to reach the multi-chunk path without
/// gigabyte buffers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChunkedCompressor {
    level: CompressionLevel,
    max_chunk_size: usize,
}

impl Default for ChunkedCompressor {
    fn default() -> Self {
        Self {
            level: CompressionLevel::DEFAULT,
            max_chunk_size: MAX_CHUNK_SIZE,
        }
    }
}

impl ChunkedCompressor {
    pub fn new(level: CompressionLevel) -> Self {
        Self {
            level,
            ..Self::default()
        }
    }

    /// Overrides the chunk size.
    ///
    /// # Panics
    ///
    /// Panics if `max_chunk_size` is zero or above [`MAX_CHUNK_SIZE`].
    #[cfg(test)]
    pub(crate) fn with_max_chunk_size(mut self, max_chunk_size: usize) -> Self {
        assert!(
            (1..=MAX_CHUNK_SIZE).contains(&max_chunk_size),
            "max chunk size {max_chunk_size} out of range"
        );
        self.max_chunk_size = max_chunk_size;
        self
    }

    /// Builds a compressor from the `compression` config section.
    pub fn from_settings(settings: &CompressionSettings) -> Result<Self, CompressError> {
        Ok(Self::new(CompressionLevel::new(settings.level)?))
    }

    pub fn level(&self) -> CompressionLevel {
        self.level
    }

    pub fn max_chunk_size(&self) -> usize {
        self.max_chunk_size
    }

    /// Compresses `data` into a header-framed blob.
    ///
    /// An empty input yields an empty blob. Any backend failure aborts the
    /// whole call; no partial blob is returned.
    pub fn compress(&self, data: &[u8]) -> Result<Vec<u8>, CompressError> {
        if data.is_empty() {
            return Ok(Vec::new());
        }

        let num_chunks = data.len().div_ceil(self.max_chunk_size);
        if num_chunks > MAX_CHUNKS {
            return Err(CompressError::TooLarge {
                len: data.len() as u64,
                max_chunks: MAX_CHUNKS,
                max_chunk_size: self.max_chunk_size,
            });
        }

        let bound: usize = data
            .chunks(self.max_chunk_size)
            .map(|chunk| compress_bound(chunk.len()))
            .sum();
        let mut out = Vec::with_capacity(HEADER_SIZE + bound);
        out.resize(HEADER_SIZE, 0);

        let mut header = ChunkHeader {
            compressed_size: 0,
            uncompressed_size: data.len() as i64,
            flags: self.level.get() as u32,
            num_chunks: num_chunks as u32,
            chunk_compressed_sizes: [0; MAX_CHUNKS],
        };

        // Chunks are appended in order; the size table is the only framing.
        for (index, chunk) in data.chunks(self.max_chunk_size).enumerate() {
            let start = out.len();
            let mut encoder = ZlibEncoder::new(&mut out, self.level.to_flate());
            encoder.write_all(chunk).map_err(CompressError::Library)?;
            encoder.finish().map_err(CompressError::Library)?;
            let written = out.len() - start;
            header.chunk_compressed_sizes[index] =
                u32::try_from(written).map_err(|_| CompressError::ChunkSizeMismatch {
                    index,
                    expected: u64::from(u32::MAX),
                    actual: written as u64,
                })?;
        }

        header.compressed_size = (out.len() - HEADER_SIZE) as i64;
        out[..HEADER_SIZE].copy_from_slice(&header.to_bytes());

        tracing::debug!(
            uncompressed = data.len(),
            compressed = out.len(),
            chunks = num_chunks,
            "compressed buffer"
        );
        Ok(out)
    }

    /// Decompresses a blob written by [`compress`](Self::compress) or by the
    /// legacy single-shot writer.
    ///
    /// Every header and size check runs before any chunk is trusted. On
    /// error nothing is returned.
    pub fn decompress(&self, blob: &[u8]) -> Result<Vec<u8>, CompressError> {
        if blob.is_empty() {
            return Err(CompressError::Empty);
        }
        if blob.len() < 4 {
            return Err(CompressError::Truncated {
                expected: 4,
                actual: blob.len(),
            });
        }

        let first = i32::from_le_bytes([blob[0], blob[1], blob[2], blob[3]]);
        if first == LEGACY_FLAG_SENTINEL {
            self.decompress_chunked(blob)
        } else {
            tracing::debug!("blob has no chunk header, using legacy decoder");
            legacy::decompress_legacy(blob)
        }
    }

    fn decompress_chunked(&self, blob: &[u8]) -> Result<Vec<u8>, CompressError> {
        let header = ChunkHeader::parse(blob)?;

        let capacity = (MAX_CHUNKS as u64) * (self.max_chunk_size as u64);
        let uncompressed_size = u64::try_from(header.uncompressed_size)
            .ok()
            .filter(|&size| size <= capacity)
            .ok_or(CompressError::InvalidUncompressedSize(header.uncompressed_size))?;

        let mut out = Vec::new();
        out.try_reserve_exact(uncompressed_size as usize)
            .map_err(|_| CompressError::AllocationFailed(uncompressed_size))?;

        let payload = &blob[HEADER_SIZE..];
        let mut consumed = 0usize;
        for (index, &chunk_size) in header.chunk_sizes().iter().enumerate() {
            let remaining = uncompressed_size - out.len() as u64;
            let expected = remaining.min(self.max_chunk_size as u64);
            if expected == 0 {
                return Err(CompressError::ChunkSizeMismatch {
                    index,
                    expected: 0,
                    actual: u64::from(chunk_size),
                });
            }

            let end = consumed + chunk_size as usize;
            if end > payload.len() {
                return Err(CompressError::SizeMismatch {
                    declared: header.compressed_size,
                    actual: end as i64,
                });
            }
            let input = &payload[consumed..end];

            let before = out.len();
            let mut decoder = ZlibDecoder::new(input);
            (&mut decoder)
                .take(expected + 1)
                .read_to_end(&mut out)
                .map_err(CompressError::Library)?;
            let produced = (out.len() - before) as u64;
            if produced != expected {
                return Err(CompressError::ChunkSizeMismatch {
                    index,
                    expected,
                    actual: produced,
                });
            }
            if decoder.total_in() != input.len() as u64 {
                return Err(CompressError::SizeMismatch {
                    declared: i64::from(chunk_size),
                    actual: decoder.total_in() as i64,
                });
            }
            consumed = end;
        }

        if consumed as i64 != header.compressed_size {
            return Err(CompressError::SizeMismatch {
                declared: header.compressed_size,
                actual: consumed as i64,
            });
        }
        if out.len() as u64 != uncompressed_size {
            return Err(CompressError::ChunkSizeMismatch {
                index: header.chunk_sizes().len(),
                expected: uncompressed_size,
                actual: out.len() as u64,
            });
        }

        tracing::debug!(
            compressed = blob.len(),
            uncompressed = out.len(),
            chunks = header.num_chunks,
            "decompressed buffer"
        );
        Ok(out)
    }
}

/// Worst-case zlib output size for `len` input bytes (zlib's `compressBound`).
fn compress_bound(len: usize) -> usize {
    len + (len >> 12) + (len >> 14) + (len >> 25) + 13
}

/// Compresses with the default chunk size.
pub fn compress(data: &[u8], level: CompressionLevel) -> Result<Vec<u8>, CompressError> {
    ChunkedCompressor::new(level).compress(data)
}

/// Decompresses with the default chunk size.
pub fn decompress(blob: &[u8]) -> Result<Vec<u8>, CompressError> {
    ChunkedCompressor::default().decompress(blob)
}

/// What [`inspect`] found at the start of a blob.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BlobInfo {
    /// A validated chunked-format header.
    Chunked(ChunkHeader),
    /// A legacy blob.
    Legacy {
        /// Leading `i32` uncompressed size.
        uncompressed_size: i32,
        /// Trailing flags byte.
        flags: u8,
    },
}

/// Reads a blob's framing without decompressing anything.
pub fn inspect(blob: &[u8]) -> Result<BlobInfo, CompressError> {
    if blob.is_empty() {
        return Err(CompressError::Empty);
    }
    if blob.len() >= 4 && blob[..4] == LEGACY_FLAG_SENTINEL.to_le_bytes() {
        return ChunkHeader::parse(blob).map(BlobInfo::Chunked);
    }
    let (uncompressed_size, flags) = legacy::parse_legacy_framing(blob)?;
    Ok(BlobInfo::Legacy {
        uncompressed_size,
        flags,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{Rng, SeedableRng};
    use rand_chacha::ChaCha8Rng;

    fn terrain_like(len: usize) -> Vec<u8> {
        (0..len).map(|i| ((i / 97) % 7) as u8).collect()
    }

    fn random_bytes(len: usize, seed: u64) -> Vec<u8> {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let mut data = vec![0u8; len];
        rng.fill(&mut data[..]);
        data
    }

    #[test]
    fn test_roundtrip_small_every_level() {
        let data = terrain_like(10_000);
        for level in -1..=9 {
            let compressor = ChunkedCompressor::new(CompressionLevel::new(level).unwrap());
            let blob = compressor.compress(&data).unwrap();
            let restored = compressor.decompress(&blob).unwrap();
            assert_eq!(restored, data, "roundtrip failed at level {level}");
        }
    }

    #[test]
    fn test_roundtrip_multi_chunk() {
        let chunk = 4096;
        let data = random_bytes(chunk * 5 / 2, 7);
        let compressor = ChunkedCompressor::default().with_max_chunk_size(chunk);
        let blob = compressor.compress(&data).unwrap();

        let header = ChunkHeader::parse(&blob).unwrap();
        assert_eq!(header.num_chunks, 3);
        assert_eq!(compressor.decompress(&blob).unwrap(), data);
    }

    #[test]
    fn test_exact_multiple_of_chunk_size() {
        let data = terrain_like(3 * 1024);
        let compressor = ChunkedCompressor::default().with_max_chunk_size(1024);
        let blob = compressor.compress(&data).unwrap();
        assert_eq!(ChunkHeader::parse(&blob).unwrap().num_chunks, 3);
        assert_eq!(compressor.decompress(&blob).unwrap(), data);
    }

    #[test]
    fn test_chunk_boundaries_do_not_change_content() {
        let data = random_bytes(10_000, 99);
        for chunk in [1000, 3333, 10_000] {
            let compressor = ChunkedCompressor::default().with_max_chunk_size(chunk);
            let blob = compressor.compress(&data).unwrap();
            assert_eq!(compressor.decompress(&blob).unwrap(), data, "chunk size {chunk}");
        }
    }

    #[test]
    fn test_empty_input() {
        let compressor = ChunkedCompressor::default();
        assert!(compressor.compress(&[]).unwrap().is_empty());
        assert!(matches!(
            compressor.decompress(&[]),
            Err(CompressError::Empty)
        ));
    }

    #[test]
    fn test_header_integrity() {
        let data = random_bytes(9_000, 3);
        let compressor = ChunkedCompressor::default().with_max_chunk_size(2048);
        let blob = compressor.compress(&data).unwrap();
        let header = ChunkHeader::parse(&blob).unwrap();

        assert_eq!(header.compressed_size, (blob.len() - HEADER_SIZE) as i64);
        let sum: i64 = header.chunk_sizes().iter().map(|&s| i64::from(s)).sum();
        assert_eq!(sum, header.compressed_size);
        assert_eq!(header.uncompressed_size, 9_000);
    }

    #[test]
    fn test_too_large_input_is_rejected() {
        let data = vec![0u8; MAX_CHUNKS * 16 + 1];
        let compressor = ChunkedCompressor::default().with_max_chunk_size(16);
        assert!(matches!(
            compressor.compress(&data),
            Err(CompressError::TooLarge { .. })
        ));
    }

    #[test]
    fn test_flipped_magic_is_rejected() {
        let mut blob = compress(&terrain_like(5000), CompressionLevel::DEFAULT).unwrap();
        blob[5] ^= 0xFF;
        assert!(matches!(
            decompress(&blob),
            Err(CompressError::InvalidMagic(_))
        ));
    }

    #[test]
    fn test_truncated_blob_is_rejected() {
        let blob = compress(&terrain_like(5000), CompressionLevel::DEFAULT).unwrap();
        let truncated = &blob[..blob.len() - 1];
        assert!(matches!(
            decompress(truncated),
            Err(CompressError::SizeMismatch { .. })
        ));
    }

    #[test]
    fn test_chunk_count_over_limit_is_rejected() {
        let mut blob = compress(&terrain_like(5000), CompressionLevel::DEFAULT).unwrap();
        blob[28..32].copy_from_slice(&(MAX_CHUNKS as u32 + 1).to_le_bytes());
        assert!(matches!(
            decompress(&blob),
            Err(CompressError::TooManyChunks(_))
        ));
    }

    #[test]
    fn test_corrupted_chunk_table_is_rejected() {
        let data = random_bytes(6000, 11);
        let compressor = ChunkedCompressor::default().with_max_chunk_size(2000);
        let mut blob = compressor.compress(&data).unwrap();
        // Move one byte from chunk 0 to chunk 1: totals still match, chunks do not.
        let mut header = ChunkHeader::parse(&blob).unwrap();
        header.chunk_compressed_sizes[0] -= 1;
        header.chunk_compressed_sizes[1] += 1;
        blob[..HEADER_SIZE].copy_from_slice(&header.to_bytes());
        assert!(compressor.decompress(&blob).is_err());
    }

    #[test]
    fn test_mismatched_chunk_size_is_detected() {
        let data = terrain_like(5000);
        let blob = ChunkedCompressor::default()
            .with_max_chunk_size(1000)
            .compress(&data)
            .unwrap();
        let result = ChunkedCompressor::default()
            .with_max_chunk_size(2000)
            .decompress(&blob);
        assert!(
            matches!(result, Err(CompressError::ChunkSizeMismatch { .. })),
            "got {result:?}"
        );
    }

    #[test]
    fn test_oversized_uncompressed_size_is_rejected_before_allocating() {
        let mut blob = compress(&terrain_like(100), CompressionLevel::DEFAULT).unwrap();
        blob[16..24].copy_from_slice(&i64::MAX.to_le_bytes());
        assert!(matches!(
            decompress(&blob),
            Err(CompressError::InvalidUncompressedSize(_))
        ));
    }

    #[test]
    fn test_from_settings_validates() {
        let settings = CompressionSettings { level: 9 };
        let compressor = ChunkedCompressor::from_settings(&settings).unwrap();
        assert_eq!(compressor.level(), CompressionLevel::BEST_COMPRESSION);
        assert_eq!(compressor.max_chunk_size(), MAX_CHUNK_SIZE, "chunk size is fixed by the format");

        let bad = CompressionSettings { level: 12 };
        assert!(matches!(
            ChunkedCompressor::from_settings(&bad),
            Err(CompressError::InvalidLevel(12))
        ));
    }

    #[test]
    fn test_inspect_reports_header() {
        let blob = compress(&terrain_like(3000), CompressionLevel::BEST_SPEED).unwrap();
        match inspect(&blob).unwrap() {
            BlobInfo::Chunked(header) => {
                assert_eq!(header.uncompressed_size, 3000);
                assert_eq!(header.flags, 1);
            }
            other => panic!("expected chunked header, got {other:?}"),
        }
    }
}
