//! Single-shot format written before chunking existed.
//!
//! ## Binary Layout
//!
//! | Offset | Size | Field |
//! |--------|------|-------|
//! | 0 | 4 | Uncompressed size (`i32`, never negative) |
//! | 4 | N | Compressed stream |
//! | 4+N | 1 | Compression flags |
//!
//! The low nibble of the flags byte names the codec, the high nibble carries
//! option bits (memory/speed bias) that only influenced the encoder.

use std::io::{Read, Write};

use flate2::Compression;
use flate2::read::{GzDecoder, ZlibDecoder};
use flate2::write::{GzEncoder, ZlibEncoder};

use crate::CompressError;

pub const COMPRESS_NONE: u8 = 0x00;
pub const COMPRESS_ZLIB: u8 = 0x01;
pub const COMPRESS_GZIP: u8 = 0x02;
pub const COMPRESS_CUSTOM: u8 = 0x04;

pub const FORMAT_FLAGS_MASK: u8 = 0x0F;
pub const OPTIONS_FLAGS_MASK: u8 = 0xF0;

pub const COMPRESS_BIAS_MEMORY: u8 = 0x10;
pub const COMPRESS_BIAS_SPEED: u8 = 0x20;

/// Smallest possible legacy blob: size prefix plus flags byte.
const MIN_LEGACY_LEN: usize = 5;

/// Codec named by the low nibble of a legacy flags byte.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LegacyCodec {
    Zlib,
    Gzip,
    /// Proprietary codec; recognised but not decodable here.
    Custom,
}

impl LegacyCodec {
    pub fn from_flags(flags: u8) -> Result<Self, CompressError> {
        match flags & FORMAT_FLAGS_MASK {
            COMPRESS_ZLIB => Ok(Self::Zlib),
            COMPRESS_GZIP => Ok(Self::Gzip),
            COMPRESS_CUSTOM => Ok(Self::Custom),
            _ => Err(CompressError::UnknownLegacyCodec(flags)),
        }
    }

    pub fn flag(self) -> u8 {
        match self {
            Self::Zlib => COMPRESS_ZLIB,
            Self::Gzip => COMPRESS_GZIP,
            Self::Custom => COMPRESS_CUSTOM,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Zlib => "zlib",
            Self::Gzip => "gzip",
            Self::Custom => "Oodle",
        }
    }
}

/// Splits a legacy blob into its uncompressed size and flags byte.
pub fn parse_legacy_framing(blob: &[u8]) -> Result<(i32, u8), CompressError> {
    if blob.len() < MIN_LEGACY_LEN {
        return Err(CompressError::Truncated {
            expected: MIN_LEGACY_LEN,
            actual: blob.len(),
        });
    }
    let size = i32::from_le_bytes([blob[0], blob[1], blob[2], blob[3]]);
    if size < 0 {
        return Err(CompressError::InvalidUncompressedSize(i64::from(size)));
    }
    Ok((size, blob[blob.len() - 1]))
}

/// Decodes a legacy blob.
pub fn decompress_legacy(blob: &[u8]) -> Result<Vec<u8>, CompressError> {
    let (size, flags) = parse_legacy_framing(blob)?;
    let codec = LegacyCodec::from_flags(flags)?;
    let stream = &blob[4..blob.len() - 1];
    let expected = size as u64;

    let mut out = Vec::new();
    out.try_reserve_exact(size as usize)
        .map_err(|_| CompressError::AllocationFailed(expected))?;

    match codec {
        LegacyCodec::Zlib => read_bounded(ZlibDecoder::new(stream), expected, &mut out)?,
        LegacyCodec::Gzip => read_bounded(GzDecoder::new(stream), expected, &mut out)?,
        LegacyCodec::Custom => {
            return Err(CompressError::UnsupportedLegacyCodec(codec.name()));
        }
    }

    if out.len() as u64 != expected {
        return Err(CompressError::ChunkSizeMismatch {
            index: 0,
            expected,
            actual: out.len() as u64,
        });
    }

    tracing::debug!(codec = codec.name(), size, "decoded legacy blob");
    Ok(out)
}

fn read_bounded(reader: impl Read, expected: u64, out: &mut Vec<u8>) -> Result<(), CompressError> {
    reader
        .take(expected + 1)
        .read_to_end(out)
        .map_err(CompressError::Library)?;
    Ok(())
}

/// Encodes `data` in the legacy format. Kept for fixtures and for tools
/// that must produce files readable by old builds.
pub fn compress_legacy(
    data: &[u8],
    codec: LegacyCodec,
    options: u8,
) -> Result<Vec<u8>, CompressError> {
    let size = i32::try_from(data.len()).map_err(|_| CompressError::TooLarge {
        len: data.len() as u64,
        max_chunks: 1,
        max_chunk_size: i32::MAX as usize,
    })?;

    let mut out = Vec::with_capacity(data.len() / 2 + 16);
    out.extend_from_slice(&size.to_le_bytes());

    let level = if options & COMPRESS_BIAS_SPEED != 0 {
        Compression::fast()
    } else if options & COMPRESS_BIAS_MEMORY != 0 {
        Compression::best()
    } else {
        Compression::default()
    };

    match codec {
        LegacyCodec::Zlib => {
            let mut encoder = ZlibEncoder::new(&mut out, level);
            encoder.write_all(data).map_err(CompressError::Library)?;
            encoder.finish().map_err(CompressError::Library)?;
        }
        LegacyCodec::Gzip => {
            let mut encoder = GzEncoder::new(&mut out, level);
            encoder.write_all(data).map_err(CompressError::Library)?;
            encoder.finish().map_err(CompressError::Library)?;
        }
        LegacyCodec::Custom => {
            return Err(CompressError::UnsupportedLegacyCodec(codec.name()));
        }
    }

    out.push(codec.flag() | (options & OPTIONS_FLAGS_MASK));
    Ok(out)
}
