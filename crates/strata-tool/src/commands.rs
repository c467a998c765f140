//! Subcommand implementations, kept free of argument parsing.

use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use strata_compress::legacy::{
    COMPRESS_BIAS_MEMORY, COMPRESS_BIAS_SPEED, LegacyCodec, OPTIONS_FLAGS_MASK,
};
use strata_compress::{BlobInfo, ChunkedCompressor, CompressError, HEADER_SIZE};
use strata_config::CompressionSettings;

#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{path}: {source}")]
    Compress {
        path: PathBuf,
        #[source]
        source: CompressError,
    },
}

/// Byte counts on both sides of a conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Report {
    pub input_len: usize,
    pub output_len: usize,
}

fn read(path: &Path) -> Result<Vec<u8>, ToolError> {
    fs::read(path).map_err(|source| ToolError::Read {
        path: path.to_path_buf(),
        source,
    })
}

fn write(path: &Path, bytes: &[u8]) -> Result<(), ToolError> {
    fs::write(path, bytes).map_err(|source| ToolError::Write {
        path: path.to_path_buf(),
        source,
    })
}

pub fn compress_file(
    input: &Path,
    output: &Path,
    settings: &CompressionSettings,
    level: Option<i32>,
) -> Result<Report, ToolError> {
    let settings = CompressionSettings {
        level: level.unwrap_or(settings.level),
    };
    let wrap = |source| ToolError::Compress {
        path: input.to_path_buf(),
        source,
    };
    let compressor = ChunkedCompressor::from_settings(&settings).map_err(wrap)?;

    let data = read(input)?;
    let blob = compressor.compress(&data).map_err(wrap)?;
    write(output, &blob)?;
    Ok(Report {
        input_len: data.len(),
        output_len: blob.len(),
    })
}

pub fn decompress_file(input: &Path, output: &Path) -> Result<Report, ToolError> {
    let blob = read(input)?;
    let data = strata_compress::decompress(&blob).map_err(|source| ToolError::Compress {
        path: input.to_path_buf(),
        source,
    })?;
    write(output, &data)?;
    Ok(Report {
        input_len: blob.len(),
        output_len: data.len(),
    })
}

/// A human-readable summary of a blob's framing.
pub fn inspect_file(path: &Path) -> Result<String, ToolError> {
    let blob = read(path)?;
    let info = strata_compress::inspect(&blob).map_err(|source| ToolError::Compress {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(describe(&info, blob.len()))
}

fn describe(info: &BlobInfo, blob_len: usize) -> String {
    let mut out = String::new();
    match info {
        BlobInfo::Chunked(header) => {
            let _ = writeln!(out, "format:            chunked");
            let _ = writeln!(out, "blob size:         {blob_len}");
            let _ = writeln!(out, "header size:       {HEADER_SIZE}");
            let _ = writeln!(out, "compressed size:   {}", header.compressed_size);
            let _ = writeln!(out, "uncompressed size: {}", header.uncompressed_size);
            let _ = writeln!(out, "level hint:        {}", header.flags as i32);
            let _ = writeln!(out, "chunks:            {}", header.num_chunks);
            for (index, size) in header.chunk_sizes().iter().enumerate() {
                let _ = writeln!(out, "  chunk {index:>2}: {size} bytes");
            }
        }
        BlobInfo::Legacy {
            uncompressed_size,
            flags,
        } => {
            let codec = LegacyCodec::from_flags(*flags).map_or("unknown", LegacyCodec::name);
            let bias = match flags & OPTIONS_FLAGS_MASK {
                COMPRESS_BIAS_MEMORY => "memory",
                COMPRESS_BIAS_SPEED => "speed",
                0 => "none",
                _ => "mixed",
            };
            let _ = writeln!(out, "format:            legacy");
            let _ = writeln!(out, "blob size:         {blob_len}");
            let _ = writeln!(out, "uncompressed size: {uncompressed_size}");
            let _ = writeln!(out, "codec:             {codec} (flags {flags:#04x})");
            let _ = writeln!(out, "bias:              {bias}");
        }
    }
    out
}
