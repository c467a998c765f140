//! Append-only archive writer.

use bytemuck::Pod;

use crate::{ArchiveError, CountPrefix};

/// Growable little-endian byte sink.
#[derive(Debug, Default, Clone)]
pub struct ArchiveWriter {
    buf: Vec<u8>,
}

impl ArchiveWriter {
    /// Creates an empty writer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty writer with `capacity` bytes reserved.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: Vec::with_capacity(capacity),
        }
    }

    /// Number of bytes written so far.
    pub fn position(&self) -> usize {
        self.buf.len()
    }

    /// Borrows the bytes written so far.
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Consumes the writer and returns its buffer.
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    pub fn write_u8(&mut self, value: u8) {
        self.buf.push(value);
    }

    pub fn write_i32(&mut self, value: i32) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    pub fn write_u32(&mut self, value: u32) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    pub fn write_i64(&mut self, value: i64) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    pub fn write_u64(&mut self, value: u64) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    /// Appends raw bytes without any length prefix.
    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Writes a count prefix followed by the raw bytes of `values`.
    ///
    /// The element bytes are copied as laid out in memory, which is the
    /// on-disk layout on little-endian hosts.
    pub fn write_array<T: Pod>(
        &mut self,
        values: &[T],
        prefix: CountPrefix,
    ) -> Result<(), ArchiveError> {
        self.write_count(values.len(), prefix)?;
        self.buf.extend_from_slice(bytemuck::cast_slice(values));
        Ok(())
    }

    /// Writes an element count using the given prefix width.
    pub fn write_count(&mut self, len: usize, prefix: CountPrefix) -> Result<(), ArchiveError> {
        match prefix {
            CountPrefix::I32 => {
                let count = i32::try_from(len)
                    .map_err(|_| ArchiveError::CountOverflow { len, prefix: "i32" })?;
                self.write_i32(count);
            }
            CountPrefix::I64 => {
                let count = i64::try_from(len)
                    .map_err(|_| ArchiveError::CountOverflow { len, prefix: "i64" })?;
                self.write_i64(count);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalars_are_little_endian() {
        let mut writer = ArchiveWriter::new();
        writer.write_i32(-1);
        writer.write_u32(0xDEAD_BEEF);
        writer.write_u8(7);
        assert_eq!(
            writer.as_bytes(),
            &[0xFF, 0xFF, 0xFF, 0xFF, 0xEF, 0xBE, 0xAD, 0xDE, 7]
        );
    }

    #[test]
    fn test_array_has_count_prefix() {
        let mut writer = ArchiveWriter::new();
        writer.write_array(&[1u16, 2, 3], CountPrefix::I64).unwrap();
        let bytes = writer.into_bytes();
        assert_eq!(&bytes[..8], &3i64.to_le_bytes());
        assert_eq!(&bytes[8..], &[1, 0, 2, 0, 3, 0]);
    }

    #[test]
    fn test_empty_array_writes_only_count() {
        let mut writer = ArchiveWriter::new();
        writer.write_array::<u8>(&[], CountPrefix::I32).unwrap();
        assert_eq!(writer.position(), 4);
    }
}
