//! Cursor-based archive reader with a sticky error flag.

use bytemuck::{Pod, Zeroable};

use crate::{ArchiveError, CountPrefix};

/// Reads little-endian fields from a borrowed byte slice.
///
/// Any failed read sets the error flag. Once set, every subsequent read
/// returns [`ArchiveError::Errored`], so callers can check a whole load with
/// a single [`is_error`](Self::is_error) at the end.
#[derive(Debug, Clone)]
pub struct ArchiveReader<'a> {
    data: &'a [u8],
    pos: usize,
    error: bool,
}

impl<'a> ArchiveReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            pos: 0,
            error: false,
        }
    }

    /// Current cursor offset from the start of the slice.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Bytes left after the cursor.
    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    /// Total length of the underlying slice.
    pub fn total_size(&self) -> usize {
        self.data.len()
    }

    pub fn is_at_end(&self) -> bool {
        self.pos == self.data.len()
    }

    /// Marks the archive as errored. Used by decoders that detect a
    /// semantic problem (like a shape mismatch) after the bytes read fine.
    pub fn set_error(&mut self) {
        self.error = true;
    }

    pub fn is_error(&self) -> bool {
        self.error
    }

    /// Borrows the next `len` bytes and advances past them.
    pub fn read_bytes(&mut self, len: usize) -> Result<&'a [u8], ArchiveError> {
        if self.error {
            return Err(ArchiveError::Errored);
        }
        if len > self.remaining() {
            self.error = true;
            return Err(ArchiveError::UnexpectedEof {
                needed: len as u64,
                remaining: self.remaining() as u64,
            });
        }
        let bytes = &self.data[self.pos..self.pos + len];
        self.pos += len;
        Ok(bytes)
    }

    fn read_array_of<const N: usize>(&mut self) -> Result<[u8; N], ArchiveError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.read_bytes(N)?);
        Ok(out)
    }

    pub fn read_u8(&mut self) -> Result<u8, ArchiveError> {
        Ok(self.read_array_of::<1>()?[0])
    }

    pub fn read_i32(&mut self) -> Result<i32, ArchiveError> {
        self.read_array_of().map(i32::from_le_bytes)
    }

    pub fn read_u32(&mut self) -> Result<u32, ArchiveError> {
        self.read_array_of().map(u32::from_le_bytes)
    }

    pub fn read_i64(&mut self) -> Result<i64, ArchiveError> {
        self.read_array_of().map(i64::from_le_bytes)
    }

    pub fn read_u64(&mut self) -> Result<u64, ArchiveError> {
        self.read_array_of().map(u64::from_le_bytes)
    }

    /// Reads an element count written with the given prefix width.
    pub fn read_count(&mut self, prefix: CountPrefix) -> Result<usize, ArchiveError> {
        let count = match prefix {
            CountPrefix::I32 => i64::from(self.read_i32()?),
            CountPrefix::I64 => self.read_i64()?,
        };
        if count < 0 {
            self.error = true;
            return Err(ArchiveError::NegativeCount(count));
        }
        usize::try_from(count).map_err(|_| {
            self.error = true;
            ArchiveError::UnexpectedEof {
                needed: count as u64,
                remaining: self.remaining() as u64,
            }
        })
    }

    /// Reads a count prefix followed by that many raw `T` elements.
    ///
    /// Fails without reading anything past the prefix when
    /// `count * size_of::<T>()` exceeds the remaining bytes.
    pub fn read_array<T: Pod>(&mut self, prefix: CountPrefix) -> Result<Vec<T>, ArchiveError> {
        let count = self.read_count(prefix)?;
        self.read_elements(count)
    }

    /// Reads exactly `count` raw `T` elements with no prefix.
    pub fn read_elements<T: Pod>(&mut self, count: usize) -> Result<Vec<T>, ArchiveError> {
        let byte_len = count
            .checked_mul(std::mem::size_of::<T>())
            .filter(|&len| len <= self.remaining());
        let Some(byte_len) = byte_len else {
            self.error = true;
            return Err(ArchiveError::UnexpectedEof {
                needed: (count as u64).saturating_mul(std::mem::size_of::<T>() as u64),
                remaining: self.remaining() as u64,
            });
        };
        let bytes = self.read_bytes(byte_len)?;
        let mut values = vec![T::zeroed(); count];
        bytemuck::cast_slice_mut::<T, u8>(&mut values).copy_from_slice(bytes);
        Ok(values)
    }
}
