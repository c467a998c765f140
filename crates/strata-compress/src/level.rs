//! zlib compression level.

use flate2::Compression;

use crate::CompressError;

/// A zlib compression level: `-1` for the library default, `0` for stored
/// blocks, `1..=9` from fastest to smallest.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct CompressionLevel(i32);

impl CompressionLevel {
    pub const DEFAULT: Self = Self(-1);
    pub const NO_COMPRESSION: Self = Self(0);
    pub const BEST_SPEED: Self = Self(1);
    pub const BEST_COMPRESSION: Self = Self(9);

    /// Validates a raw level.
    pub fn new(level: i32) -> Result<Self, CompressError> {
        if (-1..=9).contains(&level) {
            Ok(Self(level))
        } else {
            Err(CompressError::InvalidLevel(level))
        }
    }

    pub fn get(self) -> i32 {
        self.0
    }

    pub(crate) fn to_flate(self) -> Compression {
        match self.0 {
            -1 => Compression::default(),
            level => Compression::new(level as u32),
        }
    }
}

impl Default for CompressionLevel {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl TryFrom<i32> for CompressionLevel {
    type Error = CompressError;

    fn try_from(level: i32) -> Result<Self, Self::Error> {
        Self::new(level)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_full_range() {
        for level in -1..=9 {
            assert_eq!(CompressionLevel::new(level).unwrap().get(), level);
        }
    }

    #[test]
    fn test_rejects_out_of_range() {
        assert!(matches!(
            CompressionLevel::new(10),
            Err(CompressError::InvalidLevel(10))
        ));
        assert!(CompressionLevel::new(-2).is_err());
    }

    #[test]
    fn test_default_maps_to_library_default() {
        assert_eq!(CompressionLevel::DEFAULT.to_flate(), Compression::default());
        assert_eq!(CompressionLevel::NO_COMPRESSION.to_flate(), Compression::none());
    }
}
