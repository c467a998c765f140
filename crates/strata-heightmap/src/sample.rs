//! Height sample types.

use std::fmt::Debug;

use bytemuck::Pod;

/// A storable height. Implemented for `u16` and `f32`.
pub trait HeightSample: Pod + PartialOrd + Default + Debug + Send + Sync + 'static {
    /// Smallest representable height.
    const LOWEST: Self;
    /// Largest representable height.
    const HIGHEST: Self;

    fn to_f32(self) -> f32;

    /// Smaller of two samples.
    #[inline]
    fn min_of(self, other: Self) -> Self {
        if other < self { other } else { self }
    }

    /// Larger of two samples.
    #[inline]
    fn max_of(self, other: Self) -> Self {
        if other > self { other } else { self }
    }
}

impl HeightSample for u16 {
    const LOWEST: Self = u16::MIN;
    const HIGHEST: Self = u16::MAX;

    #[inline]
    fn to_f32(self) -> f32 {
        f32::from(self)
    }
}

impl HeightSample for f32 {
    const LOWEST: Self = f32::MIN;
    const HIGHEST: Self = f32::MAX;

    #[inline]
    fn to_f32(self) -> f32 {
        self
    }
}
