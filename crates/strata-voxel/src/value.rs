//! Density samples and their storage widths.
//!
//! Positive values are outside the surface, negative values inside. The two
//! extremes are reserved sentinels that every storage width represents
//! exactly.

use bytemuck::{Pod, Zeroable};

use crate::CodecError;

/// A 16-bit density sample, the in-memory representation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Pod, Zeroable)]
#[repr(transparent)]
pub struct Value(pub i16);

static_assertions::assert_eq_size!(Value, i16);

impl Value {
    /// Fully outside the surface.
    pub const EMPTY: Self = Self(32767);
    /// Fully inside the surface.
    pub const FULL: Self = Self(-32767);

    const SCALE: f32 = 32767.0;

    /// Saturates a wide intermediate onto the `[FULL, EMPTY]` range.
    pub fn clamp_to_storage(raw: i32) -> Self {
        Self(raw.clamp(Self::FULL.0 as i32, Self::EMPTY.0 as i32) as i16)
    }

    /// Maps `[-1, 1]` onto `[FULL, EMPTY]`. Out-of-range input saturates.
    pub fn from_f32(value: f32) -> Self {
        Self((value.clamp(-1.0, 1.0) * Self::SCALE).round() as i16)
    }

    pub fn to_f32(self) -> f32 {
        self.0 as f32 / Self::SCALE
    }

    pub fn is_empty(self) -> bool {
        self == Self::EMPTY
    }

    pub fn is_full(self) -> bool {
        self == Self::FULL
    }

    /// Narrows to the 8-bit storage width.
    ///
    /// Rounds to the nearest step. Monotonic, and exact on both sentinels.
    pub fn to_value8(self) -> Value8 {
        let scaled = (i32::from(self.0) * 127 * 2 + i32::from(self.0.signum()) * 32767) / (2 * 32767);
        Value8(scaled.clamp(-127, 127) as i8)
    }
}

/// An 8-bit density sample, used on disk when the 8-bit width is selected.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Pod, Zeroable)]
#[repr(transparent)]
pub struct Value8(pub i8);

impl Value8 {
    pub const EMPTY: Self = Self(127);
    pub const FULL: Self = Self(-127);

    /// Widens back to 16 bits.
    pub fn to_value(self) -> Value {
        Value::clamp_to_storage(i32::from(self.0) * 32767 / 127)
    }
}

bitflags::bitflags! {
    /// Which value width a blob was written with. Exactly one bit is valid.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct ValueConfigFlag: u32 {
        const EIGHT_BITS_VALUE = 0x01;
        const SIXTEEN_BITS_VALUE = 0x02;
    }
}

/// Storage width of a value array.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ValueWidth {
    Eight,
    Sixteen,
}

impl ValueConfigFlag {
    /// Resolves the width, rejecting flags with both or neither bit set.
    pub fn width(self) -> Result<ValueWidth, CodecError> {
        if self == Self::EIGHT_BITS_VALUE {
            Ok(ValueWidth::Eight)
        } else if self == Self::SIXTEEN_BITS_VALUE {
            Ok(ValueWidth::Sixteen)
        } else {
            Err(CodecError::InvalidValueConfigFlag(self.bits()))
        }
    }
}

impl From<ValueWidth> for ValueConfigFlag {
    fn from(width: ValueWidth) -> Self {
        match width {
            ValueWidth::Eight => Self::EIGHT_BITS_VALUE,
            ValueWidth::Sixteen => Self::SIXTEEN_BITS_VALUE,
        }
    }
}
