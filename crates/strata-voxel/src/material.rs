//! Per-voxel material records.

use bytemuck::{Pod, Zeroable};

/// Six independent byte channels.
///
/// The channel order is the on-disk order of the full layout, so a slice of
/// materials can be written as raw bytes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Pod, Zeroable)]
#[repr(C)]
pub struct Material {
    pub index: u8,
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub actor_id: u8,
    pub grass_id: u8,
}

static_assertions::assert_eq_size!(Material, [u8; 6]);

impl Material {
    /// Number of byte channels in a record.
    pub const CHANNELS: usize = 6;

    pub fn from_index(index: u8) -> Self {
        Self {
            index,
            ..Self::default()
        }
    }

    /// RGBA view; alpha lives in the index channel.
    pub fn color(&self) -> [u8; 4] {
        [self.r, self.g, self.b, self.index]
    }

    pub fn set_color(&mut self, [r, g, b, a]: [u8; 4]) {
        self.r = r;
        self.g = g;
        self.b = b;
        self.index = a;
    }
}

bitflags::bitflags! {
    /// Which material channels a blob stores.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct MaterialConfigFlag: u32 {
        /// The index channel is not stored.
        const DISABLE_INDEX = 0x01;
        /// G and B are stored.
        const ENABLE_VOXEL_COLORS = 0x02;
        /// R is stored too; without it R mirrors the index.
        const ENABLE_RGBA = 0x04;
        const ENABLE_VOXEL_SPAWNED_ACTORS = 0x08;
        const ENABLE_VOXEL_GRASS = 0x10;
    }
}

impl MaterialConfigFlag {
    /// Every channel stored. Its record layout is the raw [`Material`] layout.
    pub const CURRENT: Self = Self::ENABLE_VOXEL_COLORS
        .union(Self::ENABLE_RGBA)
        .union(Self::ENABLE_VOXEL_SPAWNED_ACTORS)
        .union(Self::ENABLE_VOXEL_GRASS);

    /// Bytes one record occupies under this flag.
    pub fn record_size(self) -> usize {
        let mut size = 0;
        if !self.contains(Self::DISABLE_INDEX) {
            size += 1;
        }
        if self.contains(Self::ENABLE_VOXEL_COLORS) {
            size += 2;
            if self.contains(Self::ENABLE_RGBA) {
                size += 1;
            }
        }
        if self.contains(Self::ENABLE_VOXEL_SPAWNED_ACTORS) {
            size += 1;
        }
        if self.contains(Self::ENABLE_VOXEL_GRASS) {
            size += 1;
        }
        size
    }

    /// True when records under this flag are byte-identical to [`Material`].
    pub fn is_raw_layout(self) -> bool {
        self == Self::CURRENT
    }
}
