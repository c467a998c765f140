//! Flat, fixed-extent 3D grid of values with optional materials.

use strata_archive::{ArchiveReader, ArchiveWriter};

use crate::{
    CodecError, DataAssetVersion, FormatConfig, Material, MaterialConfigFlag, Value,
    ValueConfigFlag, material_codec, value_codec,
};

/// Values (and optionally materials) for every lattice point of a box.
///
/// Samples are laid out x-fastest: `x + size_x * (y + size_y * z)`.
/// A volume with a single value is the "empty" sentinel; real volumes have
/// at least one dimension longer than 1.
#[derive(Clone, Debug, PartialEq)]
pub struct DenseVolume {
    size: [i32; 3],
    values: Vec<Value>,
    materials: Vec<Material>,
    allocated_size: usize,
}

impl Default for DenseVolume {
    fn default() -> Self {
        Self::new()
    }
}

impl DenseVolume {
    /// The empty sentinel: 1×1×1 holding [`Value::EMPTY`], no materials.
    pub fn new() -> Self {
        let mut volume = Self {
            size: [1, 1, 1],
            values: vec![Value::EMPTY],
            materials: Vec::new(),
            allocated_size: 0,
        };
        volume.update_allocated_size();
        volume
    }

    /// Reallocates both arrays for `size`, filled with [`Value::EMPTY`] and
    /// default materials.
    ///
    /// # Panics
    ///
    /// Panics if a dimension is not positive, if no dimension exceeds 1, or
    /// if the sample count does not fit in an `i32`.
    pub fn resize(&mut self, size: [i32; 3], with_materials: bool) {
        assert!(size.iter().all(|&d| d > 0), "invalid volume size {size:?}");
        assert!(
            size.iter().any(|&d| d > 1),
            "volume {size:?} is too thin, use DenseVolume::new for the empty sentinel"
        );
        let count = sample_count(size)
            .filter(|&n| n <= i32::MAX as u64)
            .unwrap_or_else(|| panic!("volume {size:?} has more than i32::MAX samples"))
            as usize;

        self.size = size;
        self.values = vec![Value::EMPTY; count];
        self.materials = if with_materials {
            vec![Material::default(); count]
        } else {
            Vec::new()
        };
        self.update_allocated_size();
    }

    pub fn size(&self) -> [i32; 3] {
        self.size
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn materials(&self) -> &[Material] {
        &self.materials
    }

    pub fn has_materials(&self) -> bool {
        !self.materials.is_empty()
    }

    /// True for the sentinel produced by [`new`](Self::new).
    pub fn is_empty(&self) -> bool {
        self.values.len() <= 1 && self.materials.len() <= 1
    }

    /// Heap bytes held by the sample arrays.
    pub fn allocated_size(&self) -> usize {
        self.allocated_size
    }

    pub fn is_valid_index(&self, x: i32, y: i32, z: i32) -> bool {
        let [sx, sy, sz] = self.size;
        (0..sx).contains(&x) && (0..sy).contains(&y) && (0..sz).contains(&z)
    }

    #[inline]
    fn index(&self, x: i32, y: i32, z: i32) -> usize {
        debug_assert!(
            self.is_valid_index(x, y, z),
            "({x}, {y}, {z}) outside volume {:?}",
            self.size
        );
        let [sx, sy, _] = self.size;
        (x + sx * (y + sy * z)) as usize
    }

    /// Value at a lattice point. Callers clamp coordinates first.
    pub fn get_value(&self, x: i32, y: i32, z: i32) -> Value {
        self.values[self.index(x, y, z)]
    }

    /// Value at a lattice point, or `default` outside the volume.
    pub fn get_value_or(&self, x: i32, y: i32, z: i32, default: Value) -> Value {
        if self.is_valid_index(x, y, z) {
            self.get_value(x, y, z)
        } else {
            default
        }
    }

    /// Material at a lattice point; the default material when the volume
    /// has none.
    pub fn get_material(&self, x: i32, y: i32, z: i32) -> Material {
        let index = self.index(x, y, z);
        self.materials.get(index).copied().unwrap_or_default()
    }

    pub fn set_value(&mut self, x: i32, y: i32, z: i32, value: Value) {
        let index = self.index(x, y, z);
        self.values[index] = value;
    }

    /// # Panics
    ///
    /// Panics if the volume was sized without materials.
    pub fn set_material(&mut self, x: i32, y: i32, z: i32, material: Material) {
        assert!(self.has_materials(), "volume has no materials");
        let index = self.index(x, y, z);
        self.materials[index] = material;
    }

    /// Trilinear interpolation of the surrounding 8 lattice values.
    ///
    /// Coordinates within `tolerance` of an integer snap onto it. Corners
    /// outside the volume contribute `default`.
    pub fn get_interpolated_value(&self, x: f32, y: f32, z: f32, default: Value, tolerance: f32) -> f32 {
        let (x, y, z) = (snap(x, tolerance), snap(y, tolerance), snap(z, tolerance));
        let (x0, y0, z0) = (x.floor(), y.floor(), z.floor());
        let (fx, fy, fz) = (x - x0, y - y0, z - z0);
        let (x0, y0, z0) = (x0 as i32, y0 as i32, z0 as i32);

        if fx == 0.0 && fy == 0.0 && fz == 0.0 {
            return self.get_value_or(x0, y0, z0, default).to_f32();
        }

        let sample = |dx, dy, dz| self.get_value_or(x0 + dx, y0 + dy, z0 + dz, default).to_f32();
        let lerp = |a: f32, b: f32, t: f32| a + (b - a) * t;

        let c00 = lerp(sample(0, 0, 0), sample(1, 0, 0), fx);
        let c10 = lerp(sample(0, 1, 0), sample(1, 1, 0), fx);
        let c01 = lerp(sample(0, 0, 1), sample(1, 0, 1), fx);
        let c11 = lerp(sample(0, 1, 1), sample(1, 1, 1), fx);
        let c0 = lerp(c00, c10, fy);
        let c1 = lerp(c01, c11, fy);
        lerp(c0, c1, fz)
    }

    /// Material of the first non-empty corner of the cell containing the
    /// point, corners clamped into the volume. Falls back to the nearest
    /// lattice point when every corner is empty.
    pub fn get_interpolated_material(&self, x: f32, y: f32, z: f32, tolerance: f32) -> Material {
        let (x, y, z) = (snap(x, tolerance), snap(y, tolerance), snap(z, tolerance));
        let [sx, sy, sz] = self.size;
        let clamp = |v: i32, size: i32| v.clamp(0, size - 1);
        let (x0, y0, z0) = (x.floor() as i32, y.floor() as i32, z.floor() as i32);

        for dz in 0..2 {
            for dy in 0..2 {
                for dx in 0..2 {
                    let (cx, cy, cz) = (clamp(x0 + dx, sx), clamp(y0 + dy, sy), clamp(z0 + dz, sz));
                    if !self.get_value(cx, cy, cz).is_empty() {
                        return self.get_material(cx, cy, cz);
                    }
                }
            }
        }
        self.get_material(
            clamp(x.round() as i32, sx),
            clamp(y.round() as i32, sy),
            clamp(z.round() as i32, sz),
        )
    }

    /// Writes size, values, and materials in the layouts `format` selects.
    pub fn save(&self, writer: &mut ArchiveWriter, format: &FormatConfig) -> Result<(), CodecError> {
        for dim in self.size {
            writer.write_i32(dim);
        }
        value_codec::encode(writer, &self.values, format.value_width)?;
        material_codec::encode(writer, &self.materials, format.material_flag)?;
        tracing::debug!(
            size = ?self.size,
            values = self.values.len(),
            materials = self.materials.len(),
            "serialized dense volume"
        );
        Ok(())
    }

    /// Reads a volume stored by `version` under the given stored flags.
    ///
    /// Array lengths must match the stored size (materials may also be
    /// absent). On mismatch the reader is errored.
    pub fn decode(
        reader: &mut ArchiveReader<'_>,
        version: DataAssetVersion,
        value_flag: ValueConfigFlag,
        material_flag: MaterialConfigFlag,
        format: &FormatConfig,
    ) -> Result<Self, CodecError> {
        let size = [reader.read_i32()?, reader.read_i32()?, reader.read_i32()?];
        let Some(count) = size
            .iter()
            .all(|&d| d > 0)
            .then(|| sample_count(size))
            .flatten()
        else {
            reader.set_error();
            return Err(CodecError::InvalidSize(size));
        };

        let layout = version.value_layout(value_flag).inspect_err(|_| reader.set_error())?;
        let values = value_codec::decode(reader, layout)?;
        let materials = material_codec::decode(
            reader,
            version.material_layout(material_flag, format),
            usize::try_from(count).unwrap_or(usize::MAX),
        )?;

        if values.len() as u64 != count {
            reader.set_error();
            return Err(CodecError::ShapeMismatch {
                what: "values",
                expected: count,
                actual: values.len() as u64,
            });
        }
        if !materials.is_empty() && materials.len() as u64 != count {
            reader.set_error();
            return Err(CodecError::ShapeMismatch {
                what: "materials",
                expected: count,
                actual: materials.len() as u64,
            });
        }

        let mut volume = Self {
            size,
            values,
            materials,
            allocated_size: 0,
        };
        volume.update_allocated_size();
        Ok(volume)
    }

    /// [`decode`](Self::decode) into `self`. On error `self` is unchanged.
    pub fn load(
        &mut self,
        reader: &mut ArchiveReader<'_>,
        version: DataAssetVersion,
        value_flag: ValueConfigFlag,
        material_flag: MaterialConfigFlag,
        format: &FormatConfig,
    ) -> Result<(), CodecError> {
        *self = Self::decode(reader, version, value_flag, material_flag, format)?;
        Ok(())
    }

    fn update_allocated_size(&mut self) {
        self.allocated_size = self.values.capacity() * size_of::<Value>()
            + self.materials.capacity() * size_of::<Material>();
    }
}

fn sample_count([x, y, z]: [i32; 3]) -> Option<u64> {
    (x as u64)
        .checked_mul(y as u64)
        .and_then(|n| n.checked_mul(z as u64))
}

fn snap(coordinate: f32, tolerance: f32) -> f32 {
    let rounded = coordinate.round();
    if (coordinate - rounded).abs() <= tolerance {
        rounded
    } else {
        coordinate
    }
}
