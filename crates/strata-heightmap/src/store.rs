//! Heightmap storage, sampling, and serialization.
//!
//! ## Binary Layout (latest version)
//!
//! | Field | Encoding |
//! |-------|----------|
//! | Width, height | `i64` each |
//! | Heights | `i64` count + raw samples |
//! | Material kind | `u8` ([`MaterialKind`]) |
//! | Materials | material codec (`i32` count) |
//! | Min, max height | one raw sample each |
//! | Pyramid tile size, level count | `u32` each |
//! | Per level | width `i64`, height `i64`, `i64` count + flattened `min, max` pairs |
//!
//! Before `UseTArray64` the layout is heights (`i32` count), materials,
//! width `i32`, height `i32`, max, min, with no pyramid.

use std::ops::Range;

use strata_archive::{ArchiveReader, ArchiveWriter, CountPrefix};
use strata_voxel::{FormatConfig, Material, MaterialConfigFlag, material_codec};

use crate::pyramid::Rect;
use crate::{
    HeightRange, HeightSample, HeightmapError, HeightmapVersion, Mip, PyramidConfig,
    RangeMipPyramid,
};

/// How out-of-grid coordinates are resolved.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum SamplerMode {
    /// Saturate onto the nearest edge.
    #[default]
    Clamp,
    /// Repeat the grid.
    Wrap,
}

/// What the material channels of a heightmap mean.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum MaterialKind {
    /// Color channels.
    #[default]
    Rgb = 0,
    /// One material index per sample.
    SingleIndex = 1,
    /// Two indices plus a blend factor.
    MultiIndex = 2,
}

impl TryFrom<u8> for MaterialKind {
    type Error = HeightmapError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Rgb),
            1 => Ok(Self::SingleIndex),
            2 => Ok(Self::MultiIndex),
            other => Err(HeightmapError::UnknownMaterialKind(other)),
        }
    }
}

/// A `width × height` grid of heights with optional per-sample materials.
///
/// The pyramid and the global min/max are kept current by every mutator;
/// there is no way to write the arrays directly.
#[derive(Clone, Debug, PartialEq)]
pub struct HeightmapStore<T: HeightSample> {
    width: i64,
    height: i64,
    heights: Vec<T>,
    materials: Vec<Material>,
    material_kind: MaterialKind,
    min_height: T,
    max_height: T,
    pyramid: RangeMipPyramid<T>,
}

impl<T: HeightSample> Default for HeightmapStore<T> {
    fn default() -> Self {
        Self::new(PyramidConfig::default())
    }
}

impl<T: HeightSample> HeightmapStore<T> {
    /// An empty 2×2 heightmap of zeros.
    pub fn new(pyramid_config: PyramidConfig) -> Self {
        let heights = vec![T::default(); 4];
        let pyramid = RangeMipPyramid::build(&heights, 2, 2, pyramid_config);
        Self {
            width: 2,
            height: 2,
            heights,
            materials: Vec::new(),
            material_kind: MaterialKind::default(),
            min_height: T::default(),
            max_height: T::default(),
            pyramid,
        }
    }

    /// Resets to the empty 2×2 state, keeping the pyramid configuration.
    pub fn clear(&mut self) {
        *self = Self::new(self.pyramid.config());
    }

    /// Reallocates the grid, filled with zeros and default materials.
    ///
    /// # Panics
    ///
    /// Panics if a dimension is not positive or the sample count overflows
    /// a `usize`.
    pub fn set_size(&mut self, width: i64, height: i64, with_materials: bool, kind: MaterialKind) {
        assert!(width > 0 && height > 0, "invalid heightmap size {width}x{height}");
        let Some(count) = sample_count(width, height) else {
            panic!("heightmap {width}x{height} is too large");
        };

        self.width = width;
        self.height = height;
        self.heights = vec![T::default(); count];
        self.materials = if with_materials {
            vec![Material::default(); count]
        } else {
            Vec::new()
        };
        self.material_kind = kind;
        self.rebuild_pyramid(self.pyramid.config());
    }

    pub fn width(&self) -> i64 {
        self.width
    }

    pub fn height(&self) -> i64 {
        self.height
    }

    pub fn min_height(&self) -> T {
        self.min_height
    }

    pub fn max_height(&self) -> T {
        self.max_height
    }

    pub fn heights(&self) -> &[T] {
        &self.heights
    }

    pub fn materials(&self) -> &[Material] {
        &self.materials
    }

    pub fn material_kind(&self) -> MaterialKind {
        self.material_kind
    }

    pub fn pyramid(&self) -> &RangeMipPyramid<T> {
        &self.pyramid
    }

    pub fn has_materials(&self) -> bool {
        !self.materials.is_empty()
    }

    pub fn is_empty(&self) -> bool {
        self.heights.len() <= 4 && self.materials.is_empty()
    }

    pub fn allocated_size(&self) -> usize {
        let pyramid: usize = self
            .pyramid
            .mips()
            .iter()
            .map(|mip| mip.ranges.capacity() * size_of::<HeightRange<T>>())
            .sum();
        self.heights.capacity() * size_of::<T>()
            + self.materials.capacity() * size_of::<Material>()
            + pyramid
    }

    pub fn is_valid_index(&self, x: i64, y: i64) -> bool {
        (0..self.width).contains(&x) && (0..self.height).contains(&y)
    }

    #[inline]
    fn index(&self, x: i64, y: i64) -> usize {
        debug_assert!(self.is_valid_index(x, y), "({x}, {y}) outside heightmap");
        x as usize + self.width as usize * y as usize
    }

    fn resolve(&self, x: i64, y: i64, mode: SamplerMode) -> (i64, i64) {
        match mode {
            SamplerMode::Clamp => (x.clamp(0, self.width - 1), y.clamp(0, self.height - 1)),
            SamplerMode::Wrap => (x.rem_euclid(self.width), y.rem_euclid(self.height)),
        }
    }

    /// Updates one sample, its pyramid tiles, and the global bounds.
    pub fn set_height(&mut self, x: i64, y: i64, value: T) {
        let index = self.index(x, y);
        self.heights[index] = value;
        self.pyramid.update(&self.heights, x as usize, y as usize);
        self.refresh_bounds();
    }

    pub fn set_all_heights_to(&mut self, value: T) {
        self.heights.fill(value);
        self.rebuild_pyramid(self.pyramid.config());
    }

    /// # Panics
    ///
    /// Panics if the heightmap was sized without materials.
    pub fn set_material(&mut self, x: i64, y: i64, material: Material) {
        assert!(self.has_materials(), "heightmap has no materials");
        let index = self.index(x, y);
        self.materials[index] = material;
    }

    pub fn get_height(&self, x: i64, y: i64, mode: SamplerMode) -> T {
        let (x, y) = self.resolve(x, y, mode);
        self.heights[self.index(x, y)]
    }

    /// Bilinear interpolation of the four surrounding lattice heights.
    pub fn get_height_f(&self, x: f32, y: f32, mode: SamplerMode) -> f32 {
        let (x0, y0) = (x.floor(), y.floor());
        let (ax, ay) = (x - x0, y - y0);
        let (x0, y0) = (x0 as i64, y0 as i64);
        let (x1, y1) = (x.ceil() as i64, y.ceil() as i64);

        let h00 = self.get_height(x0, y0, mode).to_f32();
        let h10 = self.get_height(x1, y0, mode).to_f32();
        let h01 = self.get_height(x0, y1, mode).to_f32();
        let h11 = self.get_height(x1, y1, mode).to_f32();

        let top = h00 + (h10 - h00) * ax;
        let bottom = h01 + (h11 - h01) * ax;
        top + (bottom - top) * ay
    }

    /// Material at a lattice point; the default material without materials.
    pub fn get_material(&self, x: i64, y: i64, mode: SamplerMode) -> Material {
        if !self.has_materials() {
            return Material::default();
        }
        let (x, y) = self.resolve(x, y, mode);
        self.materials[self.index(x, y)]
    }

    /// Material of the nearest lattice point.
    pub fn get_material_f(&self, x: f32, y: f32, mode: SamplerMode) -> Material {
        self.get_material(x.round() as i64, y.round() as i64, mode)
    }

    /// Exact bounds of the heights in the half-open rectangle.
    ///
    /// Out-of-grid parts are resolved with `mode`. An empty rectangle yields
    /// [`HeightRange::EMPTY`].
    pub fn get_height_range(
        &self,
        x: Range<i64>,
        y: Range<i64>,
        mode: SamplerMode,
    ) -> HeightRange<T> {
        self.fold_rects(x, y, mode, |rect| self.pyramid.query(&self.heights, rect))
    }

    /// Like [`get_height_range`](Self::get_height_range) but stops
    /// descending at `min_mip`, folding partially covered tiles whole.
    /// Cheaper, and always contains the exact answer.
    pub fn get_height_range_coarse(
        &self,
        x: Range<i64>,
        y: Range<i64>,
        mode: SamplerMode,
        min_mip: usize,
    ) -> HeightRange<T> {
        self.fold_rects(x, y, mode, |rect| {
            self.pyramid.query_coarse(&self.heights, rect, min_mip)
        })
    }

    fn fold_rects(
        &self,
        x: Range<i64>,
        y: Range<i64>,
        mode: SamplerMode,
        query: impl Fn(&Rect) -> HeightRange<T>,
    ) -> HeightRange<T> {
        let xs = axis_segments(x, self.width, mode);
        let ys = axis_segments(y, self.height, mode);
        let mut acc = HeightRange::EMPTY;
        for y in &ys {
            for x in &xs {
                acc = acc.union(query(&Rect {
                    x: x.clone(),
                    y: y.clone(),
                }));
            }
        }
        acc
    }

    fn rebuild_pyramid(&mut self, config: PyramidConfig) {
        self.pyramid = RangeMipPyramid::build(
            &self.heights,
            self.width as usize,
            self.height as usize,
            config,
        );
        self.refresh_bounds();
    }

    fn refresh_bounds(&mut self) {
        let total = self.pyramid.total_range();
        self.min_height = total.min;
        self.max_height = total.max;
    }

    /// Writes the latest layout. Materials use `format.material_flag`.
    pub fn save(&self, writer: &mut ArchiveWriter, format: &FormatConfig) -> Result<(), HeightmapError> {
        writer.write_i64(self.width);
        writer.write_i64(self.height);
        writer.write_array(&self.heights, CountPrefix::I64)?;
        writer.write_u8(self.material_kind as u8);
        material_codec::encode(writer, &self.materials, format.material_flag)?;
        writer.write_bytes(bytemuck::bytes_of(&self.min_height));
        writer.write_bytes(bytemuck::bytes_of(&self.max_height));

        let tile_size = u32::try_from(self.pyramid.config().tile_size)
            .map_err(|_| HeightmapError::InvalidTileSize)?;
        writer.write_u32(tile_size);
        writer.write_u32(self.pyramid.num_mips() as u32);
        for mip in self.pyramid.mips() {
            writer.write_i64(mip.width as i64);
            writer.write_i64(mip.height as i64);
            let flat: Vec<T> = mip.ranges.iter().flat_map(|r| [r.min, r.max]).collect();
            writer.write_array(&flat, CountPrefix::I64)?;
        }

        tracing::debug!(
            width = self.width,
            height = self.height,
            mips = self.pyramid.num_mips(),
            "serialized heightmap"
        );
        Ok(())
    }

    /// Reads a heightmap stored by `version`.
    ///
    /// Returns the store and whether it should be saved again in the latest
    /// layout (true when the pyramid had to be rebuilt). On error the reader
    /// is errored.
    pub fn decode(
        reader: &mut ArchiveReader<'_>,
        version: HeightmapVersion,
        material_flag: MaterialConfigFlag,
        format: &FormatConfig,
        pyramid_config: PyramidConfig,
    ) -> Result<(Self, bool), HeightmapError> {
        let result = Self::decode_inner(reader, version, material_flag, format, pyramid_config);
        if result.is_err() {
            reader.set_error();
        }
        result
    }

    fn decode_inner(
        reader: &mut ArchiveReader<'_>,
        version: HeightmapVersion,
        material_flag: MaterialConfigFlag,
        format: &FormatConfig,
        pyramid_config: PyramidConfig,
    ) -> Result<(Self, bool), HeightmapError> {
        let material_layout = version.material_layout(material_flag, format);

        let grid_len = |width, height| {
            sample_count(width, height).ok_or(HeightmapError::InvalidSize { width, height })
        };

        let (width, height, count, heights, material_kind, materials, stored_min, stored_max) =
            if version.uses_64_bit_counts() {
                let width = reader.read_i64()?;
                let height = reader.read_i64()?;
                let count = grid_len(width, height)?;
                let heights = reader.read_array::<T>(CountPrefix::I64)?;
                let kind = MaterialKind::try_from(reader.read_u8()?)?;
                let materials = material_codec::decode(reader, material_layout, count)?;
                let min = read_sample::<T>(reader)?;
                let max = read_sample::<T>(reader)?;
                (width, height, count, heights, kind, materials, min, max)
            } else {
                let heights = reader.read_array::<T>(CountPrefix::I32)?;
                let materials = material_codec::decode(reader, material_layout, heights.len())?;
                let width = i64::from(reader.read_i32()?);
                let height = i64::from(reader.read_i32()?);
                let count = grid_len(width, height)?;
                let max = read_sample::<T>(reader)?;
                let min = read_sample::<T>(reader)?;
                let kind = MaterialKind::default();
                (width, height, count, heights, kind, materials, min, max)
            };

        if heights.len() != count {
            return Err(HeightmapError::ShapeMismatch {
                what: "heights",
                width,
                height,
                actual: heights.len() as u64,
            });
        }
        if !materials.is_empty() && materials.len() != count {
            return Err(HeightmapError::ShapeMismatch {
                what: "materials",
                width,
                height,
                actual: materials.len() as u64,
            });
        }

        let (w, h) = (width as usize, height as usize);
        let (pyramid, needs_resave) = if version.stores_pyramid() {
            let stored = read_pyramid(reader, w, h)?;
            let scanned: HeightRange<T> = heights.iter().copied().collect();
            if stored.total_range() == scanned {
                (stored, false)
            } else {
                tracing::warn!(
                    stored = ?stored.total_range(),
                    scanned = ?scanned,
                    "stored pyramid disagrees with the heights, rebuilding"
                );
                (RangeMipPyramid::build(&heights, w, h, stored.config()), true)
            }
        } else {
            tracing::warn!(?version, "heightmap predates stored pyramids, rebuilding");
            (RangeMipPyramid::build(&heights, w, h, pyramid_config), true)
        };

        let mut store = Self {
            width,
            height,
            heights,
            materials,
            material_kind,
            min_height: stored_min,
            max_height: stored_max,
            pyramid,
        };
        store.refresh_bounds();
        if store.min_height != stored_min || store.max_height != stored_max {
            tracing::debug!(
                stored_min = ?stored_min,
                stored_max = ?stored_max,
                "stored bounds differ from the samples, using recomputed bounds"
            );
        }
        Ok((store, needs_resave))
    }

    /// [`decode`](Self::decode) into `self`; `self` is unchanged on error.
    pub fn load(
        &mut self,
        reader: &mut ArchiveReader<'_>,
        version: HeightmapVersion,
        material_flag: MaterialConfigFlag,
        format: &FormatConfig,
    ) -> Result<bool, HeightmapError> {
        let (store, needs_resave) =
            Self::decode(reader, version, material_flag, format, self.pyramid.config())?;
        *self = store;
        Ok(needs_resave)
    }
}

fn read_sample<T: HeightSample>(reader: &mut ArchiveReader<'_>) -> Result<T, HeightmapError> {
    let bytes = reader.read_bytes(size_of::<T>())?;
    Ok(bytemuck::pod_read_unaligned(bytes))
}

fn read_pyramid<T: HeightSample>(
    reader: &mut ArchiveReader<'_>,
    width: usize,
    height: usize,
) -> Result<RangeMipPyramid<T>, HeightmapError> {
    let tile_size = reader.read_u32()? as usize;
    let num_mips = reader.read_u32()? as usize;
    if tile_size == 0 {
        return Err(HeightmapError::InvalidTileSize);
    }

    let mut mips = Vec::new();
    for _ in 0..num_mips {
        let dims = (
            usize::try_from(reader.read_i64()?).unwrap_or(usize::MAX),
            usize::try_from(reader.read_i64()?).unwrap_or(usize::MAX),
        );
        let flat = reader.read_array::<T>(CountPrefix::I64)?;
        let expected_len = dims.0.checked_mul(dims.1).and_then(|n| n.checked_mul(2));
        if expected_len != Some(flat.len()) {
            return Err(HeightmapError::PyramidMismatch {
                mip: mips.len(),
                expected: dims,
                actual: (flat.len() / 2, 1),
            });
        }
        let ranges = flat
            .chunks_exact(2)
            .map(|pair| HeightRange::new(pair[0], pair[1]))
            .collect();
        mips.push(Mip {
            width: dims.0,
            height: dims.1,
            ranges,
        });
    }

    let fully_built = mips.last().is_some_and(|top| top.width == 1 && top.height == 1);
    let config = PyramidConfig::new(tile_size, (!fully_built).then_some(num_mips))?;
    RangeMipPyramid::from_mips(mips, width, height, config)
}

/// Number of samples in a `width × height` grid, if both are positive and
/// the product fits a `usize`.
fn sample_count(width: i64, height: i64) -> Option<usize> {
    let width = usize::try_from(width).ok().filter(|&w| w > 0)?;
    let height = usize::try_from(height).ok().filter(|&h| h > 0)?;
    width.checked_mul(height)
}

/// Splits one query axis into in-grid segments.
fn axis_segments(range: Range<i64>, extent: i64, mode: SamplerMode) -> Vec<Range<usize>> {
    if range.is_empty() {
        return Vec::new();
    }
    match mode {
        SamplerMode::Clamp => {
            let start = range.start.clamp(0, extent - 1);
            let end = range.end.clamp(start + 1, extent);
            vec![start as usize..end as usize]
        }
        SamplerMode::Wrap => {
            let span = range.end.saturating_sub(range.start);
            if span >= extent {
                return vec![0..extent as usize];
            }
            let start = range.start.rem_euclid(extent) as usize;
            let end = start + span as usize;
            let extent = extent as usize;
            if end <= extent {
                vec![start..end]
            } else {
                vec![start..extent, 0..end - extent]
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{Rng, SeedableRng};
    use rand_chacha::ChaCha8Rng;

    fn random_store(width: i64, height: i64, seed: u64) -> HeightmapStore<u16> {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let mut store = HeightmapStore::new(PyramidConfig::new(4, None).unwrap());
        store.set_size(width, height, true, MaterialKind::SingleIndex);
        for y in 0..height {
            for x in 0..width {
                store.set_height(x, y, rng.random_range(0..10_000));
                store.set_material(x, y, Material::from_index(rng.random()));
            }
        }
        store
    }

    fn brute_force(store: &HeightmapStore<u16>, x: Range<i64>, y: Range<i64>, mode: SamplerMode) -> HeightRange<u16> {
        let mut range = HeightRange::EMPTY;
        for y in y {
            for x in x.clone() {
                range = range.including(store.get_height(x, y, mode));
            }
        }
        range
    }

    fn save(store: &HeightmapStore<u16>) -> Vec<u8> {
        let mut writer = ArchiveWriter::new();
        store.save(&mut writer, &FormatConfig::default()).unwrap();
        writer.into_bytes()
    }

    #[test]
    fn test_new_store_is_empty_two_by_two() {
        let mut store = random_store(5, 3, 1);
        assert!(!store.is_empty(), "a sized store with materials is not empty");
        store.clear();
        assert_eq!((store.width(), store.height()), (2, 2), "clear resets to 2x2");
        assert_eq!(store.heights(), &[0; 4], "clear zeroes heights");
        assert!(store.is_empty(), "cleared store should be empty");
        assert_eq!(store.pyramid().config().tile_size, 4, "clear keeps the pyramid config");
    }

    #[test]
    fn test_set_size_allocates_requested_arrays() {
        let mut store = HeightmapStore::<f32>::default();
        store.set_size(7, 9, false, MaterialKind::Rgb);
        assert_eq!(store.heights().len(), 63, "heights must be width * height");
        assert!(!store.has_materials(), "materials were not requested");
        assert_eq!(store.get_material(3, 3, SamplerMode::Clamp), Material::default());

        store.set_size(4, 4, true, MaterialKind::MultiIndex);
        assert_eq!(store.materials().len(), 16, "materials must match the grid");
        assert_eq!(store.material_kind(), MaterialKind::MultiIndex);
        assert!(store.allocated_size() >= 16 * 4 + 16 * size_of::<Material>());
    }

    #[test]
    #[should_panic(expected = "invalid heightmap size")]
    fn test_set_size_rejects_zero() {
        HeightmapStore::<u16>::default().set_size(0, 4, false, MaterialKind::Rgb);
    }

    #[test]
    fn test_set_height_updates_bounds() {
        let mut store = HeightmapStore::<u16>::default();
        store.set_size(8, 8, false, MaterialKind::Rgb);
        store.set_height(3, 5, 900);
        assert_eq!((store.min_height(), store.max_height()), (0, 900));

        store.set_all_heights_to(40);
        assert_eq!((store.min_height(), store.max_height()), (40, 40), "fill resets bounds");
        store.set_height(0, 0, 7);
        assert_eq!(store.min_height(), 7, "a lower sample lowers the minimum");
    }

    #[test]
    fn test_sampler_modes() {
        let store = random_store(6, 4, 2);
        assert_eq!(
            store.get_height(-1, 2, SamplerMode::Wrap),
            store.get_height(5, 2, SamplerMode::Wrap),
            "wrap repeats the grid"
        );
        assert_eq!(
            store.get_height(-3, 9, SamplerMode::Clamp),
            store.get_height(0, 3, SamplerMode::Clamp),
            "clamp saturates onto the edge"
        );
        assert_eq!(
            store.get_material(13, 4, SamplerMode::Wrap),
            store.get_material(1, 0, SamplerMode::Clamp),
        );
    }

    #[test]
    fn test_bilinear_sampling() {
        let mut store = HeightmapStore::<f32>::default();
        store.set_height(0, 0, 0.0);
        store.set_height(1, 0, 10.0);
        store.set_height(0, 1, 20.0);
        store.set_height(1, 1, 30.0);

        assert_eq!(store.get_height_f(0.5, 0.5, SamplerMode::Clamp), 15.0);
        assert_eq!(store.get_height_f(0.25, 0.0, SamplerMode::Clamp), 2.5);
        assert_eq!(store.get_height_f(1.0, 1.0, SamplerMode::Clamp), 30.0, "lattice point exact");
    }

    #[test]
    fn test_range_query_matches_brute_force() {
        let store = random_store(37, 23, 3);
        let mut rng = ChaCha8Rng::seed_from_u64(4);
        for _ in 0..200 {
            let x0 = rng.random_range(-40..60);
            let y0 = rng.random_range(-30..40);
            let x = x0..x0 + rng.random_range(1..50);
            let y = y0..y0 + rng.random_range(1..30);
            for mode in [SamplerMode::Clamp, SamplerMode::Wrap] {
                assert_eq!(
                    store.get_height_range(x.clone(), y.clone(), mode),
                    brute_force(&store, x.clone(), y.clone(), mode),
                    "range mismatch for {x:?} x {y:?} in {mode:?}"
                );
            }
        }
        assert!(store.get_height_range(3..3, 0..4, SamplerMode::Clamp).is_empty());
    }

    #[test]
    fn test_coarse_range_contains_exact() {
        let store = random_store(40, 40, 5);
        let exact = store.get_height_range(5..19, 7..30, SamplerMode::Clamp);
        for min_mip in 0..store.pyramid().num_mips() {
            let coarse = store.get_height_range_coarse(5..19, 7..30, SamplerMode::Clamp, min_mip);
            assert!(coarse.contains_range(&exact), "mip {min_mip} must contain the exact range");
        }
    }

    #[test]
    fn test_latest_round_trip() {
        let store = random_store(19, 11, 6);
        let bytes = save(&store);

        let mut reader = ArchiveReader::new(&bytes);
        let (loaded, needs_resave) = HeightmapStore::<u16>::decode(
            &mut reader,
            HeightmapVersion::LATEST,
            MaterialConfigFlag::CURRENT,
            &FormatConfig::default(),
            PyramidConfig::default(),
        )
        .unwrap();
        assert!(!needs_resave, "latest layout needs no resave");
        assert!(reader.is_at_end(), "decode must consume the whole stream");
        assert_eq!(loaded, store, "round trip must preserve the store");
    }

    #[test]
    fn test_old_layout_rebuilds_pyramid() {
        let mut writer = ArchiveWriter::new();
        let heights: Vec<u16> = (0..12).map(|i| i * 10).collect();
        writer.write_array(&heights, CountPrefix::I32).unwrap();
        material_codec::encode(&mut writer, &[], MaterialConfigFlag::CURRENT).unwrap();
        writer.write_i32(4);
        writer.write_i32(3);
        writer.write_bytes(bytemuck::bytes_of(&110u16));
        writer.write_bytes(bytemuck::bytes_of(&0u16));
        let bytes = writer.into_bytes();

        let mut store = HeightmapStore::<u16>::default();
        let mut reader = ArchiveReader::new(&bytes);
        let needs_resave = store
            .load(
                &mut reader,
                HeightmapVersion::StoreMaterialChannelsIndividuallyAndRemoveFoliage,
                MaterialConfigFlag::CURRENT,
                &FormatConfig::default(),
            )
            .unwrap();
        assert!(needs_resave, "a rebuilt pyramid should request a resave");
        assert_eq!((store.width(), store.height()), (4, 3));
        assert_eq!(store.get_height(2, 1, SamplerMode::Clamp), 60);
        assert_eq!((store.min_height(), store.max_height()), (0, 110));
        assert_eq!(store.get_height_range(1..3, 1..3, SamplerMode::Clamp), HeightRange::new(50, 100));
    }

    #[test]
    fn test_shape_mismatch_leaves_store_untouched() {
        let mut writer = ArchiveWriter::new();
        writer.write_i64(4);
        writer.write_i64(4);
        writer.write_array(&[1u16; 15], CountPrefix::I64).unwrap();
        writer.write_u8(0);
        material_codec::encode(&mut writer, &[], MaterialConfigFlag::CURRENT).unwrap();
        writer.write_bytes(bytemuck::bytes_of(&1u16));
        writer.write_bytes(bytemuck::bytes_of(&1u16));
        let bytes = writer.into_bytes();

        let mut store = random_store(5, 5, 7);
        let before = store.clone();
        let mut reader = ArchiveReader::new(&bytes);
        let err = store
            .load(&mut reader, HeightmapVersion::LATEST, MaterialConfigFlag::CURRENT, &FormatConfig::default())
            .unwrap_err();
        assert!(
            matches!(err, HeightmapError::ShapeMismatch { what: "heights", actual: 15, .. }),
            "expected a heights mismatch, got {err:?}"
        );
        assert!(reader.is_error(), "failed decode must error the reader");
        assert_eq!(store, before, "store must be unchanged on error");
    }

    #[test]
    fn test_corrupt_pyramid_is_rejected() {
        let store = random_store(9, 9, 8);
        let mut bytes = save(&store);
        // first mip width sits after the tile size and level count
        let pyramid_start = bytes.len()
            - store
                .pyramid()
                .mips()
                .iter()
                .map(|mip| 24 + mip.ranges.len() * 2 * size_of::<u16>())
                .sum::<usize>();
        bytes[pyramid_start..pyramid_start + 8].copy_from_slice(&7i64.to_le_bytes());

        let mut reader = ArchiveReader::new(&bytes);
        let err = HeightmapStore::<u16>::decode(
            &mut reader,
            HeightmapVersion::LATEST,
            MaterialConfigFlag::CURRENT,
            &FormatConfig::default(),
            PyramidConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(err, HeightmapError::PyramidMismatch { mip: 0, .. }), "got {err:?}");
    }

    #[test]
    fn test_sample_count_allows_grids_past_i32() {
        assert_eq!(sample_count(46_341, 46_341), Some(2_147_488_281));
        assert_eq!(sample_count(0, 5), None, "zero width");
        assert_eq!(sample_count(4, -1), None, "negative height");
        assert_eq!(sample_count(i64::MAX, i64::MAX), None, "product overflows");
    }

    #[test]
    fn test_large_header_passes_size_gate() {
        let (width, height) = (65_536i64, 65_537i64);
        let mut writer = ArchiveWriter::new();
        writer.write_i64(width);
        writer.write_i64(height);
        writer.write_array::<u16>(&[], CountPrefix::I64).unwrap();
        writer.write_u8(0);
        material_codec::encode(&mut writer, &[], MaterialConfigFlag::CURRENT).unwrap();
        writer.write_bytes(bytemuck::bytes_of(&0u16));
        writer.write_bytes(bytemuck::bytes_of(&0u16));
        let bytes = writer.into_bytes();

        let mut reader = ArchiveReader::new(&bytes);
        let err = HeightmapStore::<u16>::decode(
            &mut reader,
            HeightmapVersion::LATEST,
            MaterialConfigFlag::CURRENT,
            &FormatConfig::default(),
            PyramidConfig::default(),
        )
        .unwrap_err();
        assert_eq!(
            err,
            HeightmapError::ShapeMismatch {
                what: "heights",
                width,
                height,
                actual: 0
            },
            "a grid above 2^31 samples is a valid size"
        );
    }

    #[test]
    fn test_extra_root_levels_are_rejected() {
        let store = HeightmapStore::<u16>::default();
        assert_eq!(store.pyramid().num_mips(), 1, "a 2x2 grid fits one tile");
        let mut bytes = save(&store);
        // one 1x1 level: width, height, count, then a min/max pair
        let mip_len = 24 + 2 * size_of::<u16>();
        let mip = bytes[bytes.len() - mip_len..].to_vec();
        let num_mips_at = bytes.len() - mip_len - 4;
        bytes[num_mips_at..num_mips_at + 4].copy_from_slice(&70u32.to_le_bytes());
        for _ in 0..69 {
            bytes.extend_from_slice(&mip);
        }

        let mut reader = ArchiveReader::new(&bytes);
        let err = HeightmapStore::<u16>::decode(
            &mut reader,
            HeightmapVersion::LATEST,
            MaterialConfigFlag::CURRENT,
            &FormatConfig::default(),
            PyramidConfig::default(),
        )
        .unwrap_err();
        assert_eq!(err, HeightmapError::InvalidPyramid { levels: 70, max: 1 });
        assert!(reader.is_error(), "failed decode must error the reader");
    }

    #[test]
    fn test_stale_pyramid_is_rebuilt() {
        let store = random_store(9, 9, 8);
        let mut bytes = save(&store);
        // the root tile's max is the last sample of the stream
        let end = bytes.len();
        bytes[end - 2..].copy_from_slice(&u16::MAX.to_le_bytes());

        let mut reader = ArchiveReader::new(&bytes);
        let (loaded, needs_resave) = HeightmapStore::<u16>::decode(
            &mut reader,
            HeightmapVersion::LATEST,
            MaterialConfigFlag::CURRENT,
            &FormatConfig::default(),
            PyramidConfig::default(),
        )
        .unwrap();
        assert!(needs_resave, "a rebuilt pyramid should request a resave");
        assert_eq!(loaded.max_height(), store.max_height(), "bounds come from the heights");
        assert_eq!(loaded, store, "the rebuilt pyramid matches a fresh build");
    }

    #[test]
    fn test_unknown_material_kind() {
        assert_eq!(MaterialKind::try_from(2), Ok(MaterialKind::MultiIndex));
        assert_eq!(MaterialKind::try_from(9), Err(HeightmapError::UnknownMaterialKind(9)));
    }

    #[test]
    fn test_float_heights_round_trip() {
        let mut store = HeightmapStore::<f32>::new(PyramidConfig::new(2, Some(2)).unwrap());
        store.set_size(6, 5, false, MaterialKind::Rgb);
        store.set_height(4, 4, -12.5);
        store.set_height(1, 2, 300.25);

        let mut writer = ArchiveWriter::new();
        store.save(&mut writer, &FormatConfig::default()).unwrap();
        let bytes = writer.into_bytes();
        let mut reader = ArchiveReader::new(&bytes);
        let (loaded, _) = HeightmapStore::<f32>::decode(
            &mut reader,
            HeightmapVersion::LATEST,
            MaterialConfigFlag::CURRENT,
            &FormatConfig::default(),
            PyramidConfig::default(),
        )
        .unwrap();
        assert_eq!(loaded.pyramid().config(), store.pyramid().config(), "depth cap survives the round trip");
        assert_eq!(loaded.get_height(4, 4, SamplerMode::Clamp), -12.5);
        assert_eq!(loaded.get_height_range(0..6, 0..5, SamplerMode::Clamp), HeightRange::new(-12.5, 300.25));
    }
}
