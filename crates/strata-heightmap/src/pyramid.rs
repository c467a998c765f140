//! Hierarchical min/max pyramid over a height grid.
//!
//! Level 0 splits the grid into `tile_size × tile_size` tiles. Each coarser
//! level groups up to 2×2 tiles of the level below, so a tile at level `k`
//! covers `tile_size << k` samples per side (clipped at the grid edge).
//! Levels are added until a single tile remains or `max_depth` is reached.

use std::ops::Range;

use strata_config::PyramidSettings;

use crate::{HeightRange, HeightSample, HeightmapError};

/// Shape of a [`RangeMipPyramid`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PyramidConfig {
    /// Samples per side of a level-0 tile.
    pub tile_size: usize,
    /// Maximum number of levels; `None` builds until one root tile remains.
    pub max_depth: Option<usize>,
}

impl Default for PyramidConfig {
    fn default() -> Self {
        Self {
            tile_size: 16,
            max_depth: None,
        }
    }
}

impl PyramidConfig {
    pub fn new(tile_size: usize, max_depth: Option<usize>) -> Result<Self, HeightmapError> {
        if tile_size == 0 {
            return Err(HeightmapError::InvalidTileSize);
        }
        if max_depth == Some(0) {
            return Err(HeightmapError::InvalidDepth);
        }
        Ok(Self {
            tile_size,
            max_depth,
        })
    }

    pub fn from_settings(settings: &PyramidSettings) -> Result<Self, HeightmapError> {
        Self::new(
            settings.tile_size as usize,
            settings.max_depth.map(|depth| depth as usize),
        )
    }
}

/// One pyramid level: a row-major grid of tile ranges.
#[derive(Clone, Debug, PartialEq)]
pub struct Mip<T> {
    pub width: usize,
    pub height: usize,
    pub ranges: Vec<HeightRange<T>>,
}

impl<T: HeightSample> Mip<T> {
    #[inline]
    pub fn get(&self, tx: usize, ty: usize) -> HeightRange<T> {
        self.ranges[tx + self.width * ty]
    }
}

/// Half-open sample rectangle, already inside the grid.
#[derive(Clone, Debug)]
pub(crate) struct Rect {
    pub x: Range<usize>,
    pub y: Range<usize>,
}

/// Min/max pyramid. Holds no heights; every operation takes the grid.
#[derive(Clone, Debug, PartialEq)]
pub struct RangeMipPyramid<T> {
    config: PyramidConfig,
    grid_width: usize,
    grid_height: usize,
    mips: Vec<Mip<T>>,
}

impl<T: HeightSample> RangeMipPyramid<T> {
    /// Builds every level from scratch.
    pub fn build(heights: &[T], width: usize, height: usize, config: PyramidConfig) -> Self {
        debug_assert_eq!(heights.len(), width * height);
        let tile = config.tile_size;

        let (w0, h0) = (width.div_ceil(tile), height.div_ceil(tile));
        let mut level0 = Mip {
            width: w0,
            height: h0,
            ranges: Vec::with_capacity(w0 * h0),
        };
        for ty in 0..h0 {
            for tx in 0..w0 {
                level0
                    .ranges
                    .push(tile_from_samples(heights, width, height, tile, tx, ty));
            }
        }

        let mut mips = vec![level0];
        while let Some(last) = mips.last()
            && (last.width > 1 || last.height > 1)
            && config.max_depth.is_none_or(|depth| mips.len() < depth)
        {
            let (w, h) = (last.width.div_ceil(2), last.height.div_ceil(2));
            let mut next = Mip {
                width: w,
                height: h,
                ranges: Vec::with_capacity(w * h),
            };
            for ty in 0..h {
                for tx in 0..w {
                    next.ranges.push(tile_from_children(last, tx, ty));
                }
            }
            mips.push(next);
        }

        Self {
            config,
            grid_width: width,
            grid_height: height,
            mips,
        }
    }

    /// Reassembles a pyramid from stored levels, checking every level's
    /// dimensions against the grid. Fails if there are more levels than
    /// [`build`](Self::build) would produce.
    pub fn from_mips(
        mips: Vec<Mip<T>>,
        width: usize,
        height: usize,
        config: PyramidConfig,
    ) -> Result<Self, HeightmapError> {
        let (mut ew, mut eh) = (width.div_ceil(config.tile_size), height.div_ceil(config.tile_size));
        let max = level_count(ew, eh, config.max_depth);
        if mips.len() > max {
            return Err(HeightmapError::InvalidPyramid {
                levels: mips.len(),
                max,
            });
        }
        for (index, mip) in mips.iter().enumerate() {
            if (mip.width, mip.height) != (ew, eh) || mip.ranges.len() != ew * eh {
                return Err(HeightmapError::PyramidMismatch {
                    mip: index,
                    expected: (ew, eh),
                    actual: (mip.width, mip.height),
                });
            }
            (ew, eh) = (ew.div_ceil(2), eh.div_ceil(2));
        }
        if mips.is_empty() {
            return Err(HeightmapError::PyramidMismatch {
                mip: 0,
                expected: (ew, eh),
                actual: (0, 0),
            });
        }
        Ok(Self {
            config,
            grid_width: width,
            grid_height: height,
            mips,
        })
    }

    pub fn config(&self) -> PyramidConfig {
        self.config
    }

    pub fn mips(&self) -> &[Mip<T>] {
        &self.mips
    }

    pub fn num_mips(&self) -> usize {
        self.mips.len()
    }

    /// Bounds of the whole grid, from the coarsest level.
    pub fn total_range(&self) -> HeightRange<T> {
        self.mips
            .last()
            .map(|top| top.ranges.iter().fold(HeightRange::EMPTY, |acc, r| acc.union(*r)))
            .unwrap_or(HeightRange::EMPTY)
    }

    /// Refreshes every tile containing sample `(x, y)` after it changed.
    pub fn update(&mut self, heights: &[T], x: usize, y: usize) {
        let tile = self.config.tile_size;
        let (mut tx, mut ty) = (x / tile, y / tile);
        let level0 = &mut self.mips[0];
        let width = level0.width;
        level0.ranges[tx + width * ty] =
            tile_from_samples(heights, self.grid_width, self.grid_height, tile, tx, ty);

        for level in 1..self.mips.len() {
            (tx, ty) = (tx / 2, ty / 2);
            let range = tile_from_children(&self.mips[level - 1], tx, ty);
            let mip = &mut self.mips[level];
            let width = mip.width;
            mip.ranges[tx + width * ty] = range;
        }
    }

    /// Exact bounds of the heights inside `rect`.
    pub(crate) fn query(&self, heights: &[T], rect: &Rect) -> HeightRange<T> {
        self.query_down_to(heights, rect, None)
    }

    /// Bounds folded whole from tiles at `min_mip` or coarser. A superset of
    /// [`query`](Self::query).
    pub(crate) fn query_coarse(&self, heights: &[T], rect: &Rect, min_mip: usize) -> HeightRange<T> {
        self.query_down_to(heights, rect, Some(min_mip.min(self.mips.len() - 1)))
    }

    fn query_down_to(&self, heights: &[T], rect: &Rect, min_mip: Option<usize>) -> HeightRange<T> {
        if rect.x.is_empty() || rect.y.is_empty() {
            return HeightRange::EMPTY;
        }
        let top = self.mips.len() - 1;
        let span = self.config.tile_size << top;
        let mut acc = HeightRange::EMPTY;
        for ty in rect.y.start / span..rect.y.end.div_ceil(span) {
            for tx in rect.x.start / span..rect.x.end.div_ceil(span) {
                self.visit(heights, rect, min_mip, top, tx, ty, &mut acc);
            }
        }
        acc
    }

    #[allow(clippy::too_many_arguments)]
    fn visit(
        &self,
        heights: &[T],
        rect: &Rect,
        min_mip: Option<usize>,
        level: usize,
        tx: usize,
        ty: usize,
        acc: &mut HeightRange<T>,
    ) {
        let mip = &self.mips[level];
        if tx >= mip.width || ty >= mip.height {
            return;
        }
        let footprint = self.footprint(level, tx, ty);
        let inter_x = footprint.x.start.max(rect.x.start)..footprint.x.end.min(rect.x.end);
        let inter_y = footprint.y.start.max(rect.y.start)..footprint.y.end.min(rect.y.end);
        if inter_x.is_empty() || inter_y.is_empty() {
            return;
        }

        let contained = inter_x == footprint.x && inter_y == footprint.y;
        if contained || min_mip == Some(level) {
            *acc = acc.union(mip.get(tx, ty));
            return;
        }

        if level == 0 {
            for y in inter_y {
                let row = &heights[y * self.grid_width..][..self.grid_width];
                for &sample in &row[inter_x.clone()] {
                    *acc = acc.including(sample);
                }
            }
            return;
        }

        for cy in 2 * ty..2 * ty + 2 {
            for cx in 2 * tx..2 * tx + 2 {
                self.visit(heights, rect, min_mip, level - 1, cx, cy, acc);
            }
        }
    }

    /// Samples covered by a tile, clipped to the grid.
    fn footprint(&self, level: usize, tx: usize, ty: usize) -> Rect {
        let span = self.config.tile_size << level;
        Rect {
            x: tx * span..((tx + 1) * span).min(self.grid_width),
            y: ty * span..((ty + 1) * span).min(self.grid_height),
        }
    }
}

/// Levels [`RangeMipPyramid::build`] produces over a `w0 × h0` level 0.
fn level_count(mut w: usize, mut h: usize, max_depth: Option<usize>) -> usize {
    let mut levels = 1;
    while (w > 1 || h > 1) && max_depth.is_none_or(|depth| levels < depth) {
        (w, h) = (w.div_ceil(2), h.div_ceil(2));
        levels += 1;
    }
    levels
}

fn tile_from_samples<T: HeightSample>(
    heights: &[T],
    width: usize,
    height: usize,
    tile: usize,
    tx: usize,
    ty: usize,
) -> HeightRange<T> {
    let xs = tx * tile..((tx + 1) * tile).min(width);
    let mut range = HeightRange::EMPTY;
    for y in ty * tile..((ty + 1) * tile).min(height) {
        for &sample in &heights[y * width + xs.start..y * width + xs.end] {
            range = range.including(sample);
        }
    }
    range
}

fn tile_from_children<T: HeightSample>(below: &Mip<T>, tx: usize, ty: usize) -> HeightRange<T> {
    let mut range = HeightRange::EMPTY;
    for cy in 2 * ty..(2 * ty + 2).min(below.height) {
        for cx in 2 * tx..(2 * tx + 2).min(below.width) {
            range = range.union(below.get(cx, cy));
        }
    }
    range
}
