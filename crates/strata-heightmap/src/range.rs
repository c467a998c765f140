//! Closed `[min, max]` height intervals.

use crate::HeightSample;

/// Bounds of a set of heights. The empty set has `min > max`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HeightRange<T> {
    pub min: T,
    pub max: T,
}

impl<T: HeightSample> HeightRange<T> {
    /// Identity for [`union`](Self::union).
    pub const EMPTY: Self = Self {
        min: T::HIGHEST,
        max: T::LOWEST,
    };

    pub fn new(min: T, max: T) -> Self {
        Self { min, max }
    }

    pub fn point(value: T) -> Self {
        Self {
            min: value,
            max: value,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.min > self.max
    }

    #[must_use]
    pub fn union(self, other: Self) -> Self {
        Self {
            min: self.min.min_of(other.min),
            max: self.max.max_of(other.max),
        }
    }

    #[must_use]
    pub fn including(self, value: T) -> Self {
        self.union(Self::point(value))
    }

    /// True when `other` lies within `self`.
    pub fn contains_range(&self, other: &Self) -> bool {
        other.is_empty() || (self.min <= other.min && other.max <= self.max)
    }
}

impl<T: HeightSample> Default for HeightRange<T> {
    fn default() -> Self {
        Self::EMPTY
    }
}

impl<T: HeightSample> FromIterator<T> for HeightRange<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        iter.into_iter().fold(Self::EMPTY, Self::including)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_is_union_identity() {
        let range = HeightRange::new(3u16, 9);
        assert_eq!(HeightRange::EMPTY.union(range), range);
        assert!(HeightRange::<f32>::EMPTY.is_empty());
    }

    #[test]
    fn test_collects_bounds() {
        let range: HeightRange<f32> = [2.5, -1.0, 7.0].into_iter().collect();
        assert_eq!(range, HeightRange::new(-1.0, 7.0));
        assert!(range.contains_range(&HeightRange::point(0.0)));
        assert!(!range.contains_range(&HeightRange::point(8.0)));
    }
}
