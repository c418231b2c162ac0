//! An axis-aligned bounding box over a fixed number of dimensions `D`, used both as the
//! plain geometric `Box<D>` of the persistent-store boundary and as the box type the
//! packed-Hilbert R-tree indexes.

use serde::{Deserialize, Serialize};

/// An axis-aligned box `[min, max]` in `ℝ^D`. Empty until the first [`BoundingBox::push`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox<const D: usize> {
    min: [f64; D],
    max: [f64; D],
}

impl<const D: usize> Default for BoundingBox<D> {
    fn default() -> Self { BoundingBox { min: [f64::INFINITY; D], max: [f64::NEG_INFINITY; D] } }
}

impl<const D: usize> BoundingBox<D> {
    /// An empty bounding box.
    pub fn new() -> Self { Self::default() }

    /// A box with the given corners, without requiring `min <= max` component-wise.
    pub fn from_corners(a: [f64; D], b: [f64; D]) -> Self {
        let mut result = Self::new();
        result.push(&a);
        result.push(&b);
        result
    }

    /// Extends the box to contain `point`. NaN components are ignored.
    pub fn push(&mut self, point: &[f64; D]) {
        for i in 0..D {
            if point[i].is_nan() {
                continue;
            }
            if point[i] < self.min[i] {
                self.min[i] = point[i];
            }
            if point[i] > self.max[i] {
                self.max[i] = point[i];
            }
        }
    }

    /// Whether this box has never had a point pushed into it.
    pub fn is_empty(&self) -> bool { (0..D).any(|i| self.min[i] > self.max[i]) }

    /// the lower corner
    pub fn min(&self) -> [f64; D] { self.min }
    /// the upper corner
    pub fn max(&self) -> [f64; D] { self.max }

    /// the center of the box; NaN in every component if the box is empty
    pub fn center(&self) -> [f64; D] { std::array::from_fn(|i| (self.min[i] + self.max[i]) / 2.0) }

    /// Whether `self` and `other` overlap (touching at a boundary counts as overlapping).
    pub fn intersects(&self, other: &Self) -> bool {
        (0..D).all(|i| self.min[i] <= other.max[i] && other.min[i] <= self.max[i])
    }

    /// Whether `self` entirely contains `other`.
    pub fn contains_box(&self, other: &Self) -> bool {
        (0..D).all(|i| self.min[i] <= other.min[i] && other.max[i] <= self.max[i])
    }

    /// The union of `self` and `other`.
    pub fn union(&self, other: &Self) -> Self {
        let mut result = self.clone();
        result.push(&other.min);
        result.push(&other.max);
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_grows_the_box() {
        let mut b: BoundingBox<2> = BoundingBox::new();
        b.push(&[1.0, -1.0]);
        b.push(&[-1.0, 1.0]);
        assert_eq!(b.min(), [-1.0, -1.0]);
        assert_eq!(b.max(), [1.0, 1.0]);
        assert!(!b.is_empty());
    }

    #[test]
    fn empty_box_reports_empty() {
        let b: BoundingBox<3> = BoundingBox::new();
        assert!(b.is_empty());
    }

    #[test]
    fn intersects_is_symmetric_and_inclusive_of_touching() {
        let a: BoundingBox<2> = BoundingBox::from_corners([0.0, 0.0], [1.0, 1.0]);
        let b: BoundingBox<2> = BoundingBox::from_corners([1.0, 0.0], [2.0, 1.0]);
        assert!(a.intersects(&b));
        assert!(b.intersects(&a));
        let c: BoundingBox<2> = BoundingBox::from_corners([2.0, 2.0], [3.0, 3.0]);
        assert!(!a.intersects(&c));
    }

    #[test]
    fn contains_box() {
        let outer: BoundingBox<2> = BoundingBox::from_corners([0.0, 0.0], [10.0, 10.0]);
        let inner: BoundingBox<2> = BoundingBox::from_corners([1.0, 1.0], [2.0, 2.0]);
        assert!(outer.contains_box(&inner));
        assert!(!inner.contains_box(&outer));
    }
}
