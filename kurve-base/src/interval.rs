//! The closed 1D parameter range shared by curves, surfaces and knot spans.

use serde::{Deserialize, Serialize};

/// minimum span length above which an [`Interval`] is considered non-degenerate.
pub const MIN_SPAN_LENGTH: f64 = 1.0e-7;

/// A closed parameter interval `[t0, t1]`.
///
/// `t0` may be greater than `t1`; [`Interval::length`] always returns a
/// non-negative value and the other operations are defined in terms of it.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Interval {
    t0: f64,
    t1: f64,
}

impl Interval {
    /// Creates a new interval `[t0, t1]`.
    /// # Examples
    /// ```
    /// use kurve_base::interval::Interval;
    /// let domain = Interval::new(0.0, 1.0);
    /// assert_eq!(domain.t0(), 0.0);
    /// assert_eq!(domain.t1(), 1.0);
    /// ```
    pub fn new(t0: f64, t1: f64) -> Self { Interval { t0, t1 } }

    /// The lower bound.
    pub fn t0(&self) -> f64 { self.t0 }

    /// The upper bound.
    pub fn t1(&self) -> f64 { self.t1 }

    /// `|t1 - t0|`.
    pub fn length(&self) -> f64 { (self.t1 - self.t0).abs() }

    /// Whether the interval is too short to be meaningful (`length < 1e-7`).
    /// # Examples
    /// ```
    /// use kurve_base::interval::Interval;
    /// assert!(Interval::new(1.0, 1.0 + 1e-9).is_degenerate());
    /// assert!(!Interval::new(0.0, 1.0).is_degenerate());
    /// ```
    pub fn is_degenerate(&self) -> bool { self.length() < MIN_SPAN_LENGTH }

    /// Maps `t` in `[t0, t1]` to `[0, 1]`. Undefined (divides by zero) on a degenerate interval.
    pub fn normalized(&self, t: f64) -> f64 { (t - self.t0) / (self.t1 - self.t0) }

    /// Maps `u` in `[0, 1]` to `[t0, t1]`, the inverse of [`Interval::normalized`].
    pub fn parameter_at_normalized(&self, u: f64) -> f64 { self.t0 + u * (self.t1 - self.t0) }

    /// Clamps `t` into `[min(t0, t1), max(t0, t1)]`.
    pub fn clamp(&self, t: f64) -> f64 {
        let (lo, hi) = if self.t0 <= self.t1 { (self.t0, self.t1) } else { (self.t1, self.t0) };
        t.max(lo).min(hi)
    }

    /// Whether `t` lies in `[min(t0, t1), max(t0, t1)]`.
    pub fn contains(&self, t: f64) -> bool {
        let (lo, hi) = if self.t0 <= self.t1 { (self.t0, self.t1) } else { (self.t1, self.t0) };
        t >= lo && t <= hi
    }

    /// The intersection of two intervals, or `None` if they do not overlap
    /// (or overlap only in a degenerate range).
    pub fn intersect(&self, other: &Interval) -> Option<Interval> {
        let (a0, a1) = (self.t0.min(self.t1), self.t0.max(self.t1));
        let (b0, b1) = (other.t0.min(other.t1), other.t0.max(other.t1));
        let lo = a0.max(b0);
        let hi = a1.min(b1);
        let result = Interval::new(lo, hi);
        (!result.is_degenerate() && lo <= hi).then_some(result)
    }
}
