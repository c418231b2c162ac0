//! The "clamped-without-duplicated-endpoints" knot vector convention: for degree `p` and
//! `n` poles the vector has `n + p - 1` entries, and the first/last `p` values are repeated
//! only implicitly by the span-lookup rule, never physically duplicated in storage.

use crate::errors::Error;
use serde::{Deserialize, Serialize};

/// A non-decreasing sequence of knot values, in the `n + p - 1` convention.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct KnotVec(Vec<f64>);

impl KnotVec {
    /// Wraps a vector of knots as-is, without checking monotonicity.
    pub fn new_unchecked(knots: Vec<f64>) -> Self { KnotVec(knots) }

    /// Wraps a vector of knots, failing if it is not sorted.
    pub fn try_new(knots: Vec<f64>) -> Result<Self, Error> {
        if knots.windows(2).any(|w| w[0] > w[1]) {
            return Err(Error::NotSortedVector);
        }
        Ok(KnotVec(knots))
    }

    /// The number of stored knot entries (`n + p - 1`).
    pub fn len(&self) -> usize { self.0.len() }

    /// Whether there are no stored knots at all.
    pub fn is_empty(&self) -> bool { self.0.is_empty() }

    /// The raw knot slice.
    pub fn as_slice(&self) -> &[f64] { &self.0 }

    /// `self[index]`.
    pub fn knot(&self, index: usize) -> f64 { self.0[index] }

    /// The number of poles implied by this knot vector and `degree`: `len - degree + 1`.
    pub fn nb_poles(&self, degree: usize) -> usize { self.len() - degree + 1 }

    /// The number of distinct spans implied by this knot vector and `degree`:
    /// `len - 2 * degree + 1`.
    pub fn nb_spans(&self, degree: usize) -> usize { self.len() + 1 - 2 * degree }

    /// One past the last index a span lookup ever returns: `len - degree`. This is also the
    /// index of the knot at the right end of the domain.
    fn span_search_upper(&self, degree: usize) -> usize { self.len() - degree }

    /// The domain `[knot[p-1], knot[len-p]]` implied by `degree` and the stored knot count.
    pub fn domain(&self, degree: usize) -> kurve_base::Interval {
        kurve_base::Interval::new(self.0[degree - 1], self.0[self.span_search_upper(degree)])
    }

    /// `upper_span(degree, t)`: the largest span index `i` with `knot[i] <= t`, found by
    /// binary search over `knot[degree .. len-degree]`. At the right endpoint of the domain
    /// this returns `len - degree - 1`, the last valid span index.
    pub fn upper_span(&self, degree: usize, t: f64) -> usize {
        let upper = self.span_search_upper(degree);
        upper_bound(&self.0, degree, upper, t) - 1
    }

    /// `lower_span(degree, t)`: as [`KnotVec::upper_span`] but using strict inequality
    /// `knot[i] < t`.
    pub fn lower_span(&self, degree: usize, t: f64) -> usize {
        let upper = self.span_search_upper(degree);
        lower_bound(&self.0, degree, upper, t) - 1
    }

    /// Returns every non-degenerate knot span (consecutive distinct knot values) inside
    /// the domain, as a list of [`kurve_base::Interval`].
    pub fn spans(&self, degree: usize) -> Vec<kurve_base::Interval> {
        let last = self.span_search_upper(degree);
        let mut result = Vec::new();
        let mut i = degree - 1;
        while i < last {
            let span = kurve_base::Interval::new(self.0[i], self.0[i + 1]);
            if !span.is_degenerate() {
                result.push(span);
            }
            i += 1;
        }
        result
    }
}

/// The smallest index `i` in `[lower, upper]` with `knots[i] > t` (`upper` itself is a valid
/// sentinel return value when no such index exists in `[lower, upper)`).
fn upper_bound(knots: &[f64], lower: usize, upper: usize, t: f64) -> usize {
    let mut lo = lower;
    let mut hi = upper;
    while lo < hi {
        let mid = lo + (hi - lo) / 2;
        if knots[mid] > t {
            hi = mid;
        } else {
            lo = mid + 1;
        }
    }
    lo
}

/// The smallest index `i` in `[lower, upper]` with `knots[i] >= t`.
fn lower_bound(knots: &[f64], lower: usize, upper: usize, t: f64) -> usize {
    let mut lo = lower;
    let mut hi = upper;
    while lo < hi {
        let mid = lo + (hi - lo) / 2;
        if knots[mid] >= t {
            hi = mid;
        } else {
            lo = mid + 1;
        }
    }
    lo
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_knots() -> KnotVec {
        // degree 3, 5 poles: len = n + p - 1 = 7
        KnotVec::new_unchecked(vec![0.0, 0.0, 0.0, 1.0, 2.0, 2.0, 2.0])
    }

    #[test]
    fn domain_and_counts() {
        let k = sample_knots();
        let degree = 3;
        assert_eq!(k.nb_poles(degree), 5);
        assert_eq!(k.nb_spans(degree), 2);
        let domain = k.domain(degree);
        assert_eq!((domain.t0(), domain.t1()), (0.0, 2.0));
    }

    #[test]
    fn upper_span_clamped_at_right_endpoint() {
        let k = sample_knots();
        let degree = 3;
        // last valid span index is nb_spans(degree) + degree - 2 = 3
        assert_eq!(k.upper_span(degree, 2.0), 3);
        assert_eq!(k.upper_span(degree, 0.0), degree - 1);
        assert_eq!(k.upper_span(degree, 1.5), 3);
    }

    #[test]
    fn lower_span_uses_strict_inequality() {
        let k = sample_knots();
        let degree = 3;
        assert_eq!(k.lower_span(degree, 1.0), 2);
        assert_eq!(k.lower_span(degree, 1.5), 3);
    }

    #[test]
    fn spans_skip_degenerate_intervals() {
        let k = sample_knots();
        let spans = k.spans(3);
        assert_eq!(spans.len(), 2);
        assert_eq!((spans[0].t0(), spans[0].t1()), (0.0, 1.0));
        assert_eq!((spans[1].t0(), spans[1].t1()), (1.0, 2.0));
    }
}
