//! Parameters at which a planar (2D) curve crosses one of its own knot lines along a given
//! axis, found by tessellating the curve and Newton-refining each polyline crossing.

use crate::errors::Error;
use crate::knot_vec::KnotVec;
use crate::nurbs_curve::NurbsCurve;
use crate::tessellation;
use kurve_base::cgmath64::Vector2;

/// Which of the curve's two parameter-space axes to intersect knot lines against.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Axis {
    /// the first (`u`) component
    U,
    /// the second (`v`) component
    V,
}

impl Axis {
    fn component(self, v: Vector2) -> f64 {
        match self {
            Axis::U => v.x,
            Axis::V => v.y,
        }
    }
}

/// The maximum number of Newton iterations [`intersect_axis`] runs before accepting the
/// last iterate, per Design Note §9 (no convergence failure for this algorithm).
pub const NEWTON_MAX_ITERATIONS: usize = 100;

/// Returns the sorted, deduplicated (within `tau`) list of parameters `t` in `curve`'s
/// domain at which `curve(t)`'s `axis` component crosses one of the values in `targets`
/// (typically a knot vector's distinct values).
///
/// Works by tessellating `curve` to tolerance `tau`, then for every polyline segment and
/// every target value lying between the segment's axis extrema (with `tau` slack),
/// Newton-iterating the scalar equation `f(t) = curve(t)[axis] - target` from the segment's
/// own parameter as the seed. A segment whose derivative is ~zero along `axis` is skipped
/// silently (Design Note: the source's Newton step has no convergence failure mode here).
pub fn intersect_axis(
    curve: &NurbsCurve<Vector2>,
    axis: Axis,
    targets: &[f64],
    tau: f64,
) -> Result<Vec<f64>, Error> {
    let polyline = tessellation::tessellate(curve, tau)?;
    let mut roots = Vec::new();

    for window in polyline.windows(2) {
        let (ta, pa) = (window[0].t, axis.component(window[0].point.to_vec()));
        let (tb, pb) = (window[1].t, axis.component(window[1].point.to_vec()));
        let (lo, hi) = if pa <= pb { (pa, pb) } else { (pb, pa) };

        for &target in targets {
            if target < lo - tau || target > hi + tau {
                continue;
            }
            if let Some(t) = newton_axis_root(curve, axis, target, ta, tb, tau)? {
                roots.push(t);
            }
        }
    }

    roots.sort_by(|a, b| a.partial_cmp(b).unwrap());
    dedup_within(&mut roots, tau);
    Ok(roots)
}

/// Returns every knot-line crossing of `curve` for both the `u` and `v` axes, merged,
/// sorted and deduplicated; optionally also including the curve's own span boundaries.
pub fn intersect_knot_lines(
    curve: &NurbsCurve<Vector2>,
    knots_u: &KnotVec,
    knots_v: &KnotVec,
    tau: f64,
    include_own_spans: bool,
) -> Result<Vec<f64>, Error> {
    let mut result = intersect_axis(curve, Axis::U, distinct_values(knots_u), tau)?;
    result.extend(intersect_axis(curve, Axis::V, distinct_values(knots_v), tau)?);
    if include_own_spans {
        for span in curve.spans() {
            result.push(span.t0());
            result.push(span.t1());
        }
    }
    result.sort_by(|a, b| a.partial_cmp(b).unwrap());
    dedup_within(&mut result, tau);
    Ok(result)
}

fn distinct_values(knots: &KnotVec) -> Vec<f64> {
    let mut values: Vec<f64> = knots.as_slice().to_vec();
    values.dedup_by(|a, b| (*a - *b).abs() < 1e-12);
    values
}

fn newton_axis_root(
    curve: &NurbsCurve<Vector2>,
    axis: Axis,
    target: f64,
    ta: f64,
    tb: f64,
    tau: f64,
) -> Result<Option<f64>, Error> {
    let domain = curve.domain();
    let mut t = (ta + tb) / 2.0;
    for _ in 0..NEWTON_MAX_ITERATIONS {
        let ders = curve.derivatives_at(domain.clamp(t), 1)?;
        let value = axis.component(ders[0]) - target;
        if value.abs() < tau {
            let t = domain.clamp(t);
            return Ok(domain.contains(t).then_some(t));
        }
        let deriv = axis.component(ders[1]);
        if deriv.abs() < 1e-14 {
            return Ok(None);
        }
        t = domain.clamp(t - value / deriv);
    }
    let t = domain.clamp(t);
    Ok(domain.contains(t).then_some(t))
}

fn dedup_within(values: &mut Vec<f64>, tau: f64) {
    let mut write = 0;
    for read in 0..values.len() {
        if write == 0 || values[read] - values[write - 1] > tau {
            values[write] = values[read];
            write += 1;
        }
    }
    values.truncate(write);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::knot_vec::KnotVec;

    fn diagonal_line() -> NurbsCurve<Vector2> {
        let knots = KnotVec::new_unchecked(vec![0.0, 10.0]);
        let poles = vec![Vector2::new(0.0, 0.0), Vector2::new(10.0, 10.0)];
        NurbsCurve::try_new(1, knots, poles).unwrap()
    }

    #[test]
    fn crosses_each_interior_knot_line_once() {
        let curve = diagonal_line();
        let knots_u = KnotVec::new_unchecked(vec![0.0, 0.0, 2.5, 5.0, 7.5, 10.0, 10.0]);
        let knots_v = KnotVec::new_unchecked(vec![0.0, 0.0, 5.0, 10.0, 10.0]);
        let roots = intersect_knot_lines(&curve, &knots_u, &knots_v, 1e-6, false).unwrap();
        // u = 2.5, 5, 7.5 and v = 5 all land on the diagonal line y = x
        assert!(roots.iter().any(|&t| (t - 2.5).abs() < 1e-4));
        assert!(roots.iter().any(|&t| (t - 5.0).abs() < 1e-4));
        assert!(roots.iter().any(|&t| (t - 7.5).abs() < 1e-4));
    }

    #[test]
    fn include_own_spans_adds_endpoints() {
        let curve = diagonal_line();
        let knots_u = KnotVec::new_unchecked(vec![0.0, 0.0, 10.0, 10.0]);
        let knots_v = KnotVec::new_unchecked(vec![0.0, 0.0, 10.0, 10.0]);
        let roots = intersect_knot_lines(&curve, &knots_u, &knots_v, 1e-6, true).unwrap();
        assert!(roots.iter().any(|&t| (t - 0.0).abs() < 1e-9));
        assert!(roots.iter().any(|&t| (t - 10.0).abs() < 1e-9));
    }
}
