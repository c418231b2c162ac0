//! Closest-point projection onto a curve: a polyline seed (built once at construction) is
//! refined per query by a 5-iteration-capped Newton step, then checked against the curve's
//! two domain endpoints.

use crate::control_point::ControlPoint;
use crate::errors::Error;
use crate::nurbs_curve::NurbsCurve;
use crate::tessellation::{self, PolylinePoint};
use cgmath::InnerSpace;
use kurve_base::Norm;

/// The Newton iteration cap for [`PointOnCurveProj::project`], per spec §4.8.
pub const MAX_NEWTON_ITERATIONS: usize = 5;

/// The result of projecting a point onto a curve.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Projection<V> {
    /// the parameter of the closest point found
    pub t: f64,
    /// the curve's position at `t`
    pub point: V,
    /// whether Newton refinement converged (by the distance or zero-cosine test) before
    /// exhausting [`MAX_NEWTON_ITERATIONS`]; `false` is a best-effort result, not a failure
    pub converged: bool,
}

/// Projects query points onto a fixed curve, reusing a once-built polyline seed across calls.
#[derive(Clone, Debug)]
pub struct PointOnCurveProj<V> {
    curve: NurbsCurve<V>,
    polyline: Vec<PolylinePoint<V>>,
}

impl<V> PointOnCurveProj<V>
where
    V: ControlPoint,
    V::Diff: Norm + InnerSpace<Scalar = f64>,
{
    /// Builds a projector for `curve`, tessellating it once to `tessellation_tolerance`.
    pub fn new(curve: NurbsCurve<V>, tessellation_tolerance: f64) -> Result<Self, Error> {
        let polyline = tessellation::tessellate(&curve, tessellation_tolerance)?;
        Ok(PointOnCurveProj { curve, polyline })
    }

    /// the underlying curve
    pub fn curve(&self) -> &NurbsCurve<V> { &self.curve }

    /// Projects `q` onto the curve. `eps1` bounds the residual distance, `eps2` the
    /// zero-cosine test; both are the spec's Newton tolerances (defaults 1e-7 / 1e-12 via
    /// [`Self::project_default`]).
    pub fn project(&self, q: V, eps1: f64, eps2: f64) -> Projection<V> {
        let seed_t = self.seed(q);
        let (t, converged) = self.refine(q, seed_t, eps1, eps2);
        self.endpoint_guard(q, t, converged)
    }

    /// [`Self::project`] with the spec's documented default tolerances.
    pub fn project_default(&self, q: V) -> Projection<V> { self.project(q, 1e-7, 1e-12) }

    /// Stage 1: the polyline segment whose orthogonal projection of `q` is nearest,
    /// returning the curve parameter of its closer endpoint as the Newton seed.
    fn seed(&self, q: V) -> f64 {
        let mut best_t = self.polyline[0].t;
        let mut best_d2 = f64::INFINITY;
        for window in self.polyline.windows(2) {
            let (a, b) = (window[0], window[1]);
            let ab = b.point.to_vec() - a.point.to_vec();
            let len2 = ab.dot(ab);
            let s = if len2 < 1e-20 { 0.0 } else { ((q - a.point).dot(ab) / len2).clamp(0.0, 1.0) };
            let proj = a.point + ab * s;
            let d2 = (q - proj).dot(q - proj);
            if d2 < best_d2 {
                best_d2 = d2;
                best_t = a.t + (b.t - a.t) * s;
            }
        }
        best_t
    }

    /// Stage 2: Newton iteration on `f(t) = C'(t)*(C(t) - q)`.
    fn refine(&self, q: V, mut t: f64, eps1: f64, eps2: f64) -> (f64, bool) {
        let domain = self.curve.domain();
        for _ in 0..MAX_NEWTON_ITERATIONS {
            let Ok(ders) = self.curve.derivatives_at(t, 2) else { break };
            let (point, d1, d2) = (ders[0], ders[1], ders[2]);
            let diff = point - q.to_vec();
            let residual = diff.norm_l2();
            if residual < eps1 {
                return (t, true);
            }
            let cosine = (d1.dot(diff) / (d1.norm_l2() * residual.max(1e-300))).abs();
            if cosine < eps2 {
                return (t, true);
            }
            let denom = d2.dot(diff) + d1.dot(d1);
            if denom.abs() < 1e-300 {
                break;
            }
            let delta = d1.dot(diff) / denom;
            t = domain.clamp(t - delta);
        }
        (t, false)
    }

    /// Stage 3: compares the refined point against the two domain endpoints.
    fn endpoint_guard(&self, q: V, t: f64, converged: bool) -> Projection<V> {
        let domain = self.curve.domain();
        let candidates = [t, domain.t0(), domain.t1()];
        let mut best = Projection {
            t,
            point: self.curve.point_at(t).unwrap_or(self.polyline[0].point),
            converged,
        };
        let mut best_d2 = (q - best.point).dot(q - best.point);
        for &candidate in &candidates[1..] {
            if let Ok(point) = self.curve.point_at(candidate) {
                let d2 = (q - point).dot(q - point);
                if d2 < best_d2 {
                    best_d2 = d2;
                    best = Projection { t: candidate, point, converged: candidate == t && converged };
                }
            }
        }
        best
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::knot_vec::KnotVec;
    use kurve_base::cgmath64::Point2;

    fn quarter_circle() -> NurbsCurve<Point2> {
        let w = std::f64::consts::FRAC_1_SQRT_2;
        let knots = KnotVec::new_unchecked(vec![0.0, 0.0, 1.0, 1.0]);
        let poles = vec![Point2::new(1.0, 0.0), Point2::new(1.0, 1.0), Point2::new(0.0, 1.0)];
        NurbsCurve::try_new_rational(2, knots, poles, vec![1.0, w, 1.0]).unwrap()
    }

    #[test]
    fn projects_onto_curve_interior() {
        let curve = quarter_circle();
        let projector = PointOnCurveProj::new(curve, 1e-4).unwrap();
        let q = Point2::new(1.5, 1.5);
        let result = projector.project_default(q);
        assert!(result.t > 0.0 && result.t < 1.0);
        let on_curve = projector.curve().point_at(result.t).unwrap();
        assert!((on_curve.x - result.point.x).abs() < 1e-9);
    }

    #[test]
    fn projects_onto_endpoint_when_query_is_beyond_it() {
        let curve = quarter_circle();
        let projector = PointOnCurveProj::new(curve, 1e-4).unwrap();
        let q = Point2::new(3.0, -3.0);
        let result = projector.project_default(q);
        assert!((result.t - 0.0).abs() < 1e-6);
    }

    #[test]
    fn stationarity_holds_for_interior_results() {
        let curve = quarter_circle();
        let projector = PointOnCurveProj::new(curve, 1e-5).unwrap();
        let q = Point2::new(0.9, 0.9);
        let result = projector.project_default(q);
        if result.t > 1e-6 && result.t < 1.0 - 1e-6 {
            let ders = projector.curve().derivatives_at(result.t, 1).unwrap();
            let diff = ders[0] - (q - Point2::origin());
            let cosine = (ders[1].dot(diff) / (ders[1].norm_l2() * diff.norm_l2().max(1e-300))).abs();
            assert!(cosine < 1e-6, "cosine={cosine}");
        }
    }
}
