//! The composition of a 2D parameter-space curve with a surface: `(S ∘ γ)(t)`, with
//! derivatives by Faà di Bruno's formula over the two inner functions `γ_u`, `γ_v`.

use crate::curve::Curve;
use crate::errors::Result;
use kurve_base::cgmath64::{Vector2, Zero};
use kurve_base::Interval;
use kurve_geometry::control_point::ControlPoint;
use kurve_geometry::shape::surface::shape_index;
use kurve_geometry::NurbsSurface;
use std::collections::HashMap;
use std::sync::Arc;

/// A curve living in a surface's parameter space, composed with the surface itself to
/// trace a 3D curve: `γ(t)` is the 2D curve, `S(u, v)` the surface, and this type
/// evaluates `(S ∘ γ)(t)` and its derivatives.
#[derive(Clone, Debug)]
pub struct CurveOnSurface<V> {
    curve2d: Curve<Vector2>,
    surface: Arc<NurbsSurface<V>>,
}

impl<V: ControlPoint> CurveOnSurface<V> {
    /// Composes `curve2d` (a bounded curve in `(u, v)` parameter space) with `surface`.
    pub fn new(curve2d: Curve<Vector2>, surface: Arc<NurbsSurface<V>>) -> Self {
        CurveOnSurface { curve2d, surface }
    }

    /// the parameter-space curve `γ`
    pub fn curve2d(&self) -> &Curve<Vector2> { &self.curve2d }
    /// the surface `S`
    pub fn surface(&self) -> &NurbsSurface<V> { &self.surface }
    /// `γ`'s restricted domain, also this composition's domain
    pub fn domain(&self) -> Interval { self.curve2d.domain() }

    /// `(S ∘ γ)(t)`.
    pub fn point_at(&self, t: f64) -> Result<V> {
        let uv = self.curve2d.point_at(t)?;
        Ok(self.surface.point_at(uv.x, uv.y)?)
    }

    /// `(S ∘ γ)(t)` and its first `order` derivatives with respect to `t`, by the
    /// recursion of spec §4.7:
    ///
    /// ```text
    /// c(0, i, j) = ∂^(i+j) S / ∂u^i ∂v^j
    /// c(n, i, j) = Σ_{a=1..n} C(n-1, a-1) · [ c(n-a, i+1, j)·γ_u^(a) + c(n-a, i, j+1)·γ_v^(a) ]
    /// ```
    ///
    /// with the result at derivative order `k` being `c(k, 0, 0)`.
    pub fn derivatives_at(&self, t: f64, order: usize) -> Result<Vec<V::Diff>> {
        let uv = self.curve2d.point_at(t)?;
        let gamma_ders = self.curve2d.derivatives_at(t, order)?;
        let surface_ders = self.surface.derivatives_at(uv.x, uv.y, order)?;

        let mut memo: HashMap<(usize, usize, usize), V::Diff> = HashMap::new();
        let mut result = Vec::with_capacity(order + 1);
        for n in 0..=order {
            result.push(compose::<V>(n, 0, 0, &surface_ders, &gamma_ders, &mut memo));
        }
        Ok(result)
    }

    /// The curve parameters at which `γ` crosses one of the surface's `u`/`v` knot lines,
    /// found by [`kurve_geometry::span_intersection`] and clipped to this composition's
    /// domain, with the domain endpoints always included.
    pub fn spans(&self, tau: f64) -> Result<Vec<Interval>> {
        let roots = kurve_geometry::span_intersection::intersect_knot_lines(
            self.curve2d.geometry(),
            self.surface.knots_u(),
            self.surface.knots_v(),
            tau,
            true,
        )?;
        let domain = self.domain();
        let mut ts: Vec<f64> = roots.into_iter().filter(|&t| domain.contains(t)).collect();
        ts.push(domain.t0());
        ts.push(domain.t1());
        ts.sort_by(|a, b| a.partial_cmp(b).unwrap());
        ts.dedup_by(|a, b| (*a - *b).abs() < tau);

        let mut spans = Vec::new();
        for w in ts.windows(2) {
            let span = Interval::new(w[0], w[1]);
            if !span.is_degenerate() {
                spans.push(span);
            }
        }
        Ok(spans)
    }
}

fn binom(n: usize, k: usize) -> f64 {
    if k > n {
        return 0.0;
    }
    let k = k.min(n - k);
    let mut result = 1.0;
    for i in 0..k {
        result = result * (n - i) as f64 / (i + 1) as f64;
    }
    result
}

/// `c(n, i, j)` of spec §4.7, memoized since the recursion revisits the same `(n, i, j)`
/// many times along different `a` paths.
fn compose<V: ControlPoint>(
    n: usize,
    i: usize,
    j: usize,
    surface_ders: &[V::Diff],
    gamma_ders: &[Vector2],
    memo: &mut HashMap<(usize, usize, usize), V::Diff>,
) -> V::Diff {
    if let Some(&value) = memo.get(&(n, i, j)) {
        return value;
    }
    let value = if n == 0 {
        surface_ders[shape_index(i, j)]
    } else {
        let mut acc = V::Diff::zero();
        for a in 1..=n {
            let coeff = binom(n - 1, a - 1);
            let du = gamma_ders[a].x;
            let dv = gamma_ders[a].y;
            let cu = compose::<V>(n - a, i + 1, j, surface_ders, gamma_ders, memo);
            let cv = compose::<V>(n - a, i, j + 1, surface_ders, gamma_ders, memo);
            acc = acc + cu * (coeff * du) + cv * (coeff * dv);
        }
        acc
    };
    memo.insert((n, i, j), value);
    value
}

#[cfg(test)]
mod tests {
    use super::*;
    use kurve_base::cgmath64::Point3;
    use kurve_geometry::knot_vec::KnotVec;
    use kurve_geometry::NurbsCurve;

    fn line_on_surface() -> CurveOnSurface<Point3> {
        // Line P0=(3,2), P1=(1,4), P2=(2,5) as a degree-2 B-spline on [7,7,9,9]
        let poles2 = vec![Vector2::new(3.0, 2.0), Vector2::new(1.0, 4.0), Vector2::new(2.0, 5.0)];
        let knots_quad = KnotVec::new_unchecked(vec![7.0, 7.0, 9.0, 9.0]);
        let curve2d_geom = NurbsCurve::try_new(2, knots_quad, poles2).unwrap();
        let curve2d = Curve::full(Arc::new(curve2d_geom));

        let knots_u = KnotVec::new_unchecked(vec![0.0, 0.0, 10.0, 10.0]);
        let knots_v = KnotVec::new_unchecked(vec![0.0, 0.0, 10.0, 10.0]);
        let poles = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(0.0, 5.0, 1.0),
            Point3::new(0.0, 10.0, 0.0),
            Point3::new(5.0, 0.0, 1.0),
            Point3::new(5.0, 5.0, 2.0),
            Point3::new(5.0, 10.0, 1.0),
            Point3::new(10.0, 0.0, 0.0),
            Point3::new(10.0, 5.0, 1.0),
            Point3::new(10.0, 10.0, 0.0),
        ];
        let surface = NurbsSurface::try_new(2, 2, knots_u, knots_v, poles).unwrap();
        CurveOnSurface::new(curve2d, Arc::new(surface))
    }

    #[test]
    fn point_at_matches_surface_composition() {
        let cos = line_on_surface();
        let uv = cos.curve2d().point_at(8.0).unwrap();
        let direct = cos.surface().point_at(uv.x, uv.y).unwrap();
        let composed = cos.point_at(8.0).unwrap();
        assert!((direct.x - composed.x).abs() < 1e-12);
        assert!((direct.y - composed.y).abs() < 1e-12);
        assert!((direct.z - composed.z).abs() < 1e-12);
    }

    #[test]
    fn derivatives_zero_order_matches_point_at() {
        let cos = line_on_surface();
        let ders = cos.derivatives_at(8.0, 1).unwrap();
        let point = cos.point_at(8.0).unwrap();
        assert!((ders[0].x - point.x).abs() < 1e-12);
        assert!((ders[0].y - point.y).abs() < 1e-12);
        assert!((ders[0].z - point.z).abs() < 1e-12);
    }

    #[test]
    fn spans_cover_full_domain() {
        let cos = line_on_surface();
        let spans = cos.spans(1e-3).unwrap();
        assert!((spans.first().unwrap().t0() - 7.0).abs() < 1e-9);
        assert!((spans.last().unwrap().t1() - 9.0).abs() < 1e-9);
    }
}
