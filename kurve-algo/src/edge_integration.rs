//! Edge integration points: pairs the parameters of an edge's two trims along their shared
//! 3D curve and places quadrature points on it.

use crate::errors::{Error, Result};
use crate::integration::gauss_legendre_1d;
use cgmath::InnerSpace;
use kurve_base::Interval;
use kurve_base::Norm;
use kurve_geometry::control_point::ControlPoint;
use kurve_geometry::point_on_curve::Projection;
use kurve_topology::{CurveOnSurface, Edge, Trim};

/// The Newton iteration cap for the curve-on-surface projector below, matching
/// [`kurve_geometry::point_on_curve::MAX_NEWTON_ITERATIONS`].
const MAX_NEWTON_ITERATIONS: usize = 5;

/// One quadrature point along an edge: the shared 3D position, the corresponding parameter
/// on each adjacent trim's 3D curve, and an integration weight already scaled by the
/// tangent norm of trim B's curve.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EdgeIntegrationPoint<V> {
    /// the shared 3D position
    pub point: V,
    /// the parameter on trim A's 3D curve
    pub t_a: f64,
    /// the parameter on trim B's 3D curve
    pub t_b: f64,
    /// the integration weight, scaled by `‖dC_b/dt‖`
    pub weight: f64,
}

/// Computes the integration points of `edge`'s shared 3D curve, at tessellation/projection
/// tolerance `tolerance`. `edge` must have exactly two registered trims, one on each
/// adjacent face; any other count is [`Error::NotManifoldEdge`].
///
/// Breakpoints are gathered from trim B's own span starts plus trim A's span starts
/// projected onto trim B's curve (per §4.14), so a 1D Gauss rule of degree `max(p_u, p_v) +
/// 1` over every surface involved can be placed on each resulting segment without straddling
/// a non-smooth point of either surface's composition.
pub fn edge_integration_points<V>(edge: &Edge<V>, tolerance: f64) -> Result<Vec<EdgeIntegrationPoint<V>>>
where
    V: ControlPoint,
    V::Diff: Norm + InnerSpace<Scalar = f64>,
{
    let trims = edge.trims();
    if trims.len() != 2 {
        return Err(Error::NotManifoldEdge(trims.len()));
    }
    let trim_a = Trim::from_inner(trims[0].clone());
    let trim_b = Trim::from_inner(trims[1].clone());

    let face_a = trim_a.loop_().and_then(|l| l.face()).ok_or(Error::DetachedTrim)?;
    let face_b = trim_b.loop_().and_then(|l| l.face()).ok_or(Error::DetachedTrim)?;

    let curve_a = CurveOnSurface::new(trim_a.curve2d().clone(), face_a.surface().clone());
    let curve_b = CurveOnSurface::new(trim_b.curve2d().clone(), face_b.surface().clone());

    let degree = face_a
        .surface()
        .degree_u()
        .max(face_a.surface().degree_v())
        .max(face_b.surface().degree_u())
        .max(face_b.surface().degree_v())
        + 1;

    let projector_a = CurveOnSurfaceProj::new(curve_a.clone(), tolerance)?;
    let projector_b = CurveOnSurfaceProj::new(curve_b.clone(), tolerance)?;

    let mut breakpoints: Vec<f64> = curve_b.spans(tolerance)?.into_iter().map(|span| span.t0()).collect();
    breakpoints.push(curve_b.domain().t1());
    for span in curve_a.spans(tolerance)? {
        let point = curve_a.point_at(span.t0())?;
        breakpoints.push(projector_b.project_default(point).t);
    }
    breakpoints.sort_by(|a, b| a.partial_cmp(b).unwrap());
    breakpoints.dedup_by(|a, b| (*a - *b).abs() < tolerance);

    let mut result = Vec::new();
    for w in breakpoints.windows(2) {
        let segment = Interval::new(w[0], w[1]);
        if segment.is_degenerate() {
            continue;
        }
        for (t_b, weight) in gauss_legendre_1d(degree, segment)? {
            let point = curve_b.point_at(t_b)?;
            let tangent = curve_b.derivatives_at(t_b, 1)?[1];
            let t_a = projector_a.project_default(point).t;
            result.push(EdgeIntegrationPoint { point, t_a, t_b, weight: weight * tangent.norm_l2() });
        }
    }
    Ok(result)
}

/// Projects points onto a fixed [`CurveOnSurface`], the same three-stage algorithm as
/// [`kurve_geometry::point_on_curve::PointOnCurveProj`] (polyline seed, Newton refine,
/// endpoint guard) adapted to a composed curve that has no single `NurbsCurve` to tessellate
/// directly.
struct CurveOnSurfaceProj<V> {
    curve: CurveOnSurface<V>,
    polyline: Vec<(f64, V)>,
}

impl<V> CurveOnSurfaceProj<V>
where
    V: ControlPoint,
    V::Diff: Norm + InnerSpace<Scalar = f64>,
{
    fn new(curve: CurveOnSurface<V>, tolerance: f64) -> Result<Self> {
        let polyline = tessellate(&curve, tolerance)?;
        Ok(CurveOnSurfaceProj { curve, polyline })
    }

    fn project_default(&self, q: V) -> Projection<V> { self.project(q, 1e-7, 1e-12) }

    fn project(&self, q: V, eps1: f64, eps2: f64) -> Projection<V> {
        let seed_t = self.seed(q);
        let (t, converged) = self.refine(q, seed_t, eps1, eps2);
        self.endpoint_guard(q, t, converged)
    }

    fn seed(&self, q: V) -> f64 {
        let mut best_t = self.polyline[0].0;
        let mut best_d2 = f64::INFINITY;
        for window in self.polyline.windows(2) {
            let (ta, pa) = window[0];
            let (tb, pb) = window[1];
            let ab = pb.to_vec() - pa.to_vec();
            let len2 = ab.dot(ab);
            let s = if len2 < 1e-20 { 0.0 } else { ((q - pa).dot(ab) / len2).clamp(0.0, 1.0) };
            let proj = pa + ab * s;
            let d2 = (q - proj).dot(q - proj);
            if d2 < best_d2 {
                best_d2 = d2;
                best_t = ta + (tb - ta) * s;
            }
        }
        best_t
    }

    fn refine(&self, q: V, mut t: f64, eps1: f64, eps2: f64) -> (f64, bool) {
        let domain = self.curve.domain();
        for _ in 0..MAX_NEWTON_ITERATIONS {
            let Ok(point) = self.curve.point_at(t) else { break };
            let Ok(ders) = self.curve.derivatives_at(t, 2) else { break };
            let (d1, d2) = (ders[1], ders[2]);
            let diff = point.to_vec() - q.to_vec();
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

    fn endpoint_guard(&self, q: V, t: f64, converged: bool) -> Projection<V> {
        let domain = self.curve.domain();
        let fallback = self.polyline[0].1;
        let mut best = Projection { t, point: self.curve.point_at(t).unwrap_or(fallback), converged };
        let mut best_d2 = (q - best.point).dot(q - best.point);
        for &candidate in &[domain.t0(), domain.t1()] {
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

/// Adaptive chord-tolerance tessellation of a [`CurveOnSurface`], mirroring
/// [`kurve_geometry::tessellation::tessellate`] but seeded from [`CurveOnSurface::spans`]
/// since there is no single `NurbsCurve` backing the composed curve to call the geometry
/// crate's tessellator on directly.
fn tessellate<V>(curve: &CurveOnSurface<V>, tolerance: f64) -> Result<Vec<(f64, V)>>
where
    V: ControlPoint,
    V::Diff: Norm,
{
    let domain = curve.domain();
    let mut samples: Vec<(f64, V)> = Vec::new();
    for span in curve.spans(tolerance)? {
        samples.push((domain.normalized(span.t0()), curve.point_at(span.t0())?));
    }
    samples.push((1.0, curve.point_at(domain.t1())?));
    samples.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap());

    let degree = curve
        .curve2d()
        .geometry()
        .degree()
        .max(curve.surface().degree_u())
        .max(curve.surface().degree_v());
    let n = degree * 2 + 1;

    let mut points = Vec::new();
    loop {
        let (t_a, point_a) = samples.pop().expect("at least the domain endpoint is sampled");
        points.push((domain.parameter_at_normalized(t_a), point_a));
        if samples.is_empty() {
            break;
        }
        loop {
            let (t_b, point_b) = *samples.last().expect("checked non-empty above");
            let mut max_distance = 0.0_f64;
            let mut max_sample: Option<(f64, V)> = None;
            for i in 1..=n {
                let frac = i as f64 / (n + 1) as f64;
                let t = t_a + (t_b - t_a) * frac;
                let point = curve.point_at(domain.parameter_at_normalized(t))?;
                let distance = distance_to_chord(point, point_a, point_b);
                if distance > max_distance {
                    max_distance = distance;
                    max_sample = Some((t, point));
                }
            }
            match max_sample {
                Some(sample) if max_distance >= tolerance => samples.push(sample),
                _ => break,
            }
        }
    }
    Ok(points)
}

fn distance_to_chord<V: ControlPoint>(point: V, a: V, b: V) -> f64
where
    V::Diff: Norm,
{
    let v = point.to_vec() - a.to_vec();
    let u = b.to_vec() - a.to_vec();
    let norm_u2 = u.norm_l2() * u.norm_l2();
    if norm_u2 < 1e-20 {
        return v.norm_l2();
    }
    let sum = v + u;
    let dot_vu = (sum.norm_l2().powi(2) - v.norm_l2().powi(2) - u.norm_l2().powi(2)) / 2.0;
    let projection = u * (dot_vu / norm_u2);
    (v - projection).norm_l2()
}

#[cfg(test)]
mod tests {
    use super::*;
    use kurve_base::cgmath64::{Point3, Vector2};
    use kurve_geometry::knot_vec::KnotVec;
    use kurve_geometry::{NurbsCurve, NurbsSurface};
    use kurve_topology::face::TrimSpec;
    use kurve_topology::Face;
    use std::sync::Arc;

    fn unit_square_surface(origin_x: f64) -> Arc<NurbsSurface<Point3>> {
        let knots = KnotVec::new_unchecked(vec![0.0, 1.0]);
        let poles = vec![
            Point3::new(origin_x, 0.0, 0.0),
            Point3::new(origin_x, 1.0, 0.0),
            Point3::new(origin_x + 1.0, 0.0, 0.0),
            Point3::new(origin_x + 1.0, 1.0, 0.0),
        ];
        Arc::new(NurbsSurface::try_new(1, 1, knots.clone(), knots, poles).unwrap())
    }

    fn line(a: Vector2, b: Vector2) -> NurbsCurve<Vector2> {
        let knots = KnotVec::new_unchecked(vec![0.0, 1.0]);
        NurbsCurve::try_new(1, knots, vec![a, b]).unwrap()
    }

    #[test]
    fn shared_edge_integrates_to_its_length() {
        // hold the faces alive for the duration of the query: `Edge::trims` only reports
        // trims whose owning loop (and face) are still alive.
        let edge: Edge<Point3> = Edge::new();
        let face_a = Face::try_new(
            unit_square_surface(0.0),
            vec![vec![
                TrimSpec { curve2d: line(Vector2::new(0.0, 0.0), Vector2::new(1.0, 0.0)), domain: None, edge: None },
                TrimSpec {
                    curve2d: line(Vector2::new(1.0, 0.0), Vector2::new(1.0, 1.0)),
                    domain: None,
                    edge: Some(edge.clone()),
                },
                TrimSpec { curve2d: line(Vector2::new(1.0, 1.0), Vector2::new(0.0, 1.0)), domain: None, edge: None },
                TrimSpec { curve2d: line(Vector2::new(0.0, 1.0), Vector2::new(0.0, 0.0)), domain: None, edge: None },
            ]],
        )
        .unwrap();
        let face_b = Face::try_new(
            unit_square_surface(1.0),
            vec![vec![
                TrimSpec {
                    curve2d: line(Vector2::new(0.0, 0.0), Vector2::new(0.0, 1.0)),
                    domain: None,
                    edge: Some(edge.clone()),
                },
                TrimSpec { curve2d: line(Vector2::new(0.0, 1.0), Vector2::new(1.0, 1.0)), domain: None, edge: None },
                TrimSpec { curve2d: line(Vector2::new(1.0, 1.0), Vector2::new(1.0, 0.0)), domain: None, edge: None },
                TrimSpec { curve2d: line(Vector2::new(1.0, 0.0), Vector2::new(0.0, 0.0)), domain: None, edge: None },
            ]],
        )
        .unwrap();

        let points = edge_integration_points(&edge, 1e-4).unwrap();
        assert!(!points.is_empty());
        let length: f64 = points.iter().map(|p| p.weight).sum();
        assert!((length - 1.0).abs() < 1e-6, "length={length}");
        for p in &points {
            assert!((p.t_a - p.t_b).abs() < 1e-3, "t_a={} t_b={}", p.t_a, p.t_b);
        }
        drop(face_a);
        drop(face_b);
    }

    #[test]
    fn edge_without_two_trims_is_rejected() {
        let edge: Edge<Point3> = Edge::new();
        assert!(matches!(edge_integration_points(&edge, 1e-4), Err(Error::NotManifoldEdge(0))));
    }
}
