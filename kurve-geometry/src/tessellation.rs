//! Adaptive polyline approximation: starting from one sample per knot span, bisect any
//! segment whose chord deviates from the curve by more than a tolerance, until every
//! remaining segment is flat enough.

use crate::control_point::ControlPoint;
use crate::errors::Error;
use crate::nurbs_curve::NurbsCurve;
use kurve_base::Norm;

/// One point of a tessellated polyline: the curve parameter it was sampled at, and its image.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PolylinePoint<V> {
    /// the curve parameter this point was sampled at
    pub t: f64,
    /// the curve's position at `t`
    pub point: V,
}

/// The perpendicular distance from `point` to the infinite line through `a` and `b`,
/// computed from norms alone via the polarization identity (`dot(v, u) = (|v+u|^2 - |v|^2
/// - |u|^2) / 2`), so it places no requirement on `V::Diff` beyond [`Norm`].
fn distance_to_line<D: Norm + Copy>(
    point: D,
    a: D,
    b: D,
    sub: impl Fn(D, D) -> D,
    add: impl Fn(D, D) -> D,
    scale: impl Fn(D, f64) -> D,
) -> f64 {
    let v = sub(point, a);
    let u = sub(b, a);
    let norm_u2 = u.norm_l2() * u.norm_l2();
    if norm_u2 < 1e-20 {
        return v.norm_l2();
    }
    let sum = add(v, u);
    let dot_vu = (sum.norm_l2().powi(2) - v.norm_l2().powi(2) - u.norm_l2().powi(2)) / 2.0;
    let projection = scale(u, dot_vu / norm_u2);
    sub(v, projection).norm_l2()
}

/// Approximates `curve` by a polyline whose chords deviate from the curve by no more than
/// `tolerance`, seeding one sample per knot span and refining by recursive bisection
/// (NURBS Book-style adaptive sampling, not uniform subdivision).
pub fn tessellate<V>(curve: &NurbsCurve<V>, tolerance: f64) -> Result<Vec<PolylinePoint<V>>, Error>
where
    V: ControlPoint,
    V::Diff: Norm,
{
    let domain = curve.domain();

    let mut samples: Vec<(f64, V)> = Vec::new();
    for span in curve.spans() {
        let t = domain.normalized(span.t0());
        let point = curve.point_at(span.t0())?;
        samples.push((t, point));
    }
    samples.push((1.0, curve.point_at(domain.t1())?));
    samples.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap());

    let mut points: Vec<PolylinePoint<V>> = Vec::new();
    let n = curve.degree() * 2 + 1;

    loop {
        let (t_a, point_a) = samples.pop().expect("at least the domain endpoint is sampled");
        points.push(PolylinePoint { t: domain.parameter_at_normalized(t_a), point: point_a });

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
                let distance = distance_to_line(
                    point.to_vec(),
                    point_a.to_vec(),
                    point_b.to_vec(),
                    |x, y| x - y,
                    |x, y| x + y,
                    |x, s| x * s,
                );
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::knot_vec::KnotVec;
    use kurve_base::cgmath64::Point2;

    #[test]
    fn straight_line_tessellates_to_its_two_endpoints() {
        let knots = KnotVec::new_unchecked(vec![0.0, 1.0]);
        let poles = vec![Point2::new(0.0, 0.0), Point2::new(10.0, 0.0)];
        let curve = NurbsCurve::try_new(1, knots, poles).unwrap();
        let polyline = tessellate(&curve, 1e-4).unwrap();
        assert_eq!(polyline.len(), 2);
        assert_eq!(polyline[0].point, Point2::new(0.0, 0.0));
        assert_eq!(polyline.last().unwrap().point, Point2::new(10.0, 0.0));
    }

    #[test]
    fn curved_bezier_refines_past_two_points() {
        let knots = KnotVec::new_unchecked(vec![0.0, 0.0, 1.0, 1.0]);
        let poles = vec![Point2::new(0.0, 0.0), Point2::new(5.0, 10.0), Point2::new(10.0, 0.0)];
        let curve = NurbsCurve::try_new(2, knots, poles).unwrap();
        let polyline = tessellate(&curve, 1e-3).unwrap();
        assert!(polyline.len() > 2);
        for w in polyline.windows(2) {
            assert!(w[1].t > w[0].t);
        }
    }

    #[test]
    fn chord_tolerance_is_respected() {
        let knots = KnotVec::new_unchecked(vec![0.0, 0.0, 1.0, 1.0]);
        let poles = vec![Point2::new(0.0, 0.0), Point2::new(5.0, 10.0), Point2::new(10.0, 0.0)];
        let curve = NurbsCurve::try_new(2, knots, poles).unwrap();
        let tolerance = 1e-3;
        let polyline = tessellate(&curve, tolerance).unwrap();
        for w in polyline.windows(2) {
            let steps = 16;
            for i in 1..steps {
                let t = w[0].t + (w[1].t - w[0].t) * (i as f64 / steps as f64);
                let point = curve.point_at(t).unwrap();
                let d = distance_to_line(
                    point.to_vec(),
                    w[0].point.to_vec(),
                    w[1].point.to_vec(),
                    |x, y| x - y,
                    |x, y| x + y,
                    |x, s| x * s,
                );
                assert!(d < tolerance * 3.0, "chord deviation {d} at t={t}");
            }
        }
    }
}
