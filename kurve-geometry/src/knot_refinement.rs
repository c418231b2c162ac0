//! Boehm knot insertion (NURBS Book Algorithm A5.4, `RefineKnotVectCurve`), adapted to the
//! `n + p - 1` knot vector convention and generalized to rational geometry by working in
//! homogeneous `(w*P, w)` coordinates.

use crate::control_point::ControlPoint;
use crate::errors::Error;
use crate::knot_vec::KnotVec;
use crate::nurbs_curve::NurbsCurve;
use crate::nurbs_surface::NurbsSurface;

/// A homogeneous control point: `(w * (P - origin), w)`. Insertion is an ordinary affine
/// combination in this representation regardless of whether the source curve is rational;
/// a non-rational curve is simply the special case `w == 1` everywhere, which the
/// combination preserves exactly.
#[derive(Clone, Copy)]
struct Hom<D>(D, f64);

impl<D: std::ops::Add<D, Output = D> + std::ops::Mul<f64, Output = D> + Copy> Hom<D> {
    fn combine(alpha: f64, a: Hom<D>, b: Hom<D>) -> Hom<D> {
        Hom(a.0 * alpha + b.0 * (1.0 - alpha), a.1 * alpha + b.1 * (1.0 - alpha))
    }
}

/// Materializes the standard (`p+1`-duplicated) knot array implied by our compact `K` of
/// length `L = n + p - 1`: `[K[0]] ++ K ++ [K[L-1]]`, length `L + 2`. This mirrors the
/// clamping the shape evaluator applies when it reads one knot past either end of `K`.
fn standard_knots(knots: &KnotVec) -> Vec<f64> {
    let k = knots.as_slice();
    let mut result = Vec::with_capacity(k.len() + 2);
    result.push(k[0]);
    result.extend_from_slice(k);
    result.push(k[k.len() - 1]);
    result
}

/// Strips the redundant first/last entry `standard_knots` added, recovering our convention.
fn compact_knots(standard: &[f64]) -> KnotVec { KnotVec::new_unchecked(standard[1..standard.len() - 1].to_vec()) }

/// Standard `FindSpan` (NURBS Book A2.1) over a materialized standard knot array.
fn find_span(n: usize, p: usize, t: f64, u: &[f64]) -> usize {
    if t >= u[n + 1] {
        return n;
    }
    if t <= u[p] {
        return p;
    }
    let (mut lo, mut hi) = (p, n + 1);
    let mut mid = (lo + hi) / 2;
    while t < u[mid] || t >= u[mid + 1] {
        if t < u[mid] { hi = mid } else { lo = mid }
        mid = (lo + hi) / 2;
    }
    mid
}

/// Inserts the sorted knot list `new_knots` into `(degree, knots, poles, weights)`, by
/// `RefineKnotVectCurve` on homogeneous poles. `new_knots` must lie in the curve's domain.
fn refine<D>(
    degree: usize,
    knots: &KnotVec,
    homogeneous: &[Hom<D>],
    new_knots: &[f64],
) -> (KnotVec, Vec<Hom<D>>)
where D: std::ops::Add<D, Output = D> + std::ops::Mul<f64, Output = D> + Copy
{
    let p = degree;
    let u = standard_knots(knots);
    let n = homogeneous.len() - 1;
    let m = n + p + 1;
    let r = new_knots.len() - 1;
    let x = new_knots;

    let a = find_span(n, p, x[0], &u);
    let b = find_span(n, p, x[r], &u) + 1;

    let mut new_weights = vec![homogeneous[0]; homogeneous.len() + new_knots.len()];
    let mut new_u = vec![0.0_f64; u.len() + new_knots.len()];

    for j in 0..=(a - p) {
        new_weights[j] = homogeneous[j];
    }
    for j in (b - 1)..=n {
        new_weights[j + r + 1] = homogeneous[j];
    }
    for j in 0..=a {
        new_u[j] = u[j];
    }
    for j in (b + p)..=m {
        new_u[j + r + 1] = u[j];
    }

    let mut i = b + p - 1;
    let mut k = b + p + r;
    for j in (0..=r).rev() {
        while x[j] <= u[i] && i > a {
            new_weights[k - p - 1] = homogeneous[i - p - 1];
            new_u[k] = u[i];
            k -= 1;
            i -= 1;
        }
        new_weights[k - p - 1] = new_weights[k - p];
        for l in 1..=p {
            let ind = k - p + l;
            let mut alpha = new_u[k + l] - x[j];
            if alpha.abs() < 1e-12 {
                new_weights[ind - 1] = new_weights[ind];
            } else {
                alpha /= new_u[k + l] - u[i - p + l];
                new_weights[ind - 1] = Hom::combine(alpha, new_weights[ind - 1], new_weights[ind]);
            }
        }
        new_u[k] = x[j];
        k -= 1;
    }

    (compact_knots(&new_u), new_weights)
}

/// Inserts `new_knots` (sorted, within the curve's domain) into `curve`'s knot vector,
/// returning a new curve. The pole count grows by exactly `new_knots.len()`; point and
/// derivative evaluation are unchanged at every parameter (within floating-point tolerance).
pub fn insert_knots_curve<V: ControlPoint>(
    curve: &NurbsCurve<V>,
    new_knots: &[f64],
) -> Result<NurbsCurve<V>, Error> {
    if new_knots.is_empty() {
        return Ok(curve.clone());
    }
    let weight_at = |i: usize| curve.weights().map_or(1.0, |w| w[i]);
    let homogeneous: Vec<Hom<V::Diff>> = (0..curve.nb_poles())
        .map(|i| {
            let w = weight_at(i);
            Hom(curve.pole(i).to_vec() * w, w)
        })
        .collect();

    let (new_knot_vec, new_hom) = refine(curve.degree(), curve.knots(), &homogeneous, new_knots);

    let new_poles: Vec<V> = new_hom.iter().map(|h| V::origin() + h.0 * (1.0 / h.1)).collect();
    match curve.weights() {
        None => NurbsCurve::try_new(curve.degree(), new_knot_vec, new_poles),
        Some(_) => {
            let new_weights: Vec<f64> = new_hom.iter().map(|h| h.1).collect();
            NurbsCurve::try_new_rational(curve.degree(), new_knot_vec, new_poles, new_weights)
        }
    }
}

/// Inserts `new_knots` into `surface`'s `u` knot vector, refining every `v`-column of poles
/// independently (the standard row/column reduction of `RefineKnotVectSurface`).
pub fn insert_knots_surface_u<V: ControlPoint>(
    surface: &NurbsSurface<V>,
    new_knots: &[f64],
) -> Result<NurbsSurface<V>, Error> {
    if new_knots.is_empty() {
        return Ok(surface.clone());
    }
    let nb_v = surface.nb_poles_v();
    let mut new_knots_u = None;
    let mut columns_poles = Vec::with_capacity(nb_v);
    let mut columns_weights = surface.weights().map(|_| Vec::with_capacity(nb_v));

    for col in 0..nb_v {
        let poles: Vec<V> = (0..surface.nb_poles_u()).map(|row| surface.pole(row, col)).collect();
        let weights: Option<Vec<f64>> =
            surface.weights().map(|w| (0..surface.nb_poles_u()).map(|row| w[row * nb_v + col]).collect());
        let column = build_curve(surface.degree_u(), surface.knots_u(), poles, weights)?;
        let refined = insert_knots_curve(&column, new_knots)?;
        new_knots_u.get_or_insert_with(|| refined.knots().clone());
        columns_poles.push(refined.poles().to_vec());
        if let Some(ws) = &mut columns_weights {
            ws.push(refined.weights().expect("rational column stays rational").to_vec());
        }
    }

    assemble_surface(
        surface.degree_u(),
        surface.degree_v(),
        new_knots_u.expect("at least one column was refined"),
        surface.knots_v().clone(),
        columns_poles,
        columns_weights,
        true,
    )
}

/// Inserts `new_knots` into `surface`'s `v` knot vector, refining every `u`-row of poles.
pub fn insert_knots_surface_v<V: ControlPoint>(
    surface: &NurbsSurface<V>,
    new_knots: &[f64],
) -> Result<NurbsSurface<V>, Error> {
    if new_knots.is_empty() {
        return Ok(surface.clone());
    }
    let nb_u = surface.nb_poles_u();
    let nb_v = surface.nb_poles_v();
    let mut new_knots_v = None;
    let mut rows_poles = Vec::with_capacity(nb_u);
    let mut rows_weights = surface.weights().map(|_| Vec::with_capacity(nb_u));

    for row in 0..nb_u {
        let poles: Vec<V> = (0..nb_v).map(|col| surface.pole(row, col)).collect();
        let weights: Option<Vec<f64>> = surface.weights().map(|w| w[row * nb_v..(row + 1) * nb_v].to_vec());
        let line = build_curve(surface.degree_v(), surface.knots_v(), poles, weights)?;
        let refined = insert_knots_curve(&line, new_knots)?;
        new_knots_v.get_or_insert_with(|| refined.knots().clone());
        rows_poles.push(refined.poles().to_vec());
        if let Some(ws) = &mut rows_weights {
            ws.push(refined.weights().expect("rational row stays rational").to_vec());
        }
    }

    assemble_surface(
        surface.degree_u(),
        surface.degree_v(),
        surface.knots_u().clone(),
        new_knots_v.expect("at least one row was refined"),
        rows_poles,
        rows_weights,
        false,
    )
}

fn build_curve<V: ControlPoint>(
    degree: usize,
    knots: &KnotVec,
    poles: Vec<V>,
    weights: Option<Vec<f64>>,
) -> Result<NurbsCurve<V>, Error> {
    match weights {
        None => NurbsCurve::try_new(degree, knots.clone(), poles),
        Some(w) => NurbsCurve::try_new_rational(degree, knots.clone(), poles, w),
    }
}

/// Reassembles a surface from per-column (`by_column = true`) or per-row poles produced by
/// the two refinement directions above, back into row-major `(pole_u, pole_v)` order.
fn assemble_surface<V: ControlPoint>(
    degree_u: usize,
    degree_v: usize,
    knots_u: KnotVec,
    knots_v: KnotVec,
    groups_poles: Vec<Vec<V>>,
    groups_weights: Option<Vec<Vec<f64>>>,
    by_column: bool,
) -> Result<NurbsSurface<V>, Error> {
    let (nb_poles_u, nb_poles_v) = if by_column {
        (groups_poles[0].len(), groups_poles.len())
    } else {
        (groups_poles.len(), groups_poles[0].len())
    };

    let mut poles = vec![V::origin(); nb_poles_u * nb_poles_v];
    let mut weights = groups_weights.as_ref().map(|_| vec![0.0_f64; nb_poles_u * nb_poles_v]);
    for (g, group) in groups_poles.iter().enumerate() {
        for (i, &pole) in group.iter().enumerate() {
            let (row, col) = if by_column { (i, g) } else { (g, i) };
            poles[row * nb_poles_v + col] = pole;
        }
    }
    if let (Some(groups_w), Some(flat)) = (&groups_weights, &mut weights) {
        for (g, group) in groups_w.iter().enumerate() {
            for (i, &w) in group.iter().enumerate() {
                let (row, col) = if by_column { (i, g) } else { (g, i) };
                flat[row * nb_poles_v + col] = w;
            }
        }
    }

    match weights {
        None => NurbsSurface::try_new(degree_u, degree_v, knots_u, knots_v, poles),
        Some(w) => NurbsSurface::try_new_rational(degree_u, degree_v, knots_u, knots_v, poles, w),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kurve_base::cgmath64::Point2;
    use kurve_base::Tolerance;
    use proptest::prelude::*;

    fn cubic_sample() -> NurbsCurve<Point2> {
        let knots = KnotVec::new_unchecked(vec![0.0, 0.0, 1.0, 2.0, 3.0, 3.0]);
        let poles = (0..5).map(|i| Point2::new(i as f64, (i as f64 * 1.3).sin())).collect();
        NurbsCurve::try_new(2, knots, poles).unwrap()
    }

    #[test]
    fn pole_count_grows_by_insertion_count() {
        let curve = cubic_sample();
        let refined = insert_knots_curve(&curve, &[0.5, 1.5]).unwrap();
        assert_eq!(refined.nb_poles(), curve.nb_poles() + 2);
    }

    #[test]
    fn point_evaluation_is_invariant_under_refinement() {
        let curve = cubic_sample();
        let refined = insert_knots_curve(&curve, &[0.3, 0.9, 2.2]).unwrap();
        for &t in &[0.0, 0.3, 0.75, 1.5, 2.2, 2.9, 3.0] {
            let before = curve.point_at(t).unwrap();
            let after = refined.point_at(t).unwrap();
            assert!((before.x - after.x).abs() < 1e-9, "x mismatch at t={t}");
            assert!((before.y - after.y).abs() < 1e-9, "y mismatch at t={t}");
        }
    }

    #[test]
    fn derivatives_are_invariant_under_refinement() {
        let curve = cubic_sample();
        let refined = insert_knots_curve(&curve, &[1.1]).unwrap();
        for &t in &[0.1, 1.1, 2.5] {
            let before = curve.derivatives_at(t, 2).unwrap();
            let after = refined.derivatives_at(t, 2).unwrap();
            for k in 0..3 {
                assert!(before[k].x.near(&after[k].x));
                assert!(before[k].y.near(&after[k].y));
            }
        }
    }

    #[test]
    fn rational_curve_stays_rational_and_invariant() {
        let w = std::f64::consts::FRAC_1_SQRT_2;
        let knots = KnotVec::new_unchecked(vec![0.0, 0.0, 1.0, 1.0]);
        let poles = vec![Point2::new(1.0, 0.0), Point2::new(1.0, 1.0), Point2::new(0.0, 1.0)];
        let curve = NurbsCurve::try_new_rational(2, knots, poles, vec![1.0, w, 1.0]).unwrap();
        let refined = insert_knots_curve(&curve, &[0.25, 0.75]).unwrap();
        assert!(refined.is_rational());
        for &t in &[0.1, 0.5, 0.9] {
            let before = curve.point_at(t).unwrap();
            let after = refined.point_at(t).unwrap();
            assert!((before.x - after.x).abs() < 1e-9);
            assert!((before.y - after.y).abs() < 1e-9);
        }
    }

    #[test]
    fn surface_u_refinement_preserves_evaluation() {
        use kurve_base::cgmath64::Point3;
        let knots_u = KnotVec::new_unchecked(vec![0.0, 1.0]);
        let knots_v = KnotVec::new_unchecked(vec![0.0, 1.0]);
        let poles = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(1.0, 0.0, 0.5),
            Point3::new(1.0, 1.0, 1.0),
        ];
        let surface = NurbsSurface::try_new(1, 1, knots_u, knots_v, poles).unwrap();
        let refined = insert_knots_surface_u(&surface, &[0.5]).unwrap();
        assert_eq!(refined.nb_poles_u(), surface.nb_poles_u() + 1);
        for &(u, v) in &[(0.2, 0.3), (0.6, 0.9), (0.5, 0.5)] {
            let before = surface.point_at(u, v).unwrap();
            let after = refined.point_at(u, v).unwrap();
            assert!((before.x - after.x).abs() < 1e-9);
            assert!((before.z - after.z).abs() < 1e-9);
        }
    }

    proptest! {
        /// For any single knot inserted into the curve's interior and any in-domain
        /// sample parameter, the refined curve evaluates to the same point as the
        /// original (§8's knot-refinement invariance property), and its pole count grows
        /// by exactly one.
        #[test]
        fn point_evaluation_invariant_under_random_single_insertion(
            insert in 0.05f64..2.95,
            sample in 0f64..=3.0,
        ) {
            let curve = cubic_sample();
            let refined = insert_knots_curve(&curve, &[insert]).unwrap();
            prop_assert_eq!(refined.nb_poles(), curve.nb_poles() + 1);
            let before = curve.point_at(sample).unwrap();
            let after = refined.point_at(sample).unwrap();
            prop_assert!((before.x - after.x).abs() < 1e-8, "x mismatch at t={sample}");
            prop_assert!((before.y - after.y).abs() < 1e-8, "y mismatch at t={sample}");
        }
    }
}
