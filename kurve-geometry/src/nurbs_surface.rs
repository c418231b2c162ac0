//! NURBS surface geometry: a tensor-product grid of poles over two knot vectors, with an
//! optional per-pole weight grid for rational surfaces.

use crate::control_point::ControlPoint;
use crate::errors::Error;
use crate::knot_vec::KnotVec;
use crate::shape::surface::{nb_shapes, shape_index};
use crate::shape::SurfaceShape;
use kurve_base::cgmath64::Zero;
use kurve_base::Interval;
use serde::{Deserialize, Serialize};

/// A (possibly rational) tensor-product B-spline surface: degrees `(p, q)`, knot vectors
/// `knots_u`/`knots_v`, and a `nb_poles_u * nb_poles_v` grid of poles stored row-major in
/// `u`, with an optional matching grid of weights.
///
/// `V` is the affine space the poles live in, as with [`crate::NurbsCurve`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NurbsSurface<V> {
    degree_u: usize,
    degree_v: usize,
    knots_u: KnotVec,
    knots_v: KnotVec,
    nb_poles_u: usize,
    nb_poles_v: usize,
    poles: Vec<V>,
    weights: Option<Vec<f64>>,
}

impl<V: ControlPoint> NurbsSurface<V> {
    /// Creates a non-rational surface. `poles` must have exactly `nb_poles_u * nb_poles_v`
    /// entries, row-major in `u` (i.e. `poles[pole_u * nb_poles_v + pole_v]`), where
    /// `nb_poles_u`/`nb_poles_v` are implied by the knot vector lengths and degrees.
    pub fn try_new(
        degree_u: usize,
        degree_v: usize,
        knots_u: KnotVec,
        knots_v: KnotVec,
        poles: Vec<V>,
    ) -> Result<Self, Error> {
        let (nb_poles_u, nb_poles_v) = Self::validate(degree_u, degree_v, &knots_u, &knots_v, poles.len())?;
        Ok(NurbsSurface { degree_u, degree_v, knots_u, knots_v, nb_poles_u, nb_poles_v, poles, weights: None })
    }

    /// Creates a rational surface, with one positive weight per pole.
    pub fn try_new_rational(
        degree_u: usize,
        degree_v: usize,
        knots_u: KnotVec,
        knots_v: KnotVec,
        poles: Vec<V>,
        weights: Vec<f64>,
    ) -> Result<Self, Error> {
        let (nb_poles_u, nb_poles_v) = Self::validate(degree_u, degree_v, &knots_u, &knots_v, poles.len())?;
        if weights.len() != poles.len() || weights.iter().any(|&w| w <= 0.0) {
            return Err(Error::InvalidWeights { expected: poles.len(), actual: weights.len() });
        }
        Ok(NurbsSurface {
            degree_u,
            degree_v,
            knots_u,
            knots_v,
            nb_poles_u,
            nb_poles_v,
            poles,
            weights: Some(weights),
        })
    }

    fn validate(
        degree_u: usize,
        degree_v: usize,
        knots_u: &KnotVec,
        knots_v: &KnotVec,
        nb_poles: usize,
    ) -> Result<(usize, usize), Error> {
        if nb_poles == 0 {
            return Err(Error::EmptyControlPoints);
        }
        let nb_poles_u = knots_u.nb_poles(degree_u);
        let nb_poles_v = knots_v.nb_poles(degree_v);
        if nb_poles_u * nb_poles_v != nb_poles {
            return Err(Error::IrregularControlPoints);
        }
        Ok((nb_poles_u, nb_poles_v))
    }

    /// the degree along `u`
    pub fn degree_u(&self) -> usize { self.degree_u }
    /// the degree along `v`
    pub fn degree_v(&self) -> usize { self.degree_v }
    /// the knot vector along `u`
    pub fn knots_u(&self) -> &KnotVec { &self.knots_u }
    /// the knot vector along `v`
    pub fn knots_v(&self) -> &KnotVec { &self.knots_v }
    /// the number of poles along `u`
    pub fn nb_poles_u(&self) -> usize { self.nb_poles_u }
    /// the number of poles along `v`
    pub fn nb_poles_v(&self) -> usize { self.nb_poles_v }
    /// the pole grid, row-major in `u`
    pub fn poles(&self) -> &[V] { &self.poles }
    /// the pole at `(pole_u, pole_v)`
    pub fn pole(&self, pole_u: usize, pole_v: usize) -> V { self.poles[pole_u * self.nb_poles_v + pole_v] }
    /// per-pole weights, if the surface is rational
    pub fn weights(&self) -> Option<&[f64]> { self.weights.as_deref() }
    /// whether the surface carries weights
    pub fn is_rational(&self) -> bool { self.weights.is_some() }

    /// The parameter domain in `u`.
    pub fn domain_u(&self) -> Interval { self.knots_u.domain(self.degree_u) }
    /// The parameter domain in `v`.
    pub fn domain_v(&self) -> Interval { self.knots_v.domain(self.degree_v) }

    /// Every non-degenerate knot span along `u`.
    pub fn spans_u(&self) -> Vec<Interval> { self.knots_u.spans(self.degree_u) }
    /// Every non-degenerate knot span along `v`.
    pub fn spans_v(&self) -> Vec<Interval> { self.knots_v.spans(self.degree_v) }

    fn check_domain(&self, u: f64, v: f64) -> Result<(), Error> {
        let du = self.domain_u();
        if !du.contains(u) {
            return Err(Error::InvalidParameter { t: u, t0: du.t0(), t1: du.t1() });
        }
        let dv = self.domain_v();
        if !dv.contains(v) {
            return Err(Error::InvalidParameter { t: v, t0: dv.t0(), t1: dv.t1() });
        }
        Ok(())
    }

    /// Evaluates the surface's position at `(u, v)`.
    pub fn point_at(&self, u: f64, v: f64) -> Result<V, Error> {
        self.check_domain(u, v)?;
        let mut shape = SurfaceShape::new(self.degree_u, self.degree_v, 0);
        let (span_u, span_v) = self.evaluate_shape(&mut shape, 0, u, v)?;
        Ok(self.combine(&shape, span_u, span_v, shape_index(0, 0)))
    }

    /// Evaluates the surface's position and every partial derivative `d^(i+j)/du^i dv^j`
    /// with `i + j <= order`, returning a flat vector indexed by [`shape_index`].
    pub fn derivatives_at(&self, u: f64, v: f64, order: usize) -> Result<Vec<V::Diff>, Error> {
        self.check_domain(u, v)?;
        let mut shape = SurfaceShape::new(self.degree_u, self.degree_v, order);
        let (span_u, span_v) = self.evaluate_shape(&mut shape, order, u, v)?;
        let mut result = vec![V::Diff::zero(); nb_shapes(order)];
        for i in 0..=order {
            for j in 0..=(order - i) {
                let shape_idx = shape_index(i, j);
                result[shape_idx] = if shape_idx == 0 {
                    self.combine(&shape, span_u, span_v, shape_idx).to_vec()
                } else {
                    self.combine_diff(&shape, span_u, span_v, shape_idx)
                };
            }
        }
        Ok(result)
    }

    fn evaluate_shape(
        &self,
        shape: &mut SurfaceShape,
        order: usize,
        u: f64,
        v: f64,
    ) -> Result<(usize, usize), Error> {
        match &self.weights {
            None => shape.evaluate(&self.knots_u, &self.knots_v, u, v),
            Some(weights) => {
                let nb_poles_v = self.nb_poles_v;
                shape.evaluate_rational(
                    &self.knots_u,
                    &self.knots_v,
                    |pole_u, pole_v| weights[pole_u * nb_poles_v + pole_v],
                    u,
                    v,
                )
            }
        }
    }

    fn combine(&self, shape: &SurfaceShape, span_u: usize, span_v: usize, shape_idx: usize) -> V {
        let first_u = span_u - self.degree_u + 1;
        let first_v = span_v - self.degree_v + 1;
        let mut acc = V::Diff::zero();
        for a in 0..shape.nb_nonzero_poles_u() {
            for b in 0..shape.nb_nonzero_poles_v() {
                let n = shape.value(shape_idx, a, b);
                let pole = self.pole(first_u + a, first_v + b);
                acc = acc + pole.to_vec() * n;
            }
        }
        V::origin() + acc
    }

    fn combine_diff(&self, shape: &SurfaceShape, span_u: usize, span_v: usize, shape_idx: usize) -> V::Diff {
        let first_u = span_u - self.degree_u + 1;
        let first_v = span_v - self.degree_v + 1;
        let mut acc = V::Diff::zero();
        for a in 0..shape.nb_nonzero_poles_u() {
            for b in 0..shape.nb_nonzero_poles_v() {
                let n = shape.value(shape_idx, a, b);
                let pole = self.pole(first_u + a, first_v + b);
                acc = acc + pole.to_vec() * n;
            }
        }
        acc
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kurve_base::cgmath64::Point3;
    use proptest::prelude::*;

    fn bilinear_patch() -> NurbsSurface<Point3> {
        let knots_u = KnotVec::new_unchecked(vec![0.0, 1.0]);
        let knots_v = KnotVec::new_unchecked(vec![0.0, 1.0]);
        let poles = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 2.0),
        ];
        NurbsSurface::try_new(1, 1, knots_u, knots_v, poles).unwrap()
    }

    #[test]
    fn corner_interpolation() {
        let surf = bilinear_patch();
        assert_eq!(surf.point_at(0.0, 0.0).unwrap(), Point3::new(0.0, 0.0, 0.0));
        assert_eq!(surf.point_at(1.0, 1.0).unwrap(), Point3::new(1.0, 1.0, 2.0));
    }

    #[test]
    fn center_is_bilinear_average() {
        let surf = bilinear_patch();
        let mid = surf.point_at(0.5, 0.5).unwrap();
        assert!((mid.x - 0.5).abs() < 1e-12);
        assert!((mid.y - 0.5).abs() < 1e-12);
        assert!((mid.z - 0.5).abs() < 1e-12);
    }

    #[test]
    fn out_of_domain_errors() {
        let surf = bilinear_patch();
        assert!(surf.point_at(2.0, 0.5).is_err());
    }

    #[test]
    fn mismatched_pole_grid_is_rejected() {
        let knots_u = KnotVec::new_unchecked(vec![0.0, 1.0]);
        let knots_v = KnotVec::new_unchecked(vec![0.0, 1.0]);
        let poles = vec![Point3::new(0.0, 0.0, 0.0); 3];
        assert!(NurbsSurface::try_new(1, 1, knots_u, knots_v, poles).is_err());
    }

    #[test]
    fn derivatives_include_position_at_shape_zero() {
        let surf = bilinear_patch();
        let ders = surf.derivatives_at(0.25, 0.75, 1).unwrap();
        let p = surf.point_at(0.25, 0.75).unwrap();
        let diff = ders[shape_index(0, 0)] - p.to_vec();
        assert!(diff.x.abs() < 1e-12 && diff.y.abs() < 1e-12 && diff.z.abs() < 1e-12);
    }

    proptest! {
        /// As with the curve case, `point_at(u, v)` is a convex combination of the
        /// `(degree_u + 1) * (degree_v + 1)` poles the span touches: the order-0 shape
        /// weights are nonnegative and sum to one.
        #[test]
        fn convex_hull_containment(
            u in 0f64..=2.0,
            v in 0f64..=2.0,
            zs in prop::array::uniform16(-10f64..=10.0),
        ) {
            // degree (2, 2), knots [0,0,1,2,2] on both axes: two spans per axis, 4x4 poles.
            let knots_u = KnotVec::new_unchecked(vec![0.0, 0.0, 1.0, 2.0, 2.0]);
            let knots_v = knots_u.clone();
            let mut poles = Vec::with_capacity(16);
            for pu in 0..4 {
                for pv in 0..4 {
                    poles.push(Point3::new(pu as f64, pv as f64, zs[pu * 4 + pv]));
                }
            }
            let surf = NurbsSurface::try_new(2, 2, knots_u.clone(), knots_v.clone(), poles.clone()).unwrap();
            let point = surf.point_at(u, v).unwrap();

            let mut shape = SurfaceShape::new(2, 2, 0);
            let (span_u, span_v) = shape.evaluate(&knots_u, &knots_v, u, v).unwrap();
            let mut sum = 0.0;
            for a in 0..shape.nb_nonzero_poles_u() {
                for b in 0..shape.nb_nonzero_poles_v() {
                    let w = shape.value(shape_index(0, 0), a, b);
                    prop_assert!(w >= -1e-9);
                    sum += w;
                }
            }
            prop_assert!((sum - 1.0).abs() < 1e-9);

            let first_u = span_u - 2 + 1;
            let first_v = span_v - 2 + 1;
            let mut min_z = f64::INFINITY;
            let mut max_z = f64::NEG_INFINITY;
            for a in 0..3 {
                for b in 0..3 {
                    let z = poles[(first_u + a) * 4 + (first_v + b)].z;
                    min_z = min_z.min(z);
                    max_z = max_z.max(z);
                }
            }
            prop_assert!(point.z >= min_z - 1e-9 && point.z <= max_z + 1e-9);
        }
    }
}
