//! NURBS curve geometry: a knot vector, a matching set of poles, and (for rational
//! curves) one weight per pole.

use crate::control_point::ControlPoint;
use crate::errors::Error;
use crate::knot_vec::KnotVec;
use crate::shape::CurveShape;
use kurve_base::Interval;
use serde::{Deserialize, Serialize};

/// A (possibly rational) B-spline curve: `degree p`, `knots` of length `n + p - 1`,
/// `poles` of length `n`, and an optional per-pole `weights` of length `n`.
///
/// `V` is the affine space the poles live in: bare vectors for parameter-space (2D) trim
/// curves, or points for world-space (3D) geometry.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NurbsCurve<V> {
    degree: usize,
    knots: KnotVec,
    poles: Vec<V>,
    weights: Option<Vec<f64>>,
}

impl<V: ControlPoint> NurbsCurve<V> {
    /// Creates a non-rational curve, validating `|knots| == poles.len() + degree - 1`.
    /// # Examples
    /// ```
    /// use kurve_base::cgmath64::Point2;
    /// use kurve_geometry::{knot_vec::KnotVec, nurbs_curve::NurbsCurve};
    /// let knots = KnotVec::new_unchecked(vec![0.0, 1.0]);
    /// let poles = vec![Point2::new(0.0, 0.0), Point2::new(1.0, 1.0)];
    /// let curve = NurbsCurve::try_new(1, knots, poles).unwrap();
    /// assert_eq!(curve.degree(), 1);
    /// ```
    pub fn try_new(degree: usize, knots: KnotVec, poles: Vec<V>) -> Result<Self, Error> {
        Self::validate(degree, &knots, poles.len())?;
        Ok(NurbsCurve { degree, knots, poles, weights: None })
    }

    /// Creates a rational curve, validating the knot-vector length and that there is one
    /// positive weight per pole.
    pub fn try_new_rational(
        degree: usize,
        knots: KnotVec,
        poles: Vec<V>,
        weights: Vec<f64>,
    ) -> Result<Self, Error> {
        Self::validate(degree, &knots, poles.len())?;
        if weights.len() != poles.len() || weights.iter().any(|&w| w <= 0.0) {
            return Err(Error::InvalidWeights { expected: poles.len(), actual: weights.len() });
        }
        Ok(NurbsCurve { degree, knots, poles, weights: Some(weights) })
    }

    fn validate(degree: usize, knots: &KnotVec, nb_poles: usize) -> Result<(), Error> {
        if nb_poles == 0 {
            return Err(Error::EmptyControlPoints);
        }
        let expected = nb_poles + degree - 1;
        if knots.len() != expected {
            return Err(Error::InvalidKnotVectorLength { expected, actual: knots.len() });
        }
        Ok(())
    }

    /// the curve's degree
    pub fn degree(&self) -> usize { self.degree }
    /// the curve's knot vector
    pub fn knots(&self) -> &KnotVec { &self.knots }
    /// the curve's poles
    pub fn poles(&self) -> &[V] { &self.poles }
    /// the pole at `index`
    pub fn pole(&self, index: usize) -> V { self.poles[index] }
    /// per-pole weights, if the curve is rational
    pub fn weights(&self) -> Option<&[f64]> { self.weights.as_deref() }
    /// whether the curve carries weights
    pub fn is_rational(&self) -> bool { self.weights.is_some() }
    /// the number of poles
    pub fn nb_poles(&self) -> usize { self.poles.len() }

    /// The parameter domain `[knots[p-1], knots[n]]`.
    pub fn domain(&self) -> Interval { self.knots.domain(self.degree) }

    /// Every non-degenerate knot span inside the domain.
    pub fn spans(&self) -> Vec<Interval> { self.knots.spans(self.degree) }

    fn check_domain(&self, t: f64) -> Result<(), Error> {
        let domain = self.domain();
        if !domain.contains(t) {
            return Err(Error::InvalidParameter { t, t0: domain.t0(), t1: domain.t1() });
        }
        Ok(())
    }

    /// Evaluates the curve's position at `t`.
    /// # Examples
    /// ```
    /// use kurve_base::cgmath64::Point2;
    /// use kurve_geometry::{knot_vec::KnotVec, nurbs_curve::NurbsCurve};
    /// let knots = KnotVec::new_unchecked(vec![0.0, 1.0]);
    /// let poles = vec![Point2::new(0.0, 0.0), Point2::new(2.0, 2.0)];
    /// let curve = NurbsCurve::try_new(1, knots, poles).unwrap();
    /// assert_eq!(curve.point_at(0.5).unwrap(), Point2::new(1.0, 1.0));
    /// ```
    pub fn point_at(&self, t: f64) -> Result<V, Error> {
        self.check_domain(t)?;
        let mut shape = CurveShape::new(self.degree);
        let (span, values) = self.evaluate_shape(&mut shape, 0, t)?;
        Ok(self.combine(span, &values[0]))
    }

    /// Evaluates the curve's position and the first `order` derivatives at `t`, returning
    /// a vector of length `order + 1` indexed by derivative order.
    pub fn derivatives_at(&self, t: f64, order: usize) -> Result<Vec<V::Diff>, Error> {
        self.check_domain(t)?;
        let mut shape = CurveShape::new(self.degree);
        let (span, values) = self.evaluate_shape(&mut shape, order, t)?;
        let mut result = Vec::with_capacity(order + 1);
        result.push(self.combine(span, &values[0]).to_vec());
        for row in values.iter().skip(1).take(order) {
            result.push(self.combine_diff(span, row));
        }
        Ok(result)
    }

    fn evaluate_shape(
        &self,
        shape: &mut CurveShape,
        order: usize,
        t: f64,
    ) -> Result<(usize, Vec<Vec<f64>>), Error> {
        match &self.weights {
            None => {
                let (span, values) = shape.evaluate(&self.knots, order, t)?;
                Ok((span, values.to_vec()))
            }
            Some(weights) => {
                let (span, values) = shape.evaluate_rational(&self.knots, order, t, |pole| weights[pole])?;
                Ok((span, values.to_vec()))
            }
        }
    }

    fn combine(&self, span: usize, weights_row: &[f64]) -> V {
        let first = span - self.degree + 1;
        let mut acc = self.poles[first].to_vec() * weights_row[0];
        for (j, &n) in weights_row.iter().enumerate().skip(1) {
            acc = acc + self.poles[first + j].to_vec() * n;
        }
        V::origin() + acc
    }

    fn combine_diff(&self, span: usize, weights_row: &[f64]) -> V::Diff {
        let first = span - self.degree + 1;
        let mut acc = self.poles[first].to_vec() * weights_row[0];
        for (j, &n) in weights_row.iter().enumerate().skip(1) {
            acc = acc + self.poles[first + j].to_vec() * n;
        }
        acc
    }
}
