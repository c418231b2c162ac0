//! Tensor-product B-spline basis and derivatives over two parameter axes, plus the
//! rational quotient rule that turns them into a weighted (NURBS) surface basis.

use super::curve::CurveShape;
use crate::errors::Error;
use crate::knot_vec::KnotVec;

/// The binomial coefficient `n choose k`, computed iteratively.
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

/// The triangular-number linearization of a derivative pair `(derivative_u, derivative_v)`
/// into the flat shape index used by [`SurfaceShape::value`].
pub fn shape_index(derivative_u: usize, derivative_v: usize) -> usize {
    let sum = derivative_u + derivative_v;
    derivative_v + sum * (1 + sum) / 2
}

/// The number of shape indices for all `(i, j)` with `i + j <= order`.
pub fn nb_shapes(order: usize) -> usize { (order + 1) * (order + 2) / 2 }

/// Evaluates tensor-product B-spline (and rational NURBS) basis functions and their
/// derivatives over a grid of nonzero poles, reusing its scratch buffers across calls.
#[derive(Debug, Clone)]
pub struct SurfaceShape {
    order: usize,
    shape_u: CurveShape,
    shape_v: CurveShape,
    first_nonzero_pole_u: usize,
    first_nonzero_pole_v: usize,
    /// `values[shape][pole_u * nb_poles_v + pole_v]`
    values: Vec<f64>,
    weighted_sums: Vec<f64>,
}

impl SurfaceShape {
    /// Creates an evaluator for the given degrees and combined derivative `order`.
    pub fn new(degree_u: usize, degree_v: usize, order: usize) -> Self {
        let mut shape = SurfaceShape {
            order: 0,
            shape_u: CurveShape::new(degree_u),
            shape_v: CurveShape::new(degree_v),
            first_nonzero_pole_u: 0,
            first_nonzero_pole_v: 0,
            values: Vec::new(),
            weighted_sums: Vec::new(),
        };
        shape.resize(degree_u, degree_v, order);
        shape
    }

    /// Re-sizes the scratch buffers, without reallocating if the shape is unchanged.
    pub fn resize(&mut self, degree_u: usize, degree_v: usize, order: usize) {
        self.shape_u.resize(degree_u);
        self.shape_v.resize(degree_v);
        self.order = order;
        let nb_poles = (degree_u + 1) * (degree_v + 1);
        self.values = vec![0.0; nb_shapes(order) * nb_poles];
        self.weighted_sums = vec![0.0; nb_shapes(order)];
    }

    /// the configured degree along `u`
    pub fn degree_u(&self) -> usize { self.shape_u.degree() }
    /// the configured degree along `v`
    pub fn degree_v(&self) -> usize { self.shape_v.degree() }
    /// the configured combined derivative order
    pub fn order(&self) -> usize { self.order }
    /// the number of nonzero poles along `u`: `degree_u + 1`
    pub fn nb_nonzero_poles_u(&self) -> usize { self.degree_u() + 1 }
    /// the number of nonzero poles along `v`: `degree_v + 1`
    pub fn nb_nonzero_poles_v(&self) -> usize { self.degree_v() + 1 }
    /// `nb_nonzero_poles_u * nb_nonzero_poles_v`
    pub fn nb_nonzero_poles(&self) -> usize { self.nb_nonzero_poles_u() * self.nb_nonzero_poles_v() }
    /// index (in the surface's global pole matrix) of the first pole this evaluation touches, in `u`
    pub fn first_nonzero_pole_u(&self) -> usize { self.first_nonzero_pole_u }
    /// index (in the surface's global pole matrix) of the first pole this evaluation touches, in `v`
    pub fn first_nonzero_pole_v(&self) -> usize { self.first_nonzero_pole_v }

    fn pole_index(&self, pole_u: usize, pole_v: usize) -> usize { pole_u * self.nb_nonzero_poles_v() + pole_v }

    /// the `shape`-th derivative of the basis function at local pole `(pole_u, pole_v)`
    pub fn value(&self, shape: usize, pole_u: usize, pole_v: usize) -> f64 {
        self.values[shape * self.nb_nonzero_poles() + self.pole_index(pole_u, pole_v)]
    }

    fn value_mut(&mut self, shape: usize, pole: usize) -> &mut f64 {
        let nb_poles = self.nb_nonzero_poles();
        &mut self.values[shape * nb_poles + pole]
    }

    /// Evaluates the un-weighted tensor-product basis at `(u, v)`, which must lie in the
    /// domains of `knots_u`/`knots_v`. Returns the spans used.
    pub fn evaluate(
        &mut self,
        knots_u: &KnotVec,
        knots_v: &KnotVec,
        u: f64,
        v: f64,
    ) -> Result<(usize, usize), Error> {
        let (span_u, row_u) = self.shape_u.evaluate(knots_u, self.order, u)?;
        let row_u: Vec<Vec<f64>> = row_u.to_vec();
        let (span_v, row_v) = self.shape_v.evaluate(knots_v, self.order, v)?;
        let row_v: Vec<Vec<f64>> = row_v.to_vec();

        self.first_nonzero_pole_u = span_u - self.degree_u() + 1;
        self.first_nonzero_pole_v = span_v - self.degree_v() + 1;

        let nb_poles = self.nb_nonzero_poles();
        self.values[..nb_shapes(self.order) * nb_poles].fill(0.0);

        for i in 0..=self.order {
            for j in 0..=(self.order - i) {
                let shape = shape_index(i, j);
                for a in 0..self.nb_nonzero_poles_u() {
                    for b in 0..self.nb_nonzero_poles_v() {
                        let pole = self.pole_index(a, b);
                        self.values[shape * nb_poles + pole] = row_u[i][a] * row_v[j][b];
                    }
                }
            }
        }

        Ok((span_u, span_v))
    }

    /// Evaluates the rational (weighted) tensor-product basis at `(u, v)`, given a closure
    /// returning the weight at a global pole index `(pole_u, pole_v)`.
    pub fn evaluate_rational(
        &mut self,
        knots_u: &KnotVec,
        knots_v: &KnotVec,
        weight_at: impl Fn(usize, usize) -> f64,
        u: f64,
        v: f64,
    ) -> Result<(usize, usize), Error> {
        let spans = self.evaluate(knots_u, knots_v, u, v)?;
        let nb_shapes = nb_shapes(self.order);
        let nb_poles = self.nb_nonzero_poles();

        for shape in 0..nb_shapes {
            let mut sum = 0.0;
            for a in 0..self.nb_nonzero_poles_u() {
                for b in 0..self.nb_nonzero_poles_v() {
                    let pole_u = self.first_nonzero_pole_u + a;
                    let pole_v = self.first_nonzero_pole_v + b;
                    let w = weight_at(pole_u, pole_v);
                    let slot = self.value_mut(shape, self.pole_index(a, b));
                    *slot *= w;
                    sum += *slot;
                }
            }
            self.weighted_sums[shape] = sum;
        }

        for k in 0..=self.order {
            for l in 0..=(self.order - k) {
                let shape = shape_index(k, l);

                for j in 1..=l {
                    let index = shape_index(k, l - j);
                    let a = binom(l, j) * self.weighted_sums[shape_index(0, j)];
                    for p in 0..nb_poles {
                        let v = self.values[index * nb_poles + p];
                        self.values[shape * nb_poles + p] -= a * v;
                    }
                }

                for i in 1..=k {
                    let index = shape_index(k - i, l);
                    let a = binom(k, i) * self.weighted_sums[shape_index(i, 0)];
                    for p in 0..nb_poles {
                        let v = self.values[index * nb_poles + p];
                        self.values[shape * nb_poles + p] -= a * v;
                    }
                }

                for i in 1..=k {
                    let a = binom(k, i);
                    for j in 1..=l {
                        let index = shape_index(k - i, l - j);
                        let b = a * binom(l, j) * self.weighted_sums[shape_index(i, j)];
                        for p in 0..nb_poles {
                            let v = self.values[index * nb_poles + p];
                            self.values[shape * nb_poles + p] -= b * v;
                        }
                    }
                }

                let s0 = self.weighted_sums[shape_index(0, 0)];
                for p in 0..nb_poles {
                    self.values[shape * nb_poles + p] /= s0;
                }
            }
        }

        Ok(spans)
    }
}
