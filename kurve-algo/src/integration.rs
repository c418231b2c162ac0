//! Fixed-table numerical integration: 1D and tensor-product 2D Gauss–Legendre quadrature,
//! and Xiao–Gimbutas-style barycentric quadrature over triangles, composed into
//! [`PolygonIntegrationPoints`] for the polygons produced by [`crate::polygon`].

use crate::errors::{Error, Result};
use crate::polygon::{Polygon, PolygonTessellator};
use kurve_base::cgmath64::Vector2;
use kurve_base::Interval;
use serde::{Deserialize, Serialize};

/// One quadrature point: a position in `ℝ^D` and its integration weight.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct IntegrationPoint<const D: usize> {
    /// the point's coordinates
    pub coordinates: [f64; D],
    /// the point's integration weight
    pub weight: f64,
}

/// `n`-point Gauss-Legendre abscissas and weights on `[-1, 1]`, exact for polynomials up to
/// degree `2n - 1`. Canonical tabulated values, `n` from 1 to 8.
const GAUSS_TABLE: &[&[(f64, f64)]] = &[
    &[(0.0, 2.0)],
    &[(-0.5773502691896257, 1.0), (0.5773502691896257, 1.0)],
    &[(0.0, 0.8888888888888888), (-0.7745966692414834, 0.5555555555555556), (0.7745966692414834, 0.5555555555555556)],
    &[
        (-0.3399810435848563, 0.6521451548625461),
        (0.3399810435848563, 0.6521451548625461),
        (-0.8611363115940526, 0.3478548451374538),
        (0.8611363115940526, 0.3478548451374538),
    ],
    &[
        (0.0, 0.5688888888888889),
        (-0.5384693101056831, 0.4786286704993665),
        (0.5384693101056831, 0.4786286704993665),
        (-0.9061798459386640, 0.2369268850561891),
        (0.9061798459386640, 0.2369268850561891),
    ],
    &[
        (-0.2386191860831969, 0.4679139345726910),
        (0.2386191860831969, 0.4679139345726910),
        (-0.6612093864662645, 0.3607615730481386),
        (0.6612093864662645, 0.3607615730481386),
        (-0.9324695142031521, 0.1713244923791704),
        (0.9324695142031521, 0.1713244923791704),
    ],
    &[
        (0.0, 0.4179591836734694),
        (-0.4058451513773972, 0.3818300505051189),
        (0.4058451513773972, 0.3818300505051189),
        (-0.7415311855993945, 0.2797053914892766),
        (0.7415311855993945, 0.2797053914892766),
        (-0.9491079123427585, 0.1294849661688697),
        (0.9491079123427585, 0.1294849661688697),
    ],
    &[
        (-0.1834346424956498, 0.3626837833783620),
        (0.1834346424956498, 0.3626837833783620),
        (-0.5255324099163290, 0.3137066458778873),
        (0.5255324099163290, 0.3137066458778873),
        (-0.7966664774136267, 0.2223810344533745),
        (0.7966664774136267, 0.2223810344533745),
        (-0.9602898564975363, 0.1012285362903763),
        (0.9602898564975363, 0.1012285362903763),
    ],
];

/// The number of Gauss points needed to integrate a polynomial of `degree` exactly:
/// `n` points integrate up to degree `2n - 1`, so `n = ceil((degree + 1) / 2)`.
fn nb_gauss_points(degree: usize) -> usize { degree / 2 + 1 }

/// 1D Gauss-Legendre points of the given polynomial `degree`, mapped from `[-1, 1]` onto
/// `[domain.t0(), domain.t1()]` (weight scaled by `(t1 - t0) / 2`).
pub fn gauss_legendre_1d(degree: usize, domain: Interval) -> Result<Vec<(f64, f64)>> {
    let n = nb_gauss_points(degree);
    let table = GAUSS_TABLE.get(n - 1).ok_or(Error::UnsupportedDegree(degree))?;
    let half_length = (domain.t1() - domain.t0()) / 2.0;
    let mid = (domain.t0() + domain.t1()) / 2.0;
    Ok(table.iter().map(|&(x, w)| (mid + half_length * x, w * half_length)).collect())
}

/// Tensor-product 2D Gauss-Legendre points of the given polynomial `degree` in each axis,
/// over `domain_u x domain_v`, weight the product of the two 1D weights.
pub fn gauss_legendre_2d(
    degree_u: usize,
    degree_v: usize,
    domain_u: Interval,
    domain_v: Interval,
) -> Result<Vec<IntegrationPoint<2>>> {
    let pts_u = gauss_legendre_1d(degree_u, domain_u)?;
    let pts_v = gauss_legendre_1d(degree_v, domain_v)?;
    let mut result = Vec::with_capacity(pts_u.len() * pts_v.len());
    for &(u, wu) in &pts_u {
        for &(v, wv) in &pts_v {
            result.push(IntegrationPoint { coordinates: [u, v], weight: wu * wv });
        }
    }
    Ok(result)
}

/// A barycentric quadrature rule over the reference triangle: `(b0, b1, b2, weight)` with
/// `b0 + b1 + b2 = 1` and the weights summing to `0.5` (the reference triangle's area), so
/// that scaling by twice a triangle's signed area (per §4.11/§4.13) yields the correct
/// integral weight.
type TriangleRule = (f64, f64, f64, f64);

/// Xiao-Gimbutas-style symmetric triangle quadrature rules, indexed by the minimum
/// polynomial degree they integrate exactly. A request for a lower degree is served by the
/// smallest rule that is at least as precise.
const TRIANGLE_RULES: &[(usize, &[TriangleRule])] = &[
    (1, &[(1.0 / 3.0, 1.0 / 3.0, 1.0 / 3.0, 0.5)]),
    (
        2,
        &[
            (2.0 / 3.0, 1.0 / 6.0, 1.0 / 6.0, 1.0 / 6.0),
            (1.0 / 6.0, 2.0 / 3.0, 1.0 / 6.0, 1.0 / 6.0),
            (1.0 / 6.0, 1.0 / 6.0, 2.0 / 3.0, 1.0 / 6.0),
        ],
    ),
    (
        4,
        &[
            (0.108103018168070, 0.445948490915965, 0.445948490915965, 0.111690794839006),
            (0.445948490915965, 0.108103018168070, 0.445948490915965, 0.111690794839006),
            (0.445948490915965, 0.445948490915965, 0.108103018168070, 0.111690794839006),
            (0.816847572980459, 0.091576213509771, 0.091576213509771, 0.054975871827661),
            (0.091576213509771, 0.816847572980459, 0.091576213509771, 0.054975871827661),
            (0.091576213509771, 0.091576213509771, 0.816847572980459, 0.054975871827661),
        ],
    ),
    (
        5,
        &[
            (1.0 / 3.0, 1.0 / 3.0, 1.0 / 3.0, 0.1125),
            (0.470142064105115, 0.059715871789770, 0.470142064105115, 0.066197076394253),
            (0.059715871789770, 0.470142064105115, 0.470142064105115, 0.066197076394253),
            (0.470142064105115, 0.470142064105115, 0.059715871789770, 0.066197076394253),
            (0.101286507323456, 0.797426985353087, 0.101286507323456, 0.062969590272414),
            (0.797426985353087, 0.101286507323456, 0.101286507323456, 0.062969590272414),
            (0.101286507323456, 0.101286507323456, 0.797426985353087, 0.062969590272414),
        ],
    ),
];

fn triangle_rule(degree: usize) -> Result<&'static [TriangleRule]> {
    TRIANGLE_RULES
        .iter()
        .find(|&&(exact_degree, _)| exact_degree >= degree)
        .map(|&(_, rule)| rule)
        .ok_or(Error::UnsupportedDegree(degree))
}

/// Integration points over a [`Polygon`]: triangulate by ear-clipping, then place one fixed
/// Xiao-Gimbutas-style barycentric quadrature rule of `degree` per triangle, scaling each
/// weight by twice the triangle's signed area and mapping barycentric to Cartesian.
#[derive(Clone, Copy, Debug, Default)]
pub struct PolygonIntegrationPoints;

impl PolygonIntegrationPoints {
    /// Creates an orchestrator. Stateless; the triangulator and quadrature table do all the
    /// work per call.
    pub fn new() -> Self { PolygonIntegrationPoints }

    /// Computes the integration points of `polygon` at polynomial `degree`.
    pub fn compute(&self, polygon: &Polygon, degree: usize) -> Result<Vec<IntegrationPoint<2>>> {
        let rule = triangle_rule(degree)?;
        let triangles = PolygonTessellator::new().triangulate(polygon)?;
        let mut result = Vec::with_capacity(triangles.len() * rule.len());
        for tri in triangles {
            let [v0, v1, v2] = tri.map(|i| polygon.vertex(i)).map(|r| r.expect("triangulation indices are valid"));
            let cross = (v1.x - v0.x) * (v2.y - v0.y) - (v2.x - v0.x) * (v1.y - v0.y);
            for &(b0, b1, b2, w) in rule {
                let p: Vector2 = v0 * b0 + v1 * b1 + v2 * b2;
                result.push(IntegrationPoint { coordinates: [p.x, p.y], weight: w * cross });
            }
        }
        Ok(result)
    }
}
