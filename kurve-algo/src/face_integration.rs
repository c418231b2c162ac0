//! Face integration points: clip a face's surface into empty/full/trimmed spans and place
//! quadrature points on what remains, weighted by the surface area element.

use crate::clipper::{SpanClassification, SurfaceClipper};
use crate::errors::Result;
use crate::integration::{gauss_legendre_2d, PolygonIntegrationPoints};
use cgmath::InnerSpace;
use kurve_base::cgmath64::Vector3;
use kurve_geometry::control_point::ControlPoint;
use kurve_geometry::shape::surface::shape_index;
use kurve_geometry::NurbsSurface;
use kurve_topology::Face;

/// One quadrature point on a face: its `(u, v)` surface parameter, the corresponding 3D
/// position, and an integration weight already scaled by the surface area element
/// `‖S_u × S_v‖`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FaceIntegrationPoint<V> {
    /// the `u` surface parameter
    pub u: f64,
    /// the `v` surface parameter
    pub v: f64,
    /// the surface's 3D position at `(u, v)`
    pub point: V,
    /// the integration weight, scaled by the surface area element at `(u, v)`
    pub weight: f64,
}

/// Computes the integration points of `face`'s trimmed region, at the tessellation/clip
/// tolerance `tolerance` (per §4.12). Full spans get a tensor-product Gauss rule of degree
/// `(degree_u + 1, degree_v + 1)`; trimmed spans are triangulated and integrated with a
/// Xiao-Gimbutas rule of degree `max(degree_u, degree_v) + 1`.
pub fn face_integration_points<V>(face: &Face<V>, tolerance: f64) -> Result<Vec<FaceIntegrationPoint<V>>>
where
    V: ControlPoint<Diff = Vector3>,
{
    let clipper = SurfaceClipper::compute(face, tolerance)?;
    let surface = face.surface();
    let degree_u = surface.degree_u();
    let degree_v = surface.degree_v();

    let mut result = Vec::new();
    for i in 0..clipper.nb_spans_u() {
        for j in 0..clipper.nb_spans_v() {
            match clipper.classification(i, j) {
                SpanClassification::Empty => {}
                SpanClassification::Full => {
                    let points = gauss_legendre_2d(degree_u + 1, degree_v + 1, clipper.span_u(i), clipper.span_v(j))?;
                    for p in points {
                        result.push(surface_point(surface, p.coordinates[0], p.coordinates[1], p.weight)?);
                    }
                }
                SpanClassification::Trimmed => {
                    let degree = degree_u.max(degree_v) + 1;
                    for polygon in clipper.polygons(i, j) {
                        let points = PolygonIntegrationPoints::new().compute(polygon, degree)?;
                        for p in points {
                            result.push(surface_point(surface, p.coordinates[0], p.coordinates[1], p.weight)?);
                        }
                    }
                }
            }
        }
    }
    Ok(result)
}

fn surface_point<V: ControlPoint<Diff = Vector3>>(
    surface: &NurbsSurface<V>,
    u: f64,
    v: f64,
    weight: f64,
) -> Result<FaceIntegrationPoint<V>> {
    let ders = surface.derivatives_at(u, v, 1)?;
    let su = ders[shape_index(1, 0)];
    let sv = ders[shape_index(0, 1)];
    let area_element = su.cross(sv).magnitude();
    let point = surface.point_at(u, v)?;
    Ok(FaceIntegrationPoint { u, v, point, weight: weight * area_element })
}

#[cfg(test)]
mod tests {
    use super::*;
    use kurve_base::cgmath64::{Point3, Vector2};
    use kurve_geometry::knot_vec::KnotVec;
    use kurve_geometry::NurbsCurve;
    use kurve_topology::face::TrimSpec;

    fn flat_square_surface() -> std::sync::Arc<NurbsSurface<Point3>> {
        let knots = KnotVec::new_unchecked(vec![0.0, 0.0, 1.0, 2.0, 2.0]);
        let mut poles = Vec::new();
        for pu in 0..3 {
            for pv in 0..3 {
                poles.push(Point3::new(pu as f64, pv as f64, 0.0));
            }
        }
        std::sync::Arc::new(NurbsSurface::try_new(2, 2, knots.clone(), knots, poles).unwrap())
    }

    fn line_curve(a: Vector2, b: Vector2) -> NurbsCurve<Vector2> {
        let knots = KnotVec::new_unchecked(vec![0.0, 1.0]);
        NurbsCurve::try_new(1, knots, vec![a, b]).unwrap()
    }

    fn full_square_loop() -> Vec<TrimSpec<Point3>> {
        vec![
            TrimSpec { curve2d: line_curve(Vector2::new(0.0, 0.0), Vector2::new(2.0, 0.0)), domain: None, edge: None },
            TrimSpec { curve2d: line_curve(Vector2::new(2.0, 0.0), Vector2::new(2.0, 2.0)), domain: None, edge: None },
            TrimSpec { curve2d: line_curve(Vector2::new(2.0, 2.0), Vector2::new(0.0, 2.0)), domain: None, edge: None },
            TrimSpec { curve2d: line_curve(Vector2::new(0.0, 2.0), Vector2::new(0.0, 0.0)), domain: None, edge: None },
        ]
    }

    #[test]
    fn full_flat_square_integrates_to_its_area() {
        let face = Face::try_new(flat_square_surface(), vec![full_square_loop()]).unwrap();
        let points = face_integration_points(&face, 1e-3).unwrap();
        let area: f64 = points.iter().map(|p| p.weight).sum();
        assert!((area - 4.0).abs() < 1e-6, "area={area}");
    }

    #[test]
    fn half_square_trim_integrates_to_half_the_area() {
        let half_loop = vec![
            TrimSpec { curve2d: line_curve(Vector2::new(0.0, 0.0), Vector2::new(1.0, 0.0)), domain: None, edge: None },
            TrimSpec { curve2d: line_curve(Vector2::new(1.0, 0.0), Vector2::new(1.0, 2.0)), domain: None, edge: None },
            TrimSpec { curve2d: line_curve(Vector2::new(1.0, 2.0), Vector2::new(0.0, 2.0)), domain: None, edge: None },
            TrimSpec { curve2d: line_curve(Vector2::new(0.0, 2.0), Vector2::new(0.0, 0.0)), domain: None, edge: None },
        ];
        let face = Face::try_new(flat_square_surface(), vec![half_loop]).unwrap();
        let points = face_integration_points(&face, 1e-3).unwrap();
        let area: f64 = points.iter().map(|p| p.weight).sum();
        assert!((area - 2.0).abs() < 1e-6, "area={area}");
    }

    #[test]
    fn outer_and_inner_loop_integrate_to_the_trimmed_region_area() {
        // a hole straddling the (1, 1) span boundary, so several spans classify as
        // `Trimmed` rather than `Empty`/`Full`, matching the scenario a BREP face with an
        // outer and an inner loop is expected to integrate correctly across.
        let hole_loop = vec![
            TrimSpec { curve2d: line_curve(Vector2::new(0.6, 0.6), Vector2::new(1.4, 0.6)), domain: None, edge: None },
            TrimSpec { curve2d: line_curve(Vector2::new(1.4, 0.6), Vector2::new(1.4, 1.4)), domain: None, edge: None },
            TrimSpec { curve2d: line_curve(Vector2::new(1.4, 1.4), Vector2::new(0.6, 1.4)), domain: None, edge: None },
            TrimSpec { curve2d: line_curve(Vector2::new(0.6, 1.4), Vector2::new(0.6, 0.6)), domain: None, edge: None },
        ];
        let face = Face::try_new(flat_square_surface(), vec![full_square_loop(), hole_loop]).unwrap();
        let points = face_integration_points(&face, 1e-3).unwrap();
        let area: f64 = points.iter().map(|p| p.weight).sum();
        let expected = 4.0 - 0.8 * 0.8;
        assert!((area - expected).abs() < 1e-3, "area={area} expected={expected}");
    }
}
