//! Trimmed-surface clipping: classify every knot span of a face's surface as empty, fully
//! inside the trimmed region, or cut by a trim boundary, per the integer-grid rectangle
//! clip described in §4.12.
//!
//! The reference implementation (`TrimmedSurfaceClipping.h` in the retrieved source) builds
//! on a general polygon-boolean library (ClipperLib) to intersect each loop against a span
//! rectangle. No such crate is available here, but a face's loops are already restricted to
//! one outer boundary plus independent hole loops (see [`kurve_topology::Face`]), and a span
//! rectangle is convex, so a plain Sutherland-Hodgman rectangle clip of each loop
//! independently reproduces the same classification without needing general polygon
//! booleans.

use crate::errors::Result;
use crate::polygon::Polygon;
use kurve_base::cgmath64::Vector2;
use kurve_base::Interval;
use kurve_geometry::control_point::ControlPoint;
use kurve_topology::curve::Curve as TopoCurve;
use kurve_topology::{Face, Loop};

/// An integer-grid point, used so that clipping and the "is this exactly the rectangle"
/// check are exact instead of floating-point-fragile.
type IntPoint = (i64, i64);

/// How one knot span of a face's surface relates to the face's trimmed region.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SpanClassification {
    /// The span lies entirely outside the trimmed region; it contributes nothing.
    Empty,
    /// The span lies entirely inside the trimmed region; integrate it directly.
    Full,
    /// A trim boundary cuts through the span; integrate the stored polygon region(s)
    /// instead of the whole span rectangle.
    Trimmed,
}

struct Cell {
    classification: SpanClassification,
    polygons: Vec<Polygon>,
}

/// Classifies every `(span_u, span_v)` cell of a face's surface, quantizing tessellated
/// trim loops to an integer grid (scale `tolerance / 10`) and clipping each against the
/// span's rectangle (tessellation chord tolerance `tolerance * 10`, coarser than the
/// default curve tolerance since clipping only needs to resolve which side of a boundary a
/// region falls on).
#[derive(Debug)]
pub struct SurfaceClipper {
    spans_u: Vec<Interval>,
    spans_v: Vec<Interval>,
    cells: Vec<Cell>,
}

impl SurfaceClipper {
    /// Computes the clip classification of every knot span of `face`'s surface.
    pub fn compute<V: ControlPoint>(face: &Face<V>, tolerance: f64) -> Result<Self> {
        let surface = face.surface();
        let spans_u = surface.spans_u();
        let spans_v = surface.spans_v();

        let scale = tolerance / 10.0;
        let eps = tolerance * 10.0;

        let mut loop_paths = Vec::with_capacity(face.loops().len());
        for lp in face.loops() {
            loop_paths.push(tessellate_loop(lp, eps)?);
        }

        let mut cells = Vec::with_capacity(spans_u.len() * spans_v.len());
        for span_u in &spans_u {
            for span_v in &spans_v {
                let rect = [
                    to_int(Vector2::new(span_u.t0(), span_v.t0()), scale),
                    to_int(Vector2::new(span_u.t1(), span_v.t0()), scale),
                    to_int(Vector2::new(span_u.t1(), span_v.t1()), scale),
                    to_int(Vector2::new(span_u.t0(), span_v.t1()), scale),
                ];
                cells.push(classify(&loop_paths, &rect, scale));
            }
        }

        Ok(SurfaceClipper { spans_u, spans_v, cells })
    }

    /// the number of knot spans along `u`
    pub fn nb_spans_u(&self) -> usize { self.spans_u.len() }
    /// the number of knot spans along `v`
    pub fn nb_spans_v(&self) -> usize { self.spans_v.len() }

    /// the `u` extent of span `index_u`
    pub fn span_u(&self, index_u: usize) -> Interval { self.spans_u[index_u] }
    /// the `v` extent of span `index_v`
    pub fn span_v(&self, index_v: usize) -> Interval { self.spans_v[index_v] }

    fn index(&self, index_u: usize, index_v: usize) -> usize { index_u * self.spans_v.len() + index_v }

    /// how span `(index_u, index_v)` relates to the trimmed region
    pub fn classification(&self, index_u: usize, index_v: usize) -> SpanClassification {
        self.cells[self.index(index_u, index_v)].classification
    }

    /// the polygon region(s) of span `(index_u, index_v)`, non-empty only when its
    /// classification is [`SpanClassification::Trimmed`]
    pub fn polygons(&self, index_u: usize, index_v: usize) -> &[Polygon] {
        &self.cells[self.index(index_u, index_v)].polygons
    }
}

fn classify(loop_paths: &[Vec<IntPoint>], rect: &[IntPoint; 4], scale: f64) -> Cell {
    let empty = Cell { classification: SpanClassification::Empty, polygons: Vec::new() };
    let Some((outer_path, hole_paths)) = loop_paths.split_first() else { return empty };

    let outer_clip = clip_rect(outer_path, rect);
    if outer_clip.len() < 3 || area2(&outer_clip) == 0 {
        return empty;
    }

    let mut hole_clips = Vec::new();
    for hole in hole_paths {
        let clip = clip_rect(hole, rect);
        if clip.len() < 3 || area2(&clip) == 0 {
            continue;
        }
        if is_rect(&clip, rect) {
            return empty;
        }
        hole_clips.push(clip);
    }

    if hole_clips.is_empty() && is_rect(&outer_clip, rect) {
        return Cell { classification: SpanClassification::Full, polygons: Vec::new() };
    }

    let outer_f64 = outer_clip.iter().map(|&p| from_int(p, scale)).collect();
    let inner_f64 = hole_clips.iter().map(|hole| hole.iter().map(|&p| from_int(p, scale)).collect()).collect();
    Cell {
        classification: SpanClassification::Trimmed,
        polygons: vec![Polygon::new(outer_f64, inner_f64)],
    }
}

/// Tessellates every trim of `lp` in order and quantizes the concatenated points to the
/// integer grid, without deduplicating shared trim endpoints (consecutive duplicates do
/// not change the clip or area computation below).
fn tessellate_loop<V: ControlPoint>(lp: &Loop<V>, tolerance: f64) -> Result<Vec<IntPoint>> {
    let scale = tolerance / 10.0;
    let mut points = Vec::new();
    for trim in lp.trims() {
        points.extend(tessellate_bounded(trim.curve2d(), tolerance)?);
    }
    Ok(points.into_iter().map(|p| to_int(p, scale)).collect())
}

/// Adaptive chord-tolerance tessellation of a restricted-domain 2D curve, mirroring
/// [`kurve_geometry::tessellation::tessellate`] but seeded from [`TopoCurve::spans`] (which
/// are already clipped to the curve's own sub-domain) instead of the full geometry's spans,
/// since trims can restrict a curve to less than its underlying geometry's own domain.
fn tessellate_bounded(curve: &TopoCurve<Vector2>, tolerance: f64) -> Result<Vec<Vector2>> {
    let domain = curve.domain();

    let mut samples: Vec<(f64, Vector2)> = Vec::new();
    for span in curve.spans() {
        let t = domain.normalized(span.t0());
        samples.push((t, curve.point_at(span.t0())?));
    }
    samples.push((1.0, curve.point_at(domain.t1())?));
    samples.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap());

    let degree = curve.geometry().degree();
    let n = degree * 2 + 1;

    let mut points = Vec::new();
    loop {
        let (t_a, point_a) = samples.pop().expect("at least the domain endpoint is sampled");
        points.push(point_a);
        if samples.is_empty() {
            break;
        }
        loop {
            let (t_b, point_b) = *samples.last().expect("checked non-empty above");
            let mut max_distance = 0.0_f64;
            let mut max_sample: Option<(f64, Vector2)> = None;
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

/// Perpendicular distance from `point` to the line through `a` and `b`.
fn distance_to_chord(point: Vector2, a: Vector2, b: Vector2) -> f64 {
    let ab = b - a;
    let len = (ab.x * ab.x + ab.y * ab.y).sqrt();
    if len < 1e-20 {
        let d = point - a;
        return (d.x * d.x + d.y * d.y).sqrt();
    }
    ((point.x - a.x) * ab.y - (point.y - a.y) * ab.x).abs() / len
}

fn to_int(p: Vector2, scale: f64) -> IntPoint { ((p.x / scale).round() as i64, (p.y / scale).round() as i64) }

fn from_int(p: IntPoint, scale: f64) -> Vector2 { Vector2::new(p.0 as f64 * scale, p.1 as f64 * scale) }

/// Sutherland-Hodgman clip of `path` against the axis-aligned rectangle whose corners are
/// `rect` (in counter-clockwise order), one half-plane at a time.
fn clip_rect(path: &[IntPoint], rect: &[IntPoint; 4]) -> Vec<IntPoint> {
    let (x0, y0) = rect[0];
    let (x1, y1) = rect[2];
    let (xmin, xmax) = (x0.min(x1), x0.max(x1));
    let (ymin, ymax) = (y0.min(y1), y0.max(y1));

    let mut result = path.to_vec();
    result = clip_half_plane(&result, |p| p.0 >= xmin, |a, b| intersect_vertical(a, b, xmin));
    result = clip_half_plane(&result, |p| p.0 <= xmax, |a, b| intersect_vertical(a, b, xmax));
    result = clip_half_plane(&result, |p| p.1 >= ymin, |a, b| intersect_horizontal(a, b, ymin));
    result = clip_half_plane(&result, |p| p.1 <= ymax, |a, b| intersect_horizontal(a, b, ymax));
    dedup_consecutive(result)
}

fn clip_half_plane(
    path: &[IntPoint],
    inside: impl Fn(IntPoint) -> bool,
    intersect: impl Fn(IntPoint, IntPoint) -> IntPoint,
) -> Vec<IntPoint> {
    if path.is_empty() {
        return Vec::new();
    }
    let n = path.len();
    let mut output = Vec::with_capacity(n + 2);
    for i in 0..n {
        let current = path[i];
        let previous = path[(i + n - 1) % n];
        let (curr_in, prev_in) = (inside(current), inside(previous));
        if curr_in {
            if !prev_in {
                output.push(intersect(previous, current));
            }
            output.push(current);
        } else if prev_in {
            output.push(intersect(previous, current));
        }
    }
    output
}

fn intersect_vertical(a: IntPoint, b: IntPoint, x: i64) -> IntPoint {
    let t = (x - a.0) as f64 / (b.0 - a.0) as f64;
    (x, (a.1 as f64 + t * (b.1 - a.1) as f64).round() as i64)
}

fn intersect_horizontal(a: IntPoint, b: IntPoint, y: i64) -> IntPoint {
    let t = (y - a.1) as f64 / (b.1 - a.1) as f64;
    ((a.0 as f64 + t * (b.0 - a.0) as f64).round() as i64, y)
}

fn dedup_consecutive(path: Vec<IntPoint>) -> Vec<IntPoint> {
    let mut result: Vec<IntPoint> = Vec::with_capacity(path.len());
    for p in path {
        if result.last() != Some(&p) {
            result.push(p);
        }
    }
    if result.len() > 1 && result.first() == result.last() {
        result.pop();
    }
    result
}

/// Twice the signed area of `path` (`0` for a degenerate or collinear path).
fn area2(path: &[IntPoint]) -> i128 {
    let n = path.len();
    let mut sum: i128 = 0;
    for i in 0..n {
        let (ax, ay) = path[i];
        let (bx, by) = path[(i + 1) % n];
        sum += ax as i128 * by as i128 - bx as i128 * ay as i128;
    }
    sum
}

/// Whether `path` is exactly `rect`'s four corners, in either winding direction and
/// starting from any corner.
fn is_rect(path: &[IntPoint], rect: &[IntPoint; 4]) -> bool {
    if path.len() != 4 {
        return false;
    }
    for reversed in [false, true] {
        let candidate: Vec<IntPoint> = if reversed { path.iter().rev().copied().collect() } else { path.to_vec() };
        for start in 0..4 {
            if (0..4).all(|i| candidate[(start + i) % 4] == rect[i]) {
                return true;
            }
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use kurve_base::cgmath64::Point3;
    use kurve_geometry::knot_vec::KnotVec;
    use kurve_geometry::NurbsCurve;
    use kurve_geometry::NurbsSurface;
    use kurve_topology::face::TrimSpec;
    use std::sync::Arc;

    fn grid_surface() -> Arc<NurbsSurface<Point3>> {
        let knots = KnotVec::new_unchecked(vec![0.0, 0.0, 1.0, 2.0, 3.0, 3.0]);
        let mut poles = Vec::new();
        for pu in 0..4 {
            for pv in 0..4 {
                poles.push(Point3::new(pu as f64, pv as f64, 0.0));
            }
        }
        Arc::new(NurbsSurface::try_new(2, 2, knots.clone(), knots, poles).unwrap())
    }

    fn line_curve(a: Vector2, b: Vector2) -> NurbsCurve<Vector2> {
        let knots = KnotVec::new_unchecked(vec![0.0, 1.0]);
        NurbsCurve::try_new(1, knots, vec![a, b]).unwrap()
    }

    fn rect_loop(lo: Vector2, hi: Vector2) -> Vec<TrimSpec<Point3>> {
        vec![
            TrimSpec { curve2d: line_curve(Vector2::new(lo.x, lo.y), Vector2::new(hi.x, lo.y)), domain: None, edge: None },
            TrimSpec { curve2d: line_curve(Vector2::new(hi.x, lo.y), Vector2::new(hi.x, hi.y)), domain: None, edge: None },
            TrimSpec { curve2d: line_curve(Vector2::new(hi.x, hi.y), Vector2::new(lo.x, hi.y)), domain: None, edge: None },
            TrimSpec { curve2d: line_curve(Vector2::new(lo.x, hi.y), Vector2::new(lo.x, lo.y)), domain: None, edge: None },
        ]
    }

    #[test]
    fn face_covering_whole_domain_is_all_full() {
        let face = Face::try_new(grid_surface(), vec![rect_loop(Vector2::new(0.0, 0.0), Vector2::new(3.0, 3.0))]).unwrap();
        let clipper = SurfaceClipper::compute(&face, 1e-3).unwrap();
        for i in 0..clipper.nb_spans_u() {
            for j in 0..clipper.nb_spans_v() {
                assert_eq!(clipper.classification(i, j), SpanClassification::Full, "span ({i},{j})");
            }
        }
    }

    #[test]
    fn face_restricted_to_one_span_classifies_only_that_span_full() {
        let face = Face::try_new(grid_surface(), vec![rect_loop(Vector2::new(1.0, 1.0), Vector2::new(2.0, 2.0))]).unwrap();
        let clipper = SurfaceClipper::compute(&face, 1e-3).unwrap();
        let mut full_count = 0;
        let mut empty_count = 0;
        for i in 0..clipper.nb_spans_u() {
            for j in 0..clipper.nb_spans_v() {
                match clipper.classification(i, j) {
                    SpanClassification::Full => full_count += 1,
                    SpanClassification::Empty => empty_count += 1,
                    SpanClassification::Trimmed => panic!("span ({i},{j}) should align exactly with a span boundary"),
                }
            }
        }
        assert_eq!(full_count, 1);
        assert_eq!(empty_count, clipper.nb_spans_u() * clipper.nb_spans_v() - 1);
    }

    #[test]
    fn hole_covering_a_span_makes_it_empty_others_remain_full() {
        let outer = rect_loop(Vector2::new(0.0, 0.0), Vector2::new(3.0, 3.0));
        let hole = rect_loop(Vector2::new(1.0, 1.0), Vector2::new(2.0, 2.0));
        let face = Face::try_new(grid_surface(), vec![outer, hole]).unwrap();
        let clipper = SurfaceClipper::compute(&face, 1e-3).unwrap();
        assert_eq!(clipper.classification(1, 1), SpanClassification::Empty);
        for &(i, j) in &[(0, 0), (0, 1), (1, 0), (2, 2)] {
            assert_eq!(clipper.classification(i, j), SpanClassification::Full, "span ({i},{j})");
        }
    }

    #[test]
    fn partial_overlap_is_trimmed_with_matching_area() {
        let face = Face::try_new(grid_surface(), vec![rect_loop(Vector2::new(0.5, 0.0), Vector2::new(1.5, 1.0))]).unwrap();
        let clipper = SurfaceClipper::compute(&face, 1e-3).unwrap();
        assert_eq!(clipper.classification(0, 0), SpanClassification::Trimmed);
        let polygons = clipper.polygons(0, 0);
        assert_eq!(polygons.len(), 1);
        let outer = polygons[0].outer();
        let area: f64 = (0..outer.len())
            .map(|i| {
                let a = outer[i];
                let b = outer[(i + 1) % outer.len()];
                a.x * b.y - b.x * a.y
            })
            .sum::<f64>()
            / 2.0;
        assert!((area.abs() - 0.5).abs() < 1e-3, "area={area}");
        assert_eq!(clipper.classification(1, 0), SpanClassification::Empty);
    }
}
