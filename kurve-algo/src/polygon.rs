//! A 2D polygon with an outer (counter-clockwise) boundary and zero or more inner
//! (clockwise) holes, flat-indexed outer-first then holes in order, plus an ear-clipping
//! triangulator for it.

use crate::errors::{Error, Result};
use kurve_base::cgmath64::Vector2;
use serde::{Deserialize, Serialize};

/// A polygon: one outer counter-clockwise path, plus zero or more inner clockwise paths
/// (holes). Every vertex of every path lives in a single flat index space: the outer
/// path's vertices come first, in order, followed by each inner path's vertices, in the
/// order the paths were given.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Polygon {
    outer: Vec<Vector2>,
    inner: Vec<Vec<Vector2>>,
}

impl Polygon {
    /// Builds a polygon from its outer path and inner (hole) paths.
    pub fn new(outer: Vec<Vector2>, inner: Vec<Vec<Vector2>>) -> Self { Polygon { outer, inner } }

    /// A polygon with no holes.
    pub fn simple(outer: Vec<Vector2>) -> Self { Polygon { outer, inner: Vec::new() } }

    /// the outer path
    pub fn outer(&self) -> &[Vector2] { &self.outer }

    /// the inner (hole) paths, in order
    pub fn inner(&self) -> &[Vec<Vector2>] { &self.inner }

    /// The number of paths: the outer path plus every hole.
    pub fn nb_loops(&self) -> usize { 1 + self.inner.len() }

    /// The number of vertices in path `loop_index` (`0` is the outer path).
    pub fn nb_vertices_of_loop(&self, loop_index: usize) -> usize { self.loop_path(loop_index).len() }

    /// The flat vertex index of the `vertex_index`-th vertex of path `loop_index`.
    pub fn vertex_of_loop(&self, loop_index: usize, vertex_index: usize) -> usize {
        self.loop_offset(loop_index) + vertex_index
    }

    /// The total number of vertices across every path.
    pub fn nb_vertices(&self) -> usize {
        self.outer.len() + self.inner.iter().map(Vec::len).sum::<usize>()
    }

    /// The vertex at flat index `index`.
    pub fn vertex(&self, index: usize) -> Result<Vector2> {
        if index < self.outer.len() {
            return Ok(self.outer[index]);
        }
        let mut offset = self.outer.len();
        for hole in &self.inner {
            if index < offset + hole.len() {
                return Ok(hole[index - offset]);
            }
            offset += hole.len();
        }
        Err(Error::OutOfRange { index, len: self.nb_vertices() })
    }

    fn loop_path(&self, loop_index: usize) -> &[Vector2] {
        if loop_index == 0 {
            &self.outer
        } else {
            &self.inner[loop_index - 1]
        }
    }

    fn loop_offset(&self, loop_index: usize) -> usize {
        if loop_index == 0 {
            return 0;
        }
        self.outer.len() + self.inner[..loop_index - 1].iter().map(Vec::len).sum::<usize>()
    }

    /// Twice the signed area of `path` (positive for counter-clockwise orientation).
    fn signed_area2(path: &[Vector2]) -> f64 {
        let mut sum = 0.0;
        for i in 0..path.len() {
            let a = path[i];
            let b = path[(i + 1) % path.len()];
            sum += a.x * b.y - b.x * a.y;
        }
        sum
    }
}

fn cross2(o: Vector2, a: Vector2, b: Vector2) -> f64 { (a.x - o.x) * (b.y - o.y) - (a.y - o.y) * (b.x - o.x) }

fn point_in_triangle(p: Vector2, a: Vector2, b: Vector2, c: Vector2) -> bool {
    let d1 = cross2(a, b, p);
    let d2 = cross2(b, c, p);
    let d3 = cross2(c, a, p);
    let has_neg = d1 < 0.0 || d2 < 0.0 || d3 < 0.0;
    let has_pos = d1 > 0.0 || d2 > 0.0 || d3 > 0.0;
    !(has_neg && has_pos)
}

/// Ear-clipping triangulator for [`Polygon`]s: valid for simple polygons (outer path and
/// holes not self-intersecting, holes not touching each other or the outer boundary).
#[derive(Clone, Copy, Debug, Default)]
pub struct PolygonTessellator;

impl PolygonTessellator {
    /// Creates a tessellator. Stateless; kept as a type for symmetry with the other
    /// integration-point components that do hold working state.
    pub fn new() -> Self { PolygonTessellator }

    /// Triangulates `polygon`, returning triangles as triples of flat vertex indices
    /// (see [`Polygon::vertex`]), wound counter-clockwise.
    pub fn triangulate(&self, polygon: &Polygon) -> Result<Vec<[usize; 3]>> {
        if polygon.outer.len() < 3 {
            return Err(Error::DegeneratePolygon(polygon.outer.len()));
        }
        let ring = merge_holes(polygon);
        ear_clip(&ring, polygon)
    }
}

/// One node of the merged ring: the flat vertex index it refers back to in `polygon`.
/// Bridge vertices appear twice in the ring (once per side of the bridge) but always carry
/// their original flat index, so triangles reference real polygon vertices only.
fn merge_holes(polygon: &Polygon) -> Vec<usize> {
    let mut ring: Vec<usize> = (0..polygon.outer.len()).collect();
    if Polygon::signed_area2(&polygon.outer) < 0.0 {
        ring.reverse();
    }

    for (hole_idx, hole) in polygon.inner.iter().enumerate() {
        if hole.is_empty() {
            continue;
        }
        let offset = polygon.loop_offset(hole_idx + 1);
        let mut hole_ring: Vec<usize> = (0..hole.len()).map(|i| offset + i).collect();
        if Polygon::signed_area2(hole) > 0.0 {
            hole_ring.reverse();
        }
        splice_hole(&mut ring, &hole_ring, polygon);
    }
    ring
}

/// Finds the rightmost vertex of `hole_ring`, the outer-ring edge its rightward ray first
/// crosses, and the bridge vertex visible from it (Held's hole-elimination method), then
/// splices the hole into `ring` through a pair of coincident bridge edges.
fn splice_hole(ring: &mut Vec<usize>, hole_ring: &[usize], polygon: &Polygon) {
    let point = |idx: usize| polygon.vertex(idx).expect("flat index from this polygon's own rings");

    let hole_start = hole_ring
        .iter()
        .enumerate()
        .max_by(|(_, &a), (_, &b)| point(a).x.partial_cmp(&point(b).x).unwrap())
        .map(|(i, _)| i)
        .unwrap_or(0);
    let m = point(hole_ring[hole_start]);

    let mut best_bridge: Option<usize> = None;
    let mut best_x = f64::NEG_INFINITY;
    for i in 0..ring.len() {
        let a = point(ring[i]);
        let b = point(ring[(i + 1) % ring.len()]);
        let (lo, hi) = if a.y <= b.y { (a, b) } else { (b, a) };
        if m.y < lo.y || m.y > hi.y || (lo.y - hi.y).abs() < 1e-15 {
            continue;
        }
        let t = (m.y - lo.y) / (hi.y - lo.y);
        let x = lo.x + t * (hi.x - lo.x);
        if x > m.x && x > best_x {
            best_x = x;
            let p_idx = if a.x > b.x { i } else { (i + 1) % ring.len() };
            best_bridge = Some(p_idx);
        }
    }

    let bridge_pos = best_bridge.unwrap_or(0);
    let mut candidate_pos = bridge_pos;
    let mut candidate_d2 = f64::INFINITY;
    let candidate_x = point(ring[bridge_pos]);
    let intersection = Vector2::new(best_x.max(m.x), m.y);
    for (i, &idx) in ring.iter().enumerate() {
        let p = point(idx);
        if point_in_triangle(p, m, intersection, candidate_x) {
            let d2 = (p.x - m.x).powi(2) + (p.y - m.y).powi(2);
            if d2 < candidate_d2 {
                candidate_d2 = d2;
                candidate_pos = i;
            }
        }
    }

    let bridge_flat = ring[candidate_pos];
    let mut spliced = Vec::with_capacity(ring.len() + hole_ring.len() + 2);
    spliced.extend_from_slice(&ring[..=candidate_pos]);
    spliced.extend_from_slice(&hole_ring[hole_start..]);
    spliced.extend_from_slice(&hole_ring[..=hole_start]);
    spliced.push(bridge_flat);
    spliced.extend_from_slice(&ring[candidate_pos + 1..]);
    *ring = spliced;
}

/// Classic O(n^2) ear clipping over a simple ring of flat vertex indices.
fn ear_clip(ring: &[usize], polygon: &Polygon) -> Result<Vec<[usize; 3]>> {
    let point = |idx: usize| polygon.vertex(idx).expect("flat index from this polygon's own rings");
    let mut remaining: Vec<usize> = ring.to_vec();
    let mut triangles = Vec::new();

    if remaining.len() < 3 {
        return Ok(triangles);
    }

    let mut guard = 0usize;
    let max_iterations = remaining.len() * remaining.len() + 8;
    while remaining.len() > 3 {
        guard += 1;
        if guard > max_iterations {
            return Err(Error::DegeneratePolygon(polygon.outer.len()));
        }
        let n = remaining.len();
        let mut clipped = false;
        for i in 0..n {
            let prev = remaining[(i + n - 1) % n];
            let cur = remaining[i];
            let next = remaining[(i + 1) % n];
            let (a, b, c) = (point(prev), point(cur), point(next));
            if cross2(a, b, c) <= 0.0 {
                continue;
            }
            let is_ear = remaining
                .iter()
                .enumerate()
                .filter(|&(j, _)| j != (i + n - 1) % n && j != i && j != (i + 1) % n)
                .all(|(_, &idx)| !point_in_triangle(point(idx), a, b, c));
            if is_ear {
                triangles.push([prev, cur, next]);
                remaining.remove(i);
                clipped = true;
                break;
            }
        }
        if !clipped {
            return Err(Error::DegeneratePolygon(polygon.outer.len()));
        }
    }
    triangles.push([remaining[0], remaining[1], remaining[2]]);
    Ok(triangles)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triangle_area2(polygon: &Polygon, tri: [usize; 3]) -> f64 {
        let [a, b, c] = tri.map(|i| polygon.vertex(i).unwrap());
        ((b.x - a.x) * (c.y - a.y) - (c.x - a.x) * (b.y - a.y)).abs()
    }

    #[test]
    fn triangulates_a_unit_square() {
        let outer = vec![
            Vector2::new(0.0, 0.0),
            Vector2::new(1.0, 0.0),
            Vector2::new(1.0, 1.0),
            Vector2::new(0.0, 1.0),
        ];
        let polygon = Polygon::simple(outer);
        let tris = PolygonTessellator::new().triangulate(&polygon).unwrap();
        assert_eq!(tris.len(), 2);
        let total_area: f64 = tris.iter().map(|&t| triangle_area2(&polygon, t) / 2.0).sum();
        assert!((total_area - 1.0).abs() < 1e-9);
    }

    #[test]
    fn triangulates_a_square_with_a_square_hole() {
        let outer = vec![
            Vector2::new(0.0, 0.0),
            Vector2::new(4.0, 0.0),
            Vector2::new(4.0, 4.0),
            Vector2::new(0.0, 4.0),
        ];
        let hole = vec![
            Vector2::new(1.0, 1.0),
            Vector2::new(1.0, 2.0),
            Vector2::new(2.0, 2.0),
            Vector2::new(2.0, 1.0),
        ];
        let polygon = Polygon::new(outer, vec![hole]);
        let tris = PolygonTessellator::new().triangulate(&polygon).unwrap();
        let total_area: f64 = tris.iter().map(|&t| triangle_area2(&polygon, t) / 2.0).sum();
        assert!((total_area - (16.0 - 1.0)).abs() < 1e-6, "area={total_area}");
    }

    #[test]
    fn too_few_outer_vertices_is_rejected() {
        let polygon = Polygon::simple(vec![Vector2::new(0.0, 0.0), Vector2::new(1.0, 0.0)]);
        assert!(matches!(
            PolygonTessellator::new().triangulate(&polygon),
            Err(Error::DegeneratePolygon(2))
        ));
    }

    #[test]
    fn flat_indexing_walks_outer_then_holes() {
        let outer = vec![Vector2::new(0.0, 0.0), Vector2::new(1.0, 0.0), Vector2::new(0.0, 1.0)];
        let hole = vec![Vector2::new(0.1, 0.1)];
        let polygon = Polygon::new(outer, vec![hole]);
        assert_eq!(polygon.nb_loops(), 2);
        assert_eq!(polygon.nb_vertices(), 4);
        assert_eq!(polygon.vertex_of_loop(1, 0), 3);
        assert_eq!(polygon.vertex(3).unwrap(), Vector2::new(0.1, 0.1));
    }
}
