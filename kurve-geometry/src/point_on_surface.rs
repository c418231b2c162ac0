//! Closest-point projection onto a surface: a structured-grid KD-tree seed (built once at
//! construction), triangle-barycentric refinement of the seed, then a 5-iteration-capped
//! Newton step in `(u, v)`.

use crate::control_point::ControlPoint;
use crate::errors::Error;
use crate::nurbs_surface::NurbsSurface;
use crate::shape::surface::shape_index;
use cgmath::InnerSpace;
use kurve_base::Norm;
use std::ops::Index;

/// The Newton iteration cap for [`PointOnSurfaceProj::project`], per spec §4.9.
pub const MAX_NEWTON_ITERATIONS: usize = 5;

/// The result of projecting a point onto a surface.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Projection<V> {
    /// whether Newton refinement met `ftol` or `gtol` before exhausting the iteration cap
    pub converged: bool,
    /// the parameter found
    pub u: f64,
    /// the parameter found
    pub v: f64,
    /// the surface's position at `(u, v)`
    pub point: V,
}

struct Sample<V> {
    u: f64,
    v: f64,
    point: V,
}

/// A node of a recursively median-split KD-tree: `point`/`payload` live at this node, and
/// `left`/`right` index into the flat `nodes` array the tree owns.
struct KdNode<D> {
    point: D,
    payload: usize,
    left: Option<usize>,
    right: Option<usize>,
}

/// A KD-tree over 3D (or 2D) points, built once by recursive median splits and queried by
/// nearest-neighbour descent with backtracking.
struct KdTree<D> {
    nodes: Vec<KdNode<D>>,
    root: Option<usize>,
    dims: usize,
}

impl<D> KdTree<D>
where D: Copy + Index<usize, Output = f64>
{
    fn build(items: Vec<(D, usize)>, dims: usize) -> Self {
        let mut nodes = Vec::with_capacity(items.len());
        let mut indices: Vec<usize> = (0..items.len()).collect();
        let root = Self::build_recursive(&items, &mut indices, dims, 0, &mut nodes);
        KdTree { nodes, root, dims }
    }

    fn build_recursive(
        items: &[(D, usize)],
        indices: &mut [usize],
        dims: usize,
        axis: usize,
        nodes: &mut Vec<KdNode<D>>,
    ) -> Option<usize> {
        if indices.is_empty() {
            return None;
        }
        indices.sort_by(|&a, &b| items[a].0[axis].partial_cmp(&items[b].0[axis]).unwrap());
        let mid = indices.len() / 2;
        let (point, payload) = items[indices[mid]];
        let (left_idx, right_idx) = indices.split_at_mut(mid);
        let right_idx = &mut right_idx[1..];
        let left = Self::build_recursive(items, left_idx, dims, (axis + 1) % dims, nodes);
        let right = Self::build_recursive(items, right_idx, dims, (axis + 1) % dims, nodes);
        nodes.push(KdNode { point, payload, left, right });
        Some(nodes.len() - 1)
    }

    /// Nearest-neighbour descent: follows the half-space containing `query` first, then
    /// backtracks into the sibling subtree only if its splitting plane is closer than the
    /// best distance found so far.
    fn nearest(&self, query: D) -> usize {
        let mut best = self.root.expect("KdTree is never built from an empty sample set");
        let mut best_d2 = f64::INFINITY;
        self.search(self.root, query, 0, &mut best, &mut best_d2);
        best
    }

    fn search(&self, node: Option<usize>, query: D, axis: usize, best: &mut usize, best_d2: &mut f64) {
        let Some(idx) = node else { return };
        let n = &self.nodes[idx];
        let mut d2 = 0.0;
        for a in 0..self.dims {
            let diff = n.point[a] - query[a];
            d2 += diff * diff;
        }
        if d2 < *best_d2 {
            *best_d2 = d2;
            *best = n.payload;
        }
        let diff_axis = query[axis] - n.point[axis];
        let (near, far) = if diff_axis < 0.0 { (n.left, n.right) } else { (n.right, n.left) };
        self.search(near, query, (axis + 1) % self.dims, best, best_d2);
        if diff_axis * diff_axis < *best_d2 {
            self.search(far, query, (axis + 1) % self.dims, best, best_d2);
        }
    }
}

/// Projects query points onto a fixed surface, reusing a once-built sample grid across calls.
pub struct PointOnSurfaceProj<V> {
    surface: NurbsSurface<V>,
    nb_u: usize,
    nb_v: usize,
    samples: Vec<Sample<V>>,
    tree: KdTree<V::Diff>,
}

impl<V> PointOnSurfaceProj<V>
where
    V: ControlPoint,
    V::Diff: Norm + InnerSpace<Scalar = f64> + Index<usize, Output = f64>,
{
    /// Builds a projector for `surface`, sampling a `(degree_u+1)`-per-span by
    /// `(degree_v+1)`-per-span structured grid.
    pub fn new(surface: NurbsSurface<V>) -> Result<Self, Error> {
        let spans_u = surface.spans_u();
        let spans_v = surface.spans_v();
        let per_span_u = surface.degree_u() + 1;
        let per_span_v = surface.degree_v() + 1;

        let mut us = Vec::new();
        for span in &spans_u {
            for i in 0..per_span_u {
                us.push(span.t0() + span.length() * i as f64 / per_span_u as f64);
            }
        }
        us.push(surface.domain_u().t1());
        let mut vs = Vec::new();
        for span in &spans_v {
            for j in 0..per_span_v {
                vs.push(span.t0() + span.length() * j as f64 / per_span_v as f64);
            }
        }
        vs.push(surface.domain_v().t1());

        let (nb_u, nb_v) = (us.len(), vs.len());
        let mut samples = Vec::with_capacity(nb_u * nb_v);
        for &u in &us {
            for &v in &vs {
                let point = surface.point_at(u, v)?;
                samples.push(Sample { u, v, point });
            }
        }

        let tree_items: Vec<(V::Diff, usize)> =
            samples.iter().enumerate().map(|(i, s)| (s.point.to_vec(), i)).collect();
        let tree = KdTree::build(tree_items, samples_dims::<V>());

        Ok(PointOnSurfaceProj { surface, nb_u, nb_v, samples, tree })
    }

    /// the underlying surface
    pub fn surface(&self) -> &NurbsSurface<V> { &self.surface }

    /// Projects `q` onto the surface, using the spec's default tolerances
    /// (`ftol = gtol = 1e-7`).
    pub fn project_default(&self, q: V) -> Projection<V> { self.project(q, 1e-7, 1e-7) }

    /// Projects `q` onto the surface.
    pub fn project(&self, q: V, ftol: f64, gtol: f64) -> Projection<V> {
        let (u0, v0) = self.seed(q);
        self.refine(q, u0, v0, ftol, gtol)
    }

    /// Stage 1: nearest grid sample, then barycentric projection onto each of the up to
    /// four triangles formed with its grid neighbours, keeping the closest.
    fn seed(&self, q: V) -> (f64, f64) {
        let nearest = self.tree.nearest(q.to_vec());
        let (row, col) = (nearest / self.nb_v, nearest % self.nb_v);

        let mut best = (self.samples[nearest].u, self.samples[nearest].v);
        let mut best_d2 = (q - self.samples[nearest].point).dot(q - self.samples[nearest].point);

        let neighbor_pairs: [[(isize, isize); 2]; 4] =
            [[(-1, 0), (0, -1)], [(-1, 0), (0, 1)], [(1, 0), (0, -1)], [(1, 0), (0, 1)]];
        for pair in neighbor_pairs {
            let Some(b) = self.at(row, col, pair[0].0, pair[0].1) else { continue };
            let Some(c) = self.at(row, col, pair[1].0, pair[1].1) else { continue };
            let (u, v, d2) = self.project_triangle(q, nearest, b, c);
            if d2 < best_d2 {
                best_d2 = d2;
                best = (u, v);
            }
        }
        best
    }

    fn at(&self, row: usize, col: usize, dr: isize, dc: isize) -> Option<usize> {
        let r = row as isize + dr;
        let c = col as isize + dc;
        if r < 0 || c < 0 || r as usize >= self.nb_u || c as usize >= self.nb_v {
            return None;
        }
        Some(r as usize * self.nb_v + c as usize)
    }

    /// Barycentric projection of `q` onto triangle `(a, b, c)` in world space, returning the
    /// corresponding `(u, v)` (by the same barycentric weights applied to the samples'
    /// parameters) and squared distance.
    fn project_triangle(&self, q: V, a: usize, b: usize, c: usize) -> (f64, f64, f64) {
        let (pa, pb, pc) = (&self.samples[a], &self.samples[b], &self.samples[c]);
        let (v0, v1) = (pb.point.to_vec() - pa.point.to_vec(), pc.point.to_vec() - pa.point.to_vec());
        let v2 = q.to_vec() - pa.point.to_vec();
        let (d00, d01, d11) = (v0.dot(v0), v0.dot(v1), v1.dot(v1));
        let (d20, d21) = (v2.dot(v0), v2.dot(v1));
        let denom = d00 * d11 - d01 * d01;
        let (beta, gamma) = if denom.abs() < 1e-20 {
            (0.0, 0.0)
        } else {
            ((d11 * d20 - d01 * d21) / denom, (d00 * d21 - d01 * d20) / denom)
        };
        let (beta, gamma) = (beta.clamp(0.0, 1.0), gamma.clamp(0.0, 1.0 - beta));
        let alpha = 1.0 - beta - gamma;
        let u = alpha * pa.u + beta * pb.u + gamma * pc.u;
        let v = alpha * pa.v + beta * pb.v + gamma * pc.v;
        let point_on_tri = pa.point + (v0 * beta + v1 * gamma);
        let d2 = (q - point_on_tri).dot(q - point_on_tri);
        (u, v, d2)
    }

    /// Stage 2: Newton iteration on the gradient of `|S(u,v) - q|^2`.
    fn refine(&self, q: V, mut u: f64, mut v: f64, ftol: f64, gtol: f64) -> Projection<V> {
        let (du, dv) = (self.surface.domain_u(), self.surface.domain_v());
        let mut converged = false;
        let mut point = self.surface.point_at(u, v).unwrap_or(q);

        for _ in 0..MAX_NEWTON_ITERATIONS {
            let Ok(ders) = self.surface.derivatives_at(u, v, 2) else { break };
            point = V::origin() + ders[shape_index(0, 0)];
            let r = point.to_vec() - q.to_vec();
            let (su, sv) = (ders[shape_index(1, 0)], ders[shape_index(0, 1)]);
            let (suu, suv, svv) = (ders[shape_index(2, 0)], ders[shape_index(1, 1)], ders[shape_index(0, 2)]);

            if r.dot(r) < ftol * ftol {
                converged = true;
                break;
            }
            let g = (-su.dot(r), -sv.dot(r));
            if g.0 * g.0 + g.1 * g.1 < gtol * gtol {
                converged = true;
                break;
            }

            let h00 = su.dot(su) - suu.dot(r);
            let h01 = su.dot(sv) - suv.dot(r);
            let h11 = sv.dot(sv) - svv.dot(r);
            let det = h00 * h11 - h01 * h01;
            if det.abs() < 1e-300 {
                break;
            }
            let rhs = (su.dot(r), sv.dot(r));
            let delta_u = (h11 * rhs.0 - h01 * rhs.1) / det;
            let delta_v = (h00 * rhs.1 - h01 * rhs.0) / det;
            u = du.clamp(u - delta_u);
            v = dv.clamp(v - delta_v);
        }

        Projection { converged, u, v, point: self.surface.point_at(u, v).unwrap_or(point) }
    }
}

fn samples_dims<V: ControlPoint>() -> usize { V::DIM }

#[cfg(test)]
mod tests {
    use super::*;
    use crate::knot_vec::KnotVec;
    use kurve_base::cgmath64::Point3;

    fn bilinear_patch() -> NurbsSurface<Point3> {
        let knots_u = KnotVec::new_unchecked(vec![0.0, 1.0]);
        let knots_v = KnotVec::new_unchecked(vec![0.0, 1.0]);
        let poles = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
        ];
        NurbsSurface::try_new(1, 1, knots_u, knots_v, poles).unwrap()
    }

    #[test]
    fn projects_point_above_patch_straight_down() {
        let surf = bilinear_patch();
        let projector = PointOnSurfaceProj::new(surf).unwrap();
        let q = Point3::new(0.5, 0.5, 3.0);
        let result = projector.project_default(q);
        assert!(result.converged);
        assert!((result.u - 0.5).abs() < 1e-6);
        assert!((result.v - 0.5).abs() < 1e-6);
        assert!((result.point.z - 0.0).abs() < 1e-9);
    }

    #[test]
    fn projects_point_near_a_corner() {
        let surf = bilinear_patch();
        let projector = PointOnSurfaceProj::new(surf).unwrap();
        let q = Point3::new(-0.2, -0.2, 1.0);
        let result = projector.project_default(q);
        assert!(result.u >= 0.0 && result.u <= 1.0);
        assert!(result.v >= 0.0 && result.v <= 1.0);
    }
}
