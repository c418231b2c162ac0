//! A packed Hilbert-sort R-tree: an offline, static spatial index built once (`add` then
//! `finish`) and queried many times, ported from the "Flatbush" packing scheme (bottom-up
//! node grouping by Hilbert order, fixed fan-out).

use crate::errors::{Error, Result};
use crate::hilbert;
use kurve_base::BoundingBox;

/// The default node fan-out, per spec §4.15.
pub const DEFAULT_NODE_SIZE: usize = 16;

/// A packed Hilbert-sort R-tree over `D`-dimensional axis-aligned boxes.
///
/// Construction is in two phases: [`RTree::add`] exactly `nb_items` times, in any order,
/// then [`RTree::finish`] once. Queries ([`RTree::search`], [`RTree::search_ray`]) are only
/// valid after `finish`.
#[derive(Clone, Debug)]
pub struct RTree<const D: usize> {
    nb_items: usize,
    node_size: usize,
    level_bounds: Vec<usize>,
    bounds: BoundingBox<D>,
    position: usize,
    indices: Vec<usize>,
    boxes: Vec<BoundingBox<D>>,
    finished: bool,
}

impl<const D: usize> RTree<D> {
    /// Creates an empty tree declared to hold exactly `nb_items` boxes, packed `node_size`
    /// children per node (clamped to at least 2; `0` falls back to [`DEFAULT_NODE_SIZE`]).
    pub fn new(nb_items: usize, node_size: usize) -> Self {
        let node_size = node_size.max(2);
        let mut n = nb_items;
        let mut nb_nodes = n;
        let mut level_bounds = vec![n];
        loop {
            n = n.div_ceil(node_size);
            nb_nodes += n;
            level_bounds.push(nb_nodes);
            if n <= 1 {
                break;
            }
        }
        RTree {
            nb_items,
            node_size,
            level_bounds,
            bounds: BoundingBox::new(),
            position: 0,
            indices: vec![0; nb_nodes],
            boxes: vec![BoundingBox::new(); nb_nodes],
            finished: false,
        }
    }

    /// Creates a tree with the default fan-out of [`DEFAULT_NODE_SIZE`].
    pub fn with_default_node_size(nb_items: usize) -> Self { Self::new(nb_items, DEFAULT_NODE_SIZE) }

    /// the declared item count
    pub fn nb_items(&self) -> usize { self.nb_items }
    /// the node fan-out
    pub fn node_size(&self) -> usize { self.node_size }
    /// whether [`RTree::finish`] has been called
    pub fn is_finished(&self) -> bool { self.finished }

    /// Adds one box to the tree, in any order; `finish` sorts them by Hilbert index.
    pub fn add(&mut self, item: BoundingBox<D>) -> Result<usize> {
        if self.position >= self.nb_items {
            return Err(Error::Capacity { expected: self.nb_items, actual: self.position });
        }
        let index = self.position;
        self.position += 1;
        self.indices[index] = index;
        self.bounds = self.bounds.union(&item);
        self.boxes[index] = item;
        Ok(index)
    }

    /// Finalizes the index: Hilbert-sorts the leaves by box center, then packs nodes
    /// bottom-up, each storing the AABB union of its children. Must be called exactly once,
    /// after every declared item has been added.
    pub fn finish(&mut self) -> Result<()> {
        if self.position != self.nb_items {
            return Err(Error::Capacity { expected: self.nb_items, actual: self.position });
        }
        if self.nb_items == 0 {
            self.finished = true;
            return Ok(());
        }

        let min = self.bounds.min();
        let max = self.bounds.max();
        let bits = hilbert::bits_per_axis(D);

        let mut order: Vec<usize> = (0..self.nb_items).collect();
        let keys: Vec<u64> = self
            .boxes
            .iter()
            .map(|b| hilbert::hilbert_index(&b.center(), &min, &max, bits))
            .collect();
        order.sort_by_key(|&i| keys[i]);

        let sorted_boxes: Vec<BoundingBox<D>> = order.iter().map(|&i| self.boxes[i].clone()).collect();
        self.boxes[..self.nb_items].clone_from_slice(&sorted_boxes);
        self.indices[..self.nb_items].copy_from_slice(&order);

        let mut pos = 0usize;
        for level in 0..self.level_bounds.len() - 1 {
            let end = self.level_bounds[level];
            while pos < end {
                let node_index = pos;
                let mut node_box = BoundingBox::<D>::new();
                let mut taken = 0;
                while taken < self.node_size && pos < end {
                    node_box = node_box.union(&self.boxes[pos]);
                    pos += 1;
                    taken += 1;
                }
                self.indices[self.position] = node_index;
                self.boxes[self.position] = node_box;
                self.position += 1;
            }
        }
        self.finished = true;
        Ok(())
    }

    /// Returns every leaf item index whose box intersects `query` (or, if `contained` is
    /// true, whose box lies entirely inside `query`), in the index's internal node-visit
    /// order (not sorted by item index).
    pub fn search(&self, query: &BoundingBox<D>, contained: bool) -> Result<Vec<usize>> {
        self.search_with(|node| {
            if contained { query.contains_box(node) } else { query.intersects(node) }
        })
    }

    /// As [`RTree::search`], but a candidate is reported only if `accept(item_index)` also
    /// returns true; rejected candidates still prune their subtree normally.
    pub fn search_filtered(
        &self,
        query: &BoundingBox<D>,
        contained: bool,
        accept: impl Fn(usize) -> bool,
    ) -> Result<Vec<usize>> {
        self.search_with_filtered(
            |node| if contained { query.contains_box(node) } else { query.intersects(node) },
            accept,
        )
    }

    /// Returns every leaf item index whose box is crossed by the ray from `origin` along
    /// `direction`, via Woo's slab algorithm.
    pub fn search_ray(&self, origin: &[f64; D], direction: &[f64; D]) -> Result<Vec<usize>> {
        self.search_with(|node| ray_intersects_box(origin, direction, node))
    }

    fn search_with(&self, check: impl Fn(&BoundingBox<D>) -> bool) -> Result<Vec<usize>> {
        self.search_with_filtered(check, |_| true)
    }

    fn search_with_filtered(
        &self,
        check: impl Fn(&BoundingBox<D>) -> bool,
        accept: impl Fn(usize) -> bool,
    ) -> Result<Vec<usize>> {
        if !self.finished {
            return Err(Error::NotIndexed);
        }
        if self.nb_items == 0 {
            return Ok(Vec::new());
        }

        let mut node_index = self.indices.len() - 1;
        let mut level = self.level_bounds.len() - 1;
        let mut queue: Vec<(usize, usize)> = Vec::new();
        let mut results = Vec::new();

        loop {
            let end = (node_index + self.node_size).min(self.level_bounds[level]);
            for pos in node_index..end {
                if !check(&self.boxes[pos]) {
                    continue;
                }
                let index = self.indices[pos];
                if node_index < self.nb_items {
                    if accept(index) {
                        results.push(index);
                    }
                } else {
                    queue.push((index, level - 1));
                }
            }
            match queue.pop() {
                Some((idx, lvl)) => {
                    node_index = idx;
                    level = lvl;
                }
                None => break,
            }
        }
        Ok(results)
    }
}

/// Woo's "Fast Ray-Box Intersection" (Graphics Gems I), generalized to `D` dimensions: find
/// the candidate exit plane per axis, pick the farthest, then verify the ray actually
/// crosses the box there.
fn ray_intersects_box<const D: usize>(origin: &[f64; D], direction: &[f64; D], node: &BoundingBox<D>) -> bool {
    let node_min = node.min();
    let node_max = node.max();

    let mut inside = true;
    let mut quadrant = [0i8; D];
    let mut candidate_plane = [0.0; D];
    for i in 0..D {
        if origin[i] < node_min[i] {
            quadrant[i] = -1;
            candidate_plane[i] = node_min[i];
            inside = false;
        } else if origin[i] > node_max[i] {
            quadrant[i] = 1;
            candidate_plane[i] = node_max[i];
            inside = false;
        }
    }
    if inside {
        return true;
    }

    let mut max_t = [-1.0; D];
    for i in 0..D {
        if quadrant[i] != 0 && direction[i] != 0.0 {
            max_t[i] = (candidate_plane[i] - origin[i]) / direction[i];
        }
    }

    let mut which_plane = 0;
    for i in 1..D {
        if max_t[which_plane] < max_t[i] {
            which_plane = i;
        }
    }
    if max_t[which_plane] < 0.0 {
        return false;
    }

    for i in 0..D {
        if i != which_plane {
            let coordinate = origin[i] + max_t[which_plane] * direction[i];
            if coordinate < node_min[i] || coordinate > node_max[i] {
                return false;
            }
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn box2(x0: f64, y0: f64, x1: f64, y1: f64) -> BoundingBox<2> { BoundingBox::from_corners([x0, y0], [x1, y1]) }

    #[test]
    fn querying_before_finish_errors() {
        let mut tree: RTree<2> = RTree::new(1, 16);
        tree.add(box2(0.0, 0.0, 1.0, 1.0)).unwrap();
        assert!(matches!(tree.search(&box2(0.0, 0.0, 1.0, 1.0), false), Err(Error::NotIndexed)));
    }

    #[test]
    fn adding_more_than_declared_errors() {
        let mut tree: RTree<2> = RTree::new(1, 16);
        tree.add(box2(0.0, 0.0, 1.0, 1.0)).unwrap();
        assert!(matches!(tree.add(box2(0.0, 0.0, 1.0, 1.0)), Err(Error::Capacity { expected: 1, actual: 1 })));
    }

    #[test]
    fn finishing_with_too_few_items_errors() {
        let mut tree: RTree<2> = RTree::new(2, 16);
        tree.add(box2(0.0, 0.0, 1.0, 1.0)).unwrap();
        assert!(matches!(tree.finish(), Err(Error::Capacity { expected: 2, actual: 1 })));
    }

    #[test]
    fn finds_overlapping_boxes() {
        let boxes = vec![box2(0.0, 0.0, 1.0, 1.0), box2(5.0, 5.0, 6.0, 6.0), box2(0.5, 0.5, 2.0, 2.0)];
        let mut tree: RTree<2> = RTree::new(boxes.len(), 16);
        for b in &boxes {
            tree.add(b.clone()).unwrap();
        }
        tree.finish().unwrap();
        let mut found = tree.search(&box2(0.0, 0.0, 1.5, 1.5), false).unwrap();
        found.sort();
        assert_eq!(found, vec![0, 2]);
    }

    #[test]
    fn containment_mode_excludes_partial_overlap() {
        let boxes = vec![box2(0.0, 0.0, 1.0, 1.0), box2(-1.0, -1.0, 10.0, 10.0)];
        let mut tree: RTree<2> = RTree::new(boxes.len(), 16);
        for b in &boxes {
            tree.add(b.clone()).unwrap();
        }
        tree.finish().unwrap();
        let found = tree.search(&box2(-2.0, -2.0, 2.0, 2.0), true).unwrap();
        assert_eq!(found, vec![0]);
    }

    #[test]
    fn ray_hits_an_intersected_box_and_misses_others() {
        let boxes = vec![box2(5.0, -1.0, 6.0, 1.0), box2(-6.0, -1.0, -5.0, 1.0)];
        let mut tree: RTree<2> = RTree::new(boxes.len(), 16);
        for b in &boxes {
            tree.add(b.clone()).unwrap();
        }
        tree.finish().unwrap();
        let found = tree.search_ray(&[0.0, 0.0], &[1.0, 0.0]).unwrap();
        assert_eq!(found, vec![0]);
    }

    #[test]
    fn completeness_over_many_random_boxes() {
        let mut rng = StdRng::seed_from_u64(42);
        let nb_items = 10_000;
        let mut boxes = Vec::with_capacity(nb_items);
        for _ in 0..nb_items {
            let x0 = rng.random_range(0.0..1000.0);
            let y0 = rng.random_range(0.0..1000.0);
            let x1 = x0 + rng.random_range(0.0..5.0);
            let y1 = y0 + rng.random_range(0.0..5.0);
            boxes.push(box2(x0, y0, x1, y1));
        }

        let mut tree: RTree<2> = RTree::with_default_node_size(nb_items);
        for b in &boxes {
            tree.add(b.clone()).unwrap();
        }
        tree.finish().unwrap();

        for _ in 0..1_000 {
            let x0 = rng.random_range(0.0..1000.0);
            let y0 = rng.random_range(0.0..1000.0);
            let query = box2(x0, y0, x0 + rng.random_range(1.0..20.0), y0 + rng.random_range(1.0..20.0));

            let mut expected: Vec<usize> =
                (0..nb_items).filter(|&i| boxes[i].intersects(&query)).collect();
            let mut found = tree.search(&query, false).unwrap();
            expected.sort();
            found.sort();
            assert_eq!(found, expected);
        }
    }
}
