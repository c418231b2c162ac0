//! A topological edge: the set of [`Trim`](crate::trim::Trim)s shared by two or more faces
//! along a common 3D curve.

use crate::trim::TrimInner;
use kurve_base::Id;
use std::fmt;
use std::sync::{Arc, Mutex, Weak};

/// Shared, reference-counted state of an [`Edge`].
pub struct EdgeInner<V> {
    trims: Mutex<Vec<Weak<TrimInner<V>>>>,
}

/// A topological edge, shared by `Arc` between every [`Trim`](crate::trim::Trim) that lies
/// along it.
///
/// Unlike `Face`/`Loop`/`Trim`, an edge's back-references to its trims are filled in
/// incrementally as those trims are constructed, so the list is behind a `Mutex` even though
/// the geometry it describes never changes after construction.
#[derive(Clone)]
pub struct Edge<V> {
    inner: Arc<EdgeInner<V>>,
}

impl<V> Edge<V> {
    /// Creates a new edge with no trims registered yet.
    pub fn new() -> Self {
        Edge { inner: Arc::new(EdgeInner { trims: Mutex::new(Vec::new()) }) }
    }

    /// A pointer-identity id, stable for the lifetime of this edge's allocation.
    pub fn id(&self) -> Id<EdgeInner<V>> { Id::new(Arc::as_ptr(&self.inner)) }

    /// The trims currently registered on this edge, in registration order.
    ///
    /// A trim is dropped from this list once every other strong reference to it (held by its
    /// owning loop) is gone.
    pub fn trims(&self) -> Vec<Arc<TrimInner<V>>> {
        self.inner.trims.lock().unwrap().iter().filter_map(Weak::upgrade).collect()
    }

    /// Registers a trim on this edge. Called once per trim during face construction.
    pub(crate) fn register_trim(&self, trim: Weak<TrimInner<V>>) {
        self.inner.trims.lock().unwrap().push(trim);
    }
}

impl<V> Default for Edge<V> {
    fn default() -> Self { Edge::new() }
}

impl<V> PartialEq for Edge<V> {
    fn eq(&self, other: &Self) -> bool { self.id() == other.id() }
}

impl<V> Eq for Edge<V> {}

impl<V> fmt::Debug for Edge<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Edge").field("id", &self.id()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_edge_has_no_trims() {
        let edge: Edge<()> = Edge::new();
        assert!(edge.trims().is_empty());
    }

    #[test]
    fn clones_share_identity() {
        let edge: Edge<()> = Edge::new();
        let clone = edge.clone();
        assert_eq!(edge.id(), clone.id());
        assert_eq!(edge, clone);
    }

    #[test]
    fn distinct_edges_have_distinct_ids() {
        let a: Edge<()> = Edge::new();
        let b: Edge<()> = Edge::new();
        assert_ne!(a.id(), b.id());
        assert_ne!(a, b);
    }
}
