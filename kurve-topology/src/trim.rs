//! A trim: one 2D curve, in a surface's parameter space, bounding one side of a
//! [`Loop`](crate::loop_::Loop).

use crate::curve::Curve;
use crate::edge::Edge;
use crate::loop_::LoopInner;
use kurve_base::cgmath64::Vector2;
use kurve_base::{Id, Interval};
use std::fmt;
use std::sync::{Arc, Mutex, Weak};

/// Shared state of a [`Trim`]. Held behind `Arc` so an [`Edge`] can register a [`Weak`]
/// reference to it without participating in the trim's ownership.
pub struct TrimInner<V> {
    loop_: Mutex<Weak<LoopInner<V>>>,
    edge: Option<Edge<V>>,
    curve: Curve<Vector2>,
}

/// A 2D curve in a surface's parameter space, owned by exactly one
/// [`Loop`](crate::loop_::Loop), optionally shared with one other trim (on an adjacent
/// face) through a common [`Edge`].
#[derive(Clone)]
pub struct Trim<V> {
    inner: Arc<TrimInner<V>>,
}

impl<V> Trim<V> {
    /// Creates a trim from its parameter-space `curve` and optional `edge`. The owning
    /// loop's back-reference is filled in afterwards by
    /// [`crate::loop_::Loop::try_new`](crate::loop_::Loop::try_new).
    pub(crate) fn new(curve: Curve<Vector2>, edge: Option<Edge<V>>) -> Self {
        let inner = Arc::new(TrimInner { loop_: Mutex::new(Weak::new()), edge, curve });
        if let Some(edge) = &inner.edge {
            edge.register_trim(Arc::downgrade(&inner));
        }
        Trim { inner }
    }

    pub(crate) fn set_loop(&self, loop_: Weak<LoopInner<V>>) { *self.inner.loop_.lock().unwrap() = loop_; }

    pub(crate) fn inner(&self) -> &Arc<TrimInner<V>> { &self.inner }

    /// Wraps an `Arc<TrimInner<V>>` obtained from [`Edge::trims`](crate::edge::Edge::trims)
    /// back into a [`Trim`] handle, so callers walking an edge's trims can reach
    /// [`Trim::curve2d`]/[`Trim::loop_`] the same way as a trim reached through its face.
    pub fn from_inner(inner: Arc<TrimInner<V>>) -> Self { Trim { inner } }

    /// A pointer-identity id, stable for the lifetime of this trim's allocation.
    pub fn id(&self) -> Id<TrimInner<V>> { Id::new(Arc::as_ptr(&self.inner)) }

    /// The loop that owns this trim, or `None` if it has been dropped.
    pub fn loop_(&self) -> Option<crate::loop_::Loop<V>> {
        self.inner.loop_.lock().unwrap().upgrade().map(crate::loop_::Loop::from_inner)
    }

    /// The edge this trim lies on, if it is shared with an adjacent face.
    pub fn edge(&self) -> Option<&Edge<V>> { self.inner.edge.as_ref() }

    /// The 2D parameter-space curve, restricted to [`Trim::domain`].
    pub fn curve2d(&self) -> &Curve<Vector2> { &self.inner.curve }

    /// The trim's parameter-domain interval. Per Design Note §9 this defaults to the
    /// curve's own restricted domain when not given explicitly at construction.
    pub fn domain(&self) -> Interval { self.inner.curve.domain() }
}

impl<V> PartialEq for Trim<V> {
    fn eq(&self, other: &Self) -> bool { self.id() == other.id() }
}

impl<V> Eq for Trim<V> {}

impl<V> fmt::Debug for Trim<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Trim").field("id", &self.id()).finish()
    }
}
