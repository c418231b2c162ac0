//! A loop: an ordered sequence of [`Trim`]s bounding one boundary of a [`Face`](crate::face::Face).

use crate::errors::{Error, Result};
use crate::face::FaceInner;
use crate::trim::Trim;
use kurve_base::Id;
use std::fmt;
use std::sync::{Arc, Mutex, Weak};

/// Shared state of a [`Loop`]. Held behind `Arc` so its owning [`Face`](crate::face::Face)
/// can hold a strong reference while the loop holds only a weak back-reference to the face.
pub struct LoopInner<V> {
    face: Mutex<Weak<FaceInner<V>>>,
    trims: Vec<Trim<V>>,
}

/// An ordered, non-empty sequence of trims, owned by exactly one
/// [`Face`](crate::face::Face).
#[derive(Clone)]
pub struct Loop<V> {
    inner: Arc<LoopInner<V>>,
}

impl<V> Loop<V> {
    /// Creates a loop from its (already-built) trims, failing if the list is empty.
    /// The owning face's back-reference is filled in afterwards by
    /// [`crate::face::Face::try_new`](crate::face::Face::try_new).
    pub(crate) fn try_new(trims: Vec<Trim<V>>) -> Result<Self> {
        if trims.is_empty() {
            return Err(Error::EmptyLoop);
        }
        let inner = Arc::new(LoopInner { face: Mutex::new(Weak::new()), trims });
        for trim in &inner.trims {
            trim.set_loop(Arc::downgrade(&inner));
        }
        Ok(Loop { inner })
    }

    pub(crate) fn from_inner(inner: Arc<LoopInner<V>>) -> Self { Loop { inner } }

    pub(crate) fn set_face(&self, face: Weak<FaceInner<V>>) { *self.inner.face.lock().unwrap() = face; }

    pub(crate) fn inner(&self) -> &Arc<LoopInner<V>> { &self.inner }

    /// A pointer-identity id, stable for the lifetime of this loop's allocation.
    pub fn id(&self) -> Id<LoopInner<V>> { Id::new(Arc::as_ptr(&self.inner)) }

    /// The face that owns this loop, or `None` if it has been dropped.
    pub fn face(&self) -> Option<crate::face::Face<V>> {
        self.inner.face.lock().unwrap().upgrade().map(crate::face::Face::from_inner)
    }

    /// The loop's trims, in order.
    pub fn trims(&self) -> &[Trim<V>] { &self.inner.trims }
}

impl<V> PartialEq for Loop<V> {
    fn eq(&self, other: &Self) -> bool { self.id() == other.id() }
}

impl<V> Eq for Loop<V> {}

impl<V> fmt::Debug for Loop<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Loop").field("id", &self.id()).field("nb_trims", &self.inner.trims.len()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::curve::Curve;
    use kurve_base::cgmath64::Vector2;
    use kurve_geometry::knot_vec::KnotVec;
    use kurve_geometry::NurbsCurve;

    fn sample_trim() -> Trim<()> {
        let knots = KnotVec::new_unchecked(vec![0.0, 1.0]);
        let poles = vec![Vector2::new(0.0, 0.0), Vector2::new(1.0, 0.0)];
        let curve = Curve::full(Arc::new(NurbsCurve::try_new(1, knots, poles).unwrap()));
        Trim::new(curve, None)
    }

    #[test]
    fn empty_loop_is_rejected() {
        let trims: Vec<Trim<()>> = Vec::new();
        assert!(matches!(Loop::try_new(trims), Err(Error::EmptyLoop)));
    }

    #[test]
    fn loop_has_no_face_until_attached() {
        let lp = Loop::try_new(vec![sample_trim()]).unwrap();
        assert!(lp.face().is_none());
        assert_eq!(lp.trims().len(), 1);
    }
}
