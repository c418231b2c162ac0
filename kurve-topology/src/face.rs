//! A face: a surface plus the ordered loops of trims that bound it.

use crate::curve::Curve;
use crate::edge::Edge;
use crate::errors::{Error, Result};
use crate::loop_::Loop;
use crate::trim::Trim;
use kurve_base::cgmath64::Vector2;
use kurve_base::{Id, Interval};
use kurve_geometry::control_point::ControlPoint;
use kurve_geometry::NurbsCurve;
use kurve_geometry::NurbsSurface;
use std::fmt;
use std::sync::Arc;

/// The pieces needed to build one [`Trim`] as part of [`Face::try_new`]: its 2D curve, an
/// optional restricted domain (defaulting to the curve's own domain, per Design Note §9's
/// resolution of the serialized format's optional `domain` field), and an optional edge
/// shared with a trim on an adjacent face.
pub struct TrimSpec<V> {
    /// the trim's 2D curve, in the face's surface parameter space
    pub curve2d: NurbsCurve<Vector2>,
    /// restricted parameter domain; `None` defaults to the curve's own full domain
    pub domain: Option<Interval>,
    /// the edge this trim lies on, if shared with another face
    pub edge: Option<Edge<V>>,
}

/// Shared state of a [`Face`]. Held behind `Arc` so surface geometry can be shared between
/// multiple faces while each face's loops hold only a weak back-reference to it.
pub struct FaceInner<V> {
    surface: Arc<NurbsSurface<V>>,
    loops: Vec<Loop<V>>,
}

/// A BREP face: one surface and the ordered loops of trims bounding it (the first loop is
/// conventionally the outer boundary; later loops are holes, per the orientation convention
/// of [`crate::Polygon`]-style boundary representations elsewhere in this kernel).
#[derive(Clone)]
pub struct Face<V> {
    inner: Arc<FaceInner<V>>,
}

impl<V: ControlPoint> Face<V> {
    /// Builds a face from a shared `surface` and the per-loop [`TrimSpec`]s describing its
    /// boundary. Fails if `loop_specs` or any of its loops is empty.
    pub fn try_new(surface: Arc<NurbsSurface<V>>, loop_specs: Vec<Vec<TrimSpec<V>>>) -> Result<Self> {
        if loop_specs.is_empty() {
            return Err(Error::EmptyFace);
        }
        let mut loops = Vec::with_capacity(loop_specs.len());
        for trim_specs in loop_specs {
            if trim_specs.is_empty() {
                return Err(Error::EmptyLoop);
            }
            let mut trims = Vec::with_capacity(trim_specs.len());
            for spec in trim_specs {
                let geometry = Arc::new(spec.curve2d);
                let curve = match spec.domain {
                    Some(domain) => Curve::new(geometry, domain)?,
                    None => Curve::full(geometry),
                };
                trims.push(Trim::new(curve, spec.edge));
            }
            loops.push(Loop::try_new(trims)?);
        }

        let inner = Arc::new(FaceInner { surface, loops });
        for loop_ in &inner.loops {
            loop_.set_face(Arc::downgrade(&inner));
        }
        Ok(Face { inner })
    }

    pub(crate) fn from_inner(inner: Arc<FaceInner<V>>) -> Self { Face { inner } }

    /// A pointer-identity id, stable for the lifetime of this face's allocation.
    pub fn id(&self) -> Id<FaceInner<V>> { Id::new(Arc::as_ptr(&self.inner)) }

    /// the face's surface geometry
    pub fn surface(&self) -> &Arc<NurbsSurface<V>> { &self.inner.surface }

    /// the face's loops, outer boundary first by convention
    pub fn loops(&self) -> &[Loop<V>] { &self.inner.loops }
}

impl<V> PartialEq for Face<V> {
    fn eq(&self, other: &Self) -> bool { self.id() == other.id() }
}

impl<V> Eq for Face<V> {}

impl<V> fmt::Debug for Face<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Face").field("id", &self.id()).field("nb_loops", &self.inner.loops.len()).finish()
    }
}
