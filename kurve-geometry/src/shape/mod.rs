//! Shape-function evaluators: the B-spline basis (and its rational quotient) for curves
//! and tensor-product surfaces.

/// B-spline basis and derivatives for a single parameter axis.
pub mod curve;
/// Tensor-product basis and derivatives over two parameter axes.
pub mod surface;

pub use curve::CurveShape;
pub use surface::SurfaceShape;
