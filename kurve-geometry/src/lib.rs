//! NURBS curve and surface geometry: shape functions, evaluation, tessellation,
//! projection, span intersection and knot refinement, all built on the `n + p - 1`
//! knot vector convention.

#![cfg_attr(not(debug_assertions), deny(warnings))]
#![deny(clippy::all, rust_2018_idioms)]
#![warn(
    missing_docs,
    missing_debug_implementations,
    trivial_casts,
    trivial_numeric_casts,
    unsafe_code,
    unstable_features,
    unused_import_braces,
    unused_qualifications
)]

/// affine-space abstraction NURBS geometry is generic over.
pub mod control_point;
/// classifies the errors that can occur in this crate.
pub mod errors;
/// knot-insertion (Boehm refinement) for curves and surfaces.
pub mod knot_refinement;
/// the `n + p - 1` knot vector.
pub mod knot_vec;
/// a rational curve, generic over the control point's affine space.
pub mod nurbs_curve;
/// a rational tensor-product surface, generic over the control point's affine space.
pub mod nurbs_surface;
/// nearest point on a curve to a query point, by Newton iteration.
pub mod point_on_curve;
/// nearest point on a surface to a query point, by grid search and Newton iteration.
pub mod point_on_surface;
/// B-spline and tensor-product shape-function evaluators.
pub mod shape;
/// intersection of a curve's parameter domain with its own knot lines.
pub mod span_intersection;
/// adaptive polyline approximation of a curve to a chord-height tolerance.
pub mod tessellation;

pub use errors::Error;
pub use knot_vec::KnotVec;
pub use nurbs_curve::NurbsCurve;
pub use nurbs_surface::NurbsSurface;

/// `Result` with this crate's errors.
pub type Result<T> = std::result::Result<T, Error>;
