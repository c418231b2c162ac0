//! The BREP topology graph (`Face`/`Loop`/`Trim`/`Edge`) and the composition of a
//! parameter-space curve through a surface (`CurveOnSurface`).
//!
//! Forward references (`Face` → `Loop` → `Trim`) are owning (`Arc`); back-references
//! (`Loop` → `Face`, `Trim` → `Loop`) are weak, breaking the reference cycle described in
//! Design Note §9. `Edge` → `Trim` references are also weak, filled in incrementally as
//! trims referencing that edge are constructed.

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

/// a bounded restriction of a [`kurve_geometry::NurbsCurve`] to a sub-interval of its domain
pub mod curve;
/// the composition of a 2D parameter-space curve through a surface
pub mod curve_on_surface;
/// the topological edge shared by the trims of adjacent faces
pub mod edge;
/// classifies the errors that can occur in this crate
pub mod errors;
/// the topological face: a surface plus its bounding loops
pub mod face;
/// the topological loop: an ordered, non-empty sequence of trims
pub mod loop_;
/// the topological trim: a 2D curve bounding one side of a loop
pub mod trim;

pub use curve::Curve;
pub use curve_on_surface::CurveOnSurface;
pub use edge::Edge;
pub use errors::Error;
pub use face::{Face, TrimSpec};
pub use loop_::Loop;
pub use trim::Trim;

/// `Result` with this crate's errors.
pub type Result<T> = std::result::Result<T, Error>;
