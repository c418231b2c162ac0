//! Basic structs and traits shared by the kurve crates: f64-specialized
//! `cgmath` re-exports, tolerance predicates, the generic Newton-method
//! solver, pointer-identity ids, and the `Interval` parameter range.

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

/// a fixed-dimension axis-aligned bounding box, shared between the `Box<D>` store type
/// and the R-tree in `kurve-algo`.
pub mod bounding_box;
/// Redefines cgmath vectors, matrices and points with scalar = f64.
pub mod cgmath64;
/// classifies the errors that can occur in this crate.
pub mod errors;
/// pointer-identity id for sharing topological entities.
pub mod id;
/// the 1D closed parameter interval.
pub mod interval;
/// Implementation of Newton's method, generic over the jacobian type.
pub mod newton;
/// Setting Tolerance.
pub mod tolerance;

pub use bounding_box::BoundingBox;
pub use cgmath64::*;
pub use errors::Error;
pub use id::Id;
pub use interval::Interval;
pub use tolerance::*;

/// `Result` with this crate's errors.
pub type Result<T> = std::result::Result<T, Error>;
