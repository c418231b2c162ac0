//! Polygon tessellation and Xiao–Gimbutas integration, Gauss-Legendre quadrature tables,
//! the trimmed-surface clipper, a packed-Hilbert-sort R-tree, and the face/edge
//! integration-point orchestrators that tie them to [`kurve_topology`] entities.

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

/// the trimmed-surface clipper: classifies a face's knot spans as empty, full, or trimmed
pub mod clipper;
/// the face/edge integration-point orchestrators
pub mod edge_integration;
/// classifies the errors that can occur in this crate
pub mod errors;
/// the face integration-point orchestrator
pub mod face_integration;
/// N-dimensional Hilbert curve indexing, used to sort boxes for the R-tree
pub mod hilbert;
/// Gauss-Legendre and Xiao-Gimbutas quadrature tables
pub mod integration;
/// the 2D polygon type and its ear-clipping tessellator
pub mod polygon;
/// the packed Hilbert-sort R-tree
pub mod rtree;

pub use clipper::{SpanClassification, SurfaceClipper};
pub use edge_integration::edge_integration_points;
pub use errors::Error;
pub use face_integration::face_integration_points;
pub use integration::IntegrationPoint;
pub use polygon::{Polygon, PolygonTessellator};
pub use rtree::RTree;

/// `Result` with this crate's errors.
pub type Result<T> = std::result::Result<T, Error>;
