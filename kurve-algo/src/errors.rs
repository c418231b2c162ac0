use thiserror::Error;

/// `Result` with this crate's errors.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors produced by polygon tessellation, integration, the trimmed-surface clipper and
/// the R-tree.
#[derive(Debug, Error)]
pub enum Error {
    /// A topology error surfaced while walking a face's loops or an edge's trims.
    #[error(transparent)]
    Topology(#[from] kurve_topology::Error),
    /// A geometry error surfaced while evaluating a curve or surface.
    #[error(transparent)]
    Geometry(#[from] kurve_geometry::errors::Error),
    /// A polygon vertex index was out of range.
    /// # Examples
    /// ```
    /// use kurve_algo::errors::Error;
    /// let err = Error::OutOfRange { index: 5, len: 3 };
    /// assert_eq!(format!("{err}"), "index 5 is out of range for 3 vertices");
    /// ```
    #[error("index {index} is out of range for {len} vertices")]
    OutOfRange {
        /// the offending index
        index: usize,
        /// the number of vertices actually available
        len: usize,
    },
    /// No quadrature rule is tabulated for the requested degree.
    #[error("no quadrature rule is tabulated for degree {0}")]
    UnsupportedDegree(usize),
    /// A polygon's outer path has fewer than 3 vertices, or ear-clipping could not
    /// triangulate it (self-intersecting or degenerate input).
    #[error("polygon with {0} outer vertices cannot be triangulated")]
    DegeneratePolygon(usize),
    /// An R-tree query or `add` was attempted before `finish()`, or after the declared
    /// item count was exceeded.
    #[error("the R-tree has not been finished; call finish() before querying")]
    NotIndexed,
    /// `add` was called more times than the item count declared at construction.
    #[error("the R-tree was declared with capacity {expected}, got item {actual}")]
    Capacity {
        /// the declared capacity
        expected: usize,
        /// the index of the item that overflowed it
        actual: usize,
    },
    /// An edge did not have exactly two trims, so its integration points are undefined.
    #[error("edge integration requires exactly two trims, found {0}")]
    NotManifoldEdge(usize),
    /// A trim's owning loop or face has been dropped, so its surface cannot be recovered.
    #[error("trim has no owning face")]
    DetachedTrim,
}

#[test]
#[rustfmt::skip]
fn print_messages() {
    use std::io::Write;
    let stderr = &mut std::io::stderr();
    writeln!(stderr, "{}", Error::OutOfRange { index: 5, len: 3 }).unwrap();
    writeln!(stderr, "{}", Error::UnsupportedDegree(9)).unwrap();
    writeln!(stderr, "{}", Error::DegeneratePolygon(2)).unwrap();
    writeln!(stderr, "{}", Error::NotIndexed).unwrap();
    writeln!(stderr, "{}", Error::Capacity { expected: 4, actual: 5 }).unwrap();
    writeln!(stderr, "{}", Error::NotManifoldEdge(1)).unwrap();
    writeln!(stderr, "{}", Error::DetachedTrim).unwrap();
}
