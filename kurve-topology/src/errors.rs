use thiserror::Error;

/// `Result` with this crate's errors.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors produced while building or evaluating the BREP topology graph.
#[derive(Debug, Error)]
pub enum Error {
    /// An error from the underlying NURBS geometry (out-of-domain evaluation, malformed
    /// construction, …), wrapped rather than flattened into this crate's own error type.
    /// # Examples
    /// ```
    /// use kurve_topology::errors::Error;
    /// let inner = kurve_geometry::errors::Error::EmptyControlPoints;
    /// let err: Error = inner.into();
    /// assert!(matches!(err, Error::Geometry(_)));
    /// ```
    #[error(transparent)]
    Geometry(#[from] kurve_geometry::errors::Error),
    /// A trim or curve-on-surface domain is not a subset of its underlying geometry's domain.
    /// # Examples
    /// ```
    /// use kurve_topology::errors::Error;
    /// let err = Error::DomainNotContained { t0: -1.0, t1: 2.0, g0: 0.0, g1: 1.0 };
    /// assert_eq!(format!("{err}"), "domain [-1, 2] is not contained in geometry domain [0, 1]");
    /// ```
    #[error("domain [{t0}, {t1}] is not contained in geometry domain [{g0}, {g1}]")]
    DomainNotContained {
        /// the requested domain's lower bound
        t0: f64,
        /// the requested domain's upper bound
        t1: f64,
        /// the geometry's domain lower bound
        g0: f64,
        /// the geometry's domain upper bound
        g1: f64,
    },
    /// A loop was constructed with no trims.
    #[error("a loop must contain at least one trim")]
    EmptyLoop,
    /// A face was constructed with no loops.
    #[error("a face must contain at least one loop")]
    EmptyFace,
}

#[test]
#[rustfmt::skip]
fn print_messages() {
    use std::io::Write;
    let stderr = &mut std::io::stderr();
    writeln!(stderr, "{}", Error::Geometry(kurve_geometry::errors::Error::EmptyControlPoints)).unwrap();
    writeln!(stderr, "{}", Error::DomainNotContained { t0: -1.0, t1: 2.0, g0: 0.0, g1: 1.0 }).unwrap();
    writeln!(stderr, "{}", Error::EmptyLoop).unwrap();
    writeln!(stderr, "{}", Error::EmptyFace).unwrap();
}
