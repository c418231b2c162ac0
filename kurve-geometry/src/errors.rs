use thiserror::Error;

/// `Result` with this crate's errors.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors produced while constructing or evaluating NURBS geometry.
#[derive(Debug, PartialEq, Error)]
pub enum Error {
    /// A knot vector is not sorted.
    /// # Examples
    /// ```
    /// use kurve_geometry::{knot_vec::KnotVec, errors::Error};
    /// assert_eq!(KnotVec::try_new(vec![1.0, 0.0]), Err(Error::NotSortedVector));
    /// ```
    #[error("this knot vector is not sorted")]
    NotSortedVector,
    /// The knot vector's length does not match `nb_poles + degree - 1`.
    /// # Examples
    /// ```
    /// use kurve_geometry::errors::Error;
    /// let err = Error::InvalidKnotVectorLength { expected: 7, actual: 6 };
    /// assert_eq!(format!("{err}"), "expected a knot vector of length 7, found 6");
    /// ```
    #[error("expected a knot vector of length {expected}, found {actual}")]
    InvalidKnotVectorLength {
        /// the expected length, `nb_poles + degree - 1`
        expected: usize,
        /// the length actually supplied
        actual: usize,
    },
    /// The weight vector's length does not match the pole count, or a weight is not positive.
    #[error("expected {expected} positive weights, found {actual} (or a non-positive weight)")]
    InvalidWeights {
        /// the expected weight count, equal to the pole count
        expected: usize,
        /// the weight count actually supplied
        actual: usize,
    },
    /// The control point array has no entries.
    #[error("the control point array must not be empty")]
    EmptyControlPoints,
    /// A surface's pole matrix has rows of unequal length.
    #[error("the surface's control point rows are not all the same length")]
    IrregularControlPoints,
    /// The requested degree is larger than the geometry supports.
    #[error("degree {0} is too large for a knot vector of length {1}")]
    TooLargeDegree(usize, usize),
    /// A parameter or derivative order given to an evaluator is out of range.
    /// # Examples
    /// ```
    /// use kurve_geometry::errors::Error;
    /// let err = Error::InvalidParameter { t: 5.0, t0: 0.0, t1: 1.0 };
    /// assert_eq!(format!("{err}"), "parameter 5 is outside the domain [0, 1]");
    /// ```
    #[error("parameter {t} is outside the domain [{t0}, {t1}]")]
    InvalidParameter {
        /// the offending parameter
        t: f64,
        /// the domain's lower bound
        t0: f64,
        /// the domain's upper bound
        t1: f64,
    },
    /// A requested derivative order was negative (only representable in a caller that
    /// allows signed orders; retained for parity with the persistent-store boundary).
    #[error("derivative order must be non-negative, got {0}")]
    NegativeDerivativeOrder(i64),
}

#[test]
#[rustfmt::skip]
fn print_messages() {
    use std::io::Write;
    let stderr = &mut std::io::stderr();
    writeln!(stderr, "{}", Error::NotSortedVector).unwrap();
    writeln!(stderr, "{}", Error::InvalidKnotVectorLength { expected: 7, actual: 6 }).unwrap();
    writeln!(stderr, "{}", Error::InvalidWeights { expected: 5, actual: 4 }).unwrap();
    writeln!(stderr, "{}", Error::EmptyControlPoints).unwrap();
    writeln!(stderr, "{}", Error::IrregularControlPoints).unwrap();
    writeln!(stderr, "{}", Error::TooLargeDegree(5, 4)).unwrap();
    writeln!(stderr, "{}", Error::InvalidParameter { t: 5.0, t0: 0.0, t1: 1.0 }).unwrap();
    writeln!(stderr, "{}", Error::NegativeDerivativeOrder(-1)).unwrap();
}
