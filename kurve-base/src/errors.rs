use thiserror::Error;

/// Errors produced by the shared numeric infrastructure (intervals, Newton solves).
#[derive(Debug, PartialEq, Error)]
pub enum Error {
    /// An interval is too short (`length < 1e-7`) to be used where a non-degenerate
    /// range is required.
    /// # Examples
    /// ```
    /// use kurve_base::{errors::Error, interval::Interval};
    /// let degenerate = Interval::new(1.0, 1.0);
    /// assert!(degenerate.is_degenerate());
    /// ```
    #[error("this interval is degenerate: [{0}, {1}]")]
    DegenerateInterval(f64, f64),
    /// A parameter lies outside the domain an operation was asked to evaluate at.
    /// # Examples
    /// ```
    /// use kurve_base::errors::Error;
    /// let err = Error::OutOfDomain(2.0, 0.0, 1.0);
    /// assert_eq!(format!("{err}"), "parameter 2 is outside the domain [0, 1]");
    /// ```
    #[error("parameter {0} is outside the domain [{1}, {2}]")]
    OutOfDomain(f64, f64, f64),
}

#[test]
#[rustfmt::skip]
fn print_messages() {
    use std::io::Write;
    let stderr = &mut std::io::stderr();
    writeln!(stderr, "{}", Error::DegenerateInterval(1.0, 1.0)).unwrap();
    writeln!(stderr, "{}", Error::OutOfDomain(2.0, 0.0, 1.0)).unwrap();
}
