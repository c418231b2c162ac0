//! Implementation of Newton's method, generic over the jacobian type.

use crate::{cgmath64::*, tolerance::*};
use std::ops::{Add, Mul, Sub};

/// the value and jacobian corresponding to a parameter
#[derive(Clone, Debug)]
pub struct CalcOutput<V, M> {
    /// the value of the function
    pub value: V,
    /// the jacobian of the function
    pub derivation: M,
}

/// jacobian of a function used by [`solve`] and [`gauss_newton`]
pub trait Jacobian<V>:
    Mul<V, Output = V> + Mul<Self, Output = Self> + Add<Self, Output = Self> + Sized
{
    #[doc(hidden)]
    fn invert(self) -> Option<Self>;
    #[doc(hidden)]
    fn transpose(&self) -> Self;
    #[doc(hidden)]
    fn identity(scalar: f64) -> Self;
}

impl Jacobian<f64> for f64 {
    #[inline(always)]
    fn invert(self) -> Option<Self> {
        match self.so_small() {
            true => None,
            false => Some(1.0 / self),
        }
    }
    #[inline(always)]
    fn transpose(&self) -> Self { *self }
    #[inline(always)]
    fn identity(scalar: f64) -> Self { scalar }
}

macro_rules! impl_jacobian {
    ($matrix: ty, $vector: ty) => {
        impl Jacobian<$vector> for $matrix {
            #[inline(always)]
            fn invert(self) -> Option<Self> { SquareMatrix::invert(&self) }
            fn transpose(&self) -> Self { Matrix::transpose(self) }
            fn identity(scalar: f64) -> Self { SquareMatrix::from_value(scalar) }
        }
    };
}

impl_jacobian!(Matrix2, Vector2);
impl_jacobian!(Matrix3, Vector3);
impl_jacobian!(Matrix4, Vector4);

/// Solves `function(x) == 0` by Newton's method, starting from `hint`.
/// # Examples
/// ```
/// use kurve_base::newton::*;
///
/// let function = |x: f64| CalcOutput {
///     value: x * x - 2.0,
///     derivation: 2.0 * x,
/// };
/// let sqrt2 = solve(function, 1.0, 10).unwrap();
/// kurve_base::assert_near2!(sqrt2, f64::sqrt(2.0));
/// ```
pub fn solve<V, M>(
    function: impl Fn(V) -> CalcOutput<V, M>,
    mut hint: V,
    trials: usize,
) -> Result<V, NewtonLog<V>>
where
    V: Sub<Output = V> + Copy + Tolerance,
    M: Jacobian<V>,
{
    let mut log = NewtonLog::new(cfg!(debug_assertions), trials);
    for _ in 0..=trials {
        log.push(hint);
        let CalcOutput { value, derivation } = function(hint);
        let Some(inv) = derivation.invert() else {
            log.set_degenerate(true);
            return Err(log);
        };
        let next = hint - inv * value;
        if next.near2(&hint) {
            return Ok(hint);
        }
        hint = next;
    }
    Err(log)
}

/// Solves a least-squares problem `function(x) ~= 0` by the damped Gauss-Newton method.
pub fn gauss_newton<V, M>(
    function: impl Fn(V) -> CalcOutput<V, M>,
    mut hint: V,
    trials: usize,
) -> Result<V, NewtonLog<V>>
where
    V: Sub<Output = V> + Copy + Tolerance,
    M: Jacobian<V>,
{
    let mut log = NewtonLog::new(cfg!(debug_assertions), trials);
    for _ in 0..=trials {
        log.push(hint);
        let CalcOutput { value, derivation } = function(hint);
        let rhs = derivation.transpose() * value;
        let Some(inv) = (derivation.transpose() * derivation + M::identity(0.001)).invert() else {
            log.set_degenerate(true);
            return Err(log);
        };
        let next = hint - inv * rhs;
        if next.near2(&hint) {
            return Ok(hint);
        }
        hint = next;
    }
    Err(log)
}

mod newtonlog {
    use std::fmt::*;

    /// Stores the iterate history for debugging, only while `cfg!(debug_assertions)`.
    #[derive(Clone, Debug)]
    pub struct NewtonLog<T> {
        log: Option<Vec<T>>,
        degenerate: bool,
    }

    impl<T> NewtonLog<T> {
        #[inline(always)]
        pub fn new(activate: bool, trials: usize) -> Self {
            match activate {
                true => NewtonLog { log: Some(Vec::with_capacity(trials)), degenerate: false },
                false => NewtonLog { log: None, degenerate: false },
            }
        }
        /// Returns `true` iff the Newton method terminated because the jacobian was degenerate.
        #[inline(always)]
        pub fn degenerate(&self) -> bool { self.degenerate }
        #[inline(always)]
        pub(super) fn push(&mut self, log: T) {
            if let Some(vec) = &mut self.log {
                vec.push(log)
            }
        }
        #[inline(always)]
        pub(super) fn set_degenerate(&mut self, degenerate: bool) { self.degenerate = degenerate }
    }

    impl<T: Debug> Display for NewtonLog<T> {
        fn fmt(&self, f: &mut Formatter<'_>) -> Result {
            match self.degenerate {
                true => f.pad("Jacobian is degenerate. ")?,
                false => f.pad("Newton method did not converge. ")?,
            }
            match &self.log {
                None => {
                    f.pad("If you want to see the Newton log, please re-run it with the debug build.")
                }
                Some(vec) => {
                    f.pad("Newton log:\n")?;
                    vec.iter().try_for_each(|log| f.write_fmt(format_args!("{log:?}\n")))
                }
            }
        }
    }
}
pub use newtonlog::NewtonLog;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_newton() {
        let function = |x: f64| CalcOutput { value: x * x - 2.0, derivation: 2.0 * x };
        let sqrt2 = solve(function, 1.0, 5).unwrap();
        assert!((sqrt2 - f64::sqrt(2.0)).abs() < 1e-10);
    }

    #[test]
    fn test_gauss_newton() {
        let function = |x: f64| CalcOutput { value: x * x - 2.0, derivation: 2.0 * x };
        let sqrt2 = gauss_newton(function, 1.0, 5).unwrap();
        assert!((sqrt2 - f64::sqrt(2.0)).abs() < 1e-10);
    }

    #[test]
    fn degenerate_jacobian_is_reported() {
        let function = |_: f64| CalcOutput { value: 1.0, derivation: 0.0 };
        let err = solve(function, 1.0, 5).unwrap_err();
        assert!(err.degenerate());
    }
}
