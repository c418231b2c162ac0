//! Defines the tolerant-equality predicates used throughout the kernel.

use crate::cgmath64::*;
use cgmath::AbsDiffEq;
use std::fmt::Debug;

/// general tolerance for this crate
pub const TOLERANCE: f64 = 1.0e-6;
/// general tolerance for this crate, the square of `TOLERANCE`
pub const TOLERANCE2: f64 = TOLERANCE * TOLERANCE;

/// practical-infinity. Unlike `f64::MAX`, supports the usual arithmetic operations.
pub const INFINITY: f64 = 100_000_000.0;

/// Trait for tolerant comparison with the `TOLERANCE` constant.
pub trait Tolerance: AbsDiffEq<Epsilon = f64> + Debug {
    /// Returns whether `self` and `other` are close enough to be considered equal.
    /// # Examples
    /// ```
    /// use kurve_base::tolerance::*;
    /// assert!(1.0_f64.near(&1.00000001));
    /// assert!(!1.0_f64.near(&1.0001));
    /// ```
    fn near(&self, other: &Self) -> bool { self.abs_diff_eq(other, TOLERANCE) }

    /// Returns whether `self` and `other` are close enough compared to the squared tolerance.
    /// Useful for comparing squared distances without an extra `sqrt`.
    fn near2(&self, other: &Self) -> bool { self.abs_diff_eq(other, TOLERANCE2) }
}
impl<T: AbsDiffEq<Epsilon = f64> + Debug> Tolerance for T {}

/// Asserts that the two expressions are near, panicking with a useful message otherwise.
#[macro_export]
macro_rules! assert_near {
    ($left: expr, $right: expr $(,)?) => {
        assert!(
            $crate::tolerance::Tolerance::near(&$left, &$right),
            "assertion failed: `(left !== right)`\nleft: `{:?}`\nright: `{:?}`",
            $left,
            $right,
        )
    };
    ($left: expr, $right: expr, $($arg: tt)+) => {
        assert!(
            $crate::tolerance::Tolerance::near(&$left, &$right),
            $($arg)+
        )
    };
}

/// Asserts that the two expressions are near within the squared tolerance.
#[macro_export]
macro_rules! assert_near2 {
    ($left: expr, $right: expr $(,)?) => {
        assert!(
            $crate::tolerance::Tolerance::near2(&$left, &$right),
            "assertion failed: `(left !== right)`\nleft: `{:?}`\nright: `{:?}`",
            $left,
            $right,
        )
    };
    ($left: expr, $right: expr, $($arg: tt)+) => {
        assert!(
            $crate::tolerance::Tolerance::near2(&$left, &$right),
            $($arg)+
        )
    };
}

/// `proptest`-flavored assertion counterpart to [`assert_near!`].
#[macro_export]
macro_rules! prop_assert_near {
    ($left: expr, $right: expr $(,)?) => {
        proptest::prop_assert!(
            $crate::tolerance::Tolerance::near(&$left, &$right),
            "assertion failed: `(left !== right)`\nleft: `{:?}`\nright: `{:?}`",
            $left,
            $right,
        )
    };
}

/// `proptest`-flavored assertion counterpart to [`assert_near2!`].
#[macro_export]
macro_rules! prop_assert_near2 {
    ($left: expr, $right: expr $(,)?) => {
        proptest::prop_assert!(
            $crate::tolerance::Tolerance::near2(&$left, &$right),
            "assertion failed: `(left !== right)`\nleft: `{:?}`\nright: `{:?}`",
            $left,
            $right,
        )
    };
}

/// Trait for determining whether a value is close enough to the origin.
pub trait Origin: Tolerance + Zero {
    /// Returns whether `self` is near the origin, within `TOLERANCE`.
    fn so_small(&self) -> bool { self.near(&Self::zero()) }
    /// Returns whether `self` is near the origin, within `TOLERANCE2`.
    fn so_small2(&self) -> bool { self.near2(&Self::zero()) }
}
impl<T: Tolerance + Zero> Origin for T {}

/// Trait providing an L2 norm, used by the clamped Newton solvers in `kurve-geometry`.
pub trait Norm {
    /// the L2 norm of `self`
    fn norm_l2(&self) -> f64;
}

impl Norm for f64 {
    fn norm_l2(&self) -> f64 { self.abs() }
}

macro_rules! impl_norm {
    ($vector: ident) => {
        impl Norm for $vector {
            fn norm_l2(&self) -> f64 { f64::sqrt(self.dot(*self)) }
        }
    };
}
impl_norm!(Vector1);
impl_norm!(Vector2);
impl_norm!(Vector3);
impl_norm!(Vector4);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn near_and_near2() {
        assert_near!(1.0_f64, 1.0 + TOLERANCE / 2.0);
        assert!(!1.0_f64.near(&1.1));
        assert_near2!(1.0_f64, 1.0 + TOLERANCE2 / 2.0);
    }

    #[test]
    fn origin() {
        assert!(0.0_f64.so_small());
        assert!(!1.0_f64.so_small());
    }
}
