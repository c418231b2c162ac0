//! A generic control point: anything that lives in an affine space over `f64`, so that
//! [`crate::NurbsCurve`] and [`crate::NurbsSurface`] can be instantiated both with bare
//! vectors (2D/3D parameter-space curves) and with points (3D world-space geometry).

use kurve_base::cgmath64::*;
use std::fmt::Debug;
use std::ops::{Add, Div, Mul, Sub};

/// A point in an affine space: supports the affine combinations a NURBS evaluator needs
/// (weighted sums of poles) without requiring a full vector space.
pub trait ControlPoint:
    Add<Self::Diff, Output = Self> + Sub<Self::Diff, Output = Self> + Sub<Self, Output = Self::Diff> + Copy + Debug
{
    /// The difference type: a true vector space closed under scaling.
    type Diff: Add<Self::Diff, Output = Self::Diff>
        + Sub<Self::Diff, Output = Self::Diff>
        + Mul<f64, Output = Self::Diff>
        + Div<f64, Output = Self::Diff>
        + Zero
        + Copy
        + Debug;
    /// The number of scalar components, used by algorithms (the KD-tree seed of
    /// [`crate::point_on_surface`]) that need to iterate axes generically.
    const DIM: usize;
    /// The origin of the affine space.
    fn origin() -> Self;
    /// Converts `self` into its difference from the origin.
    fn to_vec(self) -> Self::Diff { self - Self::origin() }
}

macro_rules! impl_control_point_for_point {
    ($point: ident, $vector: ident, $dim: expr) => {
        impl ControlPoint for $point {
            type Diff = $vector;
            const DIM: usize = $dim;
            fn origin() -> Self { $point::origin() }
        }
    };
}
impl_control_point_for_point!(Point1, Vector1, 1);
impl_control_point_for_point!(Point2, Vector2, 2);
impl_control_point_for_point!(Point3, Vector3, 3);

macro_rules! impl_control_point_for_vector {
    ($vector: ident, $dim: expr) => {
        impl ControlPoint for $vector {
            type Diff = $vector;
            const DIM: usize = $dim;
            fn origin() -> Self { $vector::zero() }
        }
    };
}
impl_control_point_for_vector!(Vector1, 1);
impl_control_point_for_vector!(Vector2, 2);
impl_control_point_for_vector!(Vector3, 3);
impl_control_point_for_vector!(Vector4, 4);
