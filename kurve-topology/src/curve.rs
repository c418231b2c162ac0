//! A bounded restriction of a [`NurbsCurve`] to a sub-interval of its own domain, shared
//! (via `Arc`) between every BREP entity that references the same underlying geometry.

use crate::errors::{Error, Result};
use kurve_geometry::control_point::ControlPoint;
use kurve_geometry::NurbsCurve;
use kurve_base::Interval;
use std::sync::Arc;

/// A handle to a [`NurbsCurve`] plus an [`Interval`] that must be a subset of the curve's
/// own domain.
#[derive(Clone, Debug)]
pub struct Curve<V> {
    geometry: Arc<NurbsCurve<V>>,
    domain: Interval,
}

impl<V: ControlPoint> Curve<V> {
    /// Restricts `geometry` to `domain`, failing if `domain` is not contained in the
    /// geometry's own domain (within floating-point slack).
    pub fn new(geometry: Arc<NurbsCurve<V>>, domain: Interval) -> Result<Self> {
        let full = geometry.domain();
        let slack = 1e-9 * full.length().max(1.0);
        if domain.t0() < full.t0() - slack || domain.t1() > full.t1() + slack {
            return Err(Error::DomainNotContained {
                t0: domain.t0(),
                t1: domain.t1(),
                g0: full.t0(),
                g1: full.t1(),
            });
        }
        Ok(Curve { geometry, domain })
    }

    /// Wraps `geometry` at its own full domain.
    pub fn full(geometry: Arc<NurbsCurve<V>>) -> Self {
        let domain = geometry.domain();
        Curve { geometry, domain }
    }

    /// the underlying curve geometry
    pub fn geometry(&self) -> &NurbsCurve<V> { &self.geometry }

    /// the restricted domain
    pub fn domain(&self) -> Interval { self.domain }

    /// Evaluates the curve's position at `t`, which must lie in [`Self::domain`].
    pub fn point_at(&self, t: f64) -> Result<V> {
        self.check_domain(t)?;
        Ok(self.geometry.point_at(t)?)
    }

    /// Evaluates the curve's position and the first `order` derivatives at `t`.
    pub fn derivatives_at(&self, t: f64, order: usize) -> Result<Vec<V::Diff>> {
        self.check_domain(t)?;
        Ok(self.geometry.derivatives_at(t, order)?)
    }

    fn check_domain(&self, t: f64) -> Result<()> {
        if !self.domain.contains(t) {
            return Err(kurve_geometry::errors::Error::InvalidParameter {
                t,
                t0: self.domain.t0(),
                t1: self.domain.t1(),
            }
            .into());
        }
        Ok(())
    }

    /// The geometry's own spans, clipped to this curve's restricted domain.
    pub fn spans(&self) -> Vec<Interval> {
        self.geometry.spans().into_iter().filter_map(|span| self.domain.intersect(&span)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kurve_base::cgmath64::Point2;
    use kurve_geometry::KnotVec;

    fn line() -> Arc<NurbsCurve<Point2>> {
        let knots = KnotVec::new_unchecked(vec![0.0, 10.0]);
        let poles = vec![Point2::new(0.0, 0.0), Point2::new(10.0, 0.0)];
        Arc::new(NurbsCurve::try_new(1, knots, poles).unwrap())
    }

    #[test]
    fn restricted_domain_clips_evaluation_range() {
        let curve = Curve::new(line(), Interval::new(2.0, 8.0)).unwrap();
        assert!(curve.point_at(2.0).is_ok());
        assert!(curve.point_at(9.0).is_err()); // outside the restricted domain, though inside the geometry's
        assert_eq!((curve.domain().t0(), curve.domain().t1()), (2.0, 8.0));
    }

    #[test]
    fn domain_outside_geometry_is_rejected() {
        assert!(Curve::new(line(), Interval::new(-1.0, 5.0)).is_err());
    }

    #[test]
    fn full_domain_matches_geometry() {
        let geometry = line();
        let domain = geometry.domain();
        let curve = Curve::full(geometry);
        assert_eq!((curve.domain().t0(), curve.domain().t1()), (domain.t0(), domain.t1()));
    }

    #[test]
    fn spans_are_clipped_to_restricted_domain() {
        let knots = KnotVec::new_unchecked(vec![0.0, 2.5, 5.0, 7.5, 10.0]);
        let poles = vec![
            Point2::new(0.0, 0.0),
            Point2::new(2.5, 0.0),
            Point2::new(5.0, 0.0),
            Point2::new(7.5, 0.0),
            Point2::new(10.0, 0.0),
        ];
        let geometry = Arc::new(NurbsCurve::try_new(1, knots, poles).unwrap());
        let curve = Curve::new(geometry, Interval::new(3.0, 9.0)).unwrap();
        let spans = curve.spans();
        assert_eq!(spans.first().unwrap().t0(), 3.0);
        assert_eq!(spans.last().unwrap().t1(), 9.0);
    }
}
