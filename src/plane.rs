//! Oriented planes for half-space tests.

use crate::math::{MathError, Normalize};
use glam::{Vec3, Vec4};

/// A plane given by its unit normal and its distance from the origin.
///
/// Points with a non-negative [`signed_distance`](Plane::signed_distance)
/// lie "over" the plane, i.e. on the side the normal points to.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Plane {
    normal: Vec3,
    d: f32,
}

impl Plane {
    /// Creates a plane from a normal (normalized here) and offset.
    pub fn new(normal: Vec3, d: f32) -> Result<Self, MathError> {
        Ok(Self {
            normal: normal.normalized()?,
            d,
        })
    }

    /// Creates a plane through `point` with the given normal.
    pub fn from_point_normal(point: Vec3, normal: Vec3) -> Result<Self, MathError> {
        let normal = normal.normalized()?;
        Ok(Self {
            normal,
            d: point.dot(normal),
        })
    }

    pub(crate) const fn from_unit(normal: Vec3, d: f32) -> Self {
        Self { normal, d }
    }

    pub fn normal(&self) -> Vec3 {
        self.normal
    }

    pub fn d(&self) -> f32 {
        self.d
    }

    /// Signed distance of `point`; positive over the plane.
    pub fn signed_distance(&self, point: Vec3) -> f32 {
        (point - self.d * self.normal).dot(self.normal)
    }

    /// Signed distance of a homogeneous point, scaled by its `w`.
    ///
    /// For `w > 0` the sign agrees with [`signed_distance`](Plane::signed_distance)
    /// of the projected point, without dividing by `w`.
    pub fn signed_distance_h(&self, point: Vec4) -> f32 {
        point.truncate().dot(self.normal) - self.d * point.w
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signed_distance_is_positive_over_plane() {
        let plane = Plane::new(Vec3::new(0.0, 2.0, 0.0), 1.0).unwrap();
        assert_eq!(plane.normal(), Vec3::Y);
        assert!((plane.signed_distance(Vec3::new(5.0, 3.0, -2.0)) - 2.0).abs() < 1e-6);
        assert!((plane.signed_distance(Vec3::new(0.0, 0.5, 0.0)) + 0.5).abs() < 1e-6);
        assert_eq!(plane.signed_distance(Vec3::new(7.0, 1.0, 7.0)), 0.0);
    }

    #[test]
    fn homogeneous_distance_matches_projected_sign() {
        let plane = Plane::from_unit(Vec3::X, 1.0);
        let p = Vec4::new(3.0, 0.0, 0.0, 2.0);
        assert!((plane.signed_distance_h(p) - 1.0).abs() < 1e-6);
        assert!(plane.signed_distance((p / p.w).truncate()) > 0.0);
    }

    #[test]
    fn null_normal_is_rejected() {
        assert_eq!(Plane::new(Vec3::ZERO, 1.0), Err(MathError::NullVector));
        let plane = Plane::from_point_normal(Vec3::new(0.0, 0.0, 4.0), Vec3::Z).unwrap();
        assert!((plane.d() - 4.0).abs() < 1e-6);
    }
}
