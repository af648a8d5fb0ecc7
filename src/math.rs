//! Linear algebra on top of [`glam`].
//!
//! glam provides the vector and matrix types used throughout the crate
//! ([`Vec2`], [`Vec3`], [`Vec4`], [`Mat4`]) together with componentwise
//! arithmetic, dot/cross products, matrix products and the determinant. This
//! module adds what the pipeline needs beyond that:
//!
//! - [`invert`]: closed-form inverse that refuses (near-)singular matrices
//! - [`Normalize`]: normalization that reports null vectors instead of
//!   producing NaNs, plus a non-failing variant
//! - [`frustum`] / [`perspective`]: OpenGL-style projection matrices
//! - [`euler_matrix`] / [`euler_angles`]: Euler angle composition and
//!   decomposition for all twelve rotation orders
//!
//! # Example
//!
//! ```
//! use softraster::math::{self, EulerOrder};
//!
//! let m = math::euler_matrix(EulerOrder::YXZ, 0.3, -0.2, 1.1);
//! let (h, p, r) = math::euler_angles(&m, EulerOrder::YXZ);
//! assert!((h - 0.3).abs() < 1e-4 && (p + 0.2).abs() < 1e-4 && (r - 1.1).abs() < 1e-4);
//!
//! let inv = math::invert(&m, math::DEFAULT_EPSILON).unwrap();
//! assert!((m * inv).abs_diff_eq(glam::Mat4::IDENTITY, 1e-5));
//! ```

use glam::{Mat4, Vec2, Vec3, Vec4};

/// Default regularity threshold for [`invert`].
pub const DEFAULT_EPSILON: f32 = 1e-10;

/// Vectors shorter than this cannot be normalized.
pub const NULL_LENGTH: f32 = 1e-10;

// cos(middle angle) below this is treated as gimbal lock
const GIMBAL_EPSILON: f32 = 1e-6;

/// Errors raised by the checked linear algebra operations.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum MathError {
    /// The matrix determinant is below the regularity threshold.
    SingularMatrix {
        /// Determinant of the rejected matrix.
        determinant: f32,
    },
    /// A vector with (near) zero length was normalized.
    NullVector,
}

impl std::fmt::Display for MathError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MathError::SingularMatrix { determinant } => {
                write!(f, "singular matrix (determinant {})", determinant)
            }
            MathError::NullVector => write!(f, "null vector cannot be normalized"),
        }
    }
}

impl std::error::Error for MathError {}

/// Checked normalization for glam vectors.
pub trait Normalize: Sized {
    /// Returns the unit vector, or [`MathError::NullVector`] if the length is
    /// below [`NULL_LENGTH`].
    fn normalized(self) -> Result<Self, MathError>;

    /// Returns the unit vector, or the zero vector if the length is below
    /// [`NULL_LENGTH`].
    fn normalized_or_zero(self) -> Self;
}

macro_rules! impl_normalize {
    ($($ty:ty),*) => {$(
        impl Normalize for $ty {
            fn normalized(self) -> Result<Self, MathError> {
                let len = self.length();
                if len < NULL_LENGTH {
                    return Err(MathError::NullVector);
                }
                Ok(self * (1.0 / len))
            }

            fn normalized_or_zero(self) -> Self {
                self.normalized().unwrap_or(<$ty>::ZERO)
            }
        }
    )*};
}

impl_normalize!(Vec2, Vec3, Vec4);

/// Builds a translation matrix.
pub fn translation(offset: Vec3) -> Mat4 {
    Mat4::from_translation(offset)
}

/// Builds a rotation of `angle` radians about `axis`.
///
/// `axis` must be of unit length.
pub fn rotation(axis: Vec3, angle: f32) -> Mat4 {
    Mat4::from_axis_angle(axis, angle)
}

/// Builds a rotation of `angle` radians about a principal axis.
pub fn rotation_about(axis: Axis, angle: f32) -> Mat4 {
    match axis {
        Axis::X => Mat4::from_rotation_x(angle),
        Axis::Y => Mat4::from_rotation_y(angle),
        Axis::Z => Mat4::from_rotation_z(angle),
    }
}

/// Builds a non-uniform scale matrix.
pub fn scale(sx: f32, sy: f32, sz: f32) -> Mat4 {
    Mat4::from_scale(Vec3::new(sx, sy, sz))
}

/// Builds an off-axis perspective frustum.
///
/// `left`, `right`, `bottom` and `top` are the borders of the view window on
/// the near plane; `near` and `far` are the (positive) clip distances. The
/// result maps the frustum onto the clip volume `-w <= x, y, z <= w`.
pub fn frustum(left: f32, right: f32, bottom: f32, top: f32, near: f32, far: f32) -> Mat4 {
    let width = right - left;
    let height = top - bottom;
    let depth = far - near;
    Mat4::from_cols(
        Vec4::new(2.0 * near / width, 0.0, 0.0, 0.0),
        Vec4::new(0.0, 2.0 * near / height, 0.0, 0.0),
        Vec4::new(
            (right + left) / width,
            (top + bottom) / height,
            -(far + near) / depth,
            -1.0,
        ),
        Vec4::new(0.0, 0.0, -2.0 * far * near / depth, 0.0),
    )
}

/// Builds a symmetric perspective projection.
///
/// `fov_y` is the vertical field of view in radians, `aspect` is
/// width / height.
pub fn perspective(fov_y: f32, aspect: f32, near: f32, far: f32) -> Mat4 {
    let half_height = (0.5 * fov_y).tan() * near;
    let half_width = half_height * aspect;
    frustum(-half_width, half_width, -half_height, half_height, near, far)
}

/// Returns the determinant of `mat`.
pub fn determinant(mat: &Mat4) -> f32 {
    mat.determinant()
}

/// Inverts `mat`.
///
/// Fails with [`MathError::SingularMatrix`] when `|det(mat)| < epsilon`.
pub fn invert(mat: &Mat4, epsilon: f32) -> Result<Mat4, MathError> {
    debug_assert!(epsilon >= 0.0);
    let determinant = mat.determinant();
    if determinant.abs() < epsilon {
        return Err(MathError::SingularMatrix { determinant });
    }
    Ok(mat.inverse())
}

/// A principal rotation axis.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    const fn index(self) -> usize {
        match self {
            Axis::X => 0,
            Axis::Y => 1,
            Axis::Z => 2,
        }
    }

    /// The unit vector along this axis.
    pub const fn unit(self) -> Vec3 {
        match self {
            Axis::X => Vec3::X,
            Axis::Y => Vec3::Y,
            Axis::Z => Vec3::Z,
        }
    }
}

/// Order of the three rotations in an Euler angle triple.
///
/// `XYZ` means `R = Rx(a1) · Ry(a2) · Rz(a3)`. The six orders with a repeated
/// first and last axis are the proper Euler orders; the others are
/// Tait-Bryan orders.
#[allow(clippy::upper_case_acronyms)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EulerOrder {
    XYX,
    XYZ,
    XZX,
    XZY,
    YXY,
    YXZ,
    YZX,
    YZY,
    ZXY,
    ZXZ,
    ZYX,
    ZYZ,
}

impl EulerOrder {
    /// Every supported order.
    pub const ALL: [EulerOrder; 12] = [
        EulerOrder::XYX,
        EulerOrder::XYZ,
        EulerOrder::XZX,
        EulerOrder::XZY,
        EulerOrder::YXY,
        EulerOrder::YXZ,
        EulerOrder::YZX,
        EulerOrder::YZY,
        EulerOrder::ZXY,
        EulerOrder::ZXZ,
        EulerOrder::ZYX,
        EulerOrder::ZYZ,
    ];

    /// Heading, pitch, roll as used by OpenGL Performer.
    pub const HPR: EulerOrder = EulerOrder::ZXY;

    /// The A-B-C convention of German engineering.
    pub const ABC: EulerOrder = EulerOrder::ZYX;

    /// The three rotation axes, outermost first.
    pub const fn axes(self) -> (Axis, Axis, Axis) {
        use Axis::{X, Y, Z};
        match self {
            EulerOrder::XYX => (X, Y, X),
            EulerOrder::XYZ => (X, Y, Z),
            EulerOrder::XZX => (X, Z, X),
            EulerOrder::XZY => (X, Z, Y),
            EulerOrder::YXY => (Y, X, Y),
            EulerOrder::YXZ => (Y, X, Z),
            EulerOrder::YZX => (Y, Z, X),
            EulerOrder::YZY => (Y, Z, Y),
            EulerOrder::ZXY => (Z, X, Y),
            EulerOrder::ZXZ => (Z, X, Z),
            EulerOrder::ZYX => (Z, Y, X),
            EulerOrder::ZYZ => (Z, Y, Z),
        }
    }

    /// Whether the first and last axis coincide.
    pub const fn is_proper(self) -> bool {
        let (first, _, last) = self.axes();
        first.index() == last.index()
    }
}

/// Composes a rotation matrix from Euler angles (radians).
pub fn euler_matrix(order: EulerOrder, a1: f32, a2: f32, a3: f32) -> Mat4 {
    let (axis1, axis2, axis3) = order.axes();
    rotation_about(axis1, a1) * rotation_about(axis2, a2) * rotation_about(axis3, a3)
}

/// Decomposes the rotational part of `mat` into Euler angles (radians).
///
/// The upper-left 3×3 block must be a pure rotation; translation is ignored,
/// scale or shear give meaningless results.
///
/// The outer angles are returned in `(-π, π]`. The middle angle is in
/// `[-π/2, π/2]` for Tait-Bryan orders and in `[0, π]` for proper Euler orders.
/// In gimbal lock the third angle is reported as zero.
pub fn euler_angles(mat: &Mat4, order: EulerOrder) -> (f32, f32, f32) {
    let (axis1, axis2, _) = order.axes();
    let i = axis1.index();
    let j = axis2.index();
    let at = |row: usize, col: usize| mat.col(col)[row];
    // +1 for cyclic axis sequences (x→y, y→z, z→x), -1 otherwise
    let parity = if (i + 1) % 3 == j { 1.0 } else { -1.0 };

    if order.is_proper() {
        let m = 3 - i - j;
        let sin2 = (at(i, j) * at(i, j) + at(i, m) * at(i, m)).sqrt();
        let a2 = sin2.atan2(at(i, i));
        if sin2 > GIMBAL_EPSILON {
            let a1 = at(j, i).atan2(-parity * at(m, i));
            let a3 = at(i, j).atan2(parity * at(i, m));
            (a1, a2, a3)
        } else {
            let a1 = (parity * at(m, j)).atan2(at(j, j));
            (a1, a2, 0.0)
        }
    } else {
        let k = 3 - i - j;
        let cos2 = (at(i, i) * at(i, i) + at(i, j) * at(i, j)).sqrt();
        let a2 = (parity * at(i, k)).atan2(cos2);
        if cos2 > GIMBAL_EPSILON {
            let a1 = (-parity * at(j, k)).atan2(at(k, k));
            let a3 = (-parity * at(i, j)).atan2(at(i, i));
            (a1, a2, a3)
        } else {
            let a1 = (parity * at(k, j)).atan2(at(j, j));
            (a1, a2, 0.0)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_matrices() -> Vec<Mat4> {
        vec![
            Mat4::IDENTITY,
            translation(Vec3::new(1.0, -2.0, 3.5)),
            rotation(Vec3::new(1.0, 2.0, -0.5).normalize(), 0.7),
            scale(2.0, 0.5, -3.0),
            frustum(-0.3, 0.5, -0.2, 0.4, 0.1, 50.0),
            translation(Vec3::new(0.0, 1.0, -4.0))
                * euler_matrix(EulerOrder::ZYX, 0.4, -1.1, 2.0)
                * scale(1.5, 1.5, 0.75),
        ]
    }

    #[test]
    fn invert_round_trip() {
        for m in sample_matrices() {
            let inv = invert(&m, DEFAULT_EPSILON).unwrap();
            let back = invert(&inv, DEFAULT_EPSILON).unwrap();
            assert!(back.abs_diff_eq(m, 1e-3), "{m:?} vs {back:?}");
            assert!((m * inv).abs_diff_eq(Mat4::IDENTITY, 1e-4));
        }
    }

    #[test]
    fn invert_rejects_singular_matrix() {
        let flat = scale(1.0, 0.0, 1.0);
        assert_eq!(
            invert(&flat, DEFAULT_EPSILON),
            Err(MathError::SingularMatrix { determinant: 0.0 })
        );
        assert!(invert(&Mat4::ZERO, DEFAULT_EPSILON).is_err());
    }

    #[test]
    fn determinant_of_scale_is_product() {
        assert!((determinant(&scale(2.0, 3.0, 4.0)) - 24.0).abs() < 1e-5);
    }

    #[test]
    fn normalize_reports_null_vector() {
        assert_eq!(Vec3::ZERO.normalized(), Err(MathError::NullVector));
        assert_eq!(Vec2::new(1e-12, 0.0).normalized_or_zero(), Vec2::ZERO);
        let v = Vec4::new(0.0, 3.0, 0.0, 4.0).normalized().unwrap();
        assert!(v.abs_diff_eq(Vec4::new(0.0, 0.6, 0.0, 0.8), 1e-6));
    }

    #[test]
    fn principal_rotations_follow_right_hand_rule() {
        let p = rotation_about(Axis::Z, std::f32::consts::FRAC_PI_2).transform_vector3(Vec3::X);
        assert!(p.abs_diff_eq(Vec3::Y, 1e-6));
        let q = rotation(Axis::X.unit(), std::f32::consts::FRAC_PI_2).transform_vector3(Vec3::Y);
        assert!(q.abs_diff_eq(Vec3::Z, 1e-6));
    }

    #[test]
    fn perspective_matches_glam() {
        let ours = perspective(0.8, 1.5, 0.1, 100.0);
        let glam = Mat4::perspective_rh_gl(0.8, 1.5, 0.1, 100.0);
        assert!(ours.abs_diff_eq(glam, 1e-4));
    }

    #[test]
    fn frustum_maps_near_corners_to_clip_volume() {
        let m = frustum(-1.0, 2.0, -0.5, 1.5, 1.0, 10.0);
        let corner = m * Vec4::new(2.0, 1.5, -1.0, 1.0);
        let ndc = corner / corner.w;
        assert!(ndc.abs_diff_eq(Vec4::new(1.0, 1.0, -1.0, 1.0), 1e-5));
        let far = m * Vec4::new(-10.0, -5.0, -10.0, 1.0);
        assert!(((far / far.w).truncate()).abs_diff_eq(Vec3::new(-1.0, -1.0, 1.0), 1e-5));
    }

    #[test]
    fn euler_round_trip_all_orders() {
        let outer = [-2.9, -1.3, -0.2, 0.0, 0.6, 1.7, 3.0];
        let tait_bryan_middle = [-1.4, -0.7, 0.0, 0.3, 1.2];
        let proper_middle = [0.1, 0.9, 1.6, 2.4, 3.0];
        for order in EulerOrder::ALL {
            let middle: &[f32] = if order.is_proper() {
                &proper_middle
            } else {
                &tait_bryan_middle
            };
            for &a1 in &outer {
                for &a2 in middle {
                    for &a3 in &outer {
                        let m = euler_matrix(order, a1, a2, a3);
                        let (b1, b2, b3) = euler_angles(&m, order);
                        assert!(
                            (a1 - b1).abs() < 1e-3 && (a2 - b2).abs() < 1e-3 && (a3 - b3).abs() < 1e-3,
                            "{order:?}: ({a1}, {a2}, {a3}) -> ({b1}, {b2}, {b3})"
                        );
                    }
                }
            }
        }
    }

    #[test]
    fn euler_gimbal_lock_still_reproduces_matrix() {
        for order in EulerOrder::ALL {
            let a2 = if order.is_proper() { 0.0 } else { std::f32::consts::FRAC_PI_2 };
            let m = euler_matrix(order, 0.5, a2, 0.0);
            let (b1, b2, b3) = euler_angles(&m, order);
            assert_eq!(b3, 0.0);
            assert!(euler_matrix(order, b1, b2, b3).abs_diff_eq(m, 1e-4), "{order:?}");
        }
    }
}
