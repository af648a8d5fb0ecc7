//! Camera pose and projection parameters.
//!
//! A [`Camera`] is a position plus heading, pitch and roll angles applied in
//! Y-X-Z order: heading turns about the vertical axis, pitch tilts about the
//! camera's horizontal axis, roll spins about the viewing direction. With all
//! angles zero the camera looks down the negative Z axis with +Y up.
//!
//! # Example
//!
//! ```
//! use softraster::{Camera, Projection, RenderContext, Vec3};
//!
//! let camera = Camera::orbiting(Vec3::ZERO, 4.0, 0.5, -0.3);
//! let projection = Projection::new().with_fov(60.0).clip(0.1, 50.0);
//!
//! let mut ctx = RenderContext::new(320, 240);
//! ctx.set_projection(projection.matrix(320.0 / 240.0));
//! ctx.set_camera(camera.matrix()).unwrap();
//! ```

use crate::math::{self, EulerOrder};
use glam::{Mat4, Vec3};

/// Rotation order of the camera angles.
pub const CAMERA_ORDER: EulerOrder = EulerOrder::YXZ;

/// A camera pose in world space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Camera {
    pub position: Vec3,
    /// Rotation about the world Y axis, radians.
    pub heading: f32,
    /// Rotation about the camera X axis, radians. Positive looks up.
    pub pitch: f32,
    /// Rotation about the viewing axis, radians.
    pub roll: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            position: Vec3::new(0.0, 0.0, 5.0),
            heading: 0.0,
            pitch: 0.0,
            roll: 0.0,
        }
    }
}

impl Camera {
    pub fn new() -> Self {
        Self::default()
    }

    /// A camera at `distance` from `target`, looking at it.
    pub fn orbiting(target: Vec3, distance: f32, heading: f32, pitch: f32) -> Self {
        let rotation = math::euler_matrix(CAMERA_ORDER, heading, pitch, 0.0);
        Self {
            position: target + rotation.transform_vector3(Vec3::Z * distance),
            heading,
            pitch,
            roll: 0.0,
        }
    }

    /// Recovers the pose from a camera matrix (rotation plus translation).
    pub fn from_matrix(matrix: &Mat4) -> Self {
        let (heading, pitch, roll) = math::euler_angles(matrix, CAMERA_ORDER);
        Self {
            position: matrix.w_axis.truncate(),
            heading,
            pitch,
            roll,
        }
    }

    pub fn at(mut self, x: f32, y: f32, z: f32) -> Self {
        self.position = Vec3::new(x, y, z);
        self
    }

    /// Sets heading, pitch and roll in radians.
    pub fn oriented(mut self, heading: f32, pitch: f32, roll: f32) -> Self {
        self.heading = heading;
        self.pitch = pitch;
        self.roll = roll;
        self
    }

    /// The camera matrix, mapping camera space to world space.
    pub fn matrix(&self) -> Mat4 {
        math::translation(self.position)
            * math::euler_matrix(CAMERA_ORDER, self.heading, self.pitch, self.roll)
    }

    /// The view matrix, mapping world space to camera space.
    pub fn view(&self) -> Mat4 {
        math::euler_matrix(CAMERA_ORDER, self.heading, self.pitch, self.roll).transpose()
            * math::translation(-self.position)
    }

    /// Viewing direction in world space.
    pub fn forward(&self) -> Vec3 {
        self.matrix().transform_vector3(Vec3::NEG_Z)
    }

    pub fn right(&self) -> Vec3 {
        self.matrix().transform_vector3(Vec3::X)
    }

    pub fn up(&self) -> Vec3 {
        self.matrix().transform_vector3(Vec3::Y)
    }
}

/// Perspective projection parameters.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Projection {
    /// Vertical field of view, radians.
    pub fov_y: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for Projection {
    fn default() -> Self {
        Self {
            fov_y: std::f32::consts::FRAC_PI_2, // 90 degrees
            near: 0.1,
            far: 100.0,
        }
    }
}

impl Projection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_fov(mut self, fov_degrees: f32) -> Self {
        self.fov_y = fov_degrees.to_radians();
        self
    }

    /// Sets the near and far clip distances.
    pub fn clip(mut self, near: f32, far: f32) -> Self {
        self.near = near;
        self.far = far;
        self
    }

    /// The projection matrix for a viewport of the given width / height ratio.
    pub fn matrix(&self, aspect: f32) -> Mat4 {
        math::perspective(self.fov_y, aspect, self.near, self.far)
    }
}
