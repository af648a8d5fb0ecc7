//! The software geometry pipeline.
//!
//! A [`RenderContext`] owns a frame buffer and the state that shapes how
//! submitted triangles end up in it. Triangles pass through these stages:
//!
//! 1. **Assembly**: [`RenderContext::draw_vertex`] transforms each vertex into
//!    clip space and stamps it with the current [`VertexAttributes`]; every
//!    third vertex completes a triangle.
//! 2. **Culling**: the winding in normalized device coordinates decides the
//!    facing; counter-clockwise is front. Disabled sides are discarded.
//! 3. **Lighting**: optional ambient plus directional term on vertex colors.
//! 4. **Clipping**: against the six planes of the view volume in homogeneous
//!    coordinates.
//! 5. **Rasterization**: perspective divide, viewport mapping and a scanline
//!    rasterizer specialized for the enabled [`Mode`]s.
//!
//! # Example
//!
//! ```
//! use softraster::{Mode, RenderContext, Vec3, Vec4};
//!
//! let mut ctx = RenderContext::new(2, 2);
//! ctx.set_clear_color(Vec4::new(0.0, 0.0, 1.0, 1.0));
//! ctx.clear(true, true);
//! ctx.enable(Mode::DepthWrite);
//!
//! ctx.set_color(Vec4::new(1.0, 0.0, 0.0, 1.0));
//! for [x, y] in [[-1.0, -1.0], [3.0, -1.0], [-1.0, 3.0]] {
//!     ctx.draw_vertex(Vec3::new(x, y, 0.0));
//! }
//! assert!(ctx.rgba().iter().all(|&px| px == 0xff0000ff));
//! ```

mod clip;
mod context;
mod frame_buffer;
mod modes;
mod raster;

pub use context::{ContextConfig, RenderContext, RenderStats, VertexAttributes};
pub use modes::{Mode, Modes};

use glam::{Vec2, Vec3, Vec4};

/// A vertex between assembly and rasterization.
///
/// `coord` holds clip coordinates until the perspective divide, screen
/// coordinates afterwards.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub(crate) struct ClipVertex {
    pub coord: Vec4,
    pub normal: Vec3,
    pub color: Vec4,
    pub tex_coord: Vec2,
}

impl ClipVertex {
    /// The vertex at `t` along the edge towards `other`.
    ///
    /// Colors are interpolated only if `smooth`, otherwise copied from `self`.
    /// The normal is not needed after lighting and is left zero.
    pub fn lerp(&self, other: &Self, t: f32, smooth: bool) -> Self {
        Self {
            coord: self.coord + (other.coord - self.coord) * t,
            normal: Vec3::ZERO,
            color: if smooth {
                self.color + (other.color - self.color) * t
            } else {
                self.color
            },
            tex_coord: self.tex_coord + (other.tex_coord - self.tex_coord) * t,
        }
    }
}

pub(crate) type Triangle = [ClipVertex; 3];
