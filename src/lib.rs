//! # softraster
//!
//! **A CPU-only triangle rasterizer with an immediate-mode vertex API.**
//!
//! Set up matrices and modes, submit vertices one at a time, read back the
//! frame buffer. No GPU, no window, no global state.
//!
//! ## Quick Start
//!
//! ```
//! use softraster::*;
//!
//! let mut ctx = RenderContext::with_config(
//!     ContextConfig::new()
//!         .size(64, 48)
//!         .clear_color(Vec4::new(0.1, 0.1, 0.15, 1.0))
//!         .enable(Mode::DepthWrite)
//!         .enable(Mode::DepthTest)
//!         .enable(Mode::Lighting),
//! );
//! ctx.set_projection(Projection::new().matrix(64.0 / 48.0));
//! ctx.set_camera(Camera::orbiting(Vec3::ZERO, 3.0, 0.4, -0.3).matrix()).unwrap();
//!
//! let sphere: Mesh<VertexCNT> = Mesh::sphere(3);
//! ctx.set_color(Vec4::new(1.0, 0.5, 0.2, 1.0));
//! ctx.draw_mesh(&sphere);
//!
//! assert_eq!(ctx.rgba().len(), 64 * 48);
//! assert!(ctx.stats().rasterized > 0);
//! ```
//!
//! ## Pipeline
//!
//! - **Immediate mode**: [`RenderContext::draw_vertex`] picks up the current
//!   normal, color and texture coordinate; every third vertex is a triangle.
//! - **Homogeneous clipping**: triangles are cut against the view volume
//!   before the perspective divide, so geometry behind the camera is safe.
//! - **Specialized rasterizers**: one monomorphized scanline loop per
//!   combination of depth mode, shading, blending and texturing.
//! - **Type-safe handles**: [`TextureId`] refers to a slot in the context's
//!   texture table; handle 0 is an always-present empty texture.

pub mod color;
pub mod math;

mod camera;
mod geometry;
mod mesh;
mod pipeline;
mod plane;
mod texture;

pub use camera::{CAMERA_ORDER, Camera, Projection};
pub use geometry::{GeometryError, GeometryLoader};
pub use math::{EulerOrder, MathError, Normalize};
pub use mesh::{Mesh, MeshVertex, VertexC, VertexCN, VertexCNCT, VertexCNT};
pub use pipeline::{ContextConfig, Mode, Modes, RenderContext, RenderStats, VertexAttributes};
pub use plane::Plane;
pub use texture::{Texture, TextureError, TextureId};

// Re-export glam math types for convenience
pub use glam::{Mat4, Quat, Vec2, Vec3, Vec4};
