//! The render context: frame buffer, pipeline state and vertex submission.

use super::clip::clip_triangles;
use super::frame_buffer::FrameBuffer;
use super::modes::{Mode, Modes};
use super::raster;
use super::{ClipVertex, Triangle};
use crate::color::color_to_rgba;
use crate::math::{self, MathError};
use crate::mesh::{Mesh, MeshVertex};
use crate::texture::{Texture, TextureId, TextureTable};
use glam::{Mat4, Vec2, Vec3, Vec4};
use std::path::Path;

// vertices with |w| below this cannot be projected
const MIN_W: f32 = 1e-10;

/// Attributes applied to the next submitted vertex.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VertexAttributes {
    /// Normal in model space, used for lighting.
    pub normal: Vec3,
    /// RGBA color, channels in `[0, 1]`.
    pub color: Vec4,
    /// Texture coordinate.
    pub tex_coord: Vec2,
}

impl Default for VertexAttributes {
    fn default() -> Self {
        Self {
            normal: Vec3::Z,
            color: Vec4::ONE,
            tex_coord: Vec2::ZERO,
        }
    }
}

/// Triangle counters since construction or the last
/// [`reset_stats`](RenderContext::reset_stats).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RenderStats {
    /// Triangles assembled from submitted vertices.
    pub submitted: u64,
    /// Triangles discarded because their side is disabled.
    pub culled: u64,
    /// Triangles lying entirely outside the view volume.
    pub clipped_away: u64,
    /// Triangles that reached the rasterizer.
    pub rasterized: u64,
}

/// Initial settings of a [`RenderContext`].
///
/// # Example
///
/// ```
/// use softraster::{ContextConfig, Mode, RenderContext, Vec3, Vec4};
///
/// let ctx = RenderContext::with_config(
///     ContextConfig::new()
///         .size(320, 240)
///         .clear_color(Vec4::new(0.1, 0.1, 0.15, 1.0))
///         .light(Vec3::new(0.0, 0.6, 0.8))
///         .enable(Mode::DepthWrite)
///         .enable(Mode::DepthTest),
/// );
/// assert_eq!(ctx.width(), 320);
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ContextConfig {
    pub width: u32,
    pub height: u32,
    pub clear_color: Vec4,
    pub ambient: f32,
    pub light: Vec3,
    pub modes: Modes,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            width: 800,
            height: 600,
            clear_color: Vec4::ZERO,
            ambient: 0.2,
            light: Vec3::Z,
            modes: Modes::default(),
        }
    }
}

impl ContextConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn clear_color(mut self, color: Vec4) -> Self {
        self.clear_color = color;
        self
    }

    pub fn ambient(mut self, ambient: f32) -> Self {
        self.ambient = ambient;
        self
    }

    pub fn light(mut self, light: Vec3) -> Self {
        self.light = light;
        self
    }

    pub fn modes(mut self, modes: Modes) -> Self {
        self.modes = modes;
        self
    }

    pub fn enable(mut self, mode: Mode) -> Self {
        self.modes = self.modes.with(mode);
        self
    }
}

/// A CPU render target with an immediate-mode vertex API.
///
/// Vertices are submitted one at a time with [`draw_vertex`](Self::draw_vertex)
/// and pick up the current attribute state; every third vertex completes a
/// triangle, which is then culled, lit, clipped and rasterized right away.
/// The result is read back with [`rgba`](Self::rgba).
///
/// Transform state consists of four matrices: projection, view, camera and
/// model. Camera and view are inverses of each other; setting one updates the
/// other. Vertices are transformed by `projection · view · model`.
#[derive(Debug)]
pub struct RenderContext {
    fb: FrameBuffer,
    clear_rgba: u32,

    projection: Mat4,
    view: Mat4,
    camera: Mat4,
    model: Mat4,
    mvp: Mat4,

    attributes: VertexAttributes,
    modes: Modes,
    ambient: f32,
    light: Vec3,
    textures: TextureTable,

    assembly: [ClipVertex; 3],
    pending: usize,
    clip_buffer: Vec<Triangle>,

    stats: RenderStats,
}

impl RenderContext {
    /// Creates a context for a `width × height` viewport with default settings.
    pub fn new(width: u32, height: u32) -> Self {
        Self::with_config(ContextConfig::new().size(width, height))
    }

    pub fn with_config(config: ContextConfig) -> Self {
        let clear_rgba = color_to_rgba(config.clear_color);
        log::debug!(
            "Creating {}x{} render context",
            config.width,
            config.height
        );
        Self {
            fb: FrameBuffer::new(config.width, config.height, clear_rgba),
            clear_rgba,
            projection: Mat4::IDENTITY,
            view: Mat4::IDENTITY,
            camera: Mat4::IDENTITY,
            model: Mat4::IDENTITY,
            mvp: Mat4::IDENTITY,
            attributes: VertexAttributes::default(),
            modes: config.modes,
            ambient: config.ambient.clamp(0.0, 1.0),
            light: config.light,
            textures: TextureTable::default(),
            assembly: [ClipVertex::default(); 3],
            pending: 0,
            clip_buffer: Vec::with_capacity(8),
            stats: RenderStats::default(),
        }
    }

    pub fn width(&self) -> u32 {
        self.fb.width() as u32
    }

    pub fn height(&self) -> u32 {
        self.fb.height() as u32
    }

    // Matrices

    pub fn projection(&self) -> Mat4 {
        self.projection
    }

    pub fn set_projection(&mut self, projection: Mat4) {
        self.projection = projection;
        self.update_mvp();
    }

    pub fn view(&self) -> Mat4 {
        self.view
    }

    /// Sets the view matrix and the camera matrix to its inverse.
    ///
    /// Fails without changing anything if `view` is singular.
    pub fn set_view(&mut self, view: Mat4) -> Result<(), MathError> {
        let camera = math::invert(&view, math::DEFAULT_EPSILON).inspect_err(|e| {
            log::debug!("Rejected view matrix: {}", e);
        })?;
        self.view = view;
        self.camera = camera;
        self.update_mvp();
        Ok(())
    }

    pub fn camera(&self) -> Mat4 {
        self.camera
    }

    /// Sets the camera matrix (camera pose in world space) and the view
    /// matrix to its inverse.
    ///
    /// Fails without changing anything if `camera` is singular.
    pub fn set_camera(&mut self, camera: Mat4) -> Result<(), MathError> {
        let view = math::invert(&camera, math::DEFAULT_EPSILON).inspect_err(|e| {
            log::debug!("Rejected camera matrix: {}", e);
        })?;
        self.camera = camera;
        self.view = view;
        self.update_mvp();
        Ok(())
    }

    pub fn model(&self) -> Mat4 {
        self.model
    }

    pub fn set_model(&mut self, model: Mat4) {
        self.model = model;
        self.update_mvp();
    }

    fn update_mvp(&mut self) {
        self.mvp = self.projection * self.view * self.model;
        log::trace!("MVP matrix updated");
    }

    // Modes and lighting

    pub fn enable(&mut self, mode: Mode) {
        self.modes.set(mode, true);
    }

    pub fn disable(&mut self, mode: Mode) {
        self.modes.set(mode, false);
    }

    /// Enables or disables `mode`.
    pub fn set_mode(&mut self, mode: Mode, on: bool) {
        self.modes.set(mode, on);
    }

    pub fn is_enabled(&self, mode: Mode) -> bool {
        self.modes.contains(mode)
    }

    pub fn modes(&self) -> Modes {
        self.modes
    }

    pub fn set_modes(&mut self, modes: Modes) {
        self.modes = modes;
    }

    pub fn ambient(&self) -> f32 {
        self.ambient
    }

    /// Sets the ambient light fraction, clamped to `[0, 1]`.
    pub fn set_ambient(&mut self, ambient: f32) {
        self.ambient = ambient.clamp(0.0, 1.0);
    }

    pub fn light(&self) -> Vec3 {
        self.light
    }

    /// Sets the direction towards the light, in the same space as
    /// model-transformed normals.
    pub fn set_light(&mut self, light: Vec3) {
        self.light = light;
    }

    // Vertex attributes

    pub fn attributes(&self) -> VertexAttributes {
        self.attributes
    }

    pub fn set_attributes(&mut self, attributes: VertexAttributes) {
        self.attributes = attributes;
    }

    pub fn set_normal(&mut self, normal: Vec3) {
        self.attributes.normal = normal;
    }

    pub fn set_color(&mut self, color: Vec4) {
        self.attributes.color = color;
    }

    pub fn set_tex_coord(&mut self, tex_coord: Vec2) {
        self.attributes.tex_coord = tex_coord;
    }

    // Drawing

    /// Submits a vertex with the current attributes.
    ///
    /// Every third call completes a triangle and draws it.
    pub fn draw_vertex(&mut self, coord: Vec3) {
        self.assembly[self.pending] = self.make_vertex(coord, &self.attributes);
        self.pending += 1;
        if self.pending == 3 {
            self.pending = 0;
            let tri = self.assembly;
            self.draw_triangle(tri);
        }
    }

    /// Number of submitted vertices not yet forming a triangle (0 to 2).
    pub fn pending_vertices(&self) -> usize {
        self.pending
    }

    /// Draws all triangles of a mesh.
    ///
    /// Attributes the vertex format lacks are taken from the current
    /// attribute state. Vertices pending from [`draw_vertex`](Self::draw_vertex)
    /// stay pending.
    pub fn draw_mesh<V: MeshVertex>(&mut self, mesh: &Mesh<V>) {
        for tri in mesh.triangles() {
            let tri = tri.map(|v| {
                let attributes = VertexAttributes {
                    normal: v.normal().unwrap_or(self.attributes.normal),
                    color: v.color().unwrap_or(self.attributes.color),
                    tex_coord: v.tex_coord().unwrap_or(self.attributes.tex_coord),
                };
                self.make_vertex(v.coord(), &attributes)
            });
            self.draw_triangle(tri);
        }
    }

    fn make_vertex(&self, coord: Vec3, attributes: &VertexAttributes) -> ClipVertex {
        ClipVertex {
            coord: self.mvp * coord.extend(1.0),
            normal: self.model.transform_vector3(attributes.normal),
            color: attributes.color,
            tex_coord: attributes.tex_coord,
        }
    }

    fn draw_triangle(&mut self, mut tri: Triangle) {
        self.stats.submitted += 1;

        let light = if front_facing(&tri) {
            if !self.modes.contains(Mode::FrontFace) {
                self.stats.culled += 1;
                return;
            }
            self.light
        } else {
            if !self.modes.contains(Mode::BackFace) {
                self.stats.culled += 1;
                return;
            }
            -self.light
        };

        if self.modes.contains(Mode::Lighting) {
            for v in &mut tri {
                let diffuse = light.dot(v.normal).max(0.0);
                let f = self.ambient + (1.0 - self.ambient) * diffuse;
                v.color = (v.color.truncate() * f).extend(v.color.w);
            }
        }

        let smooth = self.modes.contains(Mode::Smooth);
        // clipping may move vertex 0, so take the flat color first
        let flat = tri[0].color;
        self.clip_buffer.clear();
        self.clip_buffer.push(tri);
        clip_triangles(&mut self.clip_buffer, smooth);
        self.clip_buffer
            .retain(|t| t.iter().all(|v| v.coord.w.abs() >= MIN_W));
        if self.clip_buffer.is_empty() {
            self.stats.clipped_away += 1;
            return;
        }

        let half_w = 0.5 * self.fb.width() as f32;
        let half_h = 0.5 * self.fb.height() as f32;
        for v in self.clip_buffer.iter_mut().flatten() {
            let ndc = v.coord.truncate() / v.coord.w;
            v.coord = Vec4::new((ndc.x + 1.0) * half_w, (1.0 - ndc.y) * half_h, ndc.z, 1.0);
        }

        let rasterize = raster::select(
            self.modes.depth_mode(),
            smooth,
            self.modes.contains(Mode::Blending),
            self.modes.contains(Mode::Texturing),
        );
        rasterize(
            &mut self.fb,
            self.textures.bound_texture(),
            &self.clip_buffer,
            flat,
        );
        self.stats.rasterized += 1;
    }

    // Textures

    /// Stores a texture and returns its handle.
    ///
    /// Free slots are reused. Returns [`TextureId::SENTINEL`] (and logs a
    /// warning) if a dimension is not a power of two or `texels` does not
    /// hold `width * height` entries.
    pub fn load_tex(&mut self, width: u32, height: u32, texels: &[u32]) -> TextureId {
        self.textures.load(width, height, texels)
    }

    /// Stores an already decoded texture. See [`load_tex`](Self::load_tex).
    pub fn load_texture(&mut self, texture: &Texture) -> TextureId {
        self.textures
            .load(texture.width(), texture.height(), texture.texels())
    }

    /// Binds a texture for texturing and returns the handle actually bound:
    /// `id` if it refers to a loaded texture, the sentinel otherwise.
    pub fn set_tex(&mut self, id: TextureId) -> TextureId {
        self.textures.bind(id)
    }

    pub fn tex(&self) -> TextureId {
        self.textures.bound()
    }

    /// Releases a texture slot for reuse. Unloading the bound texture binds
    /// the sentinel. Returns `false` if nothing was unloaded.
    pub fn unload_tex(&mut self, id: TextureId) -> bool {
        self.textures.unload(id)
    }

    // Frame buffer

    /// Sets the color used by [`clear`](Self::clear), clamped to `[0, 1]`.
    pub fn set_clear_color(&mut self, color: Vec4) {
        self.clear_rgba = color_to_rgba(color);
    }

    /// Clears the color plane, the depth plane, or both.
    pub fn clear(&mut self, color: bool, depth: bool) {
        if color {
            self.fb.clear_rgba(self.clear_rgba);
        }
        if depth {
            self.fb.clear_depth();
        }
    }

    /// The color plane, row-major with the top row first.
    pub fn rgba(&self) -> &[u32] {
        &self.fb.rgba
    }

    /// The color plane as bytes in native order, i.e. `R, G, B, A` per pixel
    /// on little-endian targets.
    pub fn rgba_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.fb.rgba)
    }

    #[cfg(test)]
    pub(crate) fn depth(&self) -> &[f32] {
        &self.fb.depth
    }

    /// Writes the color plane to an image file; the format follows the
    /// extension.
    pub fn save_image(&self, path: impl AsRef<Path>) -> Result<(), image::ImageError> {
        let bytes: Vec<u8> = self.fb.rgba.iter().flat_map(|px| px.to_le_bytes()).collect();
        image::save_buffer(
            path,
            &bytes,
            self.width(),
            self.height(),
            image::ColorType::Rgba8,
        )
    }

    // Statistics

    pub fn stats(&self) -> RenderStats {
        self.stats
    }

    pub fn reset_stats(&mut self) {
        self.stats = RenderStats::default();
    }
}

/// Whether the triangle winds counter-clockwise in normalized device
/// coordinates.
///
/// Uses the determinant of the homogeneous `(x, y, w)` coordinates, which has
/// the sign of the projected 2D cross product for vertices in front of the
/// viewer and needs no division.
fn front_facing(tri: &Triangle) -> bool {
    let [a, b, c] = tri.map(|v| Vec3::new(v.coord.x, v.coord.y, v.coord.w));
    a.dot(b.cross(c)) >= 0.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::VertexCNCT;

    const RED: Vec4 = Vec4::new(1.0, 0.0, 0.0, 1.0);
    const BLUE: Vec4 = Vec4::new(0.0, 0.0, 1.0, 1.0);

    fn draw_quad(ctx: &mut RenderContext, z: f32) {
        for [x, y] in [[-1.0, -1.0], [1.0, -1.0], [1.0, 1.0], [-1.0, -1.0], [1.0, 1.0], [-1.0, 1.0]] {
            ctx.set_tex_coord(Vec2::new((x + 1.0) / 2.0, (1.0 - y) / 2.0));
            ctx.draw_vertex(Vec3::new(x, y, z));
        }
    }

    fn draw_cw_quad(ctx: &mut RenderContext) {
        for [x, y] in [[-1.0, -1.0], [1.0, 1.0], [1.0, -1.0], [-1.0, -1.0], [-1.0, 1.0], [1.0, 1.0]] {
            ctx.draw_vertex(Vec3::new(x, y, 0.0));
        }
    }

    #[test]
    fn full_screen_triangle_is_opaque_red() {
        let mut ctx = RenderContext::new(2, 2);
        ctx.set_color(RED);
        for [x, y] in [[-1.0, -1.0], [3.0, -1.0], [-1.0, 3.0]] {
            ctx.draw_vertex(Vec3::new(x, y, 0.0));
        }
        assert_eq!(ctx.rgba(), &[0xff0000ff; 4]);
        assert_eq!(ctx.stats().rasterized, 1);
    }

    #[test]
    fn clear_fills_color_and_depth() {
        let mut ctx = RenderContext::new(2, 2);
        ctx.set_clear_color(BLUE);
        ctx.clear(true, true);
        assert_eq!(ctx.rgba(), &[0xffff0000; 4]);
        assert_eq!(ctx.depth(), &[1.0; 4]);
        assert_eq!(ctx.rgba_bytes()[..4], [0, 0, 255, 255]);

        ctx.set_clear_color(Vec4::new(2.0, -1.0, 0.0, 1.0));
        ctx.clear(true, false);
        assert_eq!(ctx.rgba(), &[0xff0000ff; 4]);
    }

    #[test]
    fn vertices_assemble_into_triangles() {
        let mut ctx = RenderContext::new(4, 4);
        let counts: Vec<usize> = (0..7)
            .map(|i| {
                ctx.draw_vertex(Vec3::new(i as f32 * 0.1, 0.0, 0.0));
                ctx.pending_vertices()
            })
            .collect();
        assert_eq!(counts, vec![1, 2, 0, 1, 2, 0, 1]);
        assert_eq!(ctx.stats().submitted, 2);
    }

    #[test]
    fn back_faces_are_culled_unless_enabled() {
        let mut ctx = RenderContext::new(2, 2);
        ctx.set_color(RED);
        draw_cw_quad(&mut ctx);
        assert_eq!(ctx.rgba(), &[0; 4]);
        assert_eq!(ctx.stats().culled, 2);

        ctx.enable(Mode::BackFace);
        ctx.disable(Mode::FrontFace);
        draw_cw_quad(&mut ctx);
        assert_eq!(ctx.rgba(), &[0xff0000ff; 4]);

        ctx.clear(true, true);
        draw_quad(&mut ctx, 0.0);
        assert_eq!(ctx.rgba(), &[0; 4]);
        assert_eq!(ctx.stats().culled, 4);
    }

    #[test]
    fn lighting_scales_rgb_only() {
        let mut ctx = RenderContext::new(2, 2);
        ctx.enable(Mode::Lighting);
        ctx.enable(Mode::Blending);
        ctx.set_color(Vec4::new(1.0, 1.0, 1.0, 1.0));
        ctx.set_normal(Vec3::Z);
        draw_quad(&mut ctx, 0.0);
        assert_eq!(ctx.rgba(), &[0xffffffff; 4]);

        ctx.clear(true, true);
        ctx.set_light(Vec3::NEG_Z);
        draw_quad(&mut ctx, 0.0);
        // ambient only: 0.2 * 255
        assert_eq!(ctx.rgba(), &[0xff333333; 4]);

        // back faces see the inverted light
        ctx.clear(true, true);
        ctx.enable(Mode::BackFace);
        ctx.set_light(Vec3::Z);
        draw_cw_quad(&mut ctx);
        assert_eq!(ctx.rgba(), &[0xff333333; 4]);
    }

    #[test]
    fn normals_follow_the_model_matrix() {
        let mut ctx = RenderContext::new(2, 2);
        ctx.set_normal(Vec3::Z);
        ctx.set_model(Mat4::from_rotation_y(std::f32::consts::FRAC_PI_2));
        let v = ctx.make_vertex(Vec3::ZERO, &ctx.attributes());
        assert!(v.normal.abs_diff_eq(Vec3::X, 1e-6));
    }

    #[test]
    fn depth_test_keeps_nearest_in_any_order() {
        for near_first in [true, false] {
            let mut ctx = RenderContext::new(2, 2);
            ctx.enable(Mode::DepthWrite);
            ctx.enable(Mode::DepthTest);
            let passes = if near_first {
                [(RED, -0.5), (BLUE, 0.5)]
            } else {
                [(BLUE, 0.5), (RED, -0.5)]
            };
            for (color, z) in passes {
                ctx.set_color(color);
                draw_quad(&mut ctx, z);
            }
            assert_eq!(ctx.rgba(), &[0xff0000ff; 4], "near first: {near_first}");
            assert!(ctx.depth().iter().all(|&d| (d + 0.5).abs() < 1e-6));
        }
    }

    #[test]
    fn textured_quad_shows_texels() {
        let texels = [0xff0000ff, 0xff00ff00, 0xffff0000, 0xffffffff];
        let mut ctx = RenderContext::new(2, 2);
        let id = ctx.load_tex(2, 2, &texels);
        assert_ne!(id, TextureId::SENTINEL);
        assert_eq!(ctx.set_tex(id), id);
        ctx.enable(Mode::Texturing);
        draw_quad(&mut ctx, 0.0);
        assert_eq!(ctx.rgba(), &texels);

        // the sentinel samples transparent black
        assert!(ctx.unload_tex(id));
        assert_eq!(ctx.tex(), TextureId::SENTINEL);
        draw_quad(&mut ctx, 0.0);
        assert_eq!(ctx.rgba(), &[0xff000000; 4]);
    }

    #[test]
    fn flat_color_survives_clipping() {
        let mut ctx = RenderContext::new(8, 8);
        // the blue vertex lies beyond x = 1, so the triangle is split in two
        let corners = [
            (RED, [-0.9, -0.9]),
            (Vec4::new(0.0, 1.0, 0.0, 1.0), [0.5, -0.9]),
            (BLUE, [1.5, 0.9]),
        ];
        for (color, [x, y]) in corners {
            ctx.set_color(color);
            ctx.draw_vertex(Vec3::new(x, y, 0.0));
        }
        let lit: Vec<u32> = ctx.rgba().iter().copied().filter(|&px| px != 0).collect();
        assert!(!lit.is_empty());
        assert!(lit.iter().all(|&px| px == 0xff0000ff), "{lit:x?}");

        // smooth shading still interpolates across the pieces
        ctx.clear(true, true);
        ctx.set_mode(Mode::Smooth, true);
        for (color, [x, y]) in corners {
            ctx.set_color(color);
            ctx.draw_vertex(Vec3::new(x, y, 0.0));
        }
        assert!(ctx.rgba().iter().any(|&px| px != 0 && px != 0xff0000ff));
    }

    #[test]
    fn blending_composites_translucent_texels() {
        let mut ctx = RenderContext::new(2, 2);
        ctx.set_clear_color(BLUE);
        ctx.clear(true, true);
        let id = ctx.load_tex(1, 1, &[0x80ffffff]);
        ctx.set_tex(id);
        ctx.enable(Mode::Texturing);
        ctx.enable(Mode::Blending);
        draw_quad(&mut ctx, 0.0);
        // half white over opaque blue
        assert_eq!(ctx.rgba(), &[0xffff8080; 4]);

        ctx.set_mode(Mode::Blending, false);
        draw_quad(&mut ctx, 0.0);
        assert_eq!(ctx.rgba(), &[0xffffffff; 4]);
    }

    #[test]
    fn rejected_texture_yields_sentinel() {
        let mut ctx = RenderContext::new(2, 2);
        assert_eq!(ctx.load_tex(3, 2, &[0; 6]), TextureId::SENTINEL);
        assert_eq!(ctx.set_tex(TextureId(9)), TextureId::SENTINEL);
    }

    #[test]
    fn set_view_keeps_camera_inverse() {
        let mut ctx = RenderContext::new(2, 2);
        let camera = Mat4::from_translation(Vec3::new(1.0, 2.0, 3.0));
        ctx.set_camera(camera).unwrap();
        assert!(ctx.view().abs_diff_eq(camera.inverse(), 1e-6));

        let view = Mat4::from_rotation_z(0.5);
        ctx.set_view(view).unwrap();
        assert!((ctx.camera() * ctx.view()).abs_diff_eq(Mat4::IDENTITY, 1e-6));

        let err = ctx.set_view(Mat4::ZERO);
        assert!(matches!(err, Err(MathError::SingularMatrix { .. })));
        assert_eq!(ctx.view(), view);
        assert!(ctx.set_camera(Mat4::from_scale(Vec3::new(1.0, 0.0, 1.0))).is_err());
        assert_eq!(ctx.view(), view);
    }

    #[test]
    fn perspective_projects_towards_center() {
        let mut ctx = RenderContext::new(8, 8);
        ctx.set_projection(math::perspective(std::f32::consts::FRAC_PI_2, 1.0, 0.1, 100.0));
        ctx.set_color(RED);
        // 5 units in front of the camera, covering the middle half of the view
        let tri = [[-2.5, -2.5], [2.5, -2.5], [0.0, 2.5]];
        for [x, y] in tri {
            ctx.draw_vertex(Vec3::new(x, y, -5.0));
        }
        assert_eq!(ctx.rgba()[4 * 8 + 3], 0xff0000ff);
        let lit: Vec<usize> = (0..64).filter(|&i| ctx.rgba()[i] != 0).collect();
        assert!(lit.iter().all(|&i| (2..6).contains(&(i % 8)) && (2..6).contains(&(i / 8))));

        // behind the camera: clipped away entirely
        ctx.enable(Mode::BackFace);
        for [x, y] in tri {
            ctx.draw_vertex(Vec3::new(x, y, 5.0));
        }
        assert_eq!(ctx.stats().clipped_away, 1);
    }

    #[test]
    fn draw_mesh_uses_vertex_attributes() {
        let mut ctx = RenderContext::new(2, 2);
        ctx.enable(Mode::Smooth);
        ctx.draw_vertex(Vec3::ZERO);

        let v = |x: f32, y: f32| VertexCNCT::new([x, y, 0.0], [0.0, 0.0, 1.0], [0.0, 0.0, 1.0, 1.0], [0.0, 0.0]);
        let mesh = Mesh::new(
            vec![v(-1.0, -1.0), v(1.0, -1.0), v(1.0, 1.0), v(-1.0, 1.0)],
            vec![0, 1, 2, 0, 2, 3],
        );
        ctx.draw_mesh(&mesh);
        assert_eq!(ctx.rgba(), &[0xffff0000; 4]);
        assert_eq!(ctx.pending_vertices(), 1);
        assert_eq!(ctx.attributes(), VertexAttributes::default());
        assert_eq!(ctx.stats().rasterized, 2);
    }

    #[test]
    fn config_sets_initial_state() {
        let ctx = RenderContext::with_config(
            ContextConfig::new()
                .size(3, 1)
                .clear_color(RED)
                .ambient(1.5)
                .enable(Mode::Smooth),
        );
        assert_eq!(ctx.rgba(), &[0xff0000ff; 3]);
        assert_eq!(ctx.ambient(), 1.0);
        assert!(ctx.is_enabled(Mode::Smooth) && ctx.is_enabled(Mode::FrontFace));
        assert_eq!(ctx.light(), Vec3::Z);
    }
}
