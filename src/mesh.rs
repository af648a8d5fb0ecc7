//! Triangle meshes with statically chosen vertex attributes.
//!
//! This module provides the geometry containers fed to
//! [`RenderContext::draw_mesh`](crate::RenderContext::draw_mesh):
//!
//! - [`MeshVertex`]: The trait describing which attributes a vertex carries
//! - [`VertexC`], [`VertexCN`], [`VertexCNT`], [`VertexCNCT`]: Ready-made vertex
//!   formats (coordinate, normal, color, texture coordinate)
//! - [`Mesh`]: A vertex list plus an optional index list
//!
//! # Creating Meshes
//!
//! ```
//! use softraster::{Mesh, VertexCN, VertexCNT};
//!
//! // Built-in primitives
//! let sphere: Mesh<VertexCNT> = Mesh::sphere(3);
//! let cube: Mesh<VertexCN> = Mesh::cube();
//!
//! // Custom, non-indexed geometry: every three vertices form a triangle
//! let triangle = Mesh::new(
//!     vec![
//!         VertexCN::new([0.0, 1.0, 0.0], [0.0, 0.0, 1.0]),
//!         VertexCN::new([-1.0, -1.0, 0.0], [0.0, 0.0, 1.0]),
//!         VertexCN::new([1.0, -1.0, 0.0], [0.0, 0.0, 1.0]),
//!     ],
//!     Vec::new(),
//! );
//! assert_eq!(triangle.triangle_count(), 1);
//! ```
//!
//! # Winding Order
//!
//! All built-in primitives use counter-clockwise (CCW) winding, seen from
//! outside, for front faces. Custom meshes should follow this convention for
//! correct face culling.

use crate::math::Normalize;
use glam::{Vec2, Vec3, Vec4};

/// A vertex format usable in a [`Mesh`].
///
/// Every vertex has a coordinate; the remaining attributes are optional. When
/// a mesh is drawn, attributes a format lacks are taken from the render
/// context's current attribute state.
pub trait MeshVertex: Copy {
    /// Builds a vertex from a full attribute set, dropping what the format
    /// does not store.
    fn from_attributes(coord: Vec3, normal: Vec3, tex_coord: Vec2) -> Self;

    fn coord(&self) -> Vec3;

    fn normal(&self) -> Option<Vec3> {
        None
    }

    fn color(&self) -> Option<Vec4> {
        None
    }

    fn tex_coord(&self) -> Option<Vec2> {
        None
    }
}

/// Coordinate only.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct VertexC {
    pub coord: [f32; 3],
}

/// Coordinate and normal.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct VertexCN {
    pub coord: [f32; 3],
    pub normal: [f32; 3],
}

/// Coordinate, normal and texture coordinate.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct VertexCNT {
    pub coord: [f32; 3],
    pub normal: [f32; 3],
    pub tex_coord: [f32; 2],
}

/// Coordinate, normal, RGBA color and texture coordinate.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct VertexCNCT {
    pub coord: [f32; 3],
    pub normal: [f32; 3],
    pub color: [f32; 4],
    pub tex_coord: [f32; 2],
}

impl VertexC {
    pub fn new(coord: [f32; 3]) -> Self {
        Self { coord }
    }
}

impl VertexCN {
    pub fn new(coord: [f32; 3], normal: [f32; 3]) -> Self {
        Self { coord, normal }
    }
}

impl VertexCNT {
    pub fn new(coord: [f32; 3], normal: [f32; 3], tex_coord: [f32; 2]) -> Self {
        Self {
            coord,
            normal,
            tex_coord,
        }
    }
}

impl VertexCNCT {
    pub fn new(coord: [f32; 3], normal: [f32; 3], color: [f32; 4], tex_coord: [f32; 2]) -> Self {
        Self {
            coord,
            normal,
            color,
            tex_coord,
        }
    }
}

impl MeshVertex for VertexC {
    fn from_attributes(coord: Vec3, _normal: Vec3, _tex_coord: Vec2) -> Self {
        Self::new(coord.into())
    }

    fn coord(&self) -> Vec3 {
        Vec3::from(self.coord)
    }
}

impl MeshVertex for VertexCN {
    fn from_attributes(coord: Vec3, normal: Vec3, _tex_coord: Vec2) -> Self {
        Self::new(coord.into(), normal.into())
    }

    fn coord(&self) -> Vec3 {
        Vec3::from(self.coord)
    }

    fn normal(&self) -> Option<Vec3> {
        Some(Vec3::from(self.normal))
    }
}

impl MeshVertex for VertexCNT {
    fn from_attributes(coord: Vec3, normal: Vec3, tex_coord: Vec2) -> Self {
        Self::new(coord.into(), normal.into(), tex_coord.into())
    }

    fn coord(&self) -> Vec3 {
        Vec3::from(self.coord)
    }

    fn normal(&self) -> Option<Vec3> {
        Some(Vec3::from(self.normal))
    }

    fn tex_coord(&self) -> Option<Vec2> {
        Some(Vec2::from(self.tex_coord))
    }
}

impl MeshVertex for VertexCNCT {
    /// The color defaults to opaque white.
    fn from_attributes(coord: Vec3, normal: Vec3, tex_coord: Vec2) -> Self {
        Self::new(coord.into(), normal.into(), [1.0; 4], tex_coord.into())
    }

    fn coord(&self) -> Vec3 {
        Vec3::from(self.coord)
    }

    fn normal(&self) -> Option<Vec3> {
        Some(Vec3::from(self.normal))
    }

    fn color(&self) -> Option<Vec4> {
        Some(Vec4::from(self.color))
    }

    fn tex_coord(&self) -> Option<Vec2> {
        Some(Vec2::from(self.tex_coord))
    }
}

/// A triangle mesh.
///
/// With an empty index list every three consecutive vertices form a triangle;
/// otherwise every three consecutive indices do. Trailing vertices or indices
/// that do not complete a triangle are ignored.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Mesh<V> {
    pub vertices: Vec<V>,
    pub indices: Vec<u32>,
}

impl<V: MeshVertex> Mesh<V> {
    pub fn new(vertices: Vec<V>, indices: Vec<u32>) -> Self {
        Self { vertices, indices }
    }

    pub fn is_indexed(&self) -> bool {
        !self.indices.is_empty()
    }

    pub fn triangle_count(&self) -> usize {
        if self.is_indexed() {
            self.indices.len() / 3
        } else {
            self.vertices.len() / 3
        }
    }

    /// Iterates the triangles in submission order.
    ///
    /// Triangles referencing an out-of-range index are skipped.
    pub fn triangles(&self) -> impl Iterator<Item = [&V; 3]> + '_ {
        (0..self.triangle_count()).filter_map(move |t| {
            let base = 3 * t;
            if self.is_indexed() {
                let idx = &self.indices[base..base + 3];
                Some([
                    self.vertices.get(idx[0] as usize)?,
                    self.vertices.get(idx[1] as usize)?,
                    self.vertices.get(idx[2] as usize)?,
                ])
            } else {
                Some([
                    &self.vertices[base],
                    &self.vertices[base + 1],
                    &self.vertices[base + 2],
                ])
            }
        })
    }

    /// Creates a unit sphere by recursive subdivision of an octahedron.
    ///
    /// Each of the eight octants is split `depth` times into four triangles,
    /// giving `8 · 4^depth` triangles (non-indexed). Normals equal the
    /// coordinates. Texture coordinates wrap the image once around each half:
    /// the front half (`z ≥ 0`) and the back half (`z ≤ 0`) each span the
    /// full `u` range, `v` runs from bottom (`y = -1`, `v = 0`) to top.
    ///
    /// # Example
    ///
    /// ```
    /// use softraster::{Mesh, VertexCNT};
    ///
    /// let sphere: Mesh<VertexCNT> = Mesh::sphere(2);
    /// assert_eq!(sphere.vertices.len(), 8 * 16 * 3);
    /// ```
    pub fn sphere(depth: u32) -> Self {
        let (x, y, z) = (Vec3::X, Vec3::Y, Vec3::Z);
        // (corners, front half)
        let octants = [
            ([x, -z, y], false),
            ([-z, -x, y], false),
            ([-x, z, y], true),
            ([z, x, y], true),
            ([-z, x, -y], false),
            ([-x, -z, -y], false),
            ([z, -x, -y], true),
            ([x, z, -y], true),
        ];

        let mut vertices = Vec::with_capacity(24 * 4usize.pow(depth));
        for ([a, b, c], front) in octants {
            sphere_patch(&mut vertices, depth, front, a, b, c);
        }
        Self::new(vertices, Vec::new())
    }

    /// Creates a unit cube centered at the origin.
    ///
    /// The cube spans from -0.5 to 0.5 on all axes. Each face has its own four
    /// vertices (flat normals, full `[0, 1]` texture range) and two indexed
    /// triangles.
    pub fn cube() -> Self {
        // (normal, u axis, v axis) with u × v = normal
        let faces = [
            (Vec3::Z, Vec3::X, Vec3::Y),
            (Vec3::NEG_Z, Vec3::NEG_X, Vec3::Y),
            (Vec3::Y, Vec3::X, Vec3::NEG_Z),
            (Vec3::NEG_Y, Vec3::X, Vec3::Z),
            (Vec3::X, Vec3::NEG_Z, Vec3::Y),
            (Vec3::NEG_X, Vec3::Z, Vec3::Y),
        ];
        let corners = [(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)];

        let mut vertices = Vec::with_capacity(24);
        let mut indices = Vec::with_capacity(36);
        for (normal, u, v) in faces {
            let base = vertices.len() as u32;
            for (s, t) in corners {
                let coord = 0.5 * normal + (s - 0.5) * u + (t - 0.5) * v;
                vertices.push(V::from_attributes(coord, normal, Vec2::new(s, 1.0 - t)));
            }
            indices.extend_from_slice(&[base, base + 1, base + 2, base + 2, base + 3, base]);
        }
        Self::new(vertices, indices)
    }
}

fn sphere_patch<V: MeshVertex>(out: &mut Vec<V>, depth: u32, front: bool, a: Vec3, b: Vec3, c: Vec3) {
    if depth == 0 {
        for p in [a, b, c] {
            out.push(sphere_vertex(p, front));
        }
        return;
    }
    let ab = (a + b).normalized_or_zero();
    let bc = (b + c).normalized_or_zero();
    let ca = (c + a).normalized_or_zero();
    sphere_patch(out, depth - 1, front, a, ab, ca);
    sphere_patch(out, depth - 1, front, b, bc, ab);
    sphere_patch(out, depth - 1, front, c, ca, bc);
    sphere_patch(out, depth - 1, front, ab, bc, ca);
}

fn sphere_vertex<V: MeshVertex>(p: Vec3, front: bool) -> V {
    let around = Vec2::new(p.x, p.z).normalized_or_zero();
    let angle = 0.5 * around.x.clamp(-1.0, 1.0).acos() / std::f32::consts::PI;
    let u = if front { 1.0 - angle } else { angle };
    V::from_attributes(p, p, Vec2::new(u, 0.5 * p.y + 0.5))
}
