//! Loading triangle geometry from model files.
//!
//! Models are read into a [`Mesh<VertexCN>`] (coordinates and normals) that
//! can be drawn with [`RenderContext::draw_mesh`](crate::RenderContext::draw_mesh).
//! Colors and texture coordinates come from the context's attribute state.
//!
//! # Quick Start
//!
//! ```no_run
//! use softraster::GeometryLoader;
//!
//! let model = GeometryLoader::from_file("my_model.stl")
//!     .centered()      // Center at origin
//!     .normalized()    // Scale to fit in unit cube
//!     .build()
//!     .unwrap();
//! println!("{} triangles", model.triangle_count());
//! ```
//!
//! # Supported Formats
//!
//! | Format | Extensions | Notes |
//! |--------|------------|-------|
//! | STL    | `.stl`     | Binary and ASCII, no texture coordinates |

use crate::math::Normalize;
use crate::mesh::{Mesh, MeshVertex, VertexCN};
use glam::{Quat, Vec3};
use std::collections::HashMap;
use std::path::Path;

/// Errors that can occur when loading geometry.
#[derive(Debug)]
pub enum GeometryError {
    /// File could not be read.
    Io(std::io::Error),
    /// File format could not be determined from extension.
    UnknownFormat(String),
    /// The geometry data was invalid or corrupt.
    ParseError(String),
}

impl std::fmt::Display for GeometryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GeometryError::Io(e) => write!(f, "IO error: {}", e),
            GeometryError::UnknownFormat(ext) => {
                write!(f, "Unknown geometry format: '{}'", ext)
            }
            GeometryError::ParseError(msg) => write!(f, "Parse error: {}", msg),
        }
    }
}

impl std::error::Error for GeometryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            GeometryError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for GeometryError {
    fn from(e: std::io::Error) -> Self {
        GeometryError::Io(e)
    }
}

impl Mesh<VertexCN> {
    /// Computes the axis-aligned bounding box.
    ///
    /// Returns `(min, max)` corners of the bounding box.
    pub fn bounds(&self) -> (Vec3, Vec3) {
        self.vertices.iter().fold(
            (Vec3::splat(f32::INFINITY), Vec3::splat(f32::NEG_INFINITY)),
            |(min, max), v| {
                let p = Vec3::from(v.coord);
                (min.min(p), max.max(p))
            },
        )
    }

    /// Returns the center of the bounding box.
    pub fn center(&self) -> Vec3 {
        let (min, max) = self.bounds();
        (min + max) * 0.5
    }

    /// Returns the size of the bounding box.
    pub fn size(&self) -> Vec3 {
        let (min, max) = self.bounds();
        max - min
    }

    /// Translates all vertices by the given offset.
    pub fn translate(&mut self, offset: Vec3) {
        for v in &mut self.vertices {
            v.coord = (Vec3::from(v.coord) + offset).into();
        }
    }

    /// Scales all vertices uniformly around the origin.
    pub fn scale(&mut self, factor: f32) {
        for v in &mut self.vertices {
            v.coord = (Vec3::from(v.coord) * factor).into();
        }
    }

    /// Rotates all vertices and normals by the given quaternion.
    pub fn rotate(&mut self, rotation: Quat) {
        for v in &mut self.vertices {
            v.coord = (rotation * Vec3::from(v.coord)).into();
            v.normal = (rotation * Vec3::from(v.normal)).into();
        }
    }

    /// Centers the geometry at the origin.
    pub fn recenter(&mut self) {
        if self.vertices.is_empty() {
            return;
        }
        let center = self.center();
        self.translate(-center);
    }

    /// Scales the geometry to fit within a unit cube (-0.5 to 0.5 once
    /// centered).
    pub fn normalize(&mut self) {
        let size = self.size();
        let max_dim = size.max_element();
        if max_dim > 0.0 {
            self.scale(1.0 / max_dim);
        }
    }

    /// Recalculates vertex normals from face geometry.
    ///
    /// Each vertex gets the area-weighted average normal of all triangles
    /// touching its position, so faces that only share coordinates (as in
    /// STL files) are smoothed too.
    pub fn recalculate_normals(&mut self) {
        let mut sums: HashMap<[u32; 3], Vec3> = HashMap::new();
        for [a, b, c] in self.triangles() {
            let (p0, p1, p2) = (a.coord(), b.coord(), c.coord());
            let face_normal = (p1 - p0).cross(p2 - p0);
            for p in [p0, p1, p2] {
                *sums.entry(position_key(p)).or_default() += face_normal;
            }
        }

        for v in &mut self.vertices {
            let sum = sums
                .get(&position_key(Vec3::from(v.coord)))
                .copied()
                .unwrap_or_default();
            v.normal = sum.normalized_or_zero().into();
        }
    }
}

fn position_key(p: Vec3) -> [u32; 3] {
    // -0.0 and 0.0 share a key
    p.to_array().map(|c| (c + 0.0).to_bits())
}

/// A fluent builder for loading and transforming geometry.
///
/// Transformations are applied by [`build`](Self::build) in a fixed order:
/// centering, rotation, normalization, scaling, normal recalculation,
/// translation. Loading errors are reported by `build` as well.
///
/// # Example
///
/// ```no_run
/// use softraster::GeometryLoader;
///
/// let mesh = GeometryLoader::from_stl("model.stl")
///     .upright()            // Z-up to Y-up
///     .centered()           // Move to origin
///     .normalized()         // Fit in unit cube
///     .smooth_normals()     // Recalculate smooth normals
///     .build()
///     .unwrap();
/// ```
#[derive(Debug)]
pub struct GeometryLoader {
    result: Result<Mesh<VertexCN>, GeometryError>,
    center: bool,
    normalize: bool,
    smooth_normals: bool,
    scale_factor: Option<f32>,
    translation: Option<Vec3>,
    rotation: Option<Quat>,
}

impl GeometryLoader {
    fn with_result(result: Result<Mesh<VertexCN>, GeometryError>) -> Self {
        Self {
            result,
            center: false,
            normalize: false,
            smooth_normals: false,
            scale_factor: None,
            translation: None,
            rotation: None,
        }
    }

    /// Loads geometry from a file, detecting the format from its extension.
    pub fn from_file(path: impl AsRef<Path>) -> Self {
        Self::with_result(load_file(path.as_ref()))
    }

    /// Loads an STL file regardless of its extension.
    pub fn from_stl(path: impl AsRef<Path>) -> Self {
        Self::with_result(load_stl_file(path.as_ref()))
    }

    /// Loads STL geometry from raw bytes, e.g. from `include_bytes!`.
    pub fn from_stl_bytes(bytes: &[u8]) -> Self {
        Self::with_result(parse_stl(&mut std::io::Cursor::new(bytes)))
    }

    /// Starts from an existing mesh.
    pub fn from_mesh(mesh: Mesh<VertexCN>) -> Self {
        Self::with_result(Ok(mesh))
    }

    /// Centers the geometry at the origin.
    pub fn centered(mut self) -> Self {
        self.center = true;
        self
    }

    /// Scales the geometry to fit within a unit cube.
    pub fn normalized(mut self) -> Self {
        self.normalize = true;
        self
    }

    /// Recalculates smooth vertex normals.
    pub fn smooth_normals(mut self) -> Self {
        self.smooth_normals = true;
        self
    }

    /// Applies a uniform scale factor.
    pub fn scaled(mut self, factor: f32) -> Self {
        self.scale_factor = Some(factor);
        self
    }

    /// Translates the geometry by the given offset.
    pub fn translated(mut self, offset: Vec3) -> Self {
        self.translation = Some(offset);
        self
    }

    /// Reorients the geometry from Z-up to Y-up.
    pub fn upright(mut self) -> Self {
        // -90 degrees around X
        self.rotation = Some(Quat::from_rotation_x(-std::f32::consts::FRAC_PI_2));
        self
    }

    /// Rotates the geometry by a custom quaternion.
    pub fn rotated_by(mut self, rotation: Quat) -> Self {
        self.rotation = Some(rotation);
        self
    }

    /// Applies the requested transformations and returns the mesh.
    pub fn build(self) -> Result<Mesh<VertexCN>, GeometryError> {
        let mut mesh = self.result?;

        if self.center {
            mesh.recenter();
        }
        if let Some(rotation) = self.rotation {
            mesh.rotate(rotation);
        }
        if self.normalize {
            mesh.normalize();
        }
        if let Some(scale) = self.scale_factor {
            mesh.scale(scale);
        }
        if self.smooth_normals {
            mesh.recalculate_normals();
        }
        if let Some(offset) = self.translation {
            mesh.translate(offset);
        }
        Ok(mesh)
    }
}

fn load_file(path: &Path) -> Result<Mesh<VertexCN>, GeometryError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|s| s.to_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "stl" => load_stl_file(path),
        _ => Err(GeometryError::UnknownFormat(ext)),
    }
}

fn load_stl_file(path: &Path) -> Result<Mesh<VertexCN>, GeometryError> {
    let file = std::fs::File::open(path)?;
    let mut reader = std::io::BufReader::new(file);
    let mesh = parse_stl(&mut reader)?;
    log::debug!(
        "Loaded {} triangles from {}",
        mesh.triangle_count(),
        path.display()
    );
    Ok(mesh)
}

/// Reads an STL stream into a non-indexed mesh with flat face normals.
fn parse_stl<R: std::io::Read + std::io::Seek>(
    reader: &mut R,
) -> Result<Mesh<VertexCN>, GeometryError> {
    let stl = stl_io::read_stl(reader)
        .map_err(|e| GeometryError::ParseError(format!("STL parse error: {}", e)))?;

    let mut vertices = Vec::with_capacity(stl.faces.len() * 3);
    for face in &stl.faces {
        let normal: [f32; 3] = face.normal.into();
        for &vertex_idx in &face.vertices {
            let vertex = stl.vertices.get(vertex_idx).ok_or_else(|| {
                GeometryError::ParseError(format!("vertex index {} out of range", vertex_idx))
            })?;
            vertices.push(VertexCN::new((*vertex).into(), normal));
        }
    }

    Ok(Mesh::new(vertices, Vec::new()))
}
