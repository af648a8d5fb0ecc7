//! Clipping of triangles against the canonical view volume.
//!
//! Clipping happens in homogeneous clip coordinates, before the perspective
//! divide, against the six planes `±x = w`, `±y = w`, `±z = w`.

use super::{ClipVertex, Triangle};
use crate::plane::Plane;
use glam::Vec3;

/// Boundary planes of the view volume, normals pointing out of it.
pub(crate) const CLIP_PLANES: [Plane; 6] = [
    Plane::from_unit(Vec3::X, 1.0),
    Plane::from_unit(Vec3::NEG_X, 1.0),
    Plane::from_unit(Vec3::Y, 1.0),
    Plane::from_unit(Vec3::NEG_Y, 1.0),
    Plane::from_unit(Vec3::Z, 1.0),
    Plane::from_unit(Vec3::NEG_Z, 1.0),
];

/// Result of clipping one triangle against one plane.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) enum ClipResult {
    /// Completely outside; the triangle must be removed.
    Outside,
    /// Completely inside; unchanged.
    Inside,
    /// One vertex inside; the triangle was shrunk in place.
    Shrunk,
    /// Two vertices inside; the triangle was shrunk in place and a second
    /// one covering the rest must be added.
    Split(Triangle),
}

/// Clips `tris` against all planes of the view volume in place.
///
/// `smooth` selects whether colors are interpolated at new vertices or copied
/// from the inside vertex of the cut edge.
pub(crate) fn clip_triangles(tris: &mut Vec<Triangle>, smooth: bool) {
    for plane in &CLIP_PLANES {
        clip_against(tris, plane, smooth);
        if tris.is_empty() {
            break;
        }
    }
}

/// Clips every triangle in `tris` against `plane`.
///
/// Triangles produced by splits are appended and not visited again in this
/// pass. Removal swaps the last triangle into the freed position.
pub(crate) fn clip_against(tris: &mut Vec<Triangle>, plane: &Plane, smooth: bool) {
    let mut pending = tris.len();
    let mut i = 0;
    while i < pending {
        match clip_triangle(&mut tris[i], plane, smooth) {
            ClipResult::Inside | ClipResult::Shrunk => i += 1,
            ClipResult::Split(extra) => {
                tris.push(extra);
                i += 1;
            }
            ClipResult::Outside => {
                let appended = tris.len() > pending;
                tris.swap_remove(i);
                if appended {
                    // an already clipped triangle moved into slot i
                    i += 1;
                } else {
                    pending -= 1;
                }
            }
        }
    }
}

/// Clips a single triangle against `plane`.
///
/// A vertex is inside when its homogeneous distance to the plane is not
/// positive. Vertex order and thereby winding is preserved by all cases.
pub(crate) fn clip_triangle(tri: &mut Triangle, plane: &Plane, smooth: bool) -> ClipResult {
    let [v0, v1, v2] = *tri;
    let d0 = -plane.signed_distance_h(v0.coord);
    let d1 = -plane.signed_distance_h(v1.coord);
    let d2 = -plane.signed_distance_h(v2.coord);
    // point on the edge from inside vertex `a` towards `b`
    let cut = |a: &ClipVertex, da: f32, b: &ClipVertex, db: f32| a.lerp(b, da / (da - db), smooth);

    match (d0 >= 0.0, d1 >= 0.0, d2 >= 0.0) {
        (false, false, false) => ClipResult::Outside,
        (true, true, true) => ClipResult::Inside,
        (true, false, false) => {
            *tri = [v0, cut(&v0, d0, &v1, d1), cut(&v0, d0, &v2, d2)];
            ClipResult::Shrunk
        }
        (false, true, false) => {
            *tri = [cut(&v1, d1, &v0, d0), v1, cut(&v1, d1, &v2, d2)];
            ClipResult::Shrunk
        }
        (false, false, true) => {
            *tri = [cut(&v2, d2, &v0, d0), cut(&v2, d2, &v1, d1), v2];
            ClipResult::Shrunk
        }
        (true, true, false) => {
            let p20 = cut(&v2, d2, &v0, d0);
            let p21 = cut(&v2, d2, &v1, d1);
            *tri = [v0, v1, p20];
            ClipResult::Split([p20, v1, p21])
        }
        (true, false, true) => {
            let p10 = cut(&v1, d1, &v0, d0);
            let p12 = cut(&v1, d1, &v2, d2);
            *tri = [v0, p12, v2];
            ClipResult::Split([v0, p10, p12])
        }
        (false, true, true) => {
            let p02 = cut(&v0, d0, &v2, d2);
            let p01 = cut(&v0, d0, &v1, d1);
            *tri = [p01, v1, v2];
            ClipResult::Split([p02, p01, v2])
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::{Vec2, Vec4};

    fn vertex(x: f32, y: f32, z: f32) -> ClipVertex {
        ClipVertex {
            coord: Vec4::new(x, y, z, 1.0),
            color: Vec4::new(x, y, z, 1.0),
            tex_coord: Vec2::new(x, y),
            ..Default::default()
        }
    }

    fn triangle(coords: [[f32; 2]; 3]) -> Triangle {
        coords.map(|[x, y]| vertex(x, y, 0.0))
    }

    fn signed_area(tri: &Triangle) -> f32 {
        let [a, b, c] = tri.map(|v| v.coord.truncate().truncate());
        0.5 * (b - a).perp_dot(c - a)
    }

    fn total_area(tris: &[Triangle]) -> f32 {
        tris.iter().map(signed_area).sum()
    }

    #[test]
    fn inside_triangle_is_unchanged() {
        let tri = triangle([[-0.5, -0.5], [0.5, -0.5], [0.0, 0.5]]);
        let mut tris = vec![tri];
        clip_triangles(&mut tris, true);
        assert_eq!(tris, vec![tri]);
    }

    #[test]
    fn outside_triangle_is_removed() {
        let mut tris = vec![triangle([[2.0, 0.0], [3.0, 0.0], [2.5, 0.5]])];
        clip_triangles(&mut tris, true);
        assert!(tris.is_empty());

        let mut behind = vec![[vertex(0.0, 0.0, -2.0), vertex(0.5, 0.0, -2.0), vertex(0.0, 0.5, -3.0)]];
        clip_triangles(&mut behind, false);
        assert!(behind.is_empty());
    }

    #[test]
    fn one_vertex_inside_shrinks() {
        let mut tri = triangle([[0.0, 0.0], [3.0, 0.0], [0.0, 3.0]]);
        let plane = CLIP_PLANES[0];
        // only vertex 1 is beyond x = 1
        let mut tris = vec![tri];
        clip_against(&mut tris, &plane, true);
        assert_eq!(tris.len(), 2);

        let mut tri2 = triangle([[0.0, 0.0], [3.0, 0.0], [3.0, 3.0]]);
        assert_eq!(clip_triangle(&mut tri2, &plane, true), ClipResult::Shrunk);
        assert!(tri2[1].coord.abs_diff_eq(Vec4::new(1.0, 0.0, 0.0, 1.0), 1e-6));
        assert!(tri2[2].coord.abs_diff_eq(Vec4::new(1.0, 1.0, 0.0, 1.0), 1e-6));
        assert!(tri2[2].color.abs_diff_eq(Vec4::new(1.0, 1.0, 0.0, 1.0), 1e-6));
        assert!(tri2[2].tex_coord.abs_diff_eq(Vec2::new(1.0, 1.0), 1e-6));
        assert_eq!(tri2[1].normal, Vec3::ZERO);

        tri = triangle([[3.0, 0.0], [0.0, 0.0], [3.0, 3.0]]);
        assert_eq!(clip_triangle(&mut tri, &plane, false), ClipResult::Shrunk);
        // flat shading copies the inside vertex's color
        assert_eq!(tri[0].color, tri[1].color);
        assert!(tri[0].coord.abs_diff_eq(Vec4::new(1.0, 0.0, 0.0, 1.0), 1e-6));
    }

    #[test]
    fn two_vertices_inside_split_and_keep_winding() {
        let patterns = [
            [[0.0, 0.0], [0.5, 0.0], [3.0, 2.0]],
            [[0.0, 0.0], [3.0, -1.0], [0.5, 1.0]],
            [[3.0, 0.0], [0.0, 0.0], [0.5, 1.0]],
        ];
        for coords in patterns {
            let mut tri = triangle(coords);
            let before = signed_area(&tri);
            match clip_triangle(&mut tri, &CLIP_PLANES[0], true) {
                ClipResult::Split(extra) => {
                    for t in [tri, extra] {
                        assert!(signed_area(&t) * before > 0.0, "{coords:?}");
                        assert!(t.iter().all(|v| v.coord.x <= 1.0 + 1e-6));
                    }
                }
                other => panic!("{coords:?} gave {other:?}"),
            }
        }
    }

    #[test]
    fn oversized_triangle_is_cut_to_viewport() {
        let mut tris = vec![triangle([[-1.0, -1.0], [3.0, -1.0], [-1.0, 3.0]])];
        clip_triangles(&mut tris, true);
        assert!(!tris.is_empty());
        for t in &tris {
            assert!(t.iter().all(|v| v.coord.abs().max_element() <= 1.0 + 1e-6));
        }
        // the clipped pieces exactly cover the square [-1, 1]²
        assert!((total_area(&tris) - 4.0).abs() < 1e-4);
    }

    #[test]
    fn appended_triangles_survive_removals() {
        let inside = triangle([[-0.5, -0.5], [0.5, -0.5], [0.0, 0.5]]);
        let split = triangle([[0.0, 0.0], [0.5, 0.0], [3.0, 2.0]]);
        let outside = triangle([[2.0, 0.0], [3.0, 0.0], [2.5, 0.5]]);
        let mut tris = vec![split, outside, inside, outside];
        clip_against(&mut tris, &CLIP_PLANES[0], true);
        assert_eq!(tris.len(), 3);
        assert!(tris.contains(&inside));
        assert!(tris.iter().all(|t| t.iter().all(|v| v.coord.x <= 1.0 + 1e-6)));
    }
}
