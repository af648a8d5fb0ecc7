//! Scanline rasterization of screen-space triangles.
//!
//! Every combination of depth mode, shading, blending and texturing is a
//! separate monomorphized instance of [`rasterize`]; [`select`] picks the
//! instance once per triangle batch so the per-pixel loop carries no mode
//! branches.
//!
//! Coverage follows the pixel-center rule: a row is covered when its center
//! `y + 0.5` lies in `[y_top, y_bottom)`, a pixel of a covered row when its
//! center `x + 0.5` lies in `[x_left, x_right)`. Triangles sharing an edge thus
//! never both draw the pixels along it.

use super::frame_buffer::FrameBuffer;
use super::modes::DepthMode;
use super::{ClipVertex, Triangle};
use crate::color::{color_to_rgba, rgba_to_color};
use crate::texture::Texture;
use glam::Vec4;

const DEPTH_OFF: u8 = 0;
const DEPTH_WRITE: u8 = 1;
const DEPTH_TEST: u8 = 2;

/// Triangles with a smaller screen-space height are skipped.
const MIN_HEIGHT: f32 = 1e-10;

/// A rasterizer for a batch of screen-space triangles cut from one source
/// triangle; the last argument is its flat shading color.
pub(crate) type RasterFn = fn(&mut FrameBuffer, &Texture, &[Triangle], Vec4);

/// Picks the rasterizer instance for the given modes.
pub(crate) fn select(depth: DepthMode, smooth: bool, blend: bool, tex: bool) -> RasterFn {
    log::trace!(
        "Rasterizer: depth {:?}, smooth {}, blend {}, tex {}",
        depth,
        smooth,
        blend,
        tex
    );
    match depth {
        DepthMode::Off => select_shading::<DEPTH_OFF>(smooth, blend, tex),
        DepthMode::Write => select_shading::<DEPTH_WRITE>(smooth, blend, tex),
        DepthMode::Test => select_shading::<DEPTH_TEST>(smooth, blend, tex),
    }
}

fn select_shading<const DEPTH: u8>(smooth: bool, blend: bool, tex: bool) -> RasterFn {
    match (smooth, blend, tex) {
        (false, false, false) => rasterize::<DEPTH, false, false, false>,
        (true, false, false) => rasterize::<DEPTH, true, false, false>,
        (false, true, false) => rasterize::<DEPTH, false, true, false>,
        (true, true, false) => rasterize::<DEPTH, true, true, false>,
        (false, false, true) => rasterize::<DEPTH, false, false, true>,
        (true, false, true) => rasterize::<DEPTH, true, false, true>,
        (false, true, true) => rasterize::<DEPTH, false, true, true>,
        (true, true, true) => rasterize::<DEPTH, true, true, true>,
    }
}

/// Rasterizes triangles whose coordinates are already in screen space
/// (`x`, `y` in pixels, `z` as depth).
///
/// Without smooth shading every pixel gets `flat`, so all pieces of a clipped
/// triangle share one color.
pub(crate) fn rasterize<const DEPTH: u8, const SMOOTH: bool, const BLEND: bool, const TEX: bool>(
    fb: &mut FrameBuffer,
    texture: &Texture,
    tris: &[Triangle],
    flat: Vec4,
) {
    for tri in tris {
        let [mut top, mut mid, mut bot] = *tri;
        if top.coord.y > mid.coord.y {
            std::mem::swap(&mut top, &mut mid);
        }
        if mid.coord.y > bot.coord.y {
            std::mem::swap(&mut mid, &mut bot);
        }
        if top.coord.y > mid.coord.y {
            std::mem::swap(&mut top, &mut mid);
        }

        let height = bot.coord.y - top.coord.y;
        if height.is_nan() || height < MIN_HEIGHT {
            continue;
        }

        // long edge at the height of the middle vertex
        let long = mix::<SMOOTH, TEX>(&top, &bot, (mid.coord.y - top.coord.y) / height);
        let (left, right) = if mid.coord.x <= long.coord.x {
            (mid, long)
        } else {
            (long, mid)
        };

        let mut raster = Rasterizer::<DEPTH, SMOOTH, BLEND, TEX> {
            fb: &mut *fb,
            texture,
            flat,
        };
        raster.trapezoid((&top, &top), (&left, &right));
        raster.trapezoid((&left, &right), (&bot, &bot));
    }
}

struct Rasterizer<'a, const DEPTH: u8, const SMOOTH: bool, const BLEND: bool, const TEX: bool> {
    fb: &'a mut FrameBuffer,
    texture: &'a Texture,
    flat: Vec4,
}

impl<const DEPTH: u8, const SMOOTH: bool, const BLEND: bool, const TEX: bool>
    Rasterizer<'_, DEPTH, SMOOTH, BLEND, TEX>
{
    /// Fills the area between the edge `start` (upper) and `end` (lower),
    /// each given as a (left, right) vertex pair.
    fn trapezoid(&mut self, start: (&ClipVertex, &ClipVertex), end: (&ClipVertex, &ClipVertex)) {
        let y0 = start.0.coord.y;
        let y1 = end.0.coord.y;
        let dy = y1 - y0;
        let (first, last) = pixel_range(y0, y1, self.fb.height());

        for y in first..last {
            let t = (y as f32 + 0.5 - y0) / dy;
            let l = mix::<SMOOTH, TEX>(start.0, end.0, t);
            let r = mix::<SMOOTH, TEX>(start.1, end.1, t);
            self.span(y, &l, &r);
        }
    }

    fn span(&mut self, y: usize, l: &ClipVertex, r: &ClipVertex) {
        let x0 = l.coord.x;
        let dx = r.coord.x - x0;
        let (first, last) = pixel_range(x0, r.coord.x, self.fb.width());
        let row = y * self.fb.width();

        for x in first..last {
            let idx = row + x;
            let s = if dx > 0.0 { (x as f32 + 0.5 - x0) / dx } else { 0.0 };

            if DEPTH != DEPTH_OFF {
                let z = l.coord.z + (r.coord.z - l.coord.z) * s;
                if DEPTH == DEPTH_TEST && z >= self.fb.depth[idx] {
                    continue;
                }
                self.fb.depth[idx] = z;
            }

            let mut color = if SMOOTH {
                l.color + (r.color - l.color) * s
            } else {
                self.flat
            };
            if TEX {
                let uv = l.tex_coord + (r.tex_coord - l.tex_coord) * s;
                color *= rgba_to_color(self.texture.sample(uv));
            }

            self.fb.rgba[idx] = if BLEND {
                let dst = rgba_to_color(self.fb.rgba[idx]);
                let a = color.w.clamp(0.0, 1.0);
                let rgb = color.truncate() * a + dst.truncate() * (1.0 - a);
                color_to_rgba(rgb.extend(a + dst.w * (1.0 - a)))
            } else {
                color_to_rgba(color.truncate().extend(1.0))
            };
        }
    }
}

/// Pixels whose centers lie in `[from, to)`, clamped to `0..limit`.
#[inline]
fn pixel_range(from: f32, to: f32, limit: usize) -> (usize, usize) {
    let limit = limit as f32;
    let first = (from - 0.5).ceil().clamp(0.0, limit);
    let last = (to - 0.5).ceil().clamp(0.0, limit);
    (first as usize, last as usize)
}

/// Interpolates between two screen-space vertices, skipping attributes the
/// rasterizer instance does not use.
#[inline]
fn mix<const SMOOTH: bool, const TEX: bool>(a: &ClipVertex, b: &ClipVertex, t: f32) -> ClipVertex {
    ClipVertex {
        coord: a.coord + (b.coord - a.coord) * t,
        normal: a.normal,
        color: if SMOOTH {
            a.color + (b.color - a.color) * t
        } else {
            a.color
        },
        tex_coord: if TEX {
            a.tex_coord + (b.tex_coord - a.tex_coord) * t
        } else {
            a.tex_coord
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec2;

    const RED: Vec4 = Vec4::new(1.0, 0.0, 0.0, 1.0);

    fn screen_vertex(x: f32, y: f32, z: f32, color: Vec4) -> ClipVertex {
        ClipVertex {
            coord: Vec4::new(x, y, z, 1.0),
            color,
            tex_coord: Vec2::new(x / 4.0, y / 4.0),
            ..Default::default()
        }
    }

    fn quad(x0: f32, y0: f32, x1: f32, y1: f32, z: f32, color: Vec4) -> Vec<Triangle> {
        let v = |x, y| screen_vertex(x, y, z, color);
        vec![
            [v(x0, y1), v(x1, y1), v(x1, y0)],
            [v(x0, y1), v(x1, y0), v(x0, y0)],
        ]
    }

    fn covered(fb: &FrameBuffer) -> Vec<usize> {
        fb.rgba
            .iter()
            .enumerate()
            .filter(|(_, px)| **px != 0)
            .map(|(i, _)| i)
            .collect()
    }

    #[test]
    fn adjacent_triangles_cover_each_pixel_once() {
        let mut fb = FrameBuffer::new(4, 4, 0);
        let tris = quad(0.0, 0.0, 4.0, 4.0, 0.0, Vec4::new(0.25, 0.0, 0.0, 0.25));
        // a pixel blended twice would differ from the others
        rasterize::<DEPTH_OFF, false, true, false>(&mut fb, &Texture::new(), &tris, tris[0][0].color);
        let first = fb.rgba[0];
        assert_ne!(first, 0);
        assert!(fb.rgba.iter().all(|&px| px == first), "{:x?}", fb.rgba);
    }

    #[test]
    fn pixel_centers_decide_coverage() {
        let mut fb = FrameBuffer::new(4, 4, 0);
        let tris = quad(0.6, 0.6, 2.4, 2.5, 0.0, RED);
        rasterize::<DEPTH_OFF, false, false, false>(&mut fb, &Texture::new(), &tris, RED);
        // only centers 1.5 lie in [0.6, 2.4) and [0.6, 2.5)
        assert_eq!(covered(&fb), vec![5]);

        let mut fb = FrameBuffer::new(4, 4, 0);
        let tris = quad(0.6, 0.6, 2.6, 2.6, 0.0, RED);
        rasterize::<DEPTH_OFF, false, false, false>(&mut fb, &Texture::new(), &tris, RED);
        assert_eq!(covered(&fb), vec![5, 6, 9, 10]);
        assert_eq!(fb.rgba[5], 0xff0000ff);
    }

    #[test]
    fn degenerate_triangle_does_not_stop_batch() {
        let mut fb = FrameBuffer::new(2, 2, 0);
        let flat = [
            screen_vertex(0.0, 1.0, 0.0, RED),
            screen_vertex(2.0, 1.0, 0.0, RED),
            screen_vertex(1.0, 1.0, 0.0, RED),
        ];
        let mut tris = vec![flat];
        tris.extend(quad(0.0, 0.0, 2.0, 2.0, 0.0, RED));
        rasterize::<DEPTH_OFF, false, false, false>(&mut fb, &Texture::new(), &tris, RED);
        assert_eq!(fb.rgba, vec![0xff0000ff; 4]);
    }

    #[test]
    fn depth_test_keeps_nearest() {
        let blue = Vec4::new(0.0, 0.0, 1.0, 1.0);
        let raster = select(DepthMode::Test, false, false, false);
        let tex = Texture::new();

        let mut fb = FrameBuffer::new(2, 2, 0);
        raster(&mut fb, &tex, &quad(0.0, 0.0, 2.0, 2.0, 0.5, RED), RED);
        raster(&mut fb, &tex, &quad(0.0, 0.0, 2.0, 2.0, 0.7, blue), blue);
        assert_eq!(fb.rgba, vec![0xff0000ff; 4]);
        assert_eq!(fb.depth, vec![0.5; 4]);

        // equal depth does not pass
        raster(&mut fb, &tex, &quad(0.0, 0.0, 2.0, 2.0, 0.5, blue), blue);
        assert_eq!(fb.rgba, vec![0xff0000ff; 4]);

        raster(&mut fb, &tex, &quad(0.0, 0.0, 2.0, 2.0, -0.2, blue), blue);
        assert_eq!(fb.rgba, vec![0xffff0000; 4]);

        // write-only ignores the stored depth
        let write = select(DepthMode::Write, false, false, false);
        write(&mut fb, &tex, &quad(0.0, 0.0, 2.0, 2.0, 0.9, RED), RED);
        assert_eq!(fb.rgba, vec![0xff0000ff; 4]);
        assert_eq!(fb.depth, vec![0.9; 4]);
    }

    #[test]
    fn smooth_shading_interpolates_colors() {
        let mut fb = FrameBuffer::new(4, 1, 0);
        let black = Vec4::new(0.0, 0.0, 0.0, 1.0);
        let white = Vec4::ONE;
        let tris = vec![[
            screen_vertex(0.0, -4.0, 0.0, black),
            screen_vertex(4.0, 4.0, 0.0, white),
            screen_vertex(0.0, 4.0, 0.0, black),
        ], [
            screen_vertex(0.0, -4.0, 0.0, black),
            screen_vertex(4.0, -4.0, 0.0, white),
            screen_vertex(4.0, 4.0, 0.0, white),
        ]];
        select(DepthMode::Off, true, false, false)(&mut fb, &Texture::new(), &tris, black);
        let reds: Vec<u32> = fb.rgba.iter().map(|px| px & 0xff).collect();
        assert!(reds.windows(2).all(|w| w[0] < w[1]), "{reds:?}");

        let mut flat = FrameBuffer::new(4, 1, 0);
        select(DepthMode::Off, false, false, false)(&mut flat, &Texture::new(), &tris, black);
        assert!(flat.rgba.iter().all(|&px| px == 0xff000000));
    }

    #[test]
    fn texturing_modulates_color() {
        let tex = Texture::from_texels(2, 2, &[0xff0000ff, 0xff00ff00, 0xffff0000, 0xffffffff])
            .unwrap();
        let mut fb = FrameBuffer::new(4, 4, 0);
        // tex coords are x / 4, y / 4
        select(DepthMode::Off, false, false, true)(&mut fb, &tex, &quad(0.0, 0.0, 4.0, 4.0, 0.0, Vec4::ONE), Vec4::ONE);
        assert_eq!(fb.rgba[0], 0xff0000ff);
        assert_eq!(fb.rgba[3], 0xff00ff00);
        assert_eq!(fb.rgba[12], 0xffff0000);
        assert_eq!(fb.rgba[15], 0xffffffff);

        let half = Vec4::new(0.5, 0.5, 0.5, 1.0);
        select(DepthMode::Off, false, false, true)(&mut fb, &tex, &quad(0.0, 0.0, 4.0, 4.0, 0.0, half), half);
        assert_eq!(fb.rgba[15], 0xff808080);
    }

    #[test]
    fn blending_is_source_over() {
        let mut fb = FrameBuffer::new(2, 2, 0xffff0000);
        let tris = quad(0.0, 0.0, 2.0, 2.0, 0.0, Vec4::new(1.0, 0.0, 0.0, 0.5));
        select(DepthMode::Off, false, true, false)(&mut fb, &Texture::new(), &tris, tris[0][0].color);
        assert_eq!(fb.rgba, vec![0xff800080; 4]);

        let mut opaque = FrameBuffer::new(2, 2, 0xffff0000);
        select(DepthMode::Off, false, false, false)(&mut opaque, &Texture::new(), &tris, tris[0][0].color);
        assert_eq!(opaque.rgba, vec![0xff0000ff; 4]);
    }

    #[test]
    fn triangles_outside_buffer_are_clamped() {
        let mut fb = FrameBuffer::new(2, 2, 0);
        let tris = quad(-3.0, -3.0, 5.0, 5.0, 0.0, RED);
        rasterize::<DEPTH_OFF, false, false, false>(&mut fb, &Texture::new(), &tris, RED);
        assert_eq!(fb.rgba, vec![0xff0000ff; 4]);
    }
}
