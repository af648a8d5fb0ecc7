//! Packed RGBA conversion and whole-image color operations.
//!
//! Packed pixels store one byte per channel with red in the least significant
//! byte and alpha in the most significant byte, so on little-endian machines
//! the memory layout is `R, G, B, A`.

use glam::{Vec3, Vec4};

/// Packs a color into a `u32`, clamping each channel to `[0, 1]`.
pub fn color_to_rgba(color: Vec4) -> u32 {
    let c = color.clamp(Vec4::ZERO, Vec4::ONE) * 255.0 + 0.5;
    (c.x as u32) | (c.y as u32) << 8 | (c.z as u32) << 16 | (c.w as u32) << 24
}

/// Unpacks a `u32` into a color with channels in `[0, 1]`.
pub fn rgba_to_color(rgba: u32) -> Vec4 {
    Vec4::new(
        (rgba & 0xff) as f32,
        (rgba >> 8 & 0xff) as f32,
        (rgba >> 16 & 0xff) as f32,
        (rgba >> 24) as f32,
    ) * (1.0 / 255.0)
}

/// Replaces the alpha of every pixel by its color distance from `pivot`.
///
/// The RGB distance `d` (at most `√3`) is mapped onto a quarter turn and the
/// alpha becomes `1 − cos(d · π/2 / √3)^exp`: pixels matching the pivot turn
/// fully transparent, the opposite corner of the color cube stays opaque.
/// Larger exponents make the falloff sharper.
pub fn color_to_alpha(img: &mut [u32], pivot: Vec3, exp: f32) {
    let norm = std::f32::consts::FRAC_PI_2 / 3.0_f32.sqrt();
    for px in img.iter_mut() {
        let d = rgba_to_color(*px).truncate().distance(pivot);
        let alpha = 1.0 - (d * norm).cos().max(0.0).powf(exp);
        let a = (alpha.clamp(0.0, 1.0) * 255.0 + 0.5) as u32;
        *px = (*px & 0x00ff_ffff) | a << 24;
    }
}

/// Writes the weighted sum `f0 · img0 + f1 · img1` into `img`, per pixel.
///
/// Only the common prefix of the three slices is processed.
pub fn merge_colors(img: &mut [u32], img0: &[u32], img1: &[u32], f0: f32, f1: f32) {
    for ((dst, &a), &b) in img.iter_mut().zip(img0).zip(img1) {
        *dst = color_to_rgba(f0 * rgba_to_color(a) + f1 * rgba_to_color(b));
    }
}
