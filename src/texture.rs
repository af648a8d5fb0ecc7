//! Software textures and the texture table of a render context.
//!
//! A [`Texture`] is a row-major array of packed RGBA texels (see
//! [`color`](crate::color) for the packing) whose dimensions are both powers of
//! two. Sampling is nearest-neighbor with wrap-around addressing, so texture
//! coordinates outside `[0, 1)` repeat the image.
//!
//! # Example
//!
//! ```
//! use softraster::{Texture, Vec2};
//!
//! let mut tex = Texture::new();
//! tex.load(2, 2, &[0xff0000ff, 0xff00ff00, 0xffff0000, 0xffffffff]).unwrap();
//!
//! assert_eq!(tex.sample(Vec2::new(0.0, 0.0)), 0xff0000ff);
//! assert_eq!(tex.sample(Vec2::new(0.99, 0.99)), 0xffffffff);
//! // wrap-around
//! assert_eq!(tex.sample(Vec2::new(1.25, -0.75)), tex.sample(Vec2::new(0.25, 0.25)));
//! ```

use glam::Vec2;
use std::path::Path;

/// Errors that can occur when loading a texture.
#[derive(Debug)]
pub enum TextureError {
    /// Width or height is zero or not a power of two.
    NotPowerOfTwo { width: u32, height: u32 },
    /// The texel slice does not hold `width * height` entries.
    SizeMismatch { expected: usize, actual: usize },
    /// The image file could not be read or decoded.
    Image(image::ImageError),
}

impl std::fmt::Display for TextureError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TextureError::NotPowerOfTwo { width, height } => write!(
                f,
                "texture size {}x{} is not a power of two",
                width, height
            ),
            TextureError::SizeMismatch { expected, actual } => write!(
                f,
                "texture needs {} texels but {} were given",
                expected, actual
            ),
            TextureError::Image(e) => write!(f, "image error: {}", e),
        }
    }
}

impl std::error::Error for TextureError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TextureError::Image(e) => Some(e),
            _ => None,
        }
    }
}

impl From<image::ImageError> for TextureError {
    fn from(e: image::ImageError) -> Self {
        TextureError::Image(e)
    }
}

/// Type-safe handle to a texture in a render context's texture table.
///
/// Returned by [`RenderContext::load_tex`](crate::RenderContext::load_tex).
/// Handle `0` ([`TextureId::SENTINEL`]) always refers to a 1×1 transparent
/// black texture and is what failed loads and invalid binds fall back to.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct TextureId(pub(crate) usize);

impl TextureId {
    /// The always-present fallback texture.
    pub const SENTINEL: TextureId = TextureId(0);

    /// Position of the texture in the table.
    pub fn index(self) -> usize {
        self.0
    }
}

/// A CPU texture of packed RGBA texels.
///
/// Created empty; [`load`](Texture::load) replaces the contents in place.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Texture {
    width: u32,
    height: u32,
    texels: Vec<u32>,
}

impl Texture {
    /// Creates an empty texture.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a texture from packed texels.
    pub fn from_texels(width: u32, height: u32, texels: &[u32]) -> Result<Self, TextureError> {
        let mut tex = Self::new();
        tex.load(width, height, texels)?;
        Ok(tex)
    }

    /// The 1×1 transparent black texture held in slot 0 of every table.
    pub fn sentinel() -> Self {
        Self {
            width: 1,
            height: 1,
            texels: vec![0],
        }
    }

    /// Load a texture from an image file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, TextureError> {
        let img = image::open(path)?.to_rgba8();
        Self::from_image(&img)
    }

    /// Load a texture from encoded image bytes (PNG, JPEG, ...).
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, TextureError> {
        let img = image::load_from_memory(bytes)?.to_rgba8();
        Self::from_image(&img)
    }

    /// Converts a decoded RGBA image.
    pub fn from_image(img: &image::RgbaImage) -> Result<Self, TextureError> {
        let (width, height) = img.dimensions();
        let texels: Vec<u32> = img
            .as_raw()
            .chunks_exact(4)
            .map(|p| u32::from_le_bytes([p[0], p[1], p[2], p[3]]))
            .collect();
        Self::from_texels(width, height, &texels)
    }

    /// Generate a procedural block-noise texture of `size × size` texels.
    ///
    /// `size` must be a power of two. Each 4×4 block gets a base tone from a
    /// small palette with per-texel variation.
    pub fn noise(size: u32, seed: u32) -> Result<Self, TextureError> {
        let palette: &[[i32; 3]] = &[
            [139, 90, 43],
            [160, 120, 60],
            [100, 70, 40],
            [128, 128, 128],
            [90, 90, 90],
            [120, 100, 70],
        ];

        let mut texels = Vec::with_capacity((size as usize) * (size as usize));
        for y in 0..size {
            for x in 0..size {
                let base = palette[(Self::hash(x / 4, y / 4, seed) % palette.len() as u32) as usize];
                let variation = (Self::hash(x, y, seed.wrapping_add(977)) % 24) as i32 - 12;
                let [r, g, b] = base.map(|c| (c + variation).clamp(0, 255) as u32);
                texels.push(r | g << 8 | b << 16 | 0xff00_0000);
            }
        }

        Self::from_texels(size, size, &texels)
    }

    fn hash(x: u32, y: u32, seed: u32) -> u32 {
        let mut h = seed;
        h = h.wrapping_add(x.wrapping_mul(374761393));
        h = h.wrapping_add(y.wrapping_mul(668265263));
        h ^= h >> 13;
        h = h.wrapping_mul(1274126177);
        h ^= h >> 16;
        h
    }

    /// Replaces the contents.
    ///
    /// Both dimensions must be powers of two and `texels` must hold exactly
    /// `width * height` entries; on error the texture is left unchanged.
    pub fn load(&mut self, width: u32, height: u32, texels: &[u32]) -> Result<(), TextureError> {
        if !width.is_power_of_two() || !height.is_power_of_two() {
            return Err(TextureError::NotPowerOfTwo { width, height });
        }
        let expected = width as usize * height as usize;
        if texels.len() != expected {
            return Err(TextureError::SizeMismatch {
                expected,
                actual: texels.len(),
            });
        }

        self.width = width;
        self.height = height;
        self.texels.clear();
        self.texels.extend_from_slice(texels);
        Ok(())
    }

    /// Releases the texels, leaving an empty texture.
    pub fn clear(&mut self) {
        self.width = 0;
        self.height = 0;
        self.texels = Vec::new();
    }

    pub fn is_empty(&self) -> bool {
        self.texels.is_empty()
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Row-major texels, top row first.
    pub fn texels(&self) -> &[u32] {
        &self.texels
    }

    /// Nearest-neighbor lookup with wrap-around addressing.
    ///
    /// The texel column is `floor(u · width) mod width`, the row likewise, so
    /// `(u, v)` and `(u + 1, v + 1)` sample the same texel. An empty texture
    /// samples as transparent black.
    #[inline]
    pub fn sample(&self, uv: Vec2) -> u32 {
        if self.texels.is_empty() {
            return 0;
        }
        let x = wrap(uv.x, self.width);
        let y = wrap(uv.y, self.height);
        self.texels[y * self.width as usize + x]
    }
}

// `dim` is a power of two, so masking is a Euclidean modulo
#[inline]
fn wrap(coord: f32, dim: u32) -> usize {
    ((coord * dim as f32).floor() as i64 & (dim as i64 - 1)) as usize
}

/// Growable table of textures addressed by [`TextureId`].
///
/// Slot 0 holds the sentinel and is never evicted. Empty slots are free and
/// reused by the next load.
#[derive(Debug)]
pub(crate) struct TextureTable {
    slots: Vec<Texture>,
    bound: TextureId,
}

impl Default for TextureTable {
    fn default() -> Self {
        Self {
            slots: vec![Texture::sentinel()],
            bound: TextureId::SENTINEL,
        }
    }
}

impl TextureTable {
    /// Stores a texture in the first free slot, or appends one.
    ///
    /// Returns [`TextureId::SENTINEL`] if the texture is rejected.
    pub fn load(&mut self, width: u32, height: u32, texels: &[u32]) -> TextureId {
        let mut tex = Texture::new();
        if let Err(e) = tex.load(width, height, texels) {
            log::warn!("Rejected texture: {}", e);
            return TextureId::SENTINEL;
        }

        let id = match self.slots.iter().skip(1).position(Texture::is_empty) {
            Some(free) => {
                let id = TextureId(free + 1);
                self.slots[id.0] = tex;
                id
            }
            None => {
                self.slots.push(tex);
                TextureId(self.slots.len() - 1)
            }
        };
        log::debug!("Loaded {}x{} texture into slot {}", width, height, id.0);
        id
    }

    /// Binds `id`, falling back to the sentinel if it is unknown or empty.
    /// Returns the handle actually bound.
    pub fn bind(&mut self, id: TextureId) -> TextureId {
        self.bound = match self.slots.get(id.0) {
            Some(tex) if !tex.is_empty() => id,
            _ => {
                log::debug!("Texture slot {} is not loaded, binding sentinel", id.0);
                TextureId::SENTINEL
            }
        };
        self.bound
    }

    /// Frees a slot for reuse. Returns `false` for the sentinel and for
    /// slots that are not loaded.
    pub fn unload(&mut self, id: TextureId) -> bool {
        if id == TextureId::SENTINEL {
            return false;
        }
        match self.slots.get_mut(id.0) {
            Some(tex) if !tex.is_empty() => {
                tex.clear();
                if self.bound == id {
                    self.bound = TextureId::SENTINEL;
                }
                log::debug!("Unloaded texture slot {}", id.0);
                true
            }
            _ => false,
        }
    }

    pub fn bound(&self) -> TextureId {
        self.bound
    }

    pub fn bound_texture(&self) -> &Texture {
        &self.slots[self.bound.0]
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.slots.len()
    }
}
