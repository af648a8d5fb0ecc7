//! Render mode switches.

/// A pipeline feature that can be switched on or off.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Mode {
    /// Draw triangles facing the viewer (counter-clockwise on screen).
    FrontFace,
    /// Draw triangles facing away from the viewer.
    BackFace,
    /// Write fragment depth into the depth plane.
    DepthWrite,
    /// Discard fragments not closer than the stored depth. Only effective
    /// together with [`Mode::DepthWrite`].
    DepthTest,
    /// Interpolate vertex colors instead of using the first vertex's color.
    Smooth,
    /// Source-over alpha blending into the color plane.
    Blending,
    /// Modulate fragment colors with the bound texture.
    Texturing,
    /// Directional plus ambient lighting of vertex colors.
    Lighting,
}

impl Mode {
    pub const ALL: [Mode; 8] = [
        Mode::FrontFace,
        Mode::BackFace,
        Mode::DepthWrite,
        Mode::DepthTest,
        Mode::Smooth,
        Mode::Blending,
        Mode::Texturing,
        Mode::Lighting,
    ];

    const fn bit(self) -> u8 {
        1 << self as u8
    }
}

/// A set of enabled [`Mode`]s.
///
/// The default set holds only [`Mode::FrontFace`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Modes(u8);

impl Default for Modes {
    fn default() -> Self {
        Self::EMPTY.with(Mode::FrontFace)
    }
}

impl Modes {
    pub const EMPTY: Modes = Modes(0);

    pub const fn with(self, mode: Mode) -> Self {
        Self(self.0 | mode.bit())
    }

    pub const fn without(self, mode: Mode) -> Self {
        Self(self.0 & !mode.bit())
    }

    pub const fn contains(self, mode: Mode) -> bool {
        self.0 & mode.bit() != 0
    }

    pub fn set(&mut self, mode: Mode, on: bool) {
        *self = if on { self.with(mode) } else { self.without(mode) };
    }

    pub(crate) fn depth_mode(self) -> DepthMode {
        match (self.contains(Mode::DepthWrite), self.contains(Mode::DepthTest)) {
            (true, true) => DepthMode::Test,
            (true, false) => DepthMode::Write,
            (false, _) => DepthMode::Off,
        }
    }
}

impl FromIterator<Mode> for Modes {
    fn from_iter<I: IntoIterator<Item = Mode>>(iter: I) -> Self {
        iter.into_iter().fold(Modes::EMPTY, Modes::with)
    }
}

/// How the rasterizer treats the depth plane.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum DepthMode {
    Off,
    Write,
    /// Check against the stored depth, then write.
    Test,
}
