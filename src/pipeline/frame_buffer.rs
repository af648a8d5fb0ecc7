/// Color and depth planes of one viewport, row-major, top row first.
#[derive(Clone, Debug)]
pub(crate) struct FrameBuffer {
    width: usize,
    height: usize,
    pub rgba: Vec<u32>,
    pub depth: Vec<f32>,
}

impl FrameBuffer {
    /// Depth assigned by a depth clear (the far plane).
    pub const DEPTH_CLEAR: f32 = 1.0;

    pub fn new(width: u32, height: u32, rgba: u32) -> Self {
        let (width, height) = (width as usize, height as usize);
        Self {
            width,
            height,
            rgba: vec![rgba; width * height],
            depth: vec![Self::DEPTH_CLEAR; width * height],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn clear_rgba(&mut self, rgba: u32) {
        self.rgba.fill(rgba);
    }

    pub fn clear_depth(&mut self) {
        self.depth.fill(Self::DEPTH_CLEAR);
    }
}
