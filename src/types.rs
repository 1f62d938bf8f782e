//! Shared types passed between the codec backend and the pipelines.
//!
//! Decoded inputs ([`StaticImage`], [`AnimatedSequence`]) flow into the
//! pipelines; [`SequenceResult`] flows back out to the encoder. Every value
//! is owned by exactly one stage at a time.

use image::{DynamicImage, RgbaImage};

/// Frame duration used when the source does not declare one.
pub const DEFAULT_DURATION_MS: u32 = 100;

/// What happens to a frame's pixels before the next frame is drawn.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Disposal {
    /// 0: no disposal specified.
    Unspecified,
    /// 1: leave the frame in place.
    Keep,
    /// 2: restore to background.
    #[default]
    Background,
    /// 3: restore to the previous frame.
    Previous,
}

impl Disposal {
    pub fn code(self) -> u8 {
        match self {
            Disposal::Unspecified => 0,
            Disposal::Keep => 1,
            Disposal::Background => 2,
            Disposal::Previous => 3,
        }
    }

    /// Whether a frame with this disposal is drawn over the previous composite.
    pub fn composites_over_history(self) -> bool {
        matches!(
            self,
            Disposal::Unspecified | Disposal::Keep | Disposal::Previous
        )
    }
}

/// One element of an animated sequence.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub image: RgbaImage,
    pub duration_ms: Option<u32>,
    pub disposal: Option<Disposal>,
}

impl Frame {
    pub fn new(image: RgbaImage) -> Self {
        Self {
            image,
            duration_ms: None,
            disposal: None,
        }
    }

    pub fn with_duration(mut self, ms: u32) -> Self {
        self.duration_ms = Some(ms);
        self
    }

    pub fn with_disposal(mut self, disposal: Disposal) -> Self {
        self.disposal = Some(disposal);
        self
    }

    /// Declared duration, or [`DEFAULT_DURATION_MS`].
    pub fn duration(&self) -> u32 {
        self.duration_ms.unwrap_or(DEFAULT_DURATION_MS)
    }

    /// Declared disposal, or restore-to-background.
    pub fn disposal(&self) -> Disposal {
        self.disposal.unwrap_or_default()
    }
}

/// A decoded multi-frame image.
#[derive(Debug, Clone, PartialEq)]
pub struct AnimatedSequence {
    /// Logical canvas size; crop sizes are derived from it.
    pub width: u32,
    pub height: u32,
    /// Transparent palette index declared by the source, if any.
    pub transparency_index: Option<u8>,
    /// Frames in temporal order.
    pub frames: Vec<Frame>,
}

/// A decoded single-frame image plus its EXIF orientation code.
#[derive(Debug, Clone)]
pub struct StaticImage {
    pub image: DynamicImage,
    pub orientation: Option<u8>,
}

/// An 8-bit palette-indexed raster.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexedFrame {
    pub width: u32,
    pub height: u32,
    /// At most 256 RGB entries.
    pub palette: Vec<[u8; 3]>,
    /// One palette index per pixel, row-major.
    pub indices: Vec<u8>,
    pub transparent: Option<u8>,
}

impl IndexedFrame {
    /// Palette color at `(x, y)`.
    pub fn color_at(&self, x: u32, y: u32) -> [u8; 3] {
        let index = self.index_at(x, y);
        self.palette[usize::from(index)]
    }

    pub fn index_at(&self, x: u32, y: u32) -> u8 {
        self.indices[(y as usize) * (self.width as usize) + x as usize]
    }

    /// Whether `(x, y)` carries the transparent index.
    pub fn is_transparent_at(&self, x: u32, y: u32) -> bool {
        self.transparent == Some(self.index_at(x, y))
    }

    /// Flat `[r, g, b, r, g, b, ...]` palette, as GIF encoders want it.
    pub fn flat_palette(&self) -> Vec<u8> {
        self.palette.iter().flatten().copied().collect()
    }
}

/// Output of an animated pipeline: three parallel lists in source order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SequenceResult {
    pub frames: Vec<IndexedFrame>,
    pub durations: Vec<u32>,
    pub disposals: Vec<Disposal>,
}

impl SequenceResult {
    pub fn push(&mut self, frame: IndexedFrame, duration: u32, disposal: Disposal) {
        self.frames.push(frame);
        self.durations.push(duration);
        self.disposals.push(disposal);
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}
