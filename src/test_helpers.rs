//! Shared test utilities for the kaleido test suite.
//!
//! Provides synthetic rasters and sequence builders so pipeline tests can
//! run without fixture files or a codec.
//!
//! # Usage
//!
//! ```rust,ignore
//! use crate::test_helpers::*;
//!
//! let seq = sequence_of(
//!     vec![Frame::new(gradient_rgba(20, 10)), Frame::new(solid_rgba(20, 10, RED))],
//!     Some(0),
//! );
//! ```

use image::{Rgba, RgbaImage};

use crate::types::{AnimatedSequence, Frame};

// =========================================================================
// Rasters
// =========================================================================

/// Opaque raster where every position up to 4096×4096 has its own color.
///
/// Geometry tests use it to track where a source pixel ends up.
pub fn gradient_rgba(width: u32, height: u32) -> RgbaImage {
    RgbaImage::from_fn(width, height, |x, y| {
        let hi = ((x / 256) * 16 + (y / 256)) as u8;
        Rgba([(x % 256) as u8, (y % 256) as u8, hi, 255])
    })
}

/// Raster filled with a single pixel value.
pub fn solid_rgba(width: u32, height: u32, pixel: Rgba<u8>) -> RgbaImage {
    RgbaImage::from_pixel(width, height, pixel)
}

/// Opaque raster holding `width × height` distinct colors, row-major.
///
/// 16×16 gives exactly 256 colors: a full palette with no slot to spare.
pub fn distinct_color_rgba(width: u32, height: u32) -> RgbaImage {
    RgbaImage::from_fn(width, height, |x, y| {
        let n = y * width + x;
        Rgba([(n % 256) as u8, (n / 256 % 256) as u8, (n * 37 % 251) as u8, 255])
    })
}

// =========================================================================
// Sequences
// =========================================================================

/// Wrap frames in a sequence whose canvas is the first frame's size.
///
/// Panics on an empty frame list; build empty sequences by hand.
pub fn sequence_of(frames: Vec<Frame>, transparency_index: Option<u8>) -> AnimatedSequence {
    let (width, height) = frames
        .first()
        .map(|f| f.image.dimensions())
        .expect("sequence_of needs at least one frame");
    AnimatedSequence {
        width,
        height,
        transparency_index,
        frames,
    }
}
