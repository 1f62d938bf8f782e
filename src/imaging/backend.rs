//! Codec backend trait and shared types.
//!
//! The [`ImageBackend`] trait defines the three operations the pipelines need
//! from a codec: decode, save a still image, and save an indexed animation.
//! The mirror pipelines never touch files themselves; everything on disk goes
//! through here.
//!
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend): pure Rust, everything
//! statically linked into the binary.

use crate::types::{AnimatedSequence, SequenceResult, StaticImage};
use image::RgbaImage;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Decode failed: {0}")]
    Decode(String),
    #[error("Encode failed: {0}")]
    Encode(String),
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),
}

/// What a decode produced.
#[derive(Debug, Clone)]
pub enum DecodedImage {
    Static(StaticImage),
    Animated(AnimatedSequence),
}

/// Trait for codec backends.
///
/// `Sync` so a single backend can be shared across rayon workers.
pub trait ImageBackend: Sync {
    /// Decode a file into a still image or a frame sequence.
    fn decode(&self, path: &Path) -> Result<DecodedImage, BackendError>;

    /// Write a still image; the format follows the path's extension.
    fn save_static(&self, image: &RgbaImage, path: &Path) -> Result<(), BackendError>;

    /// Write an indexed animation as a looping GIF.
    fn save_animation(&self, result: &SequenceResult, path: &Path) -> Result<(), BackendError>;
}
