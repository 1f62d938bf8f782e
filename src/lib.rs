//! # Kaleido
//!
//! A mirror-symmetry effect for still images and animated GIFs: keep one
//! part of the picture, flip it across a cut line, and paste both halves
//! together.
//!
//! # Architecture: Decode → Mirror → Encode
//!
//! ```text
//! input file ─ decode ─┬─ still ─── orient ─ mirror ─────────────────── save (RGB for JPEG)
//!                      └─ animated ─ per frame: mirror ─ composite ─ quantize ─ save GIF
//! ```
//!
//! The pixel work is pure: it takes owned rasters, returns new ones, and
//! never touches the filesystem. All I/O goes through an
//! [`ImageBackend`](imaging::ImageBackend), so the file-level orchestration
//! can be tested against a mock.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`imaging`] | Geometry (crop/flip/paste), alpha compositing, palettes, EXIF orientation, codec backend |
//! | [`animate`] | Frame loop over animated sequences with two quantization strategies and a selector |
//! | [`process`] | File-level and batch operations, progress events |
//! | [`scan`] | Expands file and directory arguments into input files |
//! | [`config`] | `kaleido.toml` loading, validation, and merging |
//! | [`types`] | Frames, sequences and indexed results passed between stages |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Two Palette Strategies
//!
//! Re-quantizing a mirrored animation usually works with a fresh palette per
//! frame plus one slot for transparency. When a frame already needs all 256
//! colors that slot does not exist, so the whole sequence is redone with one
//! palette taken from the first frame, slot 0 reserved for fully transparent
//! pixels. The selector never mixes frames from the two attempts.
//!
//! ## History as a Fold
//!
//! The previous composite needed for disposal handling is an accumulator
//! threaded through a fold over the frames, not a field on some processor
//! object. Every call starts from nothing and shares nothing, so batches can
//! run files in parallel with no locking.

pub mod animate;
pub mod config;
pub mod imaging;
pub mod output;
pub mod process;
pub mod scan;
pub mod types;

#[cfg(test)]
pub(crate) mod test_helpers;
