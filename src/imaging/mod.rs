//! Image processing in pure Rust: crop, mirror, composite, quantize.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Crop / flip / paste** | `image::imageops::{crop_imm, flip_horizontal, flip_vertical, replace}` |
//! | **Alpha "over"** | integer straight-alpha blend |
//! | **Adaptive palette** | exact distinct colors, else NeuQuant (`color_quant`) |
//! | **EXIF orientation** | `DynamicImage::rotate{90,180,270}` |
//! | **Codec** | `image` + `gif` via [`RustBackend`] |
//!
//! The module is split into:
//! - **Parameters**: Side selectors and percentage shares
//! - **Calculations**: Pure functions for dimension math (unit testable)
//! - **Geometry / Composite / Quantize**: the pixel work, no I/O
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`]

pub mod backend;
pub mod calculations;
pub mod composite;
mod error;
pub mod geometry;
pub mod orientation;
mod params;
pub mod quantize;
pub mod rust_backend;

pub use backend::{BackendError, DecodedImage, ImageBackend};
pub use calculations::{kept_shares, output_dimensions, output_file_name};
pub use error::MirrorError;
pub use geometry::{mirror, mirror_with_spec};
pub use orientation::normalize_orientation;
pub use params::{CropSpec, Edge, Percent, Side};
pub use rust_backend::{RustBackend, supported_input_extensions};
