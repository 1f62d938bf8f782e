//! Crop, mirror and paste: the geometry behind the effect.
//!
//! A single pass keeps one part of the source, flips it across the cut line
//! and pastes both halves side by side (or stacked) on a fresh canvas:
//!
//! ```text
//! left:  [kept | mirrored]      up:    [kept    ]
//! right: [mirrored | kept]             [mirrored]
//!                               down:  [mirrored]
//!                                      [kept    ]
//! ```
//!
//! Quadrants are two passes: horizontal first, then vertical on the
//! intermediate canvas. Functions here never mutate their input; every call
//! allocates its output.

use super::calculations::edge_output_dimensions;
use super::error::MirrorError;
use super::params::{CropSpec, Edge, Side};
use image::imageops::{self, crop_imm, flip_horizontal, flip_vertical};
use image::{ImageBuffer, Pixel};

/// Owned raster of any pixel type.
pub type Raster<P> = ImageBuffer<P, Vec<<P as Pixel>::Subpixel>>;

/// Mirror `source` with explicit crop sizes.
///
/// Quadrant sides run two passes; the second one sees the *output*
/// dimensions of the first as its source size.
pub fn mirror<P>(
    source: &Raster<P>,
    crop_width: u32,
    crop_height: u32,
    side: Side,
) -> Result<Raster<P>, MirrorError>
where
    P: Pixel + 'static,
{
    let (first, second) = side.passes();
    let intermediate = mirror_edge(source, crop_width, crop_height, first)?;
    match second {
        Some(edge) => mirror_edge(&intermediate, crop_width, crop_height, edge),
        None => Ok(intermediate),
    }
}

/// Mirror `source` using the shares in `spec`.
///
/// Crop sizes are derived from whatever canvas each pass receives, so for
/// quadrants the vertical share applies to the intermediate canvas.
pub fn mirror_with_spec<P>(source: &Raster<P>, spec: &CropSpec) -> Result<Raster<P>, MirrorError>
where
    P: Pixel + 'static,
{
    let (first, second) = spec.side.passes();
    let (crop_w, crop_h) = spec.crop_dimensions(source.width(), source.height());
    let intermediate = mirror_edge(source, crop_w, crop_h, first)?;
    match second {
        Some(edge) => {
            let (crop_w, crop_h) =
                spec.crop_dimensions(intermediate.width(), intermediate.height());
            mirror_edge(&intermediate, crop_w, crop_h, edge)
        }
        None => Ok(intermediate),
    }
}

/// One single-axis pass.
pub fn mirror_edge<P>(
    source: &Raster<P>,
    crop_width: u32,
    crop_height: u32,
    edge: Edge,
) -> Result<Raster<P>, MirrorError>
where
    P: Pixel + 'static,
{
    let (width, height) = source.dimensions();
    if crop_width > width || crop_height > height {
        return Err(MirrorError::GeometryConstraintViolation(format!(
            "crop {crop_width}x{crop_height} exceeds source {width}x{height}"
        )));
    }

    let (out_w, out_h) = edge_output_dimensions(width, height, crop_width, crop_height, edge);
    let mut canvas: Raster<P> = ImageBuffer::new(out_w, out_h);

    match edge {
        Edge::Left => {
            let kept = crop_imm(source, 0, 0, crop_width, height).to_image();
            let mirrored = flip_horizontal(&kept);
            imageops::replace(&mut canvas, &kept, 0, 0);
            imageops::replace(&mut canvas, &mirrored, i64::from(crop_width), 0);
        }
        Edge::Right => {
            let kept = crop_imm(source, width - crop_width, 0, crop_width, height).to_image();
            let mirrored = flip_horizontal(&kept);
            imageops::replace(&mut canvas, &mirrored, 0, 0);
            imageops::replace(&mut canvas, &kept, i64::from(crop_width), 0);
        }
        Edge::Up => {
            let kept = crop_imm(source, 0, 0, width, crop_height).to_image();
            let mirrored = flip_vertical(&kept);
            imageops::replace(&mut canvas, &kept, 0, 0);
            imageops::replace(&mut canvas, &mirrored, 0, i64::from(crop_height));
        }
        Edge::Down => {
            let kept = crop_imm(source, 0, height - crop_height, width, crop_height).to_image();
            let mirrored = flip_vertical(&kept);
            imageops::replace(&mut canvas, &mirrored, 0, 0);
            imageops::replace(&mut canvas, &kept, 0, i64::from(crop_height));
        }
    }

    Ok(canvas)
}
