//! Alpha compositing and transparency masks.
//!
//! Integer arithmetic on the 0-255 scale throughout, rounding to nearest,
//! so results are byte-identical across platforms.

use super::error::MirrorError;
use image::{Rgb, RgbImage, Rgba, RgbaImage};

/// Porter-Duff "over" for straight (non-premultiplied) alpha.
#[inline]
fn over(fg: Rgba<u8>, bg: Rgba<u8>) -> Rgba<u8> {
    let fa = u32::from(fg[3]);
    let ba = u32::from(bg[3]);
    let inv = 255 - fa;

    // Output alpha on the 255² scale
    let out_a = fa * 255 + ba * inv;
    if out_a == 0 {
        return Rgba([0, 0, 0, 0]);
    }

    let channel = |i: usize| {
        let num = u32::from(fg[i]) * fa * 255 + u32::from(bg[i]) * ba * inv;
        ((num + out_a / 2) / out_a) as u8
    };
    Rgba([channel(0), channel(1), channel(2), ((out_a + 127) / 255) as u8])
}

/// Composite `foreground` over `background`; both must be the same size.
pub fn alpha_over(background: &RgbaImage, foreground: &RgbaImage) -> Result<RgbaImage, MirrorError> {
    if background.dimensions() != foreground.dimensions() {
        let (bw, bh) = background.dimensions();
        let (fw, fh) = foreground.dimensions();
        return Err(MirrorError::GeometryConstraintViolation(format!(
            "cannot composite {fw}x{fh} frame over {bw}x{bh} history"
        )));
    }
    let mut out = foreground.clone();
    for (dst, bg) in out.pixels_mut().zip(background.pixels()) {
        *dst = over(*dst, *bg);
    }
    Ok(out)
}

/// Blend onto an opaque white background, dropping alpha.
pub fn flatten_on_white(image: &RgbaImage) -> RgbImage {
    RgbImage::from_fn(image.width(), image.height(), |x, y| {
        let p = image.get_pixel(x, y);
        let a = u32::from(p[3]);
        let blend = |c: u8| ((u32::from(c) * a + 255 * (255 - a) + 127) / 255) as u8;
        Rgb([blend(p[0]), blend(p[1]), blend(p[2])])
    })
}

/// Per-pixel transparency flags in raster order.
pub fn transparency_mask(image: &RgbaImage, is_transparent: impl Fn(u8) -> bool) -> Vec<bool> {
    image.pixels().map(|p| is_transparent(p[3])).collect()
}
