//! EXIF orientation normalization for still images.

use image::DynamicImage;

/// Rotate `image` upright according to its EXIF orientation code.
///
/// | Code | Correction |
/// |---|---|
/// | 3 | rotate 180° |
/// | 6 | rotate 90° clockwise |
/// | 8 | rotate 270° clockwise |
///
/// Any other code, mirrored variants included, or a missing tag leaves the
/// image as it is.
pub fn normalize_orientation(image: DynamicImage, orientation: Option<u8>) -> DynamicImage {
    match orientation {
        Some(3) => image.rotate180(),
        Some(6) => image.rotate90(),
        Some(8) => image.rotate270(),
        _ => image,
    }
}
