//! Pure calculation functions for mirror dimensions.
//!
//! All functions here are pure and testable without any I/O or images.

use super::params::{CropSpec, Edge, Percent, Side};

/// Convert cut-line positions into the shares the geometry keeps.
///
/// Users place the cut line measured from the left and top edges. Sides that
/// keep the right (or bottom) part of the image keep the complement.
///
/// # Arguments
/// * `side` - Side or quadrant selector
/// * `horizontal` - Cut-line position from the left edge
/// * `vertical` - Cut-line position from the top edge
///
/// # Returns
/// * `(horizontal_share, vertical_share)` to hand to the core
///
/// ```text
/// kept_shares(Left, 30, 50)  → (30, 50)
/// kept_shares(Right, 30, 50) → (70, 50)
/// kept_shares(Q3, 30, 20)    → (70, 80)
/// ```
pub fn kept_shares(side: Side, horizontal: Percent, vertical: Percent) -> (Percent, Percent) {
    let h = if side.keeps_right() {
        horizontal.complement()
    } else {
        horizontal
    };
    let v = if side.keeps_bottom() {
        vertical.complement()
    } else {
        vertical
    };
    (h, v)
}

/// Output size of a single mirror pass over a `width`×`height` source.
pub fn edge_output_dimensions(
    width: u32,
    height: u32,
    crop_width: u32,
    crop_height: u32,
    edge: Edge,
) -> (u32, u32) {
    match edge {
        Edge::Left | Edge::Right => (crop_width * 2, height),
        Edge::Up | Edge::Down => (width, crop_height * 2),
    }
}

/// Final output size for a source of `width`×`height` under `spec`.
///
/// Quadrants thread the first pass's output size into the second pass, so
/// they end up as `(2 × crop_width, 2 × crop_height)`.
pub fn output_dimensions(width: u32, height: u32, spec: &CropSpec) -> (u32, u32) {
    let (first, second) = spec.side.passes();
    let (crop_w, crop_h) = spec.crop_dimensions(width, height);
    let (w, h) = edge_output_dimensions(width, height, crop_w, crop_h, first);
    match second {
        Some(edge) => {
            let (crop_w, crop_h) = spec.crop_dimensions(w, h);
            edge_output_dimensions(w, h, crop_w, crop_h, edge)
        }
        None => (w, h),
    }
}

/// Output file name: `{side}_{horizontal_share}_{original}`.
pub fn output_file_name(side: Side, horizontal_share: Percent, original: &str) -> String {
    format!("{}_{}_{}", side, horizontal_share.value(), original)
}
