//! Adaptive palettes and nearest-color mapping for indexed output.
//!
//! Palette building picks the cheapest exact answer first: an image with no
//! more distinct colors than the target gets exactly those colors, in
//! first-seen order. Anything richer goes through NeuQuant (`color_quant`).
//! Mapping is always nearest color by squared RGB distance, memoized per
//! distinct input color.

use super::error::MirrorError;
use color_quant::NeuQuant;
use image::{RgbImage, RgbaImage};
use std::collections::{HashMap, HashSet};

/// NeuQuant sampling factor: 1 is slowest/best, 30 fastest.
const NEUQUANT_SAMPLE_FACTOR: i32 = 10;

/// Largest palette an 8-bit indexed raster can address.
pub const MAX_PALETTE_LEN: usize = 256;

/// Color triples of an RGBA raster, alpha ignored.
pub fn rgb_of_rgba(image: &RgbaImage) -> Vec<[u8; 3]> {
    image.pixels().map(|p| [p[0], p[1], p[2]]).collect()
}

/// Color triples of an RGB raster.
pub fn rgb_of_rgb(image: &RgbImage) -> Vec<[u8; 3]> {
    image.pixels().map(|p| p.0).collect()
}

/// Build a palette of at most `max_colors` entries representing `pixels`.
pub fn adaptive_palette(pixels: &[[u8; 3]], max_colors: usize) -> Result<Vec<[u8; 3]>, MirrorError> {
    if pixels.is_empty() {
        return Err(MirrorError::QuantizationFailure(
            "cannot build a palette for an empty frame".into(),
        ));
    }
    if !(1..=MAX_PALETTE_LEN).contains(&max_colors) {
        return Err(MirrorError::QuantizationFailure(format!(
            "palette size {max_colors} is outside 1-{MAX_PALETTE_LEN}"
        )));
    }

    if let Some(exact) = distinct_colors(pixels, max_colors) {
        return Ok(exact);
    }

    let rgba: Vec<u8> = pixels
        .iter()
        .flat_map(|&[r, g, b]| [r, g, b, 255])
        .collect();
    let nq = NeuQuant::new(NEUQUANT_SAMPLE_FACTOR, max_colors, &rgba);
    Ok(nq
        .color_map_rgb()
        .chunks_exact(3)
        .map(|c| [c[0], c[1], c[2]])
        .collect())
}

/// Distinct colors in first-seen order, or `None` once there are more than `limit`.
fn distinct_colors(pixels: &[[u8; 3]], limit: usize) -> Option<Vec<[u8; 3]>> {
    let mut seen = HashSet::new();
    let mut ordered = Vec::new();
    for &px in pixels {
        if seen.insert(px) {
            if ordered.len() == limit {
                return None;
            }
            ordered.push(px);
        }
    }
    Some(ordered)
}

/// Map every pixel to its nearest palette entry at index `first_slot` or later.
///
/// Slots before `first_slot` are reserved and never produced.
pub fn map_to_palette(
    pixels: &[[u8; 3]],
    palette: &[[u8; 3]],
    first_slot: usize,
) -> Result<Vec<u8>, MirrorError> {
    if first_slot >= palette.len() || palette.len() > MAX_PALETTE_LEN {
        return Err(MirrorError::QuantizationFailure(format!(
            "no usable palette slots ({} entries, first usable {first_slot})",
            palette.len()
        )));
    }

    // Searches the palette itself rather than `NeuQuant::index_of`: exact-color
    // palettes have no NeuQuant, and the fallback must never land on slot 0.
    let mut cache: HashMap<[u8; 3], u8> = HashMap::new();
    Ok(pixels
        .iter()
        .map(|px| {
            *cache
                .entry(*px)
                .or_insert_with(|| nearest(px, palette, first_slot))
        })
        .collect())
}

fn nearest(px: &[u8; 3], palette: &[[u8; 3]], first_slot: usize) -> u8 {
    let distance = |c: &[u8; 3]| -> u32 {
        (0..3)
            .map(|i| {
                let d = i32::from(px[i]) - i32::from(c[i]);
                (d * d) as u32
            })
            .sum()
    };
    palette
        .iter()
        .enumerate()
        .skip(first_slot)
        .min_by_key(|(_, c)| distance(c))
        .map(|(i, _)| i as u8)
        .unwrap_or(first_slot as u8)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn few_colors_give_exact_palette_in_order() {
        let pixels = [[9, 9, 9], [1, 2, 3], [9, 9, 9], [4, 5, 6]];
        let palette = adaptive_palette(&pixels, 255).unwrap();
        assert_eq!(palette, vec![[9, 9, 9], [1, 2, 3], [4, 5, 6]]);
    }

    #[test]
    fn many_colors_fall_back_to_neuquant() {
        let pixels: Vec<[u8; 3]> = (0..4096u32)
            .map(|i| [(i % 256) as u8, (i / 16) as u8, (i * 7 % 256) as u8])
            .collect();
        let palette = adaptive_palette(&pixels, 16).unwrap();
        assert_eq!(palette.len(), 16);
    }

    #[test]
    fn empty_input_fails() {
        assert!(matches!(
            adaptive_palette(&[], 255),
            Err(MirrorError::QuantizationFailure(_))
        ));
    }

    #[test]
    fn oversized_palette_request_fails() {
        assert!(adaptive_palette(&[[0, 0, 0]], 257).is_err());
        assert!(adaptive_palette(&[[0, 0, 0]], 0).is_err());
    }

    #[test]
    fn mapping_is_exact_for_palette_colors() {
        let palette = vec![[0, 0, 0], [255, 0, 0], [0, 0, 255]];
        let indices = map_to_palette(&[[0, 0, 255], [255, 0, 0]], &palette, 0).unwrap();
        assert_eq!(indices, vec![2, 1]);
    }

    #[test]
    fn mapping_picks_nearest_and_skips_reserved_slots() {
        let palette = vec![[0, 0, 0], [10, 10, 10], [250, 250, 250]];
        // Pure black is nearest slot 0, but slot 0 is reserved
        let indices = map_to_palette(&[[0, 0, 0], [240, 240, 240]], &palette, 1).unwrap();
        assert_eq!(indices, vec![1, 2]);
    }

    #[test]
    fn mapping_without_usable_slots_fails() {
        assert!(map_to_palette(&[[0, 0, 0]], &[[0, 0, 0]], 1).is_err());
    }
}
