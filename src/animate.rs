//! Animated pipeline: mirror every frame, composite against history,
//! re-quantize to an 8-bit palette.
//!
//! ## Frame loop
//!
//! The loop is a fold over the frames in source order. The accumulator owns
//! the previous RGBA composite, the strategy's private state and the output
//! lists, so nothing survives the call and a failed fold leaves no partial
//! result behind.
//!
//! Per frame:
//!
//! 1. Mirror the frame with the sequence's crop sizes.
//! 2. Disposal 0, 1 and 3 draw over the previous composite; disposal 2
//!    starts from the freshly mirrored frame alone.
//! 3. Quantize with the [`QuantizationStrategy`].
//! 4. The pre-quantization composite becomes the next frame's history.
//!
//! ## Strategies
//!
//! | Strategy | Palette | Transparent index | Transparent when |
//! |---|---|---|---|
//! | [`PerFramePalette`] (primary) | adaptive, rebuilt per frame | appended after the palette, only if the source declares one | alpha < 128 |
//! | [`SharedPalette`] (fallback) | adaptive from the white-flattened first frame, reused | always slot 0 | alpha == 0 |
//!
//! [`process_animated_combined`] runs the primary strategy and, on any
//! error, reruns the whole sequence from scratch with the fallback.

use crate::imaging::composite::{alpha_over, flatten_on_white, transparency_mask};
use crate::imaging::geometry::mirror;
use crate::imaging::quantize::{
    MAX_PALETTE_LEN, adaptive_palette, map_to_palette, rgb_of_rgb, rgb_of_rgba,
};
use crate::imaging::{CropSpec, MirrorError, output_dimensions};
use crate::types::{AnimatedSequence, Frame, IndexedFrame, SequenceResult};
use image::RgbaImage;
use std::fmt;

/// Palette size the primary strategy targets: 256 minus the transparent slot.
pub const DEFAULT_PALETTE_COLORS: usize = 255;

/// Color written into the transparent slot.
const TRANSPARENT_COLOR: [u8; 3] = [0, 0, 0];

/// Turns an RGBA composite into an indexed frame.
///
/// `State` is threaded through the frame loop by value; a strategy keeps
/// whatever it learns from earlier frames there.
pub trait QuantizationStrategy {
    type State: Default;

    fn kind(&self) -> StrategyKind;

    fn quantize(
        &self,
        state: &mut Self::State,
        composite: &RgbaImage,
        source_transparency: Option<u8>,
    ) -> Result<IndexedFrame, MirrorError>;
}

/// Which strategy produced a [`SequenceResult`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrategyKind {
    Primary,
    Fallback,
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StrategyKind::Primary => f.write_str("per-frame palette"),
            StrategyKind::Fallback => f.write_str("shared palette (fallback)"),
        }
    }
}

/// Primary strategy: a fresh adaptive palette for every frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PerFramePalette {
    pub max_colors: usize,
}

impl PerFramePalette {
    pub fn new(max_colors: usize) -> Self {
        Self { max_colors }
    }
}

impl Default for PerFramePalette {
    fn default() -> Self {
        Self::new(DEFAULT_PALETTE_COLORS)
    }
}

impl QuantizationStrategy for PerFramePalette {
    type State = ();

    fn kind(&self) -> StrategyKind {
        StrategyKind::Primary
    }

    fn quantize(
        &self,
        _state: &mut (),
        composite: &RgbaImage,
        source_transparency: Option<u8>,
    ) -> Result<IndexedFrame, MirrorError> {
        let pixels = rgb_of_rgba(composite);
        let mut palette = adaptive_palette(&pixels, self.max_colors)?;
        let mut indices = map_to_palette(&pixels, &palette, 0)?;

        let transparent = match source_transparency {
            None => None,
            Some(_) => {
                // The slot right after the colors in use
                let slot = palette.len();
                if slot >= MAX_PALETTE_LEN {
                    return Err(MirrorError::QuantizationFailure(format!(
                        "no room for a transparent slot after {slot} palette entries"
                    )));
                }
                palette.push(TRANSPARENT_COLOR);
                let mask = transparency_mask(composite, |alpha| alpha < 128);
                for (index, clear) in indices.iter_mut().zip(mask) {
                    if clear {
                        *index = slot as u8;
                    }
                }
                Some(slot as u8)
            }
        };

        Ok(IndexedFrame {
            width: composite.width(),
            height: composite.height(),
            palette,
            indices,
            transparent,
        })
    }
}

/// Fallback strategy: one palette, learned from the first frame.
///
/// Composites are flattened onto white before quantizing, and only fully
/// transparent pixels (alpha 0) become transparent, so white or light
/// backgrounds are never punched out by accident.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SharedPalette;

impl SharedPalette {
    /// Adaptive colors in slots 1..=255; slot 0 is the transparent color.
    const COLORS: usize = 255;
    const TRANSPARENT_SLOT: u8 = 0;
}

impl QuantizationStrategy for SharedPalette {
    type State = Option<Vec<[u8; 3]>>;

    fn kind(&self) -> StrategyKind {
        StrategyKind::Fallback
    }

    fn quantize(
        &self,
        state: &mut Self::State,
        composite: &RgbaImage,
        _source_transparency: Option<u8>,
    ) -> Result<IndexedFrame, MirrorError> {
        let flat = flatten_on_white(composite);
        let pixels = rgb_of_rgb(&flat);

        let palette = match state.take() {
            Some(palette) => palette,
            None => {
                let mut palette = vec![TRANSPARENT_COLOR];
                palette.extend(adaptive_palette(&pixels, Self::COLORS)?);
                palette
            }
        };

        let mut indices = map_to_palette(&pixels, &palette, 1)?;
        let mask = transparency_mask(composite, |alpha| alpha == 0);
        for (index, clear) in indices.iter_mut().zip(mask) {
            if clear {
                *index = Self::TRANSPARENT_SLOT;
            }
        }

        let frame = IndexedFrame {
            width: composite.width(),
            height: composite.height(),
            palette: palette.clone(),
            indices,
            transparent: Some(Self::TRANSPARENT_SLOT),
        };
        *state = Some(palette);
        Ok(frame)
    }
}

/// Values carried from one frame to the next.
struct Accumulator<S> {
    previous: Option<RgbaImage>,
    state: S,
    result: SequenceResult,
}

/// Run the frame loop with an explicit strategy.
pub fn process_animated_with<Q: QuantizationStrategy>(
    sequence: &AnimatedSequence,
    spec: &CropSpec,
    strategy: &Q,
) -> Result<SequenceResult, MirrorError> {
    check_output_area(sequence, spec)?;
    let (crop_width, crop_height) = spec.crop_dimensions(sequence.width, sequence.height);

    let start = Accumulator {
        previous: None,
        state: Q::State::default(),
        result: SequenceResult::default(),
    };

    let done = sequence
        .frames
        .iter()
        .enumerate()
        .try_fold(start, |mut acc, (position, frame)| {
            check_frame_size(sequence, frame, position)?;
            let mirrored = mirror(&frame.image, crop_width, crop_height, spec.side)?;

            let composite = match acc.previous.as_ref() {
                Some(previous) if frame.disposal().composites_over_history() => {
                    alpha_over(previous, &mirrored)?
                }
                _ => mirrored,
            };

            let indexed = strategy.quantize(
                &mut acc.state,
                &composite,
                sequence.transparency_index,
            )?;
            acc.result
                .push(indexed, frame.duration(), frame.disposal());
            acc.previous = Some(composite);
            Ok::<_, MirrorError>(acc)
        })?;

    Ok(done.result)
}

/// A 0% kept share leaves nothing to quantize.
fn check_output_area(sequence: &AnimatedSequence, spec: &CropSpec) -> Result<(), MirrorError> {
    let (w, h) = output_dimensions(sequence.width, sequence.height, spec);
    if w == 0 || h == 0 {
        return Err(MirrorError::GeometryConstraintViolation(format!(
            "{} at {}%/{}% of {}x{} leaves a {w}x{h} frame",
            spec.side,
            spec.horizontal.value(),
            spec.vertical.value(),
            sequence.width,
            sequence.height
        )));
    }
    Ok(())
}

fn check_frame_size(
    sequence: &AnimatedSequence,
    frame: &Frame,
    position: usize,
) -> Result<(), MirrorError> {
    let (w, h) = frame.image.dimensions();
    if (w, h) != (sequence.width, sequence.height) {
        return Err(MirrorError::GeometryConstraintViolation(format!(
            "frame {position} is {w}x{h}, sequence canvas is {}x{}",
            sequence.width, sequence.height
        )));
    }
    Ok(())
}

/// Primary pipeline: per-frame palettes, source transparency preserved.
pub fn process_animated(
    sequence: &AnimatedSequence,
    spec: &CropSpec,
) -> Result<SequenceResult, MirrorError> {
    process_animated_with(sequence, spec, &PerFramePalette::default())
}

/// Fallback pipeline: first-frame palette, full transparency only.
pub fn process_animated_fallback(
    sequence: &AnimatedSequence,
    spec: &CropSpec,
) -> Result<SequenceResult, MirrorError> {
    process_animated_with(sequence, spec, &SharedPalette)
}

/// Try `primary`; on any failure rerun everything with `fallback`.
///
/// Nothing from the failed attempt is kept. If the fallback fails too, its
/// error is returned.
pub fn select_with<P, F>(
    sequence: &AnimatedSequence,
    spec: &CropSpec,
    primary: &P,
    fallback: &F,
) -> Result<(SequenceResult, StrategyKind), MirrorError>
where
    P: QuantizationStrategy,
    F: QuantizationStrategy,
{
    // Both strategies would fail on this the same way
    check_output_area(sequence, spec)?;
    match process_animated_with(sequence, spec, primary) {
        Ok(result) => Ok((result, primary.kind())),
        Err(_) => process_animated_with(sequence, spec, fallback).map(|r| (r, fallback.kind())),
    }
}

/// Pipeline selector with the default strategies.
pub fn process_animated_combined(
    sequence: &AnimatedSequence,
    spec: &CropSpec,
) -> Result<SequenceResult, MirrorError> {
    select_with(sequence, spec, &PerFramePalette::default(), &SharedPalette).map(|(r, _)| r)
}
