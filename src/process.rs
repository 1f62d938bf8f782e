//! File-level mirroring: decode, run the right pipeline, encode.
//!
//! ## Request vs. crop
//!
//! A [`MirrorRequest`] carries what the user typed: a side and the position
//! of the cut lines, measured from the left and top edges. The pixel core
//! wants the share it *keeps*, so [`MirrorRequest::crop_spec`] flips the
//! percentages for sides that keep the right or bottom part.
//!
//! ## Output
//!
//! ```text
//! out/
//! ├── right_60_cat.gif      # side, kept horizontal share, original name
//! └── q1_30_portrait.jpg
//! ```
//!
//! Static inputs go through [`process_static`]; animated GIFs go through the
//! strategy selector in [`animate`](crate::animate) and are written back as
//! an infinitely looping GIF.
//!
//! ## Parallel Processing
//!
//! [`process_batch`] runs files in parallel using
//! [rayon](https://docs.rs/rayon). A failing file is reported and skipped;
//! the others carry on. Inputs from different folders can share a file
//! name; only the first of them is written, the rest fail with
//! [`ProcessError::OutputCollision`].

use crate::animate::{PerFramePalette, SharedPalette, StrategyKind, select_with};
use crate::config::KaleidoConfig;
use crate::imaging::{
    BackendError, CropSpec, DecodedImage, ImageBackend, MirrorError, Percent, Side, kept_shares,
    mirror_with_spec, normalize_orientation, output_file_name,
};
use crate::types::StaticImage;
use image::RgbaImage;
use rayon::prelude::*;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProcessError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Image processing failed: {0}")]
    Imaging(#[from] BackendError),
    #[error("Mirror failed: {0}")]
    Mirror(#[from] MirrorError),
    #[error("Source image not found: {0}")]
    SourceNotFound(PathBuf),
    #[error("{path} is {size} bytes, over the {limit} byte limit")]
    FileTooLarge { path: PathBuf, size: u64, limit: u64 },
    #[error("{path} would overwrite {output}, already written for {first}")]
    OutputCollision {
        path: PathBuf,
        output: PathBuf,
        first: PathBuf,
    },
}

/// What to mirror, as the user asked for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MirrorRequest {
    pub side: Side,
    /// Cut-line position from the left edge.
    pub horizontal: Percent,
    /// Cut-line position from the top edge.
    pub vertical: Percent,
}

impl MirrorRequest {
    pub fn new(side: Side, horizontal: u32, vertical: u32) -> Result<Self, MirrorError> {
        Ok(Self {
            side,
            horizontal: Percent::new(horizontal)?,
            vertical: Percent::new(vertical)?,
        })
    }

    /// Build a request from the `[mirror]` config section.
    pub fn from_config(config: &KaleidoConfig) -> Result<Self, MirrorError> {
        Self::new(
            config.mirror.side,
            config.mirror.horizontal_percent,
            config.mirror.vertical_percent,
        )
    }

    /// The shares the geometry keeps for this request.
    pub fn crop_spec(&self) -> CropSpec {
        let (horizontal, vertical) = kept_shares(self.side, self.horizontal, self.vertical);
        CropSpec {
            horizontal,
            vertical,
            side: self.side,
        }
    }
}

/// Knobs that do not change the geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessOptions {
    /// Palette size for the primary animated strategy.
    pub palette_colors: usize,
    /// Inputs larger than this many bytes are rejected.
    pub max_file_size: u64,
}

impl ProcessOptions {
    pub fn from_config(config: &KaleidoConfig) -> Self {
        Self {
            palette_colors: config.animation.palette_colors as usize,
            max_file_size: config.limits.max_file_size_bytes(),
        }
    }
}

impl Default for ProcessOptions {
    fn default() -> Self {
        Self::from_config(&KaleidoConfig::default())
    }
}

/// How an image came out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageSummary {
    Static { width: u32, height: u32 },
    Animated { frames: usize, strategy: StrategyKind },
}

/// A successfully mirrored file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessedImage {
    pub source: PathBuf,
    pub output: PathBuf,
    pub summary: ImageSummary,
}

/// Progress events emitted by [`process_batch`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessEvent {
    BatchStarted {
        total: usize,
    },
    ImageMirrored {
        /// 1-based position in the input list.
        index: usize,
        source: PathBuf,
        output: PathBuf,
        summary: ImageSummary,
    },
    ImageFailed {
        index: usize,
        source: PathBuf,
        error: String,
    },
}

/// Static pipeline: upright the image, then mirror it.
///
/// The result is always RGBA; the backend drops alpha for formats that
/// cannot store it.
pub fn process_static(image: StaticImage, spec: &CropSpec) -> Result<RgbaImage, MirrorError> {
    let upright = normalize_orientation(image.image, image.orientation);
    mirror_with_spec(&upright.to_rgba8(), spec)
}

/// Where `input` lands inside `output_dir`.
pub fn output_path(
    input: &Path,
    output_dir: &Path,
    request: &MirrorRequest,
) -> Result<PathBuf, ProcessError> {
    let file_name = input
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| ProcessError::SourceNotFound(input.to_path_buf()))?;
    let spec = request.crop_spec();
    Ok(output_dir.join(output_file_name(spec.side, spec.horizontal, &file_name)))
}

/// For each input, the earlier input already writing to the same output path.
fn output_collisions(
    inputs: &[PathBuf],
    output_dir: &Path,
    request: &MirrorRequest,
) -> Vec<Option<(PathBuf, PathBuf)>> {
    let mut claimed: HashMap<PathBuf, &PathBuf> = HashMap::new();
    inputs
        .iter()
        .map(|input| {
            let output = output_path(input, output_dir, request).ok()?;
            match claimed.get(&output) {
                Some(first) => Some((output, (*first).clone())),
                None => {
                    claimed.insert(output, input);
                    None
                }
            }
        })
        .collect()
}

/// Mirror one file into `output_dir`.
pub fn process_file(
    backend: &impl ImageBackend,
    input: &Path,
    output_dir: &Path,
    request: &MirrorRequest,
    options: &ProcessOptions,
) -> Result<ProcessedImage, ProcessError> {
    let metadata = std::fs::metadata(input)
        .map_err(|_| ProcessError::SourceNotFound(input.to_path_buf()))?;
    if !metadata.is_file() {
        return Err(ProcessError::SourceNotFound(input.to_path_buf()));
    }
    if metadata.len() > options.max_file_size {
        return Err(ProcessError::FileTooLarge {
            path: input.to_path_buf(),
            size: metadata.len(),
            limit: options.max_file_size,
        });
    }

    let spec = request.crop_spec();
    let output = output_path(input, output_dir, request)?;

    let decoded = backend.decode(input)?;
    std::fs::create_dir_all(output_dir)?;

    let summary = match decoded {
        DecodedImage::Static(image) => {
            let mirrored = process_static(image, &spec)?;
            backend.save_static(&mirrored, &output)?;
            ImageSummary::Static {
                width: mirrored.width(),
                height: mirrored.height(),
            }
        }
        DecodedImage::Animated(sequence) => {
            let (result, strategy) = select_with(
                &sequence,
                &spec,
                &PerFramePalette::new(options.palette_colors),
                &SharedPalette,
            )?;
            backend.save_animation(&result, &output)?;
            ImageSummary::Animated {
                frames: result.len(),
                strategy,
            }
        }
    };

    Ok(ProcessedImage {
        source: input.to_path_buf(),
        output,
        summary,
    })
}

/// Mirror every input in parallel.
///
/// Results come back in input order. When `events` is given, progress is
/// sent there as files finish (in completion order).
pub fn process_batch(
    backend: &impl ImageBackend,
    inputs: &[PathBuf],
    output_dir: &Path,
    request: &MirrorRequest,
    options: &ProcessOptions,
    events: Option<Sender<ProcessEvent>>,
) -> Vec<Result<ProcessedImage, ProcessError>> {
    if let Some(tx) = &events {
        tx.send(ProcessEvent::BatchStarted {
            total: inputs.len(),
        })
        .ok();
    }

    let collisions = output_collisions(inputs, output_dir, request);

    inputs
        .par_iter()
        .zip(collisions)
        .enumerate()
        .map(|(i, (input, collision))| {
            let result = match collision {
                Some((output, first)) => Err(ProcessError::OutputCollision {
                    path: input.clone(),
                    output,
                    first,
                }),
                None => process_file(backend, input, output_dir, request, options),
            };
            if let Some(tx) = &events {
                let event = match &result {
                    Ok(done) => ProcessEvent::ImageMirrored {
                        index: i + 1,
                        source: done.source.clone(),
                        output: done.output.clone(),
                        summary: done.summary.clone(),
                    },
                    Err(e) => ProcessEvent::ImageFailed {
                        index: i + 1,
                        source: input.clone(),
                        error: e.to_string(),
                    },
                };
                tx.send(event).ok();
            }
            result
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::backend::tests::{MockBackend, RecordedOp};
    use crate::test_helpers::{gradient_rgba, sequence_of, solid_rgba};
    use crate::types::{AnimatedSequence, Disposal, Frame};
    use image::{DynamicImage, Rgba};
    use std::fs;
    use tempfile::TempDir;

    /// Create `name` with a few bytes so size checks pass.
    fn touch(dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, b"stub").unwrap();
        path
    }

    fn still(width: u32, height: u32) -> DecodedImage {
        DecodedImage::Static(StaticImage {
            image: DynamicImage::ImageRgba8(gradient_rgba(width, height)),
            orientation: None,
        })
    }

    fn two_frame_gif() -> AnimatedSequence {
        sequence_of(
            vec![
                Frame::new(gradient_rgba(20, 10))
                    .with_duration(50)
                    .with_disposal(Disposal::Background),
                Frame::new(gradient_rgba(20, 10))
                    .with_duration(150)
                    .with_disposal(Disposal::Keep),
            ],
            None,
        )
    }

    // =========================================================================
    // Request translation
    // =========================================================================

    #[test]
    fn request_keeps_complement_for_right_side() {
        let spec = MirrorRequest::new(Side::Right, 40, 10).unwrap().crop_spec();
        assert_eq!(spec.horizontal.value(), 60);
        assert_eq!(spec.vertical.value(), 10);
    }

    #[test]
    fn request_rejects_out_of_range() {
        assert!(matches!(
            MirrorRequest::new(Side::Left, 101, 0),
            Err(MirrorError::GeometryConstraintViolation(_))
        ));
    }

    #[test]
    fn request_from_config_reads_mirror_section() {
        let mut config = KaleidoConfig::default();
        config.mirror.side = Side::Q2;
        config.mirror.horizontal_percent = 30;
        config.mirror.vertical_percent = 80;

        let request = MirrorRequest::from_config(&config).unwrap();
        assert_eq!(request, MirrorRequest::new(Side::Q2, 30, 80).unwrap());
    }

    #[test]
    fn options_default_from_stock_config() {
        let options = ProcessOptions::default();
        assert_eq!(options.palette_colors, 255);
        assert_eq!(options.max_file_size, 10 * 1024 * 1024);
    }

    // =========================================================================
    // Static pipeline
    // =========================================================================

    #[test]
    fn static_left_30_on_100x100() {
        let image = StaticImage {
            image: DynamicImage::ImageRgba8(gradient_rgba(100, 100)),
            orientation: None,
        };
        let spec = CropSpec::new(30, 100, Side::Left).unwrap();
        let out = process_static(image, &spec).unwrap();
        assert_eq!(out.dimensions(), (60, 100));
    }

    #[test]
    fn static_applies_orientation_before_mirroring() {
        // 40x20 stored sideways; code 6 makes it 20x40
        let image = StaticImage {
            image: DynamicImage::ImageRgba8(gradient_rgba(40, 20)),
            orientation: Some(6),
        };
        let spec = CropSpec::new(50, 100, Side::Left).unwrap();
        let out = process_static(image, &spec).unwrap();
        assert_eq!(out.dimensions(), (20, 40));
    }

    #[test]
    fn static_output_is_rgba_for_rgb_input() {
        let image = StaticImage {
            image: DynamicImage::ImageRgb8(image::RgbImage::new(4, 4)),
            orientation: None,
        };
        let out = process_static(image, &CropSpec::new(50, 50, Side::Up).unwrap()).unwrap();
        assert_eq!(*out.get_pixel(0, 0), Rgba([0, 0, 0, 255]));
    }

    // =========================================================================
    // process_file with MockBackend
    // =========================================================================

    #[test]
    fn process_file_static_saves_under_prefixed_name() {
        let tmp = TempDir::new().unwrap();
        let input = touch(tmp.path(), "cat.png");
        let out_dir = tmp.path().join("out");
        let backend = MockBackend::with_decoded(vec![still(100, 50)]);
        let request = MirrorRequest::new(Side::Right, 40, 50).unwrap();

        let done = process_file(&backend, &input, &out_dir, &request, &ProcessOptions::default())
            .unwrap();

        assert_eq!(done.output, out_dir.join("right_60_cat.png"));
        assert_eq!(
            done.summary,
            ImageSummary::Static {
                width: 120,
                height: 50
            }
        );
        assert!(out_dir.is_dir());
        let ops = backend.get_operations();
        assert_eq!(ops.len(), 2);
        assert!(matches!(
            &ops[1],
            RecordedOp::SaveStatic { width: 120, height: 50, output } if output.ends_with("right_60_cat.png")
        ));
    }

    #[test]
    fn process_file_animated_preserves_durations() {
        let tmp = TempDir::new().unwrap();
        let input = touch(tmp.path(), "loop.gif");
        let backend = MockBackend::with_decoded(vec![DecodedImage::Animated(two_frame_gif())]);
        let request = MirrorRequest::new(Side::Right, 40, 0).unwrap();

        let done = process_file(
            &backend,
            &input,
            tmp.path(),
            &request,
            &ProcessOptions::default(),
        )
        .unwrap();

        assert_eq!(
            done.summary,
            ImageSummary::Animated {
                frames: 2,
                strategy: StrategyKind::Primary
            }
        );
        let ops = backend.get_operations();
        assert!(matches!(
            &ops[1],
            RecordedOp::SaveAnimation { frames: 2, durations, .. } if *durations == vec![50, 150]
        ));
    }

    #[test]
    fn process_file_missing_source() {
        let tmp = TempDir::new().unwrap();
        let backend = MockBackend::new();
        let result = process_file(
            &backend,
            &tmp.path().join("nope.gif"),
            tmp.path(),
            &MirrorRequest::new(Side::Left, 50, 50).unwrap(),
            &ProcessOptions::default(),
        );
        assert!(matches!(result, Err(ProcessError::SourceNotFound(_))));
        assert!(backend.get_operations().is_empty());
    }

    #[test]
    fn process_file_rejects_oversized_input() {
        let tmp = TempDir::new().unwrap();
        let input = tmp.path().join("big.png");
        fs::write(&input, vec![0u8; 2048]).unwrap();
        let backend = MockBackend::with_decoded(vec![still(4, 4)]);
        let options = ProcessOptions {
            max_file_size: 1024,
            ..ProcessOptions::default()
        };

        let result = process_file(
            &backend,
            &input,
            tmp.path(),
            &MirrorRequest::new(Side::Left, 50, 50).unwrap(),
            &options,
        );

        assert!(matches!(
            result,
            Err(ProcessError::FileTooLarge {
                size: 2048,
                limit: 1024,
                ..
            })
        ));
        assert!(backend.get_operations().is_empty());
    }

    #[test]
    fn process_file_propagates_decode_failure() {
        let tmp = TempDir::new().unwrap();
        let input = touch(tmp.path(), "broken.png");
        let result = process_file(
            &MockBackend::new(),
            &input,
            tmp.path(),
            &MirrorRequest::new(Side::Left, 50, 50).unwrap(),
            &ProcessOptions::default(),
        );
        assert!(matches!(result, Err(ProcessError::Imaging(_))));
    }

    #[test]
    fn process_file_reports_fallback_strategy() {
        let tmp = TempDir::new().unwrap();
        let input = touch(tmp.path(), "busy.gif");
        let seq = sequence_of(
            vec![
                Frame::new(crate::test_helpers::distinct_color_rgba(16, 16)),
                Frame::new(solid_rgba(16, 16, Rgba([9, 9, 9, 255]))),
            ],
            Some(0),
        );
        let backend = MockBackend::with_decoded(vec![DecodedImage::Animated(seq)]);
        let options = ProcessOptions {
            palette_colors: 256,
            ..ProcessOptions::default()
        };

        let done = process_file(
            &backend,
            &input,
            tmp.path(),
            &MirrorRequest::new(Side::Left, 100, 100).unwrap(),
            &options,
        )
        .unwrap();

        assert_eq!(
            done.summary,
            ImageSummary::Animated {
                frames: 2,
                strategy: StrategyKind::Fallback
            }
        );
    }

    // =========================================================================
    // process_batch
    // =========================================================================

    #[test]
    fn batch_keeps_input_order_and_reports_events() {
        let tmp = TempDir::new().unwrap();
        let good = touch(tmp.path(), "a.png");
        let missing = tmp.path().join("b.png");
        let inputs = vec![good.clone(), missing.clone()];
        let backend = MockBackend::with_decoded(vec![still(10, 10)]);
        let (tx, rx) = std::sync::mpsc::channel();

        let results = process_batch(
            &backend,
            &inputs,
            &tmp.path().join("out"),
            &MirrorRequest::new(Side::Up, 50, 50).unwrap(),
            &ProcessOptions::default(),
            Some(tx),
        );

        assert_eq!(results.len(), 2);
        assert!(results[0].is_ok());
        assert!(matches!(results[1], Err(ProcessError::SourceNotFound(_))));

        let events: Vec<ProcessEvent> = rx.iter().collect();
        assert_eq!(events.len(), 3);
        assert_eq!(events[0], ProcessEvent::BatchStarted { total: 2 });
        assert!(events.iter().any(|e| matches!(
            e,
            ProcessEvent::ImageMirrored { index: 1, source, .. } if *source == good
        )));
        assert!(events.iter().any(|e| matches!(
            e,
            ProcessEvent::ImageFailed { index: 2, source, .. } if *source == missing
        )));
    }

    #[test]
    fn batch_refuses_same_named_inputs_from_different_folders() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir_all(tmp.path().join("a")).unwrap();
        fs::create_dir_all(tmp.path().join("b")).unwrap();
        let first = touch(&tmp.path().join("a"), "cat.png");
        let second = touch(&tmp.path().join("b"), "cat.png");
        let out_dir = tmp.path().join("out");
        let backend = MockBackend::with_decoded(vec![still(10, 10)]);

        let results = process_batch(
            &backend,
            &[first.clone(), second.clone()],
            &out_dir,
            &MirrorRequest::new(Side::Left, 50, 50).unwrap(),
            &ProcessOptions::default(),
            None,
        );

        assert_eq!(results[0].as_ref().unwrap().output, out_dir.join("left_50_cat.png"));
        match &results[1] {
            Err(ProcessError::OutputCollision {
                path,
                output,
                first: claimed_by,
            }) => {
                assert_eq!(*path, second);
                assert_eq!(*output, out_dir.join("left_50_cat.png"));
                assert_eq!(*claimed_by, first);
            }
            other => panic!("expected an output collision, got {other:?}"),
        }

        // Only the first input was decoded and written
        let ops = backend.get_operations();
        assert_eq!(ops.len(), 2);
        assert_eq!(
            ops.iter()
                .filter(|op| matches!(op, RecordedOp::SaveStatic { .. }))
                .count(),
            1
        );
    }

    #[test]
    fn output_path_prefixes_side_and_kept_share() {
        let request = MirrorRequest::new(Side::Down, 50, 20).unwrap();
        let path = output_path(Path::new("in/sub/dog.gif"), Path::new("out"), &request).unwrap();
        assert_eq!(path, PathBuf::from("out/down_50_dog.gif"));
    }

    #[test]
    fn batch_without_events_still_processes() {
        let tmp = TempDir::new().unwrap();
        let input = touch(tmp.path(), "a.png");
        let backend = MockBackend::with_decoded(vec![still(6, 6)]);
        let results = process_batch(
            &backend,
            &[input],
            tmp.path(),
            &MirrorRequest::new(Side::Q4, 50, 50).unwrap(),
            &ProcessOptions::default(),
            None,
        );
        assert!(results[0].is_ok());
    }
}
