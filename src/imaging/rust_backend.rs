//! Pure Rust codec backend.
//!
//! Everything is statically linked into the binary.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Decode GIF (animated) | `gif` crate, RGBA output, frames rendered onto a running canvas |
//! | Decode (JPEG, PNG, TIFF, WebP, BMP) | `image` crate (pure Rust decoders) |
//! | EXIF orientation | `image::ImageDecoder::orientation` |
//! | Encode still | `image::ImageBuffer::save_with_format`, RGB for JPEG |
//! | Encode animation | `gif::Encoder`, local palette per frame, infinite loop |

use super::backend::{BackendError, DecodedImage, ImageBackend};
use crate::types::{AnimatedSequence, Disposal, Frame, SequenceResult, StaticImage};
use image::buffer::ConvertBuffer;
use image::{DynamicImage, ImageDecoder, ImageFormat, ImageReader, Rgba, RgbImage, RgbaImage};
use std::borrow::Cow;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;
use std::sync::LazyLock;

/// Extensions whose decoders may be compiled in.
const INPUT_CANDIDATES: &[(&str, ImageFormat)] = &[
    ("gif", ImageFormat::Gif),
    ("jpg", ImageFormat::Jpeg),
    ("jpeg", ImageFormat::Jpeg),
    ("png", ImageFormat::Png),
    ("tif", ImageFormat::Tiff),
    ("tiff", ImageFormat::Tiff),
    ("webp", ImageFormat::WebP),
    ("bmp", ImageFormat::Bmp),
];

static SUPPORTED_EXTENSIONS: LazyLock<Vec<&'static str>> = LazyLock::new(|| {
    INPUT_CANDIDATES
        .iter()
        .filter(|(_, fmt)| fmt.reading_enabled())
        .map(|(ext, _)| *ext)
        .collect()
});

/// Returns the set of image file extensions that have working decoders compiled in.
pub fn supported_input_extensions() -> &'static [&'static str] {
    &SUPPORTED_EXTENSIONS
}

/// Pure Rust backend using the `image` and `gif` crates.
///
/// See the [module docs](self) for the crate-to-operation mapping.
pub struct RustBackend;

impl RustBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RustBackend {
    fn default() -> Self {
        Self::new()
    }
}

fn decode_error(path: &Path, err: impl std::fmt::Display) -> BackendError {
    BackendError::Decode(format!("{}: {}", path.display(), err))
}

fn encode_error(path: &Path, err: impl std::fmt::Display) -> BackendError {
    BackendError::Encode(format!("{}: {}", path.display(), err))
}

fn disposal_of(method: gif::DisposalMethod) -> Disposal {
    match method {
        gif::DisposalMethod::Any => Disposal::Unspecified,
        gif::DisposalMethod::Keep => Disposal::Keep,
        gif::DisposalMethod::Background => Disposal::Background,
        gif::DisposalMethod::Previous => Disposal::Previous,
    }
}

/// GIF delays are centiseconds; 0 means the file declared none.
fn delay_ms(delay_cs: u16) -> Option<u32> {
    (delay_cs > 0).then(|| u32::from(delay_cs) * 10)
}

fn delay_cs(duration_ms: u32) -> u16 {
    (duration_ms / 10).min(u32::from(u16::MAX)) as u16
}

/// Decode every GIF frame into a full-canvas RGBA image.
///
/// Frames may cover only part of the logical screen, so each one is drawn
/// onto a running canvas that then gets disposed the way the frame asks.
fn decode_gif(path: &Path) -> Result<DecodedImage, BackendError> {
    let file = File::open(path)?;
    let mut options = gif::DecodeOptions::new();
    options.set_color_output(gif::ColorOutput::RGBA);
    let mut decoder = options
        .read_info(BufReader::new(file))
        .map_err(|e| decode_error(path, e))?;

    let width = u32::from(decoder.width());
    let height = u32::from(decoder.height());
    let clear = Rgba([0, 0, 0, 0]);

    let mut canvas = RgbaImage::from_pixel(width, height, clear);
    let mut saved = canvas.clone();
    let mut frames = Vec::new();
    let mut transparency_index = None;

    while let Some(frame) = decoder
        .read_next_frame()
        .map_err(|e| decode_error(path, e))?
    {
        if frames.is_empty() {
            transparency_index = frame.transparent;
        }
        let (left, top) = (u32::from(frame.left), u32::from(frame.top));
        let (fw, fh) = (u32::from(frame.width), u32::from(frame.height));

        if frame.dispose == gif::DisposalMethod::Previous {
            saved = canvas.clone();
        }

        for (i, px) in frame.buffer.chunks_exact(4).enumerate() {
            let (fx, fy) = (i as u32 % fw.max(1), i as u32 / fw.max(1));
            let (cx, cy) = (left + fx, top + fy);
            if cx < width && cy < height && px[3] > 0 {
                canvas.put_pixel(cx, cy, Rgba([px[0], px[1], px[2], px[3]]));
            }
        }

        let mut decoded = Frame::new(canvas.clone()).with_disposal(disposal_of(frame.dispose));
        decoded.duration_ms = delay_ms(frame.delay);
        frames.push(decoded);

        match frame.dispose {
            gif::DisposalMethod::Background => {
                for y in top..(top + fh).min(height) {
                    for x in left..(left + fw).min(width) {
                        canvas.put_pixel(x, y, clear);
                    }
                }
            }
            gif::DisposalMethod::Previous => canvas = saved.clone(),
            _ => {}
        }
    }

    match frames.len() {
        0 => Err(decode_error(path, "GIF contains no frames")),
        1 => {
            let only = frames.remove(0);
            Ok(DecodedImage::Static(StaticImage {
                image: DynamicImage::ImageRgba8(only.image),
                orientation: None,
            }))
        }
        _ => Ok(DecodedImage::Animated(AnimatedSequence {
            width,
            height,
            transparency_index,
            frames,
        })),
    }
}

/// Decode a still image and read its EXIF orientation, if the format has one.
fn decode_still(reader: ImageReader<BufReader<File>>, path: &Path) -> Result<DecodedImage, BackendError> {
    let mut decoder = reader.into_decoder().map_err(|e| decode_error(path, e))?;
    let orientation = decoder.orientation().ok().map(|o| o.to_exif());
    let image = DynamicImage::from_decoder(decoder).map_err(|e| decode_error(path, e))?;
    Ok(DecodedImage::Static(StaticImage { image, orientation }))
}

fn gif_dimension(value: u32, path: &Path) -> Result<u16, BackendError> {
    u16::try_from(value).map_err(|_| {
        encode_error(path, format!("dimension {value} exceeds GIF maximum (65535)"))
    })
}

impl ImageBackend for RustBackend {
    fn decode(&self, path: &Path) -> Result<DecodedImage, BackendError> {
        let reader = ImageReader::open(path)?.with_guessed_format()?;
        match reader.format() {
            Some(ImageFormat::Gif) => decode_gif(path),
            Some(format) if format.reading_enabled() => decode_still(reader, path),
            Some(format) => Err(BackendError::UnsupportedFormat(format!("{format:?}"))),
            None => Err(BackendError::UnsupportedFormat(path.display().to_string())),
        }
    }

    fn save_static(&self, image: &RgbaImage, path: &Path) -> Result<(), BackendError> {
        let format = ImageFormat::from_path(path)
            .ok()
            .filter(|f| f.writing_enabled())
            .ok_or_else(|| BackendError::UnsupportedFormat(path.display().to_string()))?;

        // No alpha channel in JPEG
        let written = match format {
            ImageFormat::Jpeg => {
                let rgb: RgbImage = image.convert();
                rgb.save_with_format(path, format)
            }
            _ => image.save_with_format(path, format),
        };
        written.map_err(|e| encode_error(path, e))
    }

    fn save_animation(&self, result: &SequenceResult, path: &Path) -> Result<(), BackendError> {
        let first = result
            .frames
            .first()
            .ok_or_else(|| encode_error(path, "no frames to encode"))?;
        let width = gif_dimension(first.width, path)?;
        let height = gif_dimension(first.height, path)?;

        let file = File::create(path)?;
        let mut encoder = gif::Encoder::new(BufWriter::new(file), width, height, &[])
            .map_err(|e| encode_error(path, e))?;
        encoder
            .set_repeat(gif::Repeat::Infinite)
            .map_err(|e| encode_error(path, e))?;

        for (frame, &duration) in result.frames.iter().zip(&result.durations) {
            let out = gif::Frame {
                width: gif_dimension(frame.width, path)?,
                height: gif_dimension(frame.height, path)?,
                delay: delay_cs(duration),
                dispose: gif::DisposalMethod::Background,
                transparent: frame.transparent,
                palette: Some(frame.flat_palette()),
                buffer: Cow::Borrowed(&frame.indices),
                ..Default::default()
            };
            encoder
                .write_frame(&out)
                .map_err(|e| encode_error(path, e))?;
        }

        let mut writer = encoder.into_inner()?;
        writer.flush()?;
        Ok(())
    }
}
