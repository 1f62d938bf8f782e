//! CLI output formatting for mirror runs.
//!
//! # Information-First Display
//!
//! Every input gets a header line with its positional index and file name,
//! followed by indented context: where the result went and what came out.
//! Failures use the same shape so a batch reads as one inventory.
//!
//! # Output Format
//!
//! ```text
//! Mirroring 3 images
//! 001 cat.gif
//!     Output: out/right_60_cat.gif
//!     Animated: 12 frames, per-frame palette
//! 002 portrait.jpg
//!     Output: out/q1_30_portrait.jpg
//!     Static: 640x960
//! 003 huge.png
//!     Failed: huge.png is 52428800 bytes, over the 10485760 byte limit
//!
//! Mirrored 2 of 3 images
//! ```
//!
//! # Architecture
//!
//! Each display has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure and do no I/O.

use crate::process::{ImageSummary, ProcessError, ProcessEvent, ProcessedImage};
use std::path::Path;

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// File name for display, falling back to the whole path.
fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|f| f.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn summary_line(summary: &ImageSummary) -> String {
    match summary {
        ImageSummary::Static { width, height } => format!("Static: {}x{}", width, height),
        ImageSummary::Animated { frames, strategy } => {
            format!("Animated: {} frames, {}", frames, strategy)
        }
    }
}

/// Format one progress event from [`process_batch`](crate::process::process_batch).
pub fn format_process_event(event: &ProcessEvent) -> Vec<String> {
    match event {
        ProcessEvent::BatchStarted { total } => {
            let noun = if *total == 1 { "image" } else { "images" };
            vec![format!("Mirroring {} {}", total, noun)]
        }
        ProcessEvent::ImageMirrored {
            index,
            source,
            output,
            summary,
        } => vec![
            format!("{} {}", format_index(*index), display_name(source)),
            format!("{}Output: {}", indent(1), output.display()),
            format!("{}{}", indent(1), summary_line(summary)),
        ],
        ProcessEvent::ImageFailed {
            index,
            source,
            error,
        } => vec![
            format!("{} {}", format_index(*index), display_name(source)),
            format!("{}Failed: {}", indent(1), error),
        ],
    }
}

/// Format the closing tally of a batch.
pub fn format_batch_summary(results: &[Result<ProcessedImage, ProcessError>]) -> Vec<String> {
    let ok = results.iter().filter(|r| r.is_ok()).count();
    vec![
        String::new(),
        format!("Mirrored {} of {} images", ok, results.len()),
    ]
}

pub fn print_process_event(event: &ProcessEvent) {
    for line in format_process_event(event) {
        println!("{}", line);
    }
}

pub fn print_batch_summary(results: &[Result<ProcessedImage, ProcessError>]) {
    for line in format_batch_summary(results) {
        println!("{}", line);
    }
}
