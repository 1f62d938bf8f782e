//! Input discovery.
//!
//! Command-line inputs can be files or directories. Files are taken as
//! given, whatever their extension, so the decoder gets to say whether it
//! understands them. Directories are walked recursively and contribute only
//! files with a [supported extension](crate::imaging::supported_input_extensions),
//! in file-name order.
//!
//! The output directory is never descended into, so re-running a batch over
//! a folder that contains its own output does not mirror the mirrors.

use crate::imaging::supported_input_extensions;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::{DirEntry, WalkDir};

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Failed to walk {path}: {message}")]
    Walk { path: PathBuf, message: String },
}

fn has_supported_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| {
            supported_input_extensions()
                .iter()
                .any(|s| s.eq_ignore_ascii_case(ext))
        })
}

/// Expand files and directories into the list of files to mirror.
///
/// Duplicates (the same file named twice, or reached via two arguments) are
/// kept once, at their first position.
pub fn collect_inputs(inputs: &[PathBuf], output_dir: &Path) -> Result<Vec<PathBuf>, ScanError> {
    let mut files = Vec::new();
    let output_dir = output_dir.canonicalize().ok();
    let skip_output = |entry: &DirEntry| {
        !entry.file_type().is_dir()
            || output_dir
                .as_deref()
                .is_none_or(|out| entry.path().canonicalize().ok().as_deref() != Some(out))
    };

    for input in inputs {
        if !input.is_dir() {
            files.push(input.clone());
            continue;
        }

        for entry in WalkDir::new(input)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(&skip_output)
        {
            let entry = entry.map_err(|err| ScanError::Walk {
                path: input.clone(),
                message: err.to_string(),
            })?;
            if entry.file_type().is_file() && has_supported_extension(entry.path()) {
                files.push(entry.into_path());
            }
        }
    }

    let mut seen = std::collections::HashSet::new();
    files.retain(|f| seen.insert(f.clone()));
    Ok(files)
}
