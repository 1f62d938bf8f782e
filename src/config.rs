//! Tool configuration module.
//!
//! Handles loading, validating, and merging `kaleido.toml`. Stock defaults
//! are the base layer; a user file overrides just the keys it names, and
//! command-line flags override both.
//!
//! ## Config File Location
//!
//! `kaleido mirror` looks for `kaleido.toml` in the current directory, or
//! reads the file given with `--config`:
//!
//! ```text
//! project/
//! ├── kaleido.toml      # optional
//! ├── cat.gif
//! └── portrait.jpg
//! ```
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [mirror]
//! side = "left"              # left, right, up, down, q1, q2, q3, q4
//! horizontal_percent = 50    # Cut line from the left edge (0-100)
//! vertical_percent = 50      # Cut line from the top edge (0-100)
//!
//! [animation]
//! palette_colors = 255       # Per-frame palette size for animated GIFs (2-256)
//!
//! [limits]
//! max_file_size_mb = 10      # Larger inputs are rejected
//!
//! [processing]
//! max_processes = 4          # Max parallel workers (omit for auto = CPU cores)
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::imaging::Side;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// File name looked up when no `--config` is given.
pub const CONFIG_FILE_NAME: &str = "kaleido.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("TOML serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Tool configuration loaded from `kaleido.toml`.
///
/// All fields have sensible defaults. User config files need only specify
/// the values they want to override. Unknown keys are rejected.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct KaleidoConfig {
    /// Default side and cut-line positions.
    pub mirror: MirrorConfig,
    /// Animated GIF re-quantization.
    pub animation: AnimationConfig,
    /// Input guards.
    pub limits: LimitsConfig,
    /// Parallel processing settings.
    pub processing: ProcessingConfig,
}

impl KaleidoConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.mirror.horizontal_percent > 100 {
            return Err(ConfigError::Validation(
                "mirror.horizontal_percent must be 0-100".into(),
            ));
        }
        if self.mirror.vertical_percent > 100 {
            return Err(ConfigError::Validation(
                "mirror.vertical_percent must be 0-100".into(),
            ));
        }
        if !(2..=256).contains(&self.animation.palette_colors) {
            return Err(ConfigError::Validation(
                "animation.palette_colors must be 2-256".into(),
            ));
        }
        if self.limits.max_file_size_mb == 0 {
            return Err(ConfigError::Validation(
                "limits.max_file_size_mb must be non-zero".into(),
            ));
        }
        if self.processing.max_processes == Some(0) {
            return Err(ConfigError::Validation(
                "processing.max_processes must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

/// Default mirror request, used when flags are omitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MirrorConfig {
    pub side: Side,
    /// Cut-line position measured from the left edge.
    pub horizontal_percent: u32,
    /// Cut-line position measured from the top edge.
    pub vertical_percent: u32,
}

impl Default for MirrorConfig {
    fn default() -> Self {
        Self {
            side: Side::Left,
            horizontal_percent: 50,
            vertical_percent: 50,
        }
    }
}

/// Animated GIF settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AnimationConfig {
    /// Adaptive palette size per frame. With source transparency one more
    /// slot is needed; 256 leaves none and forces the shared-palette fallback
    /// for colorful frames.
    pub palette_colors: u32,
}

impl Default for AnimationConfig {
    fn default() -> Self {
        Self {
            palette_colors: 255,
        }
    }
}

/// Input guards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LimitsConfig {
    pub max_file_size_mb: u64,
}

impl LimitsConfig {
    pub fn max_file_size_bytes(&self) -> u64 {
        self.max_file_size_mb.saturating_mul(1024 * 1024)
    }
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_file_size_mb: 10,
        }
    }
}

/// Parallel processing settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of parallel image processing workers.
    /// When absent or null, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    pub max_processes: Option<usize>,
}

/// Resolve the effective thread count from config.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)` (user can constrain down, not up)
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config.max_processes.map(|n| n.min(cores)).unwrap_or(cores)
}

/// Returns the stock default config as a `toml::Value::Table`.
///
/// This is the canonical representation of all default values, used as the
/// base layer for merging user overrides on top.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    Ok(toml::Value::try_from(KaleidoConfig::default())?)
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Read a config file as a raw TOML value.
///
/// Returns `Ok(None)` if the file does not exist.
/// Returns `Err` if the file exists but contains invalid TOML.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<KaleidoConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: KaleidoConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from `kaleido.toml` in the given directory.
///
/// Merges user values on top of stock defaults, rejects unknown keys,
/// and validates the result. A missing file yields the defaults.
pub fn load_config(dir: &Path) -> Result<KaleidoConfig, ConfigError> {
    let base = stock_defaults_value()?;
    let overlay = load_raw_config(&dir.join(CONFIG_FILE_NAME))?;
    resolve_config(base, overlay)
}

/// Load config from an explicit file, which must exist.
pub fn load_config_file(path: &Path) -> Result<KaleidoConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let overlay: toml::Value = toml::from_str(&content)?;
    resolve_config(stock_defaults_value()?, Some(overlay))
}

/// Returns a fully-commented stock `kaleido.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# Kaleido Configuration
# =====================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
#
# Command-line flags (--side, --horizontal, --vertical) override these.
# Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Mirror effect
# ---------------------------------------------------------------------------
[mirror]
# Which part of the image is kept and mirrored:
#   left, right, up, down   - one axis
#   q1 (top-left), q2 (top-right), q3 (bottom-right), q4 (bottom-left)
side = "left"

# Cut-line position, in percent, measured from the left edge.
# For right/q2/q3 the part right of the line is kept.
horizontal_percent = 50

# Cut-line position, in percent, measured from the top edge.
# For down/q3/q4 the part below the line is kept.
vertical_percent = 50

# ---------------------------------------------------------------------------
# Animated GIFs
# ---------------------------------------------------------------------------
[animation]
# Adaptive palette size per frame (2-256). When the source GIF declares a
# transparent color one extra slot is used for it; if none is left the
# frames are re-quantized with a single shared palette instead.
palette_colors = 255

# ---------------------------------------------------------------------------
# Limits
# ---------------------------------------------------------------------------
[limits]
# Inputs larger than this (in MiB) are rejected.
max_file_size_mb = 10

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# Maximum parallel image-processing workers.
# Omit or comment out to auto-detect (= number of CPU cores).
# max_processes = 4
"##
}
