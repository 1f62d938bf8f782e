//! Parameter types for the mirror effect.
//!
//! These types describe *what* to cut and mirror, not *how*. They are the
//! interface between the request layer (CLI, config) and the pixel work in
//! [`geometry`](super::geometry).
//!
//! ## Types
//!
//! - [`Side`]: The eight selectors: four single-axis sides and four quadrants.
//! - [`Edge`]: One single-axis mirror pass. Quadrants decompose into two.
//! - [`Percent`]: A share of an image dimension, 0-100.
//! - [`CropSpec`]: Kept horizontal/vertical shares plus the side selector.

use super::error::MirrorError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Which part of the image is kept and mirrored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Left,
    Right,
    Up,
    Down,
    Q1,
    Q2,
    Q3,
    Q4,
}

/// A single-axis mirror pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    Left,
    Right,
    Up,
    Down,
}

impl Side {
    pub const ALL: [Side; 8] = [
        Side::Left,
        Side::Right,
        Side::Up,
        Side::Down,
        Side::Q1,
        Side::Q2,
        Side::Q3,
        Side::Q4,
    ];

    /// The mirror passes this side expands to, in application order.
    ///
    /// Quadrants always run the horizontal pass first, then the vertical one
    /// on the intermediate canvas.
    pub fn passes(self) -> (Edge, Option<Edge>) {
        match self {
            Side::Left => (Edge::Left, None),
            Side::Right => (Edge::Right, None),
            Side::Up => (Edge::Up, None),
            Side::Down => (Edge::Down, None),
            Side::Q1 => (Edge::Left, Some(Edge::Up)),
            Side::Q2 => (Edge::Right, Some(Edge::Up)),
            Side::Q3 => (Edge::Right, Some(Edge::Down)),
            Side::Q4 => (Edge::Left, Some(Edge::Down)),
        }
    }

    /// Whether the horizontal share is measured from the right edge.
    pub fn keeps_right(self) -> bool {
        matches!(self, Side::Right | Side::Q2 | Side::Q3)
    }

    /// Whether the vertical share is measured from the bottom edge.
    pub fn keeps_bottom(self) -> bool {
        matches!(self, Side::Down | Side::Q3 | Side::Q4)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Side::Left => "left",
            Side::Right => "right",
            Side::Up => "up",
            Side::Down => "down",
            Side::Q1 => "q1",
            Side::Q2 => "q2",
            Side::Q3 => "q3",
            Side::Q4 => "q4",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Side {
    type Err = MirrorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Side::ALL
            .into_iter()
            .find(|side| side.as_str() == s)
            .ok_or_else(|| MirrorError::InvalidSelector(s.to_string()))
    }
}

/// Share of an image dimension in whole percent (0-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Percent(u32);

impl Percent {
    pub const FULL: Percent = Percent(100);

    /// Rejects values above 100: the crop would exceed the source bounds.
    pub fn new(value: u32) -> Result<Self, MirrorError> {
        if value > 100 {
            return Err(MirrorError::GeometryConstraintViolation(format!(
                "percentage {value} is outside 0-100"
            )));
        }
        Ok(Self(value))
    }

    pub fn value(self) -> u32 {
        self.0
    }

    /// The remaining share, `100 - self`.
    pub fn complement(self) -> Self {
        Self(100 - self.0)
    }

    /// `floor(dimension * self / 100)`.
    pub fn of(self, dimension: u32) -> u32 {
        (u64::from(dimension) * u64::from(self.0) / 100) as u32
    }
}

/// Kept shares of the source plus the side selector.
///
/// The shares are what the geometry keeps, not where the user placed the cut
/// line; see [`calculations::kept_shares`](super::calculations::kept_shares).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropSpec {
    pub horizontal: Percent,
    pub vertical: Percent,
    pub side: Side,
}

impl CropSpec {
    pub fn new(horizontal: u32, vertical: u32, side: Side) -> Result<Self, MirrorError> {
        Ok(Self {
            horizontal: Percent::new(horizontal)?,
            vertical: Percent::new(vertical)?,
            side,
        })
    }

    /// `(crop_width, crop_height)` for a source of the given size.
    pub fn crop_dimensions(&self, width: u32, height: u32) -> (u32, u32) {
        (self.horizontal.of(width), self.vertical.of(height))
    }
}
