//! Errors raised by the mirror core (geometry, compositing, quantization).

use thiserror::Error;

/// Failures of the pure pixel pipeline.
///
/// Only [`QuantizationFailure`](MirrorError::QuantizationFailure) (or any
/// failure of the primary animated strategy, really) is recovered from, and
/// only by [`process_animated_combined`](crate::animate::process_animated_combined).
/// Everything else propagates to the caller unchanged.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MirrorError {
    #[error("Invalid side selector {0:?} (expected left, right, up, down, q1, q2, q3 or q4)")]
    InvalidSelector(String),
    #[error("Geometry constraint violated: {0}")]
    GeometryConstraintViolation(String),
    #[error("Quantization failed: {0}")]
    QuantizationFailure(String),
}
