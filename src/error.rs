// Error taxonomy for the packing core. Only input-invariant violations
// propagate as a hard error; every other condition (infeasibility,
// worker faults, numeric anomalies, cancellation) is reported through
// `SolveResult` fields instead.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SolveError {
    #[error("instance has no rectangles")]
    EmptyInstance,
    #[error("rectangle {index} has non-positive dimensions ({w} x {h})")]
    InvalidRectangle { index: usize, w: f64, h: f64 },
    #[error("outer padding must be >= 0, got {0}")]
    InvalidOuterPadding(f64),
    #[error("inner padding must be >= 0, got {0}")]
    InvalidInnerPadding(f64),
}
