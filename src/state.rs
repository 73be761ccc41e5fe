// State vector encoding/decoding and search bounds.
//
// In fixed/discrete modes a state vector is `[R, x1, y1, ..., xN, yN]`
// (dimension `1 + 2N`); angles are supplied externally per permutation.
// In FREE mode it is `[R, x1, y1, t1, ..., xN, yN, tN]` (dimension
// `1 + 3N`), with each `tI` in `[0, pi]` (rectangles are 180-degree
// symmetric about their center).

use crate::geometry::{Pose, RectSpec};
use std::f64::consts::PI;

/// One of the four rotation policies the stage controller sweeps
/// through, or `Auto` to run the full cascade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum RotationMode {
    FixedZero,
    Discrete90,
    Discrete45,
    Free,
    Auto,
}

impl RotationMode {
    /// Whether this mode's state vector carries angles as decision
    /// variables. Only `Free` does; the discrete/fixed modes take
    /// their angles from an externally supplied permutation.
    pub fn is_free(self) -> bool {
        matches!(self, RotationMode::Free)
    }

    pub fn dim(self, n: usize) -> usize {
        if self.is_free() {
            1 + 3 * n
        } else {
            1 + 2 * n
        }
    }

    /// The discrete angle choices for this mode, or `None` for
    /// `FixedZero`/`Free`/`Auto` (the caller must supply a concrete
    /// permutation or decision variables instead).
    pub fn discrete_angles(self) -> Option<&'static [f64]> {
        match self {
            RotationMode::FixedZero => Some(&[0.0]),
            RotationMode::Discrete90 => Some(&DISCRETE_90_ANGLES),
            RotationMode::Discrete45 => Some(&DISCRETE_45_ANGLES),
            RotationMode::Free | RotationMode::Auto => None,
        }
    }
}

const DISCRETE_90_ANGLES: [f64; 2] = [0.0, PI / 2.0];
const DISCRETE_45_ANGLES: [f64; 4] = [0.0, PI / 4.0, PI / 2.0, 3.0 * PI / 4.0];

/// Per-dimension `[low, high]` search bounds. Angular dimensions (FREE
/// mode only) wrap modulo pi rather than clamp; linear dimensions are
/// reflected or clamped by the DE engine's bounds handling.
#[derive(Debug, Clone)]
pub struct Bounds {
    pub low: Vec<f64>,
    pub high: Vec<f64>,
    /// Index set of angular dimensions (wrap modulo pi instead of
    /// reflect/clamp).
    pub angular: Vec<bool>,
}

impl Bounds {
    pub fn dim(&self) -> usize {
        self.low.len()
    }
}

/// Derives search bounds wide enough to contain any feasible solution:
/// `R` ranges from the largest half-diagonal plus outer padding up to
/// the sum of all half-diagonals plus a padding margin; center
/// coordinates range over `[-R_max, +R_max]`; angles (FREE mode) range
/// over `[0, pi]`.
pub fn derive_bounds(rects: &[RectSpec], p_out: f64, p_in: f64, mode: RotationMode) -> Bounds {
    let n = rects.len();
    let max_half_diag = rects
        .iter()
        .map(RectSpec::half_diagonal)
        .fold(0.0_f64, f64::max);
    let sum_half_diag: f64 = rects.iter().map(RectSpec::half_diagonal).sum();

    let r_min = max_half_diag + p_out;
    let r_max = sum_half_diag + p_out + p_in * (n.max(1) as f64) + 1.0;

    let dim = mode.dim(n);
    let mut low = vec![0.0; dim];
    let mut high = vec![0.0; dim];
    let mut angular = vec![false; dim];

    low[0] = r_min;
    high[0] = r_max.max(r_min);

    let stride = if mode.is_free() { 3 } else { 2 };
    for i in 0..n {
        let base = 1 + i * stride;
        low[base] = -r_max;
        high[base] = r_max;
        low[base + 1] = -r_max;
        high[base + 1] = r_max;
        if mode.is_free() {
            low[base + 2] = 0.0;
            high[base + 2] = PI;
            angular[base + 2] = true;
        }
    }

    Bounds { low, high, angular }
}

/// Decodes a state vector into (radius, poses). In fixed/discrete
/// modes, `permutation` must supply one angle per rectangle; in FREE
/// mode the angles are read from the state vector itself and
/// `permutation` is ignored.
pub fn decode(x: &[f64], n: usize, mode: RotationMode, permutation: Option<&[f64]>) -> (f64, Vec<Pose>) {
    let radius = x[0];
    let stride = if mode.is_free() { 3 } else { 2 };
    let mut poses = Vec::with_capacity(n);
    for i in 0..n {
        let base = 1 + i * stride;
        let cx = x[base];
        let cy = x[base + 1];
        let theta = if mode.is_free() {
            x[base + 2].rem_euclid(PI)
        } else {
            permutation.expect("fixed/discrete decode requires a permutation")[i]
        };
        poses.push(Pose { cx, cy, theta });
    }
    (radius, poses)
}
