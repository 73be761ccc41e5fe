// Stage controller: sweeps FIXED_0 -> DISCRETE_90 -> DISCRETE_45 ->
// FREE, short-circuiting once a valid result meets an optional target
// radius, and otherwise returning the lowest-R valid result seen
// across every attempted stage.

use std::sync::atomic::AtomicBool;

use crate::candidate::Candidate;
use crate::de::DEConfig;
use crate::dispatch::{run_discrete_sweep, run_single_de};
use crate::geometry::RectSpec;
use crate::progress::ProgressSink;
use crate::state::RotationMode;

/// The full cascade order for `RotationMode::Auto`.
const CASCADE: [RotationMode; 4] = [
    RotationMode::FixedZero,
    RotationMode::Discrete90,
    RotationMode::Discrete45,
    RotationMode::Free,
];

pub struct StageRun {
    pub best: Candidate,
    pub stages_attempted: Vec<RotationMode>,
    pub permutations_attempted: usize,
}

/// Runs one stage (FIXED_0, DISCRETE_90, DISCRETE_45, or FREE) to
/// completion and returns its best candidate plus the permutation
/// count it attempted: 1 for FIXED_0/FREE, 2^N/4^N for the discrete
/// stages.
#[allow(clippy::too_many_arguments)]
fn run_stage(
    rects: &[RectSpec],
    p_out: f64,
    p_in: f64,
    mode: RotationMode,
    de_config: &DEConfig,
    target_radius: Option<f64>,
    parallel: bool,
    progress: &dyn ProgressSink,
) -> (Candidate, usize) {
    match mode {
        RotationMode::FixedZero | RotationMode::Free => {
            let permutation: Option<Vec<f64>> =
                (mode == RotationMode::FixedZero).then(|| vec![0.0; rects.len()]);
            let cancel = AtomicBool::new(false);
            let candidate = run_single_de(
                rects,
                p_out,
                p_in,
                mode,
                permutation.as_deref(),
                de_config,
                target_radius,
                &cancel,
            );
            progress.on_progress(1, 1, candidate.valid.then_some(candidate.radius));
            (candidate, 1)
        }
        RotationMode::Discrete90 | RotationMode::Discrete45 => {
            let (best, total) = run_discrete_sweep(
                rects, p_out, p_in, mode, de_config, target_radius, parallel, progress,
            );
            let fallback = || {
                // No permutation produced even an infeasible candidate
                // (every worker panicked); synthesize a maximally-bad
                // placeholder so the stage controller always has
                // something to compare.
                Candidate {
                    radius: f64::INFINITY,
                    poses: Vec::new(),
                    valid: false,
                    cost: f64::INFINITY,
                    generations: 0,
                    stage: mode,
                }
            };
            (best.unwrap_or_else(fallback), total)
        }
        RotationMode::Auto => unreachable!("Auto is expanded by run_cascade, never run directly"),
    }
}

/// Runs the AUTO cascade: attempt stages in increasing complexity
/// order, short-circuiting as soon as a valid result meets
/// `target_radius`; otherwise keep the best valid result seen (or, if
/// no stage ever produced a valid result, the lowest-cost infeasible
/// one) and proceed to the next stage.
#[allow(clippy::too_many_arguments)]
pub fn run_cascade(
    rects: &[RectSpec],
    p_out: f64,
    p_in: f64,
    stages: &[RotationMode],
    de_config: &DEConfig,
    target_radius: Option<f64>,
    parallel: bool,
    progress: &dyn ProgressSink,
) -> StageRun {
    let mut overall_best: Option<Candidate> = None;
    let mut stages_attempted = Vec::new();
    let mut permutations_attempted = 0;

    for &mode in stages {
        log::debug!("stage controller: attempting {mode:?}");
        let (candidate, count) =
            run_stage(rects, p_out, p_in, mode, de_config, target_radius, parallel, progress);
        stages_attempted.push(mode);
        permutations_attempted += count;

        let improved = overall_best.as_ref().map(|b| candidate.is_better_than(b)).unwrap_or(true);
        if improved {
            overall_best = Some(candidate);
        }

        if let Some(target) = target_radius {
            if let Some(best) = &overall_best {
                if best.valid && best.radius <= target {
                    log::debug!("stage controller: target radius {target} met at {mode:?}, short-circuiting");
                    break;
                }
            }
        }
    }

    StageRun {
        best: overall_best.expect("stages list must not be empty"),
        stages_attempted,
        permutations_attempted,
    }
}

/// Picks the concrete stage list for a `RotationMode` option: a single
/// stage for any explicit mode, or the full cascade for `Auto`.
pub fn stages_for(mode: RotationMode, explicit_stages: Option<&[RotationMode]>) -> Vec<RotationMode> {
    if let Some(stages) = explicit_stages {
        return stages.to_vec();
    }
    match mode {
        RotationMode::Auto => CASCADE.to_vec(),
        other => vec![other],
    }
}
