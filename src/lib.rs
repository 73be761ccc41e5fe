// Packs N rectangles into the smallest enclosing circle via staged
// Differential Evolution, subject to an outer clearance against the
// circle boundary and an inner clearance between rectangles.
//
// Entry point is `solve`; everything else is exported for callers who
// want to drive a stage or a single DE run directly.

mod candidate;
mod de;
mod dispatch;
mod error;
mod geometry;
mod penalty;
mod progress;
#[cfg(test)]
mod scenarios;
mod stage;
mod state;

pub use candidate::Candidate;
pub use de::{BestRecord, DEConfig, RunState};
pub use dispatch::{enumerate_permutations, run_discrete_sweep, run_single_de};
pub use error::SolveError;
pub use geometry::{Pose, RectSpec};
pub use progress::{NullProgressSink, ProgressSink};
pub use state::RotationMode;

/// A packing problem instance: the rectangles to place and the two
/// clearance parameters.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Instance {
    pub rectangles: Vec<RectSpec>,
    pub outer_padding: f64,
    pub inner_padding: f64,
}

impl Instance {
    pub fn new(rectangles: Vec<RectSpec>, outer_padding: f64, inner_padding: f64) -> Self {
        Self { rectangles, outer_padding, inner_padding }
    }

    /// The one place `SolveError` is raised: input-invariant violations
    /// should be caught before the core, but if they reach it, fail
    /// immediately.
    pub fn validate(&self) -> Result<(), SolveError> {
        if self.rectangles.is_empty() {
            return Err(SolveError::EmptyInstance);
        }
        for (index, r) in self.rectangles.iter().enumerate() {
            if r.w <= 0.0 || r.h <= 0.0 {
                return Err(SolveError::InvalidRectangle { index, w: r.w, h: r.h });
            }
        }
        if self.outer_padding < 0.0 {
            return Err(SolveError::InvalidOuterPadding(self.outer_padding));
        }
        if self.inner_padding < 0.0 {
            return Err(SolveError::InvalidInnerPadding(self.inner_padding));
        }
        Ok(())
    }
}

/// Tunable search parameters. `seed` is mandatory; there is no silent
/// default, since reproducibility is part of the contract.
pub struct SolveOptions<'a> {
    pub rotation_mode: RotationMode,
    pub target_radius: Option<f64>,
    pub max_generations: usize,
    pub population_size: Option<usize>,
    pub f: f64,
    pub cr: f64,
    pub seed: u64,
    pub convergence_tolerance: f64,
    /// Explicit stage list, overriding the mode-derived default (mainly
    /// useful to re-run a subset of the AUTO cascade).
    pub stages_to_try: Option<Vec<RotationMode>>,
    /// Whether discrete-stage permutation sweeps run across a `rayon`
    /// thread pool (the default) or one permutation at a time on the
    /// calling thread. Both paths visit the same permutations and
    /// aggregate by the same rule; turning this off trades wall-clock
    /// time for a single-threaded, easier-to-profile run.
    pub parallel: bool,
    pub progress_sink: &'a dyn ProgressSink,
}

impl<'a> SolveOptions<'a> {
    pub fn new(seed: u64) -> Self {
        let de_defaults = DEConfig::default();
        Self {
            rotation_mode: RotationMode::Auto,
            target_radius: None,
            max_generations: de_defaults.max_generations,
            population_size: de_defaults.population_size,
            f: de_defaults.f,
            cr: de_defaults.cr,
            seed,
            convergence_tolerance: de_defaults.convergence_tolerance,
            stages_to_try: None,
            parallel: true,
            progress_sink: &NullProgressSink,
        }
    }

    fn de_config(&self) -> DEConfig {
        DEConfig {
            f: self.f,
            cr: self.cr,
            max_generations: self.max_generations,
            population_size: self.population_size,
            seed: self.seed,
            convergence_tolerance: self.convergence_tolerance,
        }
    }
}

/// The packing result.
#[derive(Debug, Clone)]
pub struct SolveResult {
    pub radius: f64,
    pub valid: bool,
    pub poses: Vec<Pose>,
    pub stage_used: RotationMode,
    pub generations: usize,
    pub permutation_count_attempted: usize,
}

/// Packs `instance.rectangles` into the smallest enclosing circle found
/// within `options`' budget.
pub fn solve(instance: &Instance, options: &SolveOptions) -> Result<SolveResult, SolveError> {
    instance.validate()?;

    let stages = stage::stages_for(options.rotation_mode, options.stages_to_try.as_deref());
    let de_config = options.de_config();

    log::info!(
        "solving {} rectangles via {:?} ({} stage(s))",
        instance.rectangles.len(),
        options.rotation_mode,
        stages.len()
    );

    let run = stage::run_cascade(
        &instance.rectangles,
        instance.outer_padding,
        instance.inner_padding,
        &stages,
        &de_config,
        options.target_radius,
        options.parallel,
        options.progress_sink,
    );

    if !run.best.valid {
        log::warn!(
            "no stage produced a feasible layout; returning lowest-cost infeasible result (R={:.4})",
            run.best.radius
        );
    }

    Ok(SolveResult {
        radius: run.best.radius,
        valid: run.best.valid,
        poses: run.best.poses,
        stage_used: *run.stages_attempted.last().unwrap_or(&options.rotation_mode),
        generations: run.best.generations,
        permutation_count_attempted: run.permutations_attempted,
    })
}
