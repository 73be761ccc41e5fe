// Permutation dispatcher: enumerates per-rectangle angle combinations
// for a discrete rotation mode, runs one independent DE optimization
// per permutation, and aggregates the minimum-radius valid result.
// Data-parallel via `rayon` by default; Rust has no GIL, so an
// OS-thread pool gives true parallel CPU execution. A serial fallback
// walks the same permutations on the calling thread when parallelism
// is turned off.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use rayon::prelude::*;

use crate::candidate::Candidate;
use crate::de::{DEConfig, DifferentialEvolution};
use crate::geometry::RectSpec;
use crate::penalty::{evaluate, is_valid, EvalContext};
use crate::progress::ProgressSink;
use crate::state::{decode, derive_bounds, RotationMode};

/// Combines a master seed with a permutation index into a per-worker
/// seed, so the whole sweep is reproducible independent of thread
/// arrival order. Splitmix64-style mixing: cheap, deterministic, good
/// avalanche behavior without pulling in a dedicated splittable-RNG
/// crate for one function.
fn derive_worker_seed(master_seed: u64, index: usize) -> u64 {
    let mut z = master_seed
        .wrapping_add(index as u64)
        .wrapping_add(0x9E3779B97F4A7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58476D1CE4E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D049BB133111EB);
    z ^ (z >> 31)
}

/// Builds every permutation of angles for `mode` over `n` rectangles:
/// `{0, pi/2}^n` for DISCRETE_90, `{0, pi/4, pi/2, 3pi/4}^n` for
/// DISCRETE_45. Eagerly materialized.
pub fn enumerate_permutations(mode: RotationMode, n: usize) -> Vec<Vec<f64>> {
    let choices = mode
        .discrete_angles()
        .expect("enumerate_permutations requires a discrete rotation mode");

    if choices.len() > 2 && n > 8 {
        log::warn!(
            "DISCRETE_45 sweep over {n} rectangles enumerates {}^{n} permutations; consider DISCRETE_90 or FREE instead",
            choices.len()
        );
    }

    let mut perms = vec![Vec::with_capacity(n)];
    for _ in 0..n {
        let mut next = Vec::with_capacity(perms.len() * choices.len());
        for p in &perms {
            for &angle in choices {
                let mut extended = p.clone();
                extended.push(angle);
                next.push(extended);
            }
        }
        perms = next;
    }
    perms
}

/// Runs a single DE optimization to completion, either a fixed-angle
/// run for one discrete permutation (`permutation = Some(angles)`) or a
/// FREE-mode run where angles are decision variables
/// (`permutation = None`). This is the unit of work the permutation
/// dispatcher fans out, and also what the stage controller calls
/// directly for FIXED_0 and FREE.
pub fn run_single_de(
    rects: &[RectSpec],
    p_out: f64,
    p_in: f64,
    mode: RotationMode,
    permutation: Option<&[f64]>,
    de_config: &DEConfig,
    target_radius: Option<f64>,
    cancel: &AtomicBool,
) -> Candidate {
    let bounds = derive_bounds(rects, p_out, p_in, mode);
    let de = DifferentialEvolution::new(&bounds, de_config.clone());

    let ctx = EvalContext { rects, p_out, p_in };
    let n = rects.len();

    let result = de.run(
        |x| {
            let (radius, poses) = decode(x, n, mode, permutation);
            evaluate(radius, &poses, &ctx)
        },
        |best| match target_radius {
            Some(target) => is_valid(best.vector[0], best.cost) && best.vector[0] <= target,
            None => false,
        },
        || cancel.load(Ordering::Relaxed),
    );

    let (radius, poses) = decode(&result.best.vector, n, mode, permutation);
    let valid = is_valid(radius, result.best.cost);
    Candidate { radius, poses, valid, cost: result.best.cost, generations: result.generations, stage: mode }
}

/// One permutation's worker task: derives a per-permutation seed,
/// catches a panicking DE run, and folds its outcome into the shared
/// best-radius-seen tracker and cancellation flag.
fn run_permutation_worker(
    rects: &[RectSpec],
    p_out: f64,
    p_in: f64,
    mode: RotationMode,
    de_config: &DEConfig,
    target_radius: Option<f64>,
    cancel: &AtomicBool,
    index: usize,
    permutation: &[f64],
    completed: &AtomicUsize,
    total: usize,
    best_radius_seen: &std::sync::Mutex<Option<f64>>,
    progress: &dyn ProgressSink,
) -> Option<Candidate> {
    let seed = derive_worker_seed(de_config.seed, index);
    let mut worker_config = de_config.clone();
    worker_config.seed = seed;

    let outcome = catch_unwind(AssertUnwindSafe(|| {
        run_single_de(rects, p_out, p_in, mode, Some(permutation), &worker_config, target_radius, cancel)
    }));

    let candidate = match outcome {
        Ok(c) => Some(c),
        Err(_) => {
            log::error!("permutation {index} panicked during DE optimization; skipping");
            None
        }
    };

    if let Some(c) = &candidate {
        if c.valid {
            let mut guard = best_radius_seen.lock().unwrap();
            let improved = guard.map(|r| c.radius < r).unwrap_or(true);
            if improved {
                *guard = Some(c.radius);
            }
            if let Some(target) = target_radius {
                if c.radius <= target {
                    cancel.store(true, Ordering::Relaxed);
                }
            }
        }
    }

    let done = completed.fetch_add(1, Ordering::Relaxed) + 1;
    let best_so_far = *best_radius_seen.lock().unwrap();
    progress.on_progress(done, total, best_so_far);

    candidate
}

/// Runs the full permutation sweep for a discrete rotation mode and
/// returns the best candidate found plus the number of permutations
/// attempted. A worker that panics is caught, logged, and skipped
/// rather than aborting the sweep. If any completed worker meets
/// `target_radius` with a valid result, remaining pending workers
/// (parallel mode only) are cooperatively cancelled. With `parallel`
/// set to `false`, permutations run one at a time on the calling
/// thread; a met target radius still stops the remaining loop early.
pub fn run_discrete_sweep(
    rects: &[RectSpec],
    p_out: f64,
    p_in: f64,
    mode: RotationMode,
    de_config: &DEConfig,
    target_radius: Option<f64>,
    parallel: bool,
    progress: &dyn ProgressSink,
) -> (Option<Candidate>, usize) {
    debug_assert!(
        matches!(mode, RotationMode::Discrete90 | RotationMode::Discrete45),
        "run_discrete_sweep is only for DISCRETE_90/DISCRETE_45; FIXED_0 and FREE run a single DE directly"
    );
    let permutations = enumerate_permutations(mode, rects.len());
    let total = permutations.len();
    let cancel = Arc::new(AtomicBool::new(false));
    let completed = AtomicUsize::new(0);
    let best_radius_seen = std::sync::Mutex::new(None::<f64>);

    let results: Vec<Option<Candidate>> = if parallel {
        permutations
            .par_iter()
            .enumerate()
            .map(|(i, permutation)| {
                run_permutation_worker(
                    rects, p_out, p_in, mode, de_config, target_radius, &cancel, i, permutation,
                    &completed, total, &best_radius_seen, progress,
                )
            })
            .collect()
    } else {
        let mut serial_results = Vec::with_capacity(total);
        for (i, permutation) in permutations.iter().enumerate() {
            serial_results.push(run_permutation_worker(
                rects, p_out, p_in, mode, de_config, target_radius, &cancel, i, permutation,
                &completed, total, &best_radius_seen, progress,
            ));
            if cancel.load(Ordering::Relaxed) {
                break;
            }
        }
        serial_results
    };

    let best = results
        .into_iter()
        .flatten()
        .reduce(|a, b| if b.is_better_than(&a) { b } else { a });

    (best, total)
}
