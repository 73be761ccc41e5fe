// Differential Evolution engine.
//
// Strictly single-threaded and sequential: one generation's selection
// step always completes before the next mutation step begins. The
// permutation dispatcher is the only place this crate introduces
// concurrency, running many independent `DifferentialEvolution`
// instances in parallel, each with its own RNG.
//
// Builder shape mirrors a configure/build/run convention: construct,
// then `run`. The mutation/crossover math is hand-rolled rather than
// delegated to a library.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::state::Bounds;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Converged,
    Exhausted,
    Stopped,
}

#[derive(Debug, Clone)]
pub struct BestRecord {
    pub vector: Vec<f64>,
    pub cost: f64,
    pub generation: usize,
}

pub struct DEResult {
    pub best: BestRecord,
    pub generations: usize,
    pub state: RunState,
}

/// Reference defaults: `f = 0.5`, `cr = 0.9`, `max_generations = 1000`,
/// population size `max(5 * dim, 15)` when left unset.
#[derive(Debug, Clone)]
pub struct DEConfig {
    pub f: f64,
    pub cr: f64,
    pub max_generations: usize,
    pub population_size: Option<usize>,
    pub seed: u64,
    /// Relative cost-spread tolerance that signals convergence.
    pub convergence_tolerance: f64,
}

impl Default for DEConfig {
    fn default() -> Self {
        Self {
            f: 0.5,
            cr: 0.9,
            max_generations: 1000,
            population_size: None,
            seed: 0,
            convergence_tolerance: 1e-6,
        }
    }
}

pub struct DifferentialEvolution<'a> {
    bounds: &'a Bounds,
    config: DEConfig,
    rng: ChaCha8Rng,
    population: Vec<Vec<f64>>,
    costs: Vec<f64>,
    best: BestRecord,
}

/// Reflects `v` back into `[lo, hi]`. Reflection avoids the population
/// collapsing onto the boundary the way plain clamping would under
/// repeated out-of-bounds proposals.
fn reflect(v: f64, lo: f64, hi: f64) -> f64 {
    if hi <= lo {
        return lo;
    }
    let span = hi - lo;
    let mut t = (v - lo).rem_euclid(2.0 * span);
    if t > span {
        t = 2.0 * span - t;
    }
    lo + t
}

impl<'a> DifferentialEvolution<'a> {
    /// Initializes a population uniformly at random within `bounds`,
    /// seeded from `config.seed` so runs are reproducible.
    pub fn new(bounds: &'a Bounds, config: DEConfig) -> Self {
        let dim = bounds.dim();
        let pop_size = config.population_size.unwrap_or_else(|| (5 * dim).max(15));
        let mut rng = ChaCha8Rng::seed_from_u64(config.seed);

        let mut population = Vec::with_capacity(pop_size);
        for _ in 0..pop_size {
            let v: Vec<f64> = (0..dim)
                .map(|j| rng.gen_range(bounds.low[j]..=bounds.high[j]))
                .collect();
            population.push(v);
        }

        Self {
            bounds,
            config,
            rng,
            population,
            costs: vec![f64::INFINITY; pop_size],
            best: BestRecord { vector: vec![0.0; dim], cost: f64::INFINITY, generation: 0 },
        }
    }

    /// Angular dimensions wrap modulo their span (wrapping rather than
    /// clamping avoids biasing mutation toward 0 or pi); every other
    /// dimension reflects into range.
    fn wrap_dim(&self, j: usize, v: f64) -> f64 {
        let lo = self.bounds.low[j];
        let hi = self.bounds.high[j];
        if self.bounds.angular[j] {
            let span = (hi - lo).max(1e-12);
            lo + (v - lo).rem_euclid(span)
        } else {
            reflect(v, lo, hi)
        }
    }

    /// Runs generations until a termination condition is met: the
    /// generation cap, population cost convergence, or an external stop
    /// predicate (e.g. "valid result meeting target radius"). `cost_fn`
    /// is evaluated on every trial vector; `cancel` is polled once per
    /// generation boundary so the dispatcher can cooperatively cancel
    /// in-flight runs.
    pub fn run(
        mut self,
        mut cost_fn: impl FnMut(&[f64]) -> f64,
        mut stop_predicate: impl FnMut(&BestRecord) -> bool,
        mut cancel: impl FnMut() -> bool,
    ) -> DEResult {
        let dim = self.bounds.dim();
        let pop_size = self.population.len();

        // Evaluate the initial population.
        for i in 0..pop_size {
            let c = cost_fn(&self.population[i]);
            self.costs[i] = if c.is_nan() { f64::INFINITY } else { c };
            if self.costs[i] < self.best.cost {
                self.best = BestRecord { vector: self.population[i].clone(), cost: self.costs[i], generation: 0 };
            }
        }

        let mut generation = 0;
        let final_state;

        loop {
            if stop_predicate(&self.best) {
                final_state = RunState::Stopped;
                break;
            }
            if generation >= self.config.max_generations {
                final_state = RunState::Exhausted;
                break;
            }
            if cancel() {
                final_state = RunState::Stopped;
                break;
            }

            let spread_ok = {
                let min = self.costs.iter().cloned().filter(|c| c.is_finite()).fold(f64::INFINITY, f64::min);
                let max = self.costs.iter().cloned().filter(|c| c.is_finite()).fold(f64::NEG_INFINITY, f64::max);
                if min.is_finite() && max.is_finite() {
                    (max - min) < self.config.convergence_tolerance * min.abs().max(1.0)
                } else {
                    false
                }
            };
            if spread_ok {
                final_state = RunState::Converged;
                break;
            }

            // One generation: best/1/bin mutation + binomial crossover
            // + greedy selection, per rectangle-slot i.
            let best_idx = self
                .costs
                .iter()
                .enumerate()
                .min_by(|a, b| a.1.partial_cmp(b.1).unwrap_or(std::cmp::Ordering::Equal))
                .map(|(i, _)| i)
                .unwrap_or(0);

            for i in 0..pop_size {
                let (r1, r2) = pick_two_distinct(&mut self.rng, pop_size, &[i, best_idx]);

                let mut trial = self.population[i].clone();
                let j_rand = self.rng.gen_range(0..dim);
                for j in 0..dim {
                    let mutant = self.population[best_idx][j]
                        + self.config.f * (self.population[r1][j] - self.population[r2][j]);
                    if self.rng.gen::<f64>() <= self.config.cr || j == j_rand {
                        trial[j] = self.wrap_dim(j, mutant);
                    }
                }

                let trial_cost_raw = cost_fn(&trial);
                let trial_cost = if trial_cost_raw.is_nan() { f64::INFINITY } else { trial_cost_raw };

                if trial_cost <= self.costs[i] {
                    self.population[i] = trial;
                    self.costs[i] = trial_cost;
                    if trial_cost < self.best.cost {
                        self.best = BestRecord { vector: self.population[i].clone(), cost: trial_cost, generation: generation + 1 };
                    }
                }
            }

            generation += 1;
        }

        DEResult { best: self.best, generations: generation, state: final_state }
    }
}

/// Picks two indices distinct from each other and from every index in
/// `exclude` (r1, r2 both differ from i and from best).
fn pick_two_distinct(rng: &mut ChaCha8Rng, pop_size: usize, exclude: &[usize]) -> (usize, usize) {
    debug_assert!(pop_size > exclude.len() + 1, "population too small to draw two distinct indices");
    let pick = |rng: &mut ChaCha8Rng, taken: &[usize]| loop {
        let c = rng.gen_range(0..pop_size);
        if !taken.contains(&c) {
            return c;
        }
    };
    let r1 = pick(rng, exclude);
    let mut taken = exclude.to_vec();
    taken.push(r1);
    let r2 = pick(rng, &taken);
    (r1, r2)
}
