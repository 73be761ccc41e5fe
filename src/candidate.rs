// The common result shape produced by a single DE run, a permutation
// sweep, or a whole stage. Everything upstream (dispatcher, stage
// controller, public API) compares and selects among these.

use crate::geometry::Pose;
use crate::state::RotationMode;

#[derive(Debug, Clone)]
pub struct Candidate {
    pub radius: f64,
    pub poses: Vec<Pose>,
    pub valid: bool,
    pub cost: f64,
    pub generations: usize,
    pub stage: RotationMode,
}

impl Candidate {
    /// Orders candidates the way the stage controller and dispatcher
    /// both need: prefer valid over invalid, then lower radius among
    /// valid candidates, then lower cost among invalid ones, so a
    /// "best infeasible" fallback is still meaningful.
    pub fn is_better_than(&self, other: &Candidate) -> bool {
        match (self.valid, other.valid) {
            (true, false) => true,
            (false, true) => false,
            (true, true) => self.radius < other.radius,
            (false, false) => self.cost < other.cost,
        }
    }
}
