// Objective/penalty evaluator: turns a state vector into a scalar cost
// by combining the candidate radius with weighted, squared constraint
// violations from the geometry kernel.

use crate::geometry::{containment_excess, rect_corners, sat_penetration_depth, Pose, RectSpec};

/// Reference weights. Calibration, not contract: any weights satisfying
/// `W_o >> W_c >> 1` so that feasibility dominates R within the search
/// bounds are acceptable.
pub const W_CONTAINMENT: f64 = 1.0e3;
pub const W_OVERLAP: f64 = 1.0e4;

/// Everything the evaluator needs beyond the state vector itself: the
/// rectangle specs (fixed for the whole solve) and the per-rectangle
/// angles supplied externally in fixed/discrete rotation modes.
pub struct EvalContext<'a> {
    pub rects: &'a [RectSpec],
    pub p_out: f64,
    pub p_in: f64,
}

/// Cost = R + weighted squared containment violations + weighted
/// squared SAT overlap violations. A state is valid iff cost == radius
/// exactly (every violation term is zero).
///
/// `poses` must have one entry per rectangle in `ctx.rects`, already
/// decoded from whatever state-vector encoding the caller uses.
pub fn evaluate(radius: f64, poses: &[Pose], ctx: &EvalContext) -> f64 {
    debug_assert_eq!(poses.len(), ctx.rects.len());

    let corners: Vec<_> = ctx
        .rects
        .iter()
        .zip(poses.iter())
        .map(|(rect, pose)| rect_corners(rect, pose))
        .collect();

    let mut cost = radius;

    for c in &corners {
        for corner in c {
            let e = containment_excess(corner, radius, ctx.p_out);
            if e > 0.0 {
                cost += W_CONTAINMENT * e * e;
            }
        }
    }

    for i in 0..corners.len() {
        for j in (i + 1)..corners.len() {
            let depth = sat_penetration_depth(
                &corners[i],
                poses[i].theta,
                &corners[j],
                poses[j].theta,
                ctx.p_in,
            );
            if depth > 0.0 {
                cost += W_OVERLAP * depth * depth;
            }
        }
    }

    // A NaN cost must reject the trial unconditionally rather than
    // propagate through comparisons, where NaN < anything is always
    // false and would let a broken trial slip past selection.
    if cost.is_nan() {
        f64::INFINITY
    } else {
        cost
    }
}

/// A state is valid iff its cost equals its radius exactly (no
/// violation term contributed anything).
pub fn is_valid(radius: f64, cost: f64) -> bool {
    (cost - radius).abs() < 1e-9
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx(rects: &[RectSpec], p_out: f64, p_in: f64) -> EvalContext {
        EvalContext { rects, p_out, p_in }
    }

    #[test]
    fn single_centered_rect_with_enough_radius_is_valid() {
        let rects = [RectSpec::new(10.0, 10.0)];
        let poses = [Pose { cx: 0.0, cy: 0.0, theta: 0.0 }];
        let radius = rects[0].half_diagonal() + 1.0; // generous clearance
        let c = ctx(&rects, 0.0, 0.0);
        let cost = evaluate(radius, &poses, &c);
        assert!(is_valid(radius, cost));
        assert_eq!(cost, radius);
    }

    #[test]
    fn undersized_radius_is_invalid_and_costs_more_than_radius() {
        let rects = [RectSpec::new(10.0, 10.0)];
        let poses = [Pose { cx: 0.0, cy: 0.0, theta: 0.0 }];
        let radius = 1.0; // far too small
        let c = ctx(&rects, 0.0, 0.0);
        let cost = evaluate(radius, &poses, &c);
        assert!(!is_valid(radius, cost));
        assert!(cost > radius);
    }

    #[test]
    fn overlapping_pair_is_invalid() {
        let rects = [RectSpec::new(10.0, 10.0), RectSpec::new(10.0, 10.0)];
        let poses = [
            Pose { cx: 0.0, cy: 0.0, theta: 0.0 },
            Pose { cx: 1.0, cy: 0.0, theta: 0.0 },
        ];
        let radius = 50.0; // plenty of room for containment
        let c = ctx(&rects, 0.0, 0.0);
        let cost = evaluate(radius, &poses, &c);
        assert!(!is_valid(radius, cost));
    }

    #[test]
    fn well_separated_pair_is_valid() {
        let rects = [RectSpec::new(10.0, 10.0), RectSpec::new(10.0, 10.0)];
        let poses = [
            Pose { cx: -10.0, cy: 0.0, theta: 0.0 },
            Pose { cx: 10.0, cy: 0.0, theta: 0.0 },
        ];
        let radius = 30.0;
        let c = ctx(&rects, 0.0, 0.0);
        let cost = evaluate(radius, &poses, &c);
        assert!(is_valid(radius, cost));
    }
}
