// Rotated-rectangle geometry: corner construction, circle containment,
// and the Separating Axis Theorem overlap oracle.

use nalgebra::{Rotation2, Vector2};

// --- Data Structures ---

/// Width/height of a single rectangle to be packed.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct RectSpec {
    pub w: f64,
    pub h: f64,
}

impl RectSpec {
    pub fn new(w: f64, h: f64) -> Self {
        Self { w, h }
    }

    /// Half the diagonal length.
    pub fn half_diagonal(&self) -> f64 {
        (self.w * self.w + self.h * self.h).sqrt() / 2.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Pose {
    pub cx: f64,
    pub cy: f64,
    pub theta: f64,
}

/// The four corners of a rectangle, in a fixed CCW order starting from
/// (-w/2, -h/2) in the rectangle's local frame.
pub type Corners = [Vector2<f64>; 4];

// --- Geometric Helpers ---

/// Rotates and translates the four local corners of `rect` by `pose`.
pub fn rect_corners(rect: &RectSpec, pose: &Pose) -> Corners {
    let hw = rect.w / 2.0;
    let hh = rect.h / 2.0;
    let rot = Rotation2::new(pose.theta);
    let center = Vector2::new(pose.cx, pose.cy);
    let local = [
        Vector2::new(-hw, -hh),
        Vector2::new(hw, -hh),
        Vector2::new(hw, hh),
        Vector2::new(-hw, hh),
    ];
    let mut out = [Vector2::zeros(); 4];
    for (i, p) in local.iter().enumerate() {
        out[i] = rot * p + center;
    }
    out
}

/// The two outward edge normals of a rectangle at the given angle (the
/// other two edges are parallel, so their normals are redundant).
pub fn edge_normals(theta: f64) -> [Vector2<f64>; 2] {
    let rot = Rotation2::new(theta);
    [rot * Vector2::new(1.0, 0.0), rot * Vector2::new(0.0, 1.0)]
}

/// Corner containment excess: for a corner at distance `d` from the
/// origin, `e = d - (R - p_out)`. Positive means the corner pokes out
/// past the padded circle boundary.
pub fn containment_excess(corner: &Vector2<f64>, radius: f64, p_out: f64) -> f64 {
    corner.norm() - (radius - p_out)
}

// Projects all four corners onto unit axis `axis`, returning (min, max).
fn project(corners: &Corners, axis: &Vector2<f64>) -> (f64, f64) {
    let mut lo = f64::MAX;
    let mut hi = f64::MIN;
    for c in corners {
        let p = c.dot(axis);
        lo = lo.min(p);
        hi = hi.max(p);
    }
    (lo, hi)
}

/// SAT penetration depth for a pair of rectangles. Checks all 4 edge
/// normals; `overlap(a)` is positive when the projections intersect and
/// negative when there is a clear gap, so a given axis needs
/// `p_in + overlap(a) <= 0` to count as separating. The reported depth
/// is the minimum violation over axes, the deficit on the pair's best
/// (most separating) axis.
pub fn sat_penetration_depth(
    corners_a: &Corners,
    theta_a: f64,
    corners_b: &Corners,
    theta_b: f64,
    p_in: f64,
) -> f64 {
    let mut axes = Vec::with_capacity(4);
    axes.extend_from_slice(&edge_normals(theta_a));
    axes.extend_from_slice(&edge_normals(theta_b));

    let mut min_violation = f64::MAX;
    for axis in &axes {
        let (min_a, max_a) = project(corners_a, axis);
        let (min_b, max_b) = project(corners_b, axis);
        let overlap = max_a.min(max_b) - min_a.max(min_b);
        let violation = p_in + overlap;
        min_violation = min_violation.min(violation);
    }
    min_violation.max(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::PI;

    #[test]
    fn axis_aligned_corners_are_symmetric() {
        let rect = RectSpec::new(10.0, 4.0);
        let pose = Pose { cx: 0.0, cy: 0.0, theta: 0.0 };
        let c = rect_corners(&rect, &pose);
        assert_relative_eq!(c[0].x, -5.0);
        assert_relative_eq!(c[0].y, -2.0);
        assert_relative_eq!(c[2].x, 5.0);
        assert_relative_eq!(c[2].y, 2.0);
    }

    #[test]
    fn quarter_turn_swaps_extents() {
        let rect = RectSpec::new(10.0, 4.0);
        let pose = Pose { cx: 0.0, cy: 0.0, theta: PI / 2.0 };
        let c = rect_corners(&rect, &pose);
        // after a 90 deg rotation the half-width 5 now lies along y.
        let max_x = c.iter().map(|p| p.x).fold(f64::MIN, f64::max);
        let max_y = c.iter().map(|p| p.y).fold(f64::MIN, f64::max);
        assert_relative_eq!(max_x, 2.0, epsilon = 1e-9);
        assert_relative_eq!(max_y, 5.0, epsilon = 1e-9);
    }

    #[test]
    fn containment_excess_sign() {
        let corner = Vector2::new(3.0, 4.0); // distance 5
        assert!(containment_excess(&corner, 10.0, 0.0) < 0.0); // well inside
        assert_relative_eq!(containment_excess(&corner, 5.0, 0.0), 0.0, epsilon = 1e-9);
        assert!(containment_excess(&corner, 4.0, 0.0) > 0.0); // pokes out
    }

    #[test]
    fn separated_squares_have_zero_penetration() {
        let rect = RectSpec::new(10.0, 10.0);
        let a = rect_corners(&rect, &Pose { cx: -10.0, cy: 0.0, theta: 0.0 });
        let b = rect_corners(&rect, &Pose { cx: 10.0, cy: 0.0, theta: 0.0 });
        let depth = sat_penetration_depth(&a, 0.0, &b, 0.0, 0.0);
        assert_relative_eq!(depth, 0.0);
    }

    #[test]
    fn overlapping_squares_have_positive_penetration() {
        let rect = RectSpec::new(10.0, 10.0);
        let a = rect_corners(&rect, &Pose { cx: 0.0, cy: 0.0, theta: 0.0 });
        let b = rect_corners(&rect, &Pose { cx: 5.0, cy: 0.0, theta: 0.0 });
        let depth = sat_penetration_depth(&a, 0.0, &b, 0.0, 0.0);
        // x-axis overlap is 5 (ranges [-5,5] and [0,10]); that is the
        // pair's best (smallest) axis violation, so depth == 5.
        assert_relative_eq!(depth, 5.0, epsilon = 1e-9);
    }

    #[test]
    fn inner_padding_required_on_touching_edge() {
        let rect = RectSpec::new(10.0, 10.0);
        let a = rect_corners(&rect, &Pose { cx: -5.0, cy: 0.0, theta: 0.0 });
        let b = rect_corners(&rect, &Pose { cx: 5.0, cy: 0.0, theta: 0.0 });
        // touching exactly, p_in = 0 must be valid (boundary equality).
        let depth = sat_penetration_depth(&a, 0.0, &b, 0.0, 0.0);
        assert_relative_eq!(depth, 0.0, epsilon = 1e-9);
        // with inner padding, touching is now a violation.
        let depth_padded = sat_penetration_depth(&a, 0.0, &b, 0.0, 1.0);
        assert_relative_eq!(depth_padded, 1.0, epsilon = 1e-9);
    }
}
