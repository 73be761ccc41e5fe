// End-to-end scenario tests, in a dedicated module pulled in only
// under #[cfg(test)] rather than a tests/ directory.

#[cfg(test)]
mod tests {
    use crate::{solve, Instance, RectSpec, RotationMode, SolveOptions};
    use std::f64::consts::PI;

    #[test]
    fn two_ten_by_ten_squares_fixed_zero() {
        let instance = Instance::new(
            vec![RectSpec::new(10.0, 10.0), RectSpec::new(10.0, 10.0)],
            0.0,
            0.0,
        );
        let mut options = SolveOptions::new(1);
        options.rotation_mode = RotationMode::FixedZero;
        options.max_generations = 500;
        let result = solve(&instance, &options).unwrap();
        assert!(result.valid);
        assert!(result.radius <= 11.2, "R was {}", result.radius);
        // Two squares packed along a diameter are symmetric about the
        // origin on whichever axis they were placed.
        let dx = (result.poses[0].cx + result.poses[1].cx).abs();
        let dy = (result.poses[0].cy + result.poses[1].cy).abs();
        assert!(dx < 1e-3 || dy < 1e-3);
    }

    #[test]
    fn single_twenty_by_ten_rectangle_fixed_zero() {
        let instance = Instance::new(vec![RectSpec::new(20.0, 10.0)], 1.0, 0.0);
        let mut options = SolveOptions::new(2);
        options.rotation_mode = RotationMode::FixedZero;
        options.max_generations = 500;
        let result = solve(&instance, &options).unwrap();
        let expected = (20.0_f64.powi(2) + 10.0_f64.powi(2)).sqrt() / 2.0 + 1.0;
        assert!((result.radius - expected).abs() / expected < 0.02);
        assert!((result.poses[0].cx).abs() < 1e-2);
        assert!((result.poses[0].cy).abs() < 1e-2);
    }

    #[test]
    fn four_ten_by_ten_squares_discrete_90() {
        let instance = Instance::new(
            vec![
                RectSpec::new(10.0, 10.0),
                RectSpec::new(10.0, 10.0),
                RectSpec::new(10.0, 10.0),
                RectSpec::new(10.0, 10.0),
            ],
            0.0,
            0.0,
        );
        let mut options = SolveOptions::new(3);
        options.rotation_mode = RotationMode::Discrete90;
        options.max_generations = 400;
        let result = solve(&instance, &options).unwrap();
        assert!(result.valid);
        assert!(result.radius <= 14.15, "R was {}", result.radius);
        assert_eq!(result.permutation_count_attempted, 16); // 2^4
    }

    #[test]
    fn three_mixed_rectangles_auto() {
        let instance = Instance::new(
            vec![RectSpec::new(20.0, 10.0), RectSpec::new(10.0, 20.0), RectSpec::new(15.0, 15.0)],
            0.5,
            0.5,
        );
        let options = SolveOptions::new(4);
        let result = solve(&instance, &options).unwrap();
        assert!(result.valid);
        assert!(result.radius.is_finite());
    }

    #[test]
    fn single_five_by_five_rectangle_free_mode() {
        let instance = Instance::new(vec![RectSpec::new(5.0, 5.0)], 0.0, 0.0);
        let mut options = SolveOptions::new(5);
        options.rotation_mode = RotationMode::Free;
        options.max_generations = 300;
        let result = solve(&instance, &options).unwrap();
        assert!(result.valid);
        let expected = (5.0_f64.powi(2) * 2.0).sqrt() / 2.0;
        assert!((result.radius - expected).abs() / expected < 0.03);
        assert!(result.poses[0].theta >= 0.0 && result.poses[0].theta < PI);
    }

    #[test]
    fn infeasible_target_radius_cascades_through_every_stage() {
        let instance = Instance::new(
            vec![RectSpec::new(10.0, 10.0), RectSpec::new(10.0, 10.0)],
            0.0,
            0.0,
        );
        let mut options = SolveOptions::new(6);
        options.target_radius = Some(1.0);
        options.max_generations = 150;
        let result = solve(&instance, &options).unwrap();
        assert_eq!(result.stage_used, RotationMode::Free);
        assert!(result.radius > 1.0);
    }

    #[test]
    fn target_radius_met_by_fixed_zero_stops_the_cascade_early() {
        let instance = Instance::new(
            vec![RectSpec::new(10.0, 10.0), RectSpec::new(10.0, 10.0)],
            0.0,
            0.0,
        );
        let mut options = SolveOptions::new(7);
        options.target_radius = Some(15.0);
        options.max_generations = 300;
        let result = solve(&instance, &options).unwrap();
        assert_eq!(result.stage_used, RotationMode::FixedZero);
        assert!(result.valid);
    }

    #[test]
    fn auto_radius_is_never_worse_than_fixed_zero_on_the_same_input() {
        let instance = Instance::new(
            vec![RectSpec::new(20.0, 10.0), RectSpec::new(10.0, 20.0), RectSpec::new(15.0, 15.0)],
            0.0,
            0.0,
        );
        let fixed_radius = {
            let mut options = SolveOptions::new(8);
            options.rotation_mode = RotationMode::FixedZero;
            options.max_generations = 300;
            solve(&instance, &options).unwrap().radius
        };
        let auto_radius = {
            let options = SolveOptions::new(8);
            solve(&instance, &options).unwrap().radius
        };
        assert!(auto_radius <= fixed_radius + 1e-9);
    }
}
