//! Trajectory metrics
//!
//! Path-deviation error, jerk-based smoothness and elapsed time of a traced
//! trajectory.

use crate::error::AssessError;
use crate::types::{Sample, TargetShape, TrajectoryResult};

/// Minimum number of samples for a scorable trajectory
pub const MIN_TRAJECTORY_SAMPLES: usize = 3;

/// Steps with a smaller time delta than this (seconds) are skipped
const MIN_STEP_SECONDS: f64 = 0.001;

/// Smoothness returned when too few velocities survive
const DEFAULT_SMOOTHNESS: f64 = 5.0;

/// Default jerk scale of the smoothness decay
pub const DEFAULT_SMOOTHNESS_DECAY: f64 = 50.0;

/// Calculator for tracing-task metrics
pub struct TrajectoryMetrics;

impl TrajectoryMetrics {
    /// Score a trajectory against its reference shape
    pub fn analyze(
        samples: &[Sample],
        shape: &TargetShape,
        smoothness_decay: f64,
    ) -> Result<TrajectoryResult, AssessError> {
        if samples.len() < MIN_TRAJECTORY_SAMPLES {
            return Err(AssessError::InsufficientSamples {
                required: MIN_TRAJECTORY_SAMPLES,
                got: samples.len(),
            });
        }

        Ok(TrajectoryResult {
            mse: path_deviation_mse(samples, shape),
            time_taken: elapsed_time(samples),
            smoothness: smoothness_score(samples, smoothness_decay),
        })
    }
}

/// Mean squared distance of the samples from the shape
pub fn path_deviation_mse(samples: &[Sample], shape: &TargetShape) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum: f64 = samples
        .iter()
        .map(|s| {
            let d = distance_to_shape(s.x, s.y, shape);
            d * d
        })
        .sum();
    sum / samples.len() as f64
}

/// Distance from a point to the reference shape
///
/// For the line only the vertical offset counts. For the square an edge is a
/// candidate only while the point lies within that edge's span; the four
/// corners are always candidates.
pub fn distance_to_shape(x: f64, y: f64, shape: &TargetShape) -> f64 {
    match *shape {
        TargetShape::Line { y: line_y, .. } => (y - line_y).abs(),
        TargetShape::Square {
            left,
            top,
            right,
            bottom,
        } => {
            let within_y = top <= y && y <= bottom;
            let within_x = left <= x && x <= right;

            let edges = [
                if within_y { (x - left).abs() } else { f64::INFINITY },
                if within_y { (x - right).abs() } else { f64::INFINITY },
                if within_x { (y - top).abs() } else { f64::INFINITY },
                if within_x { (y - bottom).abs() } else { f64::INFINITY },
            ];
            let corners = [
                (x - left).hypot(y - top),
                (x - right).hypot(y - top),
                (x - left).hypot(y - bottom),
                (x - right).hypot(y - bottom),
            ];

            edges
                .iter()
                .chain(corners.iter())
                .copied()
                .fold(f64::INFINITY, f64::min)
        }
    }
}

/// Seconds between the first and last sample
pub fn elapsed_time(samples: &[Sample]) -> f64 {
    match (samples.first(), samples.last()) {
        (Some(first), Some(last)) => last.t - first.t,
        _ => 0.0,
    }
}

/// Jerk-based smoothness score
///
/// Formula: `10 * exp(-mean_jerk / decay)`, clamped to 0-10, where jerk is the
/// absolute change of the absolute change of step velocity.
pub fn smoothness_score(samples: &[Sample], decay: f64) -> f64 {
    let velocities = step_velocities(samples);
    if velocities.len() < 2 {
        return DEFAULT_SMOOTHNESS;
    }

    let accelerations = abs_diffs(&velocities);
    let mean_jerk = if accelerations.len() < 2 {
        0.0
    } else {
        let jerks = abs_diffs(&accelerations);
        if jerks.is_empty() {
            0.0
        } else {
            jerks.iter().sum::<f64>() / jerks.len() as f64
        }
    };

    (10.0 * (-mean_jerk / decay).exp()).clamp(0.0, 10.0)
}

fn step_velocities(samples: &[Sample]) -> Vec<f64> {
    samples
        .windows(2)
        .filter_map(|pair| {
            let (a, b) = (pair[0], pair[1]);
            let dt = b.t - a.t;
            if dt.abs() < MIN_STEP_SECONDS {
                return None;
            }
            Some((b.x - a.x).hypot(b.y - a.y) / dt)
        })
        .collect()
}

fn abs_diffs(values: &[f64]) -> Vec<f64> {
    values.windows(2).map(|w| (w[1] - w[0]).abs()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line() -> TargetShape {
        TargetShape::Line {
            y: 300.0,
            x_start: 100.0,
            x_end: 700.0,
        }
    }

    fn square() -> TargetShape {
        TargetShape::square_centered(400.0, 300.0, 160.0)
    }

    fn samples(points: &[(f64, f64, f64)]) -> Vec<Sample> {
        points.iter().map(|&(x, y, t)| Sample::new(x, y, t)).collect()
    }

    #[test]
    fn test_fewer_than_three_samples() {
        for n in 0..3 {
            let pts: Vec<Sample> = (0..n).map(|i| Sample::new(i as f64, 300.0, i as f64)).collect();
            let result = TrajectoryMetrics::analyze(&pts, &line(), DEFAULT_SMOOTHNESS_DECAY);
            assert!(matches!(
                result,
                Err(AssessError::InsufficientSamples { required: 3, got }) if got == n
            ));
        }
    }

    #[test]
    fn test_line_scenario() {
        let pts = samples(&[(100.0, 300.0, 0.0), (300.0, 300.0, 0.5), (500.0, 300.0, 1.0)]);
        let result = TrajectoryMetrics::analyze(&pts, &line(), DEFAULT_SMOOTHNESS_DECAY).unwrap();
        assert_eq!(result.mse, 0.0);
        assert_eq!(result.smoothness, 10.0);
        assert_eq!(result.time_taken, 1.0);
    }

    #[test]
    fn test_line_vertical_offset() {
        let pts = samples(&[(100.0, 310.0, 0.0), (200.0, 290.0, 0.1), (300.0, 300.0, 0.2)]);
        // (100 + 100 + 0) / 3
        assert!((path_deviation_mse(&pts, &line()) - 200.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_square_edge_distance() {
        // On the left edge span, 5px outside
        assert!((distance_to_shape(315.0, 300.0, &square()) - 5.0).abs() < 1e-9);
        // Inside, nearest to top edge
        assert!((distance_to_shape(400.0, 230.0, &square()) - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_square_corner_distance_outside_spans() {
        // Diagonally beyond the top-left corner: only corners are candidates
        let d = distance_to_shape(317.0, 216.0, &square());
        assert!((d - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_square_points_on_outline_have_zero_mse() {
        let pts = samples(&[
            (320.0, 220.0, 0.0),
            (400.0, 220.0, 0.2),
            (480.0, 300.0, 0.4),
            (400.0, 380.0, 0.6),
        ]);
        assert_eq!(path_deviation_mse(&pts, &square()), 0.0);
    }

    #[test]
    fn test_constant_velocity_is_perfectly_smooth() {
        let pts: Vec<Sample> = (0..20)
            .map(|i| Sample::new(100.0 + 10.0 * i as f64, 300.0, 0.05 * i as f64))
            .collect();
        assert!((smoothness_score(&pts, DEFAULT_SMOOTHNESS_DECAY) - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_too_few_velocities_returns_midpoint() {
        // All steps share a timestamp, so no velocity survives
        let pts = samples(&[(0.0, 0.0, 0.0), (10.0, 0.0, 0.0), (20.0, 0.0, 0.0005)]);
        assert_eq!(smoothness_score(&pts, DEFAULT_SMOOTHNESS_DECAY), 5.0);
    }

    #[test]
    fn test_two_velocities_gives_zero_jerk() {
        // Two velocities -> one acceleration -> mean jerk 0
        let pts = samples(&[(0.0, 0.0, 0.0), (10.0, 0.0, 0.1), (100.0, 0.0, 0.2)]);
        assert_eq!(smoothness_score(&pts, DEFAULT_SMOOTHNESS_DECAY), 10.0);
    }

    #[test]
    fn test_jerky_motion_scores_lower() {
        let pts = samples(&[
            (0.0, 0.0, 0.0),
            (10.0, 0.0, 0.1),
            (60.0, 0.0, 0.2),
            (65.0, 0.0, 0.3),
            (140.0, 0.0, 0.4),
            (142.0, 0.0, 0.5),
        ]);
        let score = smoothness_score(&pts, DEFAULT_SMOOTHNESS_DECAY);
        assert!(score < 10.0);
        assert!(score >= 0.0);
    }

    #[test]
    fn test_smoothness_bounded_for_extreme_jerk() {
        let pts: Vec<Sample> = (0..30)
            .map(|i| {
                let x = if i % 2 == 0 { 0.0 } else { 500.0 * i as f64 };
                Sample::new(x, 0.0, 0.01 * i as f64)
            })
            .collect();
        let score = smoothness_score(&pts, DEFAULT_SMOOTHNESS_DECAY);
        assert!((0.0..=10.0).contains(&score));
    }
}
