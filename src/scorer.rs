//! Composite risk scoring
//!
//! Combines the three per-task results into a 0-10 risk score and a tier.

use crate::error::AssessError;
use crate::types::{RiskAssessment, RiskTier, TargetResult, TrajectoryResult};

/// Upper bound of every per-component sub-score
const SUB_SCORE_CAP: f64 = 5.0;

/// Upper bound of the composite score
const RISK_SCORE_CAP: f64 = 10.0;

/// Scores below this are Low
pub const LOW_TIER_LIMIT: f64 = 3.0;

/// Scores below this (and not Low) are Moderate
pub const MODERATE_TIER_LIMIT: f64 = 6.0;

/// Risk scorer over completed task results
pub struct RiskScorer;

impl RiskScorer {
    /// Score three completed tasks
    ///
    /// Fails with `NoSuccessfulReactions` when the target result carries no
    /// mean reaction time.
    pub fn assess(
        line: &TrajectoryResult,
        square: &TrajectoryResult,
        target: &TargetResult,
    ) -> Result<RiskAssessment, AssessError> {
        let avg_time = target.avg_time.ok_or(AssessError::NoSuccessfulReactions {
            missed: target.missed,
        })?;

        let line_score = trajectory_score(line);
        let square_score = trajectory_score(square);
        let target_score = target_score(avg_time, target.missed);

        let score = composite_score(line_score, square_score, target_score);

        Ok(RiskAssessment {
            score,
            tier: tier_for(score),
            line_score,
            square_score,
            target_score,
        })
    }
}

/// Tracing sub-score
///
/// Formula: `0.6 * min(5, mse / 100) + 0.4 * max(0, 5 - smoothness / 2)`
pub fn trajectory_score(result: &TrajectoryResult) -> f64 {
    let mse_score = (result.mse / 100.0).min(SUB_SCORE_CAP);
    let smooth_score = (SUB_SCORE_CAP - result.smoothness / 2.0).max(0.0);
    0.6 * mse_score + 0.4 * smooth_score
}

/// Target sub-score
///
/// Formula: `0.7 * min(5, avg_time * 2) + 0.3 * min(5, missed)`
pub fn target_score(avg_time: f64, missed: u32) -> f64 {
    let time_score = (avg_time * 2.0).min(SUB_SCORE_CAP);
    let miss_score = (missed as f64).min(SUB_SCORE_CAP);
    0.7 * time_score + 0.3 * miss_score
}

/// Weighted composite scaled to 0-10
///
/// Formula: `min(10, 2 * (0.35 * line + 0.35 * square + 0.30 * target))`
pub fn composite_score(line_score: f64, square_score: f64, target_score: f64) -> f64 {
    let overall = 0.35 * line_score + 0.35 * square_score + 0.30 * target_score;
    (overall * 2.0).min(RISK_SCORE_CAP)
}

/// Map a composite score to its tier
pub fn tier_for(score: f64) -> RiskTier {
    if score < LOW_TIER_LIMIT {
        RiskTier::Low
    } else if score < MODERATE_TIER_LIMIT {
        RiskTier::Moderate
    } else {
        RiskTier::High
    }
}
