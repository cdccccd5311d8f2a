//! Reaction-time metrics for the moving-target task

use crate::error::AssessError;
use crate::types::TargetResult;

/// Calculator for target-acquisition metrics
pub struct ReactionMetrics;

impl ReactionMetrics {
    /// Mean and population standard deviation of reaction times
    ///
    /// Fails with `NoSuccessfulReactions` when no target was hit; the caller
    /// still owns the miss count in that case.
    pub fn analyze(reactions: &[f64], missed: u32) -> Result<TargetResult, AssessError> {
        let (avg_time, std_dev) =
            mean_and_population_std(reactions).ok_or(AssessError::NoSuccessfulReactions { missed })?;

        Ok(TargetResult {
            avg_time: Some(avg_time),
            std_dev,
            missed,
        })
    }

    /// Result recorded for a session that ended without a single hit
    pub fn without_hits(missed: u32) -> TargetResult {
        TargetResult {
            avg_time: None,
            std_dev: 0.0,
            missed,
        }
    }
}

/// Mean and population (divide-by-N) standard deviation
pub fn mean_and_population_std(values: &[f64]) -> Option<(f64, f64)> {
    if values.is_empty() {
        return None;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    if values.len() == 1 {
        return Some((mean, 0.0));
    }
    let variance = values.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n;
    Some((mean, variance.sqrt()))
}
