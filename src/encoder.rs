//! Report encoding
//!
//! This module encodes a session's task slots into a versioned JSON report.
//! A report is always produced; when tasks are still missing it carries the
//! missing list instead of an assessment.

use crate::error::AssessError;
use crate::recommendations::{displayed_recommendations, DISCLAIMER};
use crate::state::SessionState;
use crate::types::{AssessmentReport, ReportProducer, ReportTask, TaskKind};
use crate::{PRODUCER_NAME, VERSION};
use chrono::Utc;
use uuid::Uuid;

/// Current report format version
pub const REPORT_VERSION: &str = "1.0.0";

/// Encoder for screening reports
pub struct AssessmentEncoder {
    instance_id: String,
}

impl Default for AssessmentEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl AssessmentEncoder {
    /// Create a new encoder with a unique instance ID
    pub fn new() -> Self {
        Self {
            instance_id: Uuid::new_v4().to_string(),
        }
    }

    /// Create an encoder with a specific instance ID
    pub fn with_instance_id(instance_id: String) -> Self {
        Self { instance_id }
    }

    pub fn instance_id(&self) -> &str {
        &self.instance_id
    }

    /// Encode the session state into a report
    pub fn encode(&self, state: &SessionState) -> Result<AssessmentReport, AssessError> {
        let producer = ReportProducer {
            name: PRODUCER_NAME.to_string(),
            version: VERSION.to_string(),
            instance_id: self.instance_id.clone(),
        };

        let tasks = TaskKind::ALL
            .iter()
            .map(|&task| ReportTask {
                task,
                status: state.status(task),
                result: state.result(task),
            })
            .collect();

        let (assessment, missing) = match state.assess() {
            Ok(assessment) => (Some(assessment), Vec::new()),
            Err(AssessError::IncompleteAssessment { missing }) => (None, missing),
            Err(e) => return Err(e),
        };

        let recommendations = assessment
            .map(|a| displayed_recommendations(a.tier))
            .unwrap_or_default();

        Ok(AssessmentReport {
            report_version: REPORT_VERSION.to_string(),
            producer,
            computed_at_utc: Utc::now().to_rfc3339(),
            tasks,
            assessment,
            missing,
            recommendations,
            disclaimer: DISCLAIMER.to_string(),
        })
    }

    /// Encode to JSON string
    pub fn encode_to_json(&self, state: &SessionState) -> Result<String, AssessError> {
        let report = self.encode(state)?;
        serde_json::to_string_pretty(&report).map_err(AssessError::JsonError)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{RiskTier, TargetResult, TaskResult, TaskStatus, TrajectoryResult};
    use pretty_assertions::assert_eq;

    fn completed_state(avg_time: f64, missed: u32) -> SessionState {
        let trajectory = TrajectoryResult {
            mse: 0.0,
            time_taken: 2.0,
            smoothness: 10.0,
        };
        let mut state = SessionState::new();
        state.complete(TaskResult::Line(trajectory));
        state.complete(TaskResult::Square(trajectory));
        state.complete(TaskResult::Target(TargetResult {
            avg_time: Some(avg_time),
            std_dev: 0.0,
            missed,
        }));
        state
    }

    #[test]
    fn test_encode_complete_session() {
        let encoder = AssessmentEncoder::with_instance_id("test-instance".to_string());
        let report = encoder.encode(&completed_state(0.5, 0)).unwrap();

        assert_eq!(report.report_version, REPORT_VERSION);
        assert_eq!(report.producer.name, PRODUCER_NAME);
        assert_eq!(report.producer.version, VERSION);
        assert_eq!(report.producer.instance_id, "test-instance");
        assert_eq!(report.tasks.len(), 3);
        assert!(report.missing.is_empty());

        let assessment = report.assessment.unwrap();
        assert_eq!(assessment.tier, RiskTier::Low);
        assert_eq!(report.recommendations.len(), 5);
        assert_eq!(report.disclaimer, DISCLAIMER);
    }

    #[test]
    fn test_encode_incomplete_session() {
        let encoder = AssessmentEncoder::new();
        let mut state = SessionState::new();
        state.begin(TaskKind::Line);

        let report = encoder.encode(&state).unwrap();
        assert!(report.assessment.is_none());
        assert!(report.recommendations.is_empty());
        assert_eq!(report.missing, TaskKind::ALL.to_vec());
        assert_eq!(report.tasks[0].status, TaskStatus::InProgress);
        assert_eq!(report.tasks[0].result, None);
    }

    #[test]
    fn test_high_tier_shows_first_five() {
        let encoder = AssessmentEncoder::new();
        let mut state = completed_state(3.0, 9);
        let poor = TrajectoryResult {
            mse: 900.0,
            time_taken: 8.0,
            smoothness: 0.0,
        };
        state.complete(TaskResult::Line(poor));
        state.complete(TaskResult::Square(poor));

        let report = encoder.encode(&state).unwrap();
        assert_eq!(report.assessment.unwrap().tier, RiskTier::High);
        assert_eq!(report.recommendations.len(), 5);
        assert!(report.recommendations[0].starts_with("Fresh vegetables"));
    }

    #[test]
    fn test_encode_to_json_fields() {
        let encoder = AssessmentEncoder::with_instance_id("abc".to_string());
        let json = encoder.encode_to_json(&completed_state(0.6, 2)).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["producer"]["instance_id"], "abc");
        assert_eq!(value["tasks"][2]["result"]["task"], "target");
        assert_eq!(value["tasks"][2]["result"]["missed"], 2);
        assert!(value.get("missing").is_none());
        assert!(value["computed_at_utc"].is_string());
    }
}
