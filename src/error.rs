//! Error types for Motor Screen

use thiserror::Error;

use crate::types::TaskKind;

/// Errors that can occur while recording or scoring a screening session
#[derive(Debug, Error)]
pub enum AssessError {
    #[error("Insufficient samples: need at least {required}, got {got}")]
    InsufficientSamples { required: usize, got: usize },

    #[error("No successful reactions recorded ({missed} missed)")]
    NoSuccessfulReactions { missed: u32 },

    #[error("Assessment incomplete, missing: {}", format_kinds(.missing))]
    IncompleteAssessment { missing: Vec<TaskKind> },

    #[error("Timestamp went backwards: {t} is earlier than {previous}")]
    NonMonotonicTimestamp { previous: f64, t: f64 },

    #[error("Non-finite {field}: {value}")]
    NonFiniteInput { field: &'static str, value: f64 },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Failed to parse input: {0}")]
    ParseError(String),

    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Encoding error: {0}")]
    EncodingError(String),
}

/// Reject NaN and infinite host input before it reaches any buffer
pub(crate) fn ensure_finite(field: &'static str, value: f64) -> Result<f64, AssessError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(AssessError::NonFiniteInput { field, value })
    }
}

fn format_kinds(kinds: &[TaskKind]) -> String {
    kinds
        .iter()
        .map(|k| k.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}
