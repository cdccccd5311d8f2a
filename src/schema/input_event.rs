//! motor.input_event.v1 schema definition
//!
//! A recorded screening session is a time-ordered log of input events:
//! task starts, pointer gestures, clicks, clock ticks and clears. Each record
//! carries the engine time `t` (seconds) at which it occurred.

use serde::{Deserialize, Serialize};

use crate::error::AssessError;
use crate::types::{PointerPhase, TaskKind};

/// Current schema version
pub const SCHEMA_VERSION: &str = "motor.input_event.v1";

/// What happened at a point in the log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InputAction {
    /// Start (or restart) a task
    Start { task: TaskKind },
    /// Press, move or release during a tracing task
    Pointer { phase: PointerPhase, x: f64, y: f64 },
    /// Click during the target task
    Click { x: f64, y: f64 },
    /// Clock advance with no input
    Tick,
    /// Drop all results
    Clear,
}

/// The motor.input_event.v1 record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputEvent {
    /// Schema version identifier
    pub schema_version: String,
    /// Engine time in seconds
    pub t: f64,
    #[serde(flatten)]
    pub action: InputAction,
    /// Optional recording session identifier
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
}

impl InputEvent {
    pub fn new(t: f64, action: InputAction) -> Self {
        InputEvent {
            schema_version: SCHEMA_VERSION.to_string(),
            t,
            action,
            session_id: None,
        }
    }

    pub fn start(task: TaskKind, t: f64) -> Self {
        Self::new(t, InputAction::Start { task })
    }

    pub fn pointer(phase: PointerPhase, x: f64, y: f64, t: f64) -> Self {
        Self::new(t, InputAction::Pointer { phase, x, y })
    }

    pub fn click(x: f64, y: f64, t: f64) -> Self {
        Self::new(t, InputAction::Click { x, y })
    }

    pub fn tick(t: f64) -> Self {
        Self::new(t, InputAction::Tick)
    }

    pub fn clear(t: f64) -> Self {
        Self::new(t, InputAction::Clear)
    }

    /// Tag the record with a recording session
    pub fn with_session_id(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    /// Validate a single record
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.schema_version != SCHEMA_VERSION {
            return Err(ValidationError::InvalidSchemaVersion {
                expected: SCHEMA_VERSION.to_string(),
                actual: self.schema_version.clone(),
            });
        }

        if !self.t.is_finite() || self.t < 0.0 {
            return Err(ValidationError::InvalidTime { t: self.t });
        }

        match self.action {
            InputAction::Pointer { x, y, .. } | InputAction::Click { x, y } => {
                if !x.is_finite() || !y.is_finite() {
                    return Err(ValidationError::NonFiniteCoordinate {
                        action: self.action_name().to_string(),
                    });
                }
                Ok(())
            }
            _ => Ok(()),
        }
    }

    pub fn action_name(&self) -> &'static str {
        match self.action {
            InputAction::Start { .. } => "start",
            InputAction::Pointer { .. } => "pointer",
            InputAction::Click { .. } => "click",
            InputAction::Tick => "tick",
            InputAction::Clear => "clear",
        }
    }
}

/// Validation errors for input events
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("Invalid schema version: expected {expected}, got {actual}")]
    InvalidSchemaVersion { expected: String, actual: String },

    #[error("Invalid event time: {t}")]
    InvalidTime { t: f64 },

    #[error("Non-finite coordinate in {action} event")]
    NonFiniteCoordinate { action: String },

    #[error("Event time {t} is earlier than the previous event at {previous}")]
    OutOfOrder { previous: f64, t: f64 },
}

/// Validation failure of one record in a log
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationResult {
    pub index: usize,
    pub error: ValidationError,
}

/// Parse a JSON string containing an array of input events
pub fn parse_array(json: &str) -> Result<Vec<InputEvent>, AssessError> {
    let events: Vec<InputEvent> = serde_json::from_str(json)?;
    Ok(events)
}

/// Parse NDJSON (newline-delimited JSON) containing input events
pub fn parse_ndjson(ndjson: &str) -> Result<Vec<InputEvent>, AssessError> {
    let mut events = Vec::new();
    for (line_num, line) in ndjson.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        match serde_json::from_str::<InputEvent>(trimmed) {
            Ok(event) => events.push(event),
            Err(e) => {
                return Err(AssessError::ParseError(format!(
                    "Failed to parse line {}: {}",
                    line_num + 1,
                    e
                )));
            }
        }
    }
    Ok(events)
}

/// Parse either a JSON array or NDJSON, chosen by the first non-blank byte
pub fn parse_events(input: &str) -> Result<Vec<InputEvent>, AssessError> {
    if input.trim_start().starts_with('[') {
        parse_array(input)
    } else {
        parse_ndjson(input)
    }
}

/// Validate a log; returns one entry per failing record
pub fn validate_events(events: &[InputEvent]) -> Vec<ValidationResult> {
    let mut failures = Vec::new();
    let mut previous: Option<f64> = None;

    for (index, event) in events.iter().enumerate() {
        if let Err(error) = event.validate() {
            failures.push(ValidationResult { index, error });
            continue;
        }
        if let Some(prev) = previous {
            if event.t < prev {
                failures.push(ValidationResult {
                    index,
                    error: ValidationError::OutOfOrder {
                        previous: prev,
                        t: event.t,
                    },
                });
                continue;
            }
        }
        previous = Some(event.t);
    }

    failures
}
